/// A named, parameterless retrieval mode such as "Latest" or "Popular".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub name: String,
}

impl Listing {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A user-supplied query refinement. Adapters read the variants they
/// recognize and ignore the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Free-text search query.
    Title { value: String },
    /// A sort choice among the adapter's declared options.
    Sort {
        name: String,
        options: Vec<String>,
        selected: Option<usize>,
    },
}

impl Filter {
    /// An empty title filter, as declared by an adapter's `filters()`.
    pub fn title() -> Self {
        Filter::Title {
            value: String::new(),
        }
    }

    /// A sort filter with no selection yet.
    pub fn sort(name: &str, options: &[&str]) -> Self {
        Filter::Sort {
            name: name.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            selected: None,
        }
    }
}

/// Ordered sequence of filters, as declared by a source and then filled in
/// by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterList {
    filters: Vec<Filter>,
}

impl FilterList {
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }

    /// The first title filter's query text, if any filter carries one.
    pub fn title_query(&self) -> Option<&str> {
        self.filters.iter().find_map(|filter| match filter {
            Filter::Title { value } => Some(value.as_str()),
            _ => None,
        })
    }

    /// The selected index of the first sort filter that has a selection.
    pub fn sort_selection(&self) -> Option<usize> {
        self.filters.iter().find_map(|filter| match filter {
            Filter::Sort {
                selected: Some(index),
                ..
            } => Some(*index),
            _ => None,
        })
    }

    /// Set the query text on the first title filter.
    pub fn with_title(mut self, query: &str) -> Self {
        for filter in &mut self.filters {
            if let Filter::Title { value } = filter {
                *value = query.to_string();
                break;
            }
        }
        self
    }

    /// Select a sort option on the first sort filter.
    pub fn with_sort(mut self, index: usize) -> Self {
        for filter in &mut self.filters {
            if let Filter::Sort { selected, .. } = filter {
                *selected = Some(index);
                break;
            }
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
