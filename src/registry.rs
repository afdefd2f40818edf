use std::collections::HashMap;
use std::sync::Arc;

use crate::source::Source;
use crate::sources::freewebnovel::FreeWebnovel;
use crate::sources::koreanonline::KoreanOnline;
use crate::sources::lightnovels::LightNovels;

/// Maps source ids to adapter instances. Adapters are stateless, so one
/// registry can be shared freely.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<i64, Arc<dyn Source>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every bundled adapter installed.
    pub fn with_bundled_sources() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FreeWebnovel::new()));
        registry.register(Arc::new(KoreanOnline::new()));
        registry.register(Arc::new(LightNovels::new()));
        registry
    }

    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.meta().id, source);
    }

    pub fn get(&self, id: i64) -> Option<Arc<dyn Source>> {
        self.sources.get(&id).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
