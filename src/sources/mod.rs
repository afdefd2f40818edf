// Site adapters. Each implements the Source contract; selectors and DTO
// shapes are the only things that differ between them.

// HTML-backed sites
pub mod freewebnovel;
pub mod koreanonline;

// JSON/Next.js-backed sites
pub mod lightnovels;
