// src/browse/mod.rs
// =============================================================================
// What the user sees: search results with expandable user panels, and the
// repository detail page.
//
// Submodules:
// - session: search + per-user panels, cached by key
// - filter: name / language filter over a panel's repositories
// - detail: repository metadata, README and clone affordances
// =============================================================================

mod detail;
mod filter;
mod session;

pub use detail::{topic_url, CloneKind, CloneOption, RepoDetail};
pub use filter::{languages, RepoFilter};
pub use session::{BrowseSession, LoadState, UserPanel};
