pub mod filter;
pub mod publish;
pub mod reconcile;
pub mod set;

pub use filter::{KeywordFilter, ViewEntry, ViewGroup};
pub use publish::{PublishGroup, PublishResolution, resolve_for_publish};
pub use set::{SelectionError, SelectionSet};
