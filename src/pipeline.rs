pub mod collect;
pub mod preprocess;
pub mod publish;

pub use collect::{CollectionOutcome, CollectionSummary, Collector};
pub use publish::{PublishOutcome, PublishReport, Publisher};
