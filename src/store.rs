pub mod key;
pub mod models;
pub mod results;

pub use key::ArticleKey;
pub use models::{Article, Customer};
pub use results::ResultStore;
