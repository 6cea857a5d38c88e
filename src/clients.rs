pub mod chat;
pub mod customers;
pub mod search;

pub use chat::{ChatPublisher, SlackWebhookClient, SlackWebhookConfig};
pub use customers::{CachedCustomerSource, CustomerSource, StaticCustomerSource};
pub use search::{NaverNewsClient, NaverNewsConfig, NewsSearch, SearchItem};
