pub(crate) mod retry;
pub(crate) mod text;

pub use retry::RetryConfig;
