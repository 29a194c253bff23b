mod http;
#[cfg(feature = "test-helpers")]
pub mod mock;
mod traits;

pub use http::HttpService;
pub use traits::{ServiceError, TodoService};
