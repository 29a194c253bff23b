pub mod category;
pub mod context;
pub mod display;
pub mod error;
pub mod priority;
pub mod suggestion;
pub mod task;
mod wire;

pub use category::Category;
pub use context::{ContextEntry, SourceType};
pub use error::TodoError;
pub use priority::PriorityBand;
pub use suggestion::{AiSuggestion, Enhancement};
pub use task::{Status, Task, TaskPayload};
