use todogenius_core::category::Category;
use todogenius_core::context::ContextEntry;
use todogenius_core::suggestion::Enhancement;
use todogenius_core::task::Task;
use todogenius_service::ServiceError;

/// Completion of a remote call, delivered back to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    TasksLoaded {
        seq: u64,
        result: Result<Vec<Task>, ServiceError>,
    },
    CategoriesLoaded {
        seq: u64,
        result: Result<Vec<Category>, ServiceError>,
    },
    ContextLoaded {
        seq: u64,
        result: Result<Vec<ContextEntry>, ServiceError>,
    },
    Enhanced {
        form_id: u64,
        generation: u64,
        result: Result<Enhancement, ServiceError>,
    },
    TaskSaved {
        form_id: u64,
        result: Result<Task, ServiceError>,
    },
    TaskToggled {
        task_id: String,
        result: Result<Task, ServiceError>,
    },
    TaskDeleted {
        task_id: String,
        result: Result<(), ServiceError>,
    },
    ContextCreated {
        result: Result<ContextEntry, ServiceError>,
    },
    ContextDeleted {
        entry_id: String,
        result: Result<(), ServiceError>,
    },
    ContextProcessed {
        entry_id: String,
        result: Result<ContextEntry, ServiceError>,
    },
}
