pub mod context_list;
pub mod task_form;
pub mod task_list;
pub mod widgets;
