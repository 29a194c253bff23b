pub mod app;
pub mod components;
pub mod config;
pub mod context_form;
pub mod debounce;
pub mod event;
pub mod form;
pub mod lists;
pub mod logging;
pub mod reconciler;
pub mod route;
