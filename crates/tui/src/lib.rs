mod app;
mod confirm;
mod ui;
pub mod event;

pub use app::{App, Workbench};
pub use confirm::ConfirmDialog;
