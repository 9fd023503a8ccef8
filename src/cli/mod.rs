pub mod tui;
pub mod worker;

pub use tui::TuiApp;
pub use worker::{NetCommand, NetResponse, Submission, WorkerHandle, spawn};
