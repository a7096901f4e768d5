pub mod app;
pub mod dispatch;
pub mod error;
pub mod http;

pub use app::{build_router, AppState};
