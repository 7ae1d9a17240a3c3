pub mod accounts;
pub mod automate;
pub mod automation;
pub mod error;
pub mod handlers;
pub mod logs;
pub mod media;
pub mod middleware;
pub mod posts;
pub mod routes;
pub mod settings;
pub mod ws;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
