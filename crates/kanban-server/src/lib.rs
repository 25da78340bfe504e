pub mod cors;
pub mod error;
pub mod handlers;
pub mod server;

pub use cors::CorsConfig;
pub use error::ApiError;
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
