pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use observability::init_tracing;
pub use server::{AuthServices, ServerBuilder, ServerError, StorefrontServer, build_app};
