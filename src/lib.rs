pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod params;
pub mod server;
pub mod services;
pub mod types;

pub use backend::Backends;
pub use config::GatewayConfig;
pub use error::GatewayError;
pub use server::{app, AppState};
