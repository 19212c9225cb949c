pub mod api;
pub mod cli;
pub mod config;
pub mod confirm;
pub mod loader;
pub mod models;
pub mod mutation;
pub mod resources;
pub mod session;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use config::{ApiSettings, Config};
pub use session::{Role, SessionGuard, SessionResult};
