// Service modules (daemon functionality)
pub(crate) mod database;
pub mod http_server;
pub mod process;
pub mod service_config;
pub mod service_state;

// App state (configuration, paths)
pub mod state;

pub use database::{Database, DatabaseSetupError};
pub use process::{init_tracing, spawn_service, start_service, ProcessError};
pub use service_config::{Config as ServiceConfig, SessionSecret};
pub use service_state::{State as ServiceState, StateSetupError};
pub use state::{AppConfig, AppState, BlobStoreConfig, StateError};
