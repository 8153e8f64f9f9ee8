pub mod auth;
pub mod client;
pub mod error;
pub mod files;
pub mod session;

pub use error::ApiError;
pub use session::Session;
