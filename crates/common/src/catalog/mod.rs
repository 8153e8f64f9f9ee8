pub mod memory;
mod provider;

pub use memory::{MemoryCatalog, MemoryCatalogError};
pub use provider::{CatalogError, CatalogProvider, FileDescriptor};
