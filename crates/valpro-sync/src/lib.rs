pub mod backend;
pub mod error;
pub mod file;
pub mod http;
pub mod memory;
pub mod notify;
pub mod store;

pub use backend::{from_config, Backend};
pub use error::{BackendError, Result, SyncError};
pub use file::FileBackend;
pub use http::HttpBackend;
pub use memory::{Dataset, MemoryBackend};
pub use store::{Intent, Mutated, Snapshot, Store, StoreEvent};
