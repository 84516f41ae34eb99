pub mod config;
pub mod error;
pub mod io;
pub mod job;
pub mod lifecycle;
pub mod mock;
pub mod paths;
pub mod session;
pub mod stats;
pub mod types;
pub mod user;
pub mod vehicle;

pub use error::{Result, ValproError};
pub use job::{Job, NewJob};
pub use lifecycle::{Event, EventContext};
pub use types::{CertificationStatus, JobStatus, UserType};
pub use user::User;
