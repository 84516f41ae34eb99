pub mod config;
pub mod init;
pub mod job;
pub mod notify;
pub mod session;
pub mod stats;
pub mod user;
