pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod server;

pub use error::{Error, Result};
