pub mod analysis;
pub mod config;
pub mod error;
pub mod imaging;
pub mod limiter;
pub mod model;
pub mod server;

pub use error::{Error, Result};
