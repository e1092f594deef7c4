pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod export;
pub mod import;
pub mod model;
pub mod reconcile;
mod snapshot;
pub mod submit;
mod utils;


pub use api::Mode;
pub use config::Config;
pub use error::{Error, ParseError, Result};
pub use snapshot::Snapshot;
