pub mod analyzer;
pub mod api;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod movers;
pub mod report;
pub mod seed;
pub mod server;
pub mod summary;
mod utils;

pub use api::Mode;
pub use config::Config;
pub use error::Error;
pub use error::Result;
