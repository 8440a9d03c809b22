pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod filter;
pub mod join;
pub mod processing;
pub mod render;
pub mod server;
pub mod types;
pub mod upload;
pub mod zones;

pub use error::{Error, Result};
