pub mod config;
pub mod error;
pub mod inference;
pub mod llm;
pub mod server;
pub mod store;

pub use error::{Error, Result};
