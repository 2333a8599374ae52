pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod input;
pub mod progress;

pub use error::{Result, TethysError};
