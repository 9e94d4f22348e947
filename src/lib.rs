// Module naming follows project convention (SPSC = Single-Producer Single-Consumer)
#[allow(non_snake_case)]
pub mod SPSC;

#[allow(non_snake_case)]
pub mod Core;

#[allow(non_snake_case)]
pub mod Net;

#[allow(non_snake_case)]
pub mod Debug;

pub mod config;
pub mod error;
pub mod payload;

pub use config::BufferConfig;
pub use error::{BufferError, Result};
