#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod driver;
pub mod error;
pub mod fetcher;
pub mod signals;

pub use error::Error;
