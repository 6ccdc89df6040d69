pub mod address;
pub mod config;
pub mod disk_storage;
pub mod error;
pub mod etherscan;
pub mod join;
pub mod log;
pub mod reqwest;
pub mod serde;
pub mod session;
pub mod source;

pub use error::{Result, UtilsError as Error};

pub use reqwest::Reqwest;
