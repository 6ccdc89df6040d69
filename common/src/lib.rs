pub mod aggregate;
pub mod asset;
pub mod combine;
pub mod error;
pub mod format;
pub mod lookup;
pub mod normalize;
pub mod running_balance;
pub mod transaction;

#[cfg(test)]
mod tests;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
