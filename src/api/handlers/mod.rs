pub mod health;
pub mod retrieve;
pub mod types;
pub mod upload;

pub use types::*;
