pub mod auth;
pub mod staging;
pub mod storage;
