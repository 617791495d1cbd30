pub mod auth;
pub mod relay_service;
pub mod staging;
pub mod storage;
