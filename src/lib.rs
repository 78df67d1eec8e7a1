pub mod cache;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod index;
pub mod persist;
pub mod sampling;
pub mod scoring;
pub mod types;
