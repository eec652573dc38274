pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod rotation;
pub mod setup;
pub mod stats;
pub mod store;
