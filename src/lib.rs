pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod predictor;
pub mod session;
pub mod store;
pub mod target;
pub mod trainer;
