pub mod backend;
pub mod config;
pub mod driver;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod seed;
