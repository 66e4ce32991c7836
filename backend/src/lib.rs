pub mod config;
pub mod routes;
pub mod services;
pub mod utils;
