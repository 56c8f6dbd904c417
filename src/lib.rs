pub mod billing;
pub mod cascade;
pub mod config;
pub mod db;
pub mod hooks;
pub mod join;
pub mod propagation;
pub mod rights;
pub mod routes;
pub mod schema;
pub mod service;
pub mod types;
pub mod utils;
