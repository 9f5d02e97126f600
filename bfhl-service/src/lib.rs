//! bfhl-service: single-endpoint operation dispatcher.
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
