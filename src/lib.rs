pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod delta;
pub mod fetch_error;
pub mod fetcher;
pub mod formatting;
pub mod importers;
pub mod metrics;
pub mod models;
pub mod month;
pub mod normalizer;
pub mod operational;
pub mod period;
pub mod services;
pub mod utils;
