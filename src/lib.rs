//! Stellar wallet credit scoring service.

pub mod activity;
pub mod admin;
pub mod auth;
pub mod config;
pub mod history;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod push;
pub mod scoring;
pub mod security;

pub use config::schema::CreditConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
