//! HTTP API: handlers grouped by resource

pub mod auth;
pub mod config;
pub mod discounts;
pub mod health;
pub mod songs;
