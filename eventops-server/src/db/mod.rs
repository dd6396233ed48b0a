//! Data access for the event-operations service

pub mod config;
pub mod songs;
