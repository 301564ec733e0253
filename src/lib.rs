//! Library crate for rally-rounds, exposing modules for binaries and integration tests.

pub mod config;
/// Document stores.
pub mod dao;
/// Request and response payloads.
pub mod dto;
/// Service and HTTP errors.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Business services and background loops.
pub mod services;
/// Application and session state.
pub mod state;
