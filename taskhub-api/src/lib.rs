//! # TaskHub API Server Library
//!
//! HTTP layer of the TaskHub backend: configuration, router, handlers and
//! the mapping of domain errors to HTTP responses.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
