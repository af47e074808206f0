//! # ProjectHub API Server Library
//!
//! HTTP boundary for the ProjectHub core: entity CRUD, project-scoped
//! search, and analytics, all behind JWT authentication.
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
