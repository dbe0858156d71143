//! Router Module Index
//!
//! Organizes the service's HTTP surface. Every endpoint is public: the service
//! answers authorization questions and holds no protected resources of its own.

/// Liveness and route table introspection.
pub mod public;

/// Gate decision endpoints (`/navigate`, `/guard`).
pub mod navigation;
