//! Core use-case services.
//!
//! # Responsibility
//! - Generate assignments and resolve notification configuration.
//! - Orchestrate validation, generation and dispatch for exchange callers.
//! - Keep the email collaborator behind the `EmailGateway` trait.

pub mod assignment_generator;
pub mod exchange_service;
pub mod notification;
pub mod template_resolver;
