//! Core engine for gift-exchange assignment and notification.
//! This crate is the single source of truth for assignment invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod service;
pub mod text;

pub use config::{ConfigError, ExchangeServiceConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::assignment::{Assignment, AssignmentError, AssignmentSet, AssignmentViolation};
pub use model::conflict::ConflictModel;
pub use model::exchange::{
    Exchange, ExchangeId, ExchangeProblem, ExchangeState, ExchangeStateError,
    ExchangeValidationError, Organizer,
};
pub use model::participant::{Participant, ParticipantId, ParticipantValidationError};
pub use model::template::{EffectiveTemplateConfig, EmailFormat, TemplateOverride};
pub use service::assignment_generator::{
    AssignmentGenerator, GeneratedAssignments, GenerationError, GenerationErrorKind,
};
pub use service::exchange_service::{ExchangeService, ExchangeServiceError};
pub use service::notification::{
    DispatchError, DispatchFailure, DispatchReport, EmailAddress, EmailGateway, GatewayError,
    NotificationDispatcher, RenderRequest, RenderedEmail,
};
pub use service::template_resolver::resolve as resolve_template_config;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
