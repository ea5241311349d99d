//! Exchange-level use-case service.
//!
//! # Responsibility
//! - Validate exchanges before generation or dispatch.
//! - Own lifecycle transitions (`generated`, `sent`) around the engine.
//! - Provide send, resend and preview entry points for callers.
//!
//! # Invariants
//! - The generator and dispatcher never change exchange state; only this
//!   service does.
//! - Stored assignments always verified against the exchange they belong to.
//! - Persistence stays with the caller; this service only mutates the
//!   in-memory exchange it is given.

use crate::config::{ConfigError, ExchangeServiceConfig};
use crate::model::assignment::{Assignment, AssignmentError, AssignmentSet};
use crate::model::exchange::{Exchange, ExchangeStateError, ExchangeValidationError};
use crate::model::participant::ParticipantId;
use crate::service::assignment_generator::{AssignmentGenerator, GenerationError};
use crate::service::notification::{
    DispatchError, DispatchReport, EmailGateway, NotificationDispatcher, RenderedEmail,
};
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for exchange use-cases.
#[derive(Debug)]
pub enum ExchangeServiceError {
    /// The exchange failed validation; user-fixable.
    Validation(ExchangeValidationError),
    /// Generation failed; see `GenerationError::kind`.
    Generation(GenerationError),
    /// Operation needs assignments the exchange does not have yet.
    NoAssignments,
    /// A synthetic assignment could not be built.
    Assignment(AssignmentError),
    /// Single-notification failure (preview).
    Dispatch(DispatchError),
    /// Rejected lifecycle transition.
    State(ExchangeStateError),
}

impl Display for ExchangeServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Generation(err) => write!(f, "{err}"),
            Self::NoAssignments => write!(f, "exchange has no generated assignments"),
            Self::Assignment(err) => write!(f, "{err}"),
            Self::Dispatch(err) => write!(f, "{err}"),
            Self::State(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExchangeServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Generation(err) => Some(err),
            Self::NoAssignments => None,
            Self::Assignment(err) => Some(err),
            Self::Dispatch(err) => Some(err),
            Self::State(err) => Some(err),
        }
    }
}

impl From<ExchangeValidationError> for ExchangeServiceError {
    fn from(value: ExchangeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GenerationError> for ExchangeServiceError {
    fn from(value: GenerationError) -> Self {
        Self::Generation(value)
    }
}

impl From<AssignmentError> for ExchangeServiceError {
    fn from(value: AssignmentError) -> Self {
        Self::Assignment(value)
    }
}

impl From<DispatchError> for ExchangeServiceError {
    fn from(value: DispatchError) -> Self {
        Self::Dispatch(value)
    }
}

impl From<ExchangeStateError> for ExchangeServiceError {
    fn from(value: ExchangeStateError) -> Self {
        Self::State(value)
    }
}

/// Use-case facade over the generator and the notification dispatcher.
pub struct ExchangeService<G: EmailGateway, R: Rng = StdRng> {
    config: ExchangeServiceConfig,
    generator: AssignmentGenerator<R>,
    dispatcher: NotificationDispatcher<G>,
}

impl<G: EmailGateway> ExchangeService<G, StdRng> {
    /// Creates a service with an entropy-seeded random source.
    pub fn new(config: ExchangeServiceConfig, gateway: G) -> Result<Self, ConfigError> {
        Self::with_rng(config, gateway, StdRng::from_entropy())
    }
}

impl<G: EmailGateway, R: Rng> ExchangeService<G, R> {
    /// Creates a service with a caller-provided random source.
    ///
    /// # Errors
    /// - Returns `ConfigError` when the config fails startup validation.
    pub fn with_rng(
        config: ExchangeServiceConfig,
        gateway: G,
        rng: R,
    ) -> Result<Self, ConfigError> {
        let dispatcher = NotificationDispatcher::new(&config, gateway)?;
        Ok(Self {
            config,
            generator: AssignmentGenerator::new(rng),
            dispatcher,
        })
    }

    pub fn config(&self) -> &ExchangeServiceConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher<G> {
        &self.dispatcher
    }

    /// Generates, stores and returns assignments for `exchange`.
    ///
    /// # Contract
    /// - Validates the exchange first.
    /// - On success the exchange holds the new set and is `generated`.
    /// - On failure the exchange is left untouched.
    pub fn generate_assignments<'e>(
        &mut self,
        exchange: &'e mut Exchange,
        avoid_reciprocal: bool,
    ) -> Result<&'e AssignmentSet, ExchangeServiceError> {
        exchange.validate()?;
        let assignments = self.generator.generate(
            &exchange.participant_ids(),
            &exchange.conflict_model(),
            avoid_reciprocal,
            self.config.max_attempts,
        )?;

        info!(
            "event=exchange_generated module=exchange_service status=ok exchange={} participants={} avoid_reciprocal={}",
            exchange.id,
            assignments.len(),
            avoid_reciprocal
        );
        exchange.mark_generated();
        let stored: &AssignmentSet = exchange.assignments.insert(assignments);
        Ok(stored)
    }

    /// Generates fresh assignments and notifies every giver.
    ///
    /// # Contract
    /// - Tries without reciprocal pairs first, then with them.
    /// - The exchange becomes `generated`, then `sent` only when every
    ///   notification went out; failed givers can be retried with
    ///   `resend_notifications`.
    pub fn send_notifications(
        &mut self,
        exchange: &mut Exchange,
    ) -> Result<DispatchReport, ExchangeServiceError> {
        exchange.validate()?;
        let generated = self.generator.generate_with_fallback(
            &exchange.participant_ids(),
            &exchange.conflict_model(),
            self.config.max_attempts,
        )?;

        let report = self
            .dispatcher
            .dispatch_all(exchange, &generated.assignments, false);
        exchange.assignments = Some(generated.assignments);
        exchange.mark_generated();
        if report.is_complete() {
            exchange.mark_sent()?;
        }

        info!(
            "event=exchange_notified module=exchange_service exchange={} avoided_reciprocal={} sent={} failed={}",
            exchange.id,
            generated.avoided_reciprocal,
            report.sent,
            report.failures.len()
        );
        Ok(report)
    }

    /// Re-sends existing notifications for the listed givers.
    ///
    /// Givers without a stored assignment are skipped.
    pub fn resend_notifications(
        &self,
        exchange: &Exchange,
        givers: &[ParticipantId],
    ) -> Result<DispatchReport, ExchangeServiceError> {
        exchange.validate()?;
        let assignments = exchange
            .assignments
            .as_ref()
            .ok_or(ExchangeServiceError::NoAssignments)?;
        let subset = assignments.subset_for_givers(givers);
        Ok(self.dispatcher.dispatch_all(exchange, &subset, false))
    }

    /// Sends a throwaway set of notifications to the organizer only.
    ///
    /// The generated set is neither stored nor reflected in exchange state.
    pub fn send_organizer_preview(
        &mut self,
        exchange: &Exchange,
        avoid_reciprocal: bool,
    ) -> Result<DispatchReport, ExchangeServiceError> {
        exchange.validate()?;
        let assignments = self.generator.generate(
            &exchange.participant_ids(),
            &exchange.conflict_model(),
            avoid_reciprocal,
            self.config.max_attempts,
        )?;
        Ok(self.dispatcher.dispatch_all(exchange, &assignments, true))
    }

    /// Renders the email the first participant would get about the second.
    pub fn preview(&self, exchange: &Exchange) -> Result<RenderedEmail, ExchangeServiceError> {
        exchange.validate()?;
        let participants = exchange.participants();
        let assignment = Assignment::new(participants[0].id, participants[1].id)?;
        Ok(self.dispatcher.render_preview(exchange, &assignment)?)
    }
}
