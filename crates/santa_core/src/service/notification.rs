//! Assignment notification dispatch.
//!
//! # Responsibility
//! - Turn one assignment into a filled render request (template, format,
//!   context, sender, reply-to, recipient).
//! - Hand requests to the external rendering/email gateway, one per giver.
//!
//! # Invariants
//! - The caller's exchange is never mutated; wrapping happens on a copy.
//! - Organizer-only mode never addresses a participant.
//! - A failed send does not stop or undo other sends in the same batch.
//! - Log lines carry ids and counts only, never names or addresses.

use crate::config::{ConfigError, ExchangeServiceConfig};
use crate::model::assignment::{Assignment, AssignmentSet};
use crate::model::exchange::Exchange;
use crate::model::participant::{Participant, ParticipantId};
use crate::model::template::{EffectiveTemplateConfig, EmailFormat};
use crate::service::template_resolver;
use crate::text::{wrap_line, PLAINTEXT_WRAP_WIDTH, TEMPLATE_LINE_ENDING};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Context key holding the exchange.
pub const CONTEXT_EXCHANGE: &str = "exchange";
/// Context key holding the giver/receiver pair.
pub const CONTEXT_ASSIGNMENT: &str = "assignment";

/// Mailbox with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub address: String,
}

impl EmailAddress {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }
}

/// Everything the rendering collaborator needs to produce one email.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub template_group: String,
    pub template_name: String,
    pub format: EmailFormat,
    pub context: Map<String, Value>,
    pub sender: EmailAddress,
    /// `None` when the organizer can only be reached by phone.
    pub reply_to: Option<EmailAddress>,
    pub recipient: EmailAddress,
}

/// Rendered email returned by the gateway for previews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedEmail {
    pub subject: String,
    pub plaintext_body: String,
    pub html_body: Option<String>,
}

/// Failure reported by the external gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub message: String,
}

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "email gateway failure: {}", self.message)
    }
}

impl Error for GatewayError {}

/// External template-rendering and email-sending collaborator.
///
/// Calls are synchronous; retry policy belongs to the implementation.
pub trait EmailGateway {
    /// Renders and sends one email.
    fn send(&self, request: &RenderRequest) -> Result<(), GatewayError>;

    /// Renders one email without sending it.
    fn render(&self, request: &RenderRequest) -> Result<RenderedEmail, GatewayError>;
}

impl<G: EmailGateway + ?Sized> EmailGateway for &G {
    fn send(&self, request: &RenderRequest) -> Result<(), GatewayError> {
        (**self).send(request)
    }

    fn render(&self, request: &RenderRequest) -> Result<RenderedEmail, GatewayError> {
        (**self).render(request)
    }
}

/// Dispatch failure for a single assignment.
#[derive(Debug)]
pub enum DispatchError {
    /// The assignment points at someone outside the exchange.
    UnknownParticipant(ParticipantId),
    /// Organizer-only mode with no organizer email on file.
    OrganizerEmailMissing,
    /// Rendering context could not be built.
    Context(serde_json::Error),
    /// The gateway rejected the request.
    Gateway {
        giver: ParticipantId,
        source: GatewayError,
    },
}

impl Display for DispatchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownParticipant(id) => {
                write!(f, "assignment references unknown participant {id}")
            }
            Self::OrganizerEmailMissing => {
                write!(f, "organizer-only delivery requires an organizer email address")
            }
            Self::Context(err) => write!(f, "failed to build template context: {err}"),
            Self::Gateway { giver, source } => {
                write!(f, "notification for participant {giver} failed: {source}")
            }
        }
    }
}

impl Error for DispatchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Context(err) => Some(err),
            Self::Gateway { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(value: serde_json::Error) -> Self {
        Self::Context(value)
    }
}

/// One failed notification inside a batch.
#[derive(Debug)]
pub struct DispatchFailure {
    pub giver: ParticipantId,
    pub error: DispatchError,
}

/// Outcome of a batch dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    pub sent: usize,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchReport {
    pub fn attempted(&self) -> usize {
        self.sent + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Serialize)]
struct AssignmentContext<'a> {
    giver: &'a Participant,
    receiver: &'a Participant,
}

/// Builds render requests and forwards them to an `EmailGateway`.
pub struct NotificationDispatcher<G: EmailGateway> {
    gateway: G,
    defaults: EffectiveTemplateConfig,
    sender_address: String,
}

impl<G: EmailGateway> NotificationDispatcher<G> {
    /// Creates a dispatcher after validating the global defaults.
    pub fn new(config: &ExchangeServiceConfig, gateway: G) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gateway,
            defaults: config.template_defaults(),
            sender_address: config.sender_address.clone(),
        })
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Resolves the template cascade for one assignment.
    ///
    /// The participant level is the gift receiver's override record.
    pub fn template_config(
        &self,
        exchange: &Exchange,
        receiver: &Participant,
    ) -> EffectiveTemplateConfig {
        template_resolver::resolve(
            &self.defaults,
            &exchange.template_overrides,
            &receiver.template_overrides,
        )
    }

    /// Builds the render request for one assignment.
    ///
    /// # Contract
    /// - Recipient is the giver, or the organizer when `organizer_only`.
    /// - Reply-to is the organizer.
    /// - Non-empty extra info is wrapped at 75 columns for plaintext only.
    pub fn build_request(
        &self,
        exchange: &Exchange,
        assignment: &Assignment,
        organizer_only: bool,
    ) -> Result<RenderRequest, DispatchError> {
        let giver = lookup(exchange, assignment.giver())?;
        let receiver = lookup(exchange, assignment.receiver())?;
        let config = self.template_config(exchange, receiver);

        let mut exchange_view = exchange.clone();
        exchange_view.assignments = None;
        if config.email_format.is_plaintext() {
            if let Some(extra_info) = exchange_view
                .extra_info
                .as_mut()
                .filter(|value| !value.trim().is_empty())
            {
                *extra_info = wrap_line(extra_info, PLAINTEXT_WRAP_WIDTH, TEMPLATE_LINE_ENDING);
            }
        }

        let mut context = Map::new();
        context.insert(
            CONTEXT_EXCHANGE.to_string(),
            serde_json::to_value(&exchange_view)?,
        );
        context.insert(
            CONTEXT_ASSIGNMENT.to_string(),
            serde_json::to_value(AssignmentContext { giver, receiver })?,
        );

        let organizer = &exchange.organizer;
        let reply_to = organizer
            .contact_email()
            .map(|address| EmailAddress::new(organizer.name.clone(), address));

        let recipient_address = if organizer_only {
            organizer
                .contact_email()
                .ok_or(DispatchError::OrganizerEmailMissing)?
                .to_string()
        } else {
            giver.email_address.clone()
        };

        Ok(RenderRequest {
            template_group: config.template_group,
            template_name: config.template_name,
            format: config.email_format,
            context,
            sender: EmailAddress::new(config.sender_name, self.sender_address.clone()),
            reply_to,
            recipient: EmailAddress::new(giver.name.clone(), recipient_address),
        })
    }

    /// Sends the notification for one assignment.
    pub fn dispatch_one(
        &self,
        exchange: &Exchange,
        assignment: &Assignment,
        organizer_only: bool,
    ) -> Result<(), DispatchError> {
        let request = self.build_request(exchange, assignment, organizer_only)?;
        self.gateway
            .send(&request)
            .map_err(|source| DispatchError::Gateway {
                giver: assignment.giver(),
                source,
            })?;
        info!(
            "event=notification_sent module=dispatch status=ok exchange={} giver={} organizer_only={}",
            exchange.id,
            assignment.giver(),
            organizer_only
        );
        Ok(())
    }

    /// Sends one notification per assignment, continuing past failures.
    pub fn dispatch_all(
        &self,
        exchange: &Exchange,
        assignments: &AssignmentSet,
        organizer_only: bool,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        for assignment in assignments {
            match self.dispatch_one(exchange, assignment, organizer_only) {
                Ok(()) => report.sent += 1,
                Err(error) => report.failures.push(DispatchFailure {
                    giver: assignment.giver(),
                    error,
                }),
            }
        }
        info!(
            "event=notification_batch module=dispatch exchange={} sent={} failed={}",
            exchange.id,
            report.sent,
            report.failures.len()
        );
        report
    }

    /// Renders one assignment's email without sending it.
    pub fn render_preview(
        &self,
        exchange: &Exchange,
        assignment: &Assignment,
    ) -> Result<RenderedEmail, DispatchError> {
        let request = self.build_request(exchange, assignment, false)?;
        self.gateway
            .render(&request)
            .map_err(|source| DispatchError::Gateway {
                giver: assignment.giver(),
                source,
            })
    }
}

fn lookup(exchange: &Exchange, id: ParticipantId) -> Result<&Participant, DispatchError> {
    exchange
        .participant(id)
        .ok_or(DispatchError::UnknownParticipant(id))
}
