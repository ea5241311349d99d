//! Participant domain model.
//!
//! # Responsibility
//! - Define one member of an exchange and their directed conflicts.
//! - Validate per-participant invariants before generation or dispatch.
//!
//! # Invariants
//! - `id` is stable and never nil.
//! - A participant never lists itself as a conflict.
//! - Conflicts are directed: `a.conflicts` containing `b` says nothing about `b`.

use crate::model::template::TemplateOverride;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a participant within an exchange.
pub type ParticipantId = Uuid;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email address regex")
});

/// Returns whether `value` has the basic `local@domain.tld` shape.
pub fn is_valid_email_address(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

/// One member of a gift exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub nickname: String,
    pub email_address: String,
    /// Participants this one must never be assigned to give a gift to.
    #[serde(default)]
    pub conflicts: BTreeSet<ParticipantId>,
    #[serde(default)]
    pub template_overrides: TemplateOverride,
}

impl Participant {
    /// Creates a participant with a generated stable ID and no conflicts.
    pub fn new(
        name: impl Into<String>,
        nickname: impl Into<String>,
        email_address: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), name, nickname, email_address)
    }

    /// Creates a participant with a caller-provided stable ID.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(
        id: ParticipantId,
        name: impl Into<String>,
        nickname: impl Into<String>,
        email_address: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            nickname: nickname.into(),
            email_address: email_address.into(),
            conflicts: BTreeSet::new(),
            template_overrides: TemplateOverride::default(),
        }
    }

    /// Forbids assigning this participant to give to `other`.
    ///
    /// Adding the same conflict twice, or a conflict with oneself, is a no-op.
    pub fn add_conflict(&mut self, other: ParticipantId) {
        if other != self.id {
            self.conflicts.insert(other);
        }
    }

    /// Removes a conflict. Returns whether one was present.
    pub fn remove_conflict(&mut self, other: ParticipantId) -> bool {
        self.conflicts.remove(&other)
    }

    /// Returns whether this participant must not give to `other`.
    pub fn conflicts_with(&self, other: ParticipantId) -> bool {
        self.conflicts.contains(&other)
    }

    /// Validates identity, contact fields and the conflict set.
    pub fn validate(&self) -> Result<(), ParticipantValidationError> {
        if self.id.is_nil() {
            return Err(ParticipantValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ParticipantValidationError::MissingName(self.id));
        }
        if self.nickname.trim().is_empty() {
            return Err(ParticipantValidationError::MissingNickname(self.id));
        }
        if self.email_address.trim().is_empty() {
            return Err(ParticipantValidationError::MissingEmailAddress(self.id));
        }
        if !is_valid_email_address(&self.email_address) {
            return Err(ParticipantValidationError::InvalidEmailAddress(self.id));
        }
        if self.conflicts.contains(&self.id) {
            return Err(ParticipantValidationError::SelfConflict(self.id));
        }
        Ok(())
    }
}

/// Per-participant validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantValidationError {
    NilId,
    MissingName(ParticipantId),
    MissingNickname(ParticipantId),
    MissingEmailAddress(ParticipantId),
    InvalidEmailAddress(ParticipantId),
    SelfConflict(ParticipantId),
}

impl Display for ParticipantValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "participant id must not be nil"),
            Self::MissingName(id) => write!(f, "participant {id} must have a name"),
            Self::MissingNickname(id) => write!(f, "participant {id} must have a nickname"),
            Self::MissingEmailAddress(id) => {
                write!(f, "participant {id} must have an email address")
            }
            Self::InvalidEmailAddress(id) => {
                write!(f, "participant {id} has a malformed email address")
            }
            Self::SelfConflict(id) => write!(f, "participant {id} conflicts with itself"),
        }
    }
}

impl Error for ParticipantValidationError {}

#[cfg(test)]
mod tests {
    use super::{is_valid_email_address, Participant, ParticipantValidationError};
    use uuid::Uuid;

    fn alice() -> Participant {
        Participant::with_id(Uuid::from_u128(1), "Alice", "Al", "alice@example.com")
    }

    #[test]
    fn add_conflict_ignores_self_and_duplicates() {
        let mut participant = alice();
        let other = Uuid::from_u128(2);

        participant.add_conflict(participant.id);
        participant.add_conflict(other);
        participant.add_conflict(other);

        assert_eq!(participant.conflicts.len(), 1);
        assert!(participant.conflicts_with(other));
        assert!(participant.remove_conflict(other));
        assert!(!participant.remove_conflict(other));
    }

    #[test]
    fn validate_reports_first_missing_field() {
        let mut participant = alice();
        participant.nickname = "  ".to_string();
        assert_eq!(
            participant.validate().unwrap_err(),
            ParticipantValidationError::MissingNickname(participant.id)
        );
    }

    #[test]
    fn validate_rejects_self_conflict_inserted_directly() {
        let mut participant = alice();
        participant.conflicts.insert(participant.id);
        assert_eq!(
            participant.validate().unwrap_err(),
            ParticipantValidationError::SelfConflict(participant.id)
        );
    }

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email_address("bob@example.org"));
        assert!(is_valid_email_address(" bob@mail.example.org "));
        assert!(!is_valid_email_address("bob"));
        assert!(!is_valid_email_address("bob@localhost"));
        assert!(!is_valid_email_address("b ob@example.org"));
    }
}
