//! Exchange aggregate: participants, organizer, overrides and lifecycle.
//!
//! # Responsibility
//! - Own the participant list and keep conflicts pointing at co-members.
//! - Track lifecycle state (`new -> started -> generated -> sent`).
//! - Collect every validation problem in one pass for user-facing reporting.
//!
//! # Invariants
//! - Participant ids are unique within an exchange.
//! - Conflicts reference only participants of the same exchange.
//! - State only moves forward, except that regeneration returns to
//!   `generated`.

use crate::model::assignment::AssignmentSet;
use crate::model::conflict::ConflictModel;
use crate::model::participant::{
    is_valid_email_address, Participant, ParticipantId, ParticipantValidationError,
};
use crate::model::template::TemplateOverride;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of an exchange.
pub type ExchangeId = Uuid;

/// Minimum participant count accepted for generation.
pub const MIN_PARTICIPANTS: usize = 2;

/// Exchange lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    /// Created, never saved.
    New,
    /// Saved at least once.
    Started,
    /// Assignments exist.
    Generated,
    /// Notifications went out.
    Sent,
}

impl ExchangeState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Started => "started",
            Self::Generated => "generated",
            Self::Sent => "sent",
        }
    }
}

/// Person running the exchange; receives replies and previews.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    pub name: String,
    pub email_address: Option<String>,
    pub phone_number: Option<String>,
}

impl Organizer {
    pub fn new(name: impl Into<String>, email_address: Option<String>) -> Self {
        Self {
            name: name.into(),
            email_address,
            phone_number: None,
        }
    }

    /// Returns the trimmed email address when one is set and non-blank.
    pub fn contact_email(&self) -> Option<&str> {
        self.email_address
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn contact_phone(&self) -> Option<&str> {
        self.phone_number
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// A named gift exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub id: ExchangeId,
    pub name: String,
    pub date_and_time: String,
    pub theme: String,
    pub cost: String,
    /// Free text appended to every notification.
    #[serde(default)]
    pub extra_info: Option<String>,
    pub organizer: Organizer,
    #[serde(default)]
    pub template_overrides: TemplateOverride,
    participants: Vec<Participant>,
    #[serde(default)]
    pub assignments: Option<AssignmentSet>,
    state: ExchangeState,
}

impl Exchange {
    /// Creates an empty exchange in state `new`.
    pub fn new(name: impl Into<String>, organizer: Organizer) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            date_and_time: String::new(),
            theme: String::new(),
            cost: String::new(),
            extra_info: None,
            organizer,
            template_overrides: TemplateOverride::default(),
            participants: Vec::new(),
            assignments: None,
            state: ExchangeState::New,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// `new -> started`; any later state is left untouched.
    pub fn mark_started(&mut self) {
        if self.state == ExchangeState::New {
            self.state = ExchangeState::Started;
        }
    }

    /// Moves to `generated`, including regeneration from `generated`/`sent`.
    pub fn mark_generated(&mut self) {
        self.state = ExchangeState::Generated;
    }

    /// `generated -> sent`.
    pub fn mark_sent(&mut self) -> Result<(), ExchangeStateError> {
        match self.state {
            ExchangeState::Generated | ExchangeState::Sent => {
                self.state = ExchangeState::Sent;
                Ok(())
            }
            other => Err(ExchangeStateError {
                from: other,
                to: ExchangeState::Sent,
            }),
        }
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.id).collect()
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    /// Appends a participant, rejecting an id that is already present.
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), ExchangeValidationError> {
        if self.participant(participant.id).is_some() {
            return Err(ExchangeValidationError::single(
                ExchangeProblem::DuplicateParticipant(participant.id),
            ));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// Replaces the participant with the same id. Returns whether one was found.
    pub fn replace_participant(&mut self, participant: Participant) -> bool {
        match self.participant_mut(participant.id) {
            Some(slot) => {
                *slot = participant;
                true
            }
            None => false,
        }
    }

    /// Removes a participant and every conflict pointing at it.
    pub fn remove_participant(&mut self, id: ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id == id)?;
        let removed = self.participants.remove(index);
        for participant in &mut self.participants {
            participant.remove_conflict(id);
        }
        Some(removed)
    }

    /// Builds the directed conflict relation declared by the participants.
    pub fn conflict_model(&self) -> ConflictModel {
        ConflictModel::from_participants(&self.participants)
    }

    /// Checks every exchange-level rule and reports all failures at once.
    pub fn validate(&self) -> Result<(), ExchangeValidationError> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push(ExchangeProblem::MissingField("name"));
        }
        if self.date_and_time.trim().is_empty() {
            problems.push(ExchangeProblem::MissingField("date_and_time"));
        }
        if self.theme.trim().is_empty() {
            problems.push(ExchangeProblem::MissingField("theme"));
        }
        if self.cost.trim().is_empty() {
            problems.push(ExchangeProblem::MissingField("cost"));
        }
        if self.organizer.name.trim().is_empty() {
            problems.push(ExchangeProblem::MissingField("organizer_name"));
        }
        match (self.organizer.contact_email(), self.organizer.contact_phone()) {
            (None, None) => problems.push(ExchangeProblem::MissingOrganizerContact),
            (Some(email), _) if !is_valid_email_address(email) => {
                problems.push(ExchangeProblem::InvalidOrganizerEmail)
            }
            _ => {}
        }
        if self.participants.len() < MIN_PARTICIPANTS {
            problems.push(ExchangeProblem::TooFewParticipants {
                required: MIN_PARTICIPANTS,
                actual: self.participants.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for participant in &self.participants {
            if !seen.insert(participant.id) {
                problems.push(ExchangeProblem::DuplicateParticipant(participant.id));
            }
            if let Err(err) = participant.validate() {
                problems.push(ExchangeProblem::Participant(err));
            }
        }
        for participant in &self.participants {
            for conflict in &participant.conflicts {
                if *conflict != participant.id && !seen.contains(conflict) {
                    problems.push(ExchangeProblem::ForeignConflict {
                        participant: participant.id,
                        conflict: *conflict,
                    });
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ExchangeValidationError { problems })
        }
    }
}

/// One reason an exchange is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeProblem {
    MissingField(&'static str),
    MissingOrganizerContact,
    InvalidOrganizerEmail,
    TooFewParticipants { required: usize, actual: usize },
    DuplicateParticipant(ParticipantId),
    Participant(ParticipantValidationError),
    ForeignConflict {
        participant: ParticipantId,
        conflict: ParticipantId,
    },
}

impl Display for ExchangeProblem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::MissingOrganizerContact => {
                write!(f, "organizer needs an email address, a phone number, or both")
            }
            Self::InvalidOrganizerEmail => write!(f, "organizer email address is malformed"),
            Self::TooFewParticipants { required, actual } => write!(
                f,
                "at least {required} participants are required, found {actual}"
            ),
            Self::DuplicateParticipant(id) => write!(f, "participant {id} appears twice"),
            Self::Participant(err) => write!(f, "{err}"),
            Self::ForeignConflict {
                participant,
                conflict,
            } => write!(
                f,
                "participant {participant} conflicts with {conflict}, who is not in this exchange"
            ),
        }
    }
}

/// Aggregated exchange validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeValidationError {
    pub problems: Vec<ExchangeProblem>,
}

impl ExchangeValidationError {
    fn single(problem: ExchangeProblem) -> Self {
        Self {
            problems: vec![problem],
        }
    }

    pub fn contains(&self, problem: &ExchangeProblem) -> bool {
        self.problems.contains(problem)
    }
}

impl Display for ExchangeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "exchange is invalid")?;
        for (index, problem) in self.problems.iter().enumerate() {
            let separator = if index == 0 { ": " } else { "; " };
            write!(f, "{separator}{problem}")?;
        }
        Ok(())
    }
}

impl Error for ExchangeValidationError {}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeStateError {
    pub from: ExchangeState,
    pub to: ExchangeState,
}

impl Display for ExchangeStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "exchange cannot move from `{}` to `{}`",
            self.from.as_str(),
            self.to.as_str()
        )
    }
}

impl Error for ExchangeStateError {}

#[cfg(test)]
mod tests {
    use super::{Exchange, ExchangeProblem, ExchangeState, Organizer};
    use crate::model::participant::Participant;
    use uuid::Uuid;

    fn participant(n: u128) -> Participant {
        Participant::with_id(
            Uuid::from_u128(n),
            format!("Person {n}"),
            format!("p{n}"),
            format!("p{n}@example.com"),
        )
    }

    fn valid_exchange() -> Exchange {
        let mut exchange = Exchange::new(
            "Office party",
            Organizer::new("Olive", Some("olive@example.com".to_string())),
        );
        exchange.date_and_time = "Dec 20, 6pm".to_string();
        exchange.theme = "Books".to_string();
        exchange.cost = "$20".to_string();
        exchange.add_participant(participant(1)).unwrap();
        exchange.add_participant(participant(2)).unwrap();
        exchange
    }

    #[test]
    fn valid_exchange_passes() {
        assert!(valid_exchange().validate().is_ok());
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut exchange = Exchange::new("", Organizer::default());
        exchange.add_participant(participant(1)).unwrap();

        let err = exchange.validate().unwrap_err();
        assert!(err.contains(&ExchangeProblem::MissingField("name")));
        assert!(err.contains(&ExchangeProblem::MissingField("theme")));
        assert!(err.contains(&ExchangeProblem::MissingField("organizer_name")));
        assert!(err.contains(&ExchangeProblem::MissingOrganizerContact));
        assert!(err.contains(&ExchangeProblem::TooFewParticipants {
            required: 2,
            actual: 1
        }));
        assert!(err.to_string().starts_with("exchange is invalid: "));
    }

    #[test]
    fn organizer_phone_alone_is_enough() {
        let mut exchange = valid_exchange();
        exchange.organizer.email_address = None;
        exchange.organizer.phone_number = Some("555-0100".to_string());
        assert!(exchange.validate().is_ok());
    }

    #[test]
    fn conflicts_must_reference_members() {
        let mut exchange = valid_exchange();
        let stranger = Uuid::from_u128(77);
        exchange
            .participant_mut(Uuid::from_u128(1))
            .unwrap()
            .add_conflict(stranger);

        let err = exchange.validate().unwrap_err();
        assert_eq!(
            err.problems,
            vec![ExchangeProblem::ForeignConflict {
                participant: Uuid::from_u128(1),
                conflict: stranger,
            }]
        );
    }

    #[test]
    fn add_participant_rejects_duplicate_id() {
        let mut exchange = valid_exchange();
        let err = exchange.add_participant(participant(2)).unwrap_err();
        assert!(err.contains(&ExchangeProblem::DuplicateParticipant(Uuid::from_u128(2))));
    }

    #[test]
    fn remove_participant_drops_dangling_conflicts() {
        let mut exchange = valid_exchange();
        exchange.add_participant(participant(3)).unwrap();
        exchange
            .participant_mut(Uuid::from_u128(1))
            .unwrap()
            .add_conflict(Uuid::from_u128(3));

        let removed = exchange.remove_participant(Uuid::from_u128(3)).unwrap();
        assert_eq!(removed.id, Uuid::from_u128(3));
        assert!(exchange.participant(Uuid::from_u128(1)).unwrap().conflicts.is_empty());
        assert!(exchange.remove_participant(Uuid::from_u128(3)).is_none());
    }

    #[test]
    fn replace_participant_matches_by_id() {
        let mut exchange = valid_exchange();
        let mut updated = participant(2);
        updated.nickname = "Two".to_string();

        assert!(exchange.replace_participant(updated));
        assert_eq!(exchange.participant(Uuid::from_u128(2)).unwrap().nickname, "Two");
        assert!(!exchange.replace_participant(participant(9)));
    }

    #[test]
    fn lifecycle_transitions() {
        let mut exchange = valid_exchange();
        assert_eq!(exchange.state(), ExchangeState::New);
        assert!(exchange.mark_sent().is_err());

        exchange.mark_started();
        exchange.mark_started();
        assert_eq!(exchange.state(), ExchangeState::Started);

        exchange.mark_generated();
        exchange.mark_sent().unwrap();
        assert_eq!(exchange.state(), ExchangeState::Sent);

        exchange.mark_started();
        assert_eq!(exchange.state(), ExchangeState::Sent);

        exchange.mark_generated();
        assert_eq!(exchange.state(), ExchangeState::Generated);
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_value(valid_exchange()).unwrap();
        assert_eq!(json["state"], "new");
        assert_eq!(json["participants"].as_array().unwrap().len(), 2);
    }
}
