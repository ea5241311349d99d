//! Assignment model: who gives a gift to whom.
//!
//! # Responsibility
//! - Define the giver/receiver pair and the indexed set of pairs.
//! - Verify a candidate set against the derangement, conflict and
//!   reciprocal-pair invariants.
//!
//! # Invariants
//! - `giver != receiver` for every assignment.
//! - Within a set, each participant appears at most once as giver and at most
//!   once as receiver.
//! - A verified set is a derangement of the participant list.

use crate::model::conflict::ConflictModel;
use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One giver/receiver pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAssignment")]
pub struct Assignment {
    giver: ParticipantId,
    receiver: ParticipantId,
}

#[derive(Deserialize)]
struct RawAssignment {
    giver: ParticipantId,
    receiver: ParticipantId,
}

impl TryFrom<RawAssignment> for Assignment {
    type Error = AssignmentError;

    fn try_from(value: RawAssignment) -> Result<Self, Self::Error> {
        Self::new(value.giver, value.receiver)
    }
}

impl Assignment {
    /// Creates a pair, rejecting a participant giving to itself.
    pub fn new(giver: ParticipantId, receiver: ParticipantId) -> Result<Self, AssignmentError> {
        if giver == receiver {
            return Err(AssignmentError::SelfAssignment(giver));
        }
        Ok(Self { giver, receiver })
    }

    pub fn giver(&self) -> ParticipantId {
        self.giver
    }

    pub fn receiver(&self) -> ParticipantId {
        self.receiver
    }
}

/// Structural errors raised while building assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    SelfAssignment(ParticipantId),
    DuplicateGiver(ParticipantId),
    DuplicateReceiver(ParticipantId),
}

impl Display for AssignmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfAssignment(id) => write!(f, "participant {id} cannot give to itself"),
            Self::DuplicateGiver(id) => write!(f, "participant {id} already has a receiver"),
            Self::DuplicateReceiver(id) => write!(f, "participant {id} already has a giver"),
        }
    }
}

impl Error for AssignmentError {}

/// Invariant violated by a candidate assignment set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentViolation {
    SizeMismatch { expected: usize, actual: usize },
    MissingGiver(ParticipantId),
    MissingReceiver(ParticipantId),
    Conflict {
        giver: ParticipantId,
        receiver: ParticipantId,
    },
    ReciprocalPair {
        first: ParticipantId,
        second: ParticipantId,
    },
}

impl Display for AssignmentViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => write!(
                f,
                "assignment count {actual} does not match participant count {expected}"
            ),
            Self::MissingGiver(id) => write!(f, "participant {id} has no giver"),
            Self::MissingReceiver(id) => write!(f, "participant {id} has no receiver"),
            Self::Conflict { giver, receiver } => {
                write!(f, "participant {giver} must not give to {receiver}")
            }
            Self::ReciprocalPair { first, second } => {
                write!(f, "participants {first} and {second} give to each other")
            }
        }
    }
}

impl Error for AssignmentViolation {}

/// Assignments indexed by giver and by receiver.
///
/// Iteration follows insertion order. Serialized as a plain list; the
/// indexes are rebuilt (and uniqueness re-checked) on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Assignment>", into = "Vec<Assignment>")]
pub struct AssignmentSet {
    assignments: Vec<Assignment>,
    by_giver: HashMap<ParticipantId, usize>,
    by_receiver: HashMap<ParticipantId, usize>,
}

impl AssignmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            assignments: Vec::with_capacity(capacity),
            by_giver: HashMap::with_capacity(capacity),
            by_receiver: HashMap::with_capacity(capacity),
        }
    }

    /// Adds one assignment, rejecting a repeated giver or receiver.
    pub fn insert(&mut self, assignment: Assignment) -> Result<(), AssignmentError> {
        if self.by_giver.contains_key(&assignment.giver) {
            return Err(AssignmentError::DuplicateGiver(assignment.giver));
        }
        if self.by_receiver.contains_key(&assignment.receiver) {
            return Err(AssignmentError::DuplicateReceiver(assignment.receiver));
        }

        self.push_indexed(assignment);
        Ok(())
    }

    fn push_indexed(&mut self, assignment: Assignment) {
        let index = self.assignments.len();
        self.by_giver.insert(assignment.giver, index);
        self.by_receiver.insert(assignment.receiver, index);
        self.assignments.push(assignment);
    }

    /// Returns who `giver` gives to.
    pub fn receiver_of(&self, giver: ParticipantId) -> Option<ParticipantId> {
        self.by_giver
            .get(&giver)
            .map(|index| self.assignments[*index].receiver)
    }

    /// Returns who gives to `receiver`.
    pub fn giver_of(&self, receiver: ParticipantId) -> Option<ParticipantId> {
        self.by_receiver
            .get(&receiver)
            .map(|index| self.assignments[*index].giver)
    }

    /// Returns the assignment whose giver is `giver`.
    pub fn assignment_for_giver(&self, giver: ParticipantId) -> Option<&Assignment> {
        self.by_giver
            .get(&giver)
            .map(|index| &self.assignments[*index])
    }

    /// Returns a new set holding only the listed givers' assignments.
    ///
    /// Givers without an assignment and repeated givers are skipped.
    pub fn subset_for_givers(&self, givers: &[ParticipantId]) -> Self {
        let mut subset = Self::with_capacity(givers.len());
        for giver in givers {
            if subset.by_giver.contains_key(giver) {
                continue;
            }
            if let Some(assignment) = self.assignment_for_giver(*giver) {
                // Receivers are unique in `self`, so distinct givers cannot collide.
                subset.push_indexed(*assignment);
            }
        }
        subset
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.assignments.iter()
    }

    /// Checks that this set is a valid outcome for `participants`.
    ///
    /// # Contract
    /// - Every participant gives exactly once and receives exactly once.
    /// - No receiver is in its giver's conflict set.
    /// - With `avoid_reciprocal`, no two participants give to each other.
    pub fn verify(
        &self,
        participants: &[ParticipantId],
        conflicts: &ConflictModel,
        avoid_reciprocal: bool,
    ) -> Result<(), AssignmentViolation> {
        if self.len() != participants.len() {
            return Err(AssignmentViolation::SizeMismatch {
                expected: participants.len(),
                actual: self.len(),
            });
        }

        // With equal counts and unique indexes, full coverage of both
        // directions makes the set a permutation of `participants`.
        for participant in participants {
            if !self.by_giver.contains_key(participant) {
                return Err(AssignmentViolation::MissingReceiver(*participant));
            }
            if !self.by_receiver.contains_key(participant) {
                return Err(AssignmentViolation::MissingGiver(*participant));
            }
        }

        for assignment in &self.assignments {
            if conflicts.forbids(assignment.giver, assignment.receiver) {
                return Err(AssignmentViolation::Conflict {
                    giver: assignment.giver,
                    receiver: assignment.receiver,
                });
            }
            if avoid_reciprocal && self.receiver_of(assignment.receiver) == Some(assignment.giver)
            {
                return Err(AssignmentViolation::ReciprocalPair {
                    first: assignment.giver,
                    second: assignment.receiver,
                });
            }
        }

        Ok(())
    }
}

impl PartialEq for AssignmentSet {
    fn eq(&self, other: &Self) -> bool {
        self.assignments == other.assignments
    }
}

impl Eq for AssignmentSet {}

impl TryFrom<Vec<Assignment>> for AssignmentSet {
    type Error = AssignmentError;

    fn try_from(value: Vec<Assignment>) -> Result<Self, Self::Error> {
        let mut set = Self::with_capacity(value.len());
        for assignment in value {
            set.insert(assignment)?;
        }
        Ok(set)
    }
}

impl From<AssignmentSet> for Vec<Assignment> {
    fn from(value: AssignmentSet) -> Self {
        value.assignments
    }
}

impl<'a> IntoIterator for &'a AssignmentSet {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
