//! Random giver/receiver assignment by bounded rejection sampling.
//!
//! # Responsibility
//! - Draw uniformly random derangements of the participant list and keep the
//!   first one that satisfies every conflict and reciprocal-pair rule.
//! - Keep randomness injectable so callers and tests control determinism.
//!
//! # Invariants
//! - A returned set always passes `AssignmentSet::verify` for the inputs.
//! - `max_attempts` bounds work, never correctness: when no valid candidate
//!   shows up in time, generation fails instead of relaxing a rule.
//! - The generator never touches exchange state.

use crate::model::assignment::{Assignment, AssignmentSet};
use crate::model::conflict::ConflictModel;
use crate::model::participant::ParticipantId;
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Coarse failure class used by callers to choose a reporting path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// Deployment bug; surface as an internal error.
    Configuration,
    /// User-fixable; suggest removing conflicts.
    ConstraintUnsatisfiable,
    /// Malformed caller input.
    InvalidInput,
}

/// Assignment generation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// `max_attempts` was below one.
    InvalidMaxAttempts(u32),
    /// Nothing to assign.
    NoParticipants,
    /// The same participant was listed twice.
    DuplicateParticipant(ParticipantId),
    /// Every attempt produced a candidate that broke a rule.
    AttemptsExhausted { participants: usize, attempts: u32 },
}

impl GenerationError {
    pub fn kind(&self) -> GenerationErrorKind {
        match self {
            Self::InvalidMaxAttempts(_) => GenerationErrorKind::Configuration,
            Self::NoParticipants | Self::AttemptsExhausted { .. } => {
                GenerationErrorKind::ConstraintUnsatisfiable
            }
            Self::DuplicateParticipant(_) => GenerationErrorKind::InvalidInput,
        }
    }

    pub fn is_unsatisfiable(&self) -> bool {
        self.kind() == GenerationErrorKind::ConstraintUnsatisfiable
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMaxAttempts(value) => write!(
                f,
                "internal error: configured maximum attempts must be at least 1, got {value}"
            ),
            Self::NoParticipants => write!(f, "cannot generate assignments without participants"),
            Self::DuplicateParticipant(id) => {
                write!(f, "participant {id} is listed more than once")
            }
            Self::AttemptsExhausted {
                participants,
                attempts,
            } => write!(
                f,
                "unable to generate assignments for {participants} participants after \
                 {attempts} attempts; consider removing some conflicts"
            ),
        }
    }
}

impl Error for GenerationError {}

/// Result of a generation run that may relax the reciprocal-pair rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedAssignments {
    pub assignments: AssignmentSet,
    /// Whether the returned set also avoids reciprocal pairs.
    pub avoided_reciprocal: bool,
}

/// Rejection-sampling assignment generator over an injected random source.
pub struct AssignmentGenerator<R: Rng> {
    rng: R,
}

impl AssignmentGenerator<StdRng> {
    /// Creates a generator seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Creates a reproducible generator.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AssignmentGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Assigns every participant exactly one receiver.
    ///
    /// # Contract
    /// - `max_attempts < 1` fails before the participants are looked at.
    /// - An empty list fails before any attempt.
    /// - Each attempt draws a uniformly random derangement and checks the full
    ///   candidate; the first valid one wins.
    /// - Fewer than two participants have no derangement, so every attempt fails.
    /// - With `avoid_reciprocal`, no two participants give to each other.
    ///
    /// # Errors
    /// - `InvalidMaxAttempts`, `NoParticipants`, `DuplicateParticipant`, or
    ///   `AttemptsExhausted` when no candidate passed within the budget.
    pub fn generate(
        &mut self,
        participants: &[ParticipantId],
        conflicts: &ConflictModel,
        avoid_reciprocal: bool,
        max_attempts: u32,
    ) -> Result<AssignmentSet, GenerationError> {
        if max_attempts < 1 {
            return Err(GenerationError::InvalidMaxAttempts(max_attempts));
        }
        if participants.is_empty() {
            return Err(GenerationError::NoParticipants);
        }
        let mut seen = HashSet::with_capacity(participants.len());
        for id in participants {
            if !seen.insert(*id) {
                return Err(GenerationError::DuplicateParticipant(*id));
            }
        }

        let mut receivers = participants.to_vec();
        for attempt in 1..=max_attempts {
            if !shuffle_into_derangement(&mut self.rng, participants, &mut receivers) {
                continue;
            }

            let Some(candidate) = pair_up(participants, &receivers) else {
                continue;
            };
            if candidate
                .verify(participants, conflicts, avoid_reciprocal)
                .is_ok()
            {
                debug!(
                    "event=assignments_generated module=generator status=ok participants={} attempts={} avoid_reciprocal={}",
                    participants.len(),
                    attempt,
                    avoid_reciprocal
                );
                return Ok(candidate);
            }
        }

        Err(GenerationError::AttemptsExhausted {
            participants: participants.len(),
            attempts: max_attempts,
        })
    }

    /// Tries without reciprocal pairs first, then allows them.
    ///
    /// Only an unsatisfiable first pass triggers the second pass; configuration
    /// and input errors are returned as-is.
    pub fn generate_with_fallback(
        &mut self,
        participants: &[ParticipantId],
        conflicts: &ConflictModel,
        max_attempts: u32,
    ) -> Result<GeneratedAssignments, GenerationError> {
        match self.generate(participants, conflicts, true, max_attempts) {
            Ok(assignments) => Ok(GeneratedAssignments {
                assignments,
                avoided_reciprocal: true,
            }),
            Err(err) if err.is_unsatisfiable() && !participants.is_empty() => {
                debug!(
                    "event=assignments_fallback module=generator status=retry participants={}",
                    participants.len()
                );
                let assignments = self.generate(participants, conflicts, false, max_attempts)?;
                Ok(GeneratedAssignments {
                    assignments,
                    avoided_reciprocal: false,
                })
            }
            Err(err) => Err(err),
        }
    }
}

/// Reshuffles `receivers` until no slot matches its giver.
///
/// Rejecting whole shuffles keeps every derangement equally likely. Returns
/// `false` for fewer than two slots, where no derangement exists.
fn shuffle_into_derangement<R: Rng>(
    rng: &mut R,
    givers: &[ParticipantId],
    receivers: &mut [ParticipantId],
) -> bool {
    if receivers.len() < 2 {
        return false;
    }
    loop {
        receivers.shuffle(rng);
        if givers.iter().zip(receivers.iter()).all(|(g, r)| g != r) {
            return true;
        }
    }
}

fn pair_up(givers: &[ParticipantId], receivers: &[ParticipantId]) -> Option<AssignmentSet> {
    let mut set = AssignmentSet::with_capacity(givers.len());
    for (giver, receiver) in givers.iter().zip(receivers) {
        let assignment = Assignment::new(*giver, *receiver).ok()?;
        set.insert(assignment).ok()?;
    }
    Some(set)
}

#[cfg(test)]
mod tests {
    use super::{
        shuffle_into_derangement, AssignmentGenerator, GenerationError, GenerationErrorKind,
    };
    use crate::model::conflict::ConflictModel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn ids(count: u128) -> Vec<Uuid> {
        (1..=count).map(Uuid::from_u128).collect()
    }

    #[test]
    fn derangement_shuffle_clears_fixed_points_and_keeps_members() {
        let mut rng = StdRng::seed_from_u64(11);
        for len in 2..8u128 {
            let givers = ids(len);
            let mut receivers = givers.clone();
            assert!(shuffle_into_derangement(&mut rng, &givers, &mut receivers));
            assert!(givers.iter().zip(&receivers).all(|(g, r)| g != r));

            let mut sorted = receivers.clone();
            sorted.sort();
            assert_eq!(sorted, givers);
        }
    }

    #[test]
    fn derangement_shuffle_gives_up_below_two_slots() {
        let mut rng = StdRng::seed_from_u64(11);
        let single = ids(1);
        let mut receivers = single.clone();
        assert!(!shuffle_into_derangement(&mut rng, &single, &mut receivers));
        assert!(!shuffle_into_derangement(&mut rng, &[], &mut []));
    }

    #[test]
    fn zero_attempts_is_a_configuration_error_even_without_participants() {
        let mut generator = AssignmentGenerator::seeded(1);
        let err = generator
            .generate(&[], &ConflictModel::new(), false, 0)
            .unwrap_err();
        assert_eq!(err, GenerationError::InvalidMaxAttempts(0));
        assert_eq!(err.kind(), GenerationErrorKind::Configuration);
    }

    #[test]
    fn duplicate_ids_are_invalid_input() {
        let mut generator = AssignmentGenerator::seeded(1);
        let id = Uuid::from_u128(1);
        let err = generator
            .generate(&[id, Uuid::from_u128(2), id], &ConflictModel::new(), false, 5)
            .unwrap_err();
        assert_eq!(err, GenerationError::DuplicateParticipant(id));
        assert_eq!(err.kind(), GenerationErrorKind::InvalidInput);
    }

    #[test]
    fn fallback_allows_reciprocal_pair_for_two_people() {
        let mut generator = AssignmentGenerator::seeded(3);
        let participants = ids(2);
        let outcome = generator
            .generate_with_fallback(&participants, &ConflictModel::new(), 4)
            .unwrap();

        assert!(!outcome.avoided_reciprocal);
        assert_eq!(outcome.assignments.receiver_of(participants[0]), Some(participants[1]));
    }

    #[test]
    fn fallback_keeps_strict_result_when_possible() {
        let mut generator = AssignmentGenerator::seeded(5);
        let participants = ids(5);
        let outcome = generator
            .generate_with_fallback(&participants, &ConflictModel::new(), 200)
            .unwrap();

        assert!(outcome.avoided_reciprocal);
        assert!(outcome
            .assignments
            .verify(&participants, &ConflictModel::new(), true)
            .is_ok());
    }

    #[test]
    fn fallback_does_not_retry_configuration_errors() {
        let mut generator = AssignmentGenerator::seeded(5);
        let err = generator
            .generate_with_fallback(&ids(3), &ConflictModel::new(), 0)
            .unwrap_err();
        assert_eq!(err.kind(), GenerationErrorKind::Configuration);
    }
}
