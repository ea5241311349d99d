//! Directed conflict relation between participants.
//!
//! # Invariants
//! - The relation is directed and need not be symmetric.
//! - A lookup for an unknown giver forbids nothing.

use crate::model::participant::{Participant, ParticipantId};
use std::collections::{BTreeMap, BTreeSet};

/// Per-giver set of receivers that must never be assigned to that giver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictModel {
    forbidden: BTreeMap<ParticipantId, BTreeSet<ParticipantId>>,
}

impl ConflictModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the conflict sets declared on each participant.
    pub fn from_participants<'a>(participants: impl IntoIterator<Item = &'a Participant>) -> Self {
        let mut model = Self::new();
        for participant in participants {
            for other in &participant.conflicts {
                model.forbid(participant.id, *other);
            }
        }
        model
    }

    /// Records that `giver` must not give to `receiver`.
    pub fn forbid(&mut self, giver: ParticipantId, receiver: ParticipantId) {
        self.forbidden.entry(giver).or_default().insert(receiver);
    }

    /// Records the prohibition in both directions.
    pub fn forbid_mutual(&mut self, a: ParticipantId, b: ParticipantId) {
        self.forbid(a, b);
        self.forbid(b, a);
    }

    pub fn forbids(&self, giver: ParticipantId, receiver: ParticipantId) -> bool {
        self.forbidden
            .get(&giver)
            .is_some_and(|receivers| receivers.contains(&receiver))
    }

    /// Returns the receivers forbidden for `giver`, if any were declared.
    pub fn conflicts_of(&self, giver: ParticipantId) -> Option<&BTreeSet<ParticipantId>> {
        self.forbidden.get(&giver)
    }

    /// Number of directed prohibitions.
    pub fn len(&self) -> usize {
        self.forbidden.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::ConflictModel;
    use crate::model::participant::Participant;
    use uuid::Uuid;

    #[test]
    fn relation_is_directed() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let mut model = ConflictModel::new();
        model.forbid(a, b);

        assert!(model.forbids(a, b));
        assert!(!model.forbids(b, a));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn from_participants_reads_declared_conflicts() {
        let mut first = Participant::with_id(Uuid::from_u128(1), "A", "a", "a@example.com");
        let second = Participant::with_id(Uuid::from_u128(2), "B", "b", "b@example.com");
        first.add_conflict(second.id);

        let model = ConflictModel::from_participants([&first, &second]);
        assert!(model.forbids(first.id, second.id));
        assert!(model.conflicts_of(second.id).is_none());
    }

    #[test]
    fn mutual_prohibition_counts_twice() {
        let mut model = ConflictModel::new();
        model.forbid_mutual(Uuid::from_u128(1), Uuid::from_u128(2));
        assert_eq!(model.len(), 2);
        assert!(!model.is_empty());
    }
}
