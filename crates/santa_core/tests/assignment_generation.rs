use rand::rngs::StdRng;
use rand::SeedableRng;
use santa_core::{
    Assignment, AssignmentGenerator, AssignmentSet, ConflictModel, GenerationError,
    GenerationErrorKind, ParticipantId,
};
use std::collections::HashMap;
use uuid::Uuid;

fn ids(count: u128) -> Vec<ParticipantId> {
    (1..=count).map(Uuid::from_u128).collect()
}

fn assert_permutation(set: &AssignmentSet, participants: &[ParticipantId]) {
    assert_eq!(set.len(), participants.len());
    for id in participants {
        assert!(set.receiver_of(*id).is_some(), "{id} gives nothing");
        assert!(set.giver_of(*id).is_some(), "{id} receives nothing");
    }
}

#[test]
fn valid_outputs_are_derangements_respecting_conflicts() {
    let participants = ids(8);
    let mut conflicts = ConflictModel::new();
    conflicts.forbid_mutual(participants[0], participants[1]);
    conflicts.forbid_mutual(participants[2], participants[3]);
    conflicts.forbid(participants[4], participants[5]);

    for seed in 0..50u64 {
        let mut generator = AssignmentGenerator::new(StdRng::seed_from_u64(seed));
        let set = generator
            .generate(&participants, &conflicts, true, 500)
            .unwrap();

        assert_permutation(&set, &participants);
        for assignment in &set {
            assert_ne!(assignment.giver(), assignment.receiver());
            assert!(!conflicts.forbids(assignment.giver(), assignment.receiver()));
            assert_ne!(set.receiver_of(assignment.receiver()), Some(assignment.giver()));
        }
    }
}

#[test]
fn two_participants_single_attempt_always_swap() {
    let participants = ids(2);
    for seed in 0..100u64 {
        let mut generator = AssignmentGenerator::seeded(seed);
        let set = generator
            .generate(&participants, &ConflictModel::new(), false, 1)
            .unwrap();

        assert_eq!(set.receiver_of(participants[0]), Some(participants[1]));
        assert_eq!(set.receiver_of(participants[1]), Some(participants[0]));
    }
}

#[test]
fn two_participants_without_reciprocal_pairs_never_succeed() {
    let participants = ids(2);
    for max_attempts in [1, 5, 250] {
        let mut generator = AssignmentGenerator::seeded(u64::from(max_attempts));
        let err = generator
            .generate(&participants, &ConflictModel::new(), true, max_attempts)
            .unwrap_err();

        assert_eq!(
            err,
            GenerationError::AttemptsExhausted {
                participants: 2,
                attempts: max_attempts
            }
        );
        assert_eq!(err.kind(), GenerationErrorKind::ConstraintUnsatisfiable);
        assert!(err.to_string().contains("removing some conflicts"));
    }
}

#[test]
fn empty_participant_set_fails_regardless_of_budget() {
    for max_attempts in [1, 10, 10_000] {
        let mut generator = AssignmentGenerator::seeded(0);
        let err = generator
            .generate(&[], &ConflictModel::new(), false, max_attempts)
            .unwrap_err();
        assert_eq!(err, GenerationError::NoParticipants);
        assert!(err.is_unsatisfiable());
    }
}

#[test]
fn single_participant_exhausts_attempts() {
    let mut generator = AssignmentGenerator::seeded(0);
    let err = generator
        .generate(&ids(1), &ConflictModel::new(), false, 7)
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::AttemptsExhausted {
            participants: 1,
            attempts: 7
        }
    );
}

#[test]
fn zero_attempts_is_configuration_error() {
    let mut generator = AssignmentGenerator::seeded(0);
    let err = generator
        .generate(&ids(4), &ConflictModel::new(), false, 0)
        .unwrap_err();
    assert_eq!(err.kind(), GenerationErrorKind::Configuration);
}

#[test]
fn constrained_trio_converges_to_unique_solution() {
    let participants = ids(3);
    let (p1, p2, p3) = (participants[0], participants[1], participants[2]);
    let mut conflicts = ConflictModel::new();
    conflicts.forbid(p1, p2);
    conflicts.forbid(p2, p3);

    let mut expected = AssignmentSet::new();
    for (giver, receiver) in [(p1, p3), (p2, p1), (p3, p2)] {
        expected
            .insert(Assignment::new(giver, receiver).unwrap())
            .unwrap();
    }

    for seed in 0..100u64 {
        let mut generator = AssignmentGenerator::seeded(seed);
        let set = generator
            .generate(&participants, &conflicts, false, 200)
            .unwrap();

        assert_eq!(set, expected);
        assert!(set.verify(&participants, &conflicts, false).is_ok());
    }
}

#[test]
fn same_seed_gives_same_assignments() {
    let participants = ids(10);
    let conflicts = ConflictModel::new();

    let first = AssignmentGenerator::seeded(42)
        .generate(&participants, &conflicts, true, 100)
        .unwrap();
    let second = AssignmentGenerator::seeded(42)
        .generate(&participants, &conflicts, true, 100)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn impossible_conflicts_fail_instead_of_bending_rules() {
    let participants = ids(4);
    let mut conflicts = ConflictModel::new();
    for receiver in &participants[1..] {
        conflicts.forbid(participants[0], *receiver);
    }

    let err = AssignmentGenerator::seeded(9)
        .generate(&participants, &conflicts, false, 300)
        .unwrap_err();
    assert!(err.is_unsatisfiable());
}

fn receiver_order(set: &AssignmentSet, participants: &[ParticipantId]) -> Vec<ParticipantId> {
    participants
        .iter()
        .map(|giver| set.receiver_of(*giver).unwrap())
        .collect()
}

fn tally_single_attempts(count: u128, seeds: u64) -> HashMap<Vec<ParticipantId>, u32> {
    let participants = ids(count);
    let conflicts = ConflictModel::new();
    let mut tally = HashMap::new();
    for seed in 0..seeds {
        let set = AssignmentGenerator::seeded(seed)
            .generate(&participants, &conflicts, false, 1)
            .unwrap();
        *tally.entry(receiver_order(&set, &participants)).or_insert(0) += 1;
    }
    tally
}

#[test]
fn three_participants_pick_both_cycles_evenly() {
    let tally = tally_single_attempts(3, 6000);

    assert_eq!(tally.len(), 2);
    for (order, hits) in &tally {
        assert!((2700..=3300).contains(hits), "{order:?} drawn {hits} times");
    }
}

#[test]
fn four_participants_pick_every_derangement_evenly() {
    let tally = tally_single_attempts(4, 9000);

    assert_eq!(tally.len(), 9);
    for (order, hits) in &tally {
        assert!((800..=1200).contains(hits), "{order:?} drawn {hits} times");
    }
}
