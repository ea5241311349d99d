//! Domain model for gift exchanges.
//!
//! # Responsibility
//! - Define exchanges, participants, conflicts and assignments.
//! - Define the template override records consumed by the resolver.
//!
//! # Invariants
//! - Every participant is identified by a stable `ParticipantId`.
//! - Assignment sets are derived artifacts; nothing here persists them.

pub mod assignment;
pub mod conflict;
pub mod exchange;
pub mod participant;
pub mod template;
