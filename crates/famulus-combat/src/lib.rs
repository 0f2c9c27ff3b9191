//! Encounter automation: state machine, action policy, threat resolver.
//!
//! [`encounter::EncounterController`] drives a multi-round encounter
//! against the external service, asking [`policy`] for each round's
//! token, optionally resolving the `delevel` token through [`threat`],
//! and paying costs against the shared ledger after every response.
//!
//! # Modules
//!
//! - [`encounter`] -- The round-by-round state machine
//! - [`policy`] -- Pure settings-to-token proposal
//! - [`threat`] -- The weakening escalation ladder
//! - [`echo`] -- Session-log lines for submitted forms
//! - [`error`] -- Typed combat errors

pub mod echo;
pub mod encounter;
pub mod error;
pub mod policy;
pub mod threat;

pub use echo::describe_submission;
pub use encounter::{Encounter, EncounterController, EncounterOutcome, EncounterState};
pub use error::CombatError;
pub use threat::{Weakening, weakening_action};
