//! Production automation: recursive resolver and batch planner.
//!
//! [`resolver::resolve`] manufactures a requested quantity of a
//! derived item, recursing through its recipe tree against the shared
//! ledger; [`batch`] decomposes bulk-intermediate quantities into the
//! service's fixed denominations. Both poll the session's continuation
//! flag before every call and unwind cleanly when it is denied.
//!
//! # Modules
//!
//! - [`resolver`] -- The recursive production resolver
//! - [`batch`] -- Denomination planning for the bulk intermediate
//! - [`error`] -- Typed production errors

pub mod batch;
pub mod error;
pub mod resolver;

pub use batch::{DENOMINATIONS, plan};
pub use error::CraftError;
pub use resolver::{CraftOutcome, ProductionRequest, resolve, sort_by_name};
