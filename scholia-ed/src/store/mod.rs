//! Store layer: validated, gated, transactional operations
//!
//! Every mutating operation here follows the same contract: validation
//! and the privilege gate run before a transaction opens, then the row
//! change and its revision log entry commit together or not at all.

pub mod comments;
pub mod revlog;
pub mod stats;
pub mod texts;
pub mod users;
pub mod vocab;
