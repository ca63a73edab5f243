//! Sudoers audit and rewrite.
//!
//! `parser` turns the file into a [`table::PrivilegeTable`], `audit` walks each
//! rule with the operator, and `pipeline` ties backup, audit and the
//! visudo-checked write together.

pub mod audit;
pub mod entry;
pub mod groups;
pub mod parser;
pub mod pipeline;
pub mod table;

pub use pipeline::{CommitStatus, SudoersAuditor, SudoersRunReport};
