//! Error types for formula construction and rewriting.

use thiserror::Error;

use crate::formula::FormulaType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    #[error("{operation} is not supported on {kind} formulas")]
    NotSupported {
        operation: &'static str,
        kind: FormulaType,
    },
    #[error("{kind} formula has no modal power")]
    NotModal { kind: FormulaType },
    #[error("Unknown axiom id {0}")]
    UnknownAxiom(u32),
    #[error("Cannot parse formula near '{near}'")]
    Parse { near: String },
}
