pub mod error;
pub mod formula;
pub mod wasm;

pub use error::FormulaError;
pub use formula::{
    parse, Axiom, Formula, FormulaKind, FormulaType, Modal, ModalKind, ModalSystem,
};
