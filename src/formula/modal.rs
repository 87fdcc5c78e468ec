use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::FormulaError;

use super::{hash, merged_power, Formula, FormulaKind, Modal, ModalKind};

/// Modal axiom schemas driving [`Formula::axiom_simplify`].
///
/// The discriminant is the numeric id used by solver front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
pub enum Axiom {
    /// `□φ → φ`, reflexive frames.
    T = 1,
    /// `φ → □◇φ`, symmetric frames. Licenses `◇□φ → φ` below another operator.
    B = 2,
    /// `□φ → ◇φ`, serial frames.
    D = 3,
    /// `□φ → □□φ`, transitive frames.
    Four = 4,
    /// `◇φ → □◇φ`, euclidean frames.
    Five = 5,
}

impl Axiom {
    pub fn all_variants() -> &'static [Axiom] {
        &[Axiom::T, Axiom::B, Axiom::D, Axiom::Four, Axiom::Five]
    }

    pub fn from_id(id: u32) -> Result<Self, FormulaError> {
        Self::all_variants()
            .iter()
            .copied()
            .find(|axiom| axiom.id() == id)
            .ok_or(FormulaError::UnknownAxiom(id))
    }

    pub fn id(self) -> u32 {
        self as u32
    }

    fn erases_box_under_diamond(self) -> bool {
        self == Axiom::B
    }
}

impl Formula {
    /// Merges every modal node with a directly nested node of the same kind and
    /// modality. Purely structural: no constant folding.
    pub fn modal_flatten(&self) -> Self {
        match self.kind() {
            FormulaKind::True | FormulaKind::False | FormulaKind::Atom(_) => self.clone(),
            FormulaKind::Not(content) => self.with_content(content.modal_flatten()),
            FormulaKind::And(lhs, rhs) | FormulaKind::Or(lhs, rhs) => {
                self.with_operands(lhs.modal_flatten(), rhs.modal_flatten())
            }
            FormulaKind::Box(modal) => {
                self.with_subformula(ModalKind::Box, modal, modal.subformula.modal_flatten())
            }
            FormulaKind::Diamond(modal) => {
                self.with_subformula(ModalKind::Diamond, modal, modal.subformula.modal_flatten())
            }
        }
    }

    /// Bounds modal nesting according to `axiom`.
    ///
    /// `depth` is the number of modal operators above this node. A modal node passes
    /// `depth + power` down and keeps power 1 when nested, at most 2 at the top.
    /// Under [`Axiom::B`] a nested diamond directly over a box is erased together with
    /// that box, and any other nested diamond is left as is.
    ///
    /// Bounded nodes are rebuilt through [`Formula::new_modal`], so a run exposed by an
    /// erasure merges back into its parent and may end up above the bound.
    /// `[1]<2>[3][1]q` under `B` becomes `[1][1]q`.
    pub fn axiom_simplify(&self, axiom: Axiom, depth: u32) -> Self {
        match self.kind() {
            FormulaKind::True | FormulaKind::False | FormulaKind::Atom(_) => self.clone(),
            FormulaKind::Not(content) => self.with_content(content.axiom_simplify(axiom, depth)),
            FormulaKind::And(lhs, rhs) | FormulaKind::Or(lhs, rhs) => self.with_operands(
                lhs.axiom_simplify(axiom, depth),
                rhs.axiom_simplify(axiom, depth),
            ),
            FormulaKind::Diamond(modal) if axiom.erases_box_under_diamond() && depth >= 1 => {
                match modal.subformula.kind() {
                    FormulaKind::Box(inner) => {
                        trace!(depth, modality = modal.modality, "erasing diamond over box");
                        inner.subformula.axiom_simplify(axiom, depth)
                    }
                    _ => self.clone(),
                }
            }
            FormulaKind::Box(modal) => self.bound_power(ModalKind::Box, modal, axiom, depth),
            FormulaKind::Diamond(modal) => {
                self.bound_power(ModalKind::Diamond, modal, axiom, depth)
            }
        }
    }

    fn bound_power(&self, kind: ModalKind, modal: &Modal, axiom: Axiom, depth: u32) -> Self {
        let subformula = modal.subformula.axiom_simplify(axiom, depth + modal.power);
        let power = if depth > 0 { 1 } else { modal.power.min(2) };
        if power == modal.power {
            return self.with_subformula(kind, modal, subformula);
        }
        Formula::new_modal(kind, modal.modality, power, subformula, modal.s5)
    }

    /// The same modal node with one operator peeled off; a power-1 node yields its
    /// subformula.
    pub fn reduced_power(&self) -> Result<Self, FormulaError> {
        match self.as_modal() {
            Some((kind, modal)) => Ok(Formula::new_modal(
                kind,
                modal.modality,
                modal.power - 1,
                modal.subformula.clone(),
                modal.s5,
            )),
            None => Err(FormulaError::NotModal {
                kind: self.formula_type(),
            }),
        }
    }

    /// Adds one operator to this modal node.
    ///
    /// Only this handle sees the change: a node shared with other handles is copied
    /// first.
    pub fn increment_power(&mut self) -> Result<(), FormulaError> {
        if !self.formula_type().is_modal() {
            return Err(FormulaError::NotModal {
                kind: self.formula_type(),
            });
        }
        let node = Rc::make_mut(&mut self.0);
        if let FormulaKind::Box(modal) | FormulaKind::Diamond(modal) = &mut node.kind {
            modal.power = merged_power(modal.modality, modal.power, 1);
        }
        node.hash = hash::structural_hash(&node.kind);
        Ok(())
    }
}
