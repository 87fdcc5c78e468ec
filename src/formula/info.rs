use fxhash::FxHashSet;
use itertools::Itertools;

use super::{Formula, FormulaKind};

impl Formula {
    /// All subformulas in post order, `self` last. Shared subtrees are listed once per
    /// occurrence.
    pub fn subformulas(&self) -> Vec<&Formula> {
        let mut result = Vec::new();
        match self.kind() {
            FormulaKind::True | FormulaKind::False | FormulaKind::Atom(_) => (),
            FormulaKind::Not(content) => result.extend(content.subformulas()),
            FormulaKind::And(lhs, rhs) | FormulaKind::Or(lhs, rhs) => {
                result.extend(lhs.subformulas());
                result.extend(rhs.subformulas());
            }
            FormulaKind::Box(modal) | FormulaKind::Diamond(modal) => {
                result.extend(modal.subformula.subformulas());
            }
        }
        result.push(self);
        result
    }

    pub fn size(&self) -> usize {
        self.subformulas().len()
    }

    /// Longest chain of modal operators on a path, counting every unit of power.
    pub fn modal_depth(&self) -> u32 {
        match self.kind() {
            FormulaKind::True | FormulaKind::False | FormulaKind::Atom(_) => 0,
            FormulaKind::Not(content) => content.modal_depth(),
            FormulaKind::And(lhs, rhs) | FormulaKind::Or(lhs, rhs) => {
                lhs.modal_depth().max(rhs.modal_depth())
            }
            FormulaKind::Box(modal) | FormulaKind::Diamond(modal) => {
                modal.power + modal.subformula.modal_depth()
            }
        }
    }

    /// Number of modal operators in the formula, counting every unit of power.
    pub fn modal_operator_count(&self) -> u32 {
        self.subformulas()
            .into_iter()
            .filter_map(Formula::power)
            .sum()
    }

    pub fn contains_modal(&self) -> bool {
        self.subformulas()
            .into_iter()
            .any(|it| it.formula_type().is_modal())
    }

    pub fn atoms(&self) -> FxHashSet<&str> {
        self.subformulas()
            .into_iter()
            .filter_map(|it| match it.kind() {
                FormulaKind::Atom(name) => Some(&**name),
                _ => None,
            })
            .collect()
    }

    /// Modality indices used anywhere in the formula, ascending.
    pub fn modalities(&self) -> Vec<u32> {
        self.subformulas()
            .into_iter()
            .filter_map(Formula::modality)
            .sorted()
            .dedup()
            .collect()
    }

    /// Number of top level conjuncts.
    pub fn clause_count(&self) -> usize {
        match self.kind() {
            FormulaKind::And(lhs, rhs) => lhs.clause_count() + rhs.clause_count(),
            _ => 1,
        }
    }

    pub fn is_negated_normal_form(&self) -> bool {
        self.subformulas().into_iter().all(|it| match it.kind() {
            FormulaKind::Not(content) => matches!(content.kind(), FormulaKind::Atom(_)),
            _ => true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{parse, ModalSystem};

    fn k(input: &str) -> Formula {
        parse(input, ModalSystem::K).unwrap()
    }

    #[test]
    fn test_subformulas() {
        let f = k("[1](p ∧ ¬q)");
        let rendered: Vec<String> = f.subformulas().iter().map(|it| it.to_string()).collect();
        assert_eq!(rendered, ["p", "q", "¬q", "p ∧ ¬q", "[1](p ∧ ¬q)"]);
        assert_eq!(f.size(), 5);
    }

    #[test]
    fn test_modal_measures() {
        let f = k("[1][1]<2>p ∨ (<3>q ∧ [1]<1>[2]r)");
        assert_eq!(f.modal_depth(), 3);
        assert_eq!(f.modal_operator_count(), 7);
        assert_eq!(f.modalities(), [1, 2, 3]);
        assert!(f.contains_modal());
        assert!(!k("p ∧ ¬(q ∨ ⊤)").contains_modal());
        assert_eq!(k("p").modal_depth(), 0);
    }

    #[test]
    fn test_atoms() {
        let f = k("[1](p ∧ ¬q) ∨ <2>(p ∨ r)");
        let atoms: Vec<&str> = f.atoms().into_iter().sorted().collect();
        assert_eq!(atoms, ["p", "q", "r"]);
    }

    #[test]
    fn test_clause_count() {
        assert_eq!(k("(p ∨ q) ∧ [1](r ∨ s) ∧ ¬p").clause_count(), 3);
        assert_eq!(k("p ∨ q").clause_count(), 1);
    }

    #[test]
    fn test_is_negated_normal_form() {
        assert!(k("¬p ∧ [1]¬q").is_negated_normal_form());
        assert!(!k("¬¬p").is_negated_normal_form());
        assert!(!k("<1>¬[2]p").is_negated_normal_form());
    }
}
