use smallvec::SmallVec;
use tracing::trace;

use crate::error::FormulaError;

use super::{merged_power, Formula, FormulaKind, FormulaType, Modal, ModalKind};

impl Formula {
    /// Negation pushed through one layer: De Morgan on the connectives, box and
    /// diamond swapped, double negation dropped.
    pub fn negate(&self) -> Self {
        match self.kind() {
            FormulaKind::True => Formula::new_false(),
            FormulaKind::False => Formula::new_true(),
            FormulaKind::Atom(_) => Formula::new_not(self.clone()),
            FormulaKind::Not(content) => content.clone(),
            FormulaKind::And(lhs, rhs) => Formula::new_or(lhs.negate(), rhs.negate()),
            FormulaKind::Or(lhs, rhs) => Formula::new_and(lhs.negate(), rhs.negate()),
            FormulaKind::Box(modal) => Formula::new_diamond_s5(
                modal.modality,
                modal.power,
                modal.subformula.negate(),
                modal.s5,
            ),
            FormulaKind::Diamond(modal) => Formula::new_box_s5(
                modal.modality,
                modal.power,
                modal.subformula.negate(),
                modal.s5,
            ),
        }
    }

    pub fn negated_normal_form(&self) -> Self {
        match self.kind() {
            FormulaKind::True | FormulaKind::False | FormulaKind::Atom(_) => self.clone(),
            FormulaKind::Not(content) => match content.kind() {
                FormulaKind::Atom(_) => self.clone(),
                _ => content.negate().negated_normal_form(),
            },
            FormulaKind::And(lhs, rhs) | FormulaKind::Or(lhs, rhs) => {
                self.with_operands(lhs.negated_normal_form(), rhs.negated_normal_form())
            }
            FormulaKind::Box(modal) => {
                self.with_subformula(ModalKind::Box, modal, modal.subformula.negated_normal_form())
            }
            FormulaKind::Diamond(modal) => self.with_subformula(
                ModalKind::Diamond,
                modal,
                modal.subformula.negated_normal_form(),
            ),
        }
    }

    /// Tail normal form is only defined over the propositional fragment, where it
    /// coincides with the negated normal form.
    pub fn tail_normal_form(&self) -> Result<Self, FormulaError> {
        match self.kind() {
            FormulaKind::True | FormulaKind::False | FormulaKind::Atom(_) => Ok(self.clone()),
            FormulaKind::Not(content) => {
                content.tail_normal_form()?;
                Ok(self.negated_normal_form())
            }
            FormulaKind::And(lhs, rhs) | FormulaKind::Or(lhs, rhs) => {
                Ok(self.with_operands(lhs.tail_normal_form()?, rhs.tail_normal_form()?))
            }
            FormulaKind::Box(_) | FormulaKind::Diamond(_) => Err(FormulaError::NotSupported {
                operation: "tail normal form",
                kind: self.formula_type(),
            }),
        }
    }

    /// Negated normal form, then [`Formula::simplify`].
    pub fn normalize(&self) -> Self {
        self.negated_normal_form().simplify()
    }
}

// Simplification
impl Formula {
    fn collect_commutative(&self, op: FormulaType, result: &mut SmallVec<[Formula; 8]>) {
        match self.kind() {
            FormulaKind::And(lhs, rhs) if op == FormulaType::And => {
                lhs.collect_commutative(op, result);
                rhs.collect_commutative(op, result);
            }
            FormulaKind::Or(lhs, rhs) if op == FormulaType::Or => {
                lhs.collect_commutative(op, result);
                rhs.collect_commutative(op, result);
            }
            _ => result.push(self.clone()),
        }
    }

    fn is_complement_of(&self, other: &Formula) -> bool {
        matches!(self.kind(), FormulaKind::Not(content) if content == other)
            || matches!(other.kind(), FormulaKind::Not(content) if content == self)
    }

    /// Simplifies a flattened conjunction (`op == And`) or disjunction (`op == Or`).
    fn simplify_commutative(&self, op: FormulaType) -> Self {
        let (absorbing, neutral) = match op {
            FormulaType::And => (FormulaType::False, FormulaType::True),
            _ => (FormulaType::True, FormulaType::False),
        };
        let constant = |ty: FormulaType| {
            if ty == FormulaType::True {
                Formula::new_true()
            } else {
                Formula::new_false()
            }
        };

        let mut pendings = SmallVec::new();
        self.collect_commutative(op, &mut pendings);
        let mut result = SmallVec::<[Formula; 8]>::new();
        for pending in pendings {
            let mut operands = SmallVec::new();
            pending.simplify().collect_commutative(op, &mut operands);
            for operand in operands {
                let ty = operand.formula_type();
                if ty == absorbing {
                    return constant(absorbing);
                }
                if ty == neutral || result.contains(&operand) {
                    continue;
                }
                if result.iter().any(|it| it.is_complement_of(&operand)) {
                    return constant(absorbing);
                }
                result.push(operand);
            }
        }

        let simplified = result
            .into_iter()
            .reduce(|acc, x| {
                if op == FormulaType::And {
                    acc & x
                } else {
                    acc | x
                }
            })
            .unwrap_or_else(|| constant(neutral));
        if simplified == *self {
            self.clone()
        } else {
            simplified
        }
    }

    /// Bottom-up simplification.
    ///
    /// Modal nodes simplify their subformula first and then apply the rules of
    /// their own system: only `◇⊥ → ⊥` and run merging without the S5 flag, the
    /// collapses `◇□φ → □φ`, `◇◇φ → ◇φ`, `□◇φ → ◇φ`, `□□φ → □φ` with it.
    pub fn simplify(&self) -> Self {
        match self.kind() {
            FormulaKind::True | FormulaKind::False | FormulaKind::Atom(_) => self.clone(),
            FormulaKind::Not(content) => {
                let content = content.simplify();
                match content.kind() {
                    FormulaKind::True => Formula::new_false(),
                    FormulaKind::False => Formula::new_true(),
                    FormulaKind::Not(inner) => inner.clone(),
                    _ => self.with_content(content),
                }
            }
            FormulaKind::And(_, _) => self.simplify_commutative(FormulaType::And),
            FormulaKind::Or(_, _) => self.simplify_commutative(FormulaType::Or),
            FormulaKind::Box(modal) => self.simplify_modal(ModalKind::Box, modal),
            FormulaKind::Diamond(modal) => self.simplify_modal(ModalKind::Diamond, modal),
        }
    }

    fn simplify_modal(&self, kind: ModalKind, modal: &Modal) -> Self {
        let subformula = modal.subformula.simplify();
        if kind == ModalKind::Diamond && subformula.formula_type() == FormulaType::False {
            return Formula::new_false();
        }
        if modal.s5 {
            return self.simplify_s5(kind, modal, subformula);
        }
        // Rebuilding through the constructor merges a child that became a run of the
        // same operator only after its own simplification.
        self.with_subformula(kind, modal, subformula)
    }

    fn simplify_s5(&self, kind: ModalKind, modal: &Modal, subformula: Formula) -> Self {
        match (kind, subformula.as_modal()) {
            (ModalKind::Diamond, Some((ModalKind::Box, inner))) => {
                trace!(modality = modal.modality, "collapsing diamond over box");
                Formula::new_box_s5(
                    inner.modality,
                    merged_power(inner.modality, modal.power, inner.power),
                    inner.subformula.clone(),
                    modal.s5,
                )
                .simplify()
            }
            (ModalKind::Box, Some((ModalKind::Diamond, _))) => {
                trace!(modality = modal.modality, "collapsing box over diamond");
                subformula
            }
            (_, Some((inner_kind, inner)))
                if inner_kind == kind && inner.modality == modal.modality =>
            {
                trace!(modality = modal.modality, ?kind, "collapsing nested run");
                Formula::new_modal(
                    kind,
                    modal.modality,
                    merged_power(modal.modality, modal.power, inner.power),
                    inner.subformula.clone(),
                    modal.s5,
                )
                .simplify()
            }
            _ => self.with_subformula(kind, modal, subformula),
        }
    }
}

#[cfg(test)]
mod tests {
    use ntest::timeout;

    use super::*;
    use crate::formula::{parse, ModalSystem};

    fn atom(name: &str) -> Formula {
        Formula::new_atom(name)
    }

    fn k(input: &str) -> Formula {
        parse(input, ModalSystem::K).unwrap()
    }

    fn s5(input: &str) -> Formula {
        parse(input, ModalSystem::S5).unwrap()
    }

    #[test]
    fn test_negate_dualizes_modalities() {
        let p = atom("p");
        for s5 in [false, true] {
            let boxed = Formula::new_box_s5(2, 3, p.clone(), s5);
            assert_eq!(
                boxed.negate(),
                Formula::new_diamond_s5(2, 3, p.negate(), s5)
            );
            let diamond = Formula::new_diamond_s5(2, 3, p.clone(), s5);
            assert_eq!(diamond.negate(), Formula::new_box_s5(2, 3, !p.clone(), s5));
        }
    }

    #[test]
    fn test_double_negation() {
        for input in ["p", "¬p", "[1]p ∧ <2>¬q", "<1>(p ∨ ⊤) ∨ [1][1]⊥"] {
            let f = k(input);
            assert_eq!(f.negate().negate(), f, "{input}");
        }
    }

    #[test]
    fn test_negated_normal_form() {
        assert_eq!(k("¬(p ∧ q)").negated_normal_form(), k("¬p ∨ ¬q"));
        assert_eq!(k("¬[1](p ∨ ¬q)").negated_normal_form(), k("<1>(¬p ∧ q)"));
        assert_eq!(k("¬¬¬p").negated_normal_form(), k("¬p"));
        assert_eq!(k("[1]¬<2>¬p").negated_normal_form(), k("[1][2]p"));

        let nnf = k("¬(<1>¬(p ∨ [2]¬(q ∧ ¬r)) ∧ ¬⊤)").negated_normal_form();
        assert!(nnf.is_negated_normal_form(), "{nnf}");
        assert_eq!(nnf.to_string(), "[1](p ∨ [2](¬q ∨ r)) ∨ ⊤");
    }

    #[test]
    fn test_negated_normal_form_merges_exposed_runs() {
        let f = k("<1>¬[1]¬p").negated_normal_form();
        assert_eq!(f, Formula::new_diamond(1, 2, atom("p")));
    }

    #[test]
    fn test_negated_normal_form_keeps_unchanged_nodes() {
        let f = k("[1](p ∧ ¬q) ∨ <2>r");
        assert!(Formula::ptr_eq(&f.negated_normal_form(), &f));
    }

    #[test]
    fn test_tail_normal_form() {
        assert_eq!(k("¬(p ∧ ¬q)").tail_normal_form(), Ok(k("¬p ∨ q")));
        assert_eq!(
            k("p ∧ ¬[1]q").tail_normal_form(),
            Err(FormulaError::NotSupported {
                operation: "tail normal form",
                kind: FormulaType::Box,
            })
        );
        assert!(matches!(
            k("<3>p").tail_normal_form(),
            Err(FormulaError::NotSupported {
                kind: FormulaType::Diamond,
                ..
            })
        ));
    }

    #[test]
    fn test_simplify_connectives() {
        assert_eq!(k("p ∧ ⊤").simplify(), k("p"));
        assert_eq!(k("p ∧ (q ∧ ⊥)").simplify(), k("⊥"));
        assert_eq!(k("p ∨ ¬p").simplify(), k("⊤"));
        assert_eq!(k("p ∧ q ∧ ¬p").simplify(), k("⊥"));
        assert_eq!(k("p ∧ (q ∧ p)").simplify(), k("p ∧ q"));
        assert_eq!(k("(p ∨ ⊥) ∨ (⊥ ∨ q)").simplify(), k("p ∨ q"));
        assert_eq!(k("⊥ ∨ ⊥").simplify(), k("⊥"));
        assert_eq!(k("¬¬p").simplify(), k("p"));
        assert_eq!(k("¬(⊤ ∧ ⊤)").simplify(), k("⊥"));
        assert_eq!(k("[1]p ∨ ¬[1]p").simplify(), k("⊤"));
    }

    #[test]
    fn test_simplify_k_modalities() {
        assert_eq!(k("<1>(p ∧ ⊥)").simplify(), k("⊥"));
        assert_eq!(k("<1><2>⊥").simplify(), k("⊥"));
        // Only the diamond absorbs falsity.
        assert_eq!(k("[1]⊥").simplify(), k("[1]⊥"));
        assert_eq!(k("[1](p ∧ ⊥)").simplify(), k("[1]⊥"));
        // No S5 collapse without the flag.
        assert_eq!(k("<1>[1]p").simplify(), k("<1>[1]p"));
        assert_eq!(k("[1]<2>p").simplify(), k("[1]<2>p"));
    }

    #[test]
    fn test_simplify_merges_runs_exposed_by_simplification() {
        let f = k("[1]([1]p ∧ ⊤)");
        assert_eq!(f.power(), Some(1));
        let simplified = f.simplify();
        assert_eq!(simplified, Formula::new_box(1, 2, atom("p")));
    }

    #[test]
    fn test_false_absorption() {
        for s5 in [false, true] {
            for (m, p) in [(0, 1), (1, 2), (9, 5)] {
                let f = Formula::new_diamond_s5(m, p, Formula::new_false(), s5);
                assert_eq!(f.simplify(), Formula::new_false());
            }
        }
    }

    #[test]
    fn test_s5_diamond_rules() {
        let f = Formula::new_diamond_s5(
            1,
            1,
            Formula::new_diamond_s5(1, 2, atom("p"), true),
            true,
        );
        let simplified = f.simplify();
        assert_eq!(simplified, Formula::new_diamond_s5(1, 3, atom("p"), true));
        assert_eq!(simplified.to_string(), "<1><1><1>p");

        let f = Formula::new_diamond_s5(1, 2, Formula::new_box_s5(3, 1, atom("p"), true), true);
        assert_eq!(
            f.simplify(),
            Formula::new_box_s5(3, 3, atom("p"), true).simplify()
        );
    }

    #[test]
    fn test_s5_diamond_collapse_after_sub_simplification() {
        // The inner diamond only appears once the conjunction has been simplified.
        let f = s5("<1>(<1>p ∧ ⊤)");
        assert_eq!(f.simplify(), Formula::new_diamond_s5(1, 2, atom("p"), true));
    }

    #[test]
    fn test_s5_box_rules() {
        let f = Formula::new_box_s5(2, 1, Formula::new_diamond_s5(3, 1, atom("q"), true), true);
        assert_eq!(f.simplify(), Formula::new_diamond_s5(3, 1, atom("q"), true));

        let f = s5("[1]([1]p ∨ ⊥)");
        assert_eq!(f.simplify(), Formula::new_box_s5(1, 2, atom("p"), true));

        // The diamond collapses into the inner box first, then the outer box merges.
        assert_eq!(s5("[1]<1>[1]p").simplify(), s5("[1][1][1]p"));
    }

    #[test]
    fn test_normalize() {
        let f = s5("¬[1]¬<1>p ∧ ¬(q ∧ ⊤)");
        let normalized = f.normalize();
        assert_eq!(normalized, s5("<1><1>p ∧ ¬q"));
        assert!(normalized.is_negated_normal_form());
        assert_eq!(k("¬(p ∨ ¬p)").normalize(), k("⊥"));
    }

    #[test]
    #[should_panic(expected = "modal power overflow on modality 1")]
    fn test_s5_run_collapse_overflow_panics() {
        // The inner run only becomes adjacent after the conjunction is simplified.
        let inner = Formula::new_diamond_s5(1, 1, atom("p"), true) & Formula::new_true();
        Formula::new_diamond_s5(1, u32::MAX, inner, true).simplify();
    }

    #[test]
    #[should_panic(expected = "modal power overflow on modality 2")]
    fn test_s5_diamond_over_box_overflow_panics() {
        let inner = Formula::new_box_s5(2, 1, atom("p"), true) | Formula::new_false();
        Formula::new_diamond_s5(1, u32::MAX, inner, true).simplify();
    }

    #[test]
    fn test_simplify_keeps_unchanged_nodes() {
        let f = s5("<1>(p ∧ [2]q)");
        assert!(Formula::ptr_eq(&f.simplify(), &f));
        let f = k("[1]<2>(p ∨ q)");
        assert!(Formula::ptr_eq(&f.simplify(), &f));
    }

    #[test]
    #[timeout(2000)]
    fn test_simplify_deep_alternation_terminates() {
        let mut f = atom("p");
        for i in 0..200 {
            f = if i % 2 == 0 {
                Formula::new_diamond_s5(1, 1, f, true)
            } else {
                Formula::new_box_s5(1, 1, f, true)
            };
        }
        assert_eq!(f.modal_depth(), 200);
        let simplified = f.simplify();
        assert_eq!(simplified, Formula::new_diamond_s5(1, 100, atom("p"), true));
        assert_eq!(simplified.simplify(), simplified);
    }
}
