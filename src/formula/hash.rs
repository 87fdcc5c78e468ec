use std::hash::{Hash, Hasher};

use fxhash::hash64;

use super::{Formula, FormulaKind, FormulaType, Modal};

fn tag(ty: FormulaType) -> u64 {
    hash64(&ty)
}

fn modal_hash(ty: FormulaType, modal: &Modal) -> u64 {
    tag(ty)
        .wrapping_add(hash64(&modal.modality))
        .wrapping_add(hash64(&modal.power))
        .wrapping_add(modal.subformula.structural_hash())
}

/// Hash of a node from its tag, scalars and the memoized hashes of its children.
///
/// Only a pre-filter for equality: collisions are allowed, and `s5` is left out
/// so that nodes differing only in the flag collide.
pub(super) fn structural_hash(kind: &FormulaKind) -> u64 {
    match kind {
        FormulaKind::True => tag(FormulaType::True),
        FormulaKind::False => tag(FormulaType::False),
        FormulaKind::Atom(name) => tag(FormulaType::Atom).wrapping_add(hash64(&**name)),
        FormulaKind::Not(content) => tag(FormulaType::Not).wrapping_add(content.structural_hash()),
        FormulaKind::And(lhs, rhs) => tag(FormulaType::And)
            .wrapping_add(lhs.structural_hash())
            .wrapping_add(rhs.structural_hash().rotate_left(17)),
        FormulaKind::Or(lhs, rhs) => tag(FormulaType::Or)
            .wrapping_add(lhs.structural_hash())
            .wrapping_add(rhs.structural_hash().rotate_left(17)),
        FormulaKind::Box(modal) => modal_hash(FormulaType::Box, modal),
        FormulaKind::Diamond(modal) => modal_hash(FormulaType::Diamond, modal),
    }
}

impl PartialEq for Formula {
    fn eq(&self, other: &Self) -> bool {
        Formula::ptr_eq(self, other)
            || (self.structural_hash() == other.structural_hash() && self.kind() == other.kind())
    }
}

impl Eq for Formula {}

impl Hash for Formula {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

#[cfg(test)]
mod tests {
    use fxhash::FxHashSet;

    use super::*;

    fn samples() -> Vec<Formula> {
        let p = Formula::new_atom("p");
        let q = Formula::new_atom("q");
        vec![
            Formula::new_true(),
            Formula::new_false(),
            p.clone(),
            q.clone(),
            !p.clone(),
            p.clone() & q.clone(),
            q.clone() & p.clone(),
            p.clone() | q.clone(),
            Formula::new_box(1, 1, p.clone()),
            Formula::new_box(1, 2, p.clone()),
            Formula::new_box(2, 1, p.clone()),
            Formula::new_box_s5(1, 1, p.clone(), true),
            Formula::new_diamond(1, 1, p.clone()),
            Formula::new_diamond_s5(1, 1, p.clone(), true),
            Formula::new_diamond(1, 1, Formula::new_box(1, 1, p & q)),
        ]
    }

    #[test]
    fn test_equal_formulas_hash_equal() {
        let lhs = samples();
        let rhs: Vec<_> = samples().iter().map(Formula::deep_clone).collect();
        for a in &lhs {
            for b in &rhs {
                if a == b {
                    assert_eq!(a.structural_hash(), b.structural_hash(), "{a} / {b}");
                }
            }
        }
    }

    #[test]
    fn test_equality_is_structural() {
        let lhs = samples();
        let rhs = samples();
        for (i, a) in lhs.iter().enumerate() {
            for (j, b) in rhs.iter().enumerate() {
                assert_eq!(a == b, i == j, "{a} / {b}");
            }
        }
    }

    #[test]
    fn test_s5_flag_takes_part_in_equality() {
        let p = Formula::new_atom("p");
        let plain = Formula::new_box(1, 1, p.clone());
        let s5 = Formula::new_box_s5(1, 1, p.clone(), true);
        assert_ne!(plain, s5);
        assert_eq!(plain.structural_hash(), s5.structural_hash());

        let plain = Formula::new_diamond(1, 1, p.clone());
        let s5 = Formula::new_diamond_s5(1, 1, p, true);
        assert_ne!(plain, s5);
    }

    #[test]
    fn test_hash_set_deduplicates() {
        let set: FxHashSet<Formula> = samples()
            .into_iter()
            .chain(samples().iter().map(Formula::deep_clone))
            .collect();
        assert_eq!(set.len(), samples().len());
    }
}
