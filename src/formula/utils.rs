use super::Formula;

/// Left fold of `content` with `∧`; the empty conjunction is `⊤`.
pub fn conjunction(mut content: impl Iterator<Item = Formula>) -> Formula {
    match content.next() {
        Some(first) => content.fold(first, Formula::new_and),
        None => Formula::new_true(),
    }
}

/// Left fold of `content` with `∨`; the empty disjunction is `⊥`.
pub fn disjunction(mut content: impl Iterator<Item = Formula>) -> Formula {
    match content.next() {
        Some(first) => content.fold(first, Formula::new_or),
        None => Formula::new_false(),
    }
}
