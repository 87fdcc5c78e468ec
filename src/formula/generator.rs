//! Random modal 3CNF formulas in the style of Giunchiglia et al. (2000).
//!
//! A formula is a conjunction of distinct clauses. Every literal of a clause at
//! depth `d > 0` is, with probability `1 - propositional_rate`, a box over a fresh
//! clause of depth `d - 1`, and otherwise a propositional atom; either is negated
//! with probability one half.

use rand::Rng;

use super::{utils, Formula};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CnfParameters {
    /// Maximal modal depth.
    pub depth: u32,
    /// Box indices are drawn from `1..=modalities`.
    pub modalities: u32,
    pub clauses: usize,
    /// Atoms are drawn from `p1..=pN`.
    pub variables: u32,
    pub clause_length: usize,
    pub propositional_rate: f64,
    pub s5: bool,
}

impl Default for CnfParameters {
    fn default() -> Self {
        Self {
            depth: 2,
            modalities: 1,
            clauses: 5,
            variables: 3,
            clause_length: 3,
            propositional_rate: 0.5,
            s5: false,
        }
    }
}

const MAX_ATTEMPTS: usize = 100;

fn random_sign(formula: Formula, rng: &mut impl Rng) -> Formula {
    if rng.random_bool(0.5) {
        Formula::new_not(formula)
    } else {
        formula
    }
}

fn random_variable(params: &CnfParameters, rng: &mut impl Rng) -> u32 {
    rng.random_range(1..=params.variables.max(1))
}

fn random_literal(depth: u32, params: &CnfParameters, rng: &mut impl Rng) -> (Option<u32>, Formula) {
    if depth == 0 || rng.random_bool(params.propositional_rate.clamp(0.0, 1.0)) {
        let variable = random_variable(params, rng);
        let atom = Formula::new_atom(format!("p{variable}"));
        (Some(variable), random_sign(atom, rng))
    } else {
        let modality = rng.random_range(1..=params.modalities.max(1));
        let clause = random_clause(depth - 1, params, rng);
        let boxed = Formula::new_box_s5(modality, 1, clause, params.s5);
        (None, random_sign(boxed, rng))
    }
}

fn random_clause(depth: u32, params: &CnfParameters, rng: &mut impl Rng) -> Formula {
    let mut literals = Vec::with_capacity(params.clause_length);
    for _ in 0..MAX_ATTEMPTS {
        literals.clear();
        let mut variables = Vec::new();
        for _ in 0..params.clause_length.max(1) {
            let (variable, literal) = random_literal(depth, params, rng);
            variables.extend(variable);
            literals.push(literal);
        }
        variables.sort_unstable();
        let before = variables.len();
        variables.dedup();
        if variables.len() == before {
            break;
        }
    }
    utils::disjunction(literals.into_iter())
}

/// Generates a conjunction of at most `params.clauses` distinct clauses.
pub fn generate_cnf(params: &CnfParameters, rng: &mut impl Rng) -> Formula {
    let mut clauses: Vec<Formula> = Vec::with_capacity(params.clauses);
    let mut attempts = 0;
    while clauses.len() < params.clauses && attempts < params.clauses * 10 {
        let clause = random_clause(params.depth, params, rng);
        if !clauses.contains(&clause) {
            clauses.push(clause);
        }
        attempts += 1;
    }
    utils::conjunction(clauses.into_iter())
}

/// [`generate_cnf`] with the thread local generator.
pub fn generate_formula(params: &CnfParameters) -> Formula {
    let mut rng = rand::rng();
    generate_cnf(params, &mut rng)
}
