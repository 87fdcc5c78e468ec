mod forms;
#[cfg(feature = "generator")]
pub mod generator;
mod hash;
mod info;
mod modal;
mod parse;
pub mod utils;

pub use modal::Axiom;
pub use parse::parse;

use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{BitAnd, BitOr, Not},
    rc::Rc,
    str::FromStr,
};
use wasm_bindgen::prelude::*;

use crate::error::FormulaError;

/// Tag of a [`Formula`] node, one per variant of [`FormulaKind`].
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
pub enum FormulaType {
    True,
    False,
    Atom,
    Not,
    And,
    Or,
    Box,
    Diamond,
}

impl FormulaType {
    pub fn all_variants() -> &'static [FormulaType] {
        &[
            FormulaType::True,
            FormulaType::False,
            FormulaType::Atom,
            FormulaType::Not,
            FormulaType::And,
            FormulaType::Or,
            FormulaType::Box,
            FormulaType::Diamond,
        ]
    }

    pub fn is_modal(self) -> bool {
        matches!(self, FormulaType::Box | FormulaType::Diamond)
    }
}

impl fmt::Display for FormulaType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FormulaType::True => "true",
            FormulaType::False => "false",
            FormulaType::Atom => "atom",
            FormulaType::Not => "negation",
            FormulaType::And => "conjunction",
            FormulaType::Or => "disjunction",
            FormulaType::Box => "box",
            FormulaType::Diamond => "diamond",
        };
        write!(f, "{name}")
    }
}

/// The two modal operators. Every pass treats them symmetrically.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
pub enum ModalKind {
    Box,
    Diamond,
}

impl ModalKind {
    pub fn dual(self) -> Self {
        match self {
            ModalKind::Box => ModalKind::Diamond,
            ModalKind::Diamond => ModalKind::Box,
        }
    }

    pub fn formula_type(self) -> FormulaType {
        match self {
            ModalKind::Box => FormulaType::Box,
            ModalKind::Diamond => FormulaType::Diamond,
        }
    }

    fn brackets(self) -> (char, char) {
        match self {
            ModalKind::Box => ('[', ']'),
            ModalKind::Diamond => ('<', '>'),
        }
    }
}

/// Which accessibility relations parsed modal operators are interpreted over.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash, Default)]
pub enum ModalSystem {
    #[default]
    K,
    S5,
}

impl ModalSystem {
    pub fn is_s5(self) -> bool {
        self == ModalSystem::S5
    }
}

/// Payload shared by box and diamond nodes.
///
/// `power` counts a run of operators of the same kind over the same modality,
/// so `[1][1][1]p` is a single box with power 3. It is always at least 1 and the
/// subformula is never an operator of the same kind over the same modality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    modality: u32,
    power: u32,
    subformula: Formula,
    s5: bool,
}

impl Modal {
    pub fn modality(&self) -> u32 {
        self.modality
    }

    pub fn power(&self) -> u32 {
        self.power
    }

    pub fn subformula(&self) -> &Formula {
        &self.subformula
    }

    pub fn is_s5(&self) -> bool {
        self.s5
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaKind {
    True,
    False,
    Atom(Rc<str>),
    Not(Formula),
    And(Formula, Formula),
    Or(Formula, Formula),
    Box(Modal),
    Diamond(Modal),
}

#[derive(Debug, Clone)]
struct Node {
    hash: u64,
    kind: FormulaKind,
}

/// A multi-modal formula.
///
/// Cloning is cheap: the handle is reference counted and subformulas are shared
/// between parents. Nodes are only built through the constructors below, which keep
/// modal nodes canonical, and are never mutated once another handle can see them.
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "FormulaTree", from = "FormulaTree")]
pub struct Formula(Rc<Node>);

/// Sum of two powers over `modality`. Overflow is a caller contract violation.
pub(crate) fn merged_power(modality: u32, lhs: u32, rhs: u32) -> u32 {
    lhs.checked_add(rhs)
        .unwrap_or_else(|| panic!("modal power overflow on modality {modality}"))
}

// Constructors
impl Formula {
    fn from_kind(kind: FormulaKind) -> Self {
        let hash = hash::structural_hash(&kind);
        Formula(Rc::new(Node { hash, kind }))
    }

    pub fn new_true() -> Self {
        Self::from_kind(FormulaKind::True)
    }

    pub fn new_false() -> Self {
        Self::from_kind(FormulaKind::False)
    }

    pub fn new_atom(name: impl Into<Rc<str>>) -> Self {
        Self::from_kind(FormulaKind::Atom(name.into()))
    }

    pub fn new_not(content: Self) -> Self {
        Self::from_kind(FormulaKind::Not(content))
    }

    pub fn new_and(lhs: Self, rhs: Self) -> Self {
        Self::from_kind(FormulaKind::And(lhs, rhs))
    }

    pub fn new_or(lhs: Self, rhs: Self) -> Self {
        Self::from_kind(FormulaKind::Or(lhs, rhs))
    }

    /// Builds `power` operators of `kind` over `modality` around `subformula`.
    ///
    /// Power 0 is the identity. A subformula that is already a `kind` operator over
    /// the same modality is absorbed: the powers are summed and its own subformula
    /// becomes the child.
    pub fn new_modal(
        kind: ModalKind,
        modality: u32,
        power: u32,
        subformula: Self,
        s5: bool,
    ) -> Self {
        if power == 0 {
            return subformula;
        }
        let (power, subformula) = match subformula.as_modal() {
            Some((inner_kind, inner)) if inner_kind == kind && inner.modality == modality => {
                (merged_power(modality, power, inner.power), inner.subformula.clone())
            }
            _ => (power, subformula),
        };
        let modal = Modal {
            modality,
            power,
            subformula,
            s5,
        };
        Self::from_kind(match kind {
            ModalKind::Box => FormulaKind::Box(modal),
            ModalKind::Diamond => FormulaKind::Diamond(modal),
        })
    }

    /// Builds one power-1 operator per entry of `modalities`, outermost first.
    pub fn new_modal_chain(kind: ModalKind, modalities: &[u32], subformula: Self, s5: bool) -> Self {
        modalities
            .iter()
            .rev()
            .fold(subformula, |inner, &modality| {
                Self::new_modal(kind, modality, 1, inner, s5)
            })
    }

    pub fn new_box(modality: u32, power: u32, subformula: Self) -> Self {
        Self::new_modal(ModalKind::Box, modality, power, subformula, false)
    }

    pub fn new_box_s5(modality: u32, power: u32, subformula: Self, s5: bool) -> Self {
        Self::new_modal(ModalKind::Box, modality, power, subformula, s5)
    }

    pub fn new_box_chain(modalities: &[u32], subformula: Self) -> Self {
        Self::new_modal_chain(ModalKind::Box, modalities, subformula, false)
    }

    pub fn new_box_chain_s5(modalities: &[u32], subformula: Self, s5: bool) -> Self {
        Self::new_modal_chain(ModalKind::Box, modalities, subformula, s5)
    }

    pub fn new_diamond(modality: u32, power: u32, subformula: Self) -> Self {
        Self::new_modal(ModalKind::Diamond, modality, power, subformula, false)
    }

    pub fn new_diamond_s5(modality: u32, power: u32, subformula: Self, s5: bool) -> Self {
        Self::new_modal(ModalKind::Diamond, modality, power, subformula, s5)
    }

    pub fn new_diamond_chain(modalities: &[u32], subformula: Self) -> Self {
        Self::new_modal_chain(ModalKind::Diamond, modalities, subformula, false)
    }

    pub fn new_diamond_chain_s5(modalities: &[u32], subformula: Self, s5: bool) -> Self {
        Self::new_modal_chain(ModalKind::Diamond, modalities, subformula, s5)
    }

    /// A copy sharing no node with `self`.
    pub fn deep_clone(&self) -> Self {
        match self.kind() {
            FormulaKind::True => Self::new_true(),
            FormulaKind::False => Self::new_false(),
            FormulaKind::Atom(name) => Self::new_atom(&**name),
            FormulaKind::Not(content) => Self::new_not(content.deep_clone()),
            FormulaKind::And(lhs, rhs) => Self::new_and(lhs.deep_clone(), rhs.deep_clone()),
            FormulaKind::Or(lhs, rhs) => Self::new_or(lhs.deep_clone(), rhs.deep_clone()),
            FormulaKind::Box(modal) => Self::new_box_s5(
                modal.modality,
                modal.power,
                modal.subformula.deep_clone(),
                modal.s5,
            ),
            FormulaKind::Diamond(modal) => Self::new_diamond_s5(
                modal.modality,
                modal.power,
                modal.subformula.deep_clone(),
                modal.s5,
            ),
        }
    }

    // Rebuild helpers used by the passes: they hand back `self` when nothing changed.

    pub(crate) fn with_content(&self, content: Self) -> Self {
        match self.kind() {
            FormulaKind::Not(old) if Self::ptr_eq(old, &content) => self.clone(),
            _ => Self::new_not(content),
        }
    }

    pub(crate) fn with_operands(&self, lhs: Self, rhs: Self) -> Self {
        match self.kind() {
            FormulaKind::And(l, r) | FormulaKind::Or(l, r)
                if Self::ptr_eq(l, &lhs) && Self::ptr_eq(r, &rhs) =>
            {
                self.clone()
            }
            FormulaKind::Or(_, _) => Self::new_or(lhs, rhs),
            _ => Self::new_and(lhs, rhs),
        }
    }

    pub(crate) fn with_subformula(&self, kind: ModalKind, modal: &Modal, subformula: Self) -> Self {
        if Self::ptr_eq(&modal.subformula, &subformula) {
            self.clone()
        } else {
            Self::new_modal(kind, modal.modality, modal.power, subformula, modal.s5)
        }
    }
}

// Queries
impl Formula {
    pub fn kind(&self) -> &FormulaKind {
        &self.0.kind
    }

    pub fn formula_type(&self) -> FormulaType {
        match self.kind() {
            FormulaKind::True => FormulaType::True,
            FormulaKind::False => FormulaType::False,
            FormulaKind::Atom(_) => FormulaType::Atom,
            FormulaKind::Not(_) => FormulaType::Not,
            FormulaKind::And(_, _) => FormulaType::And,
            FormulaKind::Or(_, _) => FormulaType::Or,
            FormulaKind::Box(_) => FormulaType::Box,
            FormulaKind::Diamond(_) => FormulaType::Diamond,
        }
    }

    pub fn as_modal(&self) -> Option<(ModalKind, &Modal)> {
        match self.kind() {
            FormulaKind::Box(modal) => Some((ModalKind::Box, modal)),
            FormulaKind::Diamond(modal) => Some((ModalKind::Diamond, modal)),
            _ => None,
        }
    }

    pub fn modal_kind(&self) -> Option<ModalKind> {
        self.as_modal().map(|(kind, _)| kind)
    }

    pub fn modality(&self) -> Option<u32> {
        self.as_modal().map(|(_, modal)| modal.modality)
    }

    pub fn power(&self) -> Option<u32> {
        self.as_modal().map(|(_, modal)| modal.power)
    }

    pub fn is_s5(&self) -> Option<bool> {
        self.as_modal().map(|(_, modal)| modal.s5)
    }

    /// The single child of a negation or modal node.
    pub fn subformula(&self) -> Option<&Formula> {
        match self.kind() {
            FormulaKind::Not(content) => Some(content),
            FormulaKind::Box(modal) | FormulaKind::Diamond(modal) => Some(&modal.subformula),
            _ => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.kind(), FormulaKind::And(_, _) | FormulaKind::Or(_, _))
    }

    pub fn structural_hash(&self) -> u64 {
        self.0.hash
    }

    /// Whether both handles point at the very same node.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }
}

impl BitAnd for Formula {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Formula::new_and(self, rhs)
    }
}

impl BitOr for Formula {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Formula::new_or(self, rhs)
    }
}

impl Not for Formula {
    type Output = Self;

    fn not(self) -> Self::Output {
        Formula::new_not(self)
    }
}

impl FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s, ModalSystem::K)
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.kind(), f)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn operand(f: &mut fmt::Formatter, op: FormulaType, operand: &Formula) -> fmt::Result {
            match (op, operand.formula_type()) {
                (FormulaType::And, FormulaType::And) | (FormulaType::Or, FormulaType::Or) => {
                    write!(f, "{operand}")
                }
                (_, FormulaType::And | FormulaType::Or) => write!(f, "({operand})"),
                _ => write!(f, "{operand}"),
            }
        }

        match self.kind() {
            FormulaKind::True => write!(f, "⊤"),
            FormulaKind::False => write!(f, "⊥"),
            FormulaKind::Atom(name) => write!(f, "{name}"),
            FormulaKind::Not(content) if content.is_binary() => write!(f, "¬({content})"),
            FormulaKind::Not(content) => write!(f, "¬{content}"),
            FormulaKind::And(lhs, rhs) => {
                operand(f, FormulaType::And, lhs)?;
                write!(f, " ∧ ")?;
                operand(f, FormulaType::And, rhs)
            }
            FormulaKind::Or(lhs, rhs) => {
                operand(f, FormulaType::Or, lhs)?;
                write!(f, " ∨ ")?;
                operand(f, FormulaType::Or, rhs)
            }
            FormulaKind::Box(modal) => write_modal(f, ModalKind::Box, modal),
            FormulaKind::Diamond(modal) => write_modal(f, ModalKind::Diamond, modal),
        }
    }
}

fn write_modal(f: &mut fmt::Formatter, kind: ModalKind, modal: &Modal) -> fmt::Result {
    let (open, close) = kind.brackets();
    for _ in 0..modal.power {
        write!(f, "{open}{}{close}", modal.modality)?;
    }
    if modal.subformula.is_binary() {
        write!(f, "({})", modal.subformula)
    } else {
        write!(f, "{}", modal.subformula)
    }
}

/// Serialized shape of a [`Formula`]. Loading goes back through the constructors,
/// so a stored non-canonical chain is merged on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FormulaTree {
    True,
    False,
    Atom {
        name: String,
    },
    Not {
        content: Box<FormulaTree>,
    },
    And {
        lhs: Box<FormulaTree>,
        rhs: Box<FormulaTree>,
    },
    Or {
        lhs: Box<FormulaTree>,
        rhs: Box<FormulaTree>,
    },
    Modal {
        kind: ModalKind,
        modality: u32,
        power: u32,
        content: Box<FormulaTree>,
        #[serde(default)]
        s5: bool,
    },
}

impl From<Formula> for FormulaTree {
    fn from(formula: Formula) -> Self {
        match formula.kind() {
            FormulaKind::True => FormulaTree::True,
            FormulaKind::False => FormulaTree::False,
            FormulaKind::Atom(name) => FormulaTree::Atom {
                name: name.to_string(),
            },
            FormulaKind::Not(content) => FormulaTree::Not {
                content: Box::new(content.clone().into()),
            },
            FormulaKind::And(lhs, rhs) => FormulaTree::And {
                lhs: Box::new(lhs.clone().into()),
                rhs: Box::new(rhs.clone().into()),
            },
            FormulaKind::Or(lhs, rhs) => FormulaTree::Or {
                lhs: Box::new(lhs.clone().into()),
                rhs: Box::new(rhs.clone().into()),
            },
            FormulaKind::Box(modal) => FormulaTree::from_modal(ModalKind::Box, modal),
            FormulaKind::Diamond(modal) => FormulaTree::from_modal(ModalKind::Diamond, modal),
        }
    }
}

impl FormulaTree {
    fn from_modal(kind: ModalKind, modal: &Modal) -> Self {
        FormulaTree::Modal {
            kind,
            modality: modal.modality,
            power: modal.power,
            content: Box::new(modal.subformula.clone().into()),
            s5: modal.s5,
        }
    }
}

impl From<FormulaTree> for Formula {
    fn from(tree: FormulaTree) -> Self {
        match tree {
            FormulaTree::True => Formula::new_true(),
            FormulaTree::False => Formula::new_false(),
            FormulaTree::Atom { name } => Formula::new_atom(name),
            FormulaTree::Not { content } => Formula::new_not((*content).into()),
            FormulaTree::And { lhs, rhs } => Formula::new_and((*lhs).into(), (*rhs).into()),
            FormulaTree::Or { lhs, rhs } => Formula::new_or((*lhs).into(), (*rhs).into()),
            FormulaTree::Modal {
                kind,
                modality,
                power,
                content,
                s5,
            } => Formula::new_modal(kind, modality, power, (*content).into(), s5),
        }
    }
}
