use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use tracing::debug;

use crate::error::FormulaError;

use super::{Formula, ModalKind, ModalSystem};

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn atom_or_constant(input: &str) -> IResult<&str, Formula> {
    map(identifier, |name: &str| match name {
        "true" => Formula::new_true(),
        "false" => Formula::new_false(),
        _ => Formula::new_atom(name),
    })
    .parse(input)
}

fn symbol_constant(input: &str) -> IResult<&str, Formula> {
    alt((
        value(Formula::new_true(), tag("⊤")),
        value(Formula::new_false(), tag("⊥")),
    ))
    .parse(input)
}

fn modality_index(input: &str) -> IResult<&str, u32> {
    delimited(
        multispace0,
        map_res(digit1, |digits: &str| digits.parse::<u32>()),
        multispace0,
    )
    .parse(input)
}

fn modal_prefix(input: &str) -> IResult<&str, (ModalKind, u32)> {
    alt((
        map(delimited(char('['), modality_index, char(']')), |m| {
            (ModalKind::Box, m)
        }),
        map(delimited(char('<'), modality_index, char('>')), |m| {
            (ModalKind::Diamond, m)
        }),
    ))
    .parse(input)
}

fn primary(input: &str, system: ModalSystem) -> IResult<&str, Formula> {
    alt((
        delimited(
            char('('),
            |i| implication(i, system),
            preceded(multispace0, char(')')),
        ),
        symbol_constant,
        atom_or_constant,
    ))
    .parse(input)
}

fn unary(input: &str, system: ModalSystem) -> IResult<&str, Formula> {
    let negation = map(
        preceded(alt((tag("¬"), tag("~"), tag("!"))), |i| unary(i, system)),
        Formula::new_not,
    );
    let modal = map(pair(modal_prefix, |i| unary(i, system)), |((kind, m), content)| {
        Formula::new_modal(kind, m, 1, content, system.is_s5())
    });
    preceded(multispace0, alt((negation, modal, |i| primary(i, system)))).parse(input)
}

fn conjunction(input: &str, system: ModalSystem) -> IResult<&str, Formula> {
    map(
        pair(
            |i| unary(i, system),
            many0(preceded(
                preceded(multispace0, alt((tag("∧"), tag("&")))),
                |i| unary(i, system),
            )),
        ),
        |(first, rest)| rest.into_iter().fold(first, Formula::new_and),
    )
    .parse(input)
}

fn disjunction(input: &str, system: ModalSystem) -> IResult<&str, Formula> {
    map(
        pair(
            |i| conjunction(i, system),
            many0(preceded(
                preceded(multispace0, alt((tag("∨"), tag("|")))),
                |i| conjunction(i, system),
            )),
        ),
        |(first, rest)| rest.into_iter().fold(first, Formula::new_or),
    )
    .parse(input)
}

/// `a -> b` is read as `¬a ∨ b`; the arrow associates to the right.
fn implication(input: &str, system: ModalSystem) -> IResult<&str, Formula> {
    let (input, lhs) = disjunction(input, system)?;
    let arrow: IResult<&str, &str> =
        preceded(multispace0, alt((tag("->"), tag("→")))).parse(input);
    match arrow {
        Ok((rest, _)) => {
            let (rest, rhs) = implication(rest, system)?;
            Ok((rest, Formula::new_or(Formula::new_not(lhs), rhs)))
        }
        Err(_) => Ok((input, lhs)),
    }
}

/// Parses the rendering syntax of [`Formula`]. Every modal operator gets the S5 flag
/// of `system`.
pub fn parse(input: &str, system: ModalSystem) -> Result<Formula, FormulaError> {
    let result = all_consuming(delimited(
        multispace0,
        |i| implication(i, system),
        multispace0,
    ))
    .parse(input);
    match result {
        Ok((_, formula)) => {
            debug!(%formula, ?system, "parsed formula");
            Ok(formula)
        }
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(FormulaError::Parse {
            near: e.input.to_string(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(FormulaError::Parse {
            near: String::new(),
        }),
    }
}
