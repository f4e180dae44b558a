//! Parsing for binding specifications such as `"C-x C-p|C-x h"`.
use nom::{
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{char, multispace0, multispace1},
    combinator::{eof, peek, value},
    multi::{many0, separated_list1},
    sequence::{delimited, terminated},
    IResult,
};

use crate::key::{Chord, Modifiers};

/// Errors produced while reading a binding specification.
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ChordSpecError {
    /// The specification contained no chords.
    #[error("Empty key binding specification")]
    Empty,

    /// The specification couldn't be parsed.
    #[error("Invalid key binding specification: {0:?}")]
    Invalid(String),
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '|'
}

fn parse_modifier(input: &str) -> IResult<&str, Modifiers> {
    let (input, m) = alt((
        value(Modifiers::CONTROL, char('C')),
        value(Modifiers::META, char('M')),
        value(Modifiers::SHIFT, char('S')),
    ))(input)?;
    let (input, _) = char('-')(input)?;

    // A dash only separates a modifier when a key follows it, so "C--" is Control + "-".
    let (input, _) = peek(take_till1(is_separator))(input)?;

    Ok((input, m))
}

fn parse_chord(input: &str) -> IResult<&str, Chord> {
    let (input, mods) = many0(parse_modifier)(input)?;
    let (input, key) = take_till1(is_separator)(input)?;
    let mods = mods.into_iter().fold(Modifiers::empty(), |acc, m| acc | m);

    Ok((input, Chord::new(mods, key)))
}

fn parse_sequence(input: &str) -> IResult<&str, Vec<Chord>> {
    delimited(multispace0, separated_list1(multispace1, parse_chord), multispace0)(input)
}

fn parse_alternates(input: &str) -> IResult<&str, Vec<Vec<Chord>>> {
    terminated(separated_list1(char('|'), parse_sequence), eof)(input)
}

/// Parse a binding specification into its alternative chord sequences.
///
/// Alternatives are separated by `|`, and the chords within a sequence by whitespace. Modifier
/// letters may be written in any order.
pub fn parse_chord_spec(spec: &str) -> Result<Vec<Vec<Chord>>, ChordSpecError> {
    if spec.trim().is_empty() {
        return Err(ChordSpecError::Empty);
    }

    match parse_alternates(spec) {
        Ok((_, seqs)) => Ok(seqs),
        Err(_) => Err(ChordSpecError::Invalid(spec.to_string())),
    }
}
