use std::result::Result as StdResult;

use nom::{
    IResult,
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::separated_nonempty_list,
    sequence::{delimited, pair},
    error::context,
};

pub type ParseError = crate::error::ParseError;
type Result<'a, T> = IResult<&'a str, T, ParseError>;

fn take_i64(input: &str) -> Result<i64> {
    context(
        "integer",
        map_res(
            recognize(pair(opt(char('-')), digit1)),
            |s: &str| s.parse::<i64>(),
        ),
    )(input)
}

fn separator(input: &str) -> Result<char> {
    delimited(multispace0, char(','), multispace0)(input)
}

fn parse_program_nom(input: &str) -> Result<Vec<i64>> {
    all_consuming(
        delimited(
            multispace0,
            separated_nonempty_list(separator, take_i64),
            multispace0,
        ),
    )(input)
}

/// Parses comma separated integers. Whitespace and newlines are allowed around the commas and at
/// both ends of the input.
pub(crate) fn parse_program(input: &str) -> StdResult<Vec<i64>, ParseError> {
    match parse_program_nom(input) {
        Ok((_, words)) => Ok(words),
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => Err(err),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::incomplete()),
    }
}
