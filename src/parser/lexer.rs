// Shared lexical helpers for the nom parsers

use nom::{
    bytes::complete::{take_till, take_till1},
    character::complete::multispace0,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so that it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Consume a non-empty run of characters up to (not including) `sep`
pub fn field_until(sep: char) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| take_till1(move |c| c == sep)(input)
}

/// Consume a possibly empty run of characters up to (not including) `sep`
pub fn token_until(sep: char) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| take_till(move |c| c == sep)(input)
}
