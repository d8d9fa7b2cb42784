// Parsers for filter arguments, discrete value sets and column aliases

use super::lexer::{field_until, token_until, ws};
use crate::filter::FilterSpec;
use nom::{
    character::complete::char,
    combinator::{all_consuming, map, opt, rest},
    multi::separated_list1,
    sequence::{preceded, separated_pair, tuple},
    IResult,
};

/// Parse a command-line filter
/// Format: FIELD:LOWER or FIELD:LOWER:UPPER
pub fn parse_filter_arg(input: &str) -> IResult<&str, FilterSpec> {
    all_consuming(map(
        tuple((
            ws(field_until(':')),
            preceded(char(':'), token_until(':')),
            opt(preceded(char(':'), rest)),
        )),
        |(field, lower, upper): (&str, &str, Option<&str>)| FilterSpec {
            field: field.trim().to_string(),
            lower: lower.trim().to_string(),
            upper: upper.map(|u| u.trim().to_string()),
        },
    ))(input)
}

/// Parse a column alias
/// Format: NAME=ALIAS
pub fn parse_alias_arg(input: &str) -> IResult<&str, (String, String)> {
    all_consuming(map(
        separated_pair(ws(field_until('=')), char('='), ws(rest)),
        |(name, alias): (&str, &str)| (name.trim().to_string(), alias.trim().to_string()),
    ))(input)
}

/// Parse a comma-separated set of literals, trimming each entry
pub fn parse_value_set(input: &str) -> Vec<String> {
    let parsed: IResult<&str, Vec<&str>> =
        all_consuming(separated_list1(char(','), token_until(',')))(input);
    match parsed {
        Ok((_, items)) => items.into_iter().map(|s| s.trim().to_string()).collect(),
        // separated_list1 always accepts a single (possibly empty) token
        Err(_) => vec![input.trim().to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_filter() {
        let (_, spec) = parse_filter_arg("cases:10:20").unwrap();
        assert_eq!(spec.field, "cases");
        assert_eq!(spec.lower, "10");
        assert_eq!(spec.upper, Some("20".to_string()));
    }

    #[test]
    fn test_parse_set_filter() {
        let (_, spec) = parse_filter_arg(" geoId : US, BR").unwrap();
        assert_eq!(spec.field, "geoId");
        assert_eq!(spec.lower, "US, BR");
        assert_eq!(spec.upper, None);
    }

    #[test]
    fn test_parse_filter_missing_lower() {
        assert!(parse_filter_arg("cases").is_err());
        assert!(parse_filter_arg(":10:20").is_err());
    }

    #[test]
    fn test_parse_alias() {
        let (_, (name, alias)) = parse_alias_arg("cases_weekly = weekly").unwrap();
        assert_eq!(name, "cases_weekly");
        assert_eq!(alias, "weekly");
        assert!(parse_alias_arg("no_separator").is_err());
    }

    #[test]
    fn test_parse_value_set() {
        assert_eq!(parse_value_set("a, b"), vec!["a", "b"]);
        assert_eq!(parse_value_set(" single "), vec!["single"]);
        assert_eq!(parse_value_set("x,,y"), vec!["x", "", "y"]);
    }
}
