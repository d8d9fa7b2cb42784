// Date/datetime cell parser
//
// Accepted forms: YYYY-MM-DD, YYYY-MM-DD HH:MM[:SS] (space or 'T'), DD/MM/YYYY.
// Values are stored as seconds since the Unix epoch, UTC.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::{char, one_of},
    combinator::{all_consuming, map, map_opt, map_res, opt},
    sequence::{preceded, tuple},
    IResult,
};

fn number(min: usize, max: usize) -> impl FnMut(&str) -> IResult<&str, u32> {
    move |input| {
        map_res(take_while_m_n(min, max, |c: char| c.is_ascii_digit()), |s: &str| {
            s.parse::<u32>()
        })(input)
    }
}

/// YYYY-MM-DD
fn iso_date(input: &str) -> IResult<&str, (u32, u32, u32)> {
    map(
        tuple((number(4, 4), char('-'), number(1, 2), char('-'), number(1, 2))),
        |(y, _, m, _, d)| (y, m, d),
    )(input)
}

/// DD/MM/YYYY
fn day_first_date(input: &str) -> IResult<&str, (u32, u32, u32)> {
    map(
        tuple((number(1, 2), char('/'), number(1, 2), char('/'), number(4, 4))),
        |(d, _, m, _, y)| (y, m, d),
    )(input)
}

fn calendar_date(input: &str) -> IResult<&str, NaiveDate> {
    map_opt(alt((iso_date, day_first_date)), |(y, m, d)| {
        NaiveDate::from_ymd_opt(y as i32, m, d)
    })(input)
}

/// HH:MM[:SS]
fn time_of_day(input: &str) -> IResult<&str, NaiveTime> {
    map_opt(
        tuple((
            number(1, 2),
            char(':'),
            number(2, 2),
            opt(preceded(char(':'), number(2, 2))),
        )),
        |(h, _, m, s)| NaiveTime::from_hms_opt(h, m, s.unwrap_or(0)),
    )(input)
}

fn datetime(input: &str) -> IResult<&str, i64> {
    let (input, date) = calendar_date(input)?;
    let (input, time) = opt(preceded(one_of(" T"), time_of_day))(input)?;
    // A bare date is midnight
    let time = time.unwrap_or_default();

    Ok((input, date.and_time(time).and_utc().timestamp()))
}

/// Parse a whole cell as a timestamp, returning epoch seconds
pub fn parse_timestamp(input: &str) -> Option<i64> {
    all_consuming(datetime)(input.trim()).ok().map(|(_, v)| v)
}

/// Render epoch seconds back to text; midnight values render as a bare date
pub fn format_timestamp(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(dt) if dt.num_seconds_from_midnight() == 0 => dt.format("%Y-%m-%d").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => secs.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_timestamp("1970-01-01"), Some(0));
        assert_eq!(parse_timestamp("1970-01-02"), Some(86_400));
        assert_eq!(parse_timestamp("2020-12-14"), Some(1_607_904_000));
    }

    #[test]
    fn test_parse_day_first() {
        assert_eq!(parse_timestamp("14/12/2020"), parse_timestamp("2020-12-14"));
    }

    #[test]
    fn test_parse_datetime() {
        assert_eq!(parse_timestamp("1970-01-01 01:00"), Some(3600));
        assert_eq!(parse_timestamp("1970-01-01T00:00:30"), Some(30));
    }

    #[test]
    fn test_rejects_invalid() {
        assert_eq!(parse_timestamp("2021-02-29"), None);
        assert_eq!(parse_timestamp("2020-13-01"), None);
        assert_eq!(parse_timestamp("2020-01-01 25:00"), None);
        assert_eq!(parse_timestamp("2020"), None);
        assert_eq!(parse_timestamp("hello"), None);
        assert_eq!(parse_timestamp("2020-01-01 extra"), None);
    }

    #[test]
    fn test_leap_day() {
        assert!(parse_timestamp("2020-02-29").is_some());
        assert!(parse_timestamp("2000-02-29").is_some());
        assert!(parse_timestamp("1900-02-29").is_none());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01");
        assert_eq!(format_timestamp(1_607_904_000), "2020-12-14");
        assert_eq!(format_timestamp(3661), "1970-01-01 01:01:01");
        assert_eq!(format_timestamp(-86_400), "1969-12-31");
    }
}
