//! Year list parsing for `--years` and the `years` config key
//!
//! Accepts single years and inclusive ranges separated by commas:
//! `2018-2021,2023` yields 2018, 2019, 2020, 2021 and 2023.

/// Error types for year list parsing
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum YearParseError {
    #[error("No years given")]
    Empty,

    #[error("Invalid year: {input}. Expected a four digit year such as 2019")]
    InvalidYear { input: String },

    #[error("Invalid year range: {start} is after {end}")]
    InvalidRange { start: i32, end: i32 },
}

fn parse_year(input: &str) -> Result<i32, YearParseError> {
    let trimmed = input.trim();
    match trimmed.parse::<i32>() {
        Ok(year) if (1..=9999).contains(&year) => Ok(year),
        _ => Err(YearParseError::InvalidYear { input: trimmed.to_string() }),
    }
}

/// Parse a year list into ascending, de-duplicated years
///
/// ```
/// use blogstats::cli::year_parser::parse_years;
///
/// assert_eq!(parse_years("2018-2020,2019,2023").unwrap(), vec![2018, 2019, 2020, 2023]);
/// ```
pub fn parse_years(input: &str) -> Result<Vec<i32>, YearParseError> {
    let mut years = Vec::new();

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let (start, end) = (parse_year(start)?, parse_year(end)?);
                if start > end {
                    return Err(YearParseError::InvalidRange { start, end });
                }
                years.extend(start..=end);
            }
            None => years.push(parse_year(part)?),
        }
    }

    if years.is_empty() {
        return Err(YearParseError::Empty);
    }
    years.sort_unstable();
    years.dedup();
    Ok(years)
}
