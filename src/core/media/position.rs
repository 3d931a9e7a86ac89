//! Positions inside a video, relative to its duration.

use crate::error::MediaError;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

const POSITION_PATTERN: &str = concat!(
    r"^(?P<minus>-)?(?:",
    r"(?:(?:(?P<hours>[0-9]{1,2}):)?(?P<minutes>[0-6]?[0-9]):)?(?P<seconds>[0-6]?[0-9](?:\.[0-9]{1,3})?)",
    r"|(?P<seconds_only>[0-9]+(?:\.[0-9]{1,3})?)",
    r"|(?P<percent>100|[0-9]{1,2})%",
    r")$"
);

/// A position expression
///
/// - `42`, `42.5` seconds
/// - `1:30`, `1:02:03.250` minutes and hours
/// - `25%` of the duration
/// - a leading `-` counts from the end
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    expression: String,
    from_end: bool,
    offset: Offset,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Offset {
    Seconds(f64),
    Percent(u8),
}

impl Position {
    pub fn parse(expression: &str) -> Result<Self, MediaError> {
        let invalid = || MediaError::InvalidPosition {
            expression: expression.to_string(),
        };
        let pattern = Regex::new(POSITION_PATTERN).map_err(|_| invalid())?;
        let captures = pattern.captures(expression).ok_or_else(invalid)?;

        let number = |name: &str| -> Result<Option<f64>, MediaError> {
            captures
                .name(name)
                .map(|m| m.as_str().parse::<f64>().map_err(|_| invalid()))
                .transpose()
        };

        let offset = if let Some(percent) = captures.name("percent") {
            Offset::Percent(percent.as_str().parse().map_err(|_| invalid())?)
        } else if let Some(seconds) = number("seconds_only")? {
            Offset::Seconds(seconds)
        } else {
            let seconds = number("seconds")?.unwrap_or_default();
            let minutes = number("minutes")?.unwrap_or_default();
            let hours = number("hours")?.unwrap_or_default();
            Offset::Seconds(hours * 3600.0 + minutes * 60.0 + seconds)
        };

        Ok(Self {
            expression: expression.to_string(),
            from_end: captures.name("minus").is_some(),
            offset,
        })
    }

    /// Absolute position in seconds, must land within `[0, duration]`
    pub fn seconds(&self, duration: f64) -> Result<f64, MediaError> {
        let offset = match self.offset {
            Offset::Seconds(seconds) => seconds,
            Offset::Percent(percent) => duration * f64::from(percent) / 100.0,
        };
        let seconds = if self.from_end {
            duration - offset
        } else {
            offset
        };
        if !(0.0..=duration).contains(&seconds) {
            return Err(MediaError::PositionOutOfRange {
                expression: self.expression.clone(),
                seconds,
                duration,
            });
        }
        Ok(seconds)
    }

    /// Whether resolving this position needs the video duration
    pub fn needs_duration(&self) -> bool {
        self.from_end || matches!(self.offset, Offset::Percent(_))
    }
}

impl FromStr for Position {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::parse(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(expression: &str, duration: f64) -> Result<f64, MediaError> {
        Position::parse(expression)?.seconds(duration)
    }

    #[test]
    fn percent_of_duration() {
        assert_eq!(seconds("50%", 100.0).unwrap(), 50.0);
        assert_eq!(seconds("100%", 80.0).unwrap(), 80.0);
    }

    #[test]
    fn minus_counts_from_the_end() {
        assert_eq!(seconds("-10", 100.0).unwrap(), 90.0);
        assert_eq!(seconds("-25%", 200.0).unwrap(), 150.0);
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert!(matches!(
            seconds("-200", 100.0),
            Err(MediaError::PositionOutOfRange { .. })
        ));
        assert!(seconds("150", 100.0).is_err());
    }

    #[test]
    fn clock_notation() {
        assert_eq!(seconds("1:30", 1000.0).unwrap(), 90.0);
        assert_eq!(seconds("1:02:03.5", 10000.0).unwrap(), 3723.5);
        assert_eq!(seconds("42.125", 100.0).unwrap(), 42.125);
    }

    #[test]
    fn garbage_is_rejected() {
        for expression in ["", "abc", "10s", "101%", "1:2:3:4", "--5"] {
            assert!(
                matches!(
                    Position::parse(expression),
                    Err(MediaError::InvalidPosition { .. })
                ),
                "{expression} should be invalid"
            );
        }
    }

    #[test]
    fn duration_is_only_needed_for_relative_positions() {
        assert!(!Position::parse("12").unwrap().needs_duration());
        assert!(Position::parse("-12").unwrap().needs_duration());
        assert!(Position::parse("12%").unwrap().needs_duration());
    }
}
