//! Decoded note positions and measure ranges

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Location of a note in the score timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Effective 1-based measure number
    pub measure: u32,
    /// 1-based fractional beat within the measure (quarter-note beats)
    pub beat: f64,
    /// Tick from the start of the piece, or from the start of the
    /// requested measure window when a range filter is active
    pub tick: u64,
}

/// A single pitch taken from the score
///
/// `position` is `None` when the note was found by a timing-agnostic scan
/// and its place in the timeline is unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedNote {
    pub pitch_name: String,
    pub position: Option<Position>,
}

impl ExtractedNote {
    pub fn positioned(pitch_name: String, position: Position) -> Self {
        Self { pitch_name, position: Some(position) }
    }

    pub fn unpositioned(pitch_name: String) -> Self {
        Self { pitch_name, position: None }
    }
}

/// Errors for caller-supplied measure ranges
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("measure numbers start at 1 (got {start}-{end})")]
    ZeroBound { start: u32, end: u32 },

    #[error("start measure {start} is after end measure {end}")]
    Inverted { start: u32, end: u32 },

    #[error("invalid measure range '{0}', expected START-END")]
    Syntax(String),
}

/// Inclusive range of effective measure numbers, both bounds >= 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureRange {
    start: u32,
    end: u32,
}

impl MeasureRange {
    pub fn new(start: u32, end: u32) -> Result<Self, RangeError> {
        if start == 0 || end == 0 {
            return Err(RangeError::ZeroBound { start, end });
        }
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, measure: u32) -> bool {
        (self.start..=self.end).contains(&measure)
    }
}

impl fmt::Display for MeasureRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Parses `START-END`, or a single `N` meaning `N-N`
impl FromStr for MeasureRange {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| RangeError::Syntax(s.to_string()))
        };

        match s.split_once('-') {
            Some((start, end)) => MeasureRange::new(parse(start)?, parse(end)?),
            None => {
                let n = parse(s)?;
                MeasureRange::new(n, n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validation() {
        assert!(MeasureRange::new(1, 1).is_ok());
        assert!(MeasureRange::new(3, 4).is_ok());
        assert_eq!(
            MeasureRange::new(0, 4),
            Err(RangeError::ZeroBound { start: 0, end: 4 })
        );
        assert_eq!(
            MeasureRange::new(5, 2),
            Err(RangeError::Inverted { start: 5, end: 2 })
        );
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let range = MeasureRange::new(3, 4).unwrap();
        assert!(!range.contains(2));
        assert!(range.contains(3));
        assert!(range.contains(4));
        assert!(!range.contains(5));
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("3-4".parse::<MeasureRange>(), MeasureRange::new(3, 4));
        assert_eq!(" 2 - 9 ".parse::<MeasureRange>(), MeasureRange::new(2, 9));
        assert_eq!("7".parse::<MeasureRange>(), MeasureRange::new(7, 7));
    }

    #[test]
    fn test_parse_range_rejects_bad_input() {
        assert!(matches!("a-b".parse::<MeasureRange>(), Err(RangeError::Syntax(_))));
        assert!(matches!("-3".parse::<MeasureRange>(), Err(RangeError::Syntax(_))));
        assert!(matches!("4-2".parse::<MeasureRange>(), Err(RangeError::Inverted { .. })));
        assert!(matches!("0-2".parse::<MeasureRange>(), Err(RangeError::ZeroBound { .. })));
    }

    #[test]
    fn test_range_display_round_trips() {
        let range = MeasureRange::new(12, 16).unwrap();
        assert_eq!(range.to_string(), "12-16");
    }
}
