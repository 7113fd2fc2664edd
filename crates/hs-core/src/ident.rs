//! Composite time-series identifiers and data intervals.

use crate::error::{CoreError, CoreResult};
use core::fmt;
use std::str::FromStr;

/// Regular data interval of a time series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interval {
    Minute(u32),
    Hour(u32),
    Day,
    Month,
    Year,
    Irregular,
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Minute(1) => write!(f, "Minute"),
            Interval::Minute(n) => write!(f, "{}Minute", n),
            Interval::Hour(1) => write!(f, "Hour"),
            Interval::Hour(n) => write!(f, "{}Hour", n),
            Interval::Day => write!(f, "Day"),
            Interval::Month => write!(f, "Month"),
            Interval::Year => write!(f, "Year"),
            Interval::Irregular => write!(f, "Irregular"),
        }
    }
}

impl FromStr for Interval {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        let (mult_str, base) = match lower.find(|c: char| !c.is_ascii_digit()) {
            Some(pos) => (&lower[..pos], &lower[pos..]),
            None => ("", lower.as_str()),
        };
        let mult = if mult_str.is_empty() {
            1
        } else {
            mult_str.parse::<u32>().map_err(|_| CoreError::ParseInterval {
                what: format!("bad multiplier in '{}'", trimmed),
            })?
        };
        if mult == 0 {
            return Err(CoreError::ParseInterval {
                what: format!("zero multiplier in '{}'", trimmed),
            });
        }
        match base {
            "minute" | "min" => Ok(Interval::Minute(mult)),
            "hour" => Ok(Interval::Hour(mult)),
            "day" if mult == 1 => Ok(Interval::Day),
            "month" if mult == 1 => Ok(Interval::Month),
            "year" if mult == 1 => Ok(Interval::Year),
            "irregular" if mult == 1 => Ok(Interval::Irregular),
            _ => Err(CoreError::ParseInterval {
                what: format!("unrecognized interval '{}'", trimmed),
            }),
        }
    }
}

/// Composite time-series identifier: `Location.DataType.Interval[.Scenario]`.
///
/// The normalized (lowercase) composite string is the matching key used by
/// the selector; matching supports a single `*` wildcard.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TsIdent {
    pub location: String,
    pub data_type: String,
    pub interval: Interval,
    pub scenario: Option<String>,
}

impl TsIdent {
    pub fn new(location: impl Into<String>, data_type: impl Into<String>, interval: Interval) -> Self {
        Self {
            location: location.into(),
            data_type: data_type.into(),
            interval,
            scenario: None,
        }
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    /// Parse `Location.DataType.Interval` or `Location.DataType.Interval.Scenario`.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() < 3 || parts.len() > 4 {
            return Err(CoreError::ParseIdent {
                what: format!("expected 3 or 4 dot-separated parts in '{}'", s),
            });
        }
        if parts[0].is_empty() || parts[1].is_empty() {
            return Err(CoreError::ParseIdent {
                what: format!("empty location or data type in '{}'", s),
            });
        }
        let interval = parts[2].parse::<Interval>()?;
        let mut ident = TsIdent::new(parts[0], parts[1], interval);
        if parts.len() == 4 && !parts[3].is_empty() {
            ident.scenario = Some(parts[3].to_string());
        }
        Ok(ident)
    }

    /// Lowercase composite key used for matching.
    pub fn normalized(&self) -> String {
        self.to_string().to_ascii_lowercase()
    }

    /// Case-insensitive match against a pattern containing at most one `*`.
    ///
    /// A pattern with no `*` is an exact comparison against the normalized
    /// identifier.
    pub fn matches(&self, pattern: &str) -> bool {
        let key = self.normalized();
        let pat = pattern.trim().to_ascii_lowercase();
        match pat.find('*') {
            None => key == pat,
            Some(pos) => {
                let (prefix, rest) = pat.split_at(pos);
                let suffix = &rest[1..];
                key.len() >= prefix.len() + suffix.len()
                    && key.starts_with(prefix)
                    && key.ends_with(suffix)
            }
        }
    }
}

impl fmt::Display for TsIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.location, self.data_type, self.interval)?;
        if let Some(scenario) = &self.scenario {
            write!(f, ".{}", scenario)?;
        }
        Ok(())
    }
}

impl FromStr for TsIdent {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        TsIdent::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_three_part_ident() {
        let id = TsIdent::parse("A.Flow.Day").unwrap();
        assert_eq!(id.location, "A");
        assert_eq!(id.data_type, "Flow");
        assert_eq!(id.interval, Interval::Day);
        assert_eq!(id.scenario, None);
        assert_eq!(id.to_string(), "A.Flow.Day");
    }

    #[test]
    fn parse_four_part_ident() {
        let id = TsIdent::parse("Gauge1.Stage.6Hour.Hist").unwrap();
        assert_eq!(id.interval, Interval::Hour(6));
        assert_eq!(id.scenario.as_deref(), Some("Hist"));
        assert_eq!(id.to_string(), "Gauge1.Stage.6Hour.Hist");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(TsIdent::parse("A.Flow").is_err());
        assert!(TsIdent::parse(".Flow.Day").is_err());
        assert!(TsIdent::parse("A.Flow.Fortnight").is_err());
        assert!(TsIdent::parse("A.Flow.Day.S.Extra").is_err());
    }

    #[test]
    fn interval_round_trip() {
        for text in ["Minute", "15Minute", "Hour", "6Hour", "Day", "Month", "Year", "Irregular"] {
            let parsed: Interval = text.parse().unwrap();
            assert_eq!(parsed.to_string(), text);
        }
        assert!("0Hour".parse::<Interval>().is_err());
        assert!("2Day".parse::<Interval>().is_err());
    }

    #[test]
    fn wildcard_matching() {
        let id = TsIdent::parse("A.Flow.Day").unwrap();
        assert!(id.matches("A.Flow.Day"));
        assert!(id.matches("a.flow.day"));
        assert!(id.matches("A.*"));
        assert!(id.matches("*.Day"));
        assert!(id.matches("A.*.Day"));
        assert!(id.matches("*"));
        assert!(!id.matches("B.*"));
        assert!(!id.matches("A.Stage.Day"));
    }

    #[test]
    fn wildcard_does_not_overlap_prefix_and_suffix() {
        // "A.D" must not match "A.*.D"-style pattern by reusing characters.
        let id = TsIdent::new("A", "F", Interval::Day);
        assert!(!id.matches("a.f.daya.f.day*"));
    }

    proptest! {
        #[test]
        fn ident_matches_itself(loc in "[A-Za-z][A-Za-z0-9]{0,8}", dt in "[A-Za-z][A-Za-z0-9]{0,8}") {
            let id = TsIdent::new(loc, dt, Interval::Day);
            prop_assert!(id.matches(&id.to_string()));
            prop_assert!(id.matches(&id.normalized()));
            prop_assert!(id.matches("*"));
        }
    }
}
