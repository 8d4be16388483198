// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::str::FromStr;

use anyhow::bail;
use jiff::RoundMode;
use jiff::Span;
use jiff::Unit;
use jiff::Zoned;
use jiff::ZonedRound;

/// Defines a fixed period for rolling of a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// Minutely Rotation
    Minutely,
    /// Hourly Rotation
    Hourly,
    /// Daily Rotation
    Daily,
    /// No Time Rotation
    Never,
}

impl Rotation {
    /// The period rolling over on the most frequent field of a `SimpleDateFormat` date pattern.
    ///
    /// `'.'yyyy-MM-dd` rolls over daily, `'.'yyyy-MM-dd-HH` hourly and `'.'yyyy-MM-dd-HH-mm`
    /// minutely. Quoted text is ignored.
    pub fn from_date_pattern(pattern: &str) -> anyhow::Result<Rotation> {
        let mut quoted = false;
        let mut rotation = Rotation::Never;
        for c in pattern.chars() {
            if c == '\'' {
                quoted = !quoted;
                continue;
            }
            if quoted {
                continue;
            }
            let period = match c {
                'm' => Rotation::Minutely,
                'H' | 'h' | 'k' | 'K' | 'a' => Rotation::Hourly,
                'd' | 'D' | 'E' | 'u' | 'w' | 'W' | 'M' | 'y' => Rotation::Daily,
                _ => continue,
            };
            rotation = rotation.most_frequent(period);
        }
        if rotation == Rotation::Never {
            bail!("date pattern '{pattern}' has no date or time field");
        }
        Ok(rotation)
    }

    fn most_frequent(self, other: Rotation) -> Rotation {
        let rank = |rotation| match rotation {
            Rotation::Minutely => 3,
            Rotation::Hourly => 2,
            Rotation::Daily => 1,
            Rotation::Never => 0,
        };
        if rank(other) > rank(self) {
            other
        } else {
            self
        }
    }

    /// The start of the next period in milliseconds since the epoch.
    pub(crate) fn next_date_timestamp(&self, now: &Zoned) -> Option<i64> {
        let (unit, span) = match self {
            Rotation::Minutely => (Unit::Minute, Span::new().minutes(1)),
            Rotation::Hourly => (Unit::Hour, Span::new().hours(1)),
            Rotation::Daily => (Unit::Day, Span::new().days(1)),
            Rotation::Never => return None,
        };
        let start = now
            .round(ZonedRound::new().smallest(unit).mode(RoundMode::Trunc))
            .ok()?;
        let next = start.checked_add(span).ok()?;
        Some(next.timestamp().as_millisecond())
    }

    pub(crate) fn date_format(&self) -> &'static str {
        match self {
            Rotation::Minutely => "%Y-%m-%d-%H-%M",
            Rotation::Hourly => "%Y-%m-%d-%H",
            Rotation::Daily | Rotation::Never => "%Y-%m-%d",
        }
    }
}

impl FromStr for Rotation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutely" => Ok(Rotation::Minutely),
            "hourly" => Ok(Rotation::Hourly),
            "daily" => Ok(Rotation::Daily),
            "never" => Ok(Rotation::Never),
            _ => bail!("unknown rotation '{s}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_date_timestamp() {
        let now: Zoned = "2024-08-10T17:12:52+08:00[+08:00]".parse().unwrap();
        let at = |s: &str| s.parse::<Zoned>().unwrap().timestamp().as_millisecond();

        assert_eq!(
            Rotation::Minutely.next_date_timestamp(&now),
            Some(at("2024-08-10T17:13:00+08:00[+08:00]"))
        );
        assert_eq!(
            Rotation::Hourly.next_date_timestamp(&now),
            Some(at("2024-08-10T18:00:00+08:00[+08:00]"))
        );
        assert_eq!(
            Rotation::Daily.next_date_timestamp(&now),
            Some(at("2024-08-11T00:00:00+08:00[+08:00]"))
        );
        assert_eq!(Rotation::Never.next_date_timestamp(&now), None);
    }

    #[test]
    fn test_from_date_pattern() {
        assert_eq!(
            Rotation::from_date_pattern("'.'yyyy-MM-dd").unwrap(),
            Rotation::Daily
        );
        assert_eq!(
            Rotation::from_date_pattern("'.'yyyy-MM-dd-HH").unwrap(),
            Rotation::Hourly
        );
        assert_eq!(
            Rotation::from_date_pattern("'.'yyyy-MM-dd-HH-mm").unwrap(),
            Rotation::Minutely
        );
        assert!(Rotation::from_date_pattern("'.log'").is_err());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Hourly".parse::<Rotation>().unwrap(), Rotation::Hourly);
        assert!("weekly".parse::<Rotation>().is_err());
    }
}
