// Grace windows suppress early stopping for a stretch of steps.
//
// Each window recurs at fixed points of the absolute step timeline: a step
// is inside `(frequency, length)` when `step % frequency < length`. Windows
// are independent of when the last evaluation happened.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriod {
    frequency: u64,
    length: u64,
}

impl GracePeriod {
    pub fn new(frequency: u64, length: u64) -> Result<Self> {
        if frequency == 0 {
            return Err(Error::grace_period(
                &format!("{}:{}", frequency, length),
                "frequency must be positive",
            ));
        }
        Ok(Self { frequency, length })
    }

    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    #[inline]
    pub fn contains(&self, step: u64) -> bool {
        step % self.frequency < self.length
    }
}

impl fmt::Display for GracePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.frequency, self.length)
    }
}

/// True if any window in `schedule` covers `step`.
#[inline]
pub fn is_in_grace(step: u64, schedule: &[GracePeriod]) -> bool {
    schedule.iter().any(|period| period.contains(step))
}

/// Parses `frequency:length` pairs separated by commas, e.g. `"10:19,20:29"`.
///
/// A missing or blank string yields an empty schedule.
pub fn parse_grace_periods(arg: Option<&str>) -> Result<Vec<GracePeriod>> {
    let Some(arg) = arg.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };

    arg.split(',').map(parse_pair).collect()
}

fn parse_pair(pair: &str) -> Result<GracePeriod> {
    let pair = pair.trim();
    let tokens: Vec<&str> = pair.split(':').map(str::trim).collect();

    let [frequency, length] = tokens.as_slice() else {
        return Err(Error::grace_period(
            pair,
            format!("expected 'frequency:length', found {} token(s)", tokens.len()),
        ));
    };

    let frequency = parse_value(pair, "frequency", frequency)?;
    let length = parse_value(pair, "length", length)?;

    if frequency == 0 {
        return Err(Error::grace_period(pair, "frequency must be positive"));
    }

    Ok(GracePeriod { frequency, length })
}

fn parse_value(pair: &str, name: &str, token: &str) -> Result<u64> {
    token
        .parse()
        .map_err(|_| Error::grace_period(pair, format!("{} '{}' is not an integer", name, token)))
}

/// An ordered set of grace windows, usable directly as a CLI value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraceSchedule(Vec<GracePeriod>);

impl GraceSchedule {
    pub fn periods(&self) -> &[GracePeriod] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, step: u64) -> bool {
        is_in_grace(step, &self.0)
    }
}

impl FromStr for GraceSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_grace_periods(Some(s)).map(Self)
    }
}

impl fmt::Display for GraceSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, period) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", period)?;
        }
        Ok(())
    }
}

impl From<Vec<GracePeriod>> for GraceSchedule {
    fn from(periods: Vec<GracePeriod>) -> Self {
        Self(periods)
    }
}
