//! Simulation time parsing.
//!
//! Start and stop times follow the simulator's time-string convention:
//! a non-negative decimal number with an optional unit suffix
//! (e.g. "1s", "500ms", "1.5min", "2"). A bare number is in seconds.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

const NS_PER_US: u64 = 1_000;
const NS_PER_MS: u64 = 1_000_000;
const NS_PER_S: u64 = 1_000_000_000;
const NS_PER_MIN: u64 = 60 * NS_PER_S;
const NS_PER_H: u64 = 60 * NS_PER_MIN;
const NS_PER_D: u64 = 24 * NS_PER_H;

/// Match: "<number>[.<fraction>][e<exp>] [unit]"
static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d*)?|\.\d+)(?:[eE]([+-]?\d+))?\s*(d|h|min|s|ms|us|ns)?$")
        .expect("Invalid time regex")
});

/// Errors from parsing a time string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    #[error("invalid time format: '{0}'")]
    InvalidFormat(String),
    #[error("time '{0}' is out of range")]
    OutOfRange(String),
}

/// A point in simulation time, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(into = "String")]
pub struct SimTime(u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_nanos(ns: u64) -> Self {
        SimTime(ns)
    }

    pub fn from_secs(s: u64) -> Self {
        SimTime(s.saturating_mul(NS_PER_S))
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Parse a time string such as "1s", "250ms" or "0.5".
    pub fn parse(input: &str) -> Result<Self, TimeError> {
        let trimmed = input.trim();
        let caps = TIME_PATTERN
            .captures(trimmed)
            .ok_or_else(|| TimeError::InvalidFormat(input.to_string()))?;

        let number = &caps[1];
        let exponent: i32 = match caps.get(2) {
            Some(m) => m
                .as_str()
                .parse()
                .map_err(|_| TimeError::OutOfRange(input.to_string()))?,
            None => 0,
        };
        let unit_ns = match caps.get(3).map(|m| m.as_str()) {
            Some("d") => NS_PER_D,
            Some("h") => NS_PER_H,
            Some("min") => NS_PER_MIN,
            Some("s") | None => NS_PER_S,
            Some("ms") => NS_PER_MS,
            Some("us") => NS_PER_US,
            Some("ns") => 1,
            Some(_) => return Err(TimeError::InvalidFormat(input.to_string())),
        };

        to_nanos(number, exponent, unit_ns)
            .map(SimTime)
            .ok_or_else(|| TimeError::OutOfRange(input.to_string()))
    }
}

/// Scale a decimal literal by `10^exponent * unit_ns`, truncating below 1ns.
///
/// Works on the digit string so that "0.1s" is exactly 100ms.
fn to_nanos(number: &str, exponent: i32, unit_ns: u64) -> Option<u64> {
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    let digits: String = int_part.chars().chain(frac_part.chars()).collect();
    let scale = exponent.checked_sub(i32::try_from(frac_part.len()).ok()?)?;

    let mantissa: u128 = if digits.is_empty() { 0 } else { digits.parse().ok()? };
    let value = mantissa.checked_mul(u128::from(unit_ns))?;

    let scaled = if scale >= 0 {
        value.checked_mul(10u128.checked_pow(scale as u32)?)?
    } else {
        match 10u128.checked_pow(scale.unsigned_abs()) {
            Some(divisor) => value / divisor,
            None => 0,
        }
    };
    u64::try_from(scaled).ok()
}

impl std::str::FromStr for SimTime {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SimTime::parse(s)
    }
}

impl fmt::Display for SimTime {
    /// Formats in the largest unit that represents the value exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(u64, &str); 6] = [
            (NS_PER_H, "h"),
            (NS_PER_MIN, "min"),
            (NS_PER_S, "s"),
            (NS_PER_MS, "ms"),
            (NS_PER_US, "us"),
            (1, "ns"),
        ];
        if self.0 == 0 {
            return f.write_str("0s");
        }
        for (scale, unit) in UNITS {
            if self.0 % scale == 0 {
                return write!(f, "{}{}", self.0 / scale, unit);
            }
        }
        write!(f, "{}ns", self.0)
    }
}

impl From<SimTime> for String {
    fn from(t: SimTime) -> String {
        t.to_string()
    }
}

impl From<std::time::Duration> for SimTime {
    fn from(d: std::time::Duration) -> Self {
        SimTime(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }
}
