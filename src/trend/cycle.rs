//! Cycle arithmetic: units, indices, positions, weights and expiry
//!
//! A rolling window is `cycles_count` equal cycles of one [`CycleUnit`] each.
//! The cycle index of an instant is `(field % cycles_count) + 1`, where the
//! field is minute-of-hour, hour-of-day or day-of-year. Nothing here touches
//! a store; everything is a function of the configuration and an instant.

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Length of one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleUnit {
    /// One minute, indexed by minute-of-hour
    Minute,

    /// One hour, indexed by hour-of-day
    #[default]
    Hour,

    /// One day, indexed by day-of-year
    Day,
}

impl CycleUnit {
    /// All recognized units
    pub const ALL: [CycleUnit; 3] = [Self::Minute, Self::Hour, Self::Day];

    /// Seconds in one unit
    #[must_use]
    pub fn seconds(self) -> u64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3600,
            Self::Day => 86400,
        }
    }

    /// The time field this unit is indexed by
    ///
    /// Day-of-year is 1-based, so December 31st of a leap year is 366.
    #[must_use]
    pub fn field<Tz: TimeZone>(self, at: &DateTime<Tz>) -> u32 {
        match self {
            Self::Minute => at.minute(),
            Self::Hour => at.hour(),
            Self::Day => at.ordinal(),
        }
    }

    /// Lowercase name as used in configuration
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

impl fmt::Display for CycleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CycleUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            _ => Err(Error::invalid_cycle_unit(s)),
        }
    }
}

/// The resolved shape of a rolling window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSchedule {
    unit: CycleUnit,
    cycles_count: u32,
}

impl CycleSchedule {
    /// Create a schedule. `cycles_count` must be at least 1.
    pub fn new(unit: CycleUnit, cycles_count: u32) -> crate::Result<Self> {
        if cycles_count == 0 {
            return Err(Error::config("cycles_count must be greater than 0"));
        }
        Ok(Self { unit, cycles_count })
    }

    #[must_use]
    pub fn unit(&self) -> CycleUnit {
        self.unit
    }

    #[must_use]
    pub fn cycles_count(&self) -> u32 {
        self.cycles_count
    }

    /// Seconds in one cycle
    #[must_use]
    pub fn cycle_length(&self) -> u64 {
        self.unit.seconds()
    }

    /// Seconds in the full rolling window
    #[must_use]
    pub fn cycle_interval(&self) -> u64 {
        self.cycle_length() * u64::from(self.cycles_count)
    }

    /// `1 / cycles_count`, rounded to one decimal place
    ///
    /// Rounds the exact binary value half-to-even, so 4 cycles give 0.2
    /// (0.25 is a true tie) while 20 cycles give 0.1 (0.05 is stored
    /// slightly above the tie).
    #[must_use]
    pub fn weight_offset(&self) -> f64 {
        let exact = 1.0 / f64::from(self.cycles_count);
        format!("{exact:.1}").parse().unwrap_or(exact)
    }

    /// Weights by recency rank; the current cycle always weighs 1.0
    ///
    /// With 3 cycles this is `[1.0, 0.7, 0.4]`.
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        let offset = self.weight_offset();
        (0..self.cycles_count)
            .map(|rank| 1.0 - f64::from(rank) * offset)
            .collect()
    }

    /// Cycle index in `[1, cycles_count]` for an instant
    #[must_use]
    pub fn cycle_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> u32 {
        self.unit.field(at) % self.cycles_count + 1
    }

    /// Cycle indices from the current one backwards, wrapping
    ///
    /// With 4 cycles and current cycle 3 this is `[3, 2, 1, 4]`.
    #[must_use]
    pub fn positions_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> Vec<u32> {
        let current = self.cycle_at(at);
        (0..self.cycles_count)
            .map(|back| (current + self.cycles_count - 1 - back) % self.cycles_count + 1)
            .collect()
    }

    /// Seconds until a bucket written at `at` should expire
    ///
    /// Anchored to the cycle grid: the bucket dies one full interval after
    /// the start of its slot, however late in the slot the first write lands.
    #[must_use]
    pub fn expire_seconds_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> u64 {
        let now = at.timestamp();
        let length = self.cycle_length() as i64;
        let expire_at = now.div_euclid(length) * length + self.cycle_interval() as i64;
        (expire_at - now) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn test_unit_seconds() {
        assert_eq!(CycleUnit::Minute.seconds(), 60);
        assert_eq!(CycleUnit::Hour.seconds(), 3600);
        assert_eq!(CycleUnit::Day.seconds(), 86400);
    }

    #[test]
    fn test_unit_parse() {
        assert_eq!("minute".parse::<CycleUnit>().unwrap(), CycleUnit::Minute);
        assert_eq!("Hour".parse::<CycleUnit>().unwrap(), CycleUnit::Hour);
        assert_eq!(" day ".parse::<CycleUnit>().unwrap(), CycleUnit::Day);
        assert!(matches!(
            "foobar".parse::<CycleUnit>(),
            Err(Error::InvalidCycleUnit { .. })
        ));
    }

    #[test]
    fn test_default_unit_is_hour() {
        assert_eq!(CycleUnit::default(), CycleUnit::Hour);
    }

    #[test]
    fn test_zero_cycles_rejected() {
        assert!(CycleSchedule::new(CycleUnit::Hour, 0).is_err());
    }

    #[test]
    fn test_cycle_interval() {
        let schedule = CycleSchedule::new(CycleUnit::Minute, 2).unwrap();
        assert_eq!(schedule.cycle_interval(), 120);

        let schedule = CycleSchedule::new(CycleUnit::Day, 4).unwrap();
        assert_eq!(schedule.cycle_interval(), 345_600);

        let schedule = CycleSchedule::new(CycleUnit::Hour, 3).unwrap();
        assert_eq!(schedule.cycle_interval(), 3 * 60 * 60);
    }

    #[test]
    fn test_weight_offset_rounds_to_tenths() {
        let three = CycleSchedule::new(CycleUnit::Hour, 3).unwrap();
        assert!((three.weight_offset() - 0.3).abs() < 1e-9);

        let four = CycleSchedule::new(CycleUnit::Hour, 4).unwrap();
        assert!((four.weight_offset() - 0.2).abs() < 1e-9);

        let two = CycleSchedule::new(CycleUnit::Hour, 2).unwrap();
        assert!((two.weight_offset() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_weights_for_three_cycles() {
        let schedule = CycleSchedule::new(CycleUnit::Hour, 3).unwrap();
        let weights = schedule.weights();
        let expected = [1.0, 0.7, 0.4];

        assert_eq!(weights.len(), 3);
        for (w, e) in weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-9, "{w} != {e}");
        }
    }

    #[test]
    fn test_weight_offset_table() {
        let cases = [
            (1, 1.0),
            (5, 0.2),
            (6, 0.2),
            (7, 0.1),
            (10, 0.1),
            (15, 0.1),
            (20, 0.1),
            (21, 0.0),
        ];
        for (count, expected) in cases {
            let schedule = CycleSchedule::new(CycleUnit::Hour, count).unwrap();
            assert!(
                (schedule.weight_offset() - expected).abs() < 1e-9,
                "count {count}: {} != {expected}",
                schedule.weight_offset()
            );
        }
    }

    #[test]
    fn test_weights_for_four_cycles() {
        let schedule = CycleSchedule::new(CycleUnit::Hour, 4).unwrap();
        let weights = schedule.weights();
        let expected = [1.0, 0.8, 0.6, 0.4];

        assert_eq!(weights.len(), 4);
        for (w, e) in weights.iter().zip(expected) {
            assert!((w - e).abs() < 1e-9, "{w} != {e}");
        }
    }

    #[test]
    fn test_hour_cycles_wrap() {
        let schedule = CycleSchedule::new(CycleUnit::Hour, 3).unwrap();
        assert_eq!(schedule.cycle_at(&at("2012-07-30T18:00:00-07:00")), 1);
        assert_eq!(schedule.cycle_at(&at("2012-07-30T18:30:00-07:00")), 1);
        assert_eq!(schedule.cycle_at(&at("2012-07-30T19:00:00-07:00")), 2);
        assert_eq!(schedule.cycle_at(&at("2012-07-30T20:00:00-07:00")), 3);
        assert_eq!(schedule.cycle_at(&at("2012-07-30T21:00:00-07:00")), 1);
    }

    #[test]
    fn test_day_cycles_across_new_year() {
        let schedule = CycleSchedule::new(CycleUnit::Day, 3).unwrap();
        assert_eq!(schedule.cycle_at(&at("2012-12-31T18:00:00-07:00")), 1);
        assert_eq!(schedule.cycle_at(&at("2013-01-01T18:00:00-07:00")), 2);
        assert_eq!(schedule.cycle_at(&at("2013-01-02T18:00:00-07:00")), 3);
        assert_eq!(schedule.cycle_at(&at("2013-01-03T18:00:00-07:00")), 1);
    }

    #[test]
    fn test_positions_wrap_backwards() {
        let schedule = CycleSchedule::new(CycleUnit::Hour, 4).unwrap();
        assert_eq!(
            schedule.positions_at(&at("2012-07-30T18:00:00-07:00")),
            vec![3, 2, 1, 4]
        );
    }

    #[test]
    fn test_single_cycle_window() {
        let schedule = CycleSchedule::new(CycleUnit::Minute, 1).unwrap();
        let now = at("2012-07-30T18:17:00-07:00");
        assert_eq!(schedule.cycle_at(&now), 1);
        assert_eq!(schedule.positions_at(&now), vec![1]);
        assert_eq!(schedule.weights(), vec![1.0]);
    }

    #[test]
    fn test_expiry_on_boundary_is_full_interval() {
        let schedule = CycleSchedule::new(CycleUnit::Hour, 3).unwrap();
        assert_eq!(
            schedule.expire_seconds_at(&at("2012-07-30T18:00:00-07:00")),
            10_800
        );
    }

    #[test]
    fn test_expiry_is_anchored_to_cycle_start() {
        let schedule = CycleSchedule::new(CycleUnit::Hour, 3).unwrap();
        assert_eq!(
            schedule.expire_seconds_at(&at("2012-07-30T18:45:00-07:00")),
            10_800 - 45 * 60
        );
    }
}
