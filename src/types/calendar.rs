//! Calendar context for zone-relative temporal decoding.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use std::str::FromStr;

use crate::error::{Error, Result};

/// The zone in which stored zone-less date/time values were recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    zone: FixedOffset,
}

impl Calendar {
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    pub fn utc() -> Self {
        Self { zone: Utc.fix() }
    }

    /// Calendar at `seconds` east of UTC.
    ///
    /// Fails with a conversion error outside ±24 hours.
    pub fn from_offset_seconds(seconds: i32) -> Result<Self> {
        FixedOffset::east_opt(seconds)
            .map(Self::new)
            .ok_or_else(|| Error::type_conversion(format!("invalid UTC offset: {}s", seconds)))
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    /// Interpret a wall-clock value as recorded in this calendar's zone.
    pub fn resolve(&self, local: NaiveDateTime) -> Result<DateTime<FixedOffset>> {
        self.zone
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| {
                Error::type_conversion(format!("{} does not exist at offset {}", local, self.zone))
            })
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl FromStr for Calendar {
    type Err = Error;

    /// Parses `UTC`, `Z` or an offset such as `+09:00`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("utc") || s == "Z" {
            return Ok(Self::utc());
        }
        s.parse::<FixedOffset>()
            .map(Self::new)
            .map_err(|e| Error::type_conversion(format!("invalid calendar zone '{}': {}", s, e)))
    }
}
