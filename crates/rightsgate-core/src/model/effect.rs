//! Declarative effect of a matched policy and its constraint hints.
//!
//! Quota and rate-limit hints are carried verbatim for a downstream
//! enforcement point. The time window is the only hint the engine itself
//! checks.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::value::DynamicValue;

/// Effect of a policy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Effect {
    #[serde(default)]
    pub allow: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<QuotaLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, DynamicValue>>,
}

impl Effect {
    /// Effect used when a policy stores no effect at all.
    pub fn permissive() -> Self {
        Self {
            allow: true,
            ..Self::default()
        }
    }
}

/// Decode a stored `effect` blob. Empty text yields [`Effect::permissive`].
pub fn decode_effect(raw: &str) -> serde_json::Result<Effect> {
    if raw.trim().is_empty() {
        return Ok(Effect::permissive());
    }
    let effect: Option<Effect> = serde_json::from_str(raw)?;
    Ok(effect.unwrap_or_default())
}

/// Quota period. Periods outside daily/monthly/yearly are carried as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum QuotaPeriod {
    Daily,
    Monthly,
    Yearly,
    Other(String),
}

impl Default for QuotaPeriod {
    fn default() -> Self {
        QuotaPeriod::Other(String::new())
    }
}

impl QuotaPeriod {
    pub fn as_str(&self) -> &str {
        match self {
            QuotaPeriod::Daily => "daily",
            QuotaPeriod::Monthly => "monthly",
            QuotaPeriod::Yearly => "yearly",
            QuotaPeriod::Other(s) => s,
        }
    }
}

impl From<Option<String>> for QuotaPeriod {
    fn from(s: Option<String>) -> Self {
        match s.as_deref() {
            Some("daily") => QuotaPeriod::Daily,
            Some("monthly") => QuotaPeriod::Monthly,
            Some("yearly") => QuotaPeriod::Yearly,
            _ => QuotaPeriod::Other(s.unwrap_or_default()),
        }
    }
}

impl From<QuotaPeriod> for String {
    fn from(p: QuotaPeriod) -> Self {
        p.as_str().to_owned()
    }
}

/// Usage quota hint. Carried for a downstream enforcer, so every field is
/// optional on decode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuotaLimit {
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub period: QuotaPeriod,
    /// tokens, requests, bytes, ...
    #[serde(default)]
    pub unit: String,
}

/// Request-rate hint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimit {
    #[serde(default)]
    pub requests: i64,
    /// Stored as an integer count of nanoseconds; negative counts read as zero.
    #[serde(default, with = "duration_nanos")]
    pub window: Duration,
}

mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let nanos = i64::deserialize(d)?;
        Ok(Duration::from_nanos(u64::try_from(nanos).unwrap_or(0)))
    }
}

/// Allowed clock-time window on a set of weekdays, in a named timezone.
///
/// `start` is inclusive and `end` exclusive. When `end <= start` the window
/// wraps past midnight. An empty day set allows every day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeWindowDoc", into = "TimeWindowDoc")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
    timezone: Tz,
    days: Vec<Weekday>,
}

/// Persisted shape: `{start_time: "HH:MM", end_time: "HH:MM", timezone, days: [0=Sunday..6]}`.
#[derive(Serialize, Deserialize)]
struct TimeWindowDoc {
    start_time: String,
    end_time: String,
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    days: Vec<u8>,
}

impl TimeWindow {
    pub fn new(start_time: &str, end_time: &str, timezone: &str, days: &[u8]) -> Result<Self, String> {
        TimeWindow::try_from(TimeWindowDoc {
            start_time: start_time.to_owned(),
            end_time: end_time.to_owned(),
            timezone: timezone.to_owned(),
            days: days.to_vec(),
        })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// Whether `at`, seen in this window's timezone, falls inside the window.
    pub fn contains(&self, at: &DateTime<FixedOffset>) -> bool {
        let local = at.with_timezone(&self.timezone);
        if !self.days.is_empty() && !self.days.contains(&local.weekday()) {
            return false;
        }

        let t = local.time();
        if self.start < self.end {
            t >= self.start && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

fn parse_clock(s: &str, which: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| format!("invalid time_window.{which} {s:?}: {e}"))
}

fn weekday_from_sunday(n: u8) -> Option<Weekday> {
    match n {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

impl TryFrom<TimeWindowDoc> for TimeWindow {
    type Error = String;

    fn try_from(doc: TimeWindowDoc) -> Result<Self, Self::Error> {
        let start = parse_clock(&doc.start_time, "start_time")?;
        let end = parse_clock(&doc.end_time, "end_time")?;

        let tz_name = doc.timezone.trim();
        let timezone = if tz_name.is_empty() {
            Tz::UTC
        } else {
            tz_name
                .parse::<Tz>()
                .map_err(|_| format!("invalid time_window.timezone {tz_name:?}"))?
        };

        let mut days = Vec::with_capacity(doc.days.len());
        for n in doc.days {
            let day = weekday_from_sunday(n)
                .ok_or_else(|| format!("invalid time_window.days entry {n} (expected 0..=6)"))?;
            if !days.contains(&day) {
                days.push(day);
            }
        }

        Ok(Self {
            start,
            end,
            timezone,
            days,
        })
    }
}

impl From<TimeWindow> for TimeWindowDoc {
    fn from(w: TimeWindow) -> Self {
        Self {
            start_time: w.start.format("%H:%M").to_string(),
            end_time: w.end.format("%H:%M").to_string(),
            timezone: w.timezone.name().to_owned(),
            days: w
                .days
                .iter()
                .filter_map(|d| u8::try_from(d.num_days_from_sunday()).ok())
                .collect(),
        }
    }
}
