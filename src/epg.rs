//! EPG "now playing" and progress computation.
//!
//! Pure functions of `(programs, now)`; the hosting screen re-evaluates on
//! every render tick, so there are no timers here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::api::EpgListing;

/// Programs shown per channel
pub const VISIBLE_PROGRAMS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct EpgProgram {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub title: String,
    pub description: String,
}

impl EpgProgram {
    /// Decode a provider listing. Entries without usable times are dropped.
    pub fn from_listing(listing: &EpgListing) -> Option<Self> {
        let start = timestamp_field(listing.start_timestamp.as_ref())
            .or_else(|| parse_local(&listing.start))?;
        let end = timestamp_field(listing.stop_timestamp.as_ref())
            .or_else(|| parse_local(&listing.end))?;
        Some(Self {
            start,
            end,
            title: decode_text(&listing.title),
            description: decode_text(&listing.description),
        })
    }

    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.end > self.start && self.start <= now && now < self.end
    }

    /// 0..=100, clamped; a zero-length program reports 0
    pub fn progress_percent(&self, now: DateTime<Utc>) -> f64 {
        let total = (self.end - self.start).num_milliseconds();
        if total <= 0 {
            return 0.0;
        }
        let elapsed = (now - self.start).num_milliseconds();
        (elapsed as f64 / total as f64).clamp(0.0, 1.0) * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpgEntry {
    pub program: EpgProgram,
    pub progress_percent: f64,
    pub is_current: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EpgSchedule {
    NoProgramming,
    Listing {
        current: Option<EpgProgram>,
        items: Vec<EpgEntry>,
    },
}

impl EpgSchedule {
    pub fn current(&self) -> Option<&EpgProgram> {
        match self {
            EpgSchedule::Listing { current, .. } => current.as_ref(),
            EpgSchedule::NoProgramming => None,
        }
    }

    pub fn items(&self) -> &[EpgEntry] {
        match self {
            EpgSchedule::Listing { items, .. } => items,
            EpgSchedule::NoProgramming => &[],
        }
    }
}

/// First [`VISIBLE_PROGRAMS`] programs with progress; the first current one wins
pub fn current_and_upcoming(programs: &[EpgProgram], now: DateTime<Utc>) -> EpgSchedule {
    if programs.is_empty() {
        return EpgSchedule::NoProgramming;
    }
    let items: Vec<EpgEntry> = programs
        .iter()
        .take(VISIBLE_PROGRAMS)
        .map(|p| EpgEntry {
            program: p.clone(),
            progress_percent: p.progress_percent(now),
            is_current: p.is_current(now),
        })
        .collect();
    let current = items
        .iter()
        .find(|e| e.is_current)
        .map(|e| e.program.clone());
    EpgSchedule::Listing { current, items }
}

/// Base64 text as sent by the provider; anything undecodable is shown raw
pub fn decode_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match STANDARD.decode(raw.trim()) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}

fn timestamp_field(value: Option<&serde_json::Value>) -> Option<DateTime<Utc>> {
    let secs = match value? {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp(secs, 0)
}

fn parse_local(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn program(start: DateTime<Utc>, minutes: i64, title: &str) -> EpgProgram {
        EpgProgram {
            start,
            end: start + Duration::minutes(minutes),
            title: title.to_string(),
            description: String::new(),
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn progress_boundaries() {
        let p = program(t0(), 60, "News");
        assert_eq!(p.progress_percent(t0()), 0.0);
        assert_eq!(p.progress_percent(t0() + Duration::minutes(30)), 50.0);
        assert_eq!(p.progress_percent(p.end), 100.0);
        assert_eq!(p.progress_percent(t0() - Duration::hours(1)), 0.0);
        assert_eq!(p.progress_percent(p.end + Duration::hours(1)), 100.0);
    }

    #[test]
    fn current_is_half_open() {
        let p = program(t0(), 60, "News");
        assert!(p.is_current(t0()));
        assert!(!p.is_current(p.end));
    }

    #[test]
    fn zero_length_program_is_never_current() {
        let p = program(t0(), 0, "Blip");
        assert_eq!(p.progress_percent(t0()), 0.0);
        assert!(!p.is_current(t0()));
    }

    #[test]
    fn empty_input_has_no_programming() {
        assert_eq!(current_and_upcoming(&[], t0()), EpgSchedule::NoProgramming);
    }

    #[test]
    fn first_overlapping_match_wins_and_list_is_bounded() {
        let mut programs = vec![
            program(t0() - Duration::minutes(30), 60, "A"),
            program(t0() - Duration::minutes(10), 60, "B"),
        ];
        for i in 0..6 {
            programs.push(program(t0() + Duration::hours(i + 1), 60, "later"));
        }
        let schedule = current_and_upcoming(&programs, t0());
        assert_eq!(schedule.current().map(|p| p.title.as_str()), Some("A"));
        assert_eq!(schedule.items().len(), VISIBLE_PROGRAMS);
        assert!(schedule.items()[1].is_current);
    }

    #[test]
    fn decodes_base64_and_falls_back_to_raw() {
        assert_eq!(decode_text("Sm9ybmFsIE5hY2lvbmFs"), "Jornal Nacional");
        assert_eq!(decode_text("not base64!"), "not base64!");
        assert_eq!(decode_text(""), "");
    }

    #[test]
    fn listing_prefers_unix_timestamps() {
        let listing = EpgListing {
            title: "TmV3cw==".into(),
            description: String::new(),
            start: "garbage".into(),
            end: "garbage".into(),
            start_timestamp: Some(serde_json::json!("1700000000")),
            stop_timestamp: Some(serde_json::json!(1700003600)),
        };
        let p = EpgProgram::from_listing(&listing).unwrap();
        assert_eq!(p.title, "News");
        assert_eq!(p.start, t0());
        assert_eq!(p.end, t0() + Duration::hours(1));
    }

    #[test]
    fn listing_without_times_is_dropped() {
        let listing = EpgListing {
            title: "x".into(),
            ..Default::default()
        };
        assert!(EpgProgram::from_listing(&listing).is_none());
    }

    #[test]
    fn listing_parses_local_strings() {
        let listing = EpgListing {
            title: "x".into(),
            start: "2024-03-01 20:00:00".into(),
            end: "2024-03-01 21:30:00".into(),
            ..Default::default()
        };
        let p = EpgProgram::from_listing(&listing).unwrap();
        assert_eq!(p.end - p.start, Duration::minutes(90));
    }
}
