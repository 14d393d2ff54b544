use std::sync::LazyLock;

use chrono::{Duration, NaiveDateTime};
use regex::Regex;

use crate::record::JobRecord;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy)]
enum Offset {
    /// Captured count times this many hours.
    Hours(i64),
    /// Captured count times this many days.
    Days(i64),
    /// A fixed number of days, no count captured.
    Fixed(i64),
}

struct DateRule {
    pattern: Regex,
    offset: Offset,
}

fn rule(pattern: &str, offset: Offset) -> DateRule {
    DateRule {
        pattern: Regex::new(pattern).unwrap(),
        offset,
    }
}

// Evaluated in order; the first matching rule decides.
static RULES: LazyLock<Vec<DateRule>> = LazyLock::new(|| {
    vec![
        rule(r"(\d+)(?:[ +]{1,3})?(?:hour|hr)", Offset::Hours(1)),
        rule(r"(\d+)(?:[ +]{1,3})?(?:day|d)", Offset::Days(1)),
        rule(r"(\d+)(?:[ +]{1,3})?month", Offset::Days(30)),
        rule(r"(\d+)(?:[ +]{1,3})?year", Offset::Days(365)),
        rule(r"(?i)today|just posted", Offset::Fixed(0)),
        rule(r"(?i)yesterday", Offset::Fixed(1)),
    ]
});

/// Turns relative post ages ("3 days", "Yesterday") into dates counted back
/// from the moment the run started.
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    anchor: NaiveDateTime,
}

impl DateNormalizer {
    pub fn new(anchor: NaiveDateTime) -> Self {
        DateNormalizer { anchor }
    }

    /// Absolute date for `raw`, or `raw` itself when no rule matches.
    pub fn normalize(&self, raw: &str) -> String {
        for r in RULES.iter() {
            let Some(caps) = r.pattern.captures(raw) else {
                continue;
            };
            let count = || -> Option<i64> { caps.get(1)?.as_str().parse().ok() };
            let back = match r.offset {
                Offset::Hours(mult) => count()
                    .and_then(|n| n.checked_mul(mult))
                    .and_then(Duration::try_hours),
                Offset::Days(mult) => count()
                    .and_then(|n| n.checked_mul(mult))
                    .and_then(Duration::try_days),
                Offset::Fixed(days) => Duration::try_days(days),
            };
            return back
                .and_then(|d| self.anchor.checked_sub_signed(d))
                .map(|dt| dt.format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| raw.to_string());
        }
        raw.to_string()
    }

    pub fn apply(&self, record: &mut JobRecord) {
        record.normalized_date = self.normalize(&record.raw_date);
    }
}
