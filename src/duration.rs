//! Free-form duration strings to ISO-8601.
//!
//! Paprika stores prep/cook/total times as whatever the user typed, usually
//! something like `"1 hour 30 minutes"`. Recipe schema consumers (search
//! engines, the static-site theme) want `PT1H30M`. The conversion is
//! best-effort: anything that does not read as alternating
//! `<number> <unit>` pairs produces no value rather than an error.
//!
//! ```text
//! "1 hour 30 minutes"  → PT1H30M
//! "2 days"             → P2D
//! "1.5 hrs"            → PT1.5H
//! "1 hour 30"          → PT1H        (dangling magnitude dropped)
//! "5 bananas"          → None        (unknown unit)
//! ""                   → None
//! ```

use std::collections::BTreeMap;

/// Duration components in ISO-8601 designator order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Unit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Unit {
    fn parse(token: &str) -> Option<Self> {
        let unit = match token.to_ascii_lowercase().as_str() {
            "year" | "years" | "yr" | "yrs" => Unit::Years,
            "month" | "months" => Unit::Months,
            "week" | "weeks" | "wk" | "wks" => Unit::Weeks,
            "day" | "days" => Unit::Days,
            "hour" | "hours" | "hr" | "hrs" | "h" => Unit::Hours,
            "minute" | "minutes" | "min" | "mins" | "m" => Unit::Minutes,
            "second" | "seconds" | "sec" | "secs" | "s" => Unit::Seconds,
            _ => return None,
        };
        Some(unit)
    }

    fn designator(self) -> char {
        match self {
            Unit::Years => 'Y',
            Unit::Months | Unit::Minutes => 'M',
            Unit::Weeks => 'W',
            Unit::Days => 'D',
            Unit::Hours => 'H',
            Unit::Seconds => 'S',
        }
    }

    fn is_time(self) -> bool {
        matches!(self, Unit::Hours | Unit::Minutes | Unit::Seconds)
    }
}

/// Normalize a space-delimited duration into its ISO-8601 form.
///
/// Tokens are grouped pairwise as `(magnitude, unit)`; a trailing token
/// without a partner is ignored. When a unit repeats, the last magnitude
/// wins. Returns `None` for blank input, non-numeric or negative
/// magnitudes, and unit names that are not recognised.
pub fn normalize(input: &str) -> Option<String> {
    let tokens: Vec<&str> = input.split_whitespace().collect();

    let mut parts = BTreeMap::new();
    for pair in tokens.chunks_exact(2) {
        let magnitude = parse_magnitude(pair[0])?;
        let unit = Unit::parse(pair[1])?;
        parts.insert(unit, magnitude);
    }

    if parts.is_empty() {
        return None;
    }
    Some(render(&parts))
}

fn parse_magnitude(token: &str) -> Option<f64> {
    let value: f64 = token.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

fn render(parts: &BTreeMap<Unit, f64>) -> String {
    let mut date = String::new();
    let mut time = String::new();

    for (&unit, &magnitude) in parts {
        if magnitude == 0.0 {
            continue;
        }
        let target = if unit.is_time() { &mut time } else { &mut date };
        target.push_str(&format_magnitude(magnitude));
        target.push(unit.designator());
    }

    match (date.is_empty(), time.is_empty()) {
        (true, true) => "PT0S".to_string(),
        (false, true) => format!("P{date}"),
        _ => format!("P{date}T{time}"),
    }
}

/// Whole numbers print without a fractional part (`90`, not `90.0`).
fn format_magnitude(value: f64) -> String {
    if value.fract() == 0.0 && value < 1e15 {
        format!("{}", value as u64)
    } else {
        format!("{value}")
    }
}
