//! Scalar leaf values.
//!
//! The generator asks a [`ValueProvider`] for every scalar it has to invent.
//! [`DefaultValueProvider`] produces plausible values from the leaf schema:
//! numeric bounds, string lengths and common `format`s.
//!
//! Randomness always comes from the caller's RNG, so a provider holds no
//! mutable state and can be shared freely across threads.

use rand::distributions::Distribution;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use crate::error::GenerateError;
use crate::resolver::ScalarKind;

/// Produces values for scalar leaves.
pub trait ValueProvider: Send + Sync {
    fn provide(
        &self,
        schema: &Map<String, Value>,
        kind: ScalarKind,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerateError>;
}

/// Built-in provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValueProvider;

const DEFAULT_MIN: f64 = -100.0;
const DEFAULT_MAX: f64 = 100.0;
const DEFAULT_SPAN: f64 = DEFAULT_MAX - DEFAULT_MIN;
const DEFAULT_MIN_LENGTH: usize = 5;
/// Upper bound for unbounded repetition (`*`, `+`, `{n,}`) in `pattern`.
const MAX_PATTERN_REPEAT: u32 = 16;
const NUMBER_EXCLUSIVE_STEP: f64 = 0.01;

const WORDS: &[&str] = &[
    "alpha", "amber", "anchor", "apple", "arrow", "atlas", "autumn", "beacon", "birch", "bloom",
    "breeze", "bridge", "canyon", "cedar", "cinder", "cloud", "comet", "coral", "crystal", "delta",
    "ember", "falcon", "fern", "forest", "glacier", "harbor", "hazel", "horizon", "island", "jade",
    "lantern", "lotus", "maple", "meadow", "nebula", "oasis", "orbit", "pebble", "pine", "prairie",
    "quartz", "river", "saffron", "shadow", "spruce", "summit", "thunder", "timber", "valley",
    "willow",
];

const FIRST_NAMES: &[&str] = &[
    "alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi", "ivan", "judy", "mallory",
    "oscar", "peggy", "trent", "victor", "wendy",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net", "mail.test"];

const TLDS: &[&str] = &["com", "org", "net", "io", "dev"];

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const HEX: &[u8] = b"0123456789abcdef";

impl ValueProvider for DefaultValueProvider {
    fn provide(
        &self,
        schema: &Map<String, Value>,
        kind: ScalarKind,
        rng: &mut dyn RngCore,
    ) -> Result<Value, GenerateError> {
        Ok(match kind {
            ScalarKind::String => Value::String(gen_string(schema, rng)),
            ScalarKind::Integer => Value::from(gen_integer(schema, rng)),
            ScalarKind::Number => gen_number(schema, rng),
            ScalarKind::Boolean => Value::Bool(rng.gen_bool(0.5)),
            ScalarKind::Null => Value::Null,
        })
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Numeric range from `minimum`/`maximum` and their exclusive forms.
///
/// A numeric `exclusiveMinimum`/`exclusiveMaximum` (draft 6+) applies
/// alongside `minimum`/`maximum`; whichever is tighter wins. A boolean one
/// (draft 4) makes the matching explicit bound open. Non-numeric bounds are
/// ignored. A missing side defaults to the built-in range, widened when the
/// other side lies beyond it. Swapped bounds are put back in order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Interval {
    lower: f64,
    lower_open: bool,
    upper: f64,
    upper_open: bool,
}

impl Interval {
    fn from_schema(schema: &Map<String, Value>) -> Self {
        let (lower, lower_open) = bound(schema, "minimum", "exclusiveMinimum", |new, old| new >= old);
        let (upper, upper_open) = bound(schema, "maximum", "exclusiveMaximum", |new, old| new <= old);

        let (lower, upper) = match (lower, upper) {
            (Some(lower), Some(upper)) => (lower, upper),
            (Some(lower), None) => (lower, DEFAULT_MAX.max(lower + DEFAULT_SPAN)),
            (None, Some(upper)) => (DEFAULT_MIN.min(upper - DEFAULT_SPAN), upper),
            (None, None) => (DEFAULT_MIN, DEFAULT_MAX),
        };

        if lower > upper {
            return Self {
                lower: upper,
                lower_open: upper_open,
                upper: lower,
                upper_open: lower_open,
            };
        }
        Self {
            lower,
            lower_open,
            upper,
            upper_open,
        }
    }
}

/// One side of the range: the inclusive keyword, tightened by the exclusive one.
fn bound(
    schema: &Map<String, Value>,
    inclusive: &str,
    exclusive: &str,
    tighter: fn(f64, f64) -> bool,
) -> (Option<f64>, bool) {
    let value = schema.get(inclusive).and_then(Value::as_f64);
    match schema.get(exclusive) {
        Some(Value::Number(n)) => match n.as_f64() {
            Some(n) if value.map_or(true, |v| tighter(n, v)) => (Some(n), true),
            _ => (value, false),
        },
        Some(Value::Bool(true)) => (value, value.is_some()),
        _ => (value, false),
    }
}

fn gen_integer(schema: &Map<String, Value>, rng: &mut dyn RngCore) -> i64 {
    let range = Interval::from_schema(schema);
    let lo = if range.lower_open {
        range.lower.floor() + 1.0
    } else {
        range.lower.ceil()
    };
    let hi = if range.upper_open {
        range.upper.ceil() - 1.0
    } else {
        range.upper.floor()
    };
    let (lo, hi) = (lo as i64, hi as i64);
    if lo > hi {
        tracing::warn!(?range, "no integer inside bounds, using lower bound");
        return lo;
    }
    rng.gen_range(lo..=hi)
}

fn gen_number(schema: &Map<String, Value>, rng: &mut dyn RngCore) -> Value {
    let range = Interval::from_schema(schema);
    let step = |open: bool| if open { NUMBER_EXCLUSIVE_STEP } else { 0.0 };
    let lo = range.lower + step(range.lower_open);
    let hi = range.upper - step(range.upper_open);

    let n = if lo <= hi {
        if (hi - lo).is_finite() {
            rng.gen_range(lo..=hi)
        } else {
            lo
        }
    } else if range.lower < range.upper {
        // Open interval narrower than two steps: the midpoint is still inside
        range.lower + (range.upper - range.lower) / 2.0
    } else {
        tracing::warn!(?range, "no number inside bounds, using lower bound");
        range.lower
    };
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

fn gen_string(schema: &Map<String, Value>, rng: &mut dyn RngCore) -> String {
    if let Some(format) = schema.get("format").and_then(Value::as_str) {
        return gen_format(format, rng);
    }
    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        if let Some(s) = gen_pattern(pattern, rng) {
            return s;
        }
    }

    let min_length = length(schema, "minLength");
    let max_length = length(schema, "maxLength");
    if min_length.is_some() || max_length.is_some() {
        let min = min_length.unwrap_or(DEFAULT_MIN_LENGTH.min(max_length.unwrap_or(usize::MAX)));
        let max = max_length.unwrap_or(min.saturating_add(10)).max(min);
        let len = rng.gen_range(min..=max);
        return (0..len)
            .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
            .collect();
    }

    pick(WORDS, rng).to_string()
}

/// A string matching `pattern`, or `None` when it does not compile.
///
/// Patterns are matched unanchored, so a leading `^` and trailing `$` are
/// dropped before compiling.
fn gen_pattern(pattern: &str, rng: &mut dyn RngCore) -> Option<String> {
    let body = pattern.strip_prefix('^').unwrap_or(pattern);
    let body = match body.strip_suffix('$') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => body,
    };
    match rand_regex::Regex::compile(body, MAX_PATTERN_REPEAT) {
        Ok(regex) => Some(regex.sample(rng)),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "unsupported pattern, ignoring");
            None
        }
    }
}

fn length(schema: &Map<String, Value>, key: &str) -> Option<usize> {
    schema
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

fn pick<'a>(items: &'a [&'a str], rng: &mut dyn RngCore) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn gen_format(format: &str, rng: &mut dyn RngCore) -> String {
    match format {
        "email" => {
            let name = pick(FIRST_NAMES, rng);
            let n: u16 = rng.gen_range(1..99);
            format!("{name}{n}@{}", pick(EMAIL_DOMAINS, rng))
        }
        "date-time" => format!("{}T{}Z", gen_date(rng), gen_time(rng)),
        "date" => gen_date(rng),
        "time" => gen_time(rng),
        "phone" => format!(
            "+1-{}-{}-{}",
            rng.gen_range(200..999),
            rng.gen_range(200..999),
            rng.gen_range(1000..9999)
        ),
        "uri" | "url" => format!(
            "https://{}.{}/{}",
            pick(WORDS, rng),
            pick(TLDS, rng),
            pick(WORDS, rng)
        ),
        "hostname" => format!("{}.{}", pick(WORDS, rng), pick(TLDS, rng)),
        "ipv4" => format!(
            "{}.{}.{}.{}",
            rng.gen_range(1u8..=254),
            rng.gen_range(0u8..=255),
            rng.gen_range(0u8..=255),
            rng.gen_range(1u8..=254)
        ),
        "ipv6" => (0..8)
            .map(|_| format!("{:04x}", rng.gen_range(0u16..=0xffff)))
            .collect::<Vec<_>>()
            .join(":"),
        "uuid" => gen_uuid(rng),
        other => format!("unknown-format-{other}"),
    }
}

fn gen_date(rng: &mut dyn RngCore) -> String {
    let y = rng.gen_range(2000..=2030);
    let m = rng.gen_range(1..=12);
    let d = rng.gen_range(1..=days_in_month(m));
    format!("{y:04}-{m:02}-{d:02}")
}

fn gen_time(rng: &mut dyn RngCore) -> String {
    let h = rng.gen_range(0..24);
    let m = rng.gen_range(0..60);
    let s = rng.gen_range(0..60);
    format!("{h:02}:{m:02}:{s:02}")
}

fn days_in_month(month: u32) -> u32 {
    match month {
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

fn gen_uuid(rng: &mut dyn RngCore) -> String {
    let mut hex = |n: usize| -> String {
        (0..n)
            .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
            .collect()
    };
    let a = hex(8);
    let b = hex(4);
    let c = hex(3);
    let d = hex(3);
    let e = hex(12);
    let variant = ['8', '9', 'a', 'b'][rng.gen_range(0..4)];
    format!("{a}-{b}-4{c}-{variant}{d}-{e}")
}

// ===========================================================================
// Tests
// ===========================================================================
