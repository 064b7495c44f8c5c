//! Dotted/bracketed output paths (`a.b[2].c`).
//!
//! A [`PathExpression`] addresses a location in a generated document. It is
//! used both as the key for scenario overrides and as the write location for
//! the [`DocumentBuilder`](crate::builder::DocumentBuilder).
//!
//! Only `.` and a trailing `[N]` suffix are structural; every other character
//! (including `@`, `$`, `-`) is part of the key.

use std::fmt;
use std::str::FromStr;

use crate::error::GenerateError;

/// Largest array index a path string may address. Writing index `N` pads
/// the array to `N + 1` elements, so the bound also caps what one override
/// key can make the generator allocate.
pub const MAX_PATH_INDEX: usize = 100_000;

/// One step of a path: descend into `key`, then optionally into array index
/// `index` under it.
///
/// An empty `key` with an index only appears for chained indices
/// (`matrix[0][1]`) and means "index into the current array".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathStep {
    pub key: String,
    pub index: Option<usize>,
}

impl PathStep {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            index: None,
        }
    }

    pub fn indexed(key: impl Into<String>, index: usize) -> Self {
        Self {
            key: key.into(),
            index: Some(index),
        }
    }
}

/// Parsed, ordered sequence of [`PathStep`]s.
///
/// Two expressions parsed from the same string are equal and hash equally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathExpression {
    steps: Vec<PathStep>,
}

impl PathExpression {
    /// The empty expression, addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    /// Parse a path string.
    ///
    /// ```
    /// use json_sample_gen_core::{PathExpression, PathStep};
    /// let path = PathExpression::parse("items[0].name").unwrap();
    /// assert_eq!(
    ///     path.steps(),
    ///     &[PathStep::indexed("items", 0), PathStep::key("name")]
    /// );
    /// ```
    pub fn parse(path: &str) -> Result<Self, GenerateError> {
        if path.is_empty() {
            return Ok(Self::root());
        }

        let mut steps = Vec::new();
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(GenerateError::malformed_path(path, "empty path segment"));
            }
            parse_segment(path, segment, &mut steps)?;
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// `self.key`
    pub fn child(&self, key: &str) -> Self {
        let mut steps = self.steps.clone();
        steps.push(PathStep::key(key));
        Self { steps }
    }

    /// `self[index]`
    ///
    /// Attaches the index to the last step when it has none; otherwise (the
    /// root, or a step that already carries an index) appends a chained index.
    pub fn index(&self, index: usize) -> Self {
        let mut steps = self.steps.clone();
        match steps.last_mut() {
            Some(last) if last.index.is_none() => last.index = Some(index),
            _ => steps.push(PathStep::indexed("", index)),
        }
        Self { steps }
    }

    /// Every array-bearing prefix of this path, paired with the index it asks for.
    ///
    /// `a.b[2].c[0]` yields `(a.b, 2)` and `(a.b[2].c, 0)`.
    pub fn array_prefixes(&self) -> Vec<(PathExpression, usize)> {
        let mut out = Vec::new();
        for (pos, step) in self.steps.iter().enumerate() {
            let Some(index) = step.index else {
                continue;
            };
            let mut prefix: Vec<PathStep> = self.steps[..pos].to_vec();
            if !step.key.is_empty() {
                prefix.push(PathStep::key(step.key.clone()));
            }
            out.push((PathExpression::from_steps(prefix), index));
        }
        out
    }
}

fn parse_segment(
    path: &str,
    segment: &str,
    steps: &mut Vec<PathStep>,
) -> Result<(), GenerateError> {
    let Some(open) = segment.find('[') else {
        if segment.contains(']') {
            return Err(GenerateError::malformed_path(
                path,
                format!("unbalanced ']' in segment '{segment}'"),
            ));
        }
        steps.push(PathStep::key(segment));
        return Ok(());
    };

    let key = &segment[..open];
    if key.contains(']') {
        return Err(GenerateError::malformed_path(
            path,
            format!("unbalanced ']' in segment '{segment}'"),
        ));
    }
    let mut rest = &segment[open..];
    let mut first = true;
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(GenerateError::malformed_path(
                path,
                format!("unexpected text after index in segment '{segment}'"),
            ));
        };
        let Some(close) = inner.find(']') else {
            return Err(GenerateError::malformed_path(
                path,
                format!("unbalanced '[' in segment '{segment}'"),
            ));
        };
        let digits = &inner[..close];
        let index = parse_index(digits).ok_or_else(|| {
            GenerateError::malformed_path(path, format!("non-integer index '[{digits}]'"))
        })?;
        let index = usize::try_from(index)
            .ok()
            .filter(|i| *i <= MAX_PATH_INDEX)
            .ok_or_else(|| {
                GenerateError::malformed_path(
                    path,
                    format!("index [{digits}] exceeds the limit of {MAX_PATH_INDEX}"),
                )
            })?;

        if first {
            steps.push(PathStep::indexed(key, index));
            first = false;
        } else {
            steps.push(PathStep::indexed("", index));
        }
        rest = &inner[close + 1..];
    }
    Ok(())
}

fn parse_index(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Digit strings too long for u64 are still integers, just out of range
    Some(digits.parse().unwrap_or(u64::MAX))
}

impl fmt::Display for PathExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            let chained = step.key.is_empty() && step.index.is_some();
            if i > 0 && !chained {
                f.write_str(".")?;
            }
            f.write_str(&step.key)?;
            if let Some(index) = step.index {
                write!(f, "[{index}]")?;
            }
        }
        Ok(())
    }
}

impl FromStr for PathExpression {
    type Err = GenerateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
