//! Semantic-version range matching for service constraints
//!
//! Constraint ranges follow the npm-style grammar used by service
//! definitions: exact versions, comparator operators, hyphen ranges,
//! x-ranges/wildcards, caret and tilde ranges, whitespace/comma = AND,
//! `||` = OR. Each `||` alternative is normalized into a
//! `semver::VersionReq` (bare versions pin exactly, hyphen ranges become a
//! comparator pair); a tag satisfies the range when any alternative
//! matches.

use crate::core::error::{StagehandError, StagehandResult};
use semver::{Version, VersionReq};
use std::fmt;
use std::str::FromStr;

/// A parsed constraint range: the OR of one or more comparator sets
#[derive(Debug, Clone)]
pub struct VersionRange {
  raw: String,
  alternatives: Vec<VersionReq>,
}

impl VersionRange {
  /// Parse a range expression
  pub fn parse(raw: &str) -> StagehandResult<Self> {
    let mut alternatives = Vec::new();
    for alt in raw.split("||") {
      let normalized = normalize_alternative(alt).ok_or_else(|| invalid_range(raw))?;
      let req = VersionReq::parse(&normalized).map_err(|_| invalid_range(raw))?;
      alternatives.push(req);
    }
    Ok(Self {
      raw: raw.to_string(),
      alternatives,
    })
  }

  /// The range expression as written
  pub fn as_str(&self) -> &str {
    &self.raw
  }

  /// Whether `tag` satisfies this range
  pub fn satisfies(&self, tag: &Version) -> bool {
    self.alternatives.iter().any(|req| req.matches(tag))
  }

  /// The highest tag satisfying this range, or `None` if no tag matches
  pub fn max_satisfying<'a, I>(&self, tags: I) -> Option<&'a Version>
  where
    I: IntoIterator<Item = &'a Version>,
  {
    tags.into_iter().filter(|tag| self.satisfies(tag)).max()
  }
}

impl fmt::Display for VersionRange {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.raw)
  }
}

impl FromStr for VersionRange {
  type Err = StagehandError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    VersionRange::parse(s)
  }
}

fn invalid_range(raw: &str) -> StagehandError {
  StagehandError::message(format!("Invalid version range: `{}`", raw))
}

/// Normalize one `||` alternative into `VersionReq` syntax
fn normalize_alternative(alt: &str) -> Option<String> {
  let alt = alt.trim();
  if alt.is_empty() {
    return Some("*".to_string());
  }

  // "1.2.3 - 2.3": inclusive lower bound, upper bound widened for partials
  if let Some(idx) = alt.find(" - ") {
    return hyphen_comparators(&alt[..idx], &alt[idx + 3..]);
  }

  let mut comparators = Vec::new();
  for token in alt.split([' ', '\t', ',']).filter(|t| !t.is_empty()) {
    comparators.push(normalize_comparator(token)?);
  }
  Some(comparators.join(", "))
}

/// Normalize one comparator token
fn normalize_comparator(token: &str) -> Option<String> {
  let first = token.chars().next()?;
  match first {
    // operators VersionReq understands natively
    '>' | '<' | '=' | '^' | '~' => Some(token.to_string()),
    '*' | 'x' | 'X' if token.len() == 1 => Some("*".to_string()),
    // bare versions: wildcards and partials already behave as ranges under
    // `=`, full versions pin exactly (npm semantics, not cargo's default caret)
    _ if token.contains(['*', 'x', 'X']) => Some(token.to_string()),
    _ => Some(format!("={}", token)),
  }
}

/// Turn `lo - hi` into a `>=lo, <hi'`/`<=hi` comparator pair
fn hyphen_comparators(lo: &str, hi: &str) -> Option<String> {
  let lo = lo.trim();
  let hi = hi.trim();

  let lower = format!(">={}", fill_partial(lo)?);
  let upper = match numeric_components(hi)? {
    3 => format!("<={}", hi),
    2 => {
      let (major, minor) = split_two(hi)?;
      format!("<{}.{}.0", major, minor + 1)
    }
    1 => {
      let major: u64 = hi.parse().ok()?;
      format!("<{}.0.0", major + 1)
    }
    _ => return None,
  };
  Some(format!("{}, {}", lower, upper))
}

/// Number of dot-separated numeric components, `None` when any is not a
/// plain number (wildcards, pre-release suffixes)
fn numeric_components(version: &str) -> Option<usize> {
  let core = version.split(['-', '+']).next()?;
  let parts: Vec<&str> = core.split('.').collect();
  if parts.len() > 3 || !parts.iter().all(|p| p.parse::<u64>().is_ok()) {
    return None;
  }
  Some(parts.len())
}

fn split_two(version: &str) -> Option<(u64, u64)> {
  let mut parts = version.split('.');
  let major = parts.next()?.parse().ok()?;
  let minor = parts.next()?.parse().ok()?;
  Some((major, minor))
}

/// Fill a partial version's missing components with zeros
fn fill_partial(version: &str) -> Option<String> {
  match numeric_components(version) {
    Some(1) => Some(format!("{}.0.0", version)),
    Some(2) => Some(format!("{}.0", version)),
    _ => Some(version.to_string()),
  }
}
