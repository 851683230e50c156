//! Range expressions: `"1-5, 10, 15-20"` for question ranges and skip lists,
//! `"1-5:1, 6-10:41"` for numbering overrides, `"1/8"` for strip ratios.

use crate::error::ParseError;
use std::collections::{BTreeMap, BTreeSet};

/// Widest `a-b` span a single token may cover. Batches are far smaller.
pub const MAX_SPAN: u32 = 10_000;

/// Parses a comma-separated list of integers and inclusive `a-b` ranges.
///
/// Empty input yields an empty set. Any malformed token, or a span covering
/// more than [`MAX_SPAN`] values, fails the whole call.
pub fn parse_range(text: &str) -> Result<BTreeSet<u32>, ParseError> {
    let mut out = BTreeSet::new();
    for token in tokens(text) {
        let (start, end) = parse_span(text, token)?;
        out.extend(start..=end);
    }
    Ok(out)
}

/// Skip lists share the range grammar, including its hard failure on bad tokens.
pub fn parse_skip(text: &str) -> Result<BTreeSet<u32>, ParseError> {
    parse_range(text)
}

/// Parses `range:start` pairs into a position → display number map.
///
/// `a-b:n` maps position `a+k` to `n+k`. Later entries overwrite earlier ones.
/// Tokens without a `:`, tokens with malformed numbers, over-wide spans and
/// spans whose numbers would pass `u32::MAX` are dropped.
pub fn parse_numbering_overrides(text: &str) -> BTreeMap<u32, u32> {
    let mut out = BTreeMap::new();
    for token in tokens(text) {
        let Some((span, start)) = token.split_once(':') else {
            continue;
        };
        let Ok(start) = parse_positive(text, start) else {
            continue;
        };
        let Ok((first, last)) = parse_span(text, span.trim()) else {
            continue;
        };
        if start.checked_add(last - first).is_none() {
            continue;
        }
        for (k, position) in (first..=last).enumerate() {
            out.insert(position, start + k as u32);
        }
    }
    out
}

/// Parses a strip ratio written as `1/N` or as a decimal in `[0, 1]`.
pub fn parse_ratio(text: &str) -> Result<f64, ParseError> {
    let t = text.trim();
    let value = match t.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidRatio(t.to_string()))?;
            let den: f64 = den
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidRatio(t.to_string()))?;
            if den == 0.0 {
                return Err(ParseError::InvalidRatio(t.to_string()));
            }
            num / den
        }
        None => t
            .parse()
            .map_err(|_| ParseError::InvalidRatio(t.to_string()))?,
    };
    if !(0.0..=1.0).contains(&value) {
        return Err(ParseError::InvalidRatio(t.to_string()));
    }
    Ok(value)
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|t| !t.is_empty())
}

fn parse_span(expr: &str, token: &str) -> Result<(u32, u32), ParseError> {
    match token.split_once('-') {
        Some((a, b)) => {
            let start = parse_positive(expr, a)?;
            let end = parse_positive(expr, b)?;
            if start > end {
                return Err(ParseError::DescendingRange {
                    expr: expr.to_string(),
                    token: token.to_string(),
                });
            }
            if end - start >= MAX_SPAN {
                return Err(ParseError::SpanTooWide {
                    expr: expr.to_string(),
                    token: token.to_string(),
                    max: MAX_SPAN,
                });
            }
            Ok((start, end))
        }
        None => {
            let n = parse_positive(expr, token)?;
            Ok((n, n))
        }
    }
}

fn parse_positive(expr: &str, raw: &str) -> Result<u32, ParseError> {
    let raw = raw.trim();
    let n: u32 = raw.parse().map_err(|_| ParseError::InvalidNumber {
        expr: expr.to_string(),
        token: raw.to_string(),
    })?;
    if n == 0 {
        return Err(ParseError::NotPositive {
            expr: expr.to_string(),
            token: raw.to_string(),
        });
    }
    Ok(n)
}
