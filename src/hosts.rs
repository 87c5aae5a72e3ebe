//! Host specification expansion
//!
//! Turns the free-form host list typed on the install-options step into a
//! concrete, deduplicated host set.
//!
//! # Grammar
//!
//! ```text
//! spec   := token (WS token)*
//! token  := text (range text)*
//! range  := '[' DIGITS '-' DIGITS ']'
//! ```
//!
//! Ranges are unrolled one at a time, left to right, recursively, so a token
//! with two ranges yields their cartesian product. Every generated number is
//! zero-padded to the width of the range's left bound (`host[07-09]` gives
//! `host07 host08 host09`).
//!
//! A range that cannot be unrolled (`start > end`, a bound that does not fit
//! in `u64`, or a span over [`MAX_RANGE_SPAN`]) leaves the whole token
//! untouched. So does a token whose ranges together would produce more than
//! [`MAX_TOKEN_HOSTS`] hosts. Expansion never fails and keeps no state, so
//! it is safe to call on every keystroke for a live preview.

use std::collections::HashSet;

/// Largest number of values a single bracket range may produce.
///
/// Wider ranges are treated as malformed and passed through literally.
pub const MAX_RANGE_SPAN: u64 = 10_000;

/// Largest number of hosts a single token may expand to.
///
/// Bounds the product of several ranges in one token; larger tokens are
/// passed through literally.
pub const MAX_TOKEN_HOSTS: usize = 10_000;

/// Maximum length of a fully qualified host name
const MAX_HOST_NAME_LEN: usize = 255;

/// Maximum length of a single dot-separated label
const MAX_LABEL_LEN: usize = 63;

/// Result of expanding a host specification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostExpansion {
    /// Concrete host names, deduplicated, in order of first occurrence
    pub hosts: Vec<String>,
    /// Whether at least one bracket range was unrolled
    pub is_pattern: bool,
}

/// Expand a whitespace separated host specification.
///
/// # Example
///
/// ```
/// use mpack_wizard::hosts::expand;
///
/// let result = expand("node[01-03].a node5");
/// assert_eq!(result.hosts, vec!["node01.a", "node02.a", "node03.a", "node5"]);
/// assert!(result.is_pattern);
/// ```
pub fn expand(spec: &str) -> HostExpansion {
    let mut hosts = Vec::new();
    let mut seen = HashSet::new();
    let mut is_pattern = false;

    for token in spec.split_whitespace() {
        let mut expanded = Vec::new();
        match expand_token(token, &mut expanded) {
            Some(unrolled) => is_pattern |= unrolled,
            None => {
                tracing::debug!("Host token {} expands to too many hosts", token);
                expanded = vec![token.to_string()];
            }
        }
        for host in expanded {
            if seen.insert(host.clone()) {
                hosts.push(host);
            }
        }
    }

    HostExpansion { hosts, is_pattern }
}

/// A `[start-end]` expression located inside a token.
#[derive(Debug, Clone, Copy)]
struct BracketRange {
    /// Byte offset of `[`
    open: usize,
    /// Byte offset of `]`
    close: usize,
    /// Parsed bounds; `None` when a bound overflows
    bounds: Option<(u64, u64)>,
    /// Digit count of the left bound, leading zeros included
    width: usize,
}

impl BracketRange {
    fn unrollable(&self) -> Option<(u64, u64)> {
        let (start, end) = self.bounds?;
        (start <= end && end - start < MAX_RANGE_SPAN).then_some((start, end))
    }
}

/// Expand the first range of `token` and recurse into the results.
///
/// Returns true when a range was unrolled, or `None` once `out` would grow
/// past [`MAX_TOKEN_HOSTS`].
fn expand_token(token: &str, out: &mut Vec<String>) -> Option<bool> {
    let next = find_range(token).and_then(|range| range.unrollable().map(|bounds| (range, bounds)));
    let Some((range, (start, end))) = next else {
        if out.len() >= MAX_TOKEN_HOSTS {
            return None;
        }
        out.push(token.to_string());
        return Some(false);
    };

    // Every value yields at least one host.
    let count = usize::try_from(end - start + 1).ok()?;
    if out.len().saturating_add(count) > MAX_TOKEN_HOSTS {
        return None;
    }

    let prefix = &token[..range.open];
    let suffix = &token[range.close + 1..];
    for n in start..=end {
        let host = format!("{prefix}{n:0width$}{suffix}", width = range.width);
        expand_token(&host, out)?;
    }
    Some(true)
}

/// Locate the leftmost `[DIGITS-DIGITS]` expression.
///
/// Brackets holding anything else (`[a-b]`, `[-3]`) are not range
/// expressions and are skipped over, staying in the output as text.
fn find_range(token: &str) -> Option<BracketRange> {
    let bytes = token.as_bytes();
    for (open, _) in token.match_indices('[') {
        let left_len = count_digits(&bytes[open + 1..]);
        if left_len == 0 {
            continue;
        }
        let dash = open + 1 + left_len;
        if bytes.get(dash) != Some(&b'-') {
            continue;
        }
        let right_len = count_digits(&bytes[dash + 1..]);
        if right_len == 0 {
            continue;
        }
        let close = dash + 1 + right_len;
        if bytes.get(close) != Some(&b']') {
            continue;
        }

        let left = &token[open + 1..dash];
        let right = &token[dash + 1..close];
        let bounds = left.parse::<u64>().ok().zip(right.parse::<u64>().ok());
        return Some(BracketRange {
            open,
            close,
            bounds,
            width: left_len,
        });
    }
    None
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Check that `name` looks like a fully qualified host name.
///
/// Requires at least two dot-separated labels of `[A-Za-z0-9-]`, none
/// starting or ending with `-`, and rejects bare IPv4 addresses.
pub fn validate_host_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_HOST_NAME_LEN {
        return false;
    }
    if name.parse::<std::net::Ipv4Addr>().is_ok() {
        return false;
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= MAX_LABEL_LEN
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Outcome of evaluating the host field of the install-options step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostInputReport {
    /// Hosts that are not yet part of the cluster
    pub hosts: Vec<String>,
    /// Hosts the user typed again although they are already registered
    pub inputted_again: Vec<String>,
    /// Names failing [`validate_host_name`]
    pub invalid: Vec<String>,
    /// Whether the input used bracket ranges
    pub is_pattern: bool,
}

impl HostInputReport {
    /// True when every typed name is a valid host name
    pub fn all_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

/// Expand `spec` and split the result against the hosts already registered.
pub fn evaluate_host_input(spec: &str, registered: &[String]) -> HostInputReport {
    let expansion = expand(spec);
    let registered: HashSet<&str> = registered.iter().map(String::as_str).collect();

    let mut report = HostInputReport {
        is_pattern: expansion.is_pattern,
        ..Default::default()
    };
    for host in expansion.hosts {
        if !validate_host_name(&host) {
            report.invalid.push(host.clone());
        }
        if registered.contains(host.as_str()) {
            report.inputted_again.push(host);
        } else {
            report.hosts.push(host);
        }
    }

    tracing::debug!(
        "Host input expanded to {} new host(s), {} already registered, {} invalid",
        report.hosts.len(),
        report.inputted_again.len(),
        report.invalid.len()
    );
    report
}
