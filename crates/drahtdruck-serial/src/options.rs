// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transmission-option decoding.
//
// The raw option string from the device URI is a `+`-separated sequence of
// `name=value` pairs (`baud=19200+bits=8+flow=dtrdsr`).  Decoding is a
// single permissive pass that never fails: malformed input degrades to
// partial pairs.  Order is preserved because later pairs override earlier
// ones when they are folded into a `LineConfig`.

/// Longest accepted name or value token; anything beyond is truncated.
const MAX_TOKEN: usize = 255;

/// One decoded `name=value` option. A pair without `=` has an empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionPair {
    /// Option name, normalised to lower case (names match case-insensitively).
    pub name: String,
    /// Literal value, no unescaping applied.
    pub value: String,
}

/// Decode a raw option string into an ordered pair sequence.
///
/// Empty segments — including the one produced by an unterminated trailing
/// `+` — are dropped.
pub fn parse_pairs(raw: &str) -> Vec<OptionPair> {
    raw.split('+')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (name, value) = match segment.split_once('=') {
                Some((n, v)) => (n, v),
                None => (segment, ""),
            };
            OptionPair {
                name: clip(name).to_ascii_lowercase(),
                value: clip(value).to_string(),
            }
        })
        .collect()
}

fn clip(token: &str) -> &str {
    match token.char_indices().nth(MAX_TOKEN) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}
