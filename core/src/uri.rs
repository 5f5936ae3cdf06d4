/*
 * uri.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Staffetta, an HTTP client library for build and
 * integration tooling.
 *
 * Staffetta is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Staffetta is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Staffetta.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Query codec: form-style percent encoding of parameter values (space
//! becomes `+`), the inverse decode, and a fixup pass that repairs a whole
//! raw URL while keeping its delimiter characters literal. Also the ordered
//! parameter map backing both query mirrors of a request.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Form encoding set: everything except `A-Z a-z 0-9 * - . _` is escaped.
/// Space is escaped here and rewritten to `+` afterwards.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

/// Percent-encode a parameter value, form style (space as `+`).
/// `None` in, `None` out.
pub fn encode(value: Option<&str>) -> Option<String> {
    value.map(|v| utf8_percent_encode(v, FORM).to_string().replace("%20", "+"))
}

/// Decode a form-encoded parameter value: `+` back to space, `%XX`
/// triplets decoded as UTF-8 (lossy). `None` in, `None` out.
pub fn decode(value: Option<&str>) -> Option<String> {
    value.map(|v| {
        let spaced = v.replace('+', " ");
        percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
    })
}

/// Fixup encoding set: the form set minus `+`. A rendered URL carries `+`
/// for spaces, and re-parsing that rendering must not re-encode them, so
/// fixup keeps `+` literal and is a fixed point over its own output.
const FIXUP: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'+');

/// Delimiters restored after whole-URL encoding, with `%` last so restoring
/// it cannot fabricate a new delimiter triplet from neighbouring bytes.
const RESTORED: [(&str, &str); 8] = [
    ("%26", "&"),
    ("%2F", "/"),
    ("%3A", ":"),
    ("%3B", ";"),
    ("%3D", "="),
    ("%3F", "?"),
    ("%40", "@"),
    ("%25", "%"),
];

/// Best-effort repair of a loosely formed URL: percent-encode the entire
/// string (spaces to `+`, `+` itself left literal), then restore the
/// reserved delimiters `& / : ; = ? @ %` to literal form. Input is taken
/// as raw, unencoded text; a URL that arrives already percent-encoded is
/// not recognised as such. This is a repair pass, not a general normalizer.
pub fn fixup(raw: &str) -> String {
    let mut fixed = utf8_percent_encode(raw, FIXUP).to_string().replace("%20", "+");
    for (triplet, literal) in RESTORED {
        fixed = fixed.replace(triplet, literal);
    }
    fixed
}

/// Ordered name -> optional value mapping for query parameters.
///
/// Upserts keep the first-seen position of a name, so parameters parsed
/// from a URL render back in source order and parameters added later append
/// in call order. A `None` value means "name present, no value", which is
/// distinct from the name being absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: Vec<(String, Option<String>)>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An existing name keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Value for a name: `None` if absent, `Some(None)` if present with no
    /// value, `Some(Some(v))` otherwise.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let v = "a value with spaces & symbols = ?";
        let enc = encode(Some(v)).unwrap();
        assert!(!enc.contains(' '));
        assert_eq!(decode(Some(&enc)).unwrap(), v);
    }

    #[test]
    fn encode_space_is_plus() {
        assert_eq!(encode(Some("value with spaces")).unwrap(), "value+with+spaces");
    }

    #[test]
    fn none_passes_through() {
        assert_eq!(encode(None), None);
        assert_eq!(decode(None), None);
    }

    #[test]
    fn unreserved_unchanged() {
        assert_eq!(encode(Some("Az09*-._")).unwrap(), "Az09*-._");
    }

    #[test]
    fn fixup_keeps_delimiters_encodes_spaces() {
        let fixed = fixup("http://host/context/longer/?qp=value with spaces");
        assert_eq!(fixed, "http://host/context/longer/?qp=value+with+spaces");
    }

    #[test]
    fn fixup_literal_percent_roundtrips() {
        assert_eq!(fixup("a % b"), "a+%+b");
    }

    #[test]
    fn fixup_encodes_brackets() {
        assert_eq!(fixup("http://host/a[1]"), "http://host/a%5B1%5D");
    }

    #[test]
    fn fixup_is_stable_over_its_own_output() {
        for raw in [
            "http://host/context/longer/?qp=value with spaces",
            "http://host/a[1]?x=1&y",
            "a % b",
        ] {
            let once = fixup(raw);
            assert_eq!(fixup(&once), once, "not a fixed point for {}", raw);
        }
        // a rendered query already carries '+' for spaces; re-repair keeps it
        assert_eq!(
            fixup("http://host/?qp=value+with+spaces"),
            "http://host/?qp=value+with+spaces"
        );
    }

    #[test]
    fn param_map_preserves_first_seen_order() {
        let mut m = ParamMap::new();
        m.insert("a", Some("1".into()));
        m.insert("b", None);
        m.insert("a", Some("2".into()));
        let entries: Vec<_> = m.iter().collect();
        assert_eq!(entries, vec![("a", Some("2")), ("b", None)]);
    }

    #[test]
    fn param_map_tri_state_lookup() {
        let mut m = ParamMap::new();
        m.insert("present", Some("v".into()));
        m.insert("bare", None);
        assert_eq!(m.get("present"), Some(Some("v")));
        assert_eq!(m.get("bare"), Some(None));
        assert_eq!(m.get("absent"), None);
    }
}
