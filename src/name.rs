// Copyright 2025 the junction developers.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Indexable (canonical) domain names.
//!
//! The radix tree stores domain names *label-reversed*: the byte order
//! of every label is reversed, and then the whole buffer is reversed.
//! The net effect is that the label order flips while each label keeps
//! its byte order, and the trailing root dot of a fully-qualified name
//! becomes a leading `.`:
//!
//! ```text
//! www.example.org.  ->  .org.example.www
//! ```
//!
//! The leading dot doubles as the sentinel marking a name as already
//! canonical, so [`to_indexable`] can auto-detect its input form.
//! ASCII letters are folded to lowercase at canonicalisation time
//! ([RFC 4343]); all other bytes are preserved, which is why names are
//! byte strings rather than `str`: labels such as `\x01` and the
//! internal anonymous-wildcard sentinel `0x80` are not UTF-8.
//!
//! Reversing byte-wise inside labels keeps label boundaries aligned on
//! `.` in both orientations, so the radix descent can stop at label
//! boundaries, and [`indexable`] is an involution (modulo case): the
//! same routine converts captured multi-label values back to their
//! user-facing orientation.
//!
//! [RFC 4343]: https://datatracker.ietf.org/doc/html/rfc4343

/// The maximum number of labels in a domain name.
///
/// A name is at most 255 octets on the wire and every label costs at
/// least two, so 128 is an upper bound. Milestone stacks recorded
/// during a tree descent are sized against this.
pub const MAX_N_LABELS: usize = 128;

/// Returns whether `name` is already in indexable form, i.e. whether
/// its first byte is the canonical leading dot.
pub fn is_indexable(name: &[u8]) -> bool {
    name.first() == Some(&b'.')
}

/// Converts a fully-qualified domain name to its indexable form:
/// ASCII letters are folded to lowercase, and the labels are reversed.
/// Names of at most one byte are returned unchanged.
///
/// This performs the conversion unconditionally; use [`to_indexable`]
/// to auto-detect input that is already canonical. Applied to an
/// indexable name, this undoes the label reversal (modulo the case
/// fold), which is how captured multi-label parameter values are
/// restored to their user-facing orientation.
pub fn indexable(name: &[u8]) -> Vec<u8> {
    if name.len() <= 1 {
        return name.to_vec();
    }

    let mut buf: Vec<u8> = name
        .iter()
        .map(|&c| if c.is_ascii_uppercase() { c + 32 } else { c })
        .collect();
    reverse_labels(&mut buf);
    buf
}

/// Canonicalises `name`, auto-detecting its form: an indexable name is
/// returned unchanged; anything else is treated as a presentation-form
/// name, fully qualified if necessary, and converted with
/// [`indexable`].
pub fn to_indexable(name: &[u8]) -> Vec<u8> {
    if is_indexable(name) {
        name.to_vec()
    } else if name.last() == Some(&b'.') {
        indexable(name)
    } else {
        let mut fqdn = Vec::with_capacity(name.len() + 1);
        fqdn.extend_from_slice(name);
        fqdn.push(b'.');
        indexable(&fqdn)
    }
}

/// Like [`to_indexable`], but preserves the byte case. Used for
/// case-insensitive completion, where the stored-case spelling is
/// recovered by comparing case-insensitively against the query's own
/// case.
pub fn reversed(name: &[u8]) -> Vec<u8> {
    if is_indexable(name) {
        return name.to_vec();
    }
    let mut buf = name.to_vec();
    if buf.last() != Some(&b'.') {
        buf.push(b'.');
    }
    if buf.len() > 1 {
        reverse_labels(&mut buf);
    }
    buf
}

/// Reverses the labels of `buf` in place while preserving the byte
/// order within each label: every maximal run of non-dot bytes is
/// reversed, and then the whole buffer is reversed.
pub(crate) fn reverse_labels(buf: &mut [u8]) {
    let mut begin = None;
    for i in 0..buf.len() {
        if begin.is_none() && buf[i] != b'.' {
            begin = Some(i);
        }
        if let Some(b) = begin {
            if i + 1 == buf.len() || buf[i + 1] == b'.' {
                buf[b..=i].reverse();
                begin = None;
            }
        }
    }
    buf.reverse();
}

/// Counts the labels of `name`: the number of non-empty dot-separated
/// segments. Leading and trailing dots do not add labels, so both
/// orientations of a name count the same.
pub fn count_labels(name: &[u8]) -> usize {
    name.split(|&c| c == b'.').filter(|s| !s.is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexable_reverses_labels() {
        assert_eq!(indexable(b"www.example.org."), b".org.example.www");
        assert_eq!(indexable(b"example.org."), b".org.example");
        assert_eq!(indexable(b"org."), b".org");
        assert_eq!(indexable(b"."), b".");
        assert_eq!(indexable(b""), b"");
    }

    #[test]
    fn indexable_folds_ascii_case() {
        assert_eq!(indexable(b"WWW.Example.ORG."), b".org.example.www");
        // Non-ASCII bytes are preserved untouched.
        assert_eq!(indexable(b"\x01.z.Example."), b".example.z.\x01");
    }

    #[test]
    fn indexable_is_an_involution_on_lowercase_names() {
        let canonical = indexable(b"a.bb.ccc.dddd.");
        assert_eq!(indexable(&canonical), b"a.bb.ccc.dddd.");
    }

    #[test]
    fn to_indexable_detects_canonical_input() {
        let canonical = to_indexable(b"www.example.org.");
        assert_eq!(to_indexable(&canonical), canonical);
    }

    #[test]
    fn to_indexable_qualifies_bare_names() {
        assert_eq!(to_indexable(b"www.example.org"), b".org.example.www");
        assert_eq!(to_indexable(b"org"), b".org");
    }

    #[test]
    fn multi_label_values_restore_their_orientation() {
        // A catch-all capture arrives in canonical orientation; running
        // it through indexable() again flips it back for the caller.
        assert_eq!(indexable(b".how.are.you"), b"you.are.how.");
        assert_eq!(indexable(b"how.are.you"), b"you.are.how");
    }

    #[test]
    fn count_labels_ignores_empty_segments() {
        assert_eq!(count_labels(b""), 0);
        assert_eq!(count_labels(b"."), 0);
        assert_eq!(count_labels(b"test"), 1);
        assert_eq!(count_labels(b".oops"), 1);
        assert_eq!(count_labels(b"how.are.you"), 3);
        assert_eq!(count_labels(b".org.example.www"), 3);
    }

    #[test]
    fn is_indexable_checks_the_sentinel() {
        assert!(is_indexable(b".org.example"));
        assert!(!is_indexable(b"example.org."));
        assert!(!is_indexable(b""));
    }
}
