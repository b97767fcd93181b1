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

//! Case-insensitive name completion.
//!
//! [`Tree::find_case_insensitive`] walks the tree comparing a
//! lowercase shadow of the query against lowercase shadows of the
//! stored edges, while emitting the stored-case bytes into the output
//! buffer. Multi-byte UTF-8 is handled with a 4-byte rolling rune
//! buffer: at an index decision the current rune is tried in both its
//! lowercase and uppercase encodings, recursively, since both spellings
//! may exist as index bytes. Parameter edges copy the query bytes
//! through unchanged; catch-alls copy the full remainder.

use super::{NodeId, NodeType, Tree, WildChild};

/// Whether `byte` can begin a UTF-8 encoded code point.
fn rune_start(byte: u8) -> bool {
    byte & 0xc0 != 0x80
}

/// Decodes the code point starting at `bytes`, or the replacement
/// character if the bytes are not valid UTF-8.
fn decode_rune(bytes: &[u8]) -> char {
    let take = bytes.len().min(4);
    for len in 1..=take {
        if let Ok(s) = std::str::from_utf8(&bytes[..len]) {
            if let Some(c) = s.chars().next() {
                return c;
            }
        }
    }
    char::REPLACEMENT_CHARACTER
}

/// Encodes `c` into a zero-padded 4-byte buffer.
fn encode_rune(c: char) -> [u8; 4] {
    let mut buf = [0u8; 4];
    c.encode_utf8(&mut buf);
    buf
}

/// Shifts the rolling rune buffer left by `n` bytes.
fn shift_rune_bytes(rb: [u8; 4], n: usize) -> [u8; 4] {
    match n {
        0 => rb,
        1 => [rb[1], rb[2], rb[3], 0],
        2 => [rb[2], rb[3], 0, 0],
        3 => [rb[3], 0, 0, 0],
        _ => [0; 4],
    }
}

/// The uppercase form of `c` when it is a single code point; complex
/// case mappings have no single uppercase spelling to index on.
fn single_uppercase(c: char) -> Option<char> {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => Some(u),
        _ => None,
    }
}

/// Lowercases a byte string rune-wise, passing invalid bytes through
/// untouched.
fn lower_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let take = (bytes.len() - i).min(4);
        let mut decoded = None;
        for len in 1..=take {
            if let Ok(s) = std::str::from_utf8(&bytes[i..i + len]) {
                decoded = s.chars().next().map(|c| (c, len));
                break;
            }
        }
        match decoded {
            Some((c, len)) => {
                for lc in c.to_lowercase() {
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(lc.encode_utf8(&mut buf).as_bytes());
                }
                i += len;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    out
}

impl<H> Tree<H> {
    /// Makes a case-insensitive lookup of `name` (in indexable form)
    /// and reconstructs the stored-case spelling of the matching
    /// route. The flag reports whether a registered route was found.
    pub fn find_case_insensitive(&self, name: &[u8]) -> (Vec<u8>, bool) {
        self.case_walk(
            super::ROOT,
            name,
            &lower_bytes(name),
            Vec::with_capacity(name.len() + 1),
            [0u8; 4],
        )
    }

    fn case_walk(
        &self,
        start: NodeId,
        name: &[u8],
        lo_name: &[u8],
        ci_name: Vec<u8>,
        rb: [u8; 4],
    ) -> (Vec<u8>, bool) {
        let mut n = start;
        let mut name = name;
        let mut lo_name = lo_name;
        let mut ci_name = ci_name;
        let mut rb = rb;
        let mut lo_n_name = lower_bytes(&self.node(n).name);

        'walk: while lo_name.len() >= lo_n_name.len()
            && (lo_n_name.is_empty() || lo_name[1..lo_n_name.len()] == lo_n_name[1..])
        {
            let node = self.node(n);
            ci_name.extend_from_slice(&node.name);

            if name.len() <= node.name.len() {
                // Unicode case folding can shift byte lengths; a query
                // that runs out here cannot complete.
                if name.len() < node.name.len() {
                    return (ci_name, false);
                }
                return (ci_name, node.data.is_some());
            }
            name = &name[node.name.len()..];
            let lo_old = lo_name;
            lo_name = &lo_name[lo_n_name.len()..];

            if node.wild_child != WildChild::Named {
                // Static children decide; the anonymous wildcard, if
                // any, is only a fallback.
                rb = shift_rune_bytes(rb, lo_n_name.len());
                let w = node.wild_offset();

                if rb[0] != 0 {
                    // The previous rune is not finished yet.
                    if let Some(i) = node.indices.iter().position(|&b| b == rb[0]) {
                        n = node.children[i + w];
                        lo_n_name = lower_bytes(&self.node(n).name);
                        continue 'walk;
                    }
                } else {
                    // Process a new rune. Runes are up to 4 bytes, so
                    // its start lies within the last 3 bytes of the
                    // consumed edge (or exactly at the boundary).
                    let mut rv = '\0';
                    let mut off = 0;
                    let max = lo_n_name.len().min(3);
                    for o in 0..max {
                        let i = lo_n_name.len() - o;
                        if i < lo_old.len() && rune_start(lo_old[i]) {
                            rv = decode_rune(&lo_old[i..]);
                            off = o;
                            break;
                        }
                    }

                    // Try the lowercase spelling first; both spellings
                    // may exist as an index, so recurse.
                    rb = encode_rune(rv);
                    rb = shift_rune_bytes(rb, off);
                    if let Some(i) = node.indices.iter().position(|&b| b == rb[0]) {
                        let (out, found) =
                            self.case_walk(node.children[i + w], name, lo_name, ci_name.clone(), rb);
                        if found {
                            return (out, true);
                        }
                    }

                    // Then the uppercase spelling, if it differs.
                    if let Some(up) = single_uppercase(rv) {
                        if up != rv {
                            let rb_up = shift_rune_bytes(encode_rune(up), off);
                            if let Some(i) = node.indices.iter().position(|&b| b == rb_up[0]) {
                                n = node.children[i + w];
                                lo_n_name = lower_bytes(&self.node(n).name);
                                rb = rb_up;
                                continue 'walk;
                            }
                        }
                    }
                }

                // No static continuation; the anonymous wildcard takes
                // the rest.
                if node.wild_child == WildChild::Anonymous {
                    ci_name.extend_from_slice(name);
                    return (ci_name, true);
                }
                return (ci_name, false);
            }

            let child = node.children[0];
            let cnode = self.node(child);
            match cnode.n_type {
                NodeType::Param => {
                    // Copy the parameter label through unchanged.
                    let k = name
                        .iter()
                        .position(|&b| b == b'.')
                        .unwrap_or(name.len());
                    ci_name.extend_from_slice(&name[..k]);

                    if k < name.len() {
                        if !cnode.children.is_empty() {
                            n = cnode.children[0];
                            lo_n_name = lower_bytes(&self.node(n).name);
                            lo_name = &lo_name[k.min(lo_name.len())..];
                            name = &name[k..];
                            continue 'walk;
                        }
                        return (ci_name, false);
                    }
                    return (ci_name, cnode.data.is_some());
                }
                NodeType::CatchAll | NodeType::AnonymousCatchAll => {
                    ci_name.extend_from_slice(name);
                    return (ci_name, true);
                }
                _ => return (ci_name, false),
            }
        }

        (ci_name, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TypeEntry;
    use crate::Type;

    const ROUTES: &[&str] = &[
        ".hi",
        ".b.",
        ".ABC.",
        ".search.:query",
        ".cmd.:tool.",
        ".src.*filename",
        ".x",
        ".x.y",
        ".y.",
        ".y.z",
        ".0.:id",
        ".0.:id.1",
        ".1.:id.",
        ".1.:id.2",
        ".aa",
        ".a.",
        ".doc",
        ".doc.go_faq.html",
        ".doc.go1.html",
        ".doc.go.away",
        ".no.a",
        ".no.b",
        ".Π",
        ".u.apfêl.",
        ".u.äpfêl.",
        ".u.öpfêl",
        ".v.Äpfêl.",
        ".v.Öpfêl",
        ".w.♬",  // 3-byte rune
        ".w.♭.", // 3-byte rune, last byte differs
        ".w.𠜎",  // 4-byte rune
        ".w.𠜏.", // 4-byte rune
    ];

    fn build() -> Tree<&'static str> {
        let mut tree = Tree::new();
        for &route in ROUTES {
            tree.add_route(route.as_bytes(), false, TypeEntry::new(Type::A, route))
                .unwrap_or_else(|e| panic!("inserting {:?}: {}", route, e));
        }
        tree
    }

    #[test]
    fn finds_every_route_by_its_own_spelling() {
        let tree = build();
        for &route in ROUTES {
            let (out, found) = tree.find_case_insensitive(route.as_bytes());
            assert!(found, "route {:?} not found", route);
            assert_eq!(out, route.as_bytes(), "wrong result for route {:?}", route);
        }
    }

    #[test]
    fn corrects_the_case_of_ascii_and_unicode_queries() {
        let tree = build();

        // (query, stored-case result); each must be found.
        let found: &[(&str, &str)] = &[
            (".HI", ".hi"),
            (".B.", ".b."),
            (".abc.", ".ABC."),
            (".aBc.", ".ABC."),
            (".abC.", ".ABC."),
            (".SEARCH.QUERY", ".search.QUERY"),
            (".CMD.TOOL.", ".cmd.TOOL."),
            (".SRC.FILE.NAME", ".src.FILE.NAME"),
            (".x.Y", ".x.y"),
            (".X.y", ".x.y"),
            (".X.Y", ".x.y"),
            (".Y.", ".y."),
            (".Y.z", ".y.z"),
            (".Y.Z", ".y.z"),
            (".y.Z", ".y.z"),
            (".Aa", ".aa"),
            (".AA", ".aa"),
            (".aA", ".aa"),
            (".A.", ".a."),
            (".DOC", ".doc"),
            (".π", ".Π"),
            (".u.ÄPFÊL.", ".u.äpfêl."),
            (".u.ÖPFÊL", ".u.öpfêl"),
            (".v.äpfêL.", ".v.Äpfêl."),
            (".v.öpfêL", ".v.Öpfêl"),
        ];
        for &(query, want) in found {
            let (out, ok) = tree.find_case_insensitive(query.as_bytes());
            assert!(ok, "query {:?} not found", query);
            assert_eq!(
                out,
                want.as_bytes(),
                "wrong result for query {:?}: {:?}",
                query,
                String::from_utf8_lossy(&out),
            );
        }

        // Near misses: a missing or extra trailing root label is not
        // completed, and unregistered names stay unfound.
        let not_found: &[&str] = &[
            ".HI.", ".B", ".abc", ".aBc", ".CMD.TOOL", ".x.Y.", ".Y", ".A", ".DOC.", ".NO",
            ".DOC.GO", ".u.ÄPFÊL", ".u.ÖPFÊL.", ".v.äpfêL", ".v.öpfêL.", ".w.♬.", ".w.♭",
            ".w.𠜎.", ".w.𠜏",
        ];
        for &query in not_found {
            let (_, ok) = tree.find_case_insensitive(query.as_bytes());
            assert!(!ok, "query {:?} unexpectedly found", query);
        }
    }

    #[test]
    fn rolling_rune_buffer_shifts() {
        let rb = [0xe2, 0x99, 0xac, 0];
        assert_eq!(shift_rune_bytes(rb, 0), rb);
        assert_eq!(shift_rune_bytes(rb, 1), [0x99, 0xac, 0, 0]);
        assert_eq!(shift_rune_bytes(rb, 2), [0xac, 0, 0, 0]);
        assert_eq!(shift_rune_bytes(rb, 3), [0, 0, 0, 0]);
        assert_eq!(shift_rune_bytes(rb, 4), [0, 0, 0, 0]);
    }

    #[test]
    fn lowercases_rune_wise_and_preserves_invalid_bytes() {
        assert_eq!(lower_bytes(b".ABC.xyz"), b".abc.xyz");
        assert_eq!(lower_bytes(".Äpfêl".as_bytes()), ".äpfêl".as_bytes());
        assert_eq!(lower_bytes(b"\x80\x01A"), b"\x80\x01a");
    }
}
