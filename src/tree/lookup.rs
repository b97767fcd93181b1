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

//! Lookup: a single descent of the tree.
//!
//! [`Tree::get_value`] walks the tree along the canonical query name
//! and produces a [`Value`]: the matched node (if any), the captured
//! parameters, the zone milestones crossed on the way down
//! (ancestor-first), the `cut` flag marking an empty non-terminal or a
//! DNAME cut, and the nearest-node state that feeds the predecessor
//! walk used for NSEC synthesis.
//!
//! Named branches win over the anonymous RFC 4592 wildcard: when a
//! static descent fails below a node holding an anonymous child, the
//! walk restarts once from that node with the wildcard taken instead.
//!
//! Lookup never mutates the tree and never fails; the only
//! allocations are the lazily-created parameter vector and nothing
//! else (milestones live in a fixed-capacity stack buffer).

use std::ops::Range;

use arrayvec::ArrayVec;

use crate::name::MAX_N_LABELS;
use crate::rr::RrFlags;

use super::{NodeId, NodeType, Tree, WildChild, ANONYMOUS_LABEL, ROOT};

/// A snapshot taken during the descent: a node, the number of
/// parameters captured so far, and where the unconsumed remainder of
/// the query begins.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Milestone {
    pub node: Option<NodeId>,
    pub params_len: usize,
    pub rem_start: usize,
}

/// A captured parameter in raw form: the key borrows the ident stored
/// on the tree node (empty for the anonymous wildcard), the value is a
/// byte range into the canonical query name.
#[derive(Clone, Debug)]
pub(crate) struct RawParam<'t> {
    pub key: &'t [u8],
    pub value: Range<usize>,
}

/// The saved restart point for the anonymous-wildcard fallback.
#[derive(Clone, Copy)]
struct Fallback {
    node: NodeId,
    rem_start: usize,
    params_len: usize,
    zones_len: usize,
}

/// The outcome of one tree descent.
pub struct Value<'t, H> {
    tree: &'t Tree<H>,
    pub(crate) node: Option<NodeId>,
    pub(crate) params: Vec<RawParam<'t>>,
    pub(crate) zones: ArrayVec<Milestone, MAX_N_LABELS>,
    pub(crate) nearest: Milestone,
    pub(crate) cut: bool,
}

impl<'t, H> Value<'t, H> {
    /// Whether a registered node was matched.
    pub fn is_match(&self) -> bool {
        self.node.is_some()
    }

    /// Whether the lookup stopped at a label boundary inside the tree:
    /// the name is an empty non-terminal (or a DNAME replaced the
    /// subtree), as opposed to a plain NXDOMAIN.
    pub fn is_cut(&self) -> bool {
        self.cut
    }

    /// The captured parameters, resolved against the queried canonical
    /// name, innermost label first (the descent order; see
    /// [`Resolution`](crate::Resolution) for the reverted view).
    pub fn params<'q>(&self, name: &'q [u8]) -> Vec<(&'t [u8], &'q [u8])> {
        self.params
            .iter()
            .map(|p| (p.key, &name[p.value.clone()]))
            .collect()
    }

    /// The node that immediately precedes the queried name in the
    /// tree's canonical walk, used for NSEC synthesis. `name` must be
    /// the canonical name this value was produced for.
    pub fn previous(&self, name: &[u8]) -> Option<NodeId> {
        let zone = self.zones.last().and_then(|m| m.node);
        self.tree
            .previous_node(name, self.node, self.nearest, zone)
    }

    pub(crate) fn tree(&self) -> &'t Tree<H> {
        self.tree
    }
}

impl<H> Tree<H> {
    /// Looks up `name` (in canonical, indexable form) with a single
    /// descent. Infallible: absence of a match is reported through the
    /// returned [`Value`].
    pub fn get_value<'t>(&'t self, name: &[u8]) -> Value<'t, H> {
        let mut v = Value {
            tree: self,
            node: None,
            params: Vec::new(),
            zones: ArrayVec::new(),
            nearest: Milestone {
                node: Some(ROOT),
                params_len: 0,
                rem_start: 0,
            },
            cut: false,
        };

        let mut n = ROOT;
        let mut rem: &[u8] = name;
        // Where the last parameter scan stopped; drives the cut flag
        // for parameter edges.
        let mut end = 0usize;
        let mut fallback = false;
        let mut fb: Option<Fallback> = None;

        let off = |rem: &[u8]| name.len() - rem.len();

        'walk: loop {
            let node = self.node(n);
            if rem.len() > node.name.len() && rem[..node.name.len()] == node.name[..] {
                if node.wild_child == WildChild::Anonymous {
                    fb = Some(Fallback {
                        node: n,
                        rem_start: off(rem),
                        params_len: v.params.len(),
                        zones_len: v.zones.len(),
                    });
                }

                rem = &rem[node.name.len()..];

                if !fallback {
                    v.nearest = Milestone {
                        node: Some(n),
                        params_len: v.params.len(),
                        rem_start: off(rem),
                    };
                }

                if let Some(data) = &node.data {
                    if rem.first() == Some(&b'.') {
                        if data.flags.intersects(RrFlags::ZONE) {
                            v.zones.push(Milestone {
                                node: Some(n),
                                params_len: v.params.len(),
                                rem_start: off(rem),
                            });
                        }
                        if data.flags.contains(RrFlags::DNAME) {
                            // DNAME authoritatively replaces the
                            // subtree.
                            v.node = Some(n);
                            v.cut = true;
                            break 'walk;
                        }
                    }
                }

                // Without a named wildcard child the next static edge
                // decides; remember the anonymous slot for later.
                if node.wild_child != WildChild::Named && !fallback {
                    let c = rem[0];
                    let w = node.wild_offset();
                    if let Some(i) = node.indices.iter().position(|&b| b == c) {
                        n = node.children[i + w];
                        continue 'walk;
                    }

                    // Nothing found: take the anonymous fallback if
                    // one was recorded.
                    if let Some(f) = fb {
                        n = f.node;
                        rem = &name[f.rem_start..];
                        v.params.truncate(f.params_len);
                        v.zones.truncate(f.zones_len);
                        fallback = true;
                        continue 'walk;
                    }
                    break 'walk;
                }

                // Handle the wildcard child.
                n = node.children[0];
                let wnode = self.node(n);
                match wnode.n_type {
                    NodeType::Param => {
                        // The parameter spans one label.
                        end = rem
                            .iter()
                            .position(|&b| b == b'.')
                            .unwrap_or(rem.len());

                        if v.params.is_empty() {
                            v.params.reserve(wnode.max_params as usize);
                        }
                        v.params.push(RawParam {
                            key: &wnode.name[1..],
                            value: off(rem)..off(rem) + end,
                        });

                        // We need to go deeper: the scan stopped at a
                        // dot.
                        if end < rem.len() {
                            if let Some(data) = &wnode.data {
                                if data.flags.intersects(RrFlags::ZONE) {
                                    v.zones.push(Milestone {
                                        node: Some(n),
                                        params_len: v.params.len(),
                                        rem_start: off(rem),
                                    });
                                }
                                if data.flags.contains(RrFlags::DNAME) {
                                    v.node = Some(n);
                                    break 'walk;
                                }
                            }

                            if !wnode.children.is_empty() {
                                rem = &rem[end..];
                                v.nearest = Milestone {
                                    node: Some(n),
                                    params_len: v.params.len(),
                                    rem_start: off(rem),
                                };
                                n = wnode.children[0];
                                continue 'walk;
                            }

                            // ... but we can't.
                            if let Some(f) = fb {
                                n = f.node;
                                rem = &name[f.rem_start..];
                                v.params.truncate(f.params_len);
                                v.zones.truncate(f.zones_len);
                                fallback = true;
                                continue 'walk;
                            }
                            break 'walk;
                        }

                        if wnode.data.is_some() {
                            v.node = Some(n);
                        }
                        break 'walk;
                    }
                    NodeType::CatchAll => {
                        if v.params.is_empty() {
                            v.params.reserve(wnode.max_params as usize);
                        }
                        v.params.push(RawParam {
                            key: &wnode.name[2..],
                            value: off(rem)..name.len(),
                        });
                        if wnode.data.is_some() {
                            v.node = Some(n);
                        }
                        break 'walk;
                    }
                    NodeType::AnonymousCatchAll => {
                        if v.params.is_empty() {
                            v.params.reserve(wnode.max_params as usize + 1);
                        }
                        v.params.push(RawParam {
                            key: b"",
                            value: off(rem)..name.len(),
                        });
                        if wnode.data.is_some() {
                            v.node = Some(n);
                        }
                        break 'walk;
                    }
                    // Static/root nodes never occupy the wildcard
                    // slot.
                    _ => break 'walk,
                }
            } else if rem == node.name.as_slice() {
                // We have reached the node the name registers.
                if node.data.is_some() {
                    v.node = Some(n);
                }
                break 'walk;
            } else {
                if fallback {
                    if node.name == ANONYMOUS_LABEL {
                        if v.params.is_empty() {
                            v.params.reserve(node.max_params as usize);
                        }
                        v.params.push(RawParam {
                            key: b"",
                            value: off(rem)..name.len(),
                        });
                        if node.data.is_some() {
                            v.node = Some(n);
                        }
                    }
                    break 'walk;
                }
                if let Some(f) = fb {
                    n = f.node;
                    rem = &name[f.rem_start..];
                    v.params.truncate(f.params_len);
                    v.zones.truncate(f.zones_len);
                    fallback = true;
                    continue 'walk;
                }
                break 'walk;
            }
        }

        // A matched zone node belongs to its own zone stack.
        if let Some(m) = v.node {
            if self.is_zone(m) {
                v.zones.push(Milestone {
                    node: Some(m),
                    params_len: v.params.len(),
                    rem_start: name.len(),
                });
            }
        }

        // Distinguish an empty non-terminal from a plain miss: the
        // descent stopped exactly at a label boundary inside an edge.
        if v.node.is_none() {
            let node = self.node(n);
            match node.n_type {
                NodeType::Static | NodeType::Root => {
                    let l = rem.len();
                    v.cut = l < node.name.len()
                        && node.name[l] == b'.'
                        && node.name[..l] == rem[..];
                }
                NodeType::Param => {
                    v.cut = end == rem.len();
                }
                _ => {}
            }
        }

        v
    }

    /// Computes the node immediately preceding `name` in the tree's
    /// canonical walk (reverse in-order), without crossing above the
    /// innermost enclosing zone. `matched`, `nearest` and `zone` come
    /// from the [`Value`] of the lookup for `name`.
    pub(crate) fn previous_node(
        &self,
        name: &[u8],
        matched: Option<NodeId>,
        nearest: Milestone,
        zone: Option<NodeId>,
    ) -> Option<NodeId> {
        let nomatch = match matched {
            None => true,
            Some(id) => self.node(id).name == ANONYMOUS_LABEL,
        };
        let mut nearest_node = nearest.node;
        let mut nearest_name: &[u8] = &name[nearest.rem_start..];

        match nearest_node {
            Some(id) if nomatch && !nearest_name.is_empty() => {
                let node = self.node(id);
                let c = nearest_name[0];

                let index = node.indices.iter().position(|&b| b == c).map(|i| {
                    // The anonymous child occupies slot 0.
                    i + (node.wild_child == WildChild::Anonymous) as usize
                });
                if let Some(pos) = index {
                    let child = node.children[pos];
                    if !self.is_zone(child) && self.node(child).name.as_slice() < nearest_name
                    {
                        return Some(self.get_max(child));
                    }
                }

                if c == b'.' && node.data.is_some() {
                    return Some(id);
                }
            }
            _ => {
                if let Some(m) = matched {
                    if self.is_zone(m) {
                        // The zone's own rightmost sub-name precedes
                        // any name below the zone.
                        let node = self.node(m);
                        for (i, &b) in node.indices.iter().enumerate() {
                            if b != b'.' {
                                continue;
                            }
                            let child = self.get_max(node.children[i + node.wild_offset()]);
                            if self.node(child).data.is_some() {
                                return Some(child);
                            }
                            break;
                        }
                        return Some(m);
                    }
                }
            }
        }

        'up: while let Some(id) = nearest_node {
            if nearest_name.is_empty() {
                break;
            }
            let node = self.node(id);
            let c = nearest_name[0];

            // Children with a smaller index byte, scanned from the
            // highest byte downward. Entries hold position + 1. The
            // anonymous slot competes at the `*` position.
            let mut chars = [0u16; 256];
            if node.wild_child == WildChild::Anonymous && c > b'*' {
                chars[b'*' as usize] = 1;
            }
            let w = node.wild_offset();
            let mut dot = None;
            for (i, &ch) in node.indices.iter().enumerate() {
                if ch == b'.' {
                    dot = Some(i);
                } else if ch < c {
                    chars[ch as usize] = (i + 1 + w) as u16;
                }
            }

            for j in chars.iter().rev().copied().filter(|&j| j > 0) {
                let child = node.children[(j - 1) as usize];
                if self.is_zone(child) {
                    if let Some(grandchild) = self.get_max_child(child) {
                        return Some(grandchild);
                    }
                    if nomatch {
                        return Some(child);
                    }
                    continue;
                }
                return Some(self.get_max(child));
            }

            if let Some(d) = dot {
                if c == b'.' && self.is_zone(id) {
                    return Some(id);
                }
                if c != b'.' && !self.is_zone(id) {
                    return Some(self.get_max(node.children[d + w]));
                }
            }

            if node.data.is_some() && !self.is_zone(id) {
                return Some(id);
            }

            // Go up, stopping at the innermost enclosing zone.
            let mut cur = id;
            loop {
                let Some(parent) = self.node(cur).parent else {
                    break 'up;
                };
                if Some(parent) == zone {
                    return zone;
                }
                nearest_name = &self.node(cur).name;
                nearest_node = Some(parent);
                cur = parent;
                if !nearest_name.is_empty() {
                    continue 'up;
                }
            }
        }

        nearest.node.map(|id| self.get_max(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TypeEntry;
    use crate::Type;

    type TestTree = Tree<&'static str>;

    fn entry(tag: &'static str) -> TypeEntry<&'static str> {
        TypeEntry::new(Type::A, tag)
    }

    fn build(routes: &[&'static str]) -> TestTree {
        let mut tree = Tree::new();
        for &route in routes {
            tree.add_route(route.as_bytes(), false, entry(route))
                .unwrap_or_else(|e| panic!("inserting {:?}: {}", route, e));
        }
        tree
    }

    /// One expected lookup outcome: the route tag of the matched node
    /// (or `None`), the route tags of the zone milestones
    /// (ancestor-first), the raw captured parameters, and the cut
    /// flag.
    struct Req {
        name: &'static str,
        route: Option<&'static str>,
        zones: &'static [&'static str],
        params: &'static [(&'static str, &'static str)],
        cut: bool,
    }

    impl Req {
        fn new(
            name: &'static str,
            route: Option<&'static str>,
            zones: &'static [&'static str],
            params: &'static [(&'static str, &'static str)],
            cut: bool,
        ) -> Self {
            Self {
                name,
                route,
                zones,
                params,
                cut,
            }
        }
    }

    fn tag_of(tree: &TestTree, id: NodeId) -> &'static str {
        tree.table(id)
            .and_then(|t| t.entries().first())
            .and_then(|e| e.handler)
            .expect("terminal node without a tagged entry")
    }

    fn check_requests(tree: &TestTree, requests: &[Req]) {
        for req in requests {
            let name = req.name.as_bytes();
            let v = tree.get_value(name);

            match (v.node, req.route) {
                (None, None) => {}
                (Some(id), Some(route)) => {
                    assert_eq!(tag_of(tree, id), route, "route mismatch for {:?}", req.name);
                }
                (got, want) => panic!(
                    "match mismatch for {:?}: got {:?}, want {:?}",
                    req.name,
                    got.map(|id| tag_of(tree, id)),
                    want,
                ),
            }

            let params: Vec<(&[u8], &[u8])> = v.params(name);
            let want_params: Vec<(&[u8], &[u8])> = req
                .params
                .iter()
                .map(|&(k, p)| (k.as_bytes(), p.as_bytes()))
                .collect();
            assert_eq!(params, want_params, "params mismatch for {:?}", req.name);

            assert_eq!(v.cut, req.cut, "cut mismatch for {:?}", req.name);

            let zones: Vec<&str> = v
                .zones
                .iter()
                .filter_map(|m| m.node)
                .map(|id| tag_of(tree, id))
                .collect();
            assert_eq!(zones, req.zones, "zones mismatch for {:?}", req.name);
        }
    }

    #[test]
    fn static_routes() {
        let tree = build(&[
            ".hi",
            ".contact",
            ".co",
            ".c",
            ".a",
            ".ab",
            ".doc.",
            ".doc.go_faq.html",
            ".doc.go1.html",
            ".α",
            ".β",
        ]);

        check_requests(
            &tree,
            &[
                Req::new(".a", Some(".a"), &[], &[], false),
                Req::new(".", None, &[], &[], false),
                Req::new(".hi", Some(".hi"), &[], &[], false),
                Req::new(".contact", Some(".contact"), &[], &[], false),
                Req::new(".co", Some(".co"), &[], &[], false),
                // Key mismatches.
                Req::new(".con", None, &[], &[], false),
                Req::new(".cona", None, &[], &[], false),
                // No matching child.
                Req::new(".no", None, &[], &[], false),
                Req::new(".ab", Some(".ab"), &[], &[], false),
                Req::new(".α", Some(".α"), &[], &[], false),
                Req::new(".β", Some(".β"), &[], &[], false),
                // Empty non-terminals.
                Req::new(".doc", None, &[], &[], true),
                Req::new(".doc.go1", None, &[], &[], true),
            ],
        );

        tree.check_priorities();
        tree.check_max_params();
        tree.check_parents();
    }

    #[test]
    fn wildcard_routes() {
        let tree = build(&[
            ".",
            ".cmd.:tool.:sub",
            ".cmd.:tool.",
            ".src.*filename",
            ".search.",
            ".search.:query",
            ".user_:name",
            ".user_:name.about",
            ".files.:dir.*filename",
            ".doc.",
            ".doc.go_faq.html",
            ".doc.go1.html",
            ".doc.*",
            ".doc.go1.*",
            ".doc.go1.html.*",
            ".info.:user.public",
            ".info.:user.project",
            ".info.:user.project.:project",
            ".org.example.www.:user",
            ".org.example.*",
            ".nl.dnssex",
            ".nl.dnssex.*",
            ".nl.dnssex.www",
        ]);

        check_requests(
            &tree,
            &[
                Req::new(".", Some("."), &[], &[], false),
                Req::new(
                    ".cmd.test.",
                    Some(".cmd.:tool."),
                    &[],
                    &[("tool", "test")],
                    false,
                ),
                Req::new(".cmd.test", None, &[], &[("tool", "test")], true),
                Req::new(
                    ".cmd.test.3",
                    Some(".cmd.:tool.:sub"),
                    &[],
                    &[("tool", "test"), ("sub", "3")],
                    false,
                ),
                Req::new(
                    ".src.",
                    Some(".src.*filename"),
                    &[],
                    &[("filename", ".")],
                    false,
                ),
                Req::new(
                    ".src.some.file.png",
                    Some(".src.*filename"),
                    &[],
                    &[("filename", ".some.file.png")],
                    false,
                ),
                Req::new(".search.", Some(".search."), &[], &[], false),
                Req::new(
                    ".search.someth!ng+in+ünìcodé",
                    Some(".search.:query"),
                    &[],
                    &[("query", "someth!ng+in+ünìcodé")],
                    false,
                ),
                Req::new(
                    ".search.someth!ng+in+ünìcodé.",
                    None,
                    &[],
                    &[("query", "someth!ng+in+ünìcodé")],
                    false,
                ),
                Req::new(
                    ".user_gopher",
                    Some(".user_:name"),
                    &[],
                    &[("name", "gopher")],
                    false,
                ),
                Req::new(
                    ".user_gopher.about",
                    Some(".user_:name.about"),
                    &[],
                    &[("name", "gopher")],
                    false,
                ),
                Req::new(
                    ".files.js.inc.framework.js",
                    Some(".files.:dir.*filename"),
                    &[],
                    &[("dir", "js"), ("filename", ".inc.framework.js")],
                    false,
                ),
                Req::new(
                    ".info.gordon.public",
                    Some(".info.:user.public"),
                    &[],
                    &[("user", "gordon")],
                    false,
                ),
                Req::new(
                    ".info.gordon.project.go",
                    Some(".info.:user.project.:project"),
                    &[],
                    &[("user", "gordon"), ("project", "go")],
                    false,
                ),
                Req::new(".doc.go1", Some(".doc.*"), &[], &[("", "go1")], false),
                Req::new(".doc.go1.html", Some(".doc.go1.html"), &[], &[], false),
                Req::new(".doc.go1.xml", Some(".doc.go1.*"), &[], &[("", "xml")], false),
                Req::new(
                    ".doc.go1.html.hello.world",
                    Some(".doc.go1.html.*"),
                    &[],
                    &[("", "hello.world")],
                    false,
                ),
                Req::new(
                    ".org.example.www.jobs.steve",
                    Some(".org.example.*"),
                    &[],
                    &[("", "www.jobs.steve")],
                    false,
                ),
                Req::new(
                    ".org.example.www.jobs",
                    Some(".org.example.www.:user"),
                    &[],
                    &[("user", "jobs")],
                    false,
                ),
                Req::new(".org.example", None, &[], &[], true),
                Req::new(".nl.dnssex.wild", Some(".nl.dnssex.*"), &[], &[("", "wild")], false),
            ],
        );

        tree.check_priorities();
        tree.check_max_params();
        tree.check_parents();
    }

    fn build_zoned(routes: &[(&'static str, Type)]) -> TestTree {
        let mut tree = Tree::new();
        for &(route, qtype) in routes {
            let mut e = entry(route);
            e.qtype = qtype;
            tree.add_route(route.as_bytes(), true, e)
                .unwrap_or_else(|err| panic!("inserting {:?}: {}", route, err));
        }
        tree
    }

    #[test]
    fn zones_and_dname() {
        let tree = build_zoned(&[
            (".org.example", Type::NS),
            (".org.example", Type::SOA),
            (".org.example", Type::A),
            (".org.example.a", Type::A),
            (".org.example.b", Type::A),
            (".org.example.c.d", Type::NS),
            (".org.example.c.d", Type::A),
            (".org.example.c.d.e", Type::A),
            (".org.example.c.d.e.f", Type::A),
            (".org.example.c.d.e.*", Type::A),
            (".org.example.d", Type::DNAME),
            (".org.example.d", Type::A),
            (".org.example.d.e", Type::A),
            (".org.example.d.e.*", Type::A),
            (".com.example.:user.:sex", Type::NS),
            (".com.example.:user.:sex", Type::SOA),
            (".com.example.:user.:sex.:job.:hobby.hi", Type::A),
            (".com.example.:user.:sex.:job.:hobby.hi", Type::DNAME),
            (".com.example.:user.:sex.:job.:hobby.hello.*oops", Type::A),
        ]);

        let hannah: &[(&str, &str)] = &[
            ("user", "hannah"),
            ("sex", "female"),
            ("job", "manager"),
            ("hobby", "reading"),
        ];
        let hannah_oops: &[(&str, &str)] = &[
            ("user", "hannah"),
            ("sex", "female"),
            ("job", "manager"),
            ("hobby", "reading"),
            ("oops", ".oops"),
        ];

        check_requests(
            &tree,
            &[
                Req::new(".", None, &[], &[], false),
                Req::new(".org", None, &[], &[], true),
                Req::new(
                    ".org.example",
                    Some(".org.example"),
                    &[".org.example"],
                    &[],
                    false,
                ),
                Req::new(
                    ".org.example.a",
                    Some(".org.example.a"),
                    &[".org.example"],
                    &[],
                    false,
                ),
                Req::new(
                    ".org.example.b",
                    Some(".org.example.b"),
                    &[".org.example"],
                    &[],
                    false,
                ),
                Req::new(".org.example.c", None, &[".org.example"], &[], true),
                Req::new(
                    ".org.example.c.d",
                    Some(".org.example.c.d"),
                    &[".org.example", ".org.example.c.d"],
                    &[],
                    false,
                ),
                Req::new(".org.example.c.dd", None, &[".org.example"], &[], false),
                Req::new(".org.example.c.e", None, &[".org.example"], &[], false),
                Req::new(
                    ".org.example.c.d.e",
                    Some(".org.example.c.d.e"),
                    &[".org.example", ".org.example.c.d"],
                    &[],
                    false,
                ),
                Req::new(
                    ".org.example.c.d.e.f",
                    Some(".org.example.c.d.e.f"),
                    &[".org.example", ".org.example.c.d"],
                    &[],
                    false,
                ),
                Req::new(
                    ".org.example.c.d.e.g",
                    Some(".org.example.c.d.e.*"),
                    &[".org.example", ".org.example.c.d"],
                    &[("", "g")],
                    false,
                ),
                Req::new(
                    ".org.example.d",
                    Some(".org.example.d"),
                    &[".org.example"],
                    &[],
                    false,
                ),
                Req::new(".org.example.de", None, &[".org.example"], &[], false),
                // DNAME authoritatively replaces the subtree.
                Req::new(
                    ".org.example.d.e",
                    Some(".org.example.d"),
                    &[".org.example"],
                    &[],
                    true,
                ),
                Req::new(
                    ".org.example.d.e.f",
                    Some(".org.example.d"),
                    &[".org.example"],
                    &[],
                    true,
                ),
                Req::new(
                    ".com.example.hannah.female.manager.reading.hi",
                    Some(".com.example.:user.:sex.:job.:hobby.hi"),
                    &[".com.example.:user.:sex"],
                    hannah,
                    false,
                ),
                Req::new(
                    ".com.example.hannah.female.manager.reading.hi.oops",
                    Some(".com.example.:user.:sex.:job.:hobby.hi"),
                    &[".com.example.:user.:sex"],
                    hannah,
                    true,
                ),
                Req::new(
                    ".com.example.hannah.female.manager.reading.hello.oops",
                    Some(".com.example.:user.:sex.:job.:hobby.hello.*oops"),
                    &[".com.example.:user.:sex"],
                    hannah_oops,
                    false,
                ),
                Req::new(
                    ".com.example.hannah.female.manager.reading.x",
                    None,
                    &[".com.example.:user.:sex"],
                    hannah,
                    false,
                ),
            ],
        );
    }

    #[test]
    fn raw_params_before_reversal() {
        let tree = build_zoned(&[
            (".org.example.:user.:sex", Type::NS),
            (".org.example.:user.:sex", Type::SOA),
            (".org.example.:user.:sex.:job.:hobby.hi", Type::A),
            (".org.example.:user.:sex.:job.:hobby.hi.*oops", Type::A),
            (".org.example.:user.:sex.:job.:hobby.hello", Type::NS),
            (".org.example.:user.:sex.:job.:hobby.hello.*", Type::A),
        ]);

        check_requests(
            &tree,
            &[
                Req::new(
                    ".org.example.hannah.female.manager.reading.hi.how.are.you",
                    Some(".org.example.:user.:sex.:job.:hobby.hi.*oops"),
                    &[".org.example.:user.:sex"],
                    &[
                        ("user", "hannah"),
                        ("sex", "female"),
                        ("job", "manager"),
                        ("hobby", "reading"),
                        ("oops", ".how.are.you"),
                    ],
                    false,
                ),
                Req::new(
                    ".org.example.hannah.female.manager.reading.hello.how.are.you",
                    Some(".org.example.:user.:sex.:job.:hobby.hello.*"),
                    &[
                        ".org.example.:user.:sex",
                        ".org.example.:user.:sex.:job.:hobby.hello",
                    ],
                    &[
                        ("user", "hannah"),
                        ("sex", "female"),
                        ("job", "manager"),
                        ("hobby", "reading"),
                        ("", "how.are.you"),
                    ],
                    false,
                ),
            ],
        );

        // The zone milestone saw only the captures made above it.
        let name = b".org.example.hannah.female.manager.reading.hi.how.are.you";
        let v = tree.get_value(name);
        assert_eq!(v.zones.len(), 1);
        assert_eq!(v.zones[0].params_len, 2);
    }

    #[test]
    fn previous_walks_the_canonical_order() {
        let tree = build(&[".a", ".b", ".c"]);

        let v = tree.get_value(b".b");
        let prev = v.previous(b".b").expect("predecessor of .b");
        assert_eq!(tag_of(&tree, prev), ".a");

        // An unregistered name falls back to the nearest smaller
        // terminal.
        let v = tree.get_value(b".bb");
        let prev = v.previous(b".bb").expect("predecessor of .bb");
        assert_eq!(tag_of(&tree, prev), ".b");
    }
}
