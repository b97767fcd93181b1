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

//! Route registration.
//!
//! [`Tree::add_route`] descends from the root along matching prefixes,
//! splitting diverging edges and growing new branches as needed. The
//! name's wildcard syntax is validated before the tree is touched, and
//! the priority / `max_params` bookkeeping is applied only once the
//! insertion has fully succeeded, so a failing registration leaves the
//! tree observably unchanged (an edge split may occur, but a split
//! preserves the route set and every structural invariant).

use crate::error::RouteError;
use crate::name::{count_labels, MAX_N_LABELS};
use crate::table::TypeEntry;

use super::{decorate, Node, NodeData, NodeId, NodeType, Tree, WildChild, ROOT};

/// Counts the `:`/`*` wildcard markers of a name, saturating at 255.
fn count_params(name: &[u8]) -> u8 {
    name.iter()
        .filter(|&&c| c == b':' || c == b'*')
        .count()
        .min(255) as u8
}

/// Validates the wildcard syntax of a (sentinel-decorated) name before
/// anything is inserted.
fn validate_wildcards(name: &[u8]) -> Result<(), RouteError> {
    let mut labels = name.split(|&b| b == b'.').peekable();
    while let Some(label) = labels.next() {
        let is_last = labels.peek().is_none();
        let mut wildcards = label
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == b':' || b == b'*');

        let Some((pos, &marker)) = wildcards.next() else {
            continue;
        };
        if wildcards.next().is_some() {
            return Err(RouteError::MultipleWildcardPerLabel);
        }
        // A catch-all begins its label and nothing may follow it.
        if marker == b'*' && (pos != 0 || !is_last) {
            return Err(RouteError::CatchAllNotAtEnd);
        }
        if pos + 1 == label.len() {
            return Err(RouteError::EmptyWildcardName);
        }
    }
    Ok(())
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

impl<H> Tree<H> {
    /// Registers `entry` under the indexable name `name`.
    ///
    /// A name whose final label is a bare `*` is stored as an
    /// anonymous RFC 4592 wildcard (the sentinel is appended here, so
    /// callers may pass the plain `.*` form). When the exact route
    /// already exists, the entry is appended to its type table if
    /// `allow_duplicate` is set and rejected otherwise.
    ///
    /// Not safe against concurrent use; registration is a startup
    /// activity.
    pub fn add_route(
        &mut self,
        name: &[u8],
        allow_duplicate: bool,
        entry: TypeEntry<H>,
    ) -> Result<(), RouteError> {
        let full = decorate(name);
        if full.is_empty() || count_labels(&full) > MAX_N_LABELS {
            return Err(RouteError::IllegalDomain);
        }
        validate_wildcards(&full)?;
        let mut num_params = count_params(&full);

        // The pre-existing nodes entered during the walk; bookkeeping
        // is applied to them only after the insertion has succeeded.
        let mut path: Vec<NodeId> = Vec::new();
        path.push(ROOT);

        let root = self.node(ROOT);
        if root.name.is_empty() && root.children.is_empty() {
            // Empty tree.
            let terminal = self.insert_child(ROOT, num_params, &full, &full, entry)?;
            self.node_mut(ROOT).n_type = NodeType::Root;
            self.commit(&path, terminal);
            return Ok(());
        }

        let mut n = ROOT;
        let mut rem: &[u8] = &full;

        loop {
            // The longest common prefix with the node's edge name. The
            // prefix contains no wildcard markers, since an existing
            // static edge cannot contain them.
            let i = common_prefix(rem, &self.node(n).name);

            if i < self.node(n).name.len() {
                self.split_edge(n, i);
            }

            if i == rem.len() {
                // The route ends at this node.
                if self.node(n).data.is_some() && !allow_duplicate {
                    return Err(RouteError::DuplicateRoute);
                }
                self.add_entry(n, &full, entry);
                self.commit(&path, n);
                return Ok(());
            }

            rem = &rem[i..];

            if self.node(n).wild_child == WildChild::Named {
                let w = self.node(n).children[0];
                path.push(w);
                num_params = num_params.saturating_sub(1);

                // The existing wildcard must match the next segment
                // exactly (allowing for a longer ident, e.g. `:name`
                // vs `:names`, which is a mismatch).
                let w_len = self.node(w).name.len();
                let matches = rem.len() >= w_len
                    && self.node(w).name[..] == rem[..w_len]
                    && (w_len >= rem.len() || rem[w_len] == b'.');
                if !matches {
                    return Err(self.wildcard_conflict(w, rem, &full));
                }
                n = w;
                continue;
            }

            let c = rem[0];

            // A parameter node's single static child continues at the
            // dot.
            if self.node(n).n_type == NodeType::Param
                && c == b'.'
                && self.node(n).children.len() == 1
            {
                n = self.node(n).children[0];
                path.push(n);
                continue;
            }

            // An existing static child for this byte?
            if let Some(pos) = self.node(n).indices.iter().position(|&b| b == c) {
                n = self.node(n).children[pos + self.node(n).wild_offset()];
                path.push(n);
                continue;
            }

            // Otherwise insert. A static remainder grows a fresh
            // child; a wildcard is grafted onto the current node.
            if c != b':' && c != b'*' {
                let child = self.alloc(Node {
                    max_params: num_params,
                    priority: 1,
                    ..Node::new(Some(n))
                });
                self.node_mut(n).indices.push(c);
                self.node_mut(n).children.push(child);
                let terminal = self.insert_child(child, num_params, rem, &full, entry)?;
                self.commit(&path, terminal);
                return Ok(());
            }

            if self.node(n).wild_child == WildChild::Anonymous {
                // The anonymous wildcard already exists here.
                if !allow_duplicate {
                    return Err(RouteError::DuplicateRoute);
                }
                let child = self.node(n).children[0];
                path.push(child);
                self.add_entry(child, &full, entry);
                self.commit(&path, child);
                return Ok(());
            }

            let terminal = self.insert_child(n, num_params, rem, &full, entry)?;
            self.commit(&path, terminal);
            return Ok(());
        }
    }

    /// Splits the edge of `n` at byte `i`: the divergent suffix moves
    /// into a new child that inherits the payload, children, indices
    /// and wildcard slot, leaving `n` an internal fork.
    fn split_edge(&mut self, n: NodeId, i: usize) {
        let (suffix, indices, children, data, wild_child, priority) = {
            let node = self.node_mut(n);
            (
                node.name.split_off(i),
                std::mem::take(&mut node.indices),
                std::mem::take(&mut node.children),
                node.data.take(),
                std::mem::replace(&mut node.wild_child, WildChild::None),
                node.priority,
            )
        };
        let max_params = children
            .iter()
            .map(|&c| self.node(c).max_params)
            .max()
            .unwrap_or(0);
        let first_byte = suffix[0];
        let child = self.alloc(Node {
            name: suffix,
            wild_child,
            n_type: NodeType::Static,
            max_params,
            indices,
            children: children.clone(),
            parent: Some(n),
            data,
            priority,
        });
        for &grandchild in &children {
            self.node_mut(grandchild).parent = Some(child);
        }
        let node = self.node_mut(n);
        node.children = vec![child];
        node.indices = vec![first_byte];
    }

    /// Inserts the remainder `name` (which starts at a divergence
    /// point below `n`) and attaches the entry to the new terminal.
    /// Returns the terminal node.
    fn insert_child(
        &mut self,
        mut n: NodeId,
        mut num_params: u8,
        name: &[u8],
        full: &[u8],
        entry: TypeEntry<H>,
    ) -> Result<NodeId, RouteError> {
        let mut offset = 0; // bytes of `name` already assigned to nodes
        let max = name.len();
        let mut i = 0;

        while i < max && num_params > 0 {
            let c = name[i];
            if c != b':' && c != b'*' {
                i += 1;
                continue;
            }

            // Find the wildcard's end: the next dot or the end.
            let mut end = i + 1;
            while end < max && name[end] != b'.' {
                end += 1;
            }

            // The anonymous RFC 4592 wildcard keeps any existing
            // children; it is only a fallback.
            if c == b'*' && end == max && full.ends_with(b".*\x80") {
                if i > 0 {
                    self.node_mut(n).name = name[offset..i].to_vec();
                    offset = i;
                }
                let child = self.alloc(Node {
                    n_type: NodeType::AnonymousCatchAll,
                    max_params: num_params,
                    priority: 1,
                    ..Node::new(Some(n))
                });
                let node = self.node_mut(n);
                node.children.insert(0, child);
                node.wild_child = WildChild::Anonymous;
                n = child;
                break;
            }

            // A named wildcard here would make existing children
            // unreachable.
            if !self.node(n).children.is_empty() {
                return Err(RouteError::ChildConflict);
            }

            if c == b':' {
                // Named parameter.
                if i > 0 {
                    self.node_mut(n).name = name[offset..i].to_vec();
                    offset = i;
                }
                let child = self.alloc(Node {
                    n_type: NodeType::Param,
                    max_params: num_params,
                    priority: 1,
                    ..Node::new(Some(n))
                });
                let node = self.node_mut(n);
                node.children = vec![child];
                node.wild_child = WildChild::Named;
                n = child;
                num_params -= 1;

                // If the name doesn't end with the parameter, a static
                // remainder starting with `.` follows.
                if end < max {
                    self.node_mut(n).name = name[offset..end].to_vec();
                    offset = end;
                    let child = self.alloc(Node {
                        max_params: num_params,
                        priority: 1,
                        ..Node::new(Some(n))
                    });
                    self.node_mut(n).children = vec![child];
                    n = child;
                }
            } else {
                // Named catch-all.
                if self.node(n).name.last() == Some(&b'.') {
                    // The segment root here already holds a handler
                    // position.
                    return Err(RouteError::ChildConflict);
                }
                if i == 0 || name[i - 1] != b'.' {
                    return Err(RouteError::CatchAllNotAtEnd);
                }
                let dot = i - 1;
                self.node_mut(n).name = name[offset..dot].to_vec();

                // First node: a placeholder holding the wildcard slot.
                let first = self.alloc(Node {
                    wild_child: WildChild::Named,
                    n_type: NodeType::CatchAll,
                    max_params: 1,
                    priority: 1,
                    ..Node::new(Some(n))
                });
                let node = self.node_mut(n);
                node.children = vec![first];
                node.indices = vec![name[dot]];

                // Second node: holds the captured variable.
                let second = self.alloc(Node {
                    name: name[dot..].to_vec(),
                    n_type: NodeType::CatchAll,
                    max_params: 1,
                    priority: 1,
                    ..Node::new(Some(first))
                });
                self.node_mut(first).children = vec![second];
                self.add_entry(second, full, entry);
                return Ok(second);
            }

            i += 1;
        }

        // Insert the remaining name part and the entry into the leaf.
        self.node_mut(n).name = name[offset..].to_vec();
        self.add_entry(n, full, entry);
        Ok(n)
    }

    fn add_entry(&mut self, n: NodeId, owner: &[u8], entry: TypeEntry<H>) {
        self.node_mut(n)
            .data
            .get_or_insert_with(NodeData::default)
            .add(owner, entry);
    }

    /// Applies the bookkeeping for one successful registration: every
    /// pre-existing node on the descent path counts it, hot children
    /// move toward the front of their parent's indexed region, and
    /// `max_params` is re-derived along the terminal's ancestor chain.
    fn commit(&mut self, path: &[NodeId], terminal: NodeId) {
        for &id in path {
            self.node_mut(id).priority += 1;
        }
        for pair in path.windows(2) {
            self.bump_child(pair[0], pair[1]);
        }

        let mut cursor = Some(terminal);
        while let Some(id) = cursor {
            let child_max = self
                .node(id)
                .children
                .iter()
                .map(|&c| self.node(c).max_params)
                .max()
                .unwrap_or(0);
            let mp = child_max.saturating_add(self.node(id).contributes_param() as u8);
            let node = self.node_mut(id);
            if mp > node.max_params {
                node.max_params = mp;
            }
            cursor = node.parent;
        }
    }

    /// Moves `child` toward the front of `parent`'s indexed children
    /// while its priority exceeds its predecessors', permuting the
    /// index bytes identically. The wildcard slot is pinned.
    fn bump_child(&mut self, parent: NodeId, child: NodeId) {
        let w = self.node(parent).wild_offset();
        let Some(pos) = self.node(parent).children.iter().position(|&c| c == child) else {
            return;
        };
        if pos < w {
            return;
        }

        let idx = pos - w;
        let priority = self.node(child).priority;
        let mut new_idx = idx;
        while new_idx > 0 {
            let prev = self.node(parent).children[w + new_idx - 1];
            if self.node(prev).priority >= priority {
                break;
            }
            new_idx -= 1;
        }
        if new_idx != idx {
            let node = self.node_mut(parent);
            let moved = node.children.remove(w + idx);
            node.children.insert(w + new_idx, moved);
            let byte = node.indices.remove(idx);
            node.indices.insert(new_idx, byte);
        }
    }

    /// Builds the error for a segment that collides with an existing
    /// named wildcard: a wildcard-vs-wildcard collision reports the
    /// details, a static-vs-wildcard collision is a child conflict.
    fn wildcard_conflict(&self, w: NodeId, rem: &[u8], full: &[u8]) -> RouteError {
        let first_label = if rem.first() == Some(&b'.') {
            &rem[1..]
        } else {
            rem
        };
        if !matches!(first_label.first(), Some(b':') | Some(b'*')) {
            return RouteError::ChildConflict;
        }

        let wnode = self.node(w);
        let segment: Vec<u8> = if wnode.n_type == NodeType::CatchAll {
            rem.to_vec()
        } else {
            rem.split(|&b| b == b'.').next().unwrap_or(rem).to_vec()
        };
        let prefix_end = find_subslice(full, &segment).unwrap_or(0);
        let mut prefix = full[..prefix_end].to_vec();
        prefix.extend_from_slice(&wnode.name);
        RouteError::WildcardConflict {
            segment,
            name: full.to_vec(),
            existing: wnode.name.clone(),
            prefix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tag: &'static str) -> TypeEntry<&'static str> {
        TypeEntry::new(crate::Type::A, tag)
    }

    fn build(routes: &[&[u8]]) -> Tree<&'static str> {
        let mut tree = Tree::new();
        for &route in routes {
            tree.add_route(route, false, entry("x"))
                .unwrap_or_else(|e| panic!("inserting {:?}: {}", String::from_utf8_lossy(route), e));
        }
        tree
    }

    /// Adds the routes in order, asserting which of them conflict.
    fn check_conflicts(routes: &[(&[u8], bool)]) {
        let mut tree = Tree::new();
        for &(route, conflict) in routes {
            let result = tree.add_route(route, false, entry("x"));
            assert_eq!(
                result.is_err(),
                conflict,
                "route {:?}: got {:?}",
                String::from_utf8_lossy(route),
                result.err(),
            );
        }
    }

    #[test]
    fn wildcard_conflicts() {
        check_conflicts(&[
            (b".cmd.:tool.:sub", false),
            (b".cmd.vet", true),
            (b".src", false),
            (b".*", false),
            (b".src.*filename", false),
            (b".src.*filenamex", true),
            (b".src.", true),
            (b".src1.", false),
            (b".src1.*filename", true),
            (b".src2*filename", true),
            (b".search.:query", false),
            (b".search.invalid", true),
            (b".user_:name", false),
            (b".user_x", true),
            (b".user_:name", true),
            (b".id:id", false),
            (b".id.:id", true),
        ]);
    }

    #[test]
    fn child_conflicts() {
        check_conflicts(&[
            (b".cmd.vet", false),
            (b".cmd.:tool.:sub", true),
            (b".src.AUTHORS", false),
            (b".src.*filename", true),
            (b".user_x", false),
            (b".user_:name", true),
            (b".id.:id", false),
            (b".id:id", true),
            (b".:id", true),
            (b".*filename", true),
        ]);
    }

    #[test]
    fn catch_all_conflicts() {
        check_conflicts(&[
            (b".src.*filename.x", true),
            (b".src2.", false),
            (b".src2.*filename.x", true),
        ]);
        check_conflicts(&[(b".", false), (b".*filename", true)]);
    }

    #[test]
    fn conflict_kinds_are_classified() {
        // Syntax errors, regardless of tree contents.
        for route in [b".:foo:bar" as &[u8], b".:foo*bar", b".:foo:bar."] {
            let mut tree = Tree::new();
            assert_eq!(
                tree.add_route(route, false, entry("x")),
                Err(RouteError::MultipleWildcardPerLabel),
            );
        }
        for route in [b".user:" as &[u8], b".user:.", b".cmd.:."] {
            let mut tree = Tree::new();
            assert_eq!(
                tree.add_route(route, false, entry("x")),
                Err(RouteError::EmptyWildcardName),
            );
        }

        // A catch-all below further labels is malformed even when the
        // shorter catch-all route already exists.
        let mut tree = build(&[b".src.*filename"]);
        assert_eq!(
            tree.add_route(b".src.*filename.x", false, entry("x")),
            Err(RouteError::CatchAllNotAtEnd),
        );

        // Static-vs-wildcard collisions are child conflicts; a second
        // wildcard at the same position reports the existing one.
        let mut tree = build(&[b".user_:name"]);
        assert_eq!(
            tree.add_route(b".user_x", false, entry("x")),
            Err(RouteError::ChildConflict),
        );
        let mut tree = build(&[b".con:tact"]);
        match tree.add_route(b".con:nect", false, entry("x")) {
            Err(RouteError::WildcardConflict {
                segment, existing, ..
            }) => {
                assert_eq!(segment, b":nect");
                assert_eq!(existing, b":tact");
            }
            other => panic!("expected a wildcard conflict, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_routes_need_permission() {
        let routes: &[&[u8]] = &[
            b".",
            b".doc.",
            b".src.*filename",
            b".search.:query",
            b".user_:name",
        ];
        let mut tree = Tree::new();
        for &route in routes {
            tree.add_route(route, false, entry("x")).unwrap();
            assert_eq!(
                tree.add_route(route, false, entry("y")),
                Err(RouteError::DuplicateRoute),
            );
            tree.add_route(route, true, entry("z")).unwrap();
        }
    }

    #[test]
    fn illegal_names_are_rejected() {
        let mut tree: Tree<&str> = Tree::new();
        assert_eq!(
            tree.add_route(b"", false, entry("x")),
            Err(RouteError::IllegalDomain),
        );
        let long = b".x".repeat(200);
        assert_eq!(
            tree.add_route(&long, false, entry("x")),
            Err(RouteError::IllegalDomain),
        );
    }

    #[test]
    fn failed_registrations_leave_the_invariants_intact() {
        let mut tree = build(&[b".cmd.:tool.:sub", b".search.:query", b".doc.go1.html"]);
        // A conflicting route may split an edge but must not disturb
        // the bookkeeping.
        assert!(tree.add_route(b".cmd.vet", false, entry("x")).is_err());
        assert!(tree.add_route(b".doc.go1.html", false, entry("x")).is_err());
        tree.check_priorities();
        tree.check_max_params();
        tree.check_parents();
    }

    #[test]
    fn successful_trees_satisfy_the_invariants() {
        let tree = build(&[
            b".hi",
            b".contact",
            b".co",
            b".c",
            b".a",
            b".ab",
            b".doc.",
            b".doc.go_faq.html",
            b".doc.go1.html",
            b".doc.*",
            b".doc.go1.*",
            b".cmd.:tool.:sub",
            b".cmd.:tool.",
            b".src.*filename",
            b".files.:dir.*filename",
        ]);
        tree.check_priorities();
        tree.check_max_params();
        tree.check_parents();
    }

    #[test]
    fn hot_children_move_to_the_front() {
        let mut tree = build(&[b".alpha", b".beta"]);
        // Repeated registrations under .beta raise its priority above
        // .alpha's, so its index byte must come first.
        for route in [b".beta.a" as &[u8], b".beta.b", b".beta.c"] {
            tree.add_route(route, false, entry("x")).unwrap();
        }
        let root = tree.node(super::ROOT);
        assert_eq!(root.indices[0], b'b');
        tree.check_priorities();
        tree.check_parents();
    }
}
