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

//! The compressed radix tree of indexable names.
//!
//! Edges carry byte strings of canonical (label-reversed) names, so a
//! descent consumes a query from its outermost label inward. Three
//! wildcard flavours coexist with static edges:
//!
//! * `:ident`, a named parameter matching exactly one label;
//! * `*ident`, a named catch-all matching the rest of the name;
//! * the anonymous RFC 4592 wildcard, registered as a bare `*` label
//!   and stored with the sentinel byte `0x80` appended; it is
//!   consulted only when no static or named branch matches.
//!
//! Nodes live in an arena owned by the [`Tree`] and refer to each
//! other by [`NodeId`]; the parent link is a plain back-reference with
//! no ownership. Registration ([`Tree::add_route`], in `insert.rs`)
//! grows the tree; lookup ([`Tree::get_value`], in `lookup.rs`) never
//! mutates it, so a tree that has finished registering can serve any
//! number of concurrent lookups.

mod casefold;
mod insert;
mod lookup;

pub(crate) use lookup::Milestone;
pub use lookup::Value;

use crate::rr::RrFlags;
use crate::table::{TypeEntry, TypeTable};
use crate::Type;

/// The label an anonymous RFC 4592 wildcard is stored under: the
/// asterisk plus the out-of-band sentinel byte. The sentinel makes the
/// label sort after every legal DNS label and distinguishes the
/// anonymous form from a named catch-all.
pub(crate) const ANONYMOUS_LABEL: &[u8] = b"*\x80";

/// The sentinel byte appended to registrations ending in `.*`.
pub(crate) const ANONYMOUS_SENTINEL: u8 = 0x80;

/// Appends the anonymous-wildcard sentinel to a name ending in `.*`.
/// Applied both before tree insertion and before canonical-order
/// indexing, so the two agree on the stored form. Idempotent: a name
/// already carrying the sentinel no longer ends in `.*`.
pub(crate) fn decorate(name: &[u8]) -> Vec<u8> {
    let mut name = name.to_vec();
    if name.ends_with(b".*") {
        name.push(ANONYMOUS_SENTINEL);
    }
    name
}

/// A handle to a node in a [`Tree`] arena.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId(u32);

/// The root node of every tree.
pub(crate) const ROOT: NodeId = NodeId(0);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The kind of a node, determined by the route segment it was created
/// for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum NodeType {
    #[default]
    Static,
    Root,
    Param,
    CatchAll,
    AnonymousCatchAll,
}

impl NodeType {
    /// Whether a node of this type captures a parameter itself (the
    /// placeholder node of a catch-all pair does not).
    fn is_capturing(self) -> bool {
        matches!(self, Self::Param | Self::CatchAll | Self::AnonymousCatchAll)
    }
}

/// Which kind of wildcard child, if any, occupies a node's reserved
/// child slot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) enum WildChild {
    #[default]
    None,
    Named,
    Anonymous,
}

/// The payload of a terminal node: its type table plus the RR flags
/// that drive zone and DNAME handling during lookup.
#[derive(Clone, Debug)]
pub(crate) struct NodeData<H> {
    pub table: TypeTable<H>,
    pub flags: RrFlags,
}

impl<H> Default for NodeData<H> {
    fn default() -> Self {
        Self {
            table: TypeTable::default(),
            flags: RrFlags::NONE,
        }
    }
}

impl<H> NodeData<H> {
    /// Appends `entry` and updates the node flags. NS and SOA are
    /// recorded only when the owner name originates under the entry's
    /// origin (in canonical form, origin-suffixing becomes a prefix
    /// test); DNAME is always recorded.
    fn add(&mut self, owner: &[u8], entry: TypeEntry<H>) {
        let originated = owner.starts_with(&entry.origin);
        match entry.qtype {
            Type::NS if originated => self.flags |= RrFlags::NS,
            Type::SOA if originated => self.flags |= RrFlags::SOA,
            Type::DNAME => self.flags |= RrFlags::DNAME,
            _ => {}
        }
        self.table.append(entry);
    }
}

/// A radix-tree node. See the module docs for the structural
/// invariants; in short: `indices[i]` is the first byte of the static
/// child at `children[i + w]`, where `w` is 1 if a wildcard child
/// occupies slot 0 and 0 otherwise, children are kept in descending
/// priority order, and `priority` counts the registrations reachable
/// through the node.
#[derive(Clone, Debug)]
pub(crate) struct Node<H> {
    pub name: Vec<u8>,
    pub wild_child: WildChild,
    pub n_type: NodeType,
    pub max_params: u8,
    pub indices: Vec<u8>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub data: Option<NodeData<H>>,
    pub priority: u32,
}

impl<H> Node<H> {
    fn new(parent: Option<NodeId>) -> Self {
        Self {
            name: Vec::new(),
            wild_child: WildChild::None,
            n_type: NodeType::Static,
            max_params: 0,
            indices: Vec::new(),
            children: Vec::new(),
            parent,
            data: None,
            priority: 0,
        }
    }

    /// The offset of the first indexed child within `children`.
    pub(crate) fn wild_offset(&self) -> usize {
        (self.wild_child != WildChild::None) as usize
    }

    /// Whether this node adds a captured parameter of its own to any
    /// route passing through it.
    fn contributes_param(&self) -> bool {
        self.n_type.is_capturing() && self.wild_child == WildChild::None
    }
}

/// The per-class radix tree.
///
/// Registration is not safe against concurrent use; lookups on a tree
/// that has finished registering may run from any number of threads.
#[derive(Clone, Debug)]
pub struct Tree<H> {
    nodes: Vec<Node<H>>,
}

impl<H> Default for Tree<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Tree<H> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None)],
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<H> {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node<H> {
        &mut self.nodes[id.index()]
    }

    /// The type table of a terminal node, if it has one.
    pub fn table(&self, id: NodeId) -> Option<&TypeTable<H>> {
        self.node(id).data.as_ref().map(|d| &d.table)
    }

    fn alloc(&mut self, node: Node<H>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Whether the node owns an NS or SOA record, making it a zone
    /// apex or delegation point.
    pub(crate) fn is_zone(&self, id: NodeId) -> bool {
        self.node(id)
            .data
            .as_ref()
            .map_or(false, |d| d.flags.intersects(RrFlags::ZONE))
    }

    pub(crate) fn is_dname(&self, id: NodeId) -> bool {
        self.node(id)
            .data
            .as_ref()
            .map_or(false, |d| d.flags.contains(RrFlags::DNAME))
    }

    /// Returns the maximum node reachable from `id`: the terminal found
    /// by always descending into the child with the highest index
    /// byte, without crossing into descendant zones (those are
    /// descended through [`Tree::get_max_child`], which skips the
    /// zone's own subtree boundary).
    pub(crate) fn get_max(&self, id: NodeId) -> NodeId {
        let node = self.node(id);
        if node.children.is_empty() {
            return id;
        }

        if node.indices.is_empty() {
            let child = node.children[0];
            if self.is_zone(child) {
                return self.get_max_child(child).unwrap_or(id);
            }
            let max = self.get_max(child);
            if self.node(max).data.is_some() {
                return max;
            }
            return id;
        }

        // Index the children by their index byte so we can scan from
        // the highest byte downward. Entries hold position + 1 so that
        // zero means absent.
        let mut chars = [0u16; 256];
        let w = node.wild_offset();
        for (i, &ch) in node.indices.iter().enumerate() {
            chars[ch as usize] = (i + w + 1) as u16;
        }

        for j in chars.iter().rev().copied().filter(|&j| j > 0) {
            let child = node.children[(j - 1) as usize];
            if self.is_zone(child) {
                match self.get_max_child(child) {
                    Some(grandchild) => return grandchild,
                    None => continue,
                }
            }
            let max = self.get_max(child);
            if self.node(max).data.is_some() {
                return max;
            }
            return id;
        }

        id
    }

    /// [`Tree::get_max`] restricted to children whose index byte is
    /// not `.`, used to descend into a zone without leaving it through
    /// a sub-name boundary. Returns [`None`] when the zone has no such
    /// child.
    pub(crate) fn get_max_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        let mut chars = [0u16; 256];
        let mut any = false;
        let w = node.wild_offset();
        for (i, &ch) in node.indices.iter().enumerate() {
            if ch == b'.' {
                continue;
            }
            any = true;
            chars[ch as usize] = (i + w + 1) as u16;
        }

        if !any {
            return None;
        }

        for j in chars.iter().rev().copied().filter(|&j| j > 0) {
            let child = node.children[(j - 1) as usize];
            if self.is_zone(child) {
                match self.get_max_child(child) {
                    Some(grandchild) => return Some(grandchild),
                    None => continue,
                }
            }
            let max = self.get_max(child);
            if self.node(max).data.is_some() {
                return Some(max);
            }
            return Some(id);
        }

        None
    }
}

////////////////////////////////////////////////////////////////////////
// TEST SUPPORT: STRUCTURAL INVARIANT WALKERS                         //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
impl<H> Tree<H> {
    /// Asserts that every node's priority equals the number of
    /// payloads in its subtree. Holds for trees built without
    /// duplicate registrations.
    pub(crate) fn check_priorities(&self) {
        self.check_priorities_from(ROOT);
    }

    fn check_priorities_from(&self, id: NodeId) -> u32 {
        let node = self.node(id);
        let mut priority: u32 = node.children
            .iter()
            .map(|&c| self.check_priorities_from(c))
            .sum();
        if node.data.is_some() {
            priority += 1;
        }
        assert_eq!(
            node.priority, priority,
            "priority mismatch for node {:?}",
            String::from_utf8_lossy(&node.name),
        );
        priority
    }

    /// Asserts that every node's `max_params` equals the maximum
    /// capture count reachable in its subtree.
    pub(crate) fn check_max_params(&self) {
        self.check_max_params_from(ROOT);
    }

    fn check_max_params_from(&self, id: NodeId) -> u8 {
        let node = self.node(id);
        let mut max_params = node
            .children
            .iter()
            .map(|&c| self.check_max_params_from(c))
            .max()
            .unwrap_or(0);
        if node.contributes_param() {
            max_params += 1;
        }
        assert_eq!(
            node.max_params, max_params,
            "max_params mismatch for node {:?}",
            String::from_utf8_lossy(&node.name),
        );
        max_params
    }

    /// Asserts that every child's parent link names its owner and that
    /// the index string covers exactly the indexed children.
    pub(crate) fn check_parents(&self) {
        self.check_parents_from(ROOT);
    }

    fn check_parents_from(&self, id: NodeId) {
        let node = self.node(id);
        assert_eq!(node.indices.len(), node.children.len() - node.wild_offset());
        for &child in &node.children {
            assert_eq!(self.node(child).parent, Some(id));
            self.check_parents_from(child);
        }
    }
}
