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

//! The immutable lookup façade returned by
//! [`Router::lookup`](crate::Router::lookup).
//!
//! A [`Resolution`] carries the matched node's type table, the
//! captured parameters (reverted to their user-facing orientation),
//! the zone milestones crossed during the descent, and the cut flag.
//! On top of that state it implements the search semantics consumed by
//! response-building middleware: per-qtype search with CNAME/DNAME
//! shadowing, the RRSIG second stage, zone popping with delegation
//! detection, and the canonical predecessor for NSEC synthesis.

use std::ops::Deref;
use std::slice;

use crate::name::{count_labels, indexable};
use crate::rr::RrFlags;
use crate::table::{search_covered, TypeEntry, TypeTable};
use crate::tree::{Milestone, Tree, Value};
use crate::Type;

/// A single captured domain parameter.
///
/// The key is the ident of the `:param` or `*catchall` label that
/// captured it (empty for the anonymous wildcard); the value is the
/// captured name fragment in user-facing orientation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Param {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// The ordered parameter list of a lookup, outermost capture first.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Params(Vec<Param>);

impl Params {
    /// The value of the first parameter with the given key, if any.
    pub fn by_name(&self, key: &[u8]) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_slice())
    }

    pub fn iter(&self) -> slice::Iter<'_, Param> {
        self.0.iter()
    }
}

impl Deref for Params {
    type Target = [Param];

    fn deref(&self) -> &[Param] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// The result of searching a [`Resolution`] for a query type.
#[derive(Debug)]
pub enum SearchOutcome<'a, H> {
    /// Entries directly answering the query type.
    Answer(&'a [TypeEntry<H>]),

    /// The name redirects: the entries are the CNAME or DNAME records
    /// (as indicated by `via`) the caller should chase instead of the
    /// queried type.
    Redirect {
        via: Type,
        entries: &'a [TypeEntry<H>],
    },

    /// The name exists (a matched node, an empty non-terminal, or an
    /// enclosing zone) but holds no data for the query type.
    NoData,

    /// The name does not exist: an NXDOMAIN candidate.
    NameError,
}

/// The outcome of one router lookup: an immutable view over the
/// matched state, plus derived lookups for middleware.
pub struct Resolution<'a, H> {
    tree: Option<&'a Tree<H>>,
    name: Vec<u8>,
    node: Option<crate::tree::NodeId>,
    table: Option<&'a TypeTable<H>>,
    params: Params,
    zones: Vec<Milestone>,
    nearest: Milestone,
    cut: bool,
}

impl<H> Clone for Resolution<'_, H> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            name: self.name.clone(),
            node: self.node,
            table: self.table,
            params: self.params.clone(),
            zones: self.zones.clone(),
            nearest: self.nearest,
            cut: self.cut,
        }
    }
}

impl<'a, H> Resolution<'a, H> {
    /// Builds the façade from a raw tree descent, reverting the
    /// captured parameters: values spanning several labels are flipped
    /// back to their user-facing orientation, and the capture order is
    /// reversed so the outermost capture comes first. Zone milestones
    /// keep their identity as tails of the reverted list.
    pub(crate) fn from_value(name: Vec<u8>, value: Value<'a, H>) -> Self {
        let tree = value.tree();
        let mut params: Vec<Param> = value
            .params
            .iter()
            .map(|raw| {
                let bytes = &name[raw.value.clone()];
                let value = if count_labels(bytes) > 1 {
                    indexable(bytes)
                } else {
                    bytes.to_vec()
                };
                Param {
                    key: raw.key.to_vec(),
                    value,
                }
            })
            .collect();
        params.reverse();

        Self {
            tree: Some(tree),
            name,
            node: value.node,
            table: value.node.and_then(|id| tree.table(id)),
            params: Params(params),
            zones: value.zones.to_vec(),
            nearest: value.nearest,
            cut: value.cut,
        }
    }

    /// An empty resolution for a class with no registered tree.
    pub(crate) fn unmatched(name: Vec<u8>) -> Self {
        Self {
            tree: None,
            name,
            node: None,
            table: None,
            params: Params::default(),
            zones: Vec::new(),
            nearest: Milestone {
                node: None,
                params_len: 0,
                rem_start: 0,
            },
            cut: false,
        }
    }

    /// The canonical (indexable) form of the queried name.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Whether a registered node was matched.
    pub fn is_match(&self) -> bool {
        self.node.is_some()
    }

    /// Whether the lookup stopped at a label boundary inside the tree
    /// (an empty non-terminal, or a DNAME replacing the subtree) as
    /// opposed to a plain miss.
    pub fn is_cut(&self) -> bool {
        self.cut
    }

    /// The captured parameters, outermost first.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The number of zone milestones not yet popped with
    /// [`Resolution::zone`].
    pub fn zone_depth(&self) -> usize {
        self.zones.len()
    }

    /// All entries of the node backing this resolution, in
    /// `(qtype, type_covered)` order; empty when nothing matched.
    pub fn entries(&self) -> &'a [TypeEntry<H>] {
        self.table.map(TypeTable::entries).unwrap_or(&[])
    }

    /// The entries for `qtype` on the backing node: a plain type-table
    /// range query without the redirection semantics of
    /// [`Resolution::search`].
    pub fn search_entries(&self, qtype: Type) -> &'a [TypeEntry<H>] {
        self.table.map(|t| t.search(qtype)).unwrap_or(&[])
    }

    /// The canonical name of the node backing this resolution, with
    /// the internal anonymous-wildcard sentinel stripped.
    pub fn node_name(&self) -> Option<Vec<u8>> {
        let tree = self.tree?;
        let mut id = self.node?;
        let mut chain = vec![id];
        while let Some(parent) = tree.node(id).parent {
            chain.push(parent);
            id = parent;
        }
        let mut out = Vec::new();
        for id in chain.into_iter().rev() {
            out.extend_from_slice(&tree.node(id).name);
        }
        if out.last() == Some(&crate::tree::ANONYMOUS_SENTINEL) {
            out.pop();
        }
        Some(out)
    }

    /// Whether the name is *available*: matched, or an empty
    /// non-terminal under a known zone. Unavailable names are
    /// NXDOMAIN candidates.
    fn is_available(&self) -> bool {
        self.table.is_some() || (self.cut && !self.zones.is_empty())
    }

    fn is_dname_cut(&self) -> bool {
        match (self.tree, self.node) {
            (Some(tree), Some(id)) => self.cut && tree.is_dname(id),
            _ => false,
        }
    }

    /// Locates the handlers for `qtype`.
    ///
    /// A DNAME on a node reached through a cut shadows every other
    /// type; otherwise a CNAME shadows everything except queries for
    /// CNAME itself, RRSIG, and NSEC. `ANY` returns the whole table.
    /// For RRSIG queries the returned entries span all covered types;
    /// narrow them with [`Resolution::search_covered`].
    pub fn search(&self, qtype: Type) -> SearchOutcome<'a, H> {
        if let Some(table) = self.table {
            if qtype == Type::ANY {
                return SearchOutcome::Answer(table.entries());
            }

            if qtype != Type::RRSIG && qtype != Type::NSEC {
                if self.is_dname_cut() {
                    let entries = table.search(Type::DNAME);
                    return if qtype == Type::DNAME {
                        SearchOutcome::Answer(entries)
                    } else {
                        SearchOutcome::Redirect {
                            via: Type::DNAME,
                            entries,
                        }
                    };
                }

                let cname = table.search(Type::CNAME);
                if !cname.is_empty() {
                    return if qtype == Type::CNAME {
                        SearchOutcome::Answer(cname)
                    } else {
                        SearchOutcome::Redirect {
                            via: Type::CNAME,
                            entries: cname,
                        }
                    };
                }
            }

            let entries = table.search(qtype);
            if !entries.is_empty() {
                return SearchOutcome::Answer(entries);
            }
        }

        if self.is_available() {
            SearchOutcome::NoData
        } else {
            SearchOutcome::NameError
        }
    }

    /// The RRSIG second stage: the signatures covering `type_covered`.
    pub fn search_covered(&self, type_covered: Type) -> SearchOutcome<'a, H> {
        if let Some(table) = self.table {
            let rrsigs = table.search(Type::RRSIG);
            let entries = search_covered(rrsigs, type_covered);
            if !entries.is_empty() {
                return SearchOutcome::Answer(entries);
            }
        }

        if self.is_available() {
            SearchOutcome::NoData
        } else {
            SearchOutcome::NameError
        }
    }

    /// Pops the innermost zone milestone: a resolution backed by the
    /// enclosing zone node (with the parameters visible at that
    /// boundary), plus a flag that is true when the zone is delegated
    /// away (NS without SOA).
    pub fn zone(&self) -> Option<(Resolution<'a, H>, bool)> {
        let milestone = *self.zones.last()?;
        let tree = self.tree?;
        let zone_node = milestone.node?;

        let mut popped = self.clone();
        popped.zones.pop();
        popped.node = Some(zone_node);
        popped.table = tree.table(zone_node);
        popped.cut = false;
        let keep = milestone.params_len.min(self.params.len());
        popped.params = Params(self.params[self.params.len() - keep..].to_vec());

        let delegated = tree
            .node(zone_node)
            .data
            .as_ref()
            .map_or(true, |d| !d.flags.contains(RrFlags::SOA));
        Some((popped, delegated))
    }

    /// The predecessor of the queried name in the tree's canonical
    /// walk, for NSEC denial-of-existence synthesis. Only meaningful
    /// for [`Type::NSEC`]; NSEC3 owners are hashed and have no tree
    /// predecessor.
    pub fn next_secure(&self, nsec_type: Type) -> Option<Resolution<'a, H>> {
        if nsec_type != Type::NSEC {
            return None;
        }
        let tree = self.tree?;
        let zone = self.zones.last().and_then(|m| m.node);
        let previous = tree.previous_node(&self.name, self.node, self.nearest, zone)?;
        let table = tree.table(previous)?;

        let mut out = self.clone();
        out.node = Some(previous);
        out.table = Some(table);
        out.params = Params::default();
        out.cut = false;
        Some(out)
    }
}
