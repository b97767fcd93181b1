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

//! Per-node type tables.
//!
//! Every terminal node of the radix tree owns a [`TypeTable`]: the
//! registered handlers for that name, kept in `(qtype, type_covered)`
//! order so that the two range queries (by query type, and within an
//! RRSIG slice by covered type) are contiguous sub-slices found with
//! a binary search.

use crate::rr::Type;

/// One registered handler for a name.
///
/// `type_covered` is meaningful only when `qtype` is
/// [`Type::RRSIG`]; all other entries carry [`Type::NONE`]. `origin`
/// is the canonical origin the registration was made under and drives
/// the zone flagging of the owning node (see
/// [`RrFlags`](crate::RrFlags)); an empty origin originates
/// everywhere. The handler itself is opaque to the router. It is
/// optional: the tree accepts handler-less entries, while
/// [`Router::handle`](crate::Router::handle) requires one.
#[derive(Clone, Debug)]
pub struct TypeEntry<H> {
    pub origin: Vec<u8>,
    pub qtype: Type,
    pub type_covered: Type,
    pub handler: Option<H>,
}

impl<H> TypeEntry<H> {
    /// Creates an entry for `qtype` with the given handler and an
    /// empty origin.
    pub fn new(qtype: Type, handler: H) -> Self {
        Self {
            origin: Vec::new(),
            qtype,
            type_covered: Type::NONE,
            handler: Some(handler),
        }
    }

    /// Creates an RRSIG entry covering `type_covered`.
    pub fn rrsig(type_covered: Type, handler: H) -> Self {
        Self {
            origin: Vec::new(),
            qtype: Type::RRSIG,
            type_covered,
            handler: Some(handler),
        }
    }

    fn key(&self) -> (Type, Type) {
        (self.qtype, self.type_covered)
    }
}

/// An ordered collection of [`TypeEntry`] values belonging to one
/// node.
#[derive(Clone, Debug)]
pub struct TypeTable<H> {
    entries: Vec<TypeEntry<H>>,
}

impl<H> Default for TypeTable<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H> TypeTable<H> {
    /// All entries, in `(qtype, type_covered)` order.
    pub fn entries(&self) -> &[TypeEntry<H>] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the contiguous sub-slice of entries whose `qtype`
    /// equals `qtype` (empty if there are none).
    pub fn search(&self, qtype: Type) -> &[TypeEntry<H>] {
        let start = self.entries.partition_point(|e| e.qtype < qtype);
        let len = self.entries[start..]
            .iter()
            .take_while(|e| e.qtype == qtype)
            .count();
        &self.entries[start..start + len]
    }

    /// Inserts `entry`, keeping the table ordered. Entries with equal
    /// keys retain their insertion order.
    pub(crate) fn append(&mut self, entry: TypeEntry<H>) {
        let at = self.entries.partition_point(|e| e.key() <= entry.key());
        self.entries.insert(at, entry);
    }
}

/// Narrows a slice of RRSIG entries (as returned by
/// [`TypeTable::search`] for [`Type::RRSIG`]) to those covering
/// `type_covered`.
pub fn search_covered<H>(entries: &[TypeEntry<H>], type_covered: Type) -> &[TypeEntry<H>] {
    let start = entries.partition_point(|e| e.type_covered < type_covered);
    let len = entries[start..]
        .iter()
        .take_while(|e| e.type_covered == type_covered)
        .count();
    &entries[start..start + len]
}
