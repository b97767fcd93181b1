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

//! The canonical-order index used for NSEC denial of existence.
//!
//! [`CanonicalOrder`] keeps the indexable names registered with qtype
//! NSEC (or NSEC3) sorted under the canonical ordering of
//! [RFC 4034 § 6.1], extended with rules for the synthetic labels this
//! router supports:
//!
//! * a label starting with `*` (more than one byte, which includes the
//!   internal anonymous-wildcard label `*\x80`) sorts after any other
//!   label;
//! * a label starting with `:` sorts after any static label but
//!   before `*`;
//! * two `:` labels are equal at the label level; the decision is
//!   deferred to the remaining suffix, and if the suffixes tie as
//!   well, the name with fewer remaining labels sorts first;
//! * all other labels compare byte-wise.
//!
//! Because indexable names carry their labels outermost-first, this
//! label-by-label walk over the reversed form is exactly the
//! right-to-left label comparison RFC 4034 prescribes.
//!
//! [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1

/// Compares two indexable names under the extended RFC 4034 § 6.1
/// order; returns whether `x` sorts strictly before `y`.
pub fn canonical_order_less(x: &[u8], y: &[u8]) -> bool {
    let n_x = count_dots(x);
    let n_y = count_dots(y);

    let mut x = x;
    let mut y = y;
    for _ in 0..n_x.min(n_y) {
        let (xi, x_rest) = split_label(x);
        let (yi, y_rest) = split_label(y);
        x = x_rest;
        y = y_rest;

        if xi != yi {
            if is_catch_all(xi) {
                return false;
            }
            if is_catch_all(yi) {
                return true;
            }
            match (is_param(xi), is_param(yi)) {
                // Both parameters: equal here, defer to the suffix.
                (true, true) => continue,
                (true, false) => return false,
                (false, true) => return true,
                (false, false) => return xi < yi,
            }
        }
    }

    // The shorter name has run out of dots; compare the tails.
    if x != y {
        if is_catch_all(x) {
            return false;
        }
        if is_catch_all(y) {
            return true;
        }
        match (is_param(x), is_param(y)) {
            (true, true) => return n_x < n_y,
            (true, false) => return false,
            (false, true) => return true,
            (false, false) => {}
        }
    }
    x < y
}

fn is_catch_all(label: &[u8]) -> bool {
    label.len() > 1 && label[0] == b'*'
}

fn is_param(label: &[u8]) -> bool {
    label.len() > 1 && label[0] == b':'
}

fn count_dots(name: &[u8]) -> usize {
    name.iter().filter(|&&c| c == b'.').count()
}

/// Splits off the leading label (up to but excluding the first dot).
/// A name with no dot left is its own label and is not advanced.
fn split_label(name: &[u8]) -> (&[u8], &[u8]) {
    match name.iter().position(|&c| c == b'.') {
        Some(dot) => (&name[..dot], &name[dot + 1..]),
        None => (name, name),
    }
}

/// A sorted collection of indexable names, one per registered
/// NSEC/NSEC3 owner, answering "strictly previous name" queries.
#[derive(Clone, Debug, Default)]
pub struct CanonicalOrder {
    names: Vec<Vec<u8>>,
}

impl CanonicalOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// The names, in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &[u8]> {
        self.names.iter().map(Vec::as_slice)
    }

    /// Inserts `name` at its ordered position. Each name is kept at
    /// most once.
    pub fn insert(&mut self, name: Vec<u8>) {
        let at = self
            .names
            .partition_point(|n| canonical_order_less(n, &name));
        if self.names.get(at).map(Vec::as_slice) != Some(name.as_slice()) {
            self.names.insert(at, name);
        }
    }

    /// Returns the name immediately preceding `name` in canonical
    /// order, wrapping around to the last name when `name` sorts at or
    /// before the first element (NSEC forms a ring). The flag reports
    /// whether `name` itself is in the index. Returns [`None`] when
    /// the index is empty.
    pub fn previous(&self, name: &[u8]) -> Option<(&[u8], bool)> {
        if self.names.is_empty() {
            return None;
        }

        let i = self
            .names
            .partition_point(|n| canonical_order_less(n, name));
        let found = self.names.get(i).map(Vec::as_slice) == Some(name);
        let i = if i == 0 { self.names.len() } else { i };
        Some((&self.names[i - 1], found))
    }
}
