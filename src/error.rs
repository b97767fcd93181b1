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

//! Implementation of the [`RouteError`] type for registration errors.

use std::fmt;

/// Errors that arise while registering a route.
///
/// Registration errors are fatal to the registration call and are
/// surfaced synchronously to the registrar; they never leave the tree
/// in a state observable as partially updated. Registration is a
/// startup activity, so callers are expected to fail loudly.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum RouteError {
    /// A `:` or `*` wildcard marker is followed by a dot or by the end
    /// of the name, leaving the parameter unnamed.
    EmptyWildcardName,

    /// A single label contains more than one `:`/`*` wildcard marker.
    MultipleWildcardPerLabel,

    /// A `*` catch-all label is not the last label of the name (or the
    /// marker does not begin its label).
    CatchAllNotAtEnd,

    /// A new wildcard conflicts with an existing wildcard registered
    /// at the same position.
    WildcardConflict {
        /// The offending segment of the new name.
        segment: Vec<u8>,
        /// The full new name being registered.
        name: Vec<u8>,
        /// The existing wildcard label it collides with.
        existing: Vec<u8>,
        /// The existing prefix up to and including that wildcard.
        prefix: Vec<u8>,
    },

    /// A wildcard is inserted where static children already exist, or
    /// a static segment is inserted where a wildcard already claims
    /// the label.
    ChildConflict,

    /// The exact route already exists and duplicates were not allowed.
    DuplicateRoute,

    /// The name is empty or otherwise not a legal domain.
    IllegalDomain,

    /// The registration carried no handler.
    MissingHandler,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::EmptyWildcardName => {
                f.write_str("wildcards must be named with a non-empty name")
            }
            Self::MultipleWildcardPerLabel => {
                f.write_str("only one wildcard per name segment is allowed")
            }
            Self::CatchAllNotAtEnd => {
                f.write_str("catch-all wildcards are only allowed as the final label")
            }
            Self::WildcardConflict {
                segment,
                name,
                existing,
                prefix,
            } => write!(
                f,
                "'{}' in new name '{}' conflicts with existing wildcard '{}' in existing prefix '{}'",
                String::from_utf8_lossy(segment),
                String::from_utf8_lossy(name),
                String::from_utf8_lossy(existing),
                String::from_utf8_lossy(prefix),
            ),
            Self::ChildConflict => {
                f.write_str("route conflicts with existing children at the same position")
            }
            Self::DuplicateRoute => f.write_str("a handler is already registered for the name"),
            Self::IllegalDomain => f.write_str("illegal domain"),
            Self::MissingHandler => f.write_str("missing handler"),
        }
    }
}

impl std::error::Error for RouteError {}
