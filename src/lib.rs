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

//! An authoritative, zone-aware DNS request-router core.
//!
//! `junction` dispatches domain names to registered handlers through a
//! compressed radix tree keyed by *indexable* names: label-reversed,
//! lowercased domain names with a leading `.` sentinel (see
//! [`name`]). On top of the plain static routes of [RFC 1034], the
//! tree supports:
//!
//! * named parameters (`:user` matches one label) and named catch-alls
//!   (`*rest` captures the remaining labels), in the tradition of HTTP
//!   router route syntax;
//! * anonymous [RFC 4592] wildcards (`*.example.org.`), consulted only
//!   when no static or named branch matches;
//! * zone milestones (NS/SOA owners crossed during the descent) and
//!   DNAME cuts, so callers can detect delegation and redirection;
//! * a canonical-order index ([RFC 4034 § 6.1] extended for synthetic
//!   labels) and a tree-walk predecessor, for NSEC
//!   denial-of-existence synthesis.
//!
//! The crate is a passive library: registration via
//! [`Router::handle`] is a startup activity, after which any number of
//! threads may call [`Router::lookup`] concurrently. Handlers are
//! opaque to the core; [`Router`] is generic over the handler type.
//!
//! The wire protocol, middleware, zone-file parsing and transports are
//! external collaborators and are not part of this crate.
//!
//! [RFC 1034]: https://datatracker.ietf.org/doc/html/rfc1034
//! [RFC 4034 § 6.1]: https://datatracker.ietf.org/doc/html/rfc4034#section-6.1
//! [RFC 4592]: https://datatracker.ietf.org/doc/html/rfc4592

mod class;
mod error;
pub mod name;
mod order;
mod resolution;
mod router;
mod rr;
mod table;
mod tree;
mod util;

pub use class::Class;
pub use error::RouteError;
pub use order::{canonical_order_less, CanonicalOrder};
pub use resolution::{Param, Params, Resolution, SearchOutcome};
pub use router::Router;
pub use rr::{RrFlags, Type};
pub use table::{search_covered, TypeEntry, TypeTable};
pub use tree::{Tree, Value};
