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

//! The router: the registration and lookup facade composing the
//! indexable-name canonicalisation, the per-class radix trees, the
//! per-node type tables and the canonical-order indices.

use std::collections::HashMap;

use log::debug;

use crate::class::Class;
use crate::error::RouteError;
use crate::name::{is_indexable, reversed, to_indexable};
use crate::order::CanonicalOrder;
use crate::resolution::Resolution;
use crate::table::TypeEntry;
use crate::tree::{decorate, Tree};
use crate::Type;

/// An authoritative DNS request router.
///
/// The router owns one radix tree and one pair of canonical-order
/// indices (NSEC and NSEC3) per DNS class. Handlers are opaque: the
/// router is generic over the handler type `H` and never inspects it.
///
/// Registration through [`Router::handle`] is a startup activity and
/// is not safe against concurrent use; once registration is done, any
/// number of threads may run [`Router::lookup`] concurrently.
pub struct Router<H> {
    trees: HashMap<Class, Tree<H>>,
    nsec_names: HashMap<Class, CanonicalOrder>,
    nsec3_names: HashMap<Class, CanonicalOrder>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
            nsec_names: HashMap::new(),
            nsec3_names: HashMap::new(),
        }
    }

    /// Registers a handler for `qtype` at `name`.
    ///
    /// The name may be given in presentation form (`www.example.org.`,
    /// fully qualified or not) or already in indexable form (leading
    /// `.`); the form is auto-detected. Duplicate registrations append
    /// to the existing type table.
    pub fn handle(
        &mut self,
        name: impl AsRef<[u8]>,
        class: Class,
        qtype: Type,
        handler: H,
    ) -> Result<(), RouteError> {
        self.handle_entry(name, class, TypeEntry::new(qtype, handler))
    }

    /// Registers a complete [`TypeEntry`] (carrying origin and, for
    /// RRSIG, the covered type) at `name`.
    pub fn handle_entry(
        &mut self,
        name: impl AsRef<[u8]>,
        class: Class,
        mut entry: TypeEntry<H>,
    ) -> Result<(), RouteError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(RouteError::IllegalDomain);
        }
        if entry.handler.is_none() {
            return Err(RouteError::MissingHandler);
        }
        if !entry.origin.is_empty() && !is_indexable(&entry.origin) {
            entry.origin = to_indexable(&entry.origin);
        }

        let indexable_name = decorate(&to_indexable(name));
        let qtype = entry.qtype;
        self.trees
            .entry(class)
            .or_default()
            .add_route(&indexable_name, true, entry)?;

        if qtype == Type::NSEC {
            self.nsec_names
                .entry(class)
                .or_default()
                .insert(indexable_name.clone());
        } else if qtype == Type::NSEC3 {
            self.nsec3_names
                .entry(class)
                .or_default()
                .insert(indexable_name.clone());
        }

        debug!(
            "registered {} {} route {:?}",
            class,
            qtype,
            String::from_utf8_lossy(&indexable_name),
        );
        Ok(())
    }

    /// Looks up `name` within `class`. Never fails: an unregistered
    /// class or name yields a resolution that reports
    /// [`NameError`](crate::SearchOutcome::NameError) for every
    /// search.
    pub fn lookup(&self, name: impl AsRef<[u8]>, class: Class) -> Resolution<'_, H> {
        let canonical = to_indexable(name.as_ref());
        match self.trees.get(&class) {
            Some(tree) => {
                let value = tree.get_value(&canonical);
                Resolution::from_value(canonical, value)
            }
            None => Resolution::unmatched(canonical),
        }
    }

    /// The name canonically preceding `name` among the registered
    /// NSEC (or NSEC3) owners of `class`, in indexable form, wrapping
    /// around at the start of the ring. The flag reports whether
    /// `name` itself is registered. [`None`] when the index is empty
    /// or `nsec_type` is not NSEC/NSEC3.
    pub fn nsec_previous(
        &self,
        name: impl AsRef<[u8]>,
        class: Class,
        nsec_type: Type,
    ) -> Option<(&[u8], bool)> {
        let index = match nsec_type {
            Type::NSEC => self.nsec_names.get(&class)?,
            Type::NSEC3 => self.nsec3_names.get(&class)?,
            _ => return None,
        };
        let canonical = decorate(&to_indexable(name.as_ref()));
        index.previous(&canonical)
    }

    /// Reconstructs the stored-case spelling of `name` in the class
    /// tree, matching case-insensitively. The input keeps its case
    /// (only the label order is normalised), so a mixed-case query can
    /// recover the registered spelling.
    pub fn case_corrected(
        &self,
        name: impl AsRef<[u8]>,
        class: Class,
    ) -> Option<(Vec<u8>, bool)> {
        let tree = self.trees.get(&class)?;
        Some(tree.find_case_insensitive(&reversed(name.as_ref())))
    }

    /// The radix tree serving `class`, if any route was registered
    /// under it.
    pub fn tree(&self, class: Class) -> Option<&Tree<H>> {
        self.trees.get(&class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(routes: &[(&'static str, Type)]) -> Router<&'static str> {
        let mut router = Router::new();
        for &(name, qtype) in routes {
            router
                .handle(name, Class::IN, qtype, name)
                .unwrap_or_else(|e| panic!("registering {:?}: {}", name, e));
        }
        router
    }

    #[test]
    fn routes_presentation_names() {
        let router = router(&[("www.example.org.", Type::A)]);

        let found = router.lookup("www.example.org.", Class::IN);
        assert!(found.is_match());
        assert_eq!(found.entries()[0].handler, Some("www.example.org."));

        // Case folds at the boundary, and the FQDN dot is optional.
        assert!(router.lookup("WWW.Example.ORG.", Class::IN).is_match());
        assert!(router.lookup("www.example.org", Class::IN).is_match());

        // Unknown names and classes never match.
        assert!(!router.lookup("mail.example.org.", Class::IN).is_match());
        assert!(!router.lookup("www.example.org.", Class::CH).is_match());
    }

    #[test]
    fn captures_parameters_outermost_first() {
        let router = router(&[(":a.:b.org.", Type::A)]);

        let found = router.lookup("www.example.org.", Class::IN);
        assert!(found.is_match());
        let params = found.params();
        assert_eq!(params.by_name(b"a"), Some(b"www" as &[u8]));
        assert_eq!(params.by_name(b"b"), Some(b"example" as &[u8]));
        assert_eq!(params[0].value, b"www");
        assert_eq!(params[1].value, b"example");
        assert_eq!(params.by_name(b"nokey"), None);
    }

    #[test]
    fn rejects_bad_registrations() {
        let mut router: Router<&str> = Router::new();
        assert_eq!(
            router.handle("", Class::IN, Type::A, "x"),
            Err(RouteError::IllegalDomain),
        );

        let entry: TypeEntry<&str> = TypeEntry {
            origin: Vec::new(),
            qtype: Type::A,
            type_covered: Type::NONE,
            handler: None,
        };
        assert_eq!(
            router.handle_entry("example.org.", Class::IN, entry),
            Err(RouteError::MissingHandler),
        );

        router.handle(":x.example.org.", Class::IN, Type::A, "x").unwrap();
        // Duplicates are always allowed at the router level ...
        router.handle(":x.example.org.", Class::IN, Type::A, "x").unwrap();
        router.handle("x.:x.example.org.", Class::IN, Type::A, "x").unwrap();
        // ... but conflicting wildcards are not.
        assert!(matches!(
            router.handle(":y.example.org.", Class::IN, Type::A, "x"),
            Err(RouteError::WildcardConflict { .. }),
        ));
    }

    #[test]
    fn nsec_previous_walks_the_ring() {
        let router = router(&[
            ("example.", Type::NSEC),
            ("a.example.", Type::NSEC),
            ("z.example.", Type::NSEC),
            ("a.example.", Type::A),
        ]);

        let (prev, found) = router
            .nsec_previous("a.example.", Class::IN, Type::NSEC)
            .unwrap();
        assert!(found);
        assert_eq!(prev, b".example");

        // Unregistered names report the immediately smaller owner.
        let (prev, found) = router
            .nsec_previous("b.example.", Class::IN, Type::NSEC)
            .unwrap();
        assert!(!found);
        assert_eq!(prev, b".example.a");

        // The minimum wraps to the maximum.
        let (prev, found) = router
            .nsec_previous("example.", Class::IN, Type::NSEC)
            .unwrap();
        assert!(found);
        assert_eq!(prev, b".example.z");

        // No NSEC3 owners were registered.
        assert_eq!(
            router.nsec_previous("a.example.", Class::IN, Type::NSEC3),
            None,
        );
    }

    #[test]
    fn nsec_wildcard_owners_sort_last() {
        let router = router(&[
            ("example.", Type::NSEC),
            ("z.example.", Type::NSEC),
            ("*.example.", Type::NSEC),
        ]);

        // The anonymous wildcard owner is the ring maximum, so it
        // precedes the apex.
        let (prev, _) = router
            .nsec_previous("example.", Class::IN, Type::NSEC)
            .unwrap();
        assert_eq!(prev, b".example.*\x80");
    }

    #[test]
    fn corrects_case_against_the_stored_tree() {
        // Registration folds case at the boundary, so the stored
        // spellings are lowercase; completion recovers them from
        // queries of any case.
        let router = router(&[
            ("www.example.org.", Type::A),
            ("MAIL.example.org.", Type::A),
        ]);

        let (corrected, found) = router
            .case_corrected("WWW.EXAMPLE.ORG.", Class::IN)
            .unwrap();
        assert!(found);
        assert_eq!(corrected, b".org.example.www");

        let (corrected, found) = router
            .case_corrected("MaIl.ExAmPlE.oRg.", Class::IN)
            .unwrap();
        assert!(found);
        assert_eq!(corrected, b".org.example.mail");

        let (_, found) = router.case_corrected("gone.example.org.", Class::IN).unwrap();
        assert!(!found);
    }
}
