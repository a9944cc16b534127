//! Reference resolution: which library modules a compile should reference.
//!
//! Each imported namespace is looked up in the index's namespace table and
//! the first exporting module (in index order) is selected. All working
//! state is local to one call, so the shared index is only ever read.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use scriptforge_scanner::NamespaceSet;

use crate::config::ReferencePolicy;
use crate::index::ModuleIndex;

/// De-duplicated list of module locations handed to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    locations: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location, returning false if it was already present
    pub fn insert(&mut self, location: impl Into<PathBuf>) -> bool {
        let location = location.into();
        if self.seen.contains(&location) {
            return false;
        }
        self.seen.insert(location.clone());
        self.locations.push(location);
        true
    }

    pub fn contains(&self, location: impl AsRef<Path>) -> bool {
        self.seen.contains(location.as_ref())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Locations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.locations.iter().map(PathBuf::as_path)
    }

    pub fn into_vec(self) -> Vec<PathBuf> {
        self.locations
    }
}

impl<P: Into<PathBuf>> Extend<P> for ReferenceSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for location in iter {
            self.insert(location);
        }
    }
}

/// Outcome of resolving one request's namespaces.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Modules loaded by the host runtime
    pub loaded: Vec<PathBuf>,
    /// Index modules selected for an imported namespace
    pub matched: Vec<PathBuf>,
    /// Imported namespaces no indexed module exports
    pub unresolved: Vec<String>,
}

impl Resolution {
    /// Build the final reference list under `policy`
    pub fn reference_set(&self, policy: ReferencePolicy) -> ReferenceSet {
        let mut references = ReferenceSet::new();
        references.extend(self.loaded.iter().cloned());
        if policy == ReferencePolicy::LoadedAndMatched {
            references.extend(self.matched.iter().cloned());
        }
        references
    }
}

/// Resolves namespaces against a [`ModuleIndex`].
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    index: &'a ModuleIndex,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(index: &'a ModuleIndex) -> Self {
        Self { index }
    }

    pub fn resolve(&self, namespaces: &NamespaceSet, loaded: &[PathBuf]) -> Resolution {
        let started = Instant::now();

        let mut selected = HashSet::new();
        let mut matched = Vec::new();
        let mut unresolved = Vec::new();

        for namespace in namespaces.iter() {
            match self.index.first_exporter(namespace) {
                Some(module) => {
                    if selected.insert(module.location()) {
                        matched.push(module.location().to_path_buf());
                    }
                }
                None => {
                    tracing::debug!("No indexed module exports namespace '{}'", namespace);
                    unresolved.push(namespace.to_string());
                }
            }
        }

        tracing::debug!(
            "Resolved {} namespaces to {} modules in {:?}",
            namespaces.len(),
            matched.len(),
            started.elapsed()
        );

        Resolution {
            loaded: loaded.to_vec(),
            matched,
            unresolved,
        }
    }
}

/// Resolve `namespaces` and return loaded plus matched modules.
pub fn resolve(namespaces: &NamespaceSet, index: &ModuleIndex, loaded: &[PathBuf]) -> ReferenceSet {
    ReferenceResolver::new(index)
        .resolve(namespaces, loaded)
        .reference_set(ReferencePolicy::LoadedAndMatched)
}
