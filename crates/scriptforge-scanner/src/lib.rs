//! Import scanner for script sources.
//!
//! Extracts the namespaces a source file declares with `using Some.Namespace;`.
//! This is a line-oriented textual heuristic, not a parser: it never fails on
//! malformed input, and it does not reconstruct statements that span lines.
//! For an alias (`using IO = System.IO;`) the aliased name is recorded.
//! Static imports (`using static System.Math;`) are not recognized.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static USING_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\busing\s+(?:[A-Za-z_][A-Za-z0-9_]*\s*=\s*)?([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*;",
    )
    .expect("using-declaration pattern is valid")
});

/// A set of distinct namespace names collected from one or more sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceSet {
    names: BTreeSet<String>,
}

impl NamespaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a namespace, returning false if it was already present
    pub fn insert(&mut self, namespace: impl Into<String>) -> bool {
        self.names.insert(namespace.into())
    }

    /// Merge another set into this one
    pub fn merge(&mut self, other: NamespaceSet) {
        self.names.extend(other.names);
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.names.contains(namespace)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate namespaces in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for NamespaceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for NamespaceSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

impl IntoIterator for NamespaceSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

/// Scans source text for `using` declarations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportScanner;

impl ImportScanner {
    pub fn new() -> Self {
        Self
    }

    /// Collect the namespaces declared in `source`
    pub fn scan(&self, source: &str) -> NamespaceSet {
        let mut namespaces = NamespaceSet::new();
        for line in source.lines() {
            self.scan_line(line, &mut namespaces);
        }
        namespaces
    }

    /// Read a source file and collect its declared namespaces
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn scan_file(&self, path: impl AsRef<Path>) -> io::Result<NamespaceSet> {
        let bytes = std::fs::read(path)?;
        Ok(self.scan(&String::from_utf8_lossy(&bytes)))
    }

    fn scan_line(&self, line: &str, namespaces: &mut NamespaceSet) {
        for captures in USING_DECL.captures_iter(line) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            // Only count declarations in statement position, so that
            // `foo.using X;` or `// using X;` do not register.
            let before = line[..whole.start()].trim_end();
            let at_statement_start =
                before.is_empty() || before.ends_with(';') || before.ends_with('{') || before.ends_with('}');

            if at_statement_start {
                namespaces.insert(name.as_str());
            }
        }
    }
}

/// Scan `source` with the default scanner.
pub fn scan(source: &str) -> NamespaceSet {
    ImportScanner::new().scan(source)
}
