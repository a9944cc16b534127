/// Catalog of pre-built library modules available for referencing
///
/// The index is built once at startup by recursively scanning a root
/// directory, loading each library file in metadata-only mode. After
/// construction it is never mutated, so it can be shared freely between
/// compile requests.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::Deserialize;

use crate::error::{IndexError, LoadError};

/// Default file extension of library modules.
pub const DEFAULT_MODULE_EXTENSION: &str = "dll";

/// A type declared by a library module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Declaring namespace; `None` for types in the global namespace
    #[serde(default)]
    pub namespace: Option<String>,
}

impl TypeDecl {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }
}

/// The metadata view of a module: its type table, without any code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

/// Loads the metadata of a library file without executing anything in it.
pub trait MetadataLoader {
    fn load(&self, path: &Path) -> Result<ModuleMetadata, LoadError>;
}

/// Reads JSON module images.
///
/// An image looks like `{"name": "...", "types": [...], "code": ...}`. Only
/// the name and type table are deserialized; the code payload is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMetadataLoader;

impl MetadataLoader for JsonMetadataLoader {
    fn load(&self, path: &Path) -> Result<ModuleMetadata, LoadError> {
        let file = std::fs::File::open(path)?;
        let metadata = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(metadata)
    }
}

/// A library module known to the index.
#[derive(Debug)]
pub struct LibraryModule {
    location: PathBuf,
    metadata: ModuleMetadata,
    namespaces: OnceLock<BTreeSet<String>>,
}

impl LibraryModule {
    pub fn new(location: impl Into<PathBuf>, metadata: ModuleMetadata) -> Self {
        Self {
            location: location.into(),
            metadata,
            namespaces: OnceLock::new(),
        }
    }

    /// Filesystem location; the module's identity
    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.metadata.types
    }

    /// Namespaces of all declared types, computed on first access
    pub fn namespaces(&self) -> &BTreeSet<String> {
        self.namespaces.get_or_init(|| {
            self.metadata
                .types
                .iter()
                .filter_map(|t| t.namespace.clone())
                .collect()
        })
    }

    pub fn exports(&self, namespace: &str) -> bool {
        self.namespaces().contains(namespace)
    }
}

/// A library file that could not be loaded and was left out of the index.
#[derive(Debug)]
pub struct SkippedModule {
    pub path: PathBuf,
    pub reason: LoadError,
}

/// Immutable catalog of library modules.
#[derive(Debug, Default)]
pub struct ModuleIndex {
    modules: Vec<LibraryModule>,
    by_namespace: HashMap<String, Vec<usize>>,
    skipped: Vec<SkippedModule>,
}

impl ModuleIndex {
    /// Index every `.dll` JSON module image under `root`
    pub fn build(root: impl AsRef<Path>) -> Result<Self, IndexError> {
        Self::build_with(root, DEFAULT_MODULE_EXTENSION, &JsonMetadataLoader)
    }

    /// Index every file with `extension` under `root`, using `loader` for metadata
    pub fn build_with(
        root: impl AsRef<Path>,
        extension: &str,
        loader: &dyn MetadataLoader,
    ) -> Result<Self, IndexError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(IndexError::RootNotFound(root.to_path_buf()));
        }

        let mut paths = Vec::new();
        collect_module_files(root, extension, &mut paths, true)?;
        paths.sort();

        let mut modules = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();

        for path in paths {
            match loader.load(&path) {
                Ok(metadata) => modules.push(LibraryModule::new(path, metadata)),
                Err(reason) => {
                    tracing::warn!("Skipping library module {}: {}", path.display(), reason);
                    skipped.push(SkippedModule { path, reason });
                }
            }
        }

        let mut index = Self::from_modules(modules);
        index.skipped = skipped;

        tracing::info!(
            "Indexed {} library modules under {} ({} skipped)",
            index.len(),
            root.display(),
            index.skipped.len()
        );

        Ok(index)
    }

    /// Build an index from already loaded modules, preserving their order
    pub fn from_modules(modules: Vec<LibraryModule>) -> Self {
        let mut by_namespace: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, module) in modules.iter().enumerate() {
            for namespace in module.namespaces() {
                by_namespace.entry(namespace.clone()).or_default().push(position);
            }
        }

        Self {
            modules,
            by_namespace,
            skipped: Vec::new(),
        }
    }

    /// All indexed modules, in index order
    pub fn modules(&self) -> &[LibraryModule] {
        &self.modules
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn get(&self, location: &Path) -> Option<&LibraryModule> {
        self.modules.iter().find(|m| m.location == location)
    }

    /// Modules exporting `namespace`, in index order
    pub fn exporters<'a>(&'a self, namespace: &str) -> impl Iterator<Item = &'a LibraryModule> + 'a {
        self.by_namespace
            .get(namespace)
            .into_iter()
            .flatten()
            .map(move |&position| &self.modules[position])
    }

    /// The first module in index order exporting `namespace`
    pub fn first_exporter(&self, namespace: &str) -> Option<&LibraryModule> {
        self.exporters(namespace).next()
    }

    /// Files that were found but could not be loaded
    pub fn skipped(&self) -> &[SkippedModule] {
        &self.skipped
    }
}

/// Recursively collect files with the given extension
fn collect_module_files(
    dir: &Path,
    extension: &str,
    paths: &mut Vec<PathBuf>,
    is_root: bool,
) -> Result<(), IndexError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) if is_root => {
            return Err(IndexError::ReadDir {
                path: dir.to_path_buf(),
                source,
            });
        }
        Err(e) => {
            tracing::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
            return Ok(());
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_module_files(&path, extension, paths, false)?;
        } else if has_extension(&path, extension) {
            paths.push(path);
        }
    }

    Ok(())
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
