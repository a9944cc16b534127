/// Compiler driver that orchestrates a compile request

use std::path::{Path, PathBuf};

use scriptforge_scanner::{ImportScanner, NamespaceSet};

use crate::backend::{BackendInvocation, CompiledModule, CompilerBackend};
use crate::config::{BuildMode, ReferencePolicy};
use crate::diagnostic::CompilationFailure;
use crate::error::{CompileError, Result};
use crate::host::HostRuntime;
use crate::index::ModuleIndex;
use crate::resolver::{ReferenceResolver, Resolution};

/// Options for compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    /// Debug (disk, debug info) or release (in memory) output
    pub build_mode: BuildMode,
    /// Whether matched index modules are referenced
    pub reference_policy: ReferencePolicy,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with the build mode taken from the environment
    pub fn from_env() -> Self {
        Self::new().build_mode(BuildMode::from_env())
    }

    pub fn build_mode(mut self, mode: BuildMode) -> Self {
        self.build_mode = mode;
        self
    }

    pub fn reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }
}

/// Compiles script sources into a library module.
///
/// Borrows the process-wide [`ModuleIndex`]; every call works on its own
/// namespace and reference sets.
pub struct Compiler<'a, B, H> {
    index: &'a ModuleIndex,
    backend: B,
    host: H,
    scanner: ImportScanner,
    options: CompileOptions,
}

impl<'a, B, H> Compiler<'a, B, H>
where
    B: CompilerBackend,
    H: HostRuntime,
{
    pub fn new(index: &'a ModuleIndex, backend: B, host: H, options: CompileOptions) -> Self {
        Self {
            index,
            backend,
            host,
            scanner: ImportScanner::new(),
            options,
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `sources` into a library module at `output_path`
    ///
    /// In release mode the module stays in memory and `output_path` is
    /// not written.
    pub fn compile<S: AsRef<Path>>(&self, output_path: impl AsRef<Path>, sources: &[S]) -> Result<CompiledModule> {
        let output_path = output_path.as_ref();
        if sources.is_empty() {
            return Err(CompileError::NoSources);
        }

        tracing::info!(
            "Compiling {} sources into {} ({} build)",
            sources.len(),
            output_path.display(),
            self.options.build_mode
        );

        let resolution = self.resolve_sources(sources)?;
        let references = resolution.reference_set(self.options.reference_policy);

        let mode = self.options.build_mode;
        let invocation = BackendInvocation {
            generate_executable: false,
            include_debug_info: mode.include_debug_info(),
            in_memory: mode.in_memory(),
            output_path: (!mode.in_memory()).then(|| output_path.to_path_buf()),
            references: references.into_vec(),
            sources: sources.iter().map(|s| s.as_ref().to_path_buf()).collect(),
        };

        if !invocation.in_memory {
            ensure_parent_dir(output_path)?;
        }

        let output = self.backend.compile(&invocation)?;
        let has_errors = output.has_errors();

        match output.module {
            Some(module) if !has_errors && !module.is_empty() => {
                tracing::info!("Compiled {} bytes", module.image.len());
                Ok(module)
            }
            _ => {
                let failure = CompilationFailure::new(output.diagnostics);
                tracing::debug!("Compilation failed with {} errors", failure.error_count());
                Err(CompileError::Compilation(failure))
            }
        }
    }

    /// Scan `sources` and resolve their imports against the index
    pub fn resolve_sources<S: AsRef<Path>>(&self, sources: &[S]) -> Result<Resolution> {
        let namespaces = self.scan_sources(sources)?;
        let loaded = self.host.loaded_modules();
        let resolution = ReferenceResolver::new(self.index).resolve(&namespaces, &loaded);

        if !resolution.unresolved.is_empty() {
            tracing::debug!("Unresolved namespaces: {}", resolution.unresolved.join(", "));
        }

        Ok(resolution)
    }

    /// Collect the namespaces imported by all `sources`
    pub fn scan_sources<S: AsRef<Path>>(&self, sources: &[S]) -> Result<NamespaceSet> {
        let mut namespaces = NamespaceSet::new();
        for source in sources {
            let path = source.as_ref();
            let found = self
                .scanner
                .scan_file(path)
                .map_err(|e| CompileError::source_read(path, e))?;
            namespaces.merge(found);
        }
        Ok(namespaces)
    }
}

/// Create the directory that will hold `output_path`
fn ensure_parent_dir(output_path: &Path) -> Result<()> {
    let Some(dir) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    std::fs::create_dir_all(dir).map_err(|e| CompileError::output_dir(PathBuf::from(dir), e))
}
