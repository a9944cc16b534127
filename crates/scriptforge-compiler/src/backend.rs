/// Interface to the external compiler backend

use std::path::{Path, PathBuf};

use crate::diagnostic::Diagnostic;
use crate::error::BackendFault;

/// Everything the backend needs for one compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInvocation {
    /// Always false: only library modules are produced
    pub generate_executable: bool,
    pub include_debug_info: bool,
    /// Keep the compiled module in memory instead of writing `output_path`
    pub in_memory: bool,
    /// Destination of the module; `None` in in-memory mode
    pub output_path: Option<PathBuf>,
    pub references: Vec<PathBuf>,
    pub sources: Vec<PathBuf>,
}

/// A compiled, loadable module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledModule {
    /// Module image bytes
    pub image: Vec<u8>,
    /// Where the image was written, for disk-mode builds
    pub location: Option<PathBuf>,
}

impl CompiledModule {
    pub fn in_memory(image: Vec<u8>) -> Self {
        Self { image, location: None }
    }

    pub fn on_disk(image: Vec<u8>, location: impl Into<PathBuf>) -> Self {
        Self {
            image,
            location: Some(location.into()),
        }
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_empty()
    }
}

/// What a backend run produced.
#[derive(Debug, Clone, Default)]
pub struct BackendOutput {
    pub module: Option<CompiledModule>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BackendOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// A compiler that turns sources plus references into a module.
///
/// Compile errors in the sources are reported as diagnostics in
/// [`BackendOutput`]; `Err` is reserved for infrastructure faults.
pub trait CompilerBackend {
    fn compile(&self, invocation: &BackendInvocation) -> Result<BackendOutput, BackendFault>;
}

impl<B: CompilerBackend + ?Sized> CompilerBackend for &B {
    fn compile(&self, invocation: &BackendInvocation) -> Result<BackendOutput, BackendFault> {
        (**self).compile(invocation)
    }
}

impl<B: CompilerBackend + ?Sized> CompilerBackend for Box<B> {
    fn compile(&self, invocation: &BackendInvocation) -> Result<BackendOutput, BackendFault> {
        (**self).compile(invocation)
    }
}
