/// scriptforge compile driver
///
/// Compiles script sources into a loadable library module: scans the
/// sources for `using` imports, resolves them against an index of library
/// modules, runs a compiler backend, and reports its diagnostics.

pub mod backend;
pub mod config;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod host;
pub mod index;
pub mod process;
pub mod resolver;

pub use backend::{BackendInvocation, BackendOutput, CompiledModule, CompilerBackend};
pub use config::{BuildMode, ReferencePolicy};
pub use diagnostic::{CompilationFailure, Diagnostic, Severity};
pub use driver::{CompileOptions, Compiler};
pub use error::{BackendFault, CompileError, IndexError, LoadError, Result};
pub use host::{HostRuntime, StaticHost};
pub use index::{JsonMetadataLoader, LibraryModule, MetadataLoader, ModuleIndex, ModuleMetadata, TypeDecl};
pub use process::ProcessBackend;
pub use resolver::{ReferenceResolver, ReferenceSet, Resolution};
pub use scriptforge_scanner::{ImportScanner, NamespaceSet};
