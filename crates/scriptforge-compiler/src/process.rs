//! Backend that runs an external command-line compiler.
//!
//! The compiler is driven with csc-style switches (`-target:library`,
//! `-debug`, `-out:`, `-r:`) and its console output is parsed for
//! diagnostics of the form `file(line,col): error CODE: message`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::backend::{BackendInvocation, BackendOutput, CompiledModule, CompilerBackend};
use crate::diagnostic::{Diagnostic, RELATED_SYMBOL_MARKER, Severity};
use crate::error::BackendFault;

static LOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<file>.+?)\((?P<line>\d+),(?P<column>\d+)\)\s*:\s*(?P<severity>error|warning)\s+(?P<code>\w+)\s*:\s*(?P<message>.*)$",
    )
    .expect("located diagnostic pattern is valid")
});

static UNLOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<severity>error|warning)\s+(?P<code>\w+)\s*:\s*(?P<message>.*)$")
        .expect("unlocated diagnostic pattern is valid")
});

static RELATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<file>.+?)\((?P<line>\d+),(?P<column>\d+)\)\s*:\s*(?P<message>.*)$")
        .expect("related location pattern is valid")
});

/// Name of the module file produced for in-memory builds.
const IN_MEMORY_MODULE_NAME: &str = "module.dll";

/// Runs a compiler executable such as `csc` or `mcs`.
#[derive(Debug, Clone)]
pub struct ProcessBackend {
    program: String,
    extra_args: Vec<String>,
}

impl ProcessBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Pass an extra argument ahead of the generated switches
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command-line arguments for `invocation`, writing the module to `output`
    pub fn arguments(&self, invocation: &BackendInvocation, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.extra_args.iter().map(OsString::from).collect();

        let target = if invocation.generate_executable { "exe" } else { "library" };
        args.push(format!("-target:{}", target).into());
        args.push(if invocation.include_debug_info { "-debug" } else { "-debug-" }.into());
        args.push(prefixed("-out:", output));

        for reference in &invocation.references {
            args.push(prefixed("-r:", reference));
        }

        args.extend(invocation.sources.iter().map(|s| s.as_os_str().to_os_string()));
        args
    }
}

impl CompilerBackend for ProcessBackend {
    fn compile(&self, invocation: &BackendInvocation) -> Result<BackendOutput, BackendFault> {
        // Holds the scratch directory for in-memory builds until the image is read.
        let scratch = if invocation.in_memory {
            Some(tempfile::tempdir()?)
        } else {
            None
        };

        let output_path: PathBuf = match (&scratch, &invocation.output_path) {
            (Some(dir), _) => dir.path().join(IN_MEMORY_MODULE_NAME),
            (None, Some(path)) => path.clone(),
            (None, None) => {
                return Err(BackendFault::InvalidConfiguration(
                    "disk-mode compile requires an output path".to_string(),
                ));
            }
        };

        // A module left over from an earlier build must never be mistaken for this one.
        remove_stale_module(&output_path)?;

        tracing::debug!(
            "Running {} with {} sources and {} references",
            self.program,
            invocation.sources.len(),
            invocation.references.len()
        );

        let output = Command::new(&self.program)
            .args(self.arguments(invocation, &output_path))
            .output()
            .map_err(|source| BackendFault::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        let mut diagnostics = parse_diagnostics(&stdout);
        diagnostics.extend(parse_diagnostics(&stderr));

        if !output.status.success() && diagnostics.is_empty() {
            return Err(BackendFault::ProcessFailed {
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        let has_errors = diagnostics.iter().any(Diagnostic::is_error);
        let module = if has_errors || !output.status.success() {
            tracing::debug!("Compiler exited with {}", output.status);
            None
        } else {
            read_module(&output_path, scratch.is_some())?
        };

        Ok(BackendOutput { module, diagnostics })
    }
}

fn remove_stale_module(path: &Path) -> Result<(), BackendFault> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn read_module(path: &Path, in_memory: bool) -> Result<Option<CompiledModule>, BackendFault> {
    let image = match std::fs::read(path) {
        Ok(image) => image,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if in_memory {
        Ok(Some(CompiledModule::in_memory(image)))
    } else {
        Ok(Some(CompiledModule::on_disk(image, path)))
    }
}

fn prefixed(prefix: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(path.as_os_str());
    arg
}

/// Parse compiler console output into diagnostics.
///
/// Lines that are not diagnostics are ignored. A bare location whose
/// message is the related-symbol marker inherits the severity and code of
/// the diagnostic before it.
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    for line in output.lines() {
        if let Some(caps) = LOCATED.captures(line) {
            diagnostics.push(Diagnostic {
                file: PathBuf::from(&caps["file"]),
                line: caps["line"].parse().unwrap_or(0),
                column: caps["column"].parse().unwrap_or(0),
                severity: severity(&caps["severity"]),
                code: caps["code"].to_string(),
                message: caps["message"].trim_end().to_string(),
            });
        } else if let Some(caps) = UNLOCATED.captures(line) {
            diagnostics.push(Diagnostic {
                file: PathBuf::new(),
                line: 0,
                column: 0,
                severity: severity(&caps["severity"]),
                code: caps["code"].to_string(),
                message: caps["message"].trim_end().to_string(),
            });
        } else if let Some(caps) = RELATED.captures(line) {
            if !caps["message"].contains(RELATED_SYMBOL_MARKER) {
                continue;
            }
            let (severity, code) = diagnostics
                .last()
                .map(|prev| (prev.severity, prev.code.clone()))
                .unwrap_or((Severity::Error, String::new()));
            diagnostics.push(Diagnostic {
                file: PathBuf::from(&caps["file"]),
                line: caps["line"].parse().unwrap_or(0),
                column: caps["column"].parse().unwrap_or(0),
                severity,
                code,
                message: caps["message"].trim_end().to_string(),
            });
        }
    }

    diagnostics
}

fn severity(text: &str) -> Severity {
    if text == "warning" {
        Severity::Warning
    } else {
        Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(in_memory: bool) -> BackendInvocation {
        BackendInvocation {
            generate_executable: false,
            include_debug_info: !in_memory,
            in_memory,
            output_path: if in_memory { None } else { Some(PathBuf::from("out/Game.dll")) },
            references: vec![PathBuf::from("/host/Engine.dll")],
            sources: vec![PathBuf::from("A.cs"), PathBuf::from("B.cs")],
        }
    }

    #[test]
    fn test_arguments_debug_build() {
        let backend = ProcessBackend::new("csc").arg("-nologo");
        let args = backend.arguments(&invocation(false), Path::new("out/Game.dll"));
        let args: Vec<_> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(
            args,
            vec![
                "-nologo",
                "-target:library",
                "-debug",
                "-out:out/Game.dll",
                "-r:/host/Engine.dll",
                "A.cs",
                "B.cs",
            ]
        );
    }

    #[test]
    fn test_arguments_release_build() {
        let backend = ProcessBackend::new("csc");
        let args = backend.arguments(&invocation(true), Path::new("/tmp/x/module.dll"));
        assert_eq!(args[1], OsString::from("-debug-"));
    }

    #[test]
    fn test_parse_located_diagnostics() {
        let output = "Microsoft (R) Visual C# Compiler\n\
                      A.cs(3,14): error CS1002: ; expected\n\
                      B.cs(10,1): warning CS0168: The variable 'e' is declared but never used\n";
        let diagnostics = parse_diagnostics(output);

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0], Diagnostic::error("A.cs", 3, 14, "CS1002", "; expected"));
        assert_eq!(diagnostics[1].severity, Severity::Warning);
        assert_eq!(diagnostics[1].line, 10);
    }

    #[test]
    fn test_parse_unlocated_diagnostic() {
        let diagnostics = parse_diagnostics("error CS2001: Source file 'Missing.cs' could not be found\n");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "CS2001");
        assert_eq!(diagnostics[0].line, 0);
    }

    #[test]
    fn test_parse_related_location() {
        let output = format!(
            "A.cs(5,9): error CS0111: Type 'A' already defines a member called 'Run'\nA.cs(2,9): {}\n",
            RELATED_SYMBOL_MARKER
        );
        let diagnostics = parse_diagnostics(&output);

        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics[1].is_related_location());
        assert_eq!(diagnostics[1].code, "CS0111");
        assert_eq!(diagnostics[1].line, 2);
    }

    #[test]
    fn test_missing_program_is_a_fault() {
        let backend = ProcessBackend::new("scriptforge-no-such-compiler-xyz");
        let result = backend.compile(&invocation(true));
        assert!(matches!(result, Err(BackendFault::Spawn { .. })));
    }

    #[test]
    fn test_disk_mode_without_output_is_a_fault() {
        let mut inv = invocation(false);
        inv.output_path = None;
        let result = ProcessBackend::new("csc").compile(&inv);
        assert!(matches!(result, Err(BackendFault::InvalidConfiguration(_))));
    }
}
