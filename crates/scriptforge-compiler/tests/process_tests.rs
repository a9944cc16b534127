//! End-to-end tests driving a scripted stand-in compiler through `sh`
#![cfg(unix)]

use std::path::{Path, PathBuf};

use scriptforge_compiler::{
    BackendFault, BuildMode, CompileError, CompileOptions, Compiler, ModuleIndex, ProcessBackend, StaticHost,
};
use tempfile::TempDir;

/// Writes `MZ` plus the received arguments to the `-out:` path
const SUCCEEDING_COMPILER: &str = r#"
out=""
for arg in "$@"; do
  case "$arg" in
    -out:*) out="${arg#-out:}" ;;
  esac
done
printf 'MZ' > "$out"
printf '%s\n' "$@" >> "$out"
echo "Stand-in compiler"
"#;

const FAILING_COMPILER: &str = r#"
echo "A.src(3,14): error CS1002: ; expected"
echo "A.src(5,1): warning CS0168: The variable 'e' is declared but never used"
exit 1
"#;

const WARNING_THEN_EXIT_COMPILER: &str = r#"
echo "A.src(5,1): warning CS0168: The variable 'e' is declared but never used"
exit 1
"#;

/// Exits cleanly without producing a module
const SILENT_COMPILER: &str = r#"
exit 0
"#;

const CRASHING_COMPILER: &str = r#"
echo "internal compiler error" >&2
exit 3
"#;

fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

fn backend(script: &Path) -> ProcessBackend {
    ProcessBackend::new("sh").arg(script.to_string_lossy())
}

fn source(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("A.src");
    std::fs::write(&path, "using Lib.Net;\nclass A {}\n").unwrap();
    path
}

#[test]
fn test_disk_build_writes_module() {
    let dir = tempfile::tempdir().unwrap();
    let compiler_script = script(&dir, "ok.sh", SUCCEEDING_COMPILER);
    let src = source(&dir);
    let index = ModuleIndex::default();
    let host = StaticHost::new(["/host/Engine.dll"]);

    let options = CompileOptions::new().build_mode(BuildMode::Debug);
    let compiler = Compiler::new(&index, backend(&compiler_script), host, options);
    let output = dir.path().join("bin/Game.dll");
    let module = compiler.compile(&output, &[&src]).expect("compilation failed");

    assert_eq!(module.location(), Some(output.as_path()));
    assert!(module.image.starts_with(b"MZ"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("-target:library"));
    assert!(written.contains("-debug\n"));
    assert!(written.contains("-r:/host/Engine.dll"));
}

#[test]
fn test_release_build_stays_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let compiler_script = script(&dir, "ok.sh", SUCCEEDING_COMPILER);
    let src = source(&dir);
    let index = ModuleIndex::default();

    let options = CompileOptions::new().build_mode(BuildMode::Release);
    let compiler = Compiler::new(&index, backend(&compiler_script), StaticHost::default(), options);
    let output = dir.path().join("bin/Game.dll");
    let module = compiler.compile(&output, &[&src]).expect("compilation failed");

    assert!(module.location().is_none());
    assert!(module.image.starts_with(b"MZ"));
    assert!(String::from_utf8_lossy(&module.image).contains("-debug-"));
    assert!(!output.exists());
}

#[test]
fn test_compiler_errors_become_report() {
    let dir = tempfile::tempdir().unwrap();
    let compiler_script = script(&dir, "fail.sh", FAILING_COMPILER);
    let src = source(&dir);
    let index = ModuleIndex::default();

    let options = CompileOptions::new().build_mode(BuildMode::Release);
    let compiler = Compiler::new(&index, backend(&compiler_script), StaticHost::default(), options);
    let err = compiler.compile("Game.dll", &[&src]).unwrap_err();

    let failure = err.as_compilation_failure().expect("expected a compilation failure");
    assert_eq!(failure.error_count(), 1);
    assert_eq!(
        failure.report(),
        "Compilation failed; 2 errors: \n\
         A.src(3,14): error CS1002: ; expected\n\
         A.src(5,1): warning CS0168: The variable 'e' is declared but never used"
    );
}

#[test]
fn test_crash_without_diagnostics_is_a_fault() {
    let dir = tempfile::tempdir().unwrap();
    let compiler_script = script(&dir, "crash.sh", CRASHING_COMPILER);
    let src = source(&dir);
    let index = ModuleIndex::default();

    let options = CompileOptions::new().build_mode(BuildMode::Release);
    let compiler = Compiler::new(&index, backend(&compiler_script), StaticHost::default(), options);
    let result = compiler.compile("Game.dll", &[&src]);

    match result {
        Err(CompileError::Backend(BackendFault::ProcessFailed { stderr, .. })) => {
            assert_eq!(stderr, "internal compiler error");
        }
        other => panic!("expected a process fault, got {:?}", other.map(|m| m.image.len())),
    }
}

#[test]
fn test_nonzero_exit_with_only_warnings_fails() {
    let dir = tempfile::tempdir().unwrap();
    let compiler_script = script(&dir, "warn.sh", WARNING_THEN_EXIT_COMPILER);
    let src = source(&dir);
    let index = ModuleIndex::default();

    let output = dir.path().join("bin/Game.dll");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();
    std::fs::write(&output, "previous build").unwrap();

    let options = CompileOptions::new().build_mode(BuildMode::Debug);
    let compiler = Compiler::new(&index, backend(&compiler_script), StaticHost::default(), options);
    let err = compiler.compile(&output, &[&src]).unwrap_err();

    let failure = err.as_compilation_failure().expect("expected a compilation failure");
    assert_eq!(failure.error_count(), 0);
    assert_eq!(failure.diagnostics().len(), 1);
}

#[test]
fn test_previous_module_is_not_returned() {
    let dir = tempfile::tempdir().unwrap();
    let compiler_script = script(&dir, "silent.sh", SILENT_COMPILER);
    let src = source(&dir);
    let index = ModuleIndex::default();

    let output = dir.path().join("bin/Game.dll");
    std::fs::create_dir_all(output.parent().unwrap()).unwrap();
    std::fs::write(&output, "previous build").unwrap();

    let options = CompileOptions::new().build_mode(BuildMode::Debug);
    let compiler = Compiler::new(&index, backend(&compiler_script), StaticHost::default(), options);
    let result = compiler.compile(&output, &[&src]);

    assert!(matches!(result, Err(CompileError::Compilation(_))));
    assert!(!output.exists());
}
