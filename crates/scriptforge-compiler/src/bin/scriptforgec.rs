/// scriptforge compiler CLI

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use scriptforge_compiler::{
    BuildMode, CompileError, CompileOptions, Compiler, JsonMetadataLoader, ModuleIndex, ProcessBackend,
    ReferencePolicy, StaticHost,
};

#[derive(Parser, Debug)]
#[command(name = "scriptforgec")]
#[command(about = "scriptforge - compiles script sources into a library module with resolved references")]
#[command(version)]
struct Args {
    /// Script source files
    #[arg(value_name = "FILE", required = true)]
    sources: Vec<PathBuf>,

    /// Output module path
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Root directory of the library module index
    #[arg(long, value_name = "DIR")]
    index_root: PathBuf,

    /// File extension of library modules
    #[arg(long, default_value = "dll")]
    extension: String,

    /// Module loaded by the host runtime (always referenced)
    #[arg(long = "loaded", value_name = "PATH")]
    loaded: Vec<PathBuf>,

    /// Build mode: debug or release (defaults to $SCRIPTFORGE_BUILD_MODE)
    #[arg(long)]
    mode: Option<BuildMode>,

    /// Reference policy: matched or loaded
    #[arg(long, default_value = "matched")]
    policy: ReferencePolicy,

    /// Compiler executable
    #[arg(long, default_value = "csc")]
    compiler: String,
}

fn run(args: Args) -> anyhow::Result<bool> {
    let index = ModuleIndex::build_with(&args.index_root, &args.extension, &JsonMetadataLoader)
        .context("failed to build module index")?;

    let mut options = CompileOptions::from_env().reference_policy(args.policy);
    if let Some(mode) = args.mode {
        options = options.build_mode(mode);
    }

    let backend = ProcessBackend::new(args.compiler);
    let host = StaticHost::new(args.loaded);
    let compiler = Compiler::new(&index, backend, host, options);

    match compiler.compile(&args.output, &args.sources) {
        Ok(module) => {
            match module.location() {
                Some(path) => println!("Compiled {} ({} bytes)", path.display(), module.image.len()),
                None => println!("Compiled in memory ({} bytes)", module.image.len()),
            }
            Ok(true)
        }
        Err(CompileError::Compilation(failure)) => {
            eprintln!("{}", failure);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(2);
        }
    }
}
