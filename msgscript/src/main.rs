//! CLI entry point for msgscript.
//! Usage: cargo run -p msgscript -- compile scripts/intro.msg --out intro.ron

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use msgscript::{CompilerOptions, FormatVersion, LogListener, MessageScriptCompiler, Script, Speaker, Window, validate_script};

#[derive(Parser)]
#[command(author, version, about = "Compile message scripts into the message script model.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a script and write the resulting model.
    Compile(CompileArgs),
    /// Compile a script and report structural problems without writing output.
    Check(CheckArgs),
}

#[derive(Args)]
struct CompilerArgs {
    /// TOML file with compiler options.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the target binary format version (v1 | v1-big-endian).
    #[arg(long)]
    format_version: Option<FormatVersion>,
}

#[derive(Args)]
struct CompileArgs {
    /// Script source file.
    input: PathBuf,
    /// Write output here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Output representation.
    #[arg(long, value_enum, default_value_t = Emit::Ron)]
    emit: Emit,
    #[command(flatten)]
    compiler: CompilerArgs,
}

#[derive(Args)]
struct CheckArgs {
    /// Script source file.
    input: PathBuf,
    #[command(flatten)]
    compiler: CompilerArgs,
}

#[derive(Clone, Copy, ValueEnum)]
enum Emit {
    /// Pretty-printed RON of the script model.
    Ron,
    /// Human-readable listing in source notation.
    Text,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Compile(args) => run_compile(&args),
        Commands::Check(args) => run_check(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn build_compiler(args: &CompilerArgs) -> Result<MessageScriptCompiler> {
    let mut options = match &args.config {
        Some(path) => CompilerOptions::load(path).with_context(|| format!("while loading config '{}'", path.display()))?,
        None => CompilerOptions::default(),
    };
    if let Some(version) = args.format_version {
        options.format_version = version;
    }
    let mut compiler = MessageScriptCompiler::with_options(options);
    compiler.subscribe(LogListener);
    Ok(compiler)
}

fn compile_file(compiler: &mut MessageScriptCompiler, input: &Path) -> Result<Script> {
    let bytes = fs::read(input).with_context(|| format!("unable to read '{}'", input.display()))?;
    info!("compiling {}", input.display());
    compiler
        .compile_bytes(&bytes)
        .with_context(|| format!("'{}' did not compile (run with RUST_LOG=warn for details)", input.display()))
}

fn run_compile(args: &CompileArgs) -> Result<()> {
    let mut compiler = build_compiler(&args.compiler)?;
    let script = compile_file(&mut compiler, &args.input)?;
    let rendered = match args.emit {
        Emit::Ron => ron::ser::to_string_pretty(&script, ron::ser::PrettyConfig::default())
            .context("while serializing script model")?,
        Emit::Text => render_listing(&script),
    };
    match &args.out {
        Some(out) => fs::write(out, rendered).with_context(|| format!("writing '{}'", out.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

fn run_check(args: &CheckArgs) -> Result<()> {
    let mut compiler = build_compiler(&args.compiler)?;
    let script = compile_file(&mut compiler, &args.input)?;
    let problems = validate_script(&script);
    for problem in &problems {
        eprintln!("check: {problem}");
    }
    if !problems.is_empty() {
        bail!("{} problem(s) found in '{}'", problems.len(), args.input.display());
    }
    eprintln!("check: OK ({} windows)", script.windows.len());
    Ok(())
}

/// One header per window followed by its lines, one per row.
fn render_listing(script: &Script) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# format {}", script.format_version);
    for window in &script.windows {
        let _ = writeln!(out, "{window}");
        if let Window::Dialog(dialog) = window
            && let Some(Speaker::VariablyNamed) = dialog.speaker
        {
            let _ = writeln!(out, "# speaker resolved at runtime");
        }
        for line in window.lines() {
            let _ = writeln!(out, "{line}<e>");
        }
    }
    out
}
