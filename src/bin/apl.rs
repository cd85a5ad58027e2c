use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use apl::{AplError, DEFAULT_EXTENSION, ExecutionContext, Interpreter, Repl, RunMode, repl};
use clap::{Parser, Subcommand};
use colored::Colorize;

#[derive(Parser)]
#[command(author, version, about = "APL language interpreter")]
struct Args {
    /// `debug` echoes every parsed tree before evaluating it
    #[arg(long, value_enum, env = "APL_MODE", default_value_t = RunMode::Run, global = true)]
    mode: RunMode,

    /// Extension a local import must carry
    #[arg(long, env = "APL_EXTENSION", default_value = DEFAULT_EXTENSION, global = true)]
    extension: String,

    /// Timeout in seconds for remote imports
    #[arg(long, env = "APL_FETCH_TIMEOUT", default_value_t = 10, global = true)]
    fetch_timeout: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Import and run a script
    Run { script: String },
    /// Start an interactive session, importing the given scripts first
    Repl { scripts: Vec<String> },
    /// Evaluate a snippet of source
    Eval { source: String },
    /// Run every script found under a directory, each in a fresh interpreter
    Batch { dir: PathBuf },
}

impl Args {
    fn context(&self) -> ExecutionContext {
        ExecutionContext {
            mode: self.mode,
            extension: self.extension.clone(),
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
        }
    }
}

fn main() -> ExitCode {
    match execute(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            repl::report(&err);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<ExitCode, AplError> {
    let context = args.context();
    match args.command.unwrap_or(Command::Repl {
        scripts: Vec::new(),
    }) {
        Command::Run { script } => {
            Interpreter::with_context(context).import(&script)?;
        }
        Command::Repl { scripts } => {
            let mut repl = Repl::with_context(context);
            repl.preload(&scripts);
            repl.run()?;
        }
        Command::Eval { source } => {
            Interpreter::with_context(context).eval_source(&source)?;
        }
        Command::Batch { dir } => return run_batch(&dir, &context),
    }
    Ok(ExitCode::SUCCESS)
}

/// Fails the process when any script failed; each failure is reported as it
/// happens.
fn run_batch(dir: &Path, context: &ExecutionContext) -> Result<ExitCode, AplError> {
    let scripts = collect_scripts(dir, &context.extension)?;
    if scripts.is_empty() {
        println!(
            "{}",
            format!("No .{} files found under {}.", context.extension, dir.display()).yellow()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let mut failed = 0usize;
    for script in &scripts {
        let address = script.display().to_string();
        match Interpreter::with_context(context.clone()).import(&address) {
            Ok(()) => println!("{address} ... {}", "ok".green()),
            Err(err) => {
                failed += 1;
                println!("{address} ... {}", "FAILED".red().bold());
                repl::report(&err);
            }
        }
    }

    println!("Executed {} script(s), {failed} failed.", scripts.len());
    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn collect_scripts(root: &Path, extension: &str) -> Result<Vec<PathBuf>, AplError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(collect_scripts(&path, extension)?);
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
