//! `wisp` — REPL and script runner for the wisp embeddable evaluator
//! (spec §6 "CLI/REPL (collaborator, not part of core)").

mod config;
mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Config;

/// Runs a wisp script, or starts an interactive REPL if no file is given.
#[derive(Parser)]
#[command(name = "wisp", version, about)]
struct Args {
    /// Script to run. Omit to start an interactive REPL.
    script: Option<PathBuf>,

    /// Path to a `wisp.toml` overriding resource limits.
    #[arg(long, default_value = "wisp.toml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let config = match Config::load(&args.config) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("error reading {}: {err}", args.config.display());
            return ExitCode::FAILURE;
        }
    };

    let (env, decls) = wisp::embed(|_| {});
    let res = wisp::ResourceTracker::new(config.resource_limits(), wisp::CancellationToken::new());

    match &args.script {
        Some(path) => run_script(path, &env, &decls, &res),
        None => match repl::run(&env, &decls, &res) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("repl error: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run_script(path: &std::path::Path, env: &wisp::Env, decls: &wisp::Declarations, res: &wisp::ResourceTracker) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("error reading {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let filename = path.to_string_lossy();
    let ast = match wisp::parse(&source, &filename) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let optimized = match wisp::optimize(&ast, env, decls) {
        Ok(v) => v,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };
    match wisp::eval_with(&optimized, env, res) {
        Ok(value) => {
            println!("{}", wisp::serialize(&value));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
