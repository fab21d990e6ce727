use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

/// racket-stepper - small-step interpreter for Racket student languages
#[derive(Parser, Debug)]
#[command(name = "racket-stepper")]
#[command(version)]
#[command(about = "Small-step interpreter for a Racket student-language subset")]
#[command(long_about = "
racket-stepper evaluates Beginning Student Language style programs one
reduction at a time and can print every intermediate expression.

Usage examples:
  racket-stepper                      # Start interactive REPL
  racket-stepper -t lib.rkt           # Load a file, then start the REPL
  racket-stepper --steps              # REPL that prints every reduction
  racket-stepper run program.rkt      # Evaluate a file and exit
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Load a file before starting the REPL (repeatable)
    #[arg(short = 't', long = "require", value_name = "FILE")]
    pub require: Vec<PathBuf>,

    /// Print every reduction step
    #[arg(long, global = true)]
    pub steps: bool,

    /// Configuration file (defaults to <config dir>/racket-stepper/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (trace every reduction to stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Do not print the startup banner
    #[arg(long)]
    pub no_banner: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate every top-level form in a file and exit
    Run {
        /// Source file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

pub fn print_banner() {
    println!("{}", "racket-stepper".bright_cyan().bold());
    println!("{}", format!("Version {}", crate::VERSION).dimmed());
    println!(
        "{}",
        "Type (exit) to quit, (toggle-step) to show reduction steps".dimmed()
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_repl() {
        let cli = Cli::try_parse_from(["racket-stepper"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.require.is_empty());
        assert!(!cli.steps);
    }

    #[test]
    fn test_repeatable_require() {
        let cli = Cli::try_parse_from(["racket-stepper", "-t", "a.rkt", "--require", "b.rkt"]).unwrap();
        assert_eq!(cli.require, vec![PathBuf::from("a.rkt"), PathBuf::from("b.rkt")]);
    }

    #[test]
    fn test_run_subcommand() {
        let cli = Cli::try_parse_from(["racket-stepper", "run", "prog.rkt", "--steps"]).unwrap();
        assert!(cli.steps);
        match cli.command {
            Some(Commands::Run { file }) => assert_eq!(file, PathBuf::from("prog.rkt")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from([
            "racket-stepper",
            "--no-color",
            "--no-banner",
            "-v",
            "--config",
            "stepper.toml",
        ])
        .unwrap();
        assert!(cli.no_color);
        assert!(cli.no_banner);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("stepper.toml")));
    }
}
