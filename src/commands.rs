use crate::cli::{Cli, Commands};
use crate::config::ReplConfig;
use crate::error::{AppError, AppResult};
use crate::interp::split_forms;
use crate::repl::{start_repl, ReplState};
use colored::*;
use std::fs;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::debug;

/// Resolve configuration, apply CLI overrides and run the requested command
pub fn execute_command(cli: Cli) -> AppResult<()> {
    let config = resolve_config(&cli)?;

    if !config.color {
        colored::control::set_override(false);
    }

    match cli.command {
        Some(Commands::Run { file }) => execute_run(&file, config),
        None => start_repl(config, &cli.require),
    }
}

/// Config file values, overridden by whatever the command line sets
pub fn resolve_config(cli: &Cli) -> AppResult<ReplConfig> {
    let mut config = ReplConfig::load(cli.config.as_deref())?;
    if cli.steps {
        config.show_steps = true;
    }
    if cli.no_color {
        config.color = false;
    }
    if cli.no_banner {
        config.banner = false;
    }
    debug!(?config, "resolved configuration");
    Ok(config)
}

/// Evaluate a file form by form, printing every non-void result.
///
/// Errors are reported as they happen and evaluation continues; the command
/// fails if any form failed.
pub fn execute_run(file: &Path, config: ReplConfig) -> AppResult<()> {
    if !file.exists() {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", file.display()),
        )));
    }

    let content = fs::read_to_string(file)?;
    debug!(path = %file.display(), bytes = content.len(), "running file");

    let mut state = ReplState::new(config);
    for form in split_forms(&content)? {
        match state.handle(&form) {
            ControlFlow::Break(()) => break,
            ControlFlow::Continue(lines) => {
                for line in lines {
                    println!("{}", line);
                }
            }
        }
    }

    if state.errors > 0 {
        return Err(AppError::RunFailed {
            file: file.display().to_string(),
            failed: state.errors,
        });
    }

    println!("{} {}", "Finished:".bright_green(), file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_overrides_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "show_steps = false\nbanner = true\nprompt = \"bsl> \"").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from(["racket-stepper", "--config", &path, "--steps", "--no-banner"]).unwrap();
        let config = resolve_config(&cli).unwrap();
        assert!(config.show_steps);
        assert!(!config.banner);
        assert_eq!(config.prompt, "bsl> ");
    }

    #[test]
    fn test_run_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "(define (fact n) (if (= n 0) 1 (* n (fact (- n 1)))))\n(fact 5)").unwrap();
        assert!(execute_run(file.path(), ReplConfig::default()).is_ok());
    }

    #[test]
    fn test_run_reports_failures() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "(/ 1 0)\n(+ 1 1)\n(car empty)").unwrap();
        match execute_run(file.path(), ReplConfig::default()) {
            Err(AppError::RunFailed { failed, .. }) => assert_eq!(failed, 2),
            other => panic!("expected a failed run, got {:?}", other),
        }
    }

    #[test]
    fn test_run_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            execute_run(&dir.path().join("absent.rkt"), ReplConfig::default()),
            Err(AppError::Io(_))
        ));
    }
}
