use crate::cli::print_banner;
use crate::config::ReplConfig;
use crate::error::{AppError, AppResult};
use crate::interp::{find_tuple_end, split_forms, Expression, Interpreter};
use colored::*;
use rustyline::error::ReadlineError;
use rustyline::Editor;
use std::fs;
use std::ops::ControlFlow;
use std::path::Path;
use tracing::{debug, warn};

/// What a complete top-level form asks the REPL to do
#[derive(Debug, Clone, PartialEq)]
pub enum ReplInput {
    Exit,
    ToggleStep,
    Form(String),
}

impl ReplInput {
    pub fn classify(form: &str) -> Self {
        let normalized = form.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.as_str() {
            "(exit)" => ReplInput::Exit,
            "(toggle-step)" => ReplInput::ToggleStep,
            _ => ReplInput::Form(form.trim().to_string()),
        }
    }
}

/// Remove a `;` comment from one line, ignoring semicolons inside string
/// literals, `|...|` symbols and `#\;`.
pub fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut in_pipe = false;
    let mut escaped = false;
    let mut chars = line.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' if !in_pipe => in_string = true,
            '|' => in_pipe = !in_pipe,
            '#' if chars.peek().map(|(_, next)| *next) == Some('\\') => {
                chars.next();
                chars.next();
            }
            ';' if !in_pipe => return &line[..index],
            _ => {}
        }
    }

    line
}

/// True once `buffer` holds at least one complete form, or an error that more
/// input cannot fix.
pub fn is_complete(buffer: &str) -> bool {
    let text = buffer.trim_start();
    if text.is_empty() {
        return false;
    }
    if split_forms(text).is_ok() {
        return true;
    }
    let form = text.strip_prefix('\'').unwrap_or(text);
    find_tuple_end(form).is_some()
}

pub struct ReplState {
    pub interpreter: Interpreter,
    pub config: ReplConfig,
    pub show_steps: bool,
    /// Forms that ended in an error so far
    pub errors: usize,
}

impl ReplState {
    pub fn new(config: ReplConfig) -> Self {
        ReplState {
            interpreter: Interpreter::new(),
            show_steps: config.show_steps,
            errors: 0,
            config,
        }
    }

    /// Evaluate one complete form, returning the lines to print or `Break`
    /// for `(exit)`.
    pub fn handle(&mut self, form: &str) -> ControlFlow<(), Vec<String>> {
        match ReplInput::classify(form) {
            ReplInput::Exit => ControlFlow::Break(()),
            ReplInput::ToggleStep => {
                self.toggle_steps();
                ControlFlow::Continue(vec![format!(
                    "{} {}",
                    "Step display:".bright_yellow(),
                    if self.show_steps { "enabled".bright_green() } else { "disabled".dimmed() }
                )])
            }
            ReplInput::Form(form) => ControlFlow::Continue(self.eval_form(&form)),
        }
    }

    fn eval_form(&mut self, form: &str) -> Vec<String> {
        if !self.show_steps {
            return match self.interpreter.eval(form) {
                Ok(value) => self.result_line(&value).into_iter().collect(),
                Err(e) => {
                    self.errors += 1;
                    vec![format!("{} {}", "Error:".bright_red(), e)]
                }
            };
        }

        let trace = self.interpreter.eval_steps(form);
        let mut lines = Vec::new();
        let shown = match trace.error {
            Some(_) => trace.steps.len(),
            None => trace.steps.len().saturating_sub(1),
        };
        let visible = trace.steps.iter()
            .take(shown)
            .filter(|step| !matches!(step, Expression::Partial(_) | Expression::Void));
        for (i, step) in visible.enumerate() {
            lines.push(format!("{} {}", format!("[{}]", i + 1).dimmed(), step));
        }
        match (&trace.error, trace.value()) {
            (Some(e), _) => {
                self.errors += 1;
                lines.push(format!("{} {}", "Error:".bright_red(), e));
            }
            (None, Some(value)) => lines.extend(self.result_line(value)),
            (None, None) => {}
        }
        lines
    }

    fn result_line(&self, value: &Expression) -> Option<String> {
        match value {
            Expression::Void | Expression::Partial(_) => None,
            _ => Some(format!("{} {}", "=>".bright_green(), self.format_value(value))),
        }
    }

    /// Replay every form of a file without echoing values. Errors are still
    /// reported; `(exit)` stops the replay.
    pub fn load_file(&mut self, path: &Path) -> AppResult<()> {
        let content = fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading");

        for form in split_forms(&content)? {
            match ReplInput::classify(&form) {
                ReplInput::Exit => break,
                ReplInput::ToggleStep => self.toggle_steps(),
                ReplInput::Form(form) => {
                    if let Err(e) = self.interpreter.eval(&form) {
                        self.errors += 1;
                        println!("{} {}", "Error:".bright_red(), e);
                    }
                }
            }
        }

        Ok(())
    }

    pub fn format_value(&self, value: &Expression) -> String {
        match value {
            Expression::Number(_) | Expression::Inexact(_) => value.to_string().bright_cyan().to_string(),
            Expression::Boolean(_) => value.to_string().bright_magenta().to_string(),
            Expression::Str(_) => value.to_string().bright_green().to_string(),
            Expression::Symbol(_) | Expression::Character(_) => value.to_string().bright_yellow().to_string(),
            Expression::Procedure(_) | Expression::Lambda(_) => value.to_string().bright_blue().to_string(),
            Expression::List(items) if items.is_empty() => "empty".dimmed().to_string(),
            Expression::List(items) => {
                let formatted_items: Vec<String> = items.iter()
                    .map(|item| self.format_value(item))
                    .collect();
                format!("(list {})", formatted_items.join(" "))
            }
            Expression::Struct(value) => {
                let formatted_fields: Vec<String> = value.fields.iter()
                    .map(|(_, field)| self.format_value(field))
                    .collect();
                let constructor = format!("make-{}", value.type_name).bright_blue();
                if formatted_fields.is_empty() {
                    format!("({})", constructor)
                } else {
                    format!("({} {})", constructor, formatted_fields.join(" "))
                }
            }
            Expression::Void => value.to_string().dimmed().to_string(),
            _ => value.to_string(),
        }
    }

    pub fn toggle_steps(&mut self) {
        self.show_steps = !self.show_steps;
    }
}

/// Read lines until they form a balanced unit
fn read_form(
    rl: &mut Editor<(), rustyline::history::DefaultHistory>,
    prompt: &str,
) -> Result<Option<String>, ReadlineError> {
    let mut buffer = String::new();
    let continuation = " ".repeat(prompt.chars().count());

    loop {
        let current = if buffer.is_empty() { prompt } else { continuation.as_str() };
        let line = rl.readline(current)?;
        let code = strip_comment(&line);

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(code);

        if buffer.trim().is_empty() {
            return Ok(None);
        }
        if is_complete(&buffer) {
            let _ = rl.add_history_entry(buffer.trim());
            return Ok(Some(buffer));
        }
    }
}

pub fn start_repl(config: ReplConfig, require: &[impl AsRef<Path>]) -> AppResult<()> {
    let mut state = ReplState::new(config);
    let mut rl = Editor::<(), rustyline::history::DefaultHistory>::new()?;
    let history_file = state.config.history_file.clone();

    if history_file.exists() {
        if let Err(e) = rl.load_history(&history_file) {
            warn!(path = %history_file.display(), error = %e, "could not load history");
        }
    }

    if state.config.banner {
        print_banner();
    }

    for file in require {
        if let Err(e) = state.load_file(file.as_ref()) {
            eprintln!("{} {}: {}", "Error loading file:".bright_red(), file.as_ref().display(), e);
        }
    }

    let prompt = state.config.prompt.clone();
    'repl: loop {
        match read_form(&mut rl, &prompt) {
            Ok(None) => continue,
            Ok(Some(buffer)) => {
                let forms = match split_forms(&buffer) {
                    Ok(forms) => forms,
                    Err(e) => {
                        println!("{} {}", "Error:".bright_red(), e);
                        continue;
                    }
                };
                for form in forms {
                    match state.handle(&form) {
                        ControlFlow::Break(()) => break 'repl,
                        ControlFlow::Continue(lines) => {
                            for line in lines {
                                println!("{}", line);
                            }
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "Use (exit) to quit".dimmed());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(AppError::from(err)),
        }
    }

    if let Err(e) = rl.save_history(&history_file) {
        warn!(path = %history_file.display(), error = %e, "could not save history");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn plain_state() -> ReplState {
        colored::control::set_override(false);
        ReplState::new(ReplConfig::default())
    }

    fn output(state: &mut ReplState, form: &str) -> Vec<String> {
        match state.handle(form) {
            ControlFlow::Continue(lines) => lines,
            ControlFlow::Break(()) => panic!("unexpected exit"),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(ReplInput::classify("(exit)"), ReplInput::Exit);
        assert_eq!(ReplInput::classify("( exit )"), ReplInput::Exit);
        assert_eq!(ReplInput::classify("(toggle-step)"), ReplInput::ToggleStep);
        assert_eq!(
            ReplInput::classify(" (+ 1 2) "),
            ReplInput::Form("(+ 1 2)".to_string())
        );
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("(+ 1 2) ; sum"), "(+ 1 2) ");
        assert_eq!(strip_comment("\"a;b\" ; c"), "\"a;b\" ");
        assert_eq!(strip_comment("\"say \\\"hi;\\\"\""), "\"say \\\"hi;\\\"\"");
        assert_eq!(strip_comment("(char=? #\\; c)"), "(char=? #\\; c)");
        assert_eq!(strip_comment("'|a;b|"), "'|a;b|");
        assert_eq!(strip_comment("; only a comment"), "");
    }

    #[test]
    fn test_is_complete() {
        assert!(!is_complete(""));
        assert!(!is_complete("(define (f x)"));
        assert!(is_complete("(define (f x)\n  (* x x))"));
        assert!(is_complete("42"));
        assert!(is_complete("'(1 2)"));
        assert!(!is_complete("'(1 2"));
        assert!(is_complete("(+ 1 2))"));
    }

    #[test]
    fn test_values_and_void_suppression() {
        let mut state = plain_state();
        assert_eq!(output(&mut state, "(define x 5)"), Vec::<String>::new());
        assert_eq!(output(&mut state, "(* x 2)"), vec!["=> 10"]);
        assert_eq!(output(&mut state, "\"hi\""), vec!["=> \"hi\""]);
    }

    #[test]
    fn test_errors_are_reported_and_state_survives() {
        let mut state = plain_state();
        let lines = output(&mut state, "(undefined-thing 1)");
        assert_eq!(lines, vec!["Error: Unbound name: undefined-thing"]);
        assert_eq!(state.errors, 1);
        assert_eq!(output(&mut state, "(+ 1 1)"), vec!["=> 2"]);
    }

    #[test]
    fn test_toggle_step_shows_reductions() {
        let mut state = plain_state();
        assert!(!state.show_steps);
        output(&mut state, "(toggle-step)");
        assert!(state.show_steps);

        let lines = output(&mut state, "(+ (* 2 3) 4)");
        assert_eq!(
            lines,
            vec!["[1] (+ (* 2 3) 4)", "[2] (+ 6 4)", "=> 10"]
        );
    }

    #[test]
    fn test_exit() {
        let mut state = plain_state();
        assert_eq!(state.handle("(exit)"), ControlFlow::Break(()));
    }

    #[test]
    fn test_format_value() {
        let state = plain_state();
        let interp = &state.interpreter;
        let list = interp.eval("(list 1 \"a\" (list))").unwrap();
        assert_eq!(state.format_value(&list), "(list 1 \"a\" empty)");

        interp.eval("(define-struct posn (x y))").unwrap();
        let posn = interp.eval("(make-posn 1 'a)").unwrap();
        assert_eq!(state.format_value(&posn), "(make-posn 1 'a)");
    }

    #[test]
    fn test_load_file_is_silent_and_keeps_going() {
        let mut state = plain_state();
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "; helpers\n(define (square n) (* n n))\n(car 1)\n(define nine (square 3))"
        )
        .unwrap();

        state.load_file(file.path()).unwrap();
        assert_eq!(output(&mut state, "nine"), vec!["=> 9"]);
    }

    #[test]
    fn test_load_missing_file() {
        let mut state = plain_state();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            state.load_file(&dir.path().join("missing.rkt")),
            Err(AppError::Io(_))
        ));
    }
}
