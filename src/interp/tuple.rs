//! Tuple splitting for s-expression text
//!
//! These helpers work on raw text only. They never build expressions; the
//! parser decides what each token means.

use crate::error::{EvalError, EvalResult};

fn is_open(ch: char) -> bool {
    ch == '(' || ch == '['
}

fn is_close(ch: char) -> bool {
    ch == ')' || ch == ']'
}

/// String-literal state of a left-to-right scan. Inside a literal a
/// backslash escapes exactly the next character.
#[derive(Debug, Default)]
struct StringScan {
    in_string: bool,
    escaped: bool,
}

impl StringScan {
    /// Feed one character; true if it belongs to a literal, quotes included
    fn feed(&mut self, ch: char) -> bool {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
            true
        } else if ch == '"' {
            self.in_string = true;
            true
        } else {
            false
        }
    }
}

/// `#\c` character literals are copied verbatim so `#\(` does not open a tuple
fn is_char_literal(chars: &[char], index: usize) -> bool {
    chars[index] == '#' && chars.get(index + 1) == Some(&'\\') && index + 2 < chars.len()
}

/// Index of the first newline at or after `index`, or the end of input
fn skip_comment(chars: &[char], mut index: usize) -> usize {
    while index < chars.len() && chars[index] != '\n' {
        index += 1;
    }
    index
}

/// Split the interior of a balanced `(...)` or `[...]` form into its
/// top-level tokens.
///
/// Nested tuples, string literals and `|...|` symbol names are kept whole.
/// `;` starts a comment that runs to the end of the line. Text after the
/// matching close is ignored.
pub fn parse_tuple(text: &str) -> EvalResult<Vec<String>> {
    let chars: Vec<char> = text.chars().collect();
    let mut depth = 0usize;
    let mut strings = StringScan::default();
    let mut in_pipe = false;
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];

        if !strings.in_string && is_char_literal(&chars, index) {
            current.extend(&chars[index..index + 3]);
            index += 3;
            continue;
        }

        if !in_pipe && strings.feed(ch) {
            current.push(ch);
            index += 1;
            continue;
        }

        if ch == '|' {
            in_pipe = !in_pipe;
        }

        if in_pipe || ch == '|' {
            current.push(ch);
            index += 1;
            continue;
        }

        if ch == ';' {
            index = skip_comment(&chars, index);
            if depth == 1 && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }

        if is_close(ch) {
            match depth {
                0 => {
                    return Err(EvalError::Syntax(format!(
                        "Unexpected '{}' in \"{}\"",
                        ch, text
                    )))
                }
                1 => {
                    if !current.is_empty() {
                        tokens.push(current);
                    }
                    return Ok(tokens);
                }
                _ => {
                    depth -= 1;
                    current.push(ch);
                }
            }
        } else if is_open(ch) {
            depth += 1;
            if depth > 1 {
                current.push(ch);
            }
        } else if ch.is_whitespace() && depth <= 1 {
            if depth == 1 && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }

        index += 1;
    }

    Err(EvalError::Syntax(format!(
        "Tuple \"{}\" is never closed.",
        text
    )))
}

/// Byte offset of the close paren matching the open paren at the start of
/// `text`.
///
/// Returns `Some(0)` when `text` does not start with an open paren (an atom
/// is complete as soon as it is read) and `None` when the form is not yet
/// balanced.
pub fn find_tuple_end(text: &str) -> Option<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let plain: Vec<char> = chars.iter().map(|(_, ch)| *ch).collect();

    match plain.first() {
        Some(ch) if is_open(*ch) => {}
        _ => return Some(0),
    }

    let mut depth = 0usize;
    let mut strings = StringScan::default();
    let mut in_pipe = false;
    let mut index = 0;

    while index < plain.len() {
        let ch = plain[index];

        if !strings.in_string && is_char_literal(&plain, index) {
            index += 3;
            continue;
        }

        if !in_pipe && strings.feed(ch) {
            index += 1;
            continue;
        }

        if ch == '|' {
            in_pipe = !in_pipe;
        }
        if in_pipe || ch == '|' {
            index += 1;
            continue;
        }

        if ch == ';' {
            index = skip_comment(&plain, index);
            continue;
        }

        if is_open(ch) {
            depth += 1;
        } else if is_close(ch) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(chars[index].0);
            }
        }

        index += 1;
    }

    None
}

/// Split a source holding several top-level forms into one string per form.
///
/// Atoms end at whitespace; string atoms end at their closing quote.
pub fn split_forms(source: &str) -> EvalResult<Vec<String>> {
    let mut forms = Vec::new();
    let mut rest = source;

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        if rest.starts_with(';') {
            rest = rest.find('\n').map_or("", |newline| &rest[newline + 1..]);
            continue;
        }

        let first = rest.chars().next().unwrap_or(' ');
        if is_close(first) {
            return Err(EvalError::Syntax(format!("Unexpected '{}'", first)));
        }

        let end = if is_open(first) || rest.starts_with("'(") {
            let start = if first == '\'' { 1 } else { 0 };
            let close = find_tuple_end(&rest[start..]).ok_or_else(|| {
                EvalError::Syntax(format!("Tuple \"{}\" is never closed.", rest.trim_end()))
            })?;
            start + close + rest[start + close..].chars().next().map_or(1, char::len_utf8)
        } else if first == '"' {
            parse_string(rest)?;
            string_literal_len(rest)
        } else {
            rest.find(char::is_whitespace).unwrap_or(rest.len())
        };

        forms.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    Ok(forms)
}

/// Byte length of the quoted literal at the start of `text`
fn string_literal_len(text: &str) -> usize {
    let mut strings = StringScan::default();
    for (offset, ch) in text.char_indices() {
        strings.feed(ch);
        if offset > 0 && !strings.in_string {
            return offset + ch.len_utf8();
        }
    }
    text.len()
}

/// Read the contents of a string literal. `text` must start with `"`.
pub fn parse_string(text: &str) -> EvalResult<String> {
    let mut chars = text.chars();
    if chars.next() != Some('"') {
        return Err(EvalError::Syntax(format!("Expected string literal, found {}", text)));
    }

    let mut value = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => return Ok(value),
            '\\' => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some('r') => value.push('\r'),
                Some('"') => value.push('"'),
                Some('\\') => value.push('\\'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => break,
            },
            _ => value.push(ch),
        }
    }

    Err(EvalError::Syntax(format!("Unterminated string: {}", text)))
}

/// Read a quoted symbol such as `'abc` or `'|two words|`, returning its name
pub fn parse_symbol(text: &str) -> EvalResult<String> {
    let body = text
        .strip_prefix('\'')
        .ok_or_else(|| EvalError::Syntax(format!("Invalid symbol: {}", text)))?;

    if body.is_empty() {
        return Err(EvalError::Syntax(format!("Invalid symbol: {}", text)));
    }

    let mut name = String::new();
    let mut in_pipe = false;

    for ch in body.chars() {
        if ch == '|' {
            if in_pipe {
                break;
            }
            in_pipe = true;
        } else if !in_pipe && ch.is_whitespace() {
            break;
        } else {
            name.push(ch);
        }
    }

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_tuple_flat() {
        let tokens = parse_tuple("(+ 1 2)").unwrap();
        assert_eq!(tokens, vec!["+", "1", "2"]);
    }

    #[test]
    fn test_parse_tuple_nested_and_brackets() {
        let tokens = parse_tuple("(cond [(> x 1) \"big\"] [else (f (g x))])").unwrap();
        assert_eq!(
            tokens,
            vec!["cond", "[(> x 1) \"big\"]", "[else (f (g x))]"]
        );
    }

    #[test]
    fn test_parse_tuple_keeps_string_spaces() {
        let tokens = parse_tuple("(string-append \"a ) b\" \"c\")").unwrap();
        assert_eq!(tokens, vec!["string-append", "\"a ) b\"", "\"c\""]);

        let tokens = parse_tuple(r#"(display "say \"hi\" (now)")"#).unwrap();
        assert_eq!(tokens, vec!["display", r#""say \"hi\" (now)""#]);
    }

    #[test]
    fn test_escaped_backslash_before_closing_quote() {
        let tokens = parse_tuple(r#"(string-length "a\\")"#).unwrap();
        assert_eq!(tokens, vec!["string-length", r#""a\\""#]);

        let tokens = parse_tuple(r#"(string-append "\\\"" "b")"#).unwrap();
        assert_eq!(tokens, vec!["string-append", r#""\\\"""#, r#""b""#]);

        assert_eq!(find_tuple_end(r#"(f "a\\")"#), Some(8));
        assert_eq!(find_tuple_end(r#"(f "a\")"#), None);

        let forms = split_forms(r#""a\\" "\\\"" x"#).unwrap();
        assert_eq!(forms, vec![r#""a\\""#, r#""\\\"""#, "x"]);
    }

    #[test]
    fn test_char_literal_quote_does_not_open_string() {
        let tokens = parse_tuple("(char=? #\\\" c)").unwrap();
        assert_eq!(tokens, vec!["char=?", "#\\\"", "c"]);
        assert_eq!(find_tuple_end("(char=? #\\\" c)"), Some(13));
    }

    #[test]
    fn test_parse_tuple_pipe_symbol() {
        let tokens = parse_tuple("(symbol->string '|a b|)").unwrap();
        assert_eq!(tokens, vec!["symbol->string", "'|a b|"]);
    }

    #[test]
    fn test_parse_tuple_char_literal_paren() {
        let tokens = parse_tuple("(char=? #\\( #\\a)").unwrap();
        assert_eq!(tokens, vec!["char=?", "#\\(", "#\\a"]);
    }

    #[test]
    fn test_parse_tuple_multiline_and_comments() {
        let tokens = parse_tuple("(define (f x) ; doubles\n  (* 2 x))").unwrap();
        assert_eq!(tokens, vec!["define", "(f x)", "(* 2 x)"]);
    }

    #[test]
    fn test_parse_tuple_empty() {
        assert!(parse_tuple("()").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tuple_never_closed() {
        let err = parse_tuple("(+ 1 (* 2 3)").unwrap_err();
        assert!(matches!(err, EvalError::Syntax(msg) if msg.contains("never closed")));
    }

    #[test]
    fn test_find_tuple_end() {
        assert_eq!(find_tuple_end("(+ 1 2)"), Some(6));
        assert_eq!(find_tuple_end("(a (b) c) (d)"), Some(8));
        assert_eq!(find_tuple_end("(a \")\""), None);
        assert_eq!(find_tuple_end("(define x"), None);
        assert_eq!(find_tuple_end("42"), Some(0));
        assert_eq!(find_tuple_end("[x]"), Some(2));
    }

    #[test]
    fn test_split_forms() {
        let forms = split_forms("(define x 1)\n; note\n(+ x 2) x \"a b\" '(1 2)").unwrap();
        assert_eq!(forms, vec!["(define x 1)", "(+ x 2)", "x", "\"a b\"", "'(1 2)"]);
    }

    #[test]
    fn test_split_forms_unbalanced() {
        assert!(split_forms("(define x 1) (+ x").is_err());
        assert!(split_forms(")").is_err());
    }

    #[test]
    fn test_parse_string_escapes() {
        assert_eq!(parse_string(r#""a\"b\n""#).unwrap(), "a\"b\n");
        assert!(parse_string("\"open").is_err());
    }

    #[test]
    fn test_parse_symbol() {
        assert_eq!(parse_symbol("'apple").unwrap(), "apple");
        assert_eq!(parse_symbol("'|two words|").unwrap(), "two words");
        assert!(parse_symbol("'").is_err());
    }

    proptest! {
        #[test]
        fn prop_parse_tuple_recovers_atoms(atoms in prop::collection::vec("[a-z0-9?!*+-]{1,8}", 0..8)) {
            let text = format!("({})", atoms.join(" "));
            prop_assert_eq!(parse_tuple(&text).unwrap(), atoms);
        }

        #[test]
        fn prop_find_tuple_end_matches_length(atoms in prop::collection::vec("[a-z0-9]{1,6}", 0..6)) {
            let text = format!("({})", atoms.join(" "));
            prop_assert_eq!(find_tuple_end(&text), Some(text.len() - 1));
            prop_assert_eq!(find_tuple_end(&text[..text.len() - 1]), None);
        }
    }
}
