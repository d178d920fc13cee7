// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

/// A program plus the argv produced by templating its options string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub program: String,
    pub args: Vec<String>,
}

/// Builds the command to run for `program_template`/`opts_template`,
/// substituting `{file}` with `file`'s path in both. The options string is
/// then split into tokens, preserving double-quoted substrings as single
/// arguments (quotes stripped); if the substituted file path contains
/// whitespace it is wrapped in double quotes before splitting so token
/// splitting keeps it as one argument.
pub fn build(program_template: &str, opts_template: &str, file: Option<&Path>) -> Command {
    let program = substitute(program_template, file, false);
    let opts = substitute(opts_template, file, true);
    Command {
        program,
        args: tokenize(&opts),
    }
}

fn substitute(template: &str, file: Option<&Path>, quote_if_whitespace: bool) -> String {
    let Some(file) = file else {
        return template.to_string();
    };
    let path = file.to_string_lossy();
    let replacement = if quote_if_whitespace && path.contains(char::is_whitespace) {
        format!("\"{path}\"")
    } else {
        path.to_string()
    };
    template.replace("{file}", &replacement)
}

/// Splits a string into tokens on whitespace, treating a double-quoted
/// substring as a single token with the quotes stripped.
pub fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let mut token = String::new();
        if c == '"' {
            chars.next();
            for c in chars.by_ref() {
                if c == '"' {
                    break;
                }
                token.push(c);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                if c == '"' {
                    chars.next();
                    for c in chars.by_ref() {
                        if c == '"' {
                            break;
                        }
                        token.push(c);
                    }
                    continue;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    tokens
}
