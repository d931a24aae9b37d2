//! Python Source Outline Scanner
//!
//! Structural scanner used by the module collector: reads a Python source
//! file and extracts top-level function and class definitions together with
//! class method names, without executing anything. Logical lines are
//! reassembled across bracket continuations, backslash continuations and
//! triple-quoted strings, and tokenizer-level defects (unterminated strings,
//! unbalanced brackets, missing header colons, bad dedents) surface as load
//! errors attributed to the offending line.

use std::fs;
use std::path::Path;

use super::error::{CollectError, CollectResult};

/// A collected function or method definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyFunction {
    pub name: String,
    pub line: usize,
}

/// A collected class definition with its immediate methods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyClass {
    pub name: String,
    pub line: usize,
    pub methods: Vec<PyFunction>,
    pub has_init: bool,
}

/// Structural outline of a module: its top-level definitions in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleOutline {
    pub functions: Vec<PyFunction>,
    pub classes: Vec<PyClass>,
}

/// Read and scan a module from disk
pub fn load_outline(path: &Path) -> CollectResult<ModuleOutline> {
    let bytes = fs::read(path).map_err(|e| CollectError::from_io(path, &e))?;
    let source = String::from_utf8(bytes)
        .map_err(|_| CollectError::load(path, 1, "source file is not valid UTF-8"))?;
    scan_source(path, &source)
}

/// Scan module source text into a structural outline
pub fn scan_source(path: &Path, source: &str) -> CollectResult<ModuleOutline> {
    let mut scanner = Scanner::new(path);
    for (idx, raw) in source.lines().enumerate() {
        scanner.feed_line(idx + 1, raw)?;
    }
    scanner.finish()
}

struct Scanner<'a> {
    path: &'a Path,
    outline: ModuleOutline,
    /// Open bracket stack with the line each bracket opened on
    brackets: Vec<(char, usize)>,
    /// Active triple-quoted string: quote char and opening line
    triple: Option<(char, usize)>,
    logical: String,
    logical_start: usize,
    logical_indent: usize,
    continuation: bool,
    indent_stack: Vec<usize>,
    /// Body indent of the top-level class currently being scanned
    class_body_indent: Option<Option<usize>>,
}

impl<'a> Scanner<'a> {
    fn new(path: &'a Path) -> Self {
        Self {
            path,
            outline: ModuleOutline::default(),
            brackets: Vec::new(),
            triple: None,
            logical: String::new(),
            logical_start: 0,
            logical_indent: 0,
            continuation: false,
            indent_stack: vec![0],
            class_body_indent: None,
        }
    }

    fn feed_line(&mut self, lineno: usize, raw: &str) -> CollectResult<()> {
        let mut cleaned = self.clean_line(lineno, raw)?;

        if self.logical.is_empty() && !self.continuation {
            if cleaned.trim().is_empty() && self.brackets.is_empty() && self.triple.is_none() {
                return Ok(());
            }
            self.logical_start = lineno;
            self.logical_indent = indent_of(raw);
        }

        self.continuation = false;
        if cleaned.trim_end().ends_with('\\') {
            let stripped = cleaned.trim_end().trim_end_matches('\\').to_string();
            cleaned = stripped;
            self.continuation = true;
        }

        if !self.logical.is_empty() {
            self.logical.push(' ');
        }
        self.logical.push_str(&cleaned);

        if self.continuation || !self.brackets.is_empty() || self.triple.is_some() {
            return Ok(());
        }

        let text = std::mem::take(&mut self.logical);
        let (start, indent) = (self.logical_start, self.logical_indent);
        self.process_logical(&text, start, indent)
    }

    fn finish(mut self) -> CollectResult<ModuleOutline> {
        if let Some((quote, start)) = self.triple {
            return Err(CollectError::load(
                self.path,
                start,
                format!("unterminated triple-quoted string ({0}{0}{0})", quote),
            ));
        }
        if let Some((open, line)) = self.brackets.first().copied() {
            return Err(CollectError::load(
                self.path,
                line,
                format!("unexpected end of file: '{}' was never closed", open),
            ));
        }
        if !self.logical.is_empty() {
            let text = std::mem::take(&mut self.logical);
            let (start, indent) = (self.logical_start, self.logical_indent);
            self.process_logical(&text, start, indent)?;
        }
        Ok(self.outline)
    }

    /// Strip comments and string literals from one physical line while
    /// tracking bracket and triple-quote state.
    fn clean_line(&mut self, lineno: usize, raw: &str) -> CollectResult<String> {
        let chars: Vec<char> = raw.chars().collect();
        let mut out = String::new();
        let mut i = 0;

        if let Some((quote, _)) = self.triple {
            match find_triple_close(&chars, 0, quote) {
                Some(after) => {
                    self.triple = None;
                    i = after;
                }
                None => return Ok(out),
            }
        }

        while i < chars.len() {
            let c = chars[i];
            match c {
                '#' => break,
                '\'' | '"' => {
                    if i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c {
                        match find_triple_close(&chars, i + 3, c) {
                            Some(after) => i = after,
                            None => {
                                self.triple = Some((c, lineno));
                                return Ok(out);
                            }
                        }
                    } else {
                        let mut j = i + 1;
                        let mut closed = false;
                        while j < chars.len() {
                            if chars[j] == '\\' {
                                j += 2;
                                continue;
                            }
                            if chars[j] == c {
                                closed = true;
                                break;
                            }
                            j += 1;
                        }
                        if !closed {
                            return Err(CollectError::load_with_source(
                                self.path,
                                lineno,
                                "unterminated string literal",
                                raw.trim_end().to_string(),
                            ));
                        }
                        i = j + 1;
                    }
                }
                '(' | '[' | '{' => {
                    self.brackets.push((c, lineno));
                    out.push(c);
                    i += 1;
                }
                ')' | ']' | '}' => {
                    match self.brackets.pop() {
                        Some((open, _)) if pair_matches(open, c) => {
                            out.push(c);
                            i += 1;
                        }
                        _ => {
                            return Err(CollectError::load_with_source(
                                self.path,
                                lineno,
                                format!("unmatched '{}'", c),
                                raw.trim_end().to_string(),
                            ));
                        }
                    }
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }
        Ok(out)
    }

    fn process_logical(&mut self, text: &str, line: usize, indent: usize) -> CollectResult<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let top = self.indent_stack.last().copied().unwrap_or(0);
        if indent > top {
            self.indent_stack.push(indent);
        } else if indent < top {
            while self.indent_stack.last().copied().unwrap_or(0) > indent {
                self.indent_stack.pop();
            }
            if self.indent_stack.last().copied().unwrap_or(0) != indent {
                return Err(CollectError::load(
                    self.path,
                    line,
                    "unindent does not match any outer indentation level",
                ));
            }
        }

        if indent == 0 {
            self.class_body_indent = None;
            if trimmed.starts_with('@') {
                return Ok(());
            }
            if let Some(rest) = strip_def(trimmed) {
                let name = leading_ident(rest);
                if name.is_empty() {
                    return Err(CollectError::load(self.path, line, "malformed 'def' statement"));
                }
                require_header_colon(self.path, line, trimmed)?;
                self.outline.functions.push(PyFunction { name, line });
            } else if let Some(rest) = trimmed.strip_prefix("class ") {
                let name = leading_ident(rest);
                if name.is_empty() {
                    return Err(CollectError::load(self.path, line, "malformed 'class' statement"));
                }
                require_header_colon(self.path, line, trimmed)?;
                self.outline.classes.push(PyClass {
                    name,
                    line,
                    methods: Vec::new(),
                    has_init: false,
                });
                self.class_body_indent = Some(None);
            }
            return Ok(());
        }

        // Inside the body of the most recent top-level class
        if let Some(body_indent) = self.class_body_indent {
            let body_indent = match body_indent {
                Some(level) => level,
                None => {
                    self.class_body_indent = Some(Some(indent));
                    indent
                }
            };
            if indent == body_indent {
                if trimmed.starts_with('@') {
                    return Ok(());
                }
                if let Some(rest) = strip_def(trimmed) {
                    let name = leading_ident(rest);
                    if name.is_empty() {
                        return Err(CollectError::load(self.path, line, "malformed 'def' statement"));
                    }
                    require_header_colon(self.path, line, trimmed)?;
                    if let Some(class) = self.outline.classes.last_mut() {
                        if name == "__init__" {
                            class.has_init = true;
                        } else {
                            class.methods.push(PyFunction { name, line });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn indent_of(raw: &str) -> usize {
    raw.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn pair_matches(open: char, close: char) -> bool {
    matches!((open, close), ('(', ')') | ('[', ']') | ('{', '}'))
}

fn strip_def(trimmed: &str) -> Option<&str> {
    if let Some(rest) = trimmed.strip_prefix("def ") {
        return Some(rest);
    }
    trimmed.strip_prefix("async ").and_then(|rest| rest.trim_start().strip_prefix("def "))
}

fn leading_ident(text: &str) -> String {
    text.trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

/// A definition header needs a `:` outside any bracket pair.
fn require_header_colon(path: &Path, line: usize, header: &str) -> CollectResult<()> {
    let mut depth: usize = 0;
    for c in header.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Ok(()),
            _ => {}
        }
    }
    Err(CollectError::load_with_source(
        path,
        line,
        "expected ':' at end of definition header",
        header.to_string(),
    ))
}

fn find_triple_close(chars: &[char], from: usize, quote: char) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        if chars[j] == '\\' {
            j += 2;
            continue;
        }
        if chars[j] == quote && j + 2 < chars.len() && chars[j + 1] == quote && chars[j + 2] == quote
        {
            return Some(j + 3);
        }
        j += 1;
    }
    None
}
