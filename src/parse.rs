//! The sequential load pass.
//!
//! Classifies each line of the expanding buffer, expands includes in
//! place, assembles multi-line vectors, and populates the field map; once
//! the buffer is exhausted, runs the deferred second pass. All parse
//! state — active header, deferred keys, open vector, include frames —
//! lives in an explicit [`Parser`] struct threaded through each step
//! rather than hidden module state, so individual transitions stay
//! testable.
//!
//! Traversal is strictly sequential over one growing line array: an
//! include splices its wrapped lines at the read position and the pointer
//! only ever moves forward, which makes effective order depth-first.

use std::collections::HashMap;
use std::path::Path;

use crate::error::IniError;
use crate::include::{self, Frame};
use crate::pattern::{self, Line, Mode};
use crate::resolve;

/// Everything the load pass produces.
#[derive(Debug)]
pub(crate) struct Parsed {
    /// Final resolved field map.
    pub fields: HashMap<String, String>,
    /// All lines after include splicing, newline-joined.
    pub context: String,
    /// Field names at load completion, sorted.
    pub keys: Vec<String>,
}

/// Accumulator for a bracketed list that opened on an earlier line.
enum VecState {
    Idle,
    Open {
        field: String,
        acc: String,
        /// An environment override already supplied the whole value;
        /// continuation lines are consumed but discarded.
        ignore: bool,
    },
}

pub(crate) struct Parser<'a> {
    env: &'a HashMap<String, String>,
    strict_commands: bool,
    lines: Vec<String>,
    ptr: usize,
    frames: Vec<Frame>,
    header: Option<String>,
    deferred: Vec<String>,
    vector: VecState,
    fields: HashMap<String, String>,
}

/// Run the full load: read the root file, expand and resolve everything,
/// then the deferred second pass. `seed` is the initial field map (the
/// environment snapshot plus the implicit fields).
pub(crate) fn parse(
    root: &Path,
    env: &HashMap<String, String>,
    seed: HashMap<String, String>,
    strict_commands: bool,
) -> Result<Parsed, IniError> {
    let mut parser = Parser {
        env,
        strict_commands,
        lines: include::read_lines(root)?,
        ptr: 0,
        frames: vec![Frame::root(root)],
        header: None,
        deferred: Vec::new(),
        vector: VecState::Idle,
        fields: seed,
    };
    parser.run()?;
    parser.finish()
}

/// Split a raw line at its first `#`. The comment content is only ever
/// inspected when the text before it is empty (END-sentinel detection).
fn split_comment(raw: &str) -> (&str, &str) {
    match raw.split_once('#') {
        Some((text, comment)) => (text, comment),
        None => (raw, ""),
    }
}

impl Parser<'_> {
    fn run(&mut self) -> Result<(), IniError> {
        while self.ptr < self.lines.len() {
            let raw = self.lines[self.ptr].clone();
            let (text, comment) = split_comment(&raw);
            if text.is_empty() {
                if comment.starts_with(include::END_SENTINEL) && self.frames.len() > 1 {
                    // The sentinel is a spliced line, not part of the file
                    // we are popping back into; its directive line was
                    // already counted at splice time.
                    self.frames.pop();
                    self.ptr += 1;
                } else {
                    self.advance();
                }
                continue;
            }
            match pattern::classify(text) {
                None => return Err(self.format_error(text)),
                Some(Line::Include { path }) => self.expand_include(&path)?,
                Some(line) => {
                    self.apply(line)?;
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// Deferred fields first, then every field in the store, so ordinary
    /// fields pick up values completed by deferred resolution. Runs only
    /// when something was actually deferred.
    fn finish(mut self) -> Result<Parsed, IniError> {
        if !self.deferred.is_empty() {
            for field in std::mem::take(&mut self.deferred) {
                self.reresolve(&field)?;
            }
            let mut all: Vec<String> = self.fields.keys().cloned().collect();
            all.sort();
            for field in all {
                self.reresolve(&field)?;
            }
        }
        let mut keys: Vec<String> = self.fields.keys().cloned().collect();
        keys.sort();
        Ok(Parsed {
            context: self.lines.join("\n"),
            keys,
            fields: self.fields,
        })
    }

    /// Re-run resolution on a stored value, scoped to the field's own
    /// section prefix rather than whatever header the parse ended on.
    fn reresolve(&mut self, field: &str) -> Result<(), IniError> {
        let Some(raw) = self.fields.get(field).cloned() else {
            return Ok(());
        };
        let scope = field.split_once('~').map(|(s, _)| s).unwrap_or("");
        let resolved = resolve::resolve(&self.fields, scope, &raw, self.strict_commands)?;
        self.fields.insert(field.to_string(), resolved);
        Ok(())
    }

    fn advance(&mut self) {
        self.ptr += 1;
        if let Some(frame) = self.frames.last_mut() {
            frame.line_no += 1;
        }
    }

    fn frame(&self) -> &Frame {
        self.frames.last().expect("include stack is never empty")
    }

    fn scope(&self) -> &str {
        self.header.as_deref().unwrap_or("")
    }

    fn resolve_value(&self, raw: &str) -> Result<String, IniError> {
        resolve::resolve(&self.fields, self.scope(), raw, self.strict_commands)
    }

    fn field_name(&self, key: &str) -> Result<String, IniError> {
        match &self.header {
            Some(header) => Ok(resolve::scoped_field(header, key)),
            None => {
                let f = self.frame();
                Err(IniError::MissingHeader {
                    file: f.file.clone(),
                    line_no: f.line_no + 1,
                })
            }
        }
    }

    fn format_error(&self, text: &str) -> IniError {
        let f = self.frame();
        IniError::Format {
            line: text.trim().to_string(),
            file: f.file.clone(),
            line_no: f.line_no + 1,
        }
    }

    /// Splice the include target in place of the directive. The pointer
    /// steps only over the START sentinel, so the included file's first
    /// line is processed next (depth-first order). A missing target is
    /// skipped with a warning after one recheck.
    fn expand_include(&mut self, raw_path: &str) -> Result<(), IniError> {
        // The directive's path may itself carry references and commands.
        let target = self.resolve_value(raw_path)?;
        let child = self.frame().child(&target);
        if !include::wait_for(&child.file) {
            tracing::warn!(path = %child.file.display(), "include target still missing, skipping");
            self.advance();
            return Ok(());
        }
        let spliced = include::wrap_with_sentinels(&target, include::read_lines(&child.file)?);
        if let Some(parent) = self.frames.last_mut() {
            parent.line_no += 1; // past the directive
        }
        self.lines.splice(self.ptr..self.ptr + 1, spliced);
        self.frames.push(child);
        self.ptr += 1; // step over the START sentinel
        Ok(())
    }

    fn apply(&mut self, line: Line) -> Result<(), IniError> {
        match line {
            Line::Empty => {}
            Line::Header { name } => self.header = Some(name.to_uppercase()),
            Line::Scalar { key, value, mode } => self.assign_scalar(&key, &value, mode)?,
            Line::Vector { key, items, mode } => self.assign_vector(&key, &items, mode)?,
            Line::VectorStart { key, items, mode } => self.open_vector(&key, &items, mode)?,
            Line::VectorMid { items } => self.continue_vector(&items, false)?,
            Line::VectorEnd { items } => self.continue_vector(&items, true)?,
            // Intercepted by the caller before dispatch.
            Line::Include { .. } => {}
        }
        Ok(())
    }

    fn assign_scalar(&mut self, key: &str, value: &str, mode: Mode) -> Result<(), IniError> {
        let field = self.field_name(key)?;
        match mode {
            Mode::Immediate => {
                let resolved = self.resolve_value(value)?;
                self.fields.insert(field, resolve::blank_normalize(&resolved));
            }
            Mode::Env => {
                let literal = match self.env.get(&field) {
                    Some(env_value) => env_value.clone(),
                    None => value.to_string(),
                };
                let resolved = self.resolve_value(&literal)?;
                self.fields.insert(field, resolve::blank_normalize(&resolved));
            }
            Mode::Deferred => {
                self.fields
                    .insert(field.clone(), resolve::blank_normalize(value));
                self.deferred.push(field);
            }
        }
        Ok(())
    }

    fn assign_vector(&mut self, key: &str, items: &str, mode: Mode) -> Result<(), IniError> {
        let field = self.field_name(key)?;
        match mode {
            Mode::Immediate => {
                let resolved = self.resolve_value(&resolve::blank_normalize(items))?;
                self.fields.insert(field, resolve::blank_normalize(&resolved));
            }
            Mode::Env => {
                let literal = match self.env.get(&field) {
                    Some(env_value) => env_value.clone(),
                    None => items.to_string(),
                };
                let resolved = self.resolve_value(&resolve::blank_normalize(&literal))?;
                self.fields.insert(field, resolve::blank_normalize(&resolved));
            }
            Mode::Deferred => {
                self.fields
                    .insert(field.clone(), resolve::blank_normalize(items));
                self.deferred.push(field);
            }
        }
        Ok(())
    }

    fn open_vector(&mut self, key: &str, items: &str, mode: Mode) -> Result<(), IniError> {
        let field = self.field_name(key)?;
        if mode == Mode::Deferred {
            self.deferred.push(field.clone());
        }
        if mode == Mode::Env
            && let Some(env_value) = self.env.get(&field)
        {
            // The override is the complete value; resolve and store it now
            // and discard the continuation lines.
            let resolved = self.resolve_value(&resolve::blank_normalize(env_value))?;
            self.fields
                .insert(field.clone(), resolve::blank_normalize(&resolved));
            self.vector = VecState::Open {
                field,
                acc: String::new(),
                ignore: true,
            };
            return Ok(());
        }
        self.vector = VecState::Open {
            field,
            acc: resolve::blank_normalize(items),
            ignore: false,
        };
        Ok(())
    }

    fn continue_vector(&mut self, items: &str, closing: bool) -> Result<(), IniError> {
        match std::mem::replace(&mut self.vector, VecState::Idle) {
            VecState::Idle => {
                let f = self.frame();
                Err(IniError::DanglingVector {
                    file: f.file.clone(),
                    line_no: f.line_no + 1,
                })
            }
            VecState::Open { field, acc, ignore } if ignore => {
                if !closing {
                    self.vector = VecState::Open { field, acc, ignore };
                }
                Ok(())
            }
            VecState::Open {
                field,
                mut acc,
                ignore,
            } => {
                let fragment = resolve::blank_normalize(items);
                if !acc.is_empty() && !fragment.is_empty() {
                    acc.push(' ');
                }
                acc.push_str(&fragment);
                if closing {
                    if self.deferred.contains(&field) {
                        // Deferred vectors store the accumulated literal
                        // raw; the post-load reread resolves it.
                        self.fields.insert(field, resolve::blank_normalize(&acc));
                    } else {
                        let resolved = self.resolve_value(&acc)?;
                        self.fields.insert(field, resolve::blank_normalize(&resolved));
                    }
                } else {
                    self.vector = VecState::Open { field, acc, ignore };
                }
                Ok(())
            }
        }
    }
}
