//! Value resolution: `%REF%` substitution and `$(command)` execution.
//!
//! Pure functions over a preloaded field map — no file I/O happens here,
//! so the whole pipeline is testable with synthetic maps. The one side
//! effect is the subprocess spawned for each `$(...)` occurrence.
//!
//! Order matters: references are expanded before commands, so a `%REF%`
//! whose value is a `$(...)` pattern still gets executed. References are
//! collected from the input in a single pass; replacement text is not
//! rescanned within the same call. Values that need another round (a
//! reference producing another reference) pick it up in the post-load
//! reread driven by [`parse`](crate::parse).

use std::collections::HashMap;
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::IniError;

static BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("blank pattern is valid"));
static REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"%([^%\s]+)%").expect("ref pattern is valid"));

/// Collapse every whitespace run to a single space and trim the ends.
pub(crate) fn blank_normalize(s: &str) -> String {
    BLANKS.replace_all(s, " ").trim().to_string()
}

/// Upper-cased field name for `key` under `scope`. An empty scope means a
/// global key.
pub(crate) fn scoped_field(scope: &str, key: &str) -> String {
    if scope.is_empty() {
        key.to_uppercase()
    } else {
        format!("{scope}~{}", key.to_uppercase())
    }
}

/// Replace every `%NAME%` with another field's value.
///
/// Lookup prefers the name scoped to `scope` (`SCOPE~NAME`), falling back
/// to the bare upper-cased global name. Missing both propagates as
/// [`IniError::KeyNotFound`].
pub(crate) fn substitute_refs(
    fields: &HashMap<String, String>,
    scope: &str,
    s: &str,
) -> Result<String, IniError> {
    let names: Vec<String> = REF.captures_iter(s).map(|c| c[1].to_string()).collect();
    let mut out = s.to_string();
    for name in names {
        let scoped = scoped_field(scope, &name);
        let value = fields
            .get(&scoped)
            .or_else(|| fields.get(&name.to_uppercase()))
            .ok_or_else(|| IniError::KeyNotFound(name.to_uppercase()))?;
        out = out.replace(&format!("%{name}%"), value);
    }
    Ok(out)
}

/// Replace every `$(command)` with the command's captured stdout.
///
/// Spans are found by parenthesis-depth matching, so each occurrence is a
/// separate command and nested parentheses inside one command survive.
/// In lenient mode (the default) the exit status is ignored and a failing
/// command contributes only its possibly-empty output; `strict` surfaces
/// a non-zero status as [`IniError::CommandFailed`].
pub(crate) fn run_commands(s: &str, strict: bool) -> Result<String, IniError> {
    let spans = command_spans(s);
    if spans.is_empty() {
        return Ok(s.to_string());
    }
    let mut out = String::with_capacity(s.len());
    let mut last = 0;
    for (start, end) in spans {
        out.push_str(&s[last..start]);
        out.push_str(&shell(&s[start + 2..end - 1], strict)?);
        last = end;
    }
    out.push_str(&s[last..]);
    Ok(out)
}

/// Full resolution: references first, then commands.
pub(crate) fn resolve(
    fields: &HashMap<String, String>,
    scope: &str,
    raw: &str,
    strict: bool,
) -> Result<String, IniError> {
    run_commands(&substitute_refs(fields, scope, raw)?, strict)
}

/// Byte ranges of each `$(`...matching`)` span, unclosed openers ignored.
fn command_spans(s: &str) -> Vec<(usize, usize)> {
    let bytes = s.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'$' && bytes[i + 1] == b'(' {
            let mut depth = 1usize;
            let mut j = i + 2;
            while j < bytes.len() && depth > 0 {
                match bytes[j] {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    _ => {}
                }
                j += 1;
            }
            if depth == 0 {
                spans.push((i, j));
                i = j;
                continue;
            }
        }
        i += 1;
    }
    spans
}

fn shell(command: &str, strict: bool) -> Result<String, IniError> {
    #[cfg(unix)]
    let output = Command::new("sh").arg("-c").arg(command).output();
    #[cfg(windows)]
    let output = Command::new("cmd").arg("/C").arg(command).output();

    let output = output.map_err(|source| IniError::Spawn {
        command: command.to_string(),
        source,
    })?;
    if strict && !output.status.success() {
        return Err(IniError::CommandFailed {
            command: command.to_string(),
            code: output.status.code().unwrap_or(-1),
        });
    }
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // --- blank normalization ---

    #[test]
    fn blanks_collapse_and_trim() {
        assert_eq!(blank_normalize("  a \t b\n\nc  "), "a b c");
        assert_eq!(blank_normalize(""), "");
    }

    // --- field naming ---

    #[test]
    fn scoped_field_joins_with_tilde() {
        assert_eq!(scoped_field("STRAT", "window"), "STRAT~WINDOW");
    }

    #[test]
    fn empty_scope_is_global() {
        assert_eq!(scoped_field("", "window"), "WINDOW");
    }

    // --- reference substitution ---

    #[test]
    fn scoped_lookup_wins_over_global() {
        let f = fields(&[("STRAT~X", "scoped"), ("X", "global")]);
        assert_eq!(substitute_refs(&f, "STRAT", "%x%").unwrap(), "scoped");
    }

    #[test]
    fn falls_back_to_global() {
        let f = fields(&[("X", "global")]);
        assert_eq!(substitute_refs(&f, "STRAT", "%X%").unwrap(), "global");
    }

    #[test]
    fn cross_section_reference() {
        let f = fields(&[("A~X", "5")]);
        assert_eq!(substitute_refs(&f, "B", "%A~X%").unwrap(), "5");
    }

    #[test]
    fn missing_reference_is_key_not_found() {
        let f = fields(&[]);
        let err = substitute_refs(&f, "", "%NOPE%").unwrap_err();
        assert!(matches!(err, IniError::KeyNotFound(k) if k == "NOPE"));
    }

    #[test]
    fn repeated_reference_replaced_everywhere() {
        let f = fields(&[("D", "x")]);
        assert_eq!(substitute_refs(&f, "", "%D%/%D%").unwrap(), "x/x");
    }

    #[test]
    fn replacement_text_not_rescanned() {
        // B's value holds a reference pattern; one call leaves it intact.
        let f = fields(&[("B", "%C%"), ("C", "deep")]);
        assert_eq!(substitute_refs(&f, "", "%B%").unwrap(), "%C%");
    }

    // --- command substitution ---

    #[test]
    fn span_scan_finds_each_occurrence() {
        let spans = command_spans("a $(echo x) b $(echo y)");
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn span_scan_handles_nested_parens() {
        let s = "$(echo (ok))";
        assert_eq!(command_spans(s), vec![(0, s.len())]);
    }

    #[test]
    fn unclosed_command_left_alone() {
        assert!(command_spans("$(echo x").is_empty());
        assert_eq!(run_commands("$(echo x", false).unwrap(), "$(echo x");
    }

    #[cfg(unix)]
    #[test]
    fn command_output_substituted() {
        assert_eq!(run_commands("v=$(echo hi)", false).unwrap(), "v=hi");
    }

    #[cfg(unix)]
    #[test]
    fn two_commands_run_separately() {
        assert_eq!(
            run_commands("$(echo a)-$(echo b)", false).unwrap(),
            "a-b"
        );
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_silent_by_default() {
        assert_eq!(run_commands("x$(false)y", false).unwrap(), "xy");
    }

    #[cfg(unix)]
    #[test]
    fn strict_mode_surfaces_failure() {
        let err = run_commands("$(exit 3)", true).unwrap_err();
        assert!(matches!(
            err,
            IniError::CommandFailed { code: 3, .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn reference_expanding_to_command_executes() {
        let f = fields(&[("CMD", "$(echo ran)")]);
        assert_eq!(resolve(&f, "", "%CMD%", false).unwrap(), "ran");
    }

    #[test]
    fn plain_text_passes_through() {
        let f = fields(&[]);
        assert_eq!(resolve(&f, "", "hello world", false).unwrap(), "hello world");
    }
}
