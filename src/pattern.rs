//! Line classification for the extended-INI dialect.
//!
//! A logical line — already stripped of its `#` comment — is matched
//! against an ordered table of recognized forms. The order is part of the
//! contract, not an implementation detail: several patterns are textual
//! subsets of others, so earlier entries must win. In particular the
//! continuation forms `vec_mid` and `vec_end` are unanchored catch-alls
//! that would swallow almost any line, and must stay last.
//!
//! Items inside a vector literal are not split here; they travel as one
//! joined string and are only broken into elements when a vector-typed
//! accessor is called.

use once_cell::sync::Lazy;
use regex::Regex;

/// How an assignment's value is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// `=` — resolved as soon as the line is parsed.
    Immediate,
    /// `|=` — a matching environment variable wins over the file literal.
    Env,
    /// `$=` — stored raw, resolved after the whole include tree is loaded.
    Deferred,
}

/// One classified line with its captured fields.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Line {
    Include { path: String },
    Empty,
    Header { name: String },
    Scalar { key: String, value: String, mode: Mode },
    Vector { key: String, items: String, mode: Mode },
    VectorStart { key: String, items: String, mode: Mode },
    VectorMid { items: String },
    VectorEnd { items: String },
}

#[derive(Clone, Copy)]
enum Form {
    Include,
    Empty,
    Header,
    Scalar(Mode),
    Vector(Mode),
    VectorStart(Mode),
    VectorMid,
    VectorEnd,
}

/// Recognized forms in priority order. First match wins.
static MATCHERS: Lazy<Vec<(Form, Regex)>> = Lazy::new(|| {
    [
        (Form::Include, r"^include\s+<(.*ini)>\s*$"),
        (Form::Empty, r"^\s*$"),
        (Form::Header, r"^\[(.*)\]\s*$"),
        (Form::Scalar(Mode::Immediate), r"^([\w.]+)\s*=\s*([^\[\]]+)\s*$"),
        (Form::Scalar(Mode::Env), r"^([\w.]+)\s*\|=\s*([^\[\]]+)\s*$"),
        (Form::Scalar(Mode::Deferred), r"^([\w.]+)\s*\$=\s*([^\[\]]+)\s*$"),
        (Form::Vector(Mode::Immediate), r"^([\w.]+)\s*=\s*\[(.*)\]\s*$"),
        (Form::Vector(Mode::Env), r"^([\w.]+)\s*\|=\s*\[(.*)\]\s*$"),
        (Form::Vector(Mode::Deferred), r"^([\w.]+)\s*\$=\s*\[(.*)\]\s*$"),
        (
            Form::VectorStart(Mode::Immediate),
            r"^([\w.]+)\s*=\s*\[([^\]]*)$",
        ),
        (Form::VectorStart(Mode::Env), r"^([\w.]+)\s*\|=\s*\[([^\]]*)$"),
        (
            Form::VectorStart(Mode::Deferred),
            r"^([\w.]+)\s*\$=\s*\[([^\]]*)$",
        ),
        (Form::VectorMid, r"\s*([^<>\[\]]+)\s*$"),
        (Form::VectorEnd, r"\s*([^\[]*)\]\s*$"),
    ]
    .into_iter()
    .map(|(form, pat)| (form, Regex::new(pat).expect("classifier pattern is valid")))
    .collect()
});

/// Classify one comment-stripped line. `None` means no recognized form
/// matched — a hard parse error at the caller's discretion.
pub(crate) fn classify(text: &str) -> Option<Line> {
    for (form, re) in MATCHERS.iter() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let line = match form {
            Form::Include => Line::Include {
                path: caps[1].to_string(),
            },
            Form::Empty => Line::Empty,
            Form::Header => Line::Header {
                name: caps[1].to_string(),
            },
            Form::Scalar(mode) => Line::Scalar {
                key: caps[1].to_string(),
                value: caps[2].to_string(),
                mode: *mode,
            },
            Form::Vector(mode) => Line::Vector {
                key: caps[1].to_string(),
                items: caps[2].to_string(),
                mode: *mode,
            },
            Form::VectorStart(mode) => Line::VectorStart {
                key: caps[1].to_string(),
                items: caps[2].to_string(),
                mode: *mode,
            },
            Form::VectorMid => Line::VectorMid {
                items: caps[1].to_string(),
            },
            Form::VectorEnd => Line::VectorEnd {
                items: caps[1].to_string(),
            },
        };
        return Some(line);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_form() {
        assert_eq!(
            classify("include <../common/base.ini>"),
            Some(Line::Include {
                path: "../common/base.ini".into()
            })
        );
    }

    #[test]
    fn include_requires_ini_suffix() {
        assert_eq!(classify("include <notes.txt>"), None);
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(classify(""), Some(Line::Empty));
        assert_eq!(classify("   "), Some(Line::Empty));
    }

    #[test]
    fn header_form() {
        assert_eq!(
            classify("[Strategy]"),
            Some(Line::Header {
                name: "Strategy".into()
            })
        );
    }

    #[test]
    fn empty_header_is_recognized() {
        assert_eq!(classify("[]"), Some(Line::Header { name: "".into() }));
    }

    #[test]
    fn scalar_modes() {
        let Some(Line::Scalar { key, value, mode }) = classify("window = 20 ") else {
            panic!("expected scalar");
        };
        assert_eq!(key, "window");
        assert_eq!(value.trim(), "20");
        assert_eq!(mode, Mode::Immediate);

        assert!(matches!(
            classify("window |= 20"),
            Some(Line::Scalar {
                mode: Mode::Env,
                ..
            })
        ));
        assert!(matches!(
            classify("window $= 20"),
            Some(Line::Scalar {
                mode: Mode::Deferred,
                ..
            })
        ));
    }

    #[test]
    fn dotted_keys_allowed() {
        assert!(matches!(
            classify("risk.max_drawdown = 0.2"),
            Some(Line::Scalar { .. })
        ));
    }

    #[test]
    fn single_line_vector_beats_vector_start() {
        assert!(matches!(
            classify("xs = [1 2 3]"),
            Some(Line::Vector {
                mode: Mode::Immediate,
                ..
            })
        ));
    }

    #[test]
    fn unclosed_bracket_is_vector_start() {
        let Some(Line::VectorStart { key, items, mode }) = classify("xs |= [1 2") else {
            panic!("expected vector start");
        };
        assert_eq!(key, "xs");
        assert_eq!(items, "1 2");
        assert_eq!(mode, Mode::Env);
    }

    #[test]
    fn continuation_lines() {
        assert_eq!(
            classify("  3 4  "),
            Some(Line::VectorMid {
                items: "3 4  ".into()
            })
        );
        assert!(matches!(classify("5 6]"), Some(Line::VectorEnd { .. })));
    }

    #[test]
    fn closing_line_never_classifies_as_mid() {
        // `vec_mid` excludes `]`, so a closing fragment must fall through
        // to `vec_end`.
        assert!(matches!(classify("9]"), Some(Line::VectorEnd { .. })));
    }

    #[test]
    fn garbage_is_unclassified() {
        assert_eq!(classify("include <x>  <y>"), None);
    }

    #[test]
    fn scalar_value_may_contain_refs_and_commands() {
        let Some(Line::Scalar { value, .. }) = classify("out = %CUR_DIR%/run-$(hostname)") else {
            panic!("expected scalar");
        };
        assert_eq!(value, "%CUR_DIR%/run-$(hostname)");
    }
}
