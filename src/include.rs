//! Include expansion machinery: frames, sentinels, splicing.
//!
//! `include <path>` is expanded by splicing the target file's lines into
//! the active line buffer in place of the directive, bracketed by a
//! START sentinel comment and an END sentinel comment. The read pointer
//! does not jump past the splice, so traversal is depth-first. A LIFO
//! stack of [`Frame`]s tracks each open file's directory (for resolving
//! its relative includes) and its own line counter (for diagnostics);
//! reaching the END sentinel pops the frame.
//!
//! A missing include target is non-fatal: one warn-and-recheck after a
//! short pause (slow-mounting network filesystems), then the directive is
//! skipped with a warning. Cyclic includes are not detected.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::IniError;

/// Comment text carried by the synthetic line closing a spliced include.
/// A line that is empty before its `#` and whose comment starts with this
/// pops the current frame.
pub(crate) const END_SENTINEL: &str = " END include";

const RECHECK_DELAY: Duration = Duration::from_millis(300);

/// One open file on the include stack.
#[derive(Debug)]
pub(crate) struct Frame {
    /// Directory this frame's relative includes resolve against.
    pub dir: PathBuf,
    /// Path for diagnostics.
    pub file: PathBuf,
    /// 0-based index of the line currently being read in this file.
    pub line_no: usize,
}

impl Frame {
    /// Root frame: the entry file, made absolute against the working
    /// directory without touching the filesystem.
    pub fn root(path: &Path) -> Frame {
        let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        Frame {
            dir: abs.parent().map(Path::to_path_buf).unwrap_or_default(),
            file: abs,
            line_no: 0,
        }
    }

    /// Child frame for `include <raw>` found inside this frame. Relative
    /// paths resolve against this frame's directory; absolute paths pass
    /// through unchanged.
    pub fn child(&self, raw: &str) -> Frame {
        let file = self.dir.join(raw);
        Frame {
            dir: file.parent().map(Path::to_path_buf).unwrap_or_default(),
            file,
            line_no: 0,
        }
    }
}

/// Existence check tolerating slow mounts: warn and recheck once after a
/// short pause.
pub(crate) fn wait_for(path: &Path) -> bool {
    if path.exists() {
        return true;
    }
    tracing::warn!(path = %path.display(), "include target missing, rechecking");
    std::thread::sleep(RECHECK_DELAY);
    path.exists()
}

/// Whole-file read split into lines, terminators removed. The handle is
/// released before parsing continues.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>, IniError> {
    let text = std::fs::read_to_string(path).map_err(|source| IniError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Bracket an included file's lines with its sentinel comments. The
/// raw directive path rides along for inspection of the expanded context.
pub(crate) fn wrap_with_sentinels(raw_path: &str, mut lines: Vec<String>) -> Vec<String> {
    lines.insert(0, format!("# START include <{raw_path}>"));
    lines.push(format!("# END include <{raw_path}>"));
    lines
}
