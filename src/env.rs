//! Environment snapshot and platform-provided implicit fields.
//!
//! The snapshot is taken once, at document construction, and never
//! refreshed: later changes to the process environment are invisible to an
//! already-loaded document. Keys are upper-cased and the two-character
//! literal `__` is read as `~`, so a shell that cannot express `~` in a
//! variable name can still target a section-scoped field
//! (`STRAT__WINDOW` overrides `STRAT~WINDOW`).

use std::collections::HashMap;
use std::path::Path;

use time::OffsetDateTime;

/// Absolute path of the root file.
pub(crate) const PATH_FINI: &str = "PATH_FINI";
/// Directory containing the root file.
pub(crate) const CUR_DIR: &str = "CUR_DIR";
/// Today's date, `YYYYMMDD`. Exposed under two names.
pub(crate) const TODAY: &str = "TODAY";
pub(crate) const DATE: &str = "DATE";

/// Snapshot environment variables into override-lookup form.
///
/// Takes an iterator so tests can pass synthetic data instead of
/// `std::env::vars()`.
pub(crate) fn snapshot(
    vars: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, String> {
    vars.into_iter()
        .map(|(k, v)| (k.to_uppercase().replace("__", "~"), v))
        .collect()
}

/// Implicit fields every document starts with: where the root file lives,
/// and today's date for path templating.
pub(crate) fn implicit_fields(root: &Path) -> Vec<(String, String)> {
    let abs = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let dir = abs
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let today = today_stamp();
    vec![
        (PATH_FINI.to_string(), abs.display().to_string()),
        (CUR_DIR.to_string(), dir.display().to_string()),
        (TODAY.to_string(), today.clone()),
        (DATE.to_string(), today),
    ]
}

/// Local date as `YYYYMMDD`, falling back to UTC when the local offset
/// cannot be determined (multi-threaded processes on some platforms).
fn today_stamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format!(
        "{:04}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day()
    )
}
