//! The resolved document: construction, the [`Loader`] options builder,
//! existence and overwrite operations, and the expanded-context display.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::env;
use crate::error::IniError;
use crate::parse;

/// A fully loaded and resolved configuration document.
///
/// One flat, upper-cased key/value namespace produced by expanding the
/// root file's include tree. Immutable after construction except through
/// [`set`](Ini::set). Independently constructed documents share nothing.
#[derive(Debug)]
pub struct Ini {
    env: HashMap<String, String>,
    pub(crate) fields: HashMap<String, String>,
    context: String,
    keys: Vec<String>,
}

impl Ini {
    /// Load and fully resolve a document from its root file, with default
    /// options (command exit statuses ignored).
    ///
    /// Cyclic includes (`a.ini` including `b.ini` including `a.ini`) are
    /// not detected and will grow the line buffer until memory runs out.
    pub fn load(path: impl AsRef<Path>) -> Result<Ini, IniError> {
        Loader::new(path).load()
    }

    /// Start a [`Loader`] to set options before loading.
    pub fn loader(path: impl AsRef<Path>) -> Loader {
        Loader::new(path)
    }

    /// Case-insensitive existence check against the live field map, so
    /// fields added through [`set`](Ini::set) are visible.
    pub fn exists(&self, field: &str) -> bool {
        self.fields.contains_key(&field.to_uppercase())
    }

    /// Overwrite a field directly. The value is stringified as-is: no
    /// reference or command substitution happens here.
    pub fn set(&mut self, field: &str, value: impl fmt::Display) {
        self.fields.insert(field.to_uppercase(), value.to_string());
    }

    /// Field names snapshotted at load completion, sorted. Later `set`
    /// calls do not extend this list; [`exists`](Ini::exists) consults
    /// the live map instead.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The fully expanded source: every included file spliced in place,
    /// bracketed by its sentinel comments.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The environment snapshot taken at construction (keys upper-cased,
    /// `__` read as `~`). Never refreshed.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }
}

impl fmt::Display for Ini {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.context)
    }
}

/// Options builder for loading an [`Ini`].
pub struct Loader {
    path: PathBuf,
    strict_commands: bool,
    env_vars: Option<Vec<(String, String)>>,
}

impl Loader {
    fn new(path: impl AsRef<Path>) -> Loader {
        Loader {
            path: path.as_ref().to_path_buf(),
            strict_commands: false,
            env_vars: None,
        }
    }

    /// Surface a non-zero `$(command)` exit status as
    /// [`IniError::CommandFailed`] instead of silently substituting the
    /// captured output (the default).
    pub fn strict_commands(mut self, strict: bool) -> Loader {
        self.strict_commands = strict;
        self
    }

    /// Snapshot these pairs instead of `std::env::vars()`. Primarily for
    /// tests that need a controlled environment.
    pub fn env_vars(mut self, vars: Vec<(String, String)>) -> Loader {
        self.env_vars = Some(vars);
        self
    }

    /// Read, expand, and resolve the document.
    pub fn load(self) -> Result<Ini, IniError> {
        let vars = match self.env_vars {
            Some(vars) => vars,
            None => std::env::vars().collect(),
        };
        let env = env::snapshot(vars);
        // The field map starts as the snapshot plus the implicit fields,
        // so any environment variable is referenceable from a value.
        let mut seed = env.clone();
        seed.extend(env::implicit_fields(&self.path));
        let parsed = parse::parse(&self.path, &env, seed, self.strict_commands)?;
        Ok(Ini {
            env,
            fields: parsed.fields,
            context: parsed.context,
            keys: parsed.keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_root(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root.ini");
        fs::write(&root, content).unwrap();
        (dir, root)
    }

    fn load(content: &str) -> Ini {
        let (_dir, root) = write_root(content);
        // Hold the TempDir until load completes.
        Ini::loader(&root).env_vars(vec![]).load().unwrap()
    }

    #[test]
    fn exists_is_case_insensitive() {
        let ini = load("[A]\nKey = 1\n");
        assert!(ini.exists("a~key"));
        assert!(ini.exists("A~KEY"));
        assert!(!ini.exists("A~OTHER"));
    }

    #[test]
    fn set_bypasses_interpolation() {
        let mut ini = load("[A]\nx = 1\n");
        ini.set("A~Raw", "%UNRESOLVED% $(not run)");
        assert_eq!(
            ini.find("a~raw", &[]).unwrap().unwrap(),
            "%UNRESOLVED% $(not run)"
        );
    }

    #[test]
    fn set_field_visible_to_exists_but_not_keys() {
        let mut ini = load("[A]\nx = 1\n");
        ini.set("NewField", 123);
        assert!(ini.exists("newfield"));
        assert!(!ini.keys().iter().any(|k| k == "NEWFIELD"));
        assert_eq!(ini.find("NewField", &[]).unwrap().unwrap(), "123");
    }

    #[test]
    fn keys_sorted_snapshot_contains_loaded_fields() {
        let ini = load("[A]\nb = 1\na = 2\n");
        assert!(ini.keys().contains(&"A~A".to_string()));
        assert!(ini.keys().contains(&"A~B".to_string()));
        let mut sorted = ini.keys().to_vec();
        sorted.sort();
        assert_eq!(sorted, ini.keys());
    }

    #[test]
    fn display_prints_expanded_context() {
        let ini = load("[A]\nx = 1\n");
        assert_eq!(format!("{ini}"), "[A]\nx = 1");
        assert_eq!(format!("{ini}"), ini.context());
    }

    #[test]
    fn implicit_fields_are_loaded() {
        let (_dir, root) = write_root("[A]\nwhere = %CUR_DIR%\n");
        let ini = Ini::loader(&root).env_vars(vec![]).load().unwrap();
        assert!(ini.exists("PATH_FINI"));
        assert!(ini.exists("TODAY"));
        assert_eq!(
            ini.find("A~WHERE", &[]).unwrap().unwrap(),
            ini.find("CUR_DIR", &[]).unwrap().unwrap()
        );
    }

    #[test]
    fn env_snapshot_is_captured_and_exposed() {
        let (_dir, root) = write_root("[A]\nx = 1\n");
        let ini = Ini::loader(&root)
            .env_vars(vec![("SEC__KEY".into(), "v".into())])
            .load()
            .unwrap();
        assert_eq!(ini.env()["SEC~KEY"], "v");
    }

    #[cfg(unix)]
    #[test]
    fn strict_commands_aborts_load_on_failure() {
        let (_dir, root) = write_root("[A]\nx = $(exit 2)\n");
        let err = Ini::loader(&root)
            .env_vars(vec![])
            .strict_commands(true)
            .load()
            .unwrap_err();
        assert!(matches!(err, IniError::CommandFailed { code: 2, .. }));
    }

    #[cfg(unix)]
    #[test]
    fn lenient_commands_substitute_output_silently() {
        let (_dir, root) = write_root("[A]\nx = a$(false)b\n");
        let ini = Ini::loader(&root).env_vars(vec![]).load().unwrap();
        assert_eq!(ini.find("A~X", &[]).unwrap().unwrap(), "ab");
    }

    #[test]
    fn missing_root_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = Ini::load(dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, IniError::Io { .. }));
    }
}
