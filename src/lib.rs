//! Layered configuration for build/run platforms, read from an extended
//! INI dialect. Point at a root file and get back one flat, resolved
//! key/value namespace.
//!
//! ```ignore
//! let ini = Ini::load("conf/main.ini")?;
//! let window = ini.find_int("Strat~Window", &[])?;
//! ```
//!
//! That single call expands the root file's whole `include` tree, applies
//! environment overrides, interpolates references and shell commands, and
//! hands you a store you query through typed accessors.
//!
//! # The dialect
//!
//! One directive or assignment per line; `#` starts a comment running to
//! the end of the line.
//!
//! ```text
//! include <risk/limits.ini>    # spliced in place, depth-first
//!
//! [Strat]                      # case-insensitive section header
//! window  = 20                 # immediate assignment
//! root   |= /data              # an env var STRAT__ROOT wins over /data
//! report $= %ROOT%/%DATE%.txt  # deferred: resolved after the full load
//! names   = [alpha beta
//!            gamma]            # vector, may span lines
//! ```
//!
//! Keys are upper-cased and scoped by the active header: `window` above
//! becomes the field `STRAT~WINDOW`. The empty header `[]` switches to
//! global, unscoped keys. Within the same load, the last assignment to a
//! field wins.
//!
//! # Value interpolation
//!
//! - **`%NAME%`** — another field's resolved value. Lookup prefers the
//!   name scoped to the owning field's section (`STRAT~NAME`), then the
//!   bare global name; missing both fails the load.
//! - **`$(command)`** — the captured stdout of a shell command, executed
//!   synchronously at resolution time. Exit statuses are ignored by
//!   default; [`Loader::strict_commands`] turns a non-zero status into an
//!   error.
//! - **`$key$`** — left alone at load time, replaced from the keyword
//!   arguments an accessor call supplies.
//!
//! Immediate (`=`) assignments resolve as soon as their line is parsed,
//! so they can only reference what is already defined. Deferred (`$=`)
//! assignments store their literal and resolve after the entire include
//! tree has loaded — first every deferred field, then every field in the
//! store, so ordinary fields referencing deferred ones catch up too.
//!
//! # Layer precedence
//!
//! ```text
//! File literal          key = value
//!        ↑ overridden by
//! Environment           KEY (or SECTION__KEY), only for |= assignments
//!        ↑ overridden by
//! Explicit set()        never interpolated
//! ```
//!
//! The environment is snapshotted once at construction — keys upper-cased
//! with `__` read as `~` — and every variable in it is also seeded into
//! the field map, so `%HOME%` works in any value. Four implicit fields
//! join the seed: `PATH_FINI` (absolute root path), `CUR_DIR` (its
//! directory), and `TODAY`/`DATE` (`YYYYMMDD`).
//!
//! # Includes
//!
//! `include <path.ini>` splices the target's lines — bracketed by
//! sentinel comments — directly into the line buffer, so traversal is
//! depth-first and the expanded text is inspectable afterwards via
//! [`Ini::context`] (also the `Display` form). Relative paths resolve
//! against the *including* file's directory. A missing target is
//! rechecked once after a short pause, then skipped with a warning
//! (`tracing`); any fields it would have defined are simply absent.
//! Cyclic includes are not detected.
//!
//! # Typed access
//!
//! `find*` accessors require the field and convert its string value;
//! `get*` accessors return a caller default when the field is absent.
//! Scalars and vectors of string/int/float/bool are covered. A value
//! equal to `none` (any case) reads as `None` from every accessor — and
//! a present `none` is *not* the same as absent: `get*` does not
//! substitute the default for it.
//!
//! # Error handling
//!
//! Fallible operations return [`IniError`]. A line matching no recognized
//! form, or an assignment before any header, aborts the load with the
//! source file and 1-based line number. Reference lookups and type
//! conversions fail the individual call. See the [`error`] module.

pub mod error;

mod accessor;
mod document;
mod env;
mod include;
mod parse;
mod pattern;
mod resolve;

pub use accessor::Kwargs;
pub use document::{Ini, Loader};
pub use error::IniError;
