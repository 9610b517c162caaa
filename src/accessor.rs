//! Typed access over the resolved field map.
//!
//! Two families. `find_*` requires the field to exist and fails with
//! [`IniError::KeyNotFound`] otherwise; `get_*` takes a default returned
//! when the field is entirely absent. Both map a value equal to `none`
//! (any letter case) to `Ok(None)` — a present-but-none field never falls
//! back to the `get_*` default.
//!
//! Every accessor takes a [`Kwargs`] slice; each `(key, value)` pair
//! replaces `$key$` tokens in the value at read time only. The stored
//! value is never modified.
//!
//! Vector accessors split the stored string on spaces (float vectors
//! also accept commas) and convert element-wise. Integer vector elements
//! are parsed through floating point first, so `3.0` narrows to `3`.

use crate::document::Ini;
use crate::error::IniError;

/// Read-time keyword substitutions: each `(key, value)` replaces `$key$`.
pub type Kwargs<'a> = &'a [(&'a str, &'a str)];

const NONE_SENTINEL: &str = "none";

impl Ini {
    fn lookup(&self, field: &str, kwargs: Kwargs) -> Result<String, IniError> {
        let stored = self
            .fields
            .get(&field.to_uppercase())
            .ok_or_else(|| IniError::KeyNotFound(field.to_uppercase()))?;
        let mut out = stored.clone();
        for (key, replacement) in kwargs {
            out = out.replace(&format!("${key}$"), replacement);
        }
        Ok(out)
    }

    // --- find family: the field must exist ---

    /// String value of the field, or `None` for the `none` sentinel.
    pub fn find(&self, field: &str, kwargs: Kwargs) -> Result<Option<String>, IniError> {
        let v = self.lookup(field, kwargs)?;
        Ok(if v.eq_ignore_ascii_case(NONE_SENTINEL) {
            None
        } else {
            Some(v)
        })
    }

    pub fn find_bool(&self, field: &str, kwargs: Kwargs) -> Result<Option<bool>, IniError> {
        self.find(field, kwargs)?.map(|v| to_bool(&v)).transpose()
    }

    pub fn find_int(&self, field: &str, kwargs: Kwargs) -> Result<Option<i64>, IniError> {
        self.find(field, kwargs)?.map(|v| to_int(&v)).transpose()
    }

    pub fn find_float(&self, field: &str, kwargs: Kwargs) -> Result<Option<f64>, IniError> {
        self.find(field, kwargs)?.map(|v| to_float(&v)).transpose()
    }

    pub fn find_str_vec(
        &self,
        field: &str,
        kwargs: Kwargs,
    ) -> Result<Option<Vec<String>>, IniError> {
        Ok(self
            .find(field, kwargs)?
            .map(|v| split_items(&v).map(str::to_string).collect()))
    }

    pub fn find_bool_vec(
        &self,
        field: &str,
        kwargs: Kwargs,
    ) -> Result<Option<Vec<bool>>, IniError> {
        self.find(field, kwargs)?
            .map(|v| split_items(&v).map(to_bool).collect())
            .transpose()
    }

    pub fn find_int_vec(&self, field: &str, kwargs: Kwargs) -> Result<Option<Vec<i64>>, IniError> {
        self.find(field, kwargs)?
            .map(|v| split_items(&v).map(to_int_lenient).collect())
            .transpose()
    }

    pub fn find_float_vec(
        &self,
        field: &str,
        kwargs: Kwargs,
    ) -> Result<Option<Vec<f64>>, IniError> {
        self.find(field, kwargs)?
            .map(|v| split_float_items(&v).map(to_float).collect())
            .transpose()
    }

    // --- get family: absent fields fall back to the default ---

    /// Like [`find`](Ini::find), but an absent field yields `default`.
    pub fn get(
        &self,
        field: &str,
        default: Option<&str>,
        kwargs: Kwargs,
    ) -> Result<Option<String>, IniError> {
        if self.exists(field) {
            self.find(field, kwargs)
        } else {
            Ok(default.map(str::to_string))
        }
    }

    pub fn get_bool(
        &self,
        field: &str,
        default: Option<bool>,
        kwargs: Kwargs,
    ) -> Result<Option<bool>, IniError> {
        if self.exists(field) {
            self.find_bool(field, kwargs)
        } else {
            Ok(default)
        }
    }

    pub fn get_int(
        &self,
        field: &str,
        default: Option<i64>,
        kwargs: Kwargs,
    ) -> Result<Option<i64>, IniError> {
        if self.exists(field) {
            self.find_int(field, kwargs)
        } else {
            Ok(default)
        }
    }

    pub fn get_float(
        &self,
        field: &str,
        default: Option<f64>,
        kwargs: Kwargs,
    ) -> Result<Option<f64>, IniError> {
        if self.exists(field) {
            self.find_float(field, kwargs)
        } else {
            Ok(default)
        }
    }

    pub fn get_str_vec(
        &self,
        field: &str,
        default: Option<&[&str]>,
        kwargs: Kwargs,
    ) -> Result<Option<Vec<String>>, IniError> {
        if self.exists(field) {
            self.find_str_vec(field, kwargs)
        } else {
            Ok(default.map(|d| d.iter().map(|s| s.to_string()).collect()))
        }
    }

    pub fn get_bool_vec(
        &self,
        field: &str,
        default: Option<&[bool]>,
        kwargs: Kwargs,
    ) -> Result<Option<Vec<bool>>, IniError> {
        if self.exists(field) {
            self.find_bool_vec(field, kwargs)
        } else {
            Ok(default.map(<[bool]>::to_vec))
        }
    }

    pub fn get_int_vec(
        &self,
        field: &str,
        default: Option<&[i64]>,
        kwargs: Kwargs,
    ) -> Result<Option<Vec<i64>>, IniError> {
        if self.exists(field) {
            self.find_int_vec(field, kwargs)
        } else {
            Ok(default.map(<[i64]>::to_vec))
        }
    }

    pub fn get_float_vec(
        &self,
        field: &str,
        default: Option<&[f64]>,
        kwargs: Kwargs,
    ) -> Result<Option<Vec<f64>>, IniError> {
        if self.exists(field) {
            self.find_float_vec(field, kwargs)
        } else {
            Ok(default.map(<[f64]>::to_vec))
        }
    }
}

fn to_bool(s: &str) -> Result<bool, IniError> {
    match s.to_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(IniError::Conversion {
            value: s.to_string(),
            wanted: "bool",
        }),
    }
}

fn to_int(s: &str) -> Result<i64, IniError> {
    s.parse().map_err(|_| IniError::Conversion {
        value: s.to_string(),
        wanted: "int",
    })
}

fn to_float(s: &str) -> Result<f64, IniError> {
    s.parse().map_err(|_| IniError::Conversion {
        value: s.to_string(),
        wanted: "float",
    })
}

/// Vector elements narrow through `f64`, so `3.0` is the integer 3.
fn to_int_lenient(s: &str) -> Result<i64, IniError> {
    let f = to_float(s)?;
    if !f.is_finite() {
        return Err(IniError::Conversion {
            value: s.to_string(),
            wanted: "int",
        });
    }
    Ok(f.trunc() as i64)
}

fn split_items(s: &str) -> impl Iterator<Item = &str> {
    s.split(' ').filter(|t| !t.is_empty())
}

/// Float vectors additionally accept commas, and shrug off stray
/// brackets an environment override may have carried in.
fn split_float_items(s: &str) -> impl Iterator<Item = &str> {
    s.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split([' ', ','])
        .filter(|t| !t.is_empty())
}
