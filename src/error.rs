use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IniError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse '{line}' ({file}, line {line_no})")]
    Format {
        line: String,
        file: PathBuf,
        line_no: usize,
    },

    #[error("Assignment before any [header] ({file}, line {line_no})")]
    MissingHeader { file: PathBuf, line_no: usize },

    #[error("Vector continuation with no open vector ({file}, line {line_no})")]
    DanglingVector { file: PathBuf, line_no: usize },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Cannot convert '{value}' to {wanted}")]
    Conversion { value: String, wanted: &'static str },

    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Command '{command}' exited with status {code}")]
    CommandFailed { command: String, code: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_carries_location() {
        let err = IniError::Format {
            line: "what is this".into(),
            file: "/etc/app/root.ini".into(),
            line_no: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("what is this"));
        assert!(msg.contains("root.ini"));
        assert!(msg.contains("7"));
    }

    #[test]
    fn key_not_found_formats() {
        let err = IniError::KeyNotFound("STRAT~WINDOW".into());
        assert!(err.to_string().contains("STRAT~WINDOW"));
    }

    #[test]
    fn conversion_names_target_type() {
        let err = IniError::Conversion {
            value: "maybe".into(),
            wanted: "bool",
        };
        let msg = err.to_string();
        assert!(msg.contains("maybe"));
        assert!(msg.contains("bool"));
    }

    #[test]
    fn command_failed_carries_status() {
        let err = IniError::CommandFailed {
            command: "false".into(),
            code: 1,
        };
        assert!(err.to_string().contains("status 1"));
    }
}
