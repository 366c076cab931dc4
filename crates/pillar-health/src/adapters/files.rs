//! Local input files: the key-share state and the address book.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::HealthError;

/// Key-share state written by the bridge orchestrator.
///
/// Only `participant_keys` feeds the reconciliation; the other fields are
/// accepted so a complete state file parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LocalState {
    /// Group public key.
    #[serde(default)]
    pub pub_key: String,
    /// Local party identifier.
    #[serde(default)]
    pub local_party_key: String,
    /// Base64 ed25519 keys of all key-share holders.
    #[serde(default)]
    pub participant_keys: Vec<String>,
}

/// Load the key-share state. The file is mandatory.
pub fn load_local_state(path: &Path) -> Result<LocalState, HealthError> {
    let mandatory = |reason: String| HealthError::MandatoryFile {
        path: path.display().to_string(),
        reason,
    };

    let content = std::fs::read_to_string(path).map_err(|e| mandatory(e.to_string()))?;
    let state: LocalState = serde_json::from_str(&content).map_err(|e| mandatory(e.to_string()))?;

    info!(
        "[inputs] Loaded {} participant key(s) from {}",
        state.participant_keys.len(),
        path.display()
    );
    Ok(state)
}

/// Read address-book lines. A missing or unreadable file yields no lines.
///
/// Invalid UTF-8 is replaced per line, so one bad byte only spoils the line
/// it sits on; that line is then rejected or ignored like any other.
pub fn read_address_book(path: &Path) -> Vec<String> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let content = String::from_utf8_lossy(&bytes);
            let lines: Vec<String> = content.lines().map(str::to_string).collect();
            info!(
                "[inputs] Read {} address-book line(s) from {}",
                lines.len(),
                path.display()
            );
            lines
        }
        Err(e) => {
            warn!(
                "[inputs] Address book {} unavailable ({}); only the bootstrap will be probed",
                path.display(),
                e
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_local_state() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"pub_key":"abc","local_party_key":"def","participant_keys":["ERERERERERERERERERERERERERERERERERERERERERE="]}}"#
        )
        .unwrap();

        let state = load_local_state(file.path()).unwrap();

        assert_eq!(state.pub_key, "abc");
        assert_eq!(state.participant_keys.len(), 1);
    }

    #[test]
    fn test_local_state_without_keys() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"pub_key":"abc"}}"#).unwrap();

        let state = load_local_state(file.path()).unwrap();

        assert!(state.participant_keys.is_empty());
    }

    #[test]
    fn test_missing_local_state_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("localstate.json");

        let err = load_local_state(&path).unwrap_err();

        assert!(matches!(err, HealthError::MandatoryFile { .. }));
        assert!(err.to_string().contains("localstate.json"));
    }

    #[test]
    fn test_malformed_local_state_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            load_local_state(file.path()),
            Err(HealthError::MandatoryFile { .. })
        ));
    }

    #[test]
    fn test_read_address_book_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# seeds").unwrap();
        writeln!(file, "/ip4/10.0.0.1/tcp/55055/p2p/12D3KooWAxzCBFVtEyKLnRm43gHxigCoe2d4UmkRTXhBNSv5bcCx").unwrap();

        let lines = read_address_book(file.path());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "# seeds");
    }

    #[test]
    fn test_invalid_utf8_spoils_only_its_line() {
        let entry = "/ip4/10.0.0.1/tcp/55055/p2p/12D3KooWAxzCBFVtEyKLnRm43gHxigCoe2d4UmkRTXhBNSv5bcCx";
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"# caf\xe9 seed\n").unwrap();
        writeln!(file, "{}", entry).unwrap();

        let lines = read_address_book(file.path());

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("# caf"));
        assert_eq!(lines[1], entry);
    }

    #[test]
    fn test_missing_address_book_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_address_book(&dir.path().join("address_book.seed")).is_empty());
    }
}
