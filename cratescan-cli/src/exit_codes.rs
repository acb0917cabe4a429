//! Exit codes following sysexits.h conventions.
//!
//! These codes give scripts a way to tell a bad scan from a flaky
//! network from a rejected token.

use cratescan_core::ScanError;

use crate::commands::scan::NotInCollection;

/// General error (catch-all).
pub const GENERAL_ERROR: i32 = 1;

/// Command line usage error: malformed QR payload.
/// Maps to EX_USAGE from sysexits.h.
pub const USAGE_ERROR: i32 = 64;

/// The scanned pair is not in the collection but the command needed it
/// to be. Maps to EX_DATAERR from sysexits.h.
pub const NOT_FOUND: i32 = 65;

/// Service unavailable (network failure or rejected credential).
/// Maps to EX_UNAVAILABLE from sysexits.h.
pub const NETWORK_ERROR: i32 = 69;

/// I/O error (credential store, export file).
/// Maps to EX_IOERR from sysexits.h.
pub const IO_ERROR: i32 = 74;

/// Classify an error chain into an exit code.
pub fn classify(err: &anyhow::Error) -> i32 {
    if let Some(scan) = err.downcast_ref::<ScanError>() {
        return match scan {
            ScanError::InvalidPayload(_) => USAGE_ERROR,
            ScanError::InvalidCredential | ScanError::Transport(_) => NETWORK_ERROR,
            ScanError::Store(_) => IO_ERROR,
            ScanError::MissingCredential
            | ScanError::NoActiveMatch
            | ScanError::RelocationInFlight => GENERAL_ERROR,
        };
    }

    if err.downcast_ref::<NotInCollection>().is_some() {
        return NOT_FOUND;
    }
    if err.downcast_ref::<std::io::Error>().is_some() {
        return IO_ERROR;
    }
    GENERAL_ERROR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_errors_map_to_codes() {
        let invalid = anyhow::Error::new(ScanError::InvalidPayload("x".into()));
        assert_eq!(classify(&invalid), USAGE_ERROR);

        let auth = anyhow::Error::new(ScanError::InvalidCredential);
        assert_eq!(classify(&auth), NETWORK_ERROR);

        let transport = anyhow::Error::new(ScanError::Transport("boom".into()));
        assert_eq!(classify(&transport), NETWORK_ERROR);

        let store = anyhow::Error::new(ScanError::Store("disk".into()));
        assert_eq!(classify(&store), IO_ERROR);
    }

    #[test]
    fn test_context_is_preserved_through_classification() {
        use anyhow::Context;
        let err = std::result::Result::<(), _>::Err(ScanError::InvalidPayload("x".into()))
            .context("while scanning")
            .unwrap_err();
        assert_eq!(classify(&err), USAGE_ERROR);
    }

    #[test]
    fn test_not_in_collection_maps_to_data_error() {
        let err = anyhow::Error::new(NotInCollection("123.456".into()));
        assert_eq!(classify(&err), NOT_FOUND);
        // Classification survives rewording of the rendered message.
        assert!(err.to_string().contains("123.456"));
    }

    #[test]
    fn test_io_error_in_chain_maps_to_io_code() {
        use anyhow::Context;
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = std::result::Result::<(), _>::Err(io)
            .context("Failed to create /nope/out.jsonl")
            .unwrap_err();
        assert_eq!(classify(&err), IO_ERROR);
    }

    #[test]
    fn test_unknown_error_is_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(classify(&err), GENERAL_ERROR);
    }
}
