//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, bad dates)    |
//! | 3-9     | report           | Report pipeline codes                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid date range.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Report (3-9)
// =============================================================================

/// Cannot open the report database.
pub const EXIT_REPORT_CONNECT: u8 = 3;

/// A store query failed.
pub const EXIT_REPORT_QUERY: u8 = 4;

/// A stored value did not parse.
pub const EXIT_REPORT_DATA: u8 = 5;

/// Writing the output file failed.
pub const EXIT_REPORT_EXPORT: u8 = 6;

// =============================================================================
// Store Error Types
// =============================================================================

use midio_io::StoreError;

/// Map a StoreError to its exit code.
pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::Connection { .. } => EXIT_REPORT_CONNECT,
        StoreError::Query(_) => EXIT_REPORT_QUERY,
        StoreError::BadRow { .. } => EXIT_REPORT_DATA,
    }
}
