//! CLI Exit Code Registry
//!
//! Single source of truth for `sortkeep` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad args, unreadable output path)            |
//! | 3    | `validate`: at least one dataset failed validation         |
//! | 4    | Config could not be read, parsed or validated              |
//! | 5    | Archive write failed (live mode)                           |
//!
//! Dataset load failures and row-level validation warnings are reported in
//! the output and never change the exit code on their own.

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, output path cannot be written.
pub const EXIT_USAGE: u8 = 2;

/// One or more datasets are structurally invalid (missing required header,
/// unreadable source).
pub const EXIT_VALIDATION_FAILED: u8 = 3;

/// Config file unreadable, malformed TOML, or rejected by validation.
pub const EXIT_CONFIG_INVALID: u8 = 4;

/// A live archive write failed. Nothing is retried.
pub const EXIT_ARCHIVE_WRITE: u8 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_VALIDATION_FAILED,
            EXIT_CONFIG_INVALID,
            EXIT_ARCHIVE_WRITE,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
