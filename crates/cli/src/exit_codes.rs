//! CLI Exit Code Registry
//!
//! Single source of truth for `mbook` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success (clean reconciliation, or rules valid)       |
//! | 1    | Reconciliation finished with unmatched / exceptions  |
//! | 2    | CLI usage error (bad args)                           |
//! | 3    | Rules file failed to parse or validate               |
//! | 4    | Runtime failure (IO, malformed input, bad request)   |
//!
//! Like `diff(1)`, exit 1 means "the sources differ", not "the tool broke".

/// Success.
pub const EXIT_SUCCESS: u8 = 0;

/// Unmatched rows or exceptions remain (suppressed by `--allow-unmatched`).
pub const EXIT_RECON_UNMATCHED: u8 = 1;

/// Usage error. clap exits with this code itself on parse failures.
pub const EXIT_USAGE: u8 = 2;

/// Rules file could not be parsed or failed validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 3;

/// IO error, unreadable input, or a rejected request body.
pub const EXIT_RECON_RUNTIME: u8 = 4;
