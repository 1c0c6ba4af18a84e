//! CLI Exit Code Registry
//!
//! Single source of truth for `mango` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success                                                  |
//! | 1    | General error (unspecified)                              |
//! | 2    | Usage error (bad args, unreadable rules file, no password) |
//! | 10   | Credential rejected by the server                        |
//! | 11   | Entity type has no active counterpart in the store       |
//! | 12   | Server response missing expected fields                  |
//! | 13   | Entity to update (or reference entity) not found         |
//! | 14   | Transport failure, 5xx, or request refused               |
//! | 15   | Rules file does not parse or validate                    |
//! | 16   | Input table cannot be read or lacks a column             |
//! | 17   | Output artifacts cannot be written                       |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable rules file, missing password.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Remote store (10-14)
// =============================================================================

pub const EXIT_AUTH: u8 = 10;

pub const EXIT_UNKNOWN_ENTITY_TYPE: u8 = 11;

/// Response did not match the expected shape; the raw body is printed.
pub const EXIT_PROTOCOL: u8 = 12;

pub const EXIT_NOT_FOUND: u8 = 13;

/// Connection refused, timeout, 5xx, or any other non-success status.
pub const EXIT_REMOTE: u8 = 14;

// =============================================================================
// Local files (15-17)
// =============================================================================

pub const EXIT_INVALID_RULES: u8 = 15;

/// Input table unreadable, unparseable, unsupported, or missing a rules column.
pub const EXIT_INPUT: u8 = 16;

pub const EXIT_OUTPUT: u8 = 17;
