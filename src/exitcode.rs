//! Standard exit codes (BSD sysexits.h compatible)

/// Successful termination
pub const OK: i32 = 0;

/// A service's database password is missing or empty
pub const MISSING_SECRET: i32 = 1;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (malformed service config)
pub const DATAERR: i32 = 65;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
