//! Process exit codes. Part of the public contract.

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1; // Fatal error, usage error, or interrupted
