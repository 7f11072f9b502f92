// Worker constants (no magic values at call sites)

/// Default retry ceiling per job
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Default stall threshold: processing longer than this means a dead worker
pub const DEFAULT_STALL_THRESHOLD_MINUTES: i64 = 30;

/// Default bound on jobs translated concurrently within one batch call
pub const DEFAULT_BATCH_CONCURRENCY: usize = 2;

/// Default claim size when the process action gives no explicit limit
pub const DEFAULT_CLAIM_LIMIT: u32 = 10;
