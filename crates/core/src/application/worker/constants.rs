// Worker constants (no magic values in the loop)
use std::time::Duration;

/// Sleep duration when no job is ready (1s)
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Sleep duration after a store error before trying again (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Upper bound on a single processor call (5 minutes)
pub const DEFAULT_PROCESSOR_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Shortest rate-limit pause, so `retry_after` is always strictly in the future
pub const MIN_RATE_LIMIT_PAUSE_SECS: u64 = 1;

/// Longest rate-limit pause honoured, whatever the upstream asks for (1 day)
pub const MAX_RATE_LIMIT_PAUSE_SECS: u64 = 24 * 60 * 60;

/// How long `QueueRunner::shutdown` waits for the loop task to exit (5s)
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Failure description stored for throttled jobs
pub const RATE_LIMITED_MESSAGE: &str = "rate limited";
