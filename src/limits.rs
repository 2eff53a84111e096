/*!
 * Guard Limits and Constants
 *
 * Centralized location for timing thresholds and magic numbers.
 * Organized by subsystem.
 */

use std::time::Duration;

// =============================================================================
// SUPERVISOR
// =============================================================================

/// Supervisor poll interval (100ms)
/// Upper bound on how long one poll tick waits on the worker's result slot
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Smallest poll interval accepted from configuration (1ms)
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Prefix for worker thread names
pub const WORKER_THREAD_PREFIX: &str = "guard-worker";

// =============================================================================
// TERMINATION
// =============================================================================

/// Grace period between terminate and kill (3s)
pub const PROCESS_EXIT_TIMEOUT: Duration = Duration::from_secs(3);

/// Liveness re-check interval while waiting for a terminated process (25ms)
pub const PROCESS_WAIT_POLL: Duration = Duration::from_millis(25);

// =============================================================================
// CLI EXIT CODES
// =============================================================================

/// Exit code when the deadline fired (GNU timeout convention)
pub const EXIT_EXPIRED: i32 = 124;

/// Exit code when the guard itself failed
pub const EXIT_GUARD_FAILURE: i32 = 125;

/// Exit code when the command could not be started
pub const EXIT_CANNOT_RUN: i32 = 126;
