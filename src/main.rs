/*!
 * Deadline Guard - Main Entry Point
 *
 * Runs a command under a deadline and cleans up after it:
 * - Deadline resolution (epoch, durations, cron, natural language)
 * - Window and descendant process teardown on expiry
 */

fn main() {
    deadline_guard::init_tracing();
    std::process::exit(deadline_guard::cli::run());
}
