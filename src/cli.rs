/*!
 * Command Line Interface
 *
 * `deadline-guard run` executes a command as the guarded work unit. Exit
 * codes follow GNU `timeout`: the command's own code when it finishes, 124
 * when the deadline fires, 125 when the guard itself fails and 126 when the
 * command cannot be started.
 */

use crate::config::{GuardConfig, OnExpiry};
use crate::deadline::{sleep_until, DeadlineResolver, DeadlineSpec};
use crate::errors::GuardError;
use crate::guard::DeadlineGuard;
use crate::limits::{EXIT_CANNOT_RUN, EXIT_EXPIRED, EXIT_GUARD_FAILURE};
use crate::resources::MatchRule;
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a command, tearing down what it left behind if the deadline fires
    Run(RunArgs),

    /// Print the absolute deadline a specification resolves to
    Resolve {
        /// Epoch seconds, a duration ("30s", "2 hours"), a cron expression or a date
        spec: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Block until a deadline is reached
    Sleep {
        spec: String,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Deadline specification
    #[arg(long, value_name = "SPEC")]
    until: Option<String>,

    /// Close new windows whose title matches this glob (repeatable)
    #[arg(long = "window", value_name = "GLOB")]
    windows: Vec<String>,

    /// Stop descendant processes whose name or command line matches this glob (repeatable)
    #[arg(long = "process", value_name = "GLOB")]
    processes: Vec<String>,

    /// Close every window
    #[arg(long, conflicts_with = "windows")]
    all_windows: bool,

    /// Stop every descendant process (the default when no --process is given)
    #[arg(long, conflicts_with = "processes")]
    all_processes: bool,

    /// Only tear down resources that appeared after the command started
    #[arg(long)]
    new_only: bool,

    /// Wait for the command to exit after teardown instead of abandoning it
    #[arg(long)]
    join: bool,

    /// JSON configuration file; flags given on the command line take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Command and its arguments
    #[arg(last = true, required = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl RunArgs {
    /// Merge the config file (if any), environment and flags
    fn to_config(&self) -> Result<GuardConfig> {
        let mut config = match &self.config {
            Some(path) => GuardConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => {
                let Some(until) = &self.until else {
                    bail!("--until is required unless --config supplies a deadline");
                };
                GuardConfig::detached(until.as_str())
                    .with_new_only(false)
                    .with_processes(MatchRule::All)
            }
        };

        if let Some(until) = &self.until {
            config.deadline = DeadlineSpec::from(until.as_str());
        }

        if self.all_windows {
            config.windows = MatchRule::All;
        } else if !self.windows.is_empty() {
            config.windows = MatchRule::patterns(&self.windows);
        }

        if self.all_processes {
            config.processes = MatchRule::All;
        } else if !self.processes.is_empty() {
            config.processes = MatchRule::patterns(&self.processes);
        }

        if self.new_only {
            config.new_only = true;
        }
        if self.join {
            config.on_expiry = OnExpiry::Join;
        }

        Ok(config.apply_env()?)
    }
}

/// Parse arguments, dispatch, and return the process exit code
pub fn run() -> i32 {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Resolve { spec, json } => report(resolve_command(&spec, json)),
        Commands::Sleep { spec } => report(sleep_command(&spec)),
    }
}

fn report(result: miette::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(report) => {
            eprintln!("{:?}", report);
            EXIT_GUARD_FAILURE
        }
    }
}

fn resolve_command(spec: &str, json: bool) -> miette::Result<()> {
    let resolution = DeadlineResolver::new().resolve_detailed(&DeadlineSpec::from(spec))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&resolution).into_diagnostic()?);
    } else {
        println!(
            "{} ({}, {:?})",
            resolution.deadline,
            resolution.deadline.epoch_secs(),
            resolution.branch
        );
    }
    Ok(())
}

fn sleep_command(spec: &str) -> miette::Result<()> {
    let deadline = sleep_until(spec)?;
    info!(deadline = %deadline, "deadline reached");
    Ok(())
}

fn run_command(args: RunArgs) -> i32 {
    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            return EXIT_GUARD_FAILURE;
        }
    };

    let (program, rest) = match args.command.split_first() {
        Some((program, rest)) => (program.clone(), rest.to_vec()),
        None => return EXIT_CANNOT_RUN,
    };

    info!(command = %program, deadline = %config.deadline, "running guarded command");

    let guard = DeadlineGuard::new(config);
    let result = guard.run_with_report(move || Command::new(&program).args(&rest).status());

    match result {
        Ok(run) => match run.value {
            Some(status) => exit_code(status),
            None => {
                if let Some(teardown) = &run.report.teardown {
                    info!(
                        closed = teardown.windows.closed,
                        terminated = teardown.processes.terminated,
                        killed = teardown.processes.killed,
                        "command abandoned at deadline"
                    );
                }
                EXIT_EXPIRED
            }
        },
        Err(GuardError::Work(e)) => {
            error!(error = %e, "command could not be run");
            eprintln!("Error: {}", e);
            EXIT_CANNOT_RUN
        }
        Err(GuardError::Deadline(e)) => {
            eprintln!("{:?}", miette::Report::new(e));
            EXIT_GUARD_FAILURE
        }
        Err(GuardError::Config(e)) => {
            eprintln!("{:?}", miette::Report::new(e));
            EXIT_GUARD_FAILURE
        }
        Err(e) => {
            error!(error = %e, "guard failed");
            eprintln!("Error: {}", e);
            EXIT_GUARD_FAILURE
        }
    }
}

/// The command's code, or 128 + signal when it was killed by one
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    EXIT_GUARD_FAILURE
}
