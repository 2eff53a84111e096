/*!
 * Guarded Execution Supervisor
 *
 * Runs a work unit on a worker thread and polls it against a resolved
 * deadline. On completion the work's value or error is returned untouched. On
 * expiry the supervisor reconciles resource drift (windows and processes the
 * work left behind), applies the configured expiry policy to the worker, and
 * returns the absence value unless the work has already failed.
 *
 * ## Ordering
 *
 * 1. Deadline resolution and pattern compilation (errors surface before any thread starts)
 * 2. Pre-execution snapshot, when `new_only`
 * 3. Worker start
 * 4. Poll ticks of at most `poll_interval`
 * 5. On expiry only: post-execution snapshot, match, diff, terminate
 */

use super::report::{GuardReport, GuardRun, RunOutcome};
use super::tick::{tick_budget, Tick};
use super::worker::{Outcome, WorkerHandle};
use crate::config::{GuardConfig, OnExpiry};
use crate::deadline::{Deadline, DeadlineResolver, DeadlineSpec};
use crate::errors::{GuardError, GuardResult};
use crate::limits::WORKER_THREAD_PREFIX;
use crate::monitoring::generate_run_id;
use crate::resources::backends::{platform_processes, platform_windows};
use crate::resources::{Baseline, ProcessTable, Reconciler, Teardown, WindowSystem};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Everything fixed before the worker starts
struct Plan {
    run_id: Uuid,
    deadline: Deadline,
    cutoff: Instant,
    reconciler: Reconciler,
}

impl Plan {
    fn worker_name(&self) -> String {
        let id = self.run_id.simple().to_string();
        format!("{}-{}", WORKER_THREAD_PREFIX, &id[..8])
    }

    fn completed<T, E>(&self, started: Instant, outcome: Outcome<T, E>) -> GuardResult<GuardRun<T>, E> {
        let report = GuardReport {
            run_id: self.run_id,
            outcome: RunOutcome::Completed,
            deadline: self.deadline,
            elapsed: started.elapsed(),
            teardown: None,
        };

        info!(
            elapsed_ms = report.elapsed.as_millis() as u64,
            failed = outcome.is_failure(),
            "work finished before deadline"
        );

        match outcome {
            Outcome::Returned(value) => Ok(GuardRun {
                value: Some(value),
                report,
            }),
            Outcome::Failed(e) => Err(GuardError::Work(e)),
            Outcome::Panicked(message) => Err(GuardError::WorkerPanicked(message)),
        }
    }

    /// An error the work produced by now still takes precedence over absence
    fn expired<T, E>(
        &self,
        started: Instant,
        teardown: Teardown,
        late: Option<Outcome<T, E>>,
    ) -> GuardResult<GuardRun<T>, E> {
        let report = GuardReport {
            run_id: self.run_id,
            outcome: RunOutcome::Expired,
            deadline: self.deadline,
            elapsed: started.elapsed(),
            teardown: Some(teardown),
        };

        match late {
            Some(Outcome::Failed(e)) => Err(GuardError::Work(e)),
            Some(Outcome::Panicked(message)) => Err(GuardError::WorkerPanicked(message)),
            Some(Outcome::Returned(_)) | None => Ok(GuardRun { value: None, report }),
        }
    }
}

/// Time-bounded execution guard
///
/// # Example
///
/// ```ignore
/// let guard = DeadlineGuard::new(
///     GuardConfig::detached("30s").with_windows(MatchRule::patterns(["Report*"])),
/// );
///
/// match guard.run(|| render_report())? {
///     Some(report) => save(report),
///     None => eprintln!("gave up after 30s"),
/// }
/// ```
pub struct DeadlineGuard {
    config: GuardConfig,
    resolver: DeadlineResolver,
    windows: Arc<dyn WindowSystem>,
    processes: Arc<dyn ProcessTable>,
}

impl DeadlineGuard {
    /// Guard with the platform window system and process table
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            resolver: DeadlineResolver::new(),
            windows: platform_windows(),
            processes: platform_processes(),
        }
    }

    pub fn with_resolver(mut self, resolver: DeadlineResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_window_system(mut self, windows: impl WindowSystem + 'static) -> Self {
        self.windows = Arc::new(windows);
        self
    }

    pub fn with_process_table(mut self, processes: impl ProcessTable + 'static) -> Self {
        self.processes = Arc::new(processes);
        self
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    fn plan<E>(&self) -> GuardResult<Plan, E> {
        self.config.validate()?;
        let deadline = self.resolver.resolve(&self.config.deadline)?;
        let reconciler = Reconciler::new(
            Arc::clone(&self.windows),
            Arc::clone(&self.processes),
            &self.config.windows,
            &self.config.processes,
        )?
        .with_exit_timeout(self.config.process_exit_timeout());

        Ok(Plan {
            run_id: generate_run_id(),
            cutoff: deadline.to_instant(),
            deadline,
            reconciler,
        })
    }

    /// Run `work` under the deadline
    ///
    /// `Ok(None)` is the absence value: the deadline fired and the work had
    /// not failed by the time teardown finished.
    pub fn run<T, E, F>(&self, work: F) -> GuardResult<Option<T>, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.run_with_report(work).map(|run| run.value)
    }

    /// Like `run`, also returning what the supervisor did
    pub fn run_with_report<T, E, F>(&self, work: F) -> GuardResult<GuardRun<T>, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let plan = self.plan::<E>()?;
        let span = info_span!("guard_run", run_id = %plan.run_id, deadline = %plan.deadline);
        let _entered = span.enter();

        let baseline = self.config.new_only.then(|| plan.reconciler.capture());

        let started = Instant::now();
        let worker = WorkerHandle::spawn(plan.worker_name(), work).map_err(GuardError::Spawn)?;

        loop {
            let slot = worker.wait_for(tick_budget(self.config.poll_interval(), plan.cutoff));
            match Tick::decide(slot, Instant::now(), plan.cutoff) {
                Tick::Finished(outcome) => return plan.completed(started, outcome),
                Tick::Expired => break,
                Tick::Continue => {}
            }
        }

        warn!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            policy = ?self.config.on_expiry,
            "deadline reached with work still running"
        );

        let teardown = plan.reconciler.reconcile(baseline.as_ref());
        let late = match self.config.on_expiry {
            OnExpiry::Detach => {
                let late = worker.try_take();
                worker.detach();
                late
            }
            OnExpiry::Join => worker.join(),
        };

        plan.expired(started, teardown, late)
    }

    /// Async flavour of `run`
    ///
    /// The work still runs on its own OS thread; snapshotting and teardown
    /// run on the blocking pool so the runtime is never stalled.
    pub async fn run_async<T, E, F>(&self, work: F) -> GuardResult<Option<T>, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.run_with_report_async(work).await.map(|run| run.value)
    }

    /// Async flavour of `run_with_report`
    pub async fn run_with_report_async<T, E, F>(&self, work: F) -> GuardResult<GuardRun<T>, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let plan = self.plan::<E>()?;
        let span = info_span!("guard_run", run_id = %plan.run_id, deadline = %plan.deadline);
        self.drive_async(plan, work).instrument(span).await
    }

    async fn drive_async<T, E, F>(&self, plan: Plan, work: F) -> GuardResult<GuardRun<T>, E>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let baseline: Option<Baseline> = if self.config.new_only {
            let reconciler = plan.reconciler.clone();
            Some(blocking::<_, E, _>(move || reconciler.capture()).await?)
        } else {
            None
        };

        let started = Instant::now();
        let worker = WorkerHandle::spawn(plan.worker_name(), work).map_err(GuardError::Spawn)?;

        loop {
            let slot = worker
                .wait_for_async(tick_budget(self.config.poll_interval(), plan.cutoff))
                .await;
            match Tick::decide(slot, Instant::now(), plan.cutoff) {
                Tick::Finished(outcome) => return plan.completed(started, outcome),
                Tick::Expired => break,
                Tick::Continue => {}
            }
        }

        warn!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            policy = ?self.config.on_expiry,
            "deadline reached with work still running"
        );

        let reconciler = plan.reconciler.clone();
        let teardown = blocking::<_, E, _>(move || reconciler.reconcile(baseline.as_ref())).await?;
        let late = match self.config.on_expiry {
            OnExpiry::Detach => {
                let late = worker.try_take();
                worker.detach();
                late
            }
            OnExpiry::Join => blocking::<_, E, _>(move || worker.join()).await?,
        };

        plan.expired(started, teardown, late)
    }

    /// Decorator-style wrapper: every call of the returned closure is one guarded run
    ///
    /// Multiple arguments go in as a tuple.
    pub fn wrap<A, T, E, W>(self, work: W) -> impl Fn(A) -> GuardResult<Option<T>, E>
    where
        W: Fn(A) -> Result<T, E> + Send + Sync + 'static,
        A: Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let work = Arc::new(work);
        move |args| {
            let work = Arc::clone(&work);
            self.run(move || work(args))
        }
    }
}

impl std::fmt::Debug for DeadlineGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineGuard")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .finish()
    }
}

async fn blocking<R, E, F>(f: F) -> GuardResult<R, E>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| GuardError::Supervisor(e.to_string()))
}

/// Run `work` under `deadline`, abandoning it on expiry, touching no windows or processes
pub fn guarded<T, E, F>(deadline: impl Into<DeadlineSpec>, work: F) -> GuardResult<Option<T>, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    DeadlineGuard::new(GuardConfig::detached(deadline)).run(work)
}
