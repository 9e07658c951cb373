//! Convergence engine - runs an ordered plan of resources to completion
//!
//! The engine validates the whole plan before any provider is invoked, then
//! converges resources in declaration order. With `jobs > 1`, a bounded
//! rayon pool claims resources from a shared cursor; resources that touch the
//! same target, or that require another resource, wait for it to finish first.
//! The report always lists outcomes in declaration order.

use crate::context::{ApplyContext, ProgressCallback};
use crate::error::ValidationError;
use crate::executor::execute;
use crate::platform::Platform;
use crate::provider::{Provider, ProviderRegistry};
use crate::report::{Outcome, ResourceReport, RunReport};
use crate::resource::ResourceInstance;
use crate::schema::{ResourceInput, ResourceSchema};
use crate::types::Action;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Options for a convergence run
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Compute and report diffs without applying them
    pub dry_run: bool,
    /// Maximum number of resources converged concurrently
    pub jobs: usize,
    /// Skip every not-yet-started resource after the first failure
    pub stop_on_failure: bool,
    /// Budget for a single side effect
    pub action_timeout: Option<Duration>,
    /// Platform used to select providers
    pub platform: Platform,
    pub verbose: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 1,
            stop_on_failure: false,
            action_timeout: None,
            platform: Platform::Any,
            verbose: false,
        }
    }
}

/// One declaration in a plan
#[derive(Debug, Clone)]
pub enum PlanEntry {
    /// Successfully built resource instance
    Declared(ResourceInstance),
    /// Declaration that failed to build; reported as a validation failure
    Rejected {
        resource_type: String,
        name: String,
        action: Option<Action>,
        error: ValidationError,
    },
}

/// Ordered list of declarations to converge
#[derive(Debug, Clone, Default)]
pub struct ConvergencePlan {
    entries: Vec<PlanEntry>,
}

impl ConvergencePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate `input` against `schema` and append the result.
    ///
    /// A validation failure is kept in the plan so it shows up in the report
    /// at its declaration position.
    pub fn declare(&mut self, schema: &ResourceSchema, input: ResourceInput, action: Option<Action>) {
        let name = input.name.clone();
        match schema.instantiate(input, action) {
            Ok(resource) => self.push(resource),
            Err(error) => self.reject(schema.resource_type(), name, action, error),
        }
    }

    pub fn push(&mut self, resource: ResourceInstance) {
        self.entries.push(PlanEntry::Declared(resource));
    }

    pub fn reject(
        &mut self,
        resource_type: impl Into<String>,
        name: impl Into<String>,
        action: Option<Action>,
        error: ValidationError,
    ) {
        self.entries.push(PlanEntry::Rejected {
            resource_type: resource_type.into(),
            name: name.into(),
            action,
            error,
        });
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Orchestrates convergence of a plan using providers from a registry
pub struct ConvergenceEngine {
    registry: ProviderRegistry,
    options: EngineOptions,
}

impl ConvergenceEngine {
    pub fn new(registry: ProviderRegistry, options: EngineOptions) -> Self {
        Self { registry, options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Check a plan without probing or applying anything.
    ///
    /// Returns the report entry for every declaration that would fail
    /// validation, in declaration order.
    pub fn validate(&self, plan: &ConvergencePlan) -> Vec<ResourceReport> {
        self.prepare(plan)
            .into_iter()
            .filter_map(|job| match job {
                Job::Rejected(report) => Some(report),
                Job::Ready(_) => None,
            })
            .collect()
    }

    /// Converge every resource in the plan and return the full report.
    ///
    /// Never fails as a whole: every resource ends up with an outcome.
    pub fn converge(&self, plan: &ConvergencePlan, progress: &dyn ProgressCallback) -> RunReport {
        let started_at = Utc::now();
        let jobs = self.prepare(plan);
        log::debug!(
            "Converging {} resources (jobs: {}, dry run: {})",
            jobs.len(),
            self.options.jobs,
            self.options.dry_run
        );

        progress.on_run_start(jobs.len());
        let run = Run::new(&jobs, &self.options, progress);

        let workers = self.options.jobs.max(1).min(jobs.len().max(1));
        if workers == 1 {
            run.work();
        } else {
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => pool.scope(|scope| {
                    for _ in 0..workers {
                        scope.spawn(|_| run.work());
                    }
                }),
                Err(e) => {
                    log::warn!("Failed to create thread pool ({e}), converging sequentially");
                    run.work();
                }
            }
        }
        progress.on_run_complete();

        RunReport {
            started_at,
            finished_at: Utc::now(),
            dry_run: self.options.dry_run,
            resources: run.into_reports(),
        }
    }

    /// Validation pass: resolves providers, duplicates and dependencies
    fn prepare<'p>(&self, plan: &'p ConvergencePlan) -> Vec<Job<'p>> {
        let mut seen: HashMap<String, usize> = HashMap::new();
        // Declarations rejected at plan time still count as declared for `requires`
        let mut rejected_keys: HashMap<String, usize> = HashMap::new();
        let mut last_by_target: HashMap<String, usize> = HashMap::new();
        let mut jobs = Vec::with_capacity(plan.len());

        for (index, entry) in plan.entries().iter().enumerate() {
            let resource = match entry {
                PlanEntry::Declared(resource) => resource,
                PlanEntry::Rejected {
                    resource_type,
                    name,
                    action,
                    error,
                } => {
                    let key = format!("{resource_type}[{name}]");
                    rejected_keys.entry(key.clone()).or_insert(index);
                    jobs.push(Job::Rejected(ResourceReport {
                        key,
                        resource_type: resource_type.clone(),
                        identity: name.clone(),
                        action: *action,
                        outcome: Outcome::failed(error.clone()),
                        duration_ms: 0,
                    }));
                    continue;
                }
            };

            let key = resource.key();
            let rejected = |error: ValidationError| {
                Job::Rejected(report_for(resource, Outcome::failed(error), Duration::ZERO))
            };

            if seen.contains_key(&key) {
                jobs.push(rejected(ValidationError::DuplicateResource { key }));
                continue;
            }
            seen.insert(key.clone(), index);

            let mut requires = Vec::with_capacity(resource.requires().len());
            let mut unknown = None;
            for dependency in resource.requires() {
                match seen.get(dependency).or_else(|| rejected_keys.get(dependency)) {
                    Some(&dep) if dep != index => requires.push((dependency.clone(), dep)),
                    _ => {
                        unknown = Some(dependency.clone());
                        break;
                    }
                }
            }
            if let Some(dependency) = unknown {
                jobs.push(rejected(ValidationError::UnknownDependency { key, dependency }));
                continue;
            }

            let Some(provider) = self
                .registry
                .resolve(resource.resource_type(), self.options.platform)
            else {
                jobs.push(rejected(ValidationError::NoProvider {
                    resource_type: resource.resource_type().to_string(),
                    platform: self.options.platform,
                }));
                continue;
            };

            let target = provider.target_key(resource);
            let after = last_by_target.insert(target.clone(), index);

            jobs.push(Job::Ready(ReadyJob {
                resource,
                provider,
                target,
                requires,
                after,
            }));
        }

        jobs
    }
}

fn report_for(resource: &ResourceInstance, outcome: Outcome, elapsed: Duration) -> ResourceReport {
    ResourceReport {
        key: resource.key(),
        resource_type: resource.resource_type().to_string(),
        identity: resource.identity().to_string(),
        action: Some(resource.action()),
        outcome,
        duration_ms: elapsed.as_millis() as u64,
    }
}

fn halted_outcome() -> Outcome {
    Outcome::Skipped {
        reason: "stopped after an earlier failure".to_string(),
    }
}

enum Job<'p> {
    Rejected(ResourceReport),
    Ready(ReadyJob<'p>),
}

struct ReadyJob<'p> {
    resource: &'p ResourceInstance,
    provider: Box<dyn Provider>,
    target: String,
    /// (key, index) of resources that must succeed first
    requires: Vec<(String, usize)>,
    /// Previous resource touching the same target
    after: Option<usize>,
}

/// Shared state of one run, borrowed by every worker
struct Run<'a, 'p> {
    jobs: &'a [Job<'p>],
    options: &'a EngineOptions,
    progress: &'a dyn ProgressCallback,
    ctx: ApplyContext,
    cursor: AtomicUsize,
    halted: AtomicBool,
    completion: Completion,
    targets: TargetLocks,
    reports: Mutex<Vec<Option<ResourceReport>>>,
}

impl<'a, 'p> Run<'a, 'p> {
    fn new(jobs: &'a [Job<'p>], options: &'a EngineOptions, progress: &'a dyn ProgressCallback) -> Self {
        Self {
            jobs,
            options,
            progress,
            ctx: ApplyContext::new(options.dry_run, options.verbose).with_timeout(options.action_timeout),
            cursor: AtomicUsize::new(0),
            halted: AtomicBool::new(false),
            completion: Completion::new(jobs.len()),
            targets: TargetLocks::default(),
            reports: Mutex::new(vec![None; jobs.len()]),
        }
    }

    /// Worker loop: claim the next job in declaration order until none remain
    fn work(&self) {
        loop {
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            let Some(job) = self.jobs.get(index) else {
                break;
            };

            let report = match job {
                Job::Rejected(report) if self.halted.load(Ordering::SeqCst) => ResourceReport {
                    outcome: halted_outcome(),
                    ..report.clone()
                },
                Job::Rejected(report) => report.clone(),
                Job::Ready(job) => self.run_job(job),
            };

            if report.outcome.is_failure() && self.options.stop_on_failure {
                self.halted.store(true, Ordering::SeqCst);
            }

            self.progress.on_resource_complete(&report.key, &report.outcome);
            let success = report.outcome.is_success();
            self.reports.lock().unwrap_or_else(PoisonError::into_inner)[index] = Some(report);
            self.completion.finish(index, success);
        }
    }

    fn run_job(&self, job: &ReadyJob<'_>) -> ResourceReport {
        let resource = job.resource;

        for (key, dep) in &job.requires {
            if !self.completion.wait(*dep) {
                log::debug!("{}: skipped, {key} did not succeed", resource.key());
                return report_for(
                    resource,
                    Outcome::Skipped {
                        reason: format!("required resource {key} did not succeed"),
                    },
                    Duration::ZERO,
                );
            }
        }
        if let Some(previous) = job.after {
            self.completion.wait(previous);
        }

        if self.halted.load(Ordering::SeqCst) {
            return report_for(resource, halted_outcome(), Duration::ZERO);
        }

        let key = resource.key();
        self.progress.on_resource_start(&key);

        let lock = self.targets.get(&job.target);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let start = Instant::now();
        let outcome = execute(resource, job.provider.as_ref(), &self.ctx);
        report_for(resource, outcome, start.elapsed())
    }

    fn into_reports(self) -> Vec<ResourceReport> {
        self.reports
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Completion table: which resources have finished, and whether they succeeded
struct Completion {
    states: Mutex<Vec<Option<bool>>>,
    changed: Condvar,
}

impl Completion {
    fn new(len: usize) -> Self {
        Self {
            states: Mutex::new(vec![None; len]),
            changed: Condvar::new(),
        }
    }

    /// Block until the resource at `index` has finished; returns its success
    fn wait(&self, index: usize) -> bool {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(success) = states[index] {
                return success;
            }
            states = self
                .changed
                .wait(states)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn finish(&self, index: usize, success: bool) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        states[index] = Some(success);
        self.changed.notify_all();
    }
}

/// Per-target mutexes serializing probe -> apply on a shared target
#[derive(Default)]
struct TargetLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TargetLocks {
    fn get(&self, target: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(target.to_string()).or_default())
    }
}
