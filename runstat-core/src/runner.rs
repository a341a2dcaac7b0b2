// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The trial loop.
//!
//! A single sequential loop runs every trial: read the start clocks, spawn
//! `parallelism` children, block until all of them exit, read the end
//! clocks, fold the result. Trials never overlap and a fatal error aborts
//! the run without partial results.

use std::path::PathBuf;
use std::process::{Child, Command};

use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::config::{BenchConfig, Invocation, MeasureMode};
use crate::error::{RunstatError, RunstatResult, TrialError};
use crate::relocation::{read_relocation_log, RelocationSummary};
use crate::report::{BenchReport, ClockSummary, DurationReport, RelocationReport};
use crate::sample::{Sample, SampleSet};
use crate::stats::Statistics;
use crate::timespan::Timespan;
use crate::trim::TrimmedView;
use crate::types::{DropPercent, Parallelism};

/// How a child terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitKind {
    /// Normal exit with a status code.
    Code(i32),
    /// Killed by a signal.
    Signal(i32),
}

impl ExitKind {
    pub fn success(&self) -> bool {
        matches!(self, Self::Code(0))
    }
}

impl std::fmt::Display for ExitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "exit status {}", code),
            Self::Signal(sig) => write!(f, "killed by signal {}", sig),
        }
    }
}

/// Termination record of one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    pub pid: u32,
    pub status: ExitKind,
}

/// Launches the children of one trial.
pub trait Launcher {
    /// Spawn `n` concurrent children and wait for every one of them.
    fn spawn_and_wait_all(
        &mut self,
        invocation: &Invocation,
        n: Parallelism,
    ) -> Result<Vec<ChildExit>, TrialError>;
}

/// Launcher backed by real OS processes.
///
/// Children get a cleared environment holding only the invocation's
/// variables, and inherit the standard streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

impl ProcessLauncher {
    fn spawn(invocation: &Invocation) -> Result<Child, TrialError> {
        Command::new(invocation.program())
            .args(invocation.args())
            .env_clear()
            .envs(invocation.env().iter().map(|(k, v)| (k, v)))
            .spawn()
            .map_err(|e| TrialError::SpawnFailed {
                program: invocation.program().to_string(),
                reason: e.to_string(),
            })
    }

    fn wait(child: &Child) -> Result<ChildExit, TrialError> {
        let expected = child.id() as i32;

        let status = loop {
            match waitpid(Pid::from_raw(expected), None) {
                Ok(status) => break status,
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    return Err(TrialError::WaitFailed {
                        pid: expected,
                        reason: errno.to_string(),
                    })
                }
            }
        };

        let (pid, kind) = match status {
            WaitStatus::Exited(pid, code) => (pid, ExitKind::Code(code)),
            WaitStatus::Signaled(pid, signal, _) => (pid, ExitKind::Signal(signal as i32)),
            other => {
                return Err(TrialError::WaitFailed {
                    pid: expected,
                    reason: format!("unexpected wait status {:?}", other),
                })
            }
        };

        if pid.as_raw() != expected {
            return Err(TrialError::UnexpectedChild {
                expected,
                actual: pid.as_raw(),
            });
        }

        Ok(ChildExit {
            pid: expected as u32,
            status: kind,
        })
    }
}

impl Launcher for ProcessLauncher {
    fn spawn_and_wait_all(
        &mut self,
        invocation: &Invocation,
        n: Parallelism,
    ) -> Result<Vec<ChildExit>, TrialError> {
        let mut children = Vec::with_capacity(n.value() as usize);
        for _ in 0..n.value() {
            match Self::spawn(invocation) {
                Ok(child) => children.push(child),
                Err(e) => {
                    // Reap what was already started before giving up.
                    for child in &children {
                        let _ = Self::wait(child);
                    }
                    return Err(e);
                }
            }
        }

        children.iter().map(Self::wait).collect()
    }
}

/// One measurement strategy: what to do around each trial and how to
/// summarize at the end.
pub trait Measurement {
    type Report;

    /// Called right before the children of `trial` are spawned.
    fn begin_trial(&mut self, trial: u64);

    /// Called once every child of `trial` has exited.
    fn fold_trial(&mut self, trial: u64, exits: &[ChildExit]);

    /// Consume the collected data.
    fn finish(self) -> Self::Report;
}

/// Start reading and sample storage for one clock source.
#[derive(Debug)]
pub struct ClockPipeline<C: Clock> {
    clock: C,
    start: Option<Timespan>,
    samples: SampleSet,
}

impl<C: Clock> ClockPipeline<C> {
    pub fn new(clock: C, capacity: usize) -> RunstatResult<Self> {
        let source = clock.source();
        Ok(Self {
            clock,
            start: None,
            samples: SampleSet::with_capacity(source, capacity)?,
        })
    }

    /// Read the start timestamp. Returns whether the read succeeded.
    pub fn start(&mut self) -> bool {
        self.start = self.clock.now();
        self.start.is_some()
    }

    /// Read the end timestamp and record the trial's sample.
    pub fn stop(&mut self) -> Sample {
        let end = if self.start.is_some() {
            self.clock.now()
        } else {
            None
        };
        let sample = Sample::from_readings(self.start.take(), end);
        self.samples.record(sample);
        sample
    }

    pub fn samples(&self) -> &SampleSet {
        &self.samples
    }

    /// Sort the valid samples, trim and compute statistics.
    pub fn summarize(&self, drop: DropPercent) -> ClockSummary {
        let sorted = self.samples.sorted_valid();
        let view = TrimmedView::new(&sorted, drop.value());
        ClockSummary {
            source: self.samples.source(),
            trials: self.samples.len(),
            valid: self.samples.valid_count(),
            stats: Statistics::compute(&view),
        }
    }
}

/// Wall-clock plus optional CPU-clock timing.
pub struct DurationMeasurement<C: Clock> {
    wall: ClockPipeline<C>,
    cpu: Option<ClockPipeline<C>>,
    drop: DropPercent,
}

impl<C: Clock> DurationMeasurement<C> {
    pub fn new(
        wall: C,
        cpu: Option<C>,
        capacity: usize,
        drop: DropPercent,
    ) -> RunstatResult<Self> {
        if cpu.is_none() {
            tracing::warn!("No CPU clock found, CPU time will not be reported");
        }
        Ok(Self {
            wall: ClockPipeline::new(wall, capacity)?,
            cpu: cpu
                .map(|clock| ClockPipeline::new(clock, capacity))
                .transpose()?,
            drop,
        })
    }

    fn pipelines(&mut self) -> impl Iterator<Item = &mut ClockPipeline<C>> {
        std::iter::once(&mut self.wall).chain(self.cpu.as_mut())
    }
}

impl DurationMeasurement<SystemClock> {
    /// Realtime clock plus this process's CPU clock when available.
    pub fn system(capacity: usize, drop: DropPercent) -> RunstatResult<Self> {
        Self::new(SystemClock::wall(), SystemClock::cpu(), capacity, drop)
    }
}

impl<C: Clock> Measurement for DurationMeasurement<C> {
    type Report = DurationReport;

    fn begin_trial(&mut self, trial: u64) {
        for pipeline in self.pipelines() {
            if !pipeline.start() && trial == 1 {
                tracing::warn!(clock = %pipeline.samples.source(), "Clock read failed");
            }
        }
    }

    fn fold_trial(&mut self, trial: u64, _exits: &[ChildExit]) {
        for pipeline in self.pipelines() {
            let sample = pipeline.stop();
            tracing::debug!(
                trial = trial,
                clock = %pipeline.samples.source(),
                elapsed = %sample.span,
                valid = sample.valid,
                "Trial sample"
            );
        }
    }

    fn finish(self) -> DurationReport {
        DurationReport::new(
            self.wall.summarize(self.drop),
            self.cpu.as_ref().map(|cpu| cpu.summarize(self.drop)),
        )
    }
}

/// Dynamic-linker statistics read after every trial.
pub struct RelocationMeasurement {
    log_dir: PathBuf,
    summary: RelocationSummary,
    trials: u64,
}

impl RelocationMeasurement {
    pub fn new(log_dir: PathBuf) -> Self {
        Self {
            log_dir,
            summary: RelocationSummary::default(),
            trials: 0,
        }
    }
}

impl Measurement for RelocationMeasurement {
    type Report = RelocationReport;

    fn begin_trial(&mut self, _trial: u64) {}

    fn fold_trial(&mut self, trial: u64, exits: &[ChildExit]) {
        self.trials += 1;

        for exit in exits {
            match read_relocation_log(&self.log_dir, exit.pid) {
                Ok(Some(metrics)) => {
                    let accepted = self.summary.fold(metrics);
                    tracing::debug!(
                        trial = trial,
                        pid = exit.pid,
                        total = metrics.total,
                        relocs = metrics.relocs,
                        load = metrics.load,
                        accepted = accepted,
                        "Relocation sample"
                    );
                }
                Ok(None) => {
                    tracing::debug!(trial = trial, pid = exit.pid, "No relocation log written");
                }
                Err(e) => {
                    tracing::warn!(trial = trial, pid = exit.pid, error = %e, "Skipping relocation log");
                }
            }
        }
    }

    fn finish(self) -> RelocationReport {
        RelocationReport {
            trials: self.trials,
            summary: self.summary,
        }
    }
}

/// Drives the trial loop for one configuration.
pub struct Benchmark<'a, L: Launcher> {
    config: &'a BenchConfig,
    invocation: &'a Invocation,
    launcher: L,
}

impl<'a> Benchmark<'a, ProcessLauncher> {
    /// Benchmark real child processes.
    pub fn new(config: &'a BenchConfig, invocation: &'a Invocation) -> Self {
        Self::with_launcher(config, invocation, ProcessLauncher)
    }
}

impl<'a, L: Launcher> Benchmark<'a, L> {
    pub fn with_launcher(config: &'a BenchConfig, invocation: &'a Invocation, launcher: L) -> Self {
        Self {
            config,
            invocation,
            launcher,
        }
    }

    /// Run every trial with the strategy selected by the configured mode.
    pub fn run(&mut self) -> RunstatResult<BenchReport> {
        match &self.config.mode {
            MeasureMode::Duration => {
                let count = self.config.count.value();
                let capacity = usize::try_from(count).map_err(|e| RunstatError::Resource {
                    context: "allocating sample storage",
                    reason: format!("{} trials: {}", count, e),
                })?;
                let measurement = DurationMeasurement::system(capacity, self.config.drop)?;
                self.run_with(measurement).map(BenchReport::Duration)
            }
            MeasureMode::Relocation { log_dir } => {
                let measurement = RelocationMeasurement::new(log_dir.clone());
                self.run_with(measurement).map(BenchReport::Relocation)
            }
        }
    }

    /// Run every trial with an explicit strategy.
    pub fn run_with<M: Measurement>(&mut self, mut measurement: M) -> RunstatResult<M::Report> {
        let parallelism = self.config.effective_parallelism();

        tracing::info!(
            program = %self.invocation.program(),
            count = self.config.count.value(),
            parallel = parallelism.value(),
            drop = %self.config.drop,
            "Starting benchmark"
        );

        for trial in 1..=self.config.count.value() {
            measurement.begin_trial(trial);

            let exits = self
                .launcher
                .spawn_and_wait_all(self.invocation, parallelism)
                .map_err(|source| RunstatError::Trial { trial, source })?;

            measurement.fold_trial(trial, &exits);

            if !self.config.ignore_status {
                if let Some(failed) = exits.iter().find(|e| !e.status.success()) {
                    return Err(RunstatError::Trial {
                        trial,
                        source: TrialError::ChildFailed {
                            pid: failed.pid as i32,
                            status: failed.status.to_string(),
                        },
                    });
                }
            }
        }

        tracing::info!(trials = self.config.count.value(), "Benchmark finished");
        Ok(measurement.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::testing::ScriptedClock;
    use crate::clock::ClockSource;
    use crate::types::TrialCount;

    /// Launcher that never spawns anything and reports scripted statuses.
    struct FakeLauncher {
        statuses: Vec<ExitKind>,
        calls: Vec<u32>,
    }

    impl FakeLauncher {
        fn succeeding() -> Self {
            Self {
                statuses: Vec::new(),
                calls: Vec::new(),
            }
        }
    }

    impl Launcher for FakeLauncher {
        fn spawn_and_wait_all(
            &mut self,
            _invocation: &Invocation,
            n: Parallelism,
        ) -> Result<Vec<ChildExit>, TrialError> {
            let trial = self.calls.len();
            self.calls.push(n.value());
            let status = self.statuses.get(trial).copied().unwrap_or(ExitKind::Code(0));
            Ok((0..n.value())
                .map(|i| ChildExit {
                    pid: 1000 + i,
                    status,
                })
                .collect())
        }
    }

    fn readings(pairs: &[(i64, i64)]) -> Vec<Option<Timespan>> {
        pairs
            .iter()
            .flat_map(|&(start, end)| [Some(Timespan::from_millis(start)), Some(Timespan::from_millis(end))])
            .collect()
    }

    fn config(count: u64) -> BenchConfig {
        BenchConfig {
            count: TrialCount::new(count).unwrap(),
            drop: DropPercent::new(0).unwrap(),
            ..BenchConfig::default()
        }
    }

    fn invocation() -> Invocation {
        Invocation::new(vec!["true".to_string()]).unwrap()
    }

    #[test]
    fn test_duration_loop_collects_one_sample_per_trial() {
        let config = config(3);
        let invocation = invocation();
        let wall = ScriptedClock::new(
            ClockSource::Wall,
            readings(&[(0, 1_000), (5_000, 7_000), (10_000, 13_000)]),
        );
        let measurement = DurationMeasurement::new(wall, None, 3, config.drop).unwrap();

        let mut bench = Benchmark::with_launcher(&config, &invocation, FakeLauncher::succeeding());
        let report = bench.run_with(measurement).unwrap();

        let stats = report.wall.stats.unwrap();
        assert_eq!(report.wall.valid, 3);
        assert_eq!(stats.minimum, Timespan::from_secs(1));
        assert_eq!(stats.maximum, Timespan::from_secs(3));
        assert_eq!(stats.mean, Timespan::from_secs(2));
        assert_eq!(stats.std_dev, Timespan::from_secs(1));
        assert!(report.cpu.is_none());
    }

    #[test]
    fn test_failed_clock_read_not_counted() {
        let config = config(3);
        let invocation = invocation();
        let wall = ScriptedClock::new(
            ClockSource::Wall,
            vec![
                Some(Timespan::from_secs(0)),
                Some(Timespan::from_secs(2)),
                None, // start read fails, end is never read
                Some(Timespan::from_secs(10)),
                Some(Timespan::from_secs(14)),
            ],
        );
        let measurement = DurationMeasurement::new(wall, None, 3, config.drop).unwrap();

        let mut bench = Benchmark::with_launcher(&config, &invocation, FakeLauncher::succeeding());
        let report = bench.run_with(measurement).unwrap();

        assert_eq!(report.wall.trials, 3);
        assert_eq!(report.wall.valid, 2);
        let stats = report.wall.stats.unwrap();
        assert_eq!(stats.sample_count, 2);
        assert_eq!(stats.mean, Timespan::from_secs(3));
    }

    #[test]
    fn test_cpu_pipeline_runs_alongside_wall() {
        let config = config(2);
        let invocation = invocation();
        let wall = ScriptedClock::new(ClockSource::Wall, readings(&[(0, 4_000), (0, 6_000)]));
        let cpu = ScriptedClock::new(ClockSource::Cpu, readings(&[(0, 10), (0, 30)]));
        let measurement = DurationMeasurement::new(wall, Some(cpu), 2, config.drop).unwrap();

        let mut bench = Benchmark::with_launcher(&config, &invocation, FakeLauncher::succeeding());
        let report = bench.run_with(measurement).unwrap();

        assert_eq!(report.wall.stats.unwrap().mean, Timespan::from_secs(5));
        let cpu = report.cpu.unwrap();
        assert_eq!(cpu.source, ClockSource::Cpu);
        assert_eq!(cpu.stats.unwrap().mean, Timespan::from_millis(20));
    }

    #[test]
    fn test_child_failure_aborts_run() {
        let config = config(5);
        let invocation = invocation();
        let wall = ScriptedClock::new(ClockSource::Wall, readings(&[(0, 1); 5]));
        let measurement = DurationMeasurement::new(wall, None, 5, config.drop).unwrap();
        let launcher = FakeLauncher {
            statuses: vec![ExitKind::Code(0), ExitKind::Code(2)],
            calls: Vec::new(),
        };

        let mut bench = Benchmark::with_launcher(&config, &invocation, launcher);
        let err = bench.run_with(measurement).unwrap_err();
        match err {
            RunstatError::Trial {
                trial,
                source: TrialError::ChildFailed { status, .. },
            } => {
                assert_eq!(trial, 2);
                assert_eq!(status, "exit status 2");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(bench.launcher.calls.len(), 2);
    }

    #[test]
    fn test_ignore_status_keeps_running() {
        let mut config = config(3);
        config.ignore_status = true;
        let invocation = invocation();
        let wall = ScriptedClock::new(ClockSource::Wall, readings(&[(0, 1_000); 3]));
        let measurement = DurationMeasurement::new(wall, None, 3, config.drop).unwrap();
        let launcher = FakeLauncher {
            statuses: vec![ExitKind::Signal(9); 3],
            calls: Vec::new(),
        };

        let mut bench = Benchmark::with_launcher(&config, &invocation, launcher);
        let report = bench.run_with(measurement).unwrap();
        assert_eq!(report.wall.valid, 3);
    }

    #[test]
    fn test_parallelism_passed_to_launcher() {
        let mut config = config(2);
        config.parallelism = Parallelism::new(4).unwrap();
        let invocation = invocation();
        let wall = ScriptedClock::new(ClockSource::Wall, readings(&[(0, 1_000); 2]));
        let measurement = DurationMeasurement::new(wall, None, 2, config.drop).unwrap();

        let mut bench = Benchmark::with_launcher(&config, &invocation, FakeLauncher::succeeding());
        bench.run_with(measurement).unwrap();
        assert_eq!(bench.launcher.calls, vec![4, 4]);
    }

    #[test]
    fn test_relocation_mode_runs_serially() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = config(2);
        config.parallelism = Parallelism::new(4).unwrap();
        config.mode = MeasureMode::Relocation {
            log_dir: dir.path().to_path_buf(),
        };
        let invocation = invocation();

        std::fs::write(
            crate::relocation::log_path(dir.path(), 1000),
            "total startup time in dynamic loader: 90 cycles\n\
             time needed for relocation: 40 cycles\n\
             time needed to load objects: 20 cycles\n",
        )
        .unwrap();

        let mut bench = Benchmark::with_launcher(&config, &invocation, FakeLauncher::succeeding());
        let report = bench
            .run_with(RelocationMeasurement::new(dir.path().to_path_buf()))
            .unwrap();

        assert_eq!(bench.launcher.calls, vec![1, 1]);
        assert_eq!(report.trials, 2);
        // The log is consumed by the first trial; the second finds nothing.
        assert_eq!(report.summary.count, 1);
        assert_eq!(report.summary.average().unwrap().total, 90);
    }

    #[test]
    fn test_oversized_count_is_resource_error() {
        let config = config(u64::MAX / 2);
        let invocation = invocation();

        let mut bench = Benchmark::with_launcher(&config, &invocation, FakeLauncher::succeeding());
        let err = bench.run().unwrap_err();
        assert!(matches!(
            err,
            RunstatError::Resource {
                context: "allocating sample storage",
                ..
            }
        ));
        assert!(bench.launcher.calls.is_empty());
    }

    #[test]
    fn test_exit_kind_success() {
        assert!(ExitKind::Code(0).success());
        assert!(!ExitKind::Code(1).success());
        assert!(!ExitKind::Signal(15).success());
    }
}
