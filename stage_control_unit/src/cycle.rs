//! Paced tick loop.
//!
//! Calls [`MotorController::tick`] every tick period and
//! [`MotorController::tick_seconds`] from an independent 1 s deadline, feeds
//! scripted host commands in, and drains controller reports out.
//!
//! ## RT Setup
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`
//! 2. Prefault stack pages
//! 3. `sched_setaffinity` to the configured core
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`
//!
//! With the `rt` feature the loop sleeps on `CLOCK_MONOTONIC` absolute
//! deadlines. Without it, `std::thread::sleep` paces the simulation.
//! Overruns are counted and logged; they never stop the loop.

use std::sync::atomic::{AtomicBool, Ordering};

use stage_common::protocol::{CommandOutcome, ProtocolReport};
use tracing::{debug, info, warn};

use crate::config::StageConfig;
use crate::hal::StageHal;
use crate::protocol::ProtocolHandler;
use crate::state::supervisor::MotorController;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-tick timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Ticks executed.
    pub cycle_count: u64,
    /// Last tick body duration [ns].
    pub last_cycle_ns: i64,
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    /// Ticks whose body exceeded the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
    /// Slow ticks delivered.
    pub second_ticks: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
            second_ticks: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average tick body time [ns] (0 before the first tick).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

/// Errors during RT setup or loop pacing.
#[derive(Debug)]
pub enum CycleError {
    /// RT system call failed.
    RtSetup(String),
    /// Monotonic clock unavailable.
    Clock(String),
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RtSetup(msg) => write!(f, "RT setup error: {msg}"),
            Self::Clock(msg) => write!(f, "clock error: {msg}"),
        }
    }
}

impl std::error::Error for CycleError {}

// ─── RT Setup ───────────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 256 KiB of stack so the loop never faults a page in.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 targets the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Lock memory, prefault, pin and raise priority. No-ops without `rt`.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Host Script ────────────────────────────────────────────────────

/// Host command injected at a given tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCommand {
    pub at_tick: u64,
    pub opcode: u8,
    pub data: Vec<u8>,
}

// ─── Cycle Runner ───────────────────────────────────────────────────

pub struct CycleRunner<H: StageHal> {
    controller: MotorController<H>,
    handler: ProtocolHandler,
    stats: CycleStats,
    /// Pending host commands, sorted by tick.
    script: Vec<ScriptedCommand>,
    cycle_time_ns: i64,
    second_tick_ns: i64,
    stats_interval_s: u32,
    reports_sent: u64,
}

impl<H: StageHal> CycleRunner<H> {
    pub fn new(hal: H, config: &StageConfig) -> Self {
        Self {
            controller: MotorController::new(hal, config.motors.clone()),
            handler: ProtocolHandler::new(&config.protocol),
            stats: CycleStats::new(),
            script: Vec::new(),
            cycle_time_ns: i64::from(config.motors.tick_period_us) * 1_000,
            second_tick_ns: i64::from(config.cycle.second_tick_us) * 1_000,
            stats_interval_s: config.cycle.stats_interval_s,
            reports_sent: 0,
        }
    }

    /// Queue a host command for tick `at_tick`.
    pub fn schedule(&mut self, at_tick: u64, opcode: u8, data: &[u8]) {
        let index = self.script.partition_point(|c| c.at_tick <= at_tick);
        self.script.insert(
            index,
            ScriptedCommand {
                at_tick,
                opcode,
                data: data.to_vec(),
            },
        );
    }

    /// Hand one host command to the controller right away.
    pub fn submit(&mut self, opcode: u8, data: &[u8]) -> CommandOutcome {
        let outcome = self.handler.handle(&mut self.controller, opcode, data);
        info!(opcode, ?data, ?outcome, "host command answered");
        outcome
    }

    /// One tick: due host commands, controller tick, report drain.
    pub fn step(&mut self) {
        let now = self.controller.tick_count();
        while self.script.first().is_some_and(|c| c.at_tick <= now) {
            let command = self.script.remove(0);
            self.submit(command.opcode, &command.data);
        }
        self.controller.tick();
        while let Some(report) = self.controller.pop_report() {
            self.reports_sent += 1;
            match report {
                ProtocolReport::Executed { d0, d1 } => {
                    info!(position = u16::from_le_bytes([d0, d1]), "report: executed");
                }
                ProtocolReport::Aborted => info!("report: aborted"),
            }
        }
    }

    /// Slow tick.
    pub fn second_tick(&mut self) {
        self.controller.tick_seconds();
        self.stats.second_ticks += 1;
        let interval = u64::from(self.stats_interval_s);
        if interval > 0 && self.stats.second_ticks % interval == 0 {
            info!(
                mode = %self.controller.exec_mode(),
                ticks = self.stats.cycle_count,
                avg_ns = self.stats.avg_cycle_ns(),
                max_ns = self.stats.max_cycle_ns,
                overruns = self.stats.overruns,
                "cycle stats"
            );
        }
    }

    #[inline]
    pub fn controller(&self) -> &MotorController<H> {
        &self.controller
    }

    #[inline]
    pub fn controller_mut(&mut self) -> &mut MotorController<H> {
        &mut self.controller
    }

    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    #[inline]
    pub fn reports_sent(&self) -> u64 {
        self.reports_sent
    }

    fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns > self.cycle_time_ns {
            self.stats.overruns += 1;
            warn!(
                actual_ns = duration_ns,
                budget_ns = self.cycle_time_ns,
                "cycle overrun"
            );
        }
    }

    fn done(&self, running: &AtomicBool, max_ticks: Option<u64>) -> bool {
        !running.load(Ordering::SeqCst) || max_ticks.is_some_and(|max| self.stats.cycle_count >= max)
    }

    /// Run until `running` is cleared or `max_ticks` ticks have executed.
    pub fn run(&mut self, running: &AtomicBool, max_ticks: Option<u64>) -> Result<(), CycleError> {
        info!(
            period_us = self.cycle_time_ns / 1_000,
            ?max_ticks,
            "entering tick loop"
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(running, max_ticks);

        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(running, max_ticks);

        debug!(ticks = self.stats.cycle_count, "tick loop left");
        result
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, running: &AtomicBool, max_ticks: Option<u64>) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || clock_gettime(clock).map_err(|e| CycleError::Clock(format!("clock_gettime: {e}")));

        let mut next_wake = now()?;
        let mut next_second = timespec_add_ns(next_wake, self.second_tick_ns);

        while !self.done(running, max_ticks) {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let start = now()?;
            self.step();
            let end = now()?;
            self.record(timespec_diff_ns(&end, &start), 0);

            if timespec_diff_ns(&end, &next_second) >= 0 {
                self.second_tick();
                next_second = timespec_add_ns(next_second, self.second_tick_ns);
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
            let woke = now()?;
            self.stats.max_latency_ns = self
                .stats
                .max_latency_ns
                .max(timespec_diff_ns(&woke, &next_wake));
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, running: &AtomicBool, max_ticks: Option<u64>) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(self.cycle_time_ns as u64);
        let second = Duration::from_nanos(self.second_tick_ns as u64);
        let mut next_second = Instant::now() + second;

        while !self.done(running, max_ticks) {
            let start = Instant::now();
            self.step();
            let elapsed = start.elapsed();
            self.record(elapsed.as_nanos() as i64, 0);

            if Instant::now() >= next_second {
                self.second_tick();
                next_second += second;
            }

            if let Some(remaining) = period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let total = ts.tv_nsec() + ns;
    let secs = ts.tv_sec() + total.div_euclid(1_000_000_000);
    let nanos = total.rem_euclid(1_000_000_000);
    TimeSpec::new(secs, nanos)
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}
