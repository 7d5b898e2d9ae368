//! # Frame Loop
//!
//! ```text
//! Frame N:
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. REMOVE DRAIN   every participant                          │
//! │ 2. START DRAIN    every participant                          │
//! │ 3. UPDATES        every participant (pools sweep at the end) │
//! │ ──────────────── logic / render boundary ──────────────────  │
//! │ 4. RENDER         pre-draw hooks, then batch uploads         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step runs across all participants before the next one starts, so
//! no entity ever sees another entity in an earlier phase of the same tick.

use std::time::{Duration, Instant};

use kiln_core::Phased;

use crate::config::SimulationConfig;

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Drain and update phases in microseconds.
    pub logic_us: u64,
    /// Render phase in microseconds.
    pub render_us: u64,
    /// Frame number.
    pub frame: u64,
}

/// Runs tick phases across a fixed set of participants.
pub struct FrameLoop {
    participants: Vec<Box<dyn Phased>>,
    frame_count: u64,
    target_frame_time: Duration,
    timing_logs: bool,
    stats: FrameStatsAccumulator,
}

impl FrameLoop {
    /// Creates an empty loop targeting `target_fps`.
    #[must_use]
    pub fn new(target_fps: u32, timing_logs: bool) -> Self {
        let target_frame_time = Duration::from_secs(1) / target_fps.max(1);
        Self {
            participants: Vec::new(),
            frame_count: 0,
            target_frame_time,
            timing_logs,
            stats: FrameStatsAccumulator::new(target_frame_time),
        }
    }

    /// Creates an empty loop from the configured rate and logging switch.
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.target_fps, config.timing_logs)
    }

    /// Appends a participant. Participants tick in insertion order within
    /// each phase.
    pub fn push(&mut self, participant: Box<dyn Phased>) {
        self.participants.push(participant);
    }

    /// Number of participants.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Checks whether the loop has no participants.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Runs one frame with a delta of `delta` seconds.
    pub fn run_frame(&mut self, delta: f32) -> FrameStats {
        let frame_start = Instant::now();

        for participant in &mut self.participants {
            participant.drain_removals();
        }
        for participant in &mut self.participants {
            participant.drain_starts();
        }
        for participant in &mut self.participants {
            participant.run_updates(delta);
        }

        let render_start = Instant::now();
        for participant in &mut self.participants {
            participant.render();
        }
        let frame_end = Instant::now();

        let stats = FrameStats {
            total_us: micros(frame_end - frame_start),
            logic_us: micros(render_start - frame_start),
            render_us: micros(frame_end - render_start),
            frame: self.frame_count,
        };
        self.end_frame(stats);
        stats
    }

    /// Runs `frames` frames at the fixed delta of the target rate.
    pub fn run(&mut self, frames: u64) {
        let delta = self.target_frame_time.as_secs_f32();
        for _ in 0..frames {
            self.run_frame(delta);
        }
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats.record(stats);

        if self.timing_logs && stats.total_us > micros(self.target_frame_time) {
            tracing::warn!(
                frame = stats.frame,
                total_ms = stats.total_us as f64 / 1000.0,
                target_ms = self.target_frame_time.as_secs_f64() * 1000.0,
                "frame exceeded budget"
            );
        }
    }

    /// Frames run so far.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Budget for one frame.
    #[inline]
    #[must_use]
    pub const fn target_frame_time(&self) -> Duration {
        self.target_frame_time
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of logic times.
    pub logic_us_sum: u64,
    /// Sum of render times.
    pub render_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded budget.
    pub frames_over_budget: u64,
    budget_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates an accumulator that counts frames over `budget`.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            logic_us_sum: 0,
            render_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            budget_us: micros(budget),
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.logic_us_sum += stats.logic_us;
        self.render_us_sum += stats.render_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        if stats.total_us > self.budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary at `info` level.
    pub fn log_summary(&self) {
        if self.frames_recorded == 0 {
            tracing::info!("no frames recorded");
            return;
        }

        let frames = self.frames_recorded as f64;
        tracing::info!(
            frames = self.frames_recorded,
            avg_ms = self.avg_frame_ms(),
            avg_fps = self.avg_fps(),
            min_ms = self.min_frame_us as f64 / 1000.0,
            max_ms = self.max_frame_us as f64 / 1000.0,
            over_budget = self.frames_over_budget,
            logic_ms = self.logic_us_sum as f64 / frames / 1000.0,
            render_ms = self.render_us_sum as f64 / frames / 1000.0,
            "frame statistics"
        );
    }
}
