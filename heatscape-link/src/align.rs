//! Camera auto-alignment.
//!
//! Centers the pan/tilt camera on a reference scene using an external
//! frame-matching service. The loop polls the matcher, nudges the servos and
//! repeats after a fixed delay.
//!
//! ```text
//!            start
//!   Idle ──────────► Searching ◄──── target lost ────┐
//!    ▲                  │                            │
//!    │ both sweeps      │ match                      │
//!    │ exhausted        ▼                            │
//!    └────────────── (recenter)      Centering ──────┘
//!                                        │ 3 × centered
//!                                        ▼
//!                                    Confirmed
//! ```
//!
//! [`Aligner`] is the synchronous state machine; [`AlignmentTask`] runs it
//! against a [`FrameMatcher`] and a [`CommandSink`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use heatscape_protocol::{Command, SERVO_MAX, SERVO_MIN};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::duration_ms;
use crate::sink::CommandSink;

// ════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════

/// Tuning for the alignment loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// Delay between the end of one poll and the start of the next
    #[serde(rename = "poll_interval_ms", with = "duration_ms")]
    pub poll_interval: Duration,
    /// Pixel offset from image center considered "centered"
    pub center_tolerance_px: f64,
    /// Servo nudge per centering poll (degrees)
    pub center_step: i32,
    /// Pan step per missed poll while searching (degrees)
    pub sweep_step: i32,
    /// Missed polls per sweep direction
    pub max_sweep_steps: u32,
    /// Consecutive centered polls needed to confirm
    pub confirmations: u32,
    /// Servo angles at start, and the recenter position after giving up
    pub home_pan: i32,
    pub home_tilt: i32,
    /// Frame size used when the matcher omits it
    pub frame_width: f64,
    pub frame_height: f64,
    /// Flip servo direction for mirrored mounts
    pub invert_pan: bool,
    pub invert_tilt: bool,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            center_tolerance_px: 20.0,
            center_step: 5,
            sweep_step: 10,
            max_sweep_steps: 8,
            confirmations: 3,
            home_pan: 90,
            home_tilt: 90,
            frame_width: 640.0,
            frame_height: 480.0,
            invert_pan: false,
            invert_tilt: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════
// Matcher seam
// ════════════════════════════════════════════════════════════════════

/// A matched keypoint in the live frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

/// Result of one frame-matching poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchReport {
    pub found: bool,
    #[serde(alias = "matches")]
    pub keypoints: Vec<Keypoint>,
    #[serde(alias = "width")]
    pub frame_width: f64,
    #[serde(alias = "height")]
    pub frame_height: f64,
}

impl MatchReport {
    /// A report counts as a match only if it carries keypoints.
    pub fn is_match(&self) -> bool {
        self.found && !self.keypoints.is_empty()
    }

    /// Confidence-weighted centroid of the keypoints.
    ///
    /// Falls back to the plain mean when every confidence is zero.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.keypoints.is_empty() {
            return None;
        }
        let total: f64 = self.keypoints.iter().map(|k| k.confidence.max(0.0)).sum();
        if total > 0.0 {
            let (sx, sy) = self.keypoints.iter().fold((0.0, 0.0), |(sx, sy), k| {
                let w = k.confidence.max(0.0);
                (sx + k.x * w, sy + k.y * w)
            });
            Some((sx / total, sy / total))
        } else {
            let n = self.keypoints.len() as f64;
            let (sx, sy) = self
                .keypoints
                .iter()
                .fold((0.0, 0.0), |(sx, sy), k| (sx + k.x, sy + k.y));
            Some((sx / n, sy / n))
        }
    }
}

/// Source of match reports (the frame-matching service).
pub trait FrameMatcher: Send + Sync + 'static {
    type Error: fmt::Display + Send;

    fn next_frame(&self) -> impl Future<Output = Result<MatchReport, Self::Error>> + Send;
}

// ════════════════════════════════════════════════════════════════════
// State machine
// ════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentState {
    Idle,
    Searching,
    Centering,
    Confirmed,
}

/// How an alignment run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentOutcome {
    /// Target held at image center for the required number of polls
    Confirmed,
    /// Both sweep directions exhausted; camera recentered
    GaveUp,
    /// Stopped by the operator
    Stopped,
}

/// Observable progress of an alignment run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentStatus {
    pub state: AlignmentState,
    pub pan: i32,
    pub tilt: i32,
    pub centered_streak: u32,
    pub polls: u32,
}

/// Commands to send after one poll, and the outcome if the run is over.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub commands: Vec<Command>,
    pub outcome: Option<AlignmentOutcome>,
}

/// Synchronous alignment state machine.
#[derive(Debug, Clone)]
pub struct Aligner {
    config: AlignConfig,
    state: AlignmentState,
    pan: i32,
    tilt: i32,
    sweep_origin: i32,
    sweep_direction: i32,
    sweep_misses: u32,
    reversed: bool,
    centered_streak: u32,
    polls: u32,
}

impl Aligner {
    pub fn new(config: AlignConfig) -> Self {
        let pan = clamp(config.home_pan);
        let tilt = clamp(config.home_tilt);
        Self {
            config,
            state: AlignmentState::Idle,
            pan,
            tilt,
            sweep_origin: pan,
            sweep_direction: 1,
            sweep_misses: 0,
            reversed: false,
            centered_streak: 0,
            polls: 0,
        }
    }

    /// Start (or restart) a run from the current servo position.
    pub fn start(&mut self) {
        self.polls = 0;
        self.enter_search();
    }

    /// Abort the run without moving the camera.
    pub fn stop(&mut self) {
        self.state = AlignmentState::Idle;
        self.centered_streak = 0;
    }

    pub fn state(&self) -> AlignmentState {
        self.state
    }

    pub fn status(&self) -> AlignmentStatus {
        AlignmentStatus {
            state: self.state,
            pan: self.pan,
            tilt: self.tilt,
            centered_streak: self.centered_streak,
            polls: self.polls,
        }
    }

    /// Feed one poll result. `None` (or a report without a match) is a miss.
    pub fn observe(&mut self, report: Option<&MatchReport>) -> Step {
        if !matches!(
            self.state,
            AlignmentState::Searching | AlignmentState::Centering
        ) {
            return Step {
                commands: Vec::new(),
                outcome: None,
            };
        }
        self.polls += 1;

        match report.filter(|r| r.is_match()) {
            Some(report) => self.center(report),
            None => self.search(),
        }
    }

    fn enter_search(&mut self) {
        self.state = AlignmentState::Searching;
        self.sweep_origin = self.pan;
        self.sweep_direction = 1;
        self.sweep_misses = 0;
        self.reversed = false;
        self.centered_streak = 0;
    }

    fn center(&mut self, report: &MatchReport) -> Step {
        self.state = AlignmentState::Centering;

        let width = if report.frame_width > 0.0 {
            report.frame_width
        } else {
            self.config.frame_width
        };
        let height = if report.frame_height > 0.0 {
            report.frame_height
        } else {
            self.config.frame_height
        };
        let (cx, cy) = report.centroid().unwrap_or((width / 2.0, height / 2.0));
        let dx = cx - width / 2.0;
        let dy = cy - height / 2.0;
        let tolerance = self.config.center_tolerance_px;

        let mut commands = Vec::new();
        let mut centered = true;

        if dx.abs() > tolerance {
            centered = false;
            let sign = if self.config.invert_pan { -1 } else { 1 };
            let next = clamp(self.pan + sign * dx.signum() as i32 * self.config.center_step);
            if next != self.pan {
                self.pan = next;
                commands.push(Command::pan(next));
            }
        }
        if dy.abs() > tolerance {
            centered = false;
            let sign = if self.config.invert_tilt { -1 } else { 1 };
            let next = clamp(self.tilt + sign * dy.signum() as i32 * self.config.center_step);
            if next != self.tilt {
                self.tilt = next;
                commands.push(Command::tilt(next));
            }
        }

        if !centered {
            self.centered_streak = 0;
            return Step {
                commands,
                outcome: None,
            };
        }

        self.centered_streak += 1;
        if self.centered_streak >= self.config.confirmations {
            self.state = AlignmentState::Confirmed;
            return Step {
                commands,
                outcome: Some(AlignmentOutcome::Confirmed),
            };
        }
        Step {
            commands,
            outcome: None,
        }
    }

    fn search(&mut self) -> Step {
        if self.state == AlignmentState::Centering {
            #[cfg(feature = "tracing")]
            tracing::debug!("Alignment: target lost at pan={}, searching", self.pan);
            self.enter_search();
        }

        let step = self.config.sweep_step;
        self.sweep_misses += 1;

        if self.sweep_misses < self.config.max_sweep_steps {
            self.pan = clamp(self.pan + self.sweep_direction * step);
            return Step {
                commands: vec![Command::pan(self.pan)],
                outcome: None,
            };
        }

        if !self.reversed {
            // Second sweep starts on the other side of the origin
            self.reversed = true;
            self.sweep_direction = -self.sweep_direction;
            self.sweep_misses = 0;
            self.pan = clamp(self.sweep_origin + self.sweep_direction * step);
            return Step {
                commands: vec![Command::pan(self.pan)],
                outcome: None,
            };
        }

        self.state = AlignmentState::Idle;
        self.centered_streak = 0;
        self.pan = clamp(self.config.home_pan);
        self.tilt = clamp(self.config.home_tilt);
        Step {
            commands: vec![Command::pan(self.pan), Command::tilt(self.tilt)],
            outcome: Some(AlignmentOutcome::GaveUp),
        }
    }
}

fn clamp(angle: i32) -> i32 {
    angle.clamp(SERVO_MIN as i32, SERVO_MAX as i32)
}

// ════════════════════════════════════════════════════════════════════
// Async loop
// ════════════════════════════════════════════════════════════════════

/// Handle to a running alignment loop.
///
/// Dropping the handle stops the loop, like calling [`stop`](Self::stop).
pub struct AlignmentHandle {
    stop_tx: watch::Sender<bool>,
    status: watch::Receiver<AlignmentStatus>,
    join: JoinHandle<AlignmentOutcome>,
}

impl AlignmentHandle {
    /// Request the loop to stop. An in-flight matcher poll is abandoned.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn status(&self) -> AlignmentStatus {
        *self.status.borrow()
    }

    /// Observe status changes.
    pub fn watch_status(&self) -> watch::Receiver<AlignmentStatus> {
        self.status.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the loop to end.
    pub async fn wait(self) -> AlignmentOutcome {
        let AlignmentHandle { stop_tx, join, .. } = self;
        let outcome = join.await.unwrap_or(AlignmentOutcome::Stopped);
        drop(stop_tx);
        outcome
    }
}

/// Async driver around [`Aligner`].
pub struct AlignmentTask;

impl AlignmentTask {
    /// Spawn an alignment run on the tokio runtime.
    pub fn spawn<M, S>(matcher: M, sink: S, config: AlignConfig) -> AlignmentHandle
    where
        M: FrameMatcher,
        S: CommandSink,
    {
        let poll_interval = config.poll_interval;
        let mut aligner = Aligner::new(config);
        aligner.start();

        let (stop_tx, stop_rx) = watch::channel(false);
        let (status_tx, status_rx) = watch::channel(aligner.status());

        let join = tokio::spawn(Self::run(
            aligner,
            matcher,
            sink,
            poll_interval,
            stop_rx,
            status_tx,
        ));

        AlignmentHandle {
            stop_tx,
            status: status_rx,
            join,
        }
    }

    async fn run<M, S>(
        mut aligner: Aligner,
        matcher: M,
        sink: S,
        poll_interval: Duration,
        mut stop_rx: watch::Receiver<bool>,
        status_tx: watch::Sender<AlignmentStatus>,
    ) -> AlignmentOutcome
    where
        M: FrameMatcher,
        S: CommandSink,
    {
        #[cfg(feature = "tracing")]
        tracing::info!("Alignment: started at pan={} tilt={}", aligner.pan, aligner.tilt);

        loop {
            let polled = tokio::select! {
                biased;
                _ = stop_requested(&mut stop_rx) => None,
                result = matcher.next_frame() => Some(result),
            };
            let Some(result) = polled else {
                return Self::stopped(&mut aligner, &status_tx);
            };

            let report = match result {
                Ok(report) => Some(report),
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Alignment: match poll failed, treating as not found: {}", _e);
                    None
                }
            };

            let step = aligner.observe(report.as_ref());
            for command in step.commands {
                if let Err(_e) = sink.send_command(command) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Alignment: servo command not sent: {}", _e);
                }
            }
            let _ = status_tx.send(aligner.status());

            if let Some(outcome) = step.outcome {
                #[cfg(feature = "tracing")]
                tracing::info!("Alignment: finished with {:?}", outcome);
                return outcome;
            }

            tokio::select! {
                biased;
                _ = stop_requested(&mut stop_rx) => {
                    return Self::stopped(&mut aligner, &status_tx);
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    fn stopped(
        aligner: &mut Aligner,
        status_tx: &watch::Sender<AlignmentStatus>,
    ) -> AlignmentOutcome {
        aligner.stop();
        let _ = status_tx.send(aligner.status());
        #[cfg(feature = "tracing")]
        tracing::info!("Alignment: stopped by operator");
        AlignmentOutcome::Stopped
    }
}

/// Resolves once a stop is requested or the handle is gone.
async fn stop_requested(stop_rx: &mut watch::Receiver<bool>) {
    let _ = stop_rx.wait_for(|stop| *stop).await;
}

// ════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════
