//! Command rate limiter.
//!
//! Motion commands (drive and servo) never reach the device closer together
//! than the configured interval. A command arriving too early replaces the
//! single pending slot, so a burst of key repeats collapses to its last
//! value. A flush task sends the pending command once the interval has
//! elapsed, and keeps rescheduling itself while new commands arrive.
//!
//! ```text
//! t=0    forward ──► sent
//! t=20   left    ──► pending
//! t=40   right   ──► pending (replaces left)
//! t=100          ──► right sent by flush task
//! ```
//!
//! Halt commands (`stop`, `emergency_stop`, `STOP_AUTO`) bypass the limiter
//! and discard the pending slot. Other commands pass straight through.

use std::sync::Arc;
use std::time::Duration;

use heatscape_protocol::{Command, CommandClass};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::LinkResult;
use crate::sink::CommandSink;

/// What happened to a submitted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Written to the sink immediately
    Sent,
    /// Held in the pending slot; sent later unless superseded
    Queued,
}

struct LimiterState {
    last_sent: Option<Instant>,
    pending: Option<Command>,
    flush_scheduled: bool,
}

/// Coalescing rate limiter in front of a [`CommandSink`].
pub struct CommandRateLimiter<S> {
    sink: Arc<S>,
    interval: Duration,
    state: Arc<Mutex<LimiterState>>,
}

impl<S> Clone for CommandRateLimiter<S> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            interval: self.interval,
            state: self.state.clone(),
        }
    }
}

impl<S: CommandSink> CommandRateLimiter<S> {
    pub fn new(sink: Arc<S>, interval: Duration) -> Self {
        Self {
            sink,
            interval,
            state: Arc::new(Mutex::new(LimiterState {
                last_sent: None,
                pending: None,
                flush_scheduled: false,
            })),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Submit a command.
    ///
    /// Errors from the sink are returned for commands sent immediately. A
    /// queued command that later fails to send is only logged.
    pub async fn submit(&self, command: Command) -> LinkResult<Dispatch> {
        match command.class() {
            CommandClass::Halt => {
                let discarded = self.state.lock().await.pending.take();
                if let Some(_discarded) = discarded {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "Rate limiter: '{}' superseded by '{}'",
                        _discarded,
                        command
                    );
                }
                self.sink.send_command(command)?;
                Ok(Dispatch::Sent)
            }
            CommandClass::Query => {
                self.sink.send_command(command)?;
                Ok(Dispatch::Sent)
            }
            CommandClass::Motion => self.submit_motion(command).await,
        }
    }

    /// The command that would be sent by the next flush, if any.
    pub async fn pending(&self) -> Option<Command> {
        self.state.lock().await.pending.clone()
    }

    async fn submit_motion(&self, command: Command) -> LinkResult<Dispatch> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let due = state
            .last_sent
            .map_or(true, |t| now.duration_since(t) >= self.interval);

        if due && !state.flush_scheduled {
            self.sink.send_command(command)?;
            state.last_sent = Some(now);
            return Ok(Dispatch::Sent);
        }

        state.pending = Some(command);
        if !state.flush_scheduled {
            state.flush_scheduled = true;
            tokio::spawn(Self::run_flush(
                self.sink.clone(),
                self.state.clone(),
                self.interval,
            ));
        }
        Ok(Dispatch::Queued)
    }

    /// Flush loop: one send per interval while the pending slot is refilled.
    async fn run_flush(sink: Arc<S>, state: Arc<Mutex<LimiterState>>, interval: Duration) {
        loop {
            let deadline = {
                let s = state.lock().await;
                s.last_sent
                    .map(|t| t + interval)
                    .unwrap_or_else(Instant::now)
            };
            tokio::time::sleep_until(deadline).await;

            let mut s = state.lock().await;
            let Some(command) = s.pending.take() else {
                s.flush_scheduled = false;
                return;
            };

            if let Err(_e) = sink.send_command(command) {
                #[cfg(feature = "tracing")]
                tracing::warn!("Rate limiter: deferred send failed: {}", _e);
            }
            s.last_sent = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkError;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: StdMutex<Vec<(Instant, Command)>>,
    }

    impl RecordingSink {
        fn commands(&self) -> Vec<Command> {
            self.sent.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
        }

        fn times(&self) -> Vec<Instant> {
            self.sent.lock().unwrap().iter().map(|(t, _)| *t).collect()
        }
    }

    impl CommandSink for RecordingSink {
        fn send_command(&self, command: Command) -> LinkResult<()> {
            self.sent.lock().unwrap().push((Instant::now(), command));
            Ok(())
        }
    }

    struct DisconnectedSink;

    impl CommandSink for DisconnectedSink {
        fn send_command(&self, command: Command) -> LinkResult<()> {
            Err(LinkError::not_connected("ws://test", command.encode()))
        }
    }

    fn limiter() -> (Arc<RecordingSink>, CommandRateLimiter<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let limiter = CommandRateLimiter::new(sink.clone(), Duration::from_millis(100));
        (sink, limiter)
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_command_is_sent_immediately() {
        let (sink, limiter) = limiter();
        assert_eq!(limiter.submit(Command::Forward).await.unwrap(), Dispatch::Sent);
        assert_eq!(sink.commands(), vec![Command::Forward]);
    }

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_most_recent() {
        let (sink, limiter) = limiter();
        let start = Instant::now();

        limiter.submit(Command::Forward).await.unwrap();
        sleep_ms(10).await;
        assert_eq!(limiter.submit(Command::Left).await.unwrap(), Dispatch::Queued);
        sleep_ms(10).await;
        assert_eq!(limiter.submit(Command::Right).await.unwrap(), Dispatch::Queued);
        sleep_ms(10).await;
        assert_eq!(limiter.submit(Command::Backward).await.unwrap(), Dispatch::Queued);
        assert_eq!(limiter.pending().await, Some(Command::Backward));

        sleep_ms(500).await;

        assert_eq!(sink.commands(), vec![Command::Forward, Command::Backward]);
        let waited = sink.times()[1] - start;
        assert!(waited >= Duration::from_millis(100));
        assert!(waited < Duration::from_millis(110));
    }

    #[tokio::test(start_paused = true)]
    async fn one_command_per_window() {
        let (sink, limiter) = limiter();

        // Key repeat every 30 ms for 600 ms
        for i in 0..20 {
            let cmd = Command::pan(i);
            limiter.submit(cmd).await.unwrap();
            sleep_ms(30).await;
        }
        sleep_ms(300).await;

        let times = sink.times();
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
        // The final value always gets through
        assert_eq!(sink.commands().last(), Some(&Command::pan(19)));
        assert!(limiter.pending().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_commands_are_not_delayed() {
        let (sink, limiter) = limiter();
        limiter.submit(Command::Forward).await.unwrap();
        sleep_ms(150).await;
        assert_eq!(limiter.submit(Command::Left).await.unwrap(), Dispatch::Sent);
        assert_eq!(sink.commands(), vec![Command::Forward, Command::Left]);
    }

    #[tokio::test(start_paused = true)]
    async fn halt_bypasses_and_discards_pending() {
        let (sink, limiter) = limiter();
        limiter.submit(Command::Forward).await.unwrap();
        sleep_ms(10).await;
        limiter.submit(Command::Left).await.unwrap();

        assert_eq!(limiter.submit(Command::Stop).await.unwrap(), Dispatch::Sent);
        assert_eq!(sink.commands(), vec![Command::Forward, Command::Stop]);

        sleep_ms(300).await;
        // The queued movement never follows the stop
        assert_eq!(sink.commands(), vec![Command::Forward, Command::Stop]);
    }

    #[tokio::test(start_paused = true)]
    async fn emergency_stop_is_never_queued() {
        let (sink, limiter) = limiter();
        limiter.submit(Command::Forward).await.unwrap();
        for _ in 0..3 {
            assert_eq!(
                limiter.submit(Command::EmergencyStop).await.unwrap(),
                Dispatch::Sent
            );
        }
        assert_eq!(sink.commands().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn queries_pass_through() {
        let (sink, limiter) = limiter();
        limiter.submit(Command::Forward).await.unwrap();
        assert_eq!(
            limiter.submit(Command::GetTemperature).await.unwrap(),
            Dispatch::Sent
        );
        assert_eq!(sink.commands(), vec![Command::Forward, Command::GetTemperature]);
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_send_errors_are_returned() {
        let limiter = CommandRateLimiter::new(Arc::new(DisconnectedSink), Duration::from_millis(100));
        let err = limiter.submit(Command::Forward).await.unwrap_err();
        assert!(matches!(err, LinkError::NotConnected { .. }));
        let err = limiter.submit(Command::Stop).await.unwrap_err();
        assert!(matches!(err, LinkError::NotConnected { .. }));
    }
}
