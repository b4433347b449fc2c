//! Waiting for a job to complete.
//!
//! [`Poller::wait`] repeatedly invokes a caller-supplied "poll once"
//! operation on a fixed interval until the snapshot reports completion,
//! the resource disappears, the deadline passes or the wait is cancelled.
//! Everything runs on the calling thread.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};

use super::models::{Validation, ValidationOverview};

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(5);

/// A snapshot the poller can inspect for completion.
pub trait Pollable {
    fn is_completed(&self) -> bool;
}

impl Pollable for Validation {
    fn is_completed(&self) -> bool {
        Validation::is_completed(self)
    }
}

impl Pollable for ValidationOverview {
    fn is_completed(&self) -> bool {
        ValidationOverview::is_completed(self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    timeout: Duration,
    polling_interval: Duration,
    wait: bool,
}

impl WaitOptions {
    /// Return the first snapshot as is, without polling.
    pub const DONT_WAIT: Self = Self {
        timeout: Duration::ZERO,
        polling_interval: Duration::ZERO,
        wait: false,
    };

    pub const fn new(timeout: Duration, polling_interval: Duration) -> Self {
        Self {
            timeout,
            polling_interval,
            wait: true,
        }
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    pub const fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    pub const fn is_dont_wait(&self) -> bool {
        !self.wait
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT, DEFAULT_POLLING_INTERVAL)
    }
}

/// Lifecycle notifications, delivered synchronously on the polling thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitEvent {
    LoopStarted,
    BeforePoll,
    AfterPoll,
    LoopFinished,
}

/// Receives [`WaitEvent`]s together with the latest snapshot, if any.
/// Implementations must return quickly: the loop is stalled meanwhile.
pub trait WaitEventSink<T> {
    fn on_event(&mut self, event: WaitEvent, snapshot: Option<&T>);
}

/// A sink that drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoreEvents;

impl<T> WaitEventSink<T> for IgnoreEvents {
    fn on_event(&mut self, _event: WaitEvent, _snapshot: Option<&T>) {}
}

impl<T, F> WaitEventSink<T> for F
where
    F: FnMut(WaitEvent, Option<&T>),
{
    fn on_event(&mut self, event: WaitEvent, snapshot: Option<&T>) {
        self(event, snapshot);
    }
}

/// How a wait ended, when it did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum WaitOutcome<T> {
    Completed(T),
    /// Returned unchanged under [`WaitOptions::DONT_WAIT`] while the job is
    /// still running.
    Pending(T),
    /// The deadline passed; holds the last snapshot, still not completed.
    TimedOut(T),
    /// The job does not exist (anymore).
    NotFound,
    /// The wait was cancelled while sleeping between polls.
    Cancelled(Option<T>),
}

impl<T> WaitOutcome<T> {
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The snapshot carried by the outcome, if any.
    pub fn snapshot(&self) -> Option<&T> {
        match self {
            Self::Completed(snapshot) | Self::Pending(snapshot) | Self::TimedOut(snapshot) => {
                Some(snapshot)
            }
            Self::Cancelled(snapshot) => snapshot.as_ref(),
            Self::NotFound => None,
        }
    }

    pub fn into_snapshot(self) -> Option<T> {
        match self {
            Self::Completed(snapshot) | Self::Pending(snapshot) | Self::TimedOut(snapshot) => {
                Some(snapshot)
            }
            Self::Cancelled(snapshot) => snapshot,
            Self::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WaitOutcome<U> {
        match self {
            Self::Completed(snapshot) => WaitOutcome::Completed(f(snapshot)),
            Self::Pending(snapshot) => WaitOutcome::Pending(f(snapshot)),
            Self::TimedOut(snapshot) => WaitOutcome::TimedOut(f(snapshot)),
            Self::Cancelled(snapshot) => WaitOutcome::Cancelled(snapshot.map(f)),
            Self::NotFound => WaitOutcome::NotFound,
        }
    }
}

/// Cooperative cancellation for a running wait. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wakes up any wait sleeping on this token.
    pub fn cancel(&self) {
        let (cancelled, condvar) = &*self.inner;
        *cancelled.lock() = true;
        condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock()
    }

    /// Blocks for `duration` unless cancelled first. Returns `true` if
    /// the token was (or got) cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (cancelled, condvar) = &*self.inner;
        let deadline = Instant::now() + duration;
        let mut guard = cancelled.lock();
        while !*guard {
            if condvar.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        *guard
    }
}

/// Time source of the poller.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;

    /// Sleeps for `duration`; returns `true` if interrupted by
    /// `cancellation`.
    fn sleep(&self, duration: Duration, cancellation: &CancellationToken) -> bool;
}

#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration, cancellation: &CancellationToken) -> bool {
        cancellation.sleep(duration)
    }
}

/// Drives the completion-wait loop.
#[derive(Clone, Debug, Default)]
pub struct Poller<C = SystemClock> {
    clock: C,
    cancellation: CancellationToken,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> Poller<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            cancellation: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Polls until completion, absence, timeout or cancellation.
    ///
    /// `poll_once` returns `Ok(None)` when the job cannot be found. With
    /// [`WaitOptions::DONT_WAIT`] it is invoked exactly once and no events
    /// are emitted.
    ///
    /// # Errors
    ///
    /// Propagates the first error of `poll_once`, after `LoopFinished`
    /// has been emitted with the last snapshot seen.
    pub fn wait<T, E, F>(
        &self,
        mut poll_once: F,
        options: &WaitOptions,
        events: &mut dyn WaitEventSink<T>,
    ) -> Result<WaitOutcome<T>, E>
    where
        T: Pollable,
        F: FnMut() -> Result<Option<T>, E>,
    {
        if options.is_dont_wait() {
            return Ok(match poll_once()? {
                Some(snapshot) if snapshot.is_completed() => WaitOutcome::Completed(snapshot),
                Some(snapshot) => WaitOutcome::Pending(snapshot),
                None => WaitOutcome::NotFound,
            });
        }

        let started = self.clock.now();
        let mut last: Option<T> = None;
        events.on_event(WaitEvent::LoopStarted, None);

        let outcome = loop {
            events.on_event(WaitEvent::BeforePoll, last.as_ref());
            let snapshot = match poll_once() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    events.on_event(WaitEvent::LoopFinished, last.as_ref());
                    return Err(e);
                }
            };
            events.on_event(WaitEvent::AfterPoll, snapshot.as_ref());

            let Some(snapshot) = snapshot else {
                break WaitOutcome::NotFound;
            };
            if snapshot.is_completed() {
                events.on_event(WaitEvent::LoopFinished, Some(&snapshot));
                return Ok(WaitOutcome::Completed(snapshot));
            }

            let elapsed = self.clock.now().saturating_sub(started);
            if elapsed + options.polling_interval() > options.timeout() {
                events.on_event(WaitEvent::LoopFinished, Some(&snapshot));
                return Ok(WaitOutcome::TimedOut(snapshot));
            }
            last = Some(snapshot);

            if self
                .clock
                .sleep(options.polling_interval(), &self.cancellation)
            {
                return Ok(WaitOutcome::Cancelled(last));
            }
        };

        events.on_event(WaitEvent::LoopFinished, last.as_ref());
        Ok(outcome)
    }
}

/// Shorthand for [`Poller::wait`] with the system clock and no
/// cancellation.
///
/// # Errors
///
/// Propagates the first error of `poll_once`.
pub fn wait_for_completion<T, E, F>(
    poll_once: F,
    options: &WaitOptions,
    events: &mut dyn WaitEventSink<T>,
) -> Result<WaitOutcome<T>, E>
where
    T: Pollable,
    F: FnMut() -> Result<Option<T>, E>,
{
    Poller::new().wait(poll_once, options, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, collections::VecDeque, rc::Rc, thread};

    #[derive(Clone, Debug, PartialEq)]
    struct Snapshot {
        seq: usize,
        done: bool,
    }

    impl Pollable for Snapshot {
        fn is_completed(&self) -> bool {
            self.done
        }
    }

    /// Virtual time: sleeping advances the clock instantly.
    #[derive(Clone, Default)]
    struct ManualClock {
        now: Rc<Cell<Duration>>,
        sleeps: Rc<Cell<usize>>,
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            self.now.get()
        }

        fn sleep(&self, duration: Duration, cancellation: &CancellationToken) -> bool {
            self.sleeps.set(self.sleeps.get() + 1);
            self.now.set(self.now.get() + duration);
            cancellation.is_cancelled()
        }
    }

    fn pending(seq: usize) -> Snapshot {
        Snapshot { seq, done: false }
    }

    fn completed(seq: usize) -> Snapshot {
        Snapshot { seq, done: true }
    }

    fn scripted(
        script: Vec<Result<Option<Snapshot>, String>>,
    ) -> (Rc<Cell<usize>>, impl FnMut() -> Result<Option<Snapshot>, String>) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut script: VecDeque<_> = script.into();
        let poll = move || {
            counter.set(counter.get() + 1);
            script.pop_front().unwrap_or_else(|| Ok(Some(pending(99))))
        };
        (calls, poll)
    }

    fn options(timeout: u64, interval: u64) -> WaitOptions {
        WaitOptions::new(Duration::from_secs(timeout), Duration::from_secs(interval))
    }

    #[test]
    fn test_dont_wait_polls_once_without_events() {
        for script in [pending(1), completed(1)] {
            let (calls, poll) = scripted(vec![Ok(Some(script.clone()))]);
            let mut events = Vec::new();
            let mut sink = |event: WaitEvent, _: Option<&Snapshot>| events.push(event);

            let outcome = Poller::with_clock(ManualClock::default())
                .wait(poll, &WaitOptions::DONT_WAIT, &mut sink)
                .unwrap();

            assert_eq!(calls.get(), 1);
            assert!(events.is_empty());
            assert_eq!(outcome.into_snapshot(), Some(script));
        }
    }

    #[test]
    fn test_dont_wait_reports_not_found() {
        let (calls, poll) = scripted(vec![Ok(None)]);
        let outcome = Poller::with_clock(ManualClock::default())
            .wait(poll, &WaitOptions::DONT_WAIT, &mut IgnoreEvents)
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(outcome, WaitOutcome::NotFound);
    }

    #[test]
    fn test_not_found_ends_loop_immediately() {
        let clock = ManualClock::default();
        let (calls, poll) = scripted(vec![Ok(None)]);
        let mut events = Vec::new();
        let mut sink = |event: WaitEvent, _: Option<&Snapshot>| events.push(event);

        let outcome = Poller::with_clock(clock.clone())
            .wait(poll, &options(60, 5), &mut sink)
            .unwrap();

        assert_eq!(outcome, WaitOutcome::NotFound);
        assert_eq!(calls.get(), 1);
        assert_eq!(clock.sleeps.get(), 0);
        assert_eq!(
            events,
            vec![
                WaitEvent::LoopStarted,
                WaitEvent::BeforePoll,
                WaitEvent::AfterPoll,
                WaitEvent::LoopFinished
            ]
        );
    }

    #[test]
    fn test_completion_returns_third_snapshot() {
        let clock = ManualClock::default();
        let (calls, poll) = scripted(vec![
            Ok(Some(pending(1))),
            Ok(Some(pending(2))),
            Ok(Some(completed(3))),
        ]);

        let outcome = Poller::with_clock(clock.clone())
            .wait(poll, &options(60, 5), &mut IgnoreEvents)
            .unwrap();

        assert_eq!(calls.get(), 3);
        assert_eq!(clock.sleeps.get(), 2);
        assert_eq!(outcome, WaitOutcome::Completed(completed(3)));
    }

    #[test]
    fn test_timeout_boundary() {
        // (timeout, interval) -> floor(T / P) + 1 polls
        for (timeout, interval, expected) in [(10, 5, 3), (12, 5, 3), (4, 5, 1), (0, 5, 1), (30, 10, 4)] {
            let (calls, poll) = scripted(Vec::new());
            let outcome = Poller::with_clock(ManualClock::default())
                .wait(poll, &options(timeout, interval), &mut IgnoreEvents)
                .unwrap();

            assert_eq!(calls.get(), expected, "timeout={timeout} interval={interval}");
            assert!(matches!(outcome, WaitOutcome::TimedOut(_)));
        }
    }

    #[test]
    fn test_timeout_carries_last_snapshot_and_finishes() {
        let (_, poll) = scripted(vec![Ok(Some(pending(1))), Ok(Some(pending(2)))]);
        let mut finished_with = None;
        let mut sink = |event: WaitEvent, snapshot: Option<&Snapshot>| {
            if event == WaitEvent::LoopFinished {
                finished_with = snapshot.cloned();
            }
        };

        let outcome = Poller::with_clock(ManualClock::default())
            .wait(poll, &options(5, 5), &mut sink)
            .unwrap();

        assert_eq!(outcome, WaitOutcome::TimedOut(pending(2)));
        assert_eq!(finished_with, Some(pending(2)));
    }

    #[test]
    fn test_error_is_raised_after_loop_finished() {
        let (calls, poll) = scripted(vec![
            Ok(Some(pending(1))),
            Err("connection reset".to_string()),
        ]);
        let mut events = Vec::new();
        let mut sink = |event: WaitEvent, snapshot: Option<&Snapshot>| {
            events.push((event, snapshot.map(|s| s.seq)));
        };

        let result = Poller::with_clock(ManualClock::default()).wait(poll, &options(60, 5), &mut sink);

        assert_eq!(result, Err("connection reset".to_string()));
        assert_eq!(calls.get(), 2);
        assert_eq!(events.last(), Some(&(WaitEvent::LoopFinished, Some(1))));
    }

    #[test]
    fn test_cancellation_during_sleep_skips_loop_finished() {
        let token = CancellationToken::new();
        token.cancel();
        let (calls, poll) = scripted(vec![Ok(Some(pending(1)))]);
        let mut events = Vec::new();
        let mut sink = |event: WaitEvent, _: Option<&Snapshot>| events.push(event);

        let outcome = Poller::with_clock(ManualClock::default())
            .cancellation(token)
            .wait(poll, &options(60, 5), &mut sink)
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(outcome, WaitOutcome::Cancelled(Some(pending(1))));
        assert!(!events.contains(&WaitEvent::LoopFinished));
    }

    #[test]
    fn test_cancellation_token_wakes_sleeper() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        let started = Instant::now();
        assert!(token.sleep(Duration::from_secs(30)));
        assert!(started.elapsed() < Duration::from_secs(10));
        handle.join().unwrap();
    }

    #[test]
    fn test_uncancelled_sleep_runs_to_completion() {
        let token = CancellationToken::new();
        assert!(!token.sleep(Duration::from_millis(5)));
    }

    #[test]
    fn test_system_clock_polls_with_real_sleeps() {
        let (calls, poll) = scripted(vec![Ok(Some(pending(1))), Ok(Some(completed(2)))]);
        let outcome = wait_for_completion(
            poll,
            &WaitOptions::new(Duration::from_secs(5), Duration::from_millis(10)),
            &mut IgnoreEvents,
        )
        .unwrap();

        assert_eq!(calls.get(), 2);
        assert!(outcome.is_completed());
    }
}
