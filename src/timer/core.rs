use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use crate::logging::{LogLevel, Logger, TARGET_TIMER, emit as log, json_kv};
use crate::registry::ToastId;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

const COMPLETE: f64 = 100.0;
// absorbs float drift from summing fractional steps
const COMPLETE_EPSILON: f64 = 1e-9;

/// Countdown phase of a single toast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountdownState {
    /// Registered but the toast has not been shown yet.
    Armed,
    Running { progress: f64 },
    Paused { progress: f64 },
    Expired,
}

impl CountdownState {
    pub fn progress(&self) -> f64 {
        match self {
            CountdownState::Armed => 0.0,
            CountdownState::Running { progress } | CountdownState::Paused { progress } => {
                *progress
            }
            CountdownState::Expired => COMPLETE,
        }
    }
}

/// Emitted by [`TimerEngine::advance`] for each tick that landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerSignal {
    Progressed { id: ToastId, progress: f64 },
    Expired { id: ToastId },
}

#[derive(Debug, Clone, Copy)]
struct Countdown {
    state: CountdownState,
    step: f64,
    generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct ScheduledTick {
    due: Duration,
    seq: u64,
    id: ToastId,
    generation: u64,
}

/// Drives every toast countdown from one virtual clock.
///
/// Ticks sit in a min-heap keyed by due time. Each carries the generation of
/// its countdown at scheduling time; pausing, cancelling or expiring bumps
/// the generation, so a tick that surfaces afterwards is dropped.
pub struct TimerEngine {
    tick_interval: Duration,
    clock: Duration,
    seq: u64,
    queue: BinaryHeap<Reverse<ScheduledTick>>,
    countdowns: HashMap<ToastId, Countdown>,
    fired: u64,
    stale: u64,
    logger: Option<Logger>,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}

impl TimerEngine {
    /// A zero interval is bumped to one millisecond.
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval: tick_interval.max(Duration::from_millis(1)),
            clock: Duration::ZERO,
            seq: 0,
            queue: BinaryHeap::new(),
            countdowns: HashMap::new(),
            fired: 0,
            stale: 0,
            logger: None,
        }
    }

    pub fn set_logger(&mut self, logger: Option<Logger>) {
        self.logger = logger;
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn now(&self) -> Duration {
        self.clock
    }

    /// Register a countdown. Returns `false` for a zero timeout, which never
    /// counts down.
    pub fn arm(&mut self, id: ToastId, timeout: Duration) -> bool {
        if timeout.is_zero() {
            return false;
        }
        let step = self.tick_interval.as_secs_f64() / timeout.as_secs_f64() * COMPLETE;
        self.countdowns.insert(
            id,
            Countdown {
                state: CountdownState::Armed,
                step,
                generation: 0,
            },
        );
        true
    }

    /// Armed -> Running from zero.
    pub fn start(&mut self, id: ToastId) -> bool {
        let Some(countdown) = self.countdowns.get_mut(&id) else {
            return false;
        };
        if countdown.state != CountdownState::Armed {
            return false;
        }
        countdown.state = CountdownState::Running { progress: 0.0 };
        let generation = countdown.generation;
        self.schedule(id, generation, self.clock.saturating_add(self.tick_interval));
        true
    }

    /// Running -> Paused, keeping the exact progress.
    pub fn pause(&mut self, id: ToastId) -> bool {
        let Some(countdown) = self.countdowns.get_mut(&id) else {
            return false;
        };
        let CountdownState::Running { progress } = countdown.state else {
            return false;
        };
        countdown.state = CountdownState::Paused { progress };
        countdown.generation += 1;
        true
    }

    /// Paused -> Running from the stored progress. Reschedules the same
    /// countdown; never creates a second one.
    pub fn resume(&mut self, id: ToastId) -> bool {
        let Some(countdown) = self.countdowns.get_mut(&id) else {
            return false;
        };
        let CountdownState::Paused { progress } = countdown.state else {
            return false;
        };
        countdown.state = CountdownState::Running { progress };
        let generation = countdown.generation;
        self.schedule(id, generation, self.clock.saturating_add(self.tick_interval));
        true
    }

    /// Forget the countdown. Queued ticks for it become no-ops.
    pub fn cancel(&mut self, id: ToastId) -> bool {
        self.countdowns.remove(&id).is_some()
    }

    pub fn state(&self, id: ToastId) -> Option<CountdownState> {
        self.countdowns.get(&id).map(|countdown| countdown.state)
    }

    pub fn progress(&self, id: ToastId) -> Option<f64> {
        self.state(id).map(|state| state.progress())
    }

    /// True when no countdown is running.
    pub fn is_idle(&self) -> bool {
        !self
            .countdowns
            .values()
            .any(|countdown| matches!(countdown.state, CountdownState::Running { .. }))
    }

    pub fn fired_ticks(&self) -> u64 {
        self.fired
    }

    pub fn stale_ticks(&self) -> u64 {
        self.stale
    }

    /// Move the clock forward by `elapsed`, firing every tick that falls due.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerSignal> {
        let target = self.clock.saturating_add(elapsed);
        let mut signals = Vec::new();

        while let Some(Reverse(tick)) = self.queue.peek().copied() {
            if tick.due > target {
                break;
            }
            self.queue.pop();
            self.clock = tick.due;
            self.fire(tick, &mut signals);
        }

        self.clock = target;
        signals
    }

    fn fire(&mut self, tick: ScheduledTick, signals: &mut Vec<TimerSignal>) {
        let Some(countdown) = self.countdowns.get_mut(&tick.id) else {
            self.drop_stale(tick, "cancelled");
            return;
        };
        let CountdownState::Running { progress } = countdown.state else {
            self.drop_stale(tick, "not_running");
            return;
        };
        if countdown.generation != tick.generation {
            self.drop_stale(tick, "superseded");
            return;
        }

        self.fired += 1;
        let progress = progress + countdown.step;
        if progress + COMPLETE_EPSILON >= COMPLETE {
            countdown.state = CountdownState::Expired;
            countdown.generation += 1;
            signals.push(TimerSignal::Progressed {
                id: tick.id,
                progress: COMPLETE,
            });
            signals.push(TimerSignal::Expired { id: tick.id });
            log(
                self.logger.as_ref(),
                LogLevel::Debug,
                TARGET_TIMER,
                "countdown_expired",
                [
                    json_kv("id", tick.id.0),
                    json_kv("at_ms", tick.due.as_millis() as u64),
                ],
            );
            return;
        }

        countdown.state = CountdownState::Running { progress };
        let generation = countdown.generation;
        signals.push(TimerSignal::Progressed {
            id: tick.id,
            progress,
        });
        self.schedule(tick.id, generation, tick.due.saturating_add(self.tick_interval));
    }

    fn drop_stale(&mut self, tick: ScheduledTick, reason: &str) {
        self.stale += 1;
        log(
            self.logger.as_ref(),
            LogLevel::Trace,
            TARGET_TIMER,
            "tick_dropped",
            [json_kv("id", tick.id.0), json_kv("reason", reason)],
        );
    }

    fn schedule(&mut self, id: ToastId, generation: u64, due: Duration) {
        self.seq += 1;
        self.queue.push(Reverse(ScheduledTick {
            due,
            seq: self.seq,
            id,
            generation,
        }));
    }
}
