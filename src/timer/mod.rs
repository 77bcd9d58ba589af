mod core;

pub use self::core::{CountdownState, DEFAULT_TICK_INTERVAL, TimerEngine, TimerSignal};
