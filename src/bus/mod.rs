//! Lifecycle event bus.
//!
//! The engine never touches presentation state. Views subscribe here and
//! apply their own side effects (enter/exit styling, icon swaps) in
//! response to each transition.

mod core;
mod logger;

pub use self::core::{
    EmitReport, LifecycleAction, LifecycleBus, LifecycleEvent, LifecycleListener, ListenerResult,
    Subscription,
};
pub use logger::LifecycleLogger;

pub(crate) use self::core::lock;
