//! Toast notification engine.
//!
//! Owns the live set of toasts, their countdown timers and lifecycle
//! broadcasts. Rendering is left to the host: a view subscribes to the
//! [`LifecycleBus`], reads [`Toast`] snapshots, and reports show, hover,
//! click and destroy events back through the [`Notifier`].

pub mod bus;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod notifier;
pub mod registry;
pub mod timer;

pub use bus::{
    EmitReport, LifecycleAction, LifecycleBus, LifecycleEvent, LifecycleListener, LifecycleLogger,
    ListenerResult, Subscription,
};
pub use config::{
    DockPosition, GlobalConfig, GlobalPatch, Position, ToastConfig, ToastDefaults,
    ToastDefaultsPatch, ToastPatch, ToastType, merge_defaults, merge_global, merge_toast,
};
pub use error::{ListenerError, Result, ToastError};
pub use logging::{
    FileSink, LogEvent, LogFields, LogLevel, LogSink, Logger, LoggingError, LoggingResult,
    MemorySink, NullSink,
};
pub use metrics::{DockMetrics, MetricSnapshot};
pub use notifier::{DockEvent, EngineConfig, HoverHook, Notifier};
pub use registry::{RetireReason, Toast, ToastId, ToastRegistry, ToastState};
pub use timer::{CountdownState, DEFAULT_TICK_INTERVAL, TimerEngine, TimerSignal};
