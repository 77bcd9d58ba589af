use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};

use serde::Serialize;
use serde_json::json;

use crate::error::ListenerError;
use crate::logging::{LogLevel, Logger, TARGET_BUS, emit as log, json_kv};
use crate::metrics::DockMetrics;
use crate::registry::Toast;

/// Named transition point broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LifecycleAction {
    #[serde(rename = "onInit")]
    OnInit,
    #[serde(rename = "onHoverEnter")]
    OnHoverEnter,
    #[serde(rename = "onHoverLeave")]
    OnHoverLeave,
    #[serde(rename = "onClick")]
    OnClick,
    #[serde(rename = "beforeDestroy")]
    BeforeDestroy,
    #[serde(rename = "afterDestroy")]
    AfterDestroy,
    /// `set_type` retyped the toast; the view should swap its styling.
    #[serde(rename = "typeChanged")]
    TypeChanged,
}

impl LifecycleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleAction::OnInit => "onInit",
            LifecycleAction::OnHoverEnter => "onHoverEnter",
            LifecycleAction::OnHoverLeave => "onHoverLeave",
            LifecycleAction::OnClick => "onClick",
            LifecycleAction::BeforeDestroy => "beforeDestroy",
            LifecycleAction::AfterDestroy => "afterDestroy",
            LifecycleAction::TypeChanged => "typeChanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleEvent {
    pub action: LifecycleAction,
    pub toast: Toast,
}

impl LifecycleEvent {
    pub fn new(action: LifecycleAction, toast: Toast) -> Self {
        Self { action, toast }
    }
}

pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Observer attached to a [`LifecycleBus`].
pub trait LifecycleListener: Send {
    fn name(&self) -> &str {
        "lifecycle_listener"
    }

    fn on_lifecycle(&mut self, event: &LifecycleEvent) -> ListenerResult;
}

struct FnListener<F>(F);

impl<F> LifecycleListener for FnListener<F>
where
    F: FnMut(&LifecycleEvent) -> ListenerResult + Send,
{
    fn on_lifecycle(&mut self, event: &LifecycleEvent) -> ListenerResult {
        (self.0)(event)
    }
}

type SharedListener = Arc<Mutex<Box<dyn LifecycleListener>>>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(u64, SharedListener)>,
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<DockMetrics>>>,
}

/// Outcome of a single emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Synchronous, in-order broadcast of lifecycle events. Clones share the
/// same subscriber list.
#[derive(Clone, Default)]
pub struct LifecycleBus {
    inner: Arc<Mutex<BusInner>>,
}

impl LifecycleBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_logger(&self, logger: Option<Logger>) {
        lock(&self.inner).logger = logger;
    }

    pub fn set_metrics(&self, metrics: Option<Arc<Mutex<DockMetrics>>>) {
        lock(&self.inner).metrics = metrics;
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&LifecycleEvent) -> ListenerResult + Send + 'static,
    {
        self.subscribe_listener(FnListener(listener))
    }

    pub fn subscribe_listener<L>(&self, listener: L) -> Subscription
    where
        L: LifecycleListener + 'static,
    {
        let mut inner = lock(&self.inner);
        inner.next_id += 1;
        let id = inner.next_id;
        let boxed: Box<dyn LifecycleListener> = Box::new(listener);
        inner.listeners.push((id, Arc::new(Mutex::new(boxed))));
        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    /// Deliver `event` to every listener subscribed at the time of the call.
    ///
    /// A failing or panicking listener is logged and counted; the remaining
    /// listeners still receive the event.
    pub fn emit(&self, event: LifecycleEvent) -> EmitReport {
        let (listeners, logger, metrics) = {
            let inner = lock(&self.inner);
            (
                inner.listeners.clone(),
                inner.logger.clone(),
                inner.metrics.clone(),
            )
        };

        let mut report = EmitReport::default();
        for (id, listener) in listeners {
            let mut guard = match listener.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => {
                    // re-entrant emit from inside this listener
                    report.skipped += 1;
                    log(
                        logger.as_ref(),
                        LogLevel::Debug,
                        TARGET_BUS,
                        "listener_skipped_reentrant",
                        [
                            json_kv("subscription", id),
                            json_kv("action", event.action.as_str()),
                        ],
                    );
                    continue;
                }
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| guard.on_lifecycle(&event)));
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(payload) => Some(panic_message(&*payload)),
            };

            match failure {
                None => report.delivered += 1,
                Some(reason) => {
                    report.failed += 1;
                    if let Some(metrics) = metrics.as_ref() {
                        lock(metrics).record_listener_failure();
                    }
                    log(
                        logger.as_ref(),
                        LogLevel::Warn,
                        TARGET_BUS,
                        "listener_failed",
                        [
                            json_kv("subscription", id),
                            json_kv("listener", guard.name()),
                            json_kv("action", event.action.as_str()),
                            json_kv("toast_id", event.toast.id.0),
                            json_kv("reason", json!(reason)),
                        ],
                    );
                }
            }
        }
        report
    }
}

/// Handle returned by [`LifecycleBus::subscribe`]. Dropping it keeps the
/// subscription alive; call [`Subscription::unsubscribe`] to detach.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns `false` when the bus is gone or the listener was already removed.
    pub fn unsubscribe(self) -> bool {
        let Some(bus) = self.bus.upgrade() else {
            return false;
        };
        let mut inner = lock(&bus);
        let before = inner.listeners.len();
        inner.listeners.retain(|(id, _)| *id != self.id);
        inner.listeners.len() != before
    }
}

impl std::fmt::Debug for BusInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusInner")
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
