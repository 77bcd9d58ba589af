//! Public facade composing config, registry, bus and timers.
//!
//! All mutation happens on the caller's thread. The host drives time with
//! [`Notifier::advance`] (or [`Notifier::pump`]) and reports view-side
//! interactions through the `on_*` methods.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::bus::{
    LifecycleAction, LifecycleBus, LifecycleEvent, LifecycleListener, ListenerResult,
    Subscription, lock,
};
use crate::config::{
    GlobalConfig, GlobalPatch, ToastConfig, ToastDefaultsPatch, ToastPatch, ToastType,
    merge_defaults, merge_global,
};
use crate::error::Result;
use crate::logging::{LogLevel, Logger, TARGET_METRICS, TARGET_NOTIFIER, emit, json_kv};
use crate::metrics::{DockMetrics, MetricSnapshot};
use crate::registry::{RetireReason, Toast, ToastId, ToastRegistry};
use crate::timer::{CountdownState, DEFAULT_TICK_INTERVAL, TimerEngine, TimerSignal};

pub mod driver;

pub use driver::DockEvent;

/// Engine knobs that are not part of the toast config.
#[derive(Clone)]
pub struct EngineConfig {
    /// Interval between countdown ticks.
    pub tick_interval: Duration,
    /// Optional structured logger used by every component.
    pub logger: Option<Logger>,
    /// Counters shared with the host. `None` disables collection.
    pub metrics: Option<Arc<Mutex<DockMetrics>>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            logger: None,
            metrics: None,
        }
    }
}

impl EngineConfig {
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(DockMetrics::new())));
        }
    }

    pub fn disable_metrics(&mut self) {
        self.metrics = None;
    }

    pub fn metrics_handle(&self) -> Option<Arc<Mutex<DockMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Single-slot hover callback, independent of the bus.
pub type HoverHook = Box<dyn FnMut(&Toast) + Send>;

pub struct Notifier {
    global: GlobalConfig,
    registry: ToastRegistry,
    timers: TimerEngine,
    bus: LifecycleBus,
    config: EngineConfig,
    hover_hook: Option<HoverHook>,
    started_at: Instant,
    last_pump: Option<Instant>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let bus = LifecycleBus::new();
        bus.set_logger(config.logger.clone());
        bus.set_metrics(config.metrics_handle());
        let mut registry = ToastRegistry::new(bus.clone());
        registry.set_logger(config.logger.clone());
        let mut timers = TimerEngine::new(config.tick_interval);
        timers.set_logger(config.logger.clone());

        Self {
            global: GlobalConfig::default(),
            registry,
            timers,
            bus,
            config,
            hover_hook: None,
            started_at: Instant::now(),
            last_pump: None,
        }
    }

    pub fn global_config(&self) -> &GlobalConfig {
        &self.global
    }

    /// Update the process-wide defaults. Only later `create` calls see the
    /// change. Both patches are validated before either is applied.
    pub fn set_config(
        &mut self,
        global: Option<&GlobalPatch>,
        defaults: Option<&ToastDefaultsPatch>,
    ) -> Result<()> {
        let mut next = match global {
            Some(patch) => merge_global(&self.global, patch)?,
            None => self.global.clone(),
        };
        if let Some(patch) = defaults {
            next.defaults = merge_defaults(&next.defaults, patch);
        }
        self.global = next;
        self.log(
            LogLevel::Info,
            "config_updated",
            [
                json_kv("new_on_top", self.global.new_on_top),
                json_kv("position", self.global.position.to_string()),
                json_kv("max_on_screen", self.global.max_on_screen),
                json_kv("timeout_ms", self.global.timeout.as_millis() as u64),
            ],
        );
        Ok(())
    }

    pub fn success(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        patch: &ToastPatch,
    ) -> Result<Toast> {
        self.create(ToastType::Success, title, body, patch)
    }

    pub fn info(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        patch: &ToastPatch,
    ) -> Result<Toast> {
        self.create(ToastType::Info, title, body, patch)
    }

    pub fn warning(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        patch: &ToastPatch,
    ) -> Result<Toast> {
        self.create(ToastType::Warning, title, body, patch)
    }

    pub fn error(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        patch: &ToastPatch,
    ) -> Result<Toast> {
        self.create(ToastType::Error, title, body, patch)
    }

    pub fn bare(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        patch: &ToastPatch,
    ) -> Result<Toast> {
        self.create(ToastType::Bare, title, body, patch)
    }

    /// Pinned-open toast; retype it with [`Notifier::set_type`] once the
    /// pending work settles.
    pub fn async_toast(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        patch: &ToastPatch,
    ) -> Result<Toast> {
        self.create(ToastType::Async, title, body, patch)
    }

    pub fn create(
        &mut self,
        kind: ToastType,
        title: impl Into<String>,
        body: impl Into<String>,
        patch: &ToastPatch,
    ) -> Result<Toast> {
        let toast = self
            .registry
            .create(&self.global, kind, title, body, patch)?;
        self.sync_retired();
        let counts_down = self.timers.arm(toast.id, toast.config.timeout);
        self.record(DockMetrics::record_created);
        self.log(
            LogLevel::Debug,
            "toast_queued",
            [
                json_kv("id", toast.id.0),
                json_kv("type", kind.as_str()),
                json_kv("counts_down", counts_down),
            ],
        );
        Ok(toast)
    }

    pub fn remove(&mut self, id: ToastId) -> Result<()> {
        self.remove_with(id, |_| {})
    }

    /// Like [`Notifier::remove`], running `on_removed` synchronously once the
    /// toast enters Removing.
    pub fn remove_with<F>(&mut self, id: ToastId, on_removed: F) -> Result<()>
    where
        F: FnOnce(&Toast),
    {
        let result = self.registry.remove(id, on_removed);
        self.sync_retired();
        if let Err(err) = &result {
            self.log(
                LogLevel::Debug,
                "remove_ignored",
                [json_kv("id", id.0), json_kv("reason", err.to_string())],
            );
        }
        result
    }

    pub fn clear(&mut self) -> usize {
        let cleared = self.registry.clear();
        self.sync_retired();
        self.log(LogLevel::Info, "dock_cleared", [json_kv("count", cleared)]);
        cleared
    }

    pub fn set_type(
        &mut self,
        id: ToastId,
        kind: ToastType,
        close_on_click: Option<bool>,
    ) -> Result<()> {
        self.registry.set_type(id, kind, close_on_click)
    }

    pub fn get(&self, id: ToastId) -> Result<&Toast> {
        self.registry.get(id)
    }

    pub fn get_config(&self, id: ToastId) -> Result<&ToastConfig> {
        self.registry.get_config(id)
    }

    /// Active toasts in display order.
    pub fn toasts(&self) -> Vec<&Toast> {
        self.registry.toasts()
    }

    /// Every toast the view still renders, exit transitions included.
    pub fn sequence(&self) -> Vec<ToastId> {
        self.registry.sequence()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn progress(&self, id: ToastId) -> Result<f64> {
        self.registry.get(id).map(|toast| toast.progress)
    }

    pub fn timer_state(&self, id: ToastId) -> Option<CountdownState> {
        self.timers.state(id)
    }

    /// Virtual time driven through [`Notifier::advance`].
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn bus(&self) -> &LifecycleBus {
        &self.bus
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&LifecycleEvent) -> ListenerResult + Send + 'static,
    {
        self.bus.subscribe(listener)
    }

    pub fn subscribe_listener<L>(&self, listener: L) -> Subscription
    where
        L: LifecycleListener + 'static,
    {
        self.bus.subscribe_listener(listener)
    }

    /// Install the hover callback, replacing any previous one.
    pub fn set_hover_hook<F>(&mut self, hook: F)
    where
        F: FnMut(&Toast) + Send + 'static,
    {
        self.hover_hook = Some(Box::new(hook));
    }

    pub fn clear_hover_hook(&mut self) {
        self.hover_hook = None;
    }

    /// The view attached the toast: Created -> Visible, countdown starts.
    pub fn on_shown(&mut self, id: ToastId) -> Result<()> {
        if self.registry.mark_visible(id)? {
            self.timers.start(id);
        }
        Ok(())
    }

    pub fn on_hover_enter(&mut self, id: ToastId) -> Result<()> {
        let toast = self.registry.get(id)?;
        if !toast.state.is_active() {
            return Ok(());
        }
        let pause = toast.config.pause_on_hover;
        let snapshot = toast.clone();

        self.registry.notify(id, LifecycleAction::OnHoverEnter)?;
        if let Some(hook) = self.hover_hook.as_mut() {
            hook(&snapshot);
        }
        if pause && self.registry.mark_paused(id)? {
            self.timers.pause(id);
        }
        Ok(())
    }

    pub fn on_hover_leave(&mut self, id: ToastId) -> Result<()> {
        let toast = self.registry.get(id)?;
        if !toast.state.is_active() {
            return Ok(());
        }
        if toast.config.pause_on_hover && self.registry.mark_resumed(id)? {
            self.timers.resume(id);
        }
        self.registry.notify(id, LifecycleAction::OnHoverLeave)
    }

    pub fn on_clicked(&mut self, id: ToastId) -> Result<()> {
        let toast = self.registry.get(id)?;
        if !toast.state.is_active() {
            return Ok(());
        }
        let close = toast.config.close_on_click;
        self.registry.notify(id, LifecycleAction::OnClick)?;
        if close {
            self.remove(id)?;
        }
        Ok(())
    }

    /// The view finished the exit transition: Removing -> Destroyed.
    pub fn on_destroyed(&mut self, id: ToastId) -> Result<()> {
        let result = self.registry.finalize(id);
        self.sync_retired();
        result
    }

    /// Move virtual time forward, applying progress and expiring toasts.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerSignal> {
        let stale_before = self.timers.stale_ticks();
        let signals = self.timers.advance(elapsed);

        let mut fired = 0;
        for signal in &signals {
            match *signal {
                TimerSignal::Progressed { id, progress } => {
                    fired += 1;
                    self.registry.set_progress(id, progress);
                }
                TimerSignal::Expired { id } => {
                    self.record(DockMetrics::record_expired);
                    self.log(LogLevel::Debug, "toast_expired", [json_kv("id", id.0)]);
                    let _ = self.remove(id);
                }
            }
        }

        let stale = self.timers.stale_ticks() - stale_before;
        self.record(|metrics| metrics.record_ticks(fired, stale));
        signals
    }

    /// Advance by the wall-clock time elapsed since the previous pump. The
    /// first call only sets the baseline.
    pub fn pump(&mut self, now: Instant) -> Vec<TimerSignal> {
        let elapsed = self
            .last_pump
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_pump = Some(now);
        self.advance(elapsed)
    }

    pub fn dispatch(&mut self, event: DockEvent) -> Result<()> {
        self.log(
            LogLevel::Trace,
            "event_dispatched",
            [
                json_kv("event", event.describe()),
                json_kv("id", event.toast_id().map(|id| id.0)),
            ],
        );
        match event {
            DockEvent::Tick { elapsed } => {
                self.advance(elapsed);
                Ok(())
            }
            DockEvent::Shown(id) => self.on_shown(id),
            DockEvent::HoverEnter(id) => self.on_hover_enter(id),
            DockEvent::HoverLeave(id) => self.on_hover_leave(id),
            DockEvent::Clicked(id) => self.on_clicked(id),
            DockEvent::Destroyed(id) => self.on_destroyed(id),
        }
    }

    /// Replay host events in order. Events for unknown toasts are skipped.
    pub fn run_scripted<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = DockEvent>,
    {
        for event in events {
            match self.dispatch(event) {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    self.log(
                        LogLevel::Debug,
                        "event_ignored",
                        [
                            json_kv("event", event.describe()),
                            json_kv("reason", err.to_string()),
                        ],
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn metrics_snapshot(&self) -> Option<MetricSnapshot> {
        let uptime = self.started_at.elapsed();
        self.config
            .metrics
            .as_ref()
            .map(|metrics| lock(metrics).snapshot(uptime))
    }

    /// Write a metrics snapshot through the configured logger.
    pub fn emit_metrics(&self) {
        let snapshot = self.metrics_snapshot();
        if let (Some(logger), Some(snapshot)) = (self.config.logger.as_ref(), snapshot) {
            let _ = logger.log_event(snapshot.to_log_event(TARGET_METRICS));
        }
    }

    fn sync_retired(&mut self) {
        for (id, reason) in self.registry.take_retired() {
            self.timers.cancel(id);
            match reason {
                RetireReason::Evicted => self.record(DockMetrics::record_evicted),
                RetireReason::Removed => self.record(DockMetrics::record_removed),
                RetireReason::Destroyed => self.record(DockMetrics::record_destroyed),
            }
        }
    }

    fn record<F>(&self, update: F)
    where
        F: FnOnce(&mut DockMetrics),
    {
        if let Some(metrics) = self.config.metrics.as_ref() {
            let mut guard = lock(metrics);
            update(&mut *guard);
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        emit(
            self.config.logger.as_ref(),
            level,
            TARGET_NOTIFIER,
            message,
            fields,
        );
    }
}
