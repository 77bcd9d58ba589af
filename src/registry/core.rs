use std::collections::{HashMap, VecDeque};
use std::fmt;

use serde::Serialize;

use crate::bus::{LifecycleAction, LifecycleBus, LifecycleEvent};
use crate::config::{GlobalConfig, ToastConfig, ToastPatch, ToastType, merge_toast};
use crate::error::{Result, ToastError};
use crate::logging::{LogLevel, Logger, TARGET_REGISTRY, emit as log, json_kv};

/// Process-unique toast identity. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ToastId(pub u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ToastState {
    Created,
    Visible,
    Paused,
    Removing,
    Destroyed,
}

impl ToastState {
    /// Counts against the dock capacity.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ToastState::Created | ToastState::Visible | ToastState::Paused
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub id: ToastId,
    pub config: ToastConfig,
    /// Elapsed share of the timeout, `0.0..=100.0`.
    pub progress: f64,
    pub state: ToastState,
}

/// Why a toast left the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireReason {
    Evicted,
    Removed,
    Destroyed,
}

/// Owns every live toast plus its display order.
pub struct ToastRegistry {
    entries: HashMap<ToastId, Toast>,
    order: VecDeque<ToastId>,
    next_id: u64,
    retired: Vec<(ToastId, RetireReason)>,
    bus: LifecycleBus,
    logger: Option<Logger>,
}

impl ToastRegistry {
    pub fn new(bus: LifecycleBus) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            next_id: 0,
            retired: Vec::new(),
            bus,
            logger: None,
        }
    }

    pub fn set_logger(&mut self, logger: Option<Logger>) {
        self.logger = logger;
    }

    /// Insert a new toast built from the `global` snapshot and `patch`.
    ///
    /// When the dock is full the oldest active toast (by display order) is
    /// evicted first; its `beforeDestroy`/`afterDestroy` pair is emitted
    /// before this call returns.
    pub fn create(
        &mut self,
        global: &GlobalConfig,
        kind: ToastType,
        title: impl Into<String>,
        body: impl Into<String>,
        patch: &ToastPatch,
    ) -> Result<Toast> {
        let patch = ToastPatch {
            kind: Some(kind),
            title: Some(title.into()),
            body: Some(body.into()),
            ..patch.clone()
        };
        let config = merge_toast(global, &patch)?;

        while self.len() >= config.max_on_screen {
            let Some(oldest) = self.oldest_active() else {
                break;
            };
            self.evict(oldest);
        }

        self.next_id += 1;
        let id = ToastId(self.next_id);
        let toast = Toast {
            id,
            config,
            progress: 0.0,
            state: ToastState::Created,
        };

        if toast.config.new_on_top {
            self.order.push_front(id);
        } else {
            self.order.push_back(id);
        }
        self.entries.insert(id, toast.clone());

        log(
            self.logger.as_ref(),
            LogLevel::Debug,
            TARGET_REGISTRY,
            "toast_created",
            [
                json_kv("id", id.0),
                json_kv("type", toast.config.kind.as_str()),
                json_kv("timeout_ms", toast.config.timeout.as_millis() as u64),
                json_kv("active", self.len()),
            ],
        );
        Ok(toast)
    }

    pub fn get(&self, id: ToastId) -> Result<&Toast> {
        self.entries.get(&id).ok_or(ToastError::NotFound(id))
    }

    pub fn get_config(&self, id: ToastId) -> Result<&ToastConfig> {
        self.get(id).map(|toast| &toast.config)
    }

    /// Start removing `id`. `on_removed` runs synchronously so the host can
    /// start its exit styling; the toast stays in the sequence until
    /// [`ToastRegistry::finalize`]. Removing a toast twice is a no-op.
    pub fn remove<F>(&mut self, id: ToastId, on_removed: F) -> Result<()>
    where
        F: FnOnce(&Toast),
    {
        let toast = self.entries.get_mut(&id).ok_or(ToastError::NotFound(id))?;
        if !toast.state.is_active() {
            return Ok(());
        }
        toast.state = ToastState::Removing;
        let snapshot = toast.clone();

        self.retired.push((id, RetireReason::Removed));
        self.emit(LifecycleAction::BeforeDestroy, &snapshot);
        on_removed(&snapshot);
        log(
            self.logger.as_ref(),
            LogLevel::Debug,
            TARGET_REGISTRY,
            "toast_removing",
            [json_kv("id", id.0)],
        );
        Ok(())
    }

    /// Move every active toast to Removing, in display order.
    pub fn clear(&mut self) -> usize {
        let ids: Vec<ToastId> = self.active_ids();
        for id in &ids {
            let _ = self.remove(*id, |_| {});
        }
        ids.len()
    }

    /// Host acknowledged the exit: the toast becomes Destroyed and leaves the
    /// sequence.
    pub fn finalize(&mut self, id: ToastId) -> Result<()> {
        let state = self.get(id)?.state;
        if state.is_active() {
            self.remove(id, |_| {})?;
        }

        let Some(mut toast) = self.entries.remove(&id) else {
            return Ok(());
        };
        self.order.retain(|entry| *entry != id);
        toast.state = ToastState::Destroyed;
        self.retired.push((id, RetireReason::Destroyed));
        self.emit(LifecycleAction::AfterDestroy, &toast);
        log(
            self.logger.as_ref(),
            LogLevel::Debug,
            TARGET_REGISTRY,
            "toast_destroyed",
            [json_kv("id", id.0), json_kv("active", self.len())],
        );
        Ok(())
    }

    /// Retype a toast (e.g. an async toast once its work settles).
    pub fn set_type(
        &mut self,
        id: ToastId,
        kind: ToastType,
        close_on_click: Option<bool>,
    ) -> Result<()> {
        let toast = self.entries.get_mut(&id).ok_or(ToastError::NotFound(id))?;
        toast.config.kind = kind;
        if let Some(close) = close_on_click {
            toast.config.close_on_click = close;
        }
        let snapshot = toast.clone();
        self.emit(LifecycleAction::TypeChanged, &snapshot);
        Ok(())
    }

    /// Active toasts in display order.
    pub fn toasts(&self) -> Vec<&Toast> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id))
            .filter(|toast| toast.state.is_active())
            .collect()
    }

    /// Every toast still rendered, including ones playing their exit.
    pub fn sequence(&self) -> Vec<ToastId> {
        self.order.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .values()
            .filter(|toast| toast.state.is_active())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn take_retired(&mut self) -> Vec<(ToastId, RetireReason)> {
        std::mem::take(&mut self.retired)
    }

    pub(crate) fn mark_visible(&mut self, id: ToastId) -> Result<bool> {
        self.transition(id, ToastState::Created, ToastState::Visible, Some(LifecycleAction::OnInit))
    }

    pub(crate) fn mark_paused(&mut self, id: ToastId) -> Result<bool> {
        self.transition(id, ToastState::Visible, ToastState::Paused, None)
    }

    pub(crate) fn mark_resumed(&mut self, id: ToastId) -> Result<bool> {
        self.transition(id, ToastState::Paused, ToastState::Visible, None)
    }

    pub(crate) fn set_progress(&mut self, id: ToastId, progress: f64) {
        if let Some(toast) = self.entries.get_mut(&id) {
            toast.progress = progress.clamp(0.0, 100.0);
        }
    }

    /// Broadcast an interaction that does not change state.
    pub(crate) fn notify(&self, id: ToastId, action: LifecycleAction) -> Result<()> {
        let toast = self.get(id)?;
        self.emit(action, toast);
        Ok(())
    }

    fn transition(
        &mut self,
        id: ToastId,
        from: ToastState,
        to: ToastState,
        action: Option<LifecycleAction>,
    ) -> Result<bool> {
        let toast = self.entries.get_mut(&id).ok_or(ToastError::NotFound(id))?;
        if toast.state != from {
            return Ok(false);
        }
        toast.state = to;
        let snapshot = toast.clone();
        if let Some(action) = action {
            self.emit(action, &snapshot);
        }
        Ok(true)
    }

    fn active_ids(&self) -> Vec<ToastId> {
        self.toasts().iter().map(|toast| toast.id).collect()
    }

    // ids are handed out in creation order
    fn oldest_active(&self) -> Option<ToastId> {
        self.active_ids().into_iter().min()
    }

    fn evict(&mut self, id: ToastId) {
        let Some(toast) = self.entries.get_mut(&id) else {
            return;
        };
        toast.state = ToastState::Removing;
        let removing = toast.clone();
        self.emit(LifecycleAction::BeforeDestroy, &removing);

        self.entries.remove(&id);
        self.order.retain(|entry| *entry != id);
        let destroyed = Toast {
            state: ToastState::Destroyed,
            ..removing
        };
        self.retired.push((id, RetireReason::Evicted));
        self.emit(LifecycleAction::AfterDestroy, &destroyed);
        log(
            self.logger.as_ref(),
            LogLevel::Info,
            TARGET_REGISTRY,
            "toast_evicted",
            [json_kv("id", id.0), json_kv("active", self.len())],
        );
    }

    fn emit(&self, action: LifecycleAction, toast: &Toast) {
        self.bus.emit(LifecycleEvent::new(action, toast.clone()));
    }
}
