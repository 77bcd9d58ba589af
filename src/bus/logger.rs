use serde_json::json;

use super::{LifecycleAction, LifecycleEvent, LifecycleListener, ListenerResult};
use crate::logging::{LogLevel, Logger, TARGET_LIFECYCLE, event_with_fields, json_kv};

/// Writes lifecycle transitions to a [`Logger`].
pub struct LifecycleLogger {
    logger: Logger,
    level: LogLevel,
    log_hover: bool,
    log_clicks: bool,
    log_type_changes: bool,
}

impl LifecycleLogger {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            log_hover: false,
            log_clicks: true,
            log_type_changes: true,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn log_hover(mut self, enabled: bool) -> Self {
        self.log_hover = enabled;
        self
    }

    pub fn log_clicks(mut self, enabled: bool) -> Self {
        self.log_clicks = enabled;
        self
    }

    pub fn log_type_changes(mut self, enabled: bool) -> Self {
        self.log_type_changes = enabled;
        self
    }

    fn wants(&self, action: LifecycleAction) -> bool {
        match action {
            LifecycleAction::OnHoverEnter | LifecycleAction::OnHoverLeave => self.log_hover,
            LifecycleAction::OnClick => self.log_clicks,
            LifecycleAction::TypeChanged => self.log_type_changes,
            LifecycleAction::OnInit
            | LifecycleAction::BeforeDestroy
            | LifecycleAction::AfterDestroy => true,
        }
    }
}

impl LifecycleListener for LifecycleLogger {
    fn name(&self) -> &str {
        "diagnostics.lifecycle_logger"
    }

    fn on_lifecycle(&mut self, event: &LifecycleEvent) -> ListenerResult {
        if !self.wants(event.action) {
            return Ok(());
        }
        let toast = &event.toast;
        let record = event_with_fields(
            self.level,
            TARGET_LIFECYCLE,
            event.action.as_str(),
            [
                json_kv("id", toast.id.0),
                json_kv("type", toast.config.kind.as_str()),
                json_kv("state", json!(toast.state)),
                json_kv("progress", toast.progress),
            ],
        );
        // sink failures are not the toast's problem
        let _ = self.logger.log_event(record);
        Ok(())
    }
}
