use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::position::{DockPosition, Position};
use crate::error::{Result, ToastError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);
pub const DEFAULT_MAX_ON_SCREEN: usize = 8;

/// Visual flavour of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastType {
    Success,
    Info,
    Warning,
    Error,
    /// Pinned open until retyped.
    Async,
    #[default]
    Bare,
}

impl ToastType {
    pub fn as_str(self) -> &'static str {
        match self {
            ToastType::Success => "success",
            ToastType::Info => "info",
            ToastType::Warning => "warning",
            ToastType::Error => "error",
            ToastType::Async => "async",
            ToastType::Bare => "bare",
        }
    }
}

/// Fallback values for the per-toast behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastDefaults {
    pub show_progress_bar: bool,
    pub close_on_click: bool,
    pub pause_on_hover: bool,
}

impl Default for ToastDefaults {
    fn default() -> Self {
        Self {
            show_progress_bar: true,
            close_on_click: true,
            pause_on_hover: true,
        }
    }
}

/// Process-wide defaults snapshotted by every `create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalConfig {
    pub new_on_top: bool,
    pub position: DockPosition,
    pub max_on_screen: usize,
    #[serde(with = "millis")]
    pub timeout: Duration,
    pub defaults: ToastDefaults,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            new_on_top: true,
            position: DockPosition::default(),
            max_on_screen: DEFAULT_MAX_ON_SCREEN,
            timeout: DEFAULT_TIMEOUT,
            defaults: ToastDefaults::default(),
        }
    }
}

/// Effective, fully resolved configuration of a single toast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastConfig {
    #[serde(rename = "type")]
    pub kind: ToastType,
    pub title: String,
    pub body: String,
    #[serde(with = "millis")]
    pub timeout: Duration,
    pub position: DockPosition,
    pub max_on_screen: usize,
    pub new_on_top: bool,
    pub show_progress_bar: bool,
    pub close_on_click: bool,
    pub pause_on_hover: bool,
}

impl ToastConfig {
    /// Config derived purely from the global snapshot.
    pub fn from_global(global: &GlobalConfig) -> Self {
        let mut config = Self {
            kind: ToastType::default(),
            title: String::new(),
            body: String::new(),
            timeout: global.timeout,
            position: global.position,
            max_on_screen: global.max_on_screen,
            new_on_top: global.new_on_top,
            show_progress_bar: global.defaults.show_progress_bar,
            close_on_click: global.defaults.close_on_click,
            pause_on_hover: global.defaults.pause_on_hover,
        };
        config.normalize();
        config
    }

    /// Whether the toast counts down at all.
    pub fn auto_dismisses(&self) -> bool {
        !self.timeout.is_zero()
    }

    fn normalize(&mut self) {
        if self.kind == ToastType::Async {
            self.timeout = Duration::ZERO;
            self.close_on_click = false;
        }
        // no countdown, nothing to draw
        if self.timeout.is_zero() {
            self.show_progress_bar = false;
        }
    }
}

/// Partial update for [`GlobalConfig`]. Timeouts are signed milliseconds so
/// negative input can be rejected instead of wrapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct GlobalPatch {
    pub new_on_top: Option<bool>,
    pub position: Option<Vec<Position>>,
    pub max_on_screen: Option<usize>,
    pub timeout: Option<i64>,
}

impl GlobalPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn with_new_on_top(mut self, new_on_top: bool) -> Self {
        self.new_on_top = Some(new_on_top);
        self
    }

    pub fn with_position(mut self, position: &[Position]) -> Self {
        self.position = Some(position.to_vec());
        self
    }

    pub fn with_max_on_screen(mut self, max: usize) -> Self {
        self.max_on_screen = Some(max);
        self
    }

    pub fn with_timeout_ms(mut self, timeout: i64) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ToastDefaultsPatch {
    pub show_progress_bar: Option<bool>,
    pub close_on_click: Option<bool>,
    pub pause_on_hover: Option<bool>,
}

impl ToastDefaultsPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn with_show_progress_bar(mut self, enabled: bool) -> Self {
        self.show_progress_bar = Some(enabled);
        self
    }

    pub fn with_close_on_click(mut self, enabled: bool) -> Self {
        self.close_on_click = Some(enabled);
        self
    }

    pub fn with_pause_on_hover(mut self, enabled: bool) -> Self {
        self.pause_on_hover = Some(enabled);
        self
    }
}

/// Call-site override for a single toast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct ToastPatch {
    #[serde(rename = "type")]
    pub kind: Option<ToastType>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub timeout: Option<i64>,
    pub position: Option<Vec<Position>>,
    pub max_on_screen: Option<usize>,
    pub new_on_top: Option<bool>,
    pub show_progress_bar: Option<bool>,
    pub close_on_click: Option<bool>,
    pub pause_on_hover: Option<bool>,
}

impl ToastPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn with_timeout_ms(mut self, timeout: i64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_position(mut self, position: &[Position]) -> Self {
        self.position = Some(position.to_vec());
        self
    }

    pub fn with_max_on_screen(mut self, max: usize) -> Self {
        self.max_on_screen = Some(max);
        self
    }

    pub fn with_new_on_top(mut self, new_on_top: bool) -> Self {
        self.new_on_top = Some(new_on_top);
        self
    }

    pub fn with_show_progress_bar(mut self, enabled: bool) -> Self {
        self.show_progress_bar = Some(enabled);
        self
    }

    pub fn with_close_on_click(mut self, enabled: bool) -> Self {
        self.close_on_click = Some(enabled);
        self
    }

    pub fn with_pause_on_hover(mut self, enabled: bool) -> Self {
        self.pause_on_hover = Some(enabled);
        self
    }
}

pub fn merge_global(current: &GlobalConfig, patch: &GlobalPatch) -> Result<GlobalConfig> {
    Ok(GlobalConfig {
        new_on_top: patch.new_on_top.unwrap_or(current.new_on_top),
        position: resolve_position(patch.position.as_deref(), current.position)?,
        max_on_screen: resolve_max(patch.max_on_screen, current.max_on_screen)?,
        timeout: resolve_timeout(patch.timeout, current.timeout)?,
        defaults: current.defaults,
    })
}

pub fn merge_defaults(current: &ToastDefaults, patch: &ToastDefaultsPatch) -> ToastDefaults {
    ToastDefaults {
        show_progress_bar: patch.show_progress_bar.unwrap_or(current.show_progress_bar),
        close_on_click: patch.close_on_click.unwrap_or(current.close_on_click),
        pause_on_hover: patch.pause_on_hover.unwrap_or(current.pause_on_hover),
    }
}

pub fn merge_toast(global: &GlobalConfig, patch: &ToastPatch) -> Result<ToastConfig> {
    let defaults = &global.defaults;
    let mut config = ToastConfig {
        kind: patch.kind.unwrap_or_default(),
        title: patch.title.clone().unwrap_or_default(),
        body: patch.body.clone().unwrap_or_default(),
        timeout: resolve_timeout(patch.timeout, global.timeout)?,
        position: resolve_position(patch.position.as_deref(), global.position)?,
        max_on_screen: resolve_max(patch.max_on_screen, global.max_on_screen)?,
        new_on_top: patch.new_on_top.unwrap_or(global.new_on_top),
        show_progress_bar: patch
            .show_progress_bar
            .unwrap_or(defaults.show_progress_bar),
        close_on_click: patch.close_on_click.unwrap_or(defaults.close_on_click),
        pause_on_hover: patch.pause_on_hover.unwrap_or(defaults.pause_on_hover),
    };
    config.normalize();
    Ok(config)
}

fn resolve_timeout(patch: Option<i64>, current: Duration) -> Result<Duration> {
    match patch {
        None => Ok(current),
        Some(ms) if ms < 0 => Err(ToastError::InvalidConfig(format!(
            "timeout must be >= 0, got {ms}ms"
        ))),
        Some(ms) => Ok(Duration::from_millis(ms as u64)),
    }
}

fn resolve_position(patch: Option<&[Position]>, current: DockPosition) -> Result<DockPosition> {
    match patch {
        None => Ok(current),
        Some(edges) => DockPosition::new(edges),
    }
}

fn resolve_max(patch: Option<usize>, current: usize) -> Result<usize> {
    match patch {
        Some(0) => Err(ToastError::InvalidConfig(
            "maxOnScreen must be at least 1".to_string(),
        )),
        Some(max) => Ok(max),
        None => Ok(current),
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_with_timeout(ms: u64) -> GlobalConfig {
        GlobalConfig {
            timeout: Duration::from_millis(ms),
            ..GlobalConfig::default()
        }
    }

    #[test]
    fn merge_global_keeps_unspecified_fields() {
        let current = GlobalConfig::default();
        let patch = GlobalPatch::new().with_max_on_screen(3);
        let merged = merge_global(&current, &patch).unwrap();
        assert_eq!(merged.max_on_screen, 3);
        assert_eq!(merged.timeout, current.timeout);
        assert_eq!(merged.position, current.position);
        assert_eq!(merged.new_on_top, current.new_on_top);
    }

    #[test]
    fn merge_global_rejects_negative_timeout() {
        let err = merge_global(&GlobalConfig::default(), &GlobalPatch::new().with_timeout_ms(-1))
            .unwrap_err();
        assert!(matches!(err, ToastError::InvalidConfig(_)));
    }

    #[test]
    fn merge_global_rejects_empty_position() {
        let patch = GlobalPatch::new().with_position(&[]);
        assert!(merge_global(&GlobalConfig::default(), &patch).is_err());
    }

    #[test]
    fn merge_global_rejects_zero_capacity() {
        let patch = GlobalPatch::new().with_max_on_screen(0);
        assert!(merge_global(&GlobalConfig::default(), &patch).is_err());
    }

    #[test]
    fn empty_toast_patch_matches_global_derivation() {
        let global = global_with_timeout(30_000);
        let merged = merge_toast(&global, &ToastPatch::default()).unwrap();
        assert_eq!(merged, ToastConfig::from_global(&global));
        assert_eq!(merged.kind, ToastType::Bare);
        assert!(merged.title.is_empty());
        assert!(merged.body.is_empty());
    }

    #[test]
    fn local_timeout_overrides_global() {
        let global = global_with_timeout(30_000);
        let patch = ToastPatch {
            kind: Some(ToastType::Success),
            ..ToastPatch::new().with_timeout_ms(3000)
        };
        let merged = merge_toast(&global, &patch).unwrap();
        assert_eq!(merged.timeout, Duration::from_millis(3000));

        let bare = merge_toast(&global, &ToastPatch::default()).unwrap();
        assert_eq!(bare.timeout, Duration::from_millis(30_000));
    }

    #[test]
    fn zero_timeout_hides_progress_bar() {
        let patch = ToastPatch::new()
            .with_timeout_ms(0)
            .with_show_progress_bar(true);
        let merged = merge_toast(&GlobalConfig::default(), &patch).unwrap();
        assert!(!merged.show_progress_bar);
        assert!(!merged.auto_dismisses());
    }

    #[test]
    fn async_toast_is_pinned_open() {
        let patch = ToastPatch {
            kind: Some(ToastType::Async),
            ..ToastPatch::new().with_timeout_ms(5000).with_close_on_click(true)
        };
        let merged = merge_toast(&GlobalConfig::default(), &patch).unwrap();
        assert_eq!(merged.timeout, Duration::ZERO);
        assert!(!merged.close_on_click);
    }

    #[test]
    fn defaults_feed_toast_flags() {
        let mut global = GlobalConfig::default();
        global.defaults = merge_defaults(
            &global.defaults,
            &ToastDefaultsPatch::new().with_pause_on_hover(false),
        );
        let merged = merge_toast(&global, &ToastPatch::default()).unwrap();
        assert!(!merged.pause_on_hover);
        assert!(merged.close_on_click);
    }

    #[test]
    fn patches_parse_from_camel_case_json() {
        let patch =
            ToastPatch::from_json(r#"{"timeout": 3000, "showProgressBar": false, "type": "error"}"#)
                .unwrap();
        assert_eq!(patch.timeout, Some(3000));
        assert_eq!(patch.show_progress_bar, Some(false));
        assert_eq!(patch.kind, Some(ToastType::Error));

        let global =
            GlobalPatch::from_json(r#"{"newOnTop": false, "position": ["right", "top"]}"#).unwrap();
        assert_eq!(global.new_on_top, Some(false));
        assert_eq!(global.position, Some(vec![Position::Right, Position::Top]));

        assert!(GlobalPatch::from_json(r#"{"dockMax": 3}"#).is_err());
    }

    #[test]
    fn global_config_round_trips_timeout_as_millis() {
        let json = serde_json::to_value(GlobalConfig::default()).unwrap();
        assert_eq!(json["timeout"], serde_json::json!(2000));
        assert_eq!(json["position"], serde_json::json!(["right", "bottom"]));
    }
}
