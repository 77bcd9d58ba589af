mod core;
mod position;

pub use self::core::{
    DEFAULT_MAX_ON_SCREEN, DEFAULT_TIMEOUT, GlobalConfig, GlobalPatch, ToastConfig, ToastDefaults,
    ToastDefaultsPatch, ToastPatch, ToastType, merge_defaults, merge_global, merge_toast,
};
pub use position::{DockPosition, Position};
