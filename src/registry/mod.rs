mod core;

pub use self::core::{RetireReason, Toast, ToastId, ToastRegistry, ToastState};
