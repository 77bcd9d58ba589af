use std::time::Duration;

use crate::registry::ToastId;

/// Input reported by the host view layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockEvent {
    /// Wall-clock time passed.
    Tick { elapsed: Duration },
    /// The toast finished its enter transition.
    Shown(ToastId),
    HoverEnter(ToastId),
    HoverLeave(ToastId),
    Clicked(ToastId),
    /// The exit transition finished and the view dropped the toast.
    Destroyed(ToastId),
}

impl DockEvent {
    pub fn tick_ms(ms: u64) -> Self {
        DockEvent::Tick {
            elapsed: Duration::from_millis(ms),
        }
    }

    pub fn toast_id(&self) -> Option<ToastId> {
        match self {
            DockEvent::Tick { .. } => None,
            DockEvent::Shown(id)
            | DockEvent::HoverEnter(id)
            | DockEvent::HoverLeave(id)
            | DockEvent::Clicked(id)
            | DockEvent::Destroyed(id) => Some(*id),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            DockEvent::Tick { .. } => "tick",
            DockEvent::Shown(_) => "shown",
            DockEvent::HoverEnter(_) => "hover_enter",
            DockEvent::HoverLeave(_) => "hover_leave",
            DockEvent::Clicked(_) => "clicked",
            DockEvent::Destroyed(_) => "destroyed",
        }
    }
}
