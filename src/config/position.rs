use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToastError};

/// Screen edge a dock is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Top,
    Bottom,
    Left,
    Right,
}

impl Position {
    /// Map a numeric selector (as used by form controls) onto an edge.
    ///
    /// `0..=3` map to Top, Bottom, Right, Left. Anything else is rejected.
    pub fn from_selector(selector: i64) -> Result<Self> {
        match selector {
            0 => Ok(Position::Top),
            1 => Ok(Position::Bottom),
            2 => Ok(Position::Right),
            3 => Ok(Position::Left),
            other => Err(ToastError::InvalidConfig(format!(
                "position selector {other} is outside 0..=3"
            ))),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Position::Left | Position::Right)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Top => "top",
            Position::Bottom => "bottom",
            Position::Left => "left",
            Position::Right => "right",
        }
    }
}

/// Where the dock sits: at most one horizontal and one vertical edge, and at
/// least one of the two. A single edge is the legacy centred form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Position>", into = "Vec<Position>")]
pub struct DockPosition {
    horizontal: Option<Position>,
    vertical: Option<Position>,
}

impl DockPosition {
    pub fn new(positions: &[Position]) -> Result<Self> {
        if positions.is_empty() {
            return Err(ToastError::InvalidConfig(
                "position must name at least one edge".to_string(),
            ));
        }

        let mut horizontal = None;
        let mut vertical = None;
        for &position in positions {
            let slot = if position.is_horizontal() {
                &mut horizontal
            } else {
                &mut vertical
            };
            if let Some(existing) = slot.replace(position) {
                return Err(ToastError::InvalidConfig(format!(
                    "position names two edges on one axis: {} and {}",
                    existing.as_str(),
                    position.as_str()
                )));
            }
        }

        Ok(Self {
            horizontal,
            vertical,
        })
    }

    pub fn corner(horizontal: Position, vertical: Position) -> Result<Self> {
        Self::new(&[horizontal, vertical])
    }

    pub fn horizontal(&self) -> Option<Position> {
        self.horizontal
    }

    pub fn vertical(&self) -> Option<Position> {
        self.vertical
    }

    /// Edges in horizontal-then-vertical order.
    pub fn positions(&self) -> Vec<Position> {
        self.horizontal.into_iter().chain(self.vertical).collect()
    }
}

impl Default for DockPosition {
    fn default() -> Self {
        Self {
            horizontal: Some(Position::Right),
            vertical: Some(Position::Bottom),
        }
    }
}

impl TryFrom<Vec<Position>> for DockPosition {
    type Error = ToastError;

    fn try_from(value: Vec<Position>) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<DockPosition> for Vec<Position> {
    fn from(value: DockPosition) -> Self {
        value.positions()
    }
}

impl fmt::Display for DockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.positions().into_iter().map(Position::as_str).collect();
        write!(f, "{}", labels.join("-"))
    }
}
