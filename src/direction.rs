use serde::{Deserialize, Serialize};

/// Reading order of a chapter. Decides which end of the progress track holds
/// the first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl ReadingDirection {
    pub fn option_for_direction<T>(self, ltr_option: T, rtl_option: T) -> T {
        match self {
            ReadingDirection::LeftToRight => ltr_option,
            ReadingDirection::RightToLeft => rtl_option,
        }
    }

    pub fn toggled(self) -> Self {
        self.option_for_direction(
            ReadingDirection::RightToLeft,
            ReadingDirection::LeftToRight,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBarPosition {
    #[default]
    Bottom,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionInfo {
    pub is_bottom: bool,
    pub is_left: bool,
    pub is_right: bool,
    pub is_horizontal: bool,
    pub is_vertical: bool,
}

impl ProgressBarPosition {
    pub fn info(self) -> PositionInfo {
        let is_bottom = self == ProgressBarPosition::Bottom;
        let is_left = self == ProgressBarPosition::Left;
        let is_right = self == ProgressBarPosition::Right;

        PositionInfo {
            is_bottom,
            is_left,
            is_right,
            is_horizontal: is_bottom,
            is_vertical: is_left || is_right,
        }
    }

    /// Next position in the Bottom -> Left -> Right cycle.
    pub fn cycle(self) -> Self {
        match self {
            ProgressBarPosition::Bottom => ProgressBarPosition::Left,
            ProgressBarPosition::Left => ProgressBarPosition::Right,
            ProgressBarPosition::Right => ProgressBarPosition::Bottom,
        }
    }
}
