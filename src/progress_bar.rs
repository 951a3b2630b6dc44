//! Mapping between positions on the progress track and page entries.

use crate::direction::ReadingDirection;
use crate::error::PagerError;
use crate::types::{CurrentPage, PageEntry, PageSequence, get_next_index_from_page};
use std::str::FromStr;

/// Screen rectangle of the progress track.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl TrackRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn contains(&self, pointer: PointerPosition) -> bool {
        pointer.x >= self.left
            && pointer.x < self.left + self.width
            && pointer.y >= self.top
            && pointer.y < self.top + self.height
    }
}

impl From<ratatui::layout::Rect> for TrackRect {
    fn from(area: ratatui::layout::Rect) -> Self {
        Self::new(
            f64::from(area.x),
            f64::from(area.y),
            f64::from(area.width),
            f64::from(area.height),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Position of a terminal cell.
    pub fn from_cell(column: u16, row: u16) -> Self {
        Self::new(f64::from(column), f64::from(row))
    }
}

/// Resolves the entry under `pointer` on a track laid out over `track`.
///
/// The track is split into `pages.len()` equal slices; a pointer exactly on a
/// slice boundary belongs to the lower slice. Positions before or past the
/// track clamp to its ends.
pub fn resolve_page_for_pointer<'a>(
    pointer: PointerPosition,
    track: &TrackRect,
    pages: &'a PageSequence,
    is_horizontal: bool,
    direction: ReadingDirection,
) -> &'a PageEntry {
    &pages[resolve_index_for_pointer(pointer, track, pages.len(), is_horizontal, direction)]
}

/// Sequence index of the slice under `pointer` on a track split into
/// `page_count` slices. `page_count` must not be zero.
pub fn resolve_index_for_pointer(
    pointer: PointerPosition,
    track: &TrackRect,
    page_count: usize,
    is_horizontal: bool,
    direction: ReadingDirection,
) -> usize {
    debug_assert!(page_count > 0);

    let (pos, rect_pos, rect_size) = if is_horizontal {
        (pointer.x, track.left, track.width)
    } else {
        (pointer.y, track.top, track.height)
    };

    let offset = pos - rect_pos;

    let ordinal = if rect_size > 0.0 {
        ((offset * page_count as f64) / rect_size).ceil()
    } else {
        1.0
    };
    // NaN ends up at 1 through the max
    let ordinal = ordinal.max(1.0).min(page_count as f64) as usize;

    direction.option_for_direction(ordinal - 1, page_count - ordinal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOffset {
    Previous,
    Next,
}

impl FromStr for PageOffset {
    type Err = PagerError;

    fn from_str(offset: &str) -> Result<Self, Self::Err> {
        match offset {
            "previous" => Ok(PageOffset::Previous),
            "next" => Ok(PageOffset::Next),
            other => Err(PagerError::InvalidOffset(other.to_string())),
        }
    }
}

/// Navigable index of the entry next to `pages_index`, clamped at both ends
/// of the sequence.
pub fn get_next_page_index(offset: PageOffset, pages_index: usize, pages: &PageSequence) -> usize {
    let target = match offset {
        PageOffset::Previous => pages_index.saturating_sub(1),
        PageOffset::Next => pages_index.saturating_add(1).min(pages.len() - 1),
    };
    get_next_index_from_page(&pages[target])
}

/// String keyed variant of [`get_next_page_index`] for callers that receive
/// the offset as text, e.g. from a keymap.
pub fn get_next_page_index_for(
    offset: &str,
    pages_index: usize,
    pages: &PageSequence,
) -> Result<usize, PagerError> {
    let offset = offset.parse::<PageOffset>()?;
    Ok(get_next_page_index(offset, pages_index, pages))
}

/// Share of the chapter read once `current` is visible, in `0.0..=1.0`.
pub fn progress_fraction(current: &CurrentPage, pages: &PageSequence) -> f64 {
    (current.pages_index + 1) as f64 / pages.len() as f64
}
