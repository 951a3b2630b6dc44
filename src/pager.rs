//! Page window selection.
//!
//! Every entry of a chapter gets a slot in the reader, but only the ones close
//! to the current position are allowed to load their images. The rest stay as
//! placeholders until the reader gets near them.

use crate::types::PageSequence;
use log::debug;
use std::collections::BTreeSet;

/// Which way the reader moved since the load set was last computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationBias {
    Forward,
    Backward,
    None,
}

impl NavigationBias {
    fn from_move(current_index: usize, previous_index: Option<usize>) -> Self {
        match previous_index {
            Some(previous) if current_index > previous => NavigationBias::Forward,
            Some(previous) if current_index < previous => NavigationBias::Backward,
            _ => NavigationBias::None,
        }
    }
}

/// Indexes into a [`PageSequence`] that should be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSet {
    indexes: BTreeSet<usize>,
    priority: Vec<usize>,
    bias: NavigationBias,
}

impl LoadSet {
    pub fn contains(&self, pages_index: usize) -> bool {
        self.indexes.contains(&pages_index)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indexes.iter().copied()
    }

    /// Order in which the pages should be requested: the current page first,
    /// then the side the reader is moving towards.
    pub fn priority(&self) -> &[usize] {
        &self.priority
    }

    pub fn bias(&self) -> NavigationBias {
        self.bias
    }

    fn same_pages(&self, other: &LoadSet) -> bool {
        self.indexes == other.indexes
    }
}

/// Computes the entries to load around `current_index`.
///
/// `current_index` must be a valid index into `pages`; callers clamp it
/// before asking.
pub fn compute_load_set(
    current_index: usize,
    pages: &PageSequence,
    previous_index: Option<usize>,
    preload_amount: usize,
) -> LoadSet {
    debug_assert!(current_index < pages.len());

    let last = pages.len() - 1;
    let start = current_index.saturating_sub(preload_amount);
    let end = current_index.saturating_add(preload_amount).min(last);

    let bias = NavigationBias::from_move(current_index, previous_index);
    let ahead = current_index + 1..=end;
    let behind = (start..current_index).rev();

    let mut priority = Vec::with_capacity(end - start + 1);
    priority.push(current_index);
    match bias {
        NavigationBias::Forward => {
            priority.extend(ahead);
            priority.extend(behind);
        }
        NavigationBias::Backward => {
            priority.extend(behind);
            priority.extend(ahead);
        }
        NavigationBias::None => {
            for distance in 1..=preload_amount {
                let after = current_index + distance;
                if after <= end {
                    priority.push(after);
                }
                if let Some(before) = current_index.checked_sub(distance) {
                    if before >= start {
                        priority.push(before);
                    }
                }
                if after >= end && current_index.saturating_sub(distance) <= start {
                    break;
                }
            }
        }
    }

    LoadSet {
        indexes: priority.iter().copied().collect(),
        priority,
        bias,
    }
}

/// Which chapter transition pages the reader shows around the pages.
///
/// While only one transition page is up the chapter's own pages stay mounted
/// but hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPageMode {
    #[default]
    None,
    Previous,
    Next,
    Both,
}

impl TransitionPageMode {
    pub fn shows_pages(self) -> bool {
        matches!(self, TransitionPageMode::None | TransitionPageMode::Both)
    }

    pub fn shows_transition(self, side: TransitionSide) -> bool {
        match self {
            TransitionPageMode::None => false,
            TransitionPageMode::Both => true,
            TransitionPageMode::Previous => side == TransitionSide::Previous,
            TransitionPageMode::Next => side == TransitionSide::Next,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSide {
    Previous,
    Next,
}

/// One element of the pager strip, in sequence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Transition(TransitionSide),
    Page {
        pages_index: usize,
        should_load: bool,
        should_display: bool,
    },
}

impl PageSlot {
    pub fn should_load(&self) -> bool {
        matches!(
            self,
            PageSlot::Page {
                should_load: true,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowKey {
    current_index: usize,
    preload_amount: usize,
    page_count: usize,
}

/// Session state of the window selector for one mounted reader.
///
/// Holds the previous index used for the navigation bias and memoizes the
/// last load set. Recreate or [`reset`](PagerWindow::reset) it when the
/// reader session is torn down.
#[derive(Debug, Default)]
pub struct PagerWindow {
    previous_index: Option<usize>,
    cached: Option<(WindowKey, LoadSet)>,
}

impl PagerWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous_index(&self) -> Option<usize> {
        self.previous_index
    }

    /// Returns the load set for `current_index`, recomputing it only when the
    /// index, the preload amount or the number of entries changed.
    pub fn update(
        &mut self,
        current_index: usize,
        pages: &PageSequence,
        preload_amount: usize,
    ) -> &LoadSet {
        let key = WindowKey {
            current_index,
            preload_amount,
            page_count: pages.len(),
        };

        let entry = match self.cached.take() {
            Some((cached_key, load_set)) if cached_key == key => (cached_key, load_set),
            previous => {
                let load_set =
                    compute_load_set(current_index, pages, self.previous_index, preload_amount);

                let changed = previous
                    .as_ref()
                    .is_none_or(|(_, previous)| !previous.same_pages(&load_set));
                if changed {
                    debug!(
                        "Load set changed at index {current_index}: {:?} ({:?})",
                        load_set.priority(),
                        load_set.bias()
                    );
                    self.previous_index = Some(current_index);
                }

                (key, load_set)
            }
        };

        &self.cached.insert(entry).1
    }

    /// Every entry of `pages` in sequence order, framed by the transition
    /// pages `transition_mode` shows.
    pub fn slots(
        &mut self,
        current_index: usize,
        pages: &PageSequence,
        preload_amount: usize,
        transition_mode: TransitionPageMode,
    ) -> Vec<PageSlot> {
        let load_set = self.update(current_index, pages, preload_amount);
        let should_display = transition_mode.shows_pages();

        let mut slots = Vec::with_capacity(pages.len() + 2);
        if transition_mode.shows_transition(TransitionSide::Previous) {
            slots.push(PageSlot::Transition(TransitionSide::Previous));
        }
        slots.extend((0..pages.len()).map(|pages_index| PageSlot::Page {
            pages_index,
            should_load: load_set.contains(pages_index),
            should_display,
        }));
        if transition_mode.shows_transition(TransitionSide::Next) {
            slots.push(PageSlot::Transition(TransitionSide::Next));
        }
        slots
    }

    pub fn reset(&mut self) {
        self.previous_index = None;
        self.cached = None;
    }
}
