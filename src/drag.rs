//! Drag-to-seek on the progress track.
//!
//! A [`DragSession`] is either idle or dragging. Entering the dragging state
//! attaches pointer listeners on the host's event source; the returned
//! [`Subscription`] guards detach them again on every way out of the state,
//! including the session being dropped mid-gesture.

use crate::direction::{ProgressBarPosition, ReadingDirection};
use crate::progress_bar::{PointerPosition, TrackRect, resolve_page_for_pointer};
use crate::types::{CurrentPage, PageSequence, get_next_index_from_page};
use log::{debug, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The host's stream of pointer move events.
///
/// Attached listeners tell the host to route moves to the drag session.
pub trait PointerEventSource {
    fn attach(&self, kind: PointerKind) -> ListenerId;
    fn detach(&self, id: ListenerId);
}

/// Listener registry used by the terminal host.
#[derive(Debug, Default)]
pub struct PointerListeners {
    next_id: Cell<u64>,
    attached: RefCell<Vec<(ListenerId, PointerKind)>>,
}

impl PointerListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_listening(&self, kind: PointerKind) -> bool {
        self.attached
            .borrow()
            .iter()
            .any(|(_, attached_kind)| *attached_kind == kind)
    }

    pub fn listener_count(&self) -> usize {
        self.attached.borrow().len()
    }
}

impl PointerEventSource for PointerListeners {
    fn attach(&self, kind: PointerKind) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.attached.borrow_mut().push((id, kind));
        id
    }

    fn detach(&self, id: ListenerId) {
        self.attached
            .borrow_mut()
            .retain(|(attached_id, _)| *attached_id != id);
    }
}

/// Attached listener, detached when dropped.
pub struct Subscription {
    source: Rc<dyn PointerEventSource>,
    id: ListenerId,
    kind: PointerKind,
}

impl Subscription {
    pub fn attach(source: &Rc<dyn PointerEventSource>, kind: PointerKind) -> Self {
        let id = source.attach(kind);
        debug!("Attached {kind:?} listener {id:?}");
        Self {
            source: Rc::clone(source),
            id,
            kind,
        }
    }

    pub fn kind(&self) -> PointerKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.source.detach(self.id);
        debug!("Detached {:?} listener {:?}", self.kind, self.id);
    }
}

/// Where a page-open request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationOrigin {
    #[default]
    Reader,
    ProgressBar,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenPageOptions {
    pub origin: NavigationOrigin,
}

/// Opens a page in the host reader. Requests are fire and forget: the caller
/// does not wait for the page to show up and does not retry failures.
pub trait PageOpener {
    fn open_page(
        &mut self,
        index: usize,
        options: OpenPageOptions,
        update_history: bool,
    ) -> anyhow::Result<()>;
}

/// What the reader looks like at the time of a pointer move.
pub struct ProgressContext<'a> {
    pub pages: &'a PageSequence,
    pub current: CurrentPage,
    pub track: TrackRect,
    pub position: ProgressBarPosition,
    pub direction: ReadingDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// No drag in progress.
    Ignored,
    /// The pointer is still over the page already shown.
    Unchanged,
    Navigated(usize),
}

struct ActiveDrag {
    _mouse: Subscription,
    _touch: Subscription,
}

enum DragState {
    Idle,
    Dragging(ActiveDrag),
}

pub struct DragSession {
    enabled: bool,
    state: DragState,
}

impl Default for DragSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DragSession {
    pub fn new() -> Self {
        Self {
            enabled: true,
            state: DragState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn is_drag_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling drags ends the one in progress.
    pub fn set_drag_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.on_drag_end();
        }
    }

    /// Starts a gesture. A gesture already in progress is replaced, its
    /// listeners detached before the new ones attach.
    pub fn on_drag_start(&mut self, source: &Rc<dyn PointerEventSource>) -> bool {
        if !self.enabled {
            debug!("Drag start ignored, dragging is disabled");
            return false;
        }

        self.on_drag_end();
        self.state = DragState::Dragging(ActiveDrag {
            _mouse: Subscription::attach(source, PointerKind::Mouse),
            _touch: Subscription::attach(source, PointerKind::Touch),
        });
        true
    }

    pub fn on_drag_end(&mut self) {
        if self.is_dragging() {
            debug!("Drag ended");
        }
        self.state = DragState::Idle;
    }

    pub fn on_drag_move(
        &mut self,
        pointer: PointerPosition,
        context: &ProgressContext<'_>,
        opener: &mut dyn PageOpener,
    ) -> DragOutcome {
        if !self.is_dragging() {
            return DragOutcome::Ignored;
        }

        let is_horizontal = context.position.info().is_horizontal;
        let target = resolve_page_for_pointer(
            pointer,
            &context.track,
            context.pages,
            is_horizontal,
            context.direction,
        );
        let new_page_index = get_next_index_from_page(target);

        if context.current.navigable_index() == new_page_index {
            return DragOutcome::Unchanged;
        }

        debug!("Seeking to page {new_page_index} from the progress bar");
        let options = OpenPageOptions {
            origin: NavigationOrigin::ProgressBar,
        };
        if let Err(e) = opener.open_page(new_page_index, options, false) {
            warn!("Failed to open page {new_page_index}: {e}");
        }
        DragOutcome::Navigated(new_page_index)
    }

    /// Touch moves carry every active touch point; only the first one seeks.
    pub fn on_touch_move(
        &mut self,
        touches: &[PointerPosition],
        context: &ProgressContext<'_>,
        opener: &mut dyn PageOpener,
    ) -> DragOutcome {
        match touches.first() {
            Some(touch) => self.on_drag_move(*touch, context, opener),
            None if self.is_dragging() => DragOutcome::Unchanged,
            None => DragOutcome::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PageEntry;
    use anyhow::anyhow;

    #[derive(Default)]
    struct RecordingOpener {
        calls: Vec<(usize, OpenPageOptions, bool)>,
        fail: bool,
    }

    impl PageOpener for RecordingOpener {
        fn open_page(
            &mut self,
            index: usize,
            options: OpenPageOptions,
            update_history: bool,
        ) -> anyhow::Result<()> {
            self.calls.push((index, options, update_history));
            if self.fail {
                return Err(anyhow!("page {index} is not available"));
            }
            Ok(())
        }
    }

    fn source() -> (Rc<PointerListeners>, Rc<dyn PointerEventSource>) {
        let listeners = Rc::new(PointerListeners::new());
        let source: Rc<dyn PointerEventSource> = listeners.clone();
        (listeners, source)
    }

    fn context(pages: &PageSequence, current_page: usize) -> ProgressContext<'_> {
        ProgressContext {
            pages,
            current: pages.current_page(current_page).unwrap(),
            track: TrackRect::new(0.0, 0.0, 100.0, 1.0),
            position: ProgressBarPosition::Bottom,
            direction: ReadingDirection::LeftToRight,
        }
    }

    #[test]
    fn test_drag_attaches_and_releases_listeners() {
        let (listeners, source) = source();
        let mut session = DragSession::new();

        assert!(session.on_drag_start(&source));
        assert!(session.is_dragging());
        assert!(listeners.is_listening(PointerKind::Mouse));
        assert!(listeners.is_listening(PointerKind::Touch));
        assert_eq!(listeners.listener_count(), 2);

        session.on_drag_end();
        assert!(!session.is_dragging());
        assert_eq!(listeners.listener_count(), 0);
    }

    #[test]
    fn test_new_gesture_replaces_listeners() {
        let (listeners, source) = source();
        let mut session = DragSession::new();

        session.on_drag_start(&source);
        session.on_drag_start(&source);
        assert_eq!(listeners.listener_count(), 2);
    }

    #[test]
    fn test_dropping_session_releases_listeners() {
        let (listeners, source) = source();
        {
            let mut session = DragSession::new();
            session.on_drag_start(&source);
            assert_eq!(listeners.listener_count(), 2);
        }
        assert_eq!(listeners.listener_count(), 0);
    }

    #[test]
    fn test_disabled_drag_does_not_start_and_disabling_ends_drag() {
        let (listeners, source) = source();
        let mut session = DragSession::new();

        assert!(session.is_drag_enabled());
        session.on_drag_start(&source);
        session.set_drag_enabled(false);
        assert!(!session.is_drag_enabled());
        assert!(!session.is_dragging());
        assert_eq!(listeners.listener_count(), 0);

        assert!(!session.on_drag_start(&source));
        assert_eq!(listeners.listener_count(), 0);

        session.set_drag_enabled(true);
        assert!(session.on_drag_start(&source));
    }

    #[test]
    fn test_subscription_detaches_its_own_listener() {
        let (listeners, source) = source();
        let mouse = Subscription::attach(&source, PointerKind::Mouse);
        let touch = Subscription::attach(&source, PointerKind::Touch);
        assert_eq!(mouse.kind(), PointerKind::Mouse);
        assert_eq!(touch.kind(), PointerKind::Touch);

        drop(touch);
        assert!(listeners.is_listening(PointerKind::Mouse));
        assert!(!listeners.is_listening(PointerKind::Touch));

        drop(mouse);
        assert_eq!(listeners.listener_count(), 0);
    }

    #[test]
    fn test_move_while_idle_is_ignored() {
        let pages = PageSequence::single(5).unwrap();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();

        let outcome =
            session.on_drag_move(PointerPosition::new(90.0, 0.0), &context(&pages, 0), &mut opener);
        assert_eq!(outcome, DragOutcome::Ignored);
        assert!(opener.calls.is_empty());
    }

    #[test]
    fn test_move_opens_page_without_history() {
        let pages = PageSequence::single(5).unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        let outcome =
            session.on_drag_move(PointerPosition::new(90.0, 0.0), &context(&pages, 0), &mut opener);
        assert_eq!(outcome, DragOutcome::Navigated(4));
        assert_eq!(
            opener.calls,
            vec![(
                4,
                OpenPageOptions {
                    origin: NavigationOrigin::ProgressBar
                },
                false
            )]
        );
    }

    #[test]
    fn test_moves_over_applied_page_do_not_navigate_again() {
        let pages = PageSequence::single(5).unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        session.on_drag_move(PointerPosition::new(45.0, 0.0), &context(&pages, 0), &mut opener);
        let outcome =
            session.on_drag_move(PointerPosition::new(50.0, 0.0), &context(&pages, 2), &mut opener);

        assert_eq!(outcome, DragOutcome::Unchanged);
        assert_eq!(opener.calls.len(), 1);
        assert_eq!(opener.calls[0].0, 2);
    }

    #[test]
    fn test_move_navigates_back_after_page_changed_elsewhere() {
        let pages = PageSequence::single(5).unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        let outcome =
            session.on_drag_move(PointerPosition::new(90.0, 0.0), &context(&pages, 0), &mut opener);
        assert_eq!(outcome, DragOutcome::Navigated(4));

        // A key press moved the reader to page 3 while the pointer stays on
        // the slice of page 4.
        let outcome =
            session.on_drag_move(PointerPosition::new(92.0, 0.0), &context(&pages, 3), &mut opener);
        assert_eq!(outcome, DragOutcome::Navigated(4));

        let indexes: Vec<usize> = opener.calls.iter().map(|call| call.0).collect();
        assert_eq!(indexes, vec![4, 4]);
    }

    #[test]
    fn test_move_over_current_page_is_noop() {
        let pages = PageSequence::single(5).unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        let ctx = context(&pages, 2);
        let first = session.on_drag_move(PointerPosition::new(50.0, 0.0), &ctx, &mut opener);
        let second = session.on_drag_move(PointerPosition::new(55.0, 0.0), &ctx, &mut opener);
        assert_eq!(first, DragOutcome::Unchanged);
        assert_eq!(second, DragOutcome::Unchanged);
        assert!(opener.calls.is_empty());
    }

    #[test]
    fn test_returning_to_a_page_after_leaving_it_navigates_again() {
        let pages = PageSequence::single(5).unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        let ctx = context(&pages, 0);
        session.on_drag_move(PointerPosition::new(90.0, 0.0), &ctx, &mut opener);
        session.on_drag_move(PointerPosition::new(5.0, 0.0), &ctx, &mut opener);
        session.on_drag_move(PointerPosition::new(90.0, 0.0), &ctx, &mut opener);

        let indexes: Vec<usize> = opener.calls.iter().map(|call| call.0).collect();
        assert_eq!(indexes, vec![4, 4]);
    }

    #[test]
    fn test_spread_target_uses_secondary_page() {
        let pages = PageSequence::new(vec![
            PageEntry::single(0),
            PageEntry::spread(1, 2),
            PageEntry::single(3),
        ])
        .unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        let outcome =
            session.on_drag_move(PointerPosition::new(50.0, 0.0), &context(&pages, 0), &mut opener);
        assert_eq!(outcome, DragOutcome::Navigated(2));

        // Already on the spread: pointing at it again is not a navigation.
        let mut session = DragSession::new();
        session.on_drag_start(&source);
        let outcome =
            session.on_drag_move(PointerPosition::new(50.0, 0.0), &context(&pages, 1), &mut opener);
        assert_eq!(outcome, DragOutcome::Unchanged);
    }

    #[test]
    fn test_failed_open_is_reported_as_navigation() {
        let pages = PageSequence::single(5).unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener {
            fail: true,
            ..Default::default()
        };
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        let ctx = context(&pages, 0);
        let outcome = session.on_drag_move(PointerPosition::new(70.0, 0.0), &ctx, &mut opener);
        assert_eq!(outcome, DragOutcome::Navigated(3));
        assert!(session.is_dragging());

        // The reader is still on page 0, so the next move asks again.
        session.on_drag_move(PointerPosition::new(71.0, 0.0), &ctx, &mut opener);
        assert_eq!(opener.calls.len(), 2);
    }

    #[test]
    fn test_touch_move_uses_first_touch() {
        let pages = PageSequence::single(5).unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        let ctx = context(&pages, 0);
        assert_eq!(
            session.on_touch_move(&[], &ctx, &mut opener),
            DragOutcome::Unchanged
        );
        let touches = [PointerPosition::new(30.0, 0.0), PointerPosition::new(95.0, 0.0)];
        assert_eq!(
            session.on_touch_move(&touches, &ctx, &mut opener),
            DragOutcome::Navigated(1)
        );
    }

    #[test]
    fn test_vertical_right_to_left_track() {
        let pages = PageSequence::single(4).unwrap();
        let (_listeners, source) = source();
        let mut opener = RecordingOpener::default();
        let mut session = DragSession::new();
        session.on_drag_start(&source);

        let ctx = ProgressContext {
            pages: &pages,
            current: pages.current_page(0).unwrap(),
            track: TrackRect::new(0.0, 0.0, 1.0, 40.0),
            position: ProgressBarPosition::Left,
            direction: ReadingDirection::RightToLeft,
        };
        let outcome = session.on_drag_move(PointerPosition::new(0.0, 5.0), &ctx, &mut opener);
        assert_eq!(outcome, DragOutcome::Navigated(3));
    }
}
