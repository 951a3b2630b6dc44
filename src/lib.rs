pub mod direction;
pub mod drag;
pub mod error;
pub mod event_source;
pub mod main_app;
pub mod pager;
pub mod panic_handler;
pub mod progress_bar;
pub mod settings;
pub mod types;
// Test utilities - only available when test-utils feature is enabled or during tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use direction::{ProgressBarPosition, ReadingDirection};
pub use drag::{DragOutcome, DragSession, PageOpener, PointerEventSource, Subscription};
pub use error::PagerError;
pub use main_app::{App, ReaderConfig, run_app_with_event_source};
pub use pager::{LoadSet, PageSlot, PagerWindow, TransitionPageMode, compute_load_set};
pub use progress_bar::{
    PageOffset, PointerPosition, TrackRect, get_next_page_index, resolve_index_for_pointer,
    resolve_page_for_pointer,
};
pub use types::{CurrentPage, PageEntry, PageRef, PageSequence, get_next_index_from_page};
