use crate::direction::{ProgressBarPosition, ReadingDirection};
use crate::drag::{
    DragOutcome, DragSession, NavigationOrigin, OpenPageOptions, PageOpener, PointerEventSource,
    PointerKind, PointerListeners, ProgressContext,
};
use crate::event_source::EventSource;
use crate::pager::{PageSlot, PagerWindow, TransitionPageMode, TransitionSide};
use crate::progress_bar::{
    PageOffset, PointerPosition, TrackRect, get_next_page_index, progress_fraction,
    resolve_index_for_pointer,
};
use crate::settings::Settings;
use crate::types::{CurrentPage, PageSequence, SpreadLayout, get_next_index_from_page};
use anyhow::{Result, bail};
use crossterm::event::{Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::rc::Rc;
use std::time::Duration;

const MAX_HISTORY: usize = 50;
const MAX_PRELOAD_AMOUNT: usize = 20;

#[derive(Debug, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Reader view options the engine needs on every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    pub preload_amount: usize,
    pub position: ProgressBarPosition,
    pub direction: ReadingDirection,
    pub double_page: bool,
    pub cover_alone: bool,
}

impl From<&Settings> for ReaderConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            preload_amount: settings.image_preload_amount,
            position: settings.progress_bar_position,
            direction: settings.reading_direction,
            double_page: settings.double_page,
            cover_alone: settings.cover_alone,
        }
    }
}

impl ReaderConfig {
    pub fn apply_to(&self, settings: &mut Settings) {
        settings.image_preload_amount = self.preload_amount;
        settings.progress_bar_position = self.position;
        settings.reading_direction = self.direction;
        settings.double_page = self.double_page;
        settings.cover_alone = self.cover_alone;
    }

    fn build_pages(&self, page_count: usize) -> crate::error::Result<PageSequence> {
        if self.double_page {
            PageSequence::spreads(
                page_count,
                SpreadLayout {
                    cover_alone: self.cover_alone,
                },
            )
        } else {
            PageSequence::single(page_count)
        }
    }
}

/// The authoritative reading position.
pub struct ReaderState {
    pages: Rc<PageSequence>,
    current_page_index: usize,
    history: Vec<usize>,
    transition_mode: TransitionPageMode,
}

impl ReaderState {
    fn new(pages: PageSequence) -> Self {
        let current_page_index = pages.first().primary.index;
        Self {
            pages: Rc::new(pages),
            current_page_index,
            history: Vec::new(),
            transition_mode: TransitionPageMode::None,
        }
    }

    fn current_page(&self) -> CurrentPage {
        self.pages
            .current_page(self.current_page_index)
            .unwrap_or(CurrentPage {
                entry: *self.pages.first(),
                pages_index: 0,
            })
    }
}

impl PageOpener for ReaderState {
    fn open_page(
        &mut self,
        index: usize,
        options: OpenPageOptions,
        update_history: bool,
    ) -> Result<()> {
        if self.pages.current_page(index).is_none() {
            bail!("page {} is not part of this chapter", index + 1);
        }

        debug!(
            "Opening page {index} ({:?}, history: {update_history})",
            options.origin
        );

        if update_history && index != self.current_page_index {
            self.history.push(self.current_page_index);
            if self.history.len() > MAX_HISTORY {
                self.history.remove(0);
            }
        }
        self.current_page_index = index;
        // opening a page leaves a single transition page
        if !self.transition_mode.shows_pages() {
            self.transition_mode = TransitionPageMode::None;
        }
        Ok(())
    }
}

pub struct App {
    reader: ReaderState,
    config: ReaderConfig,
    window: PagerWindow,
    drag: DragSession,
    pointer_events: Rc<PointerListeners>,
    last_track_area: Option<Rect>,
}

impl App {
    pub fn new(pages: PageSequence, config: ReaderConfig) -> Self {
        info!(
            "Opening reader with {} entries ({} pages)",
            pages.len(),
            pages.physical_page_count()
        );
        Self {
            reader: ReaderState::new(pages),
            config,
            window: PagerWindow::new(),
            drag: DragSession::new(),
            pointer_events: Rc::new(PointerListeners::new()),
            last_track_area: None,
        }
    }

    /// Builds the page sequence for `page_count` pages from `config`.
    pub fn with_page_count(page_count: usize, config: ReaderConfig) -> Result<Self> {
        let pages = config.build_pages(page_count)?;
        Ok(Self::new(pages, config))
    }

    pub fn config(&self) -> ReaderConfig {
        self.config
    }

    pub fn pages(&self) -> &PageSequence {
        &self.reader.pages
    }

    pub fn current_page_index(&self) -> usize {
        self.reader.current_page_index
    }

    pub fn current_page(&self) -> CurrentPage {
        self.reader.current_page()
    }

    pub fn transition_mode(&self) -> TransitionPageMode {
        self.reader.transition_mode
    }

    pub fn set_transition_mode(&mut self, mode: TransitionPageMode) {
        debug!("Transition page mode: {mode:?}");
        self.reader.transition_mode = mode;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn pointer_listener_count(&self) -> usize {
        self.pointer_events.listener_count()
    }

    pub fn set_drag_enabled(&mut self, enabled: bool) {
        self.drag.set_drag_enabled(enabled);
    }

    /// Pager strip for the current position.
    pub fn page_slots(&mut self) -> Vec<PageSlot> {
        let pages_index = self.current_page().pages_index;
        self.window.slots(
            pages_index,
            &self.reader.pages,
            self.config.preload_amount,
            self.reader.transition_mode,
        )
    }

    pub fn load_priority(&mut self) -> Vec<usize> {
        let pages_index = self.current_page().pages_index;
        self.window
            .update(pages_index, &self.reader.pages, self.config.preload_amount)
            .priority()
            .to_vec()
    }

    pub fn open_page(&mut self, index: usize, update_history: bool) -> Result<()> {
        self.reader
            .open_page(index, OpenPageOptions::default(), update_history)
    }

    /// Moves one entry. Moving past either end of the chapter shows the
    /// transition page on that side; moving back from it shows the pages
    /// again without changing the current page.
    pub fn navigate(&mut self, offset: PageOffset) {
        match (self.reader.transition_mode, offset) {
            (TransitionPageMode::Previous, PageOffset::Next)
            | (TransitionPageMode::Next, PageOffset::Previous) => {
                self.set_transition_mode(TransitionPageMode::None);
                return;
            }
            (TransitionPageMode::Previous, _) | (TransitionPageMode::Next, _) => return,
            _ => {}
        }

        let pages_index = self.current_page().pages_index;
        if self.reader.transition_mode == TransitionPageMode::None {
            let edge = match offset {
                PageOffset::Previous if pages_index == 0 => Some(TransitionPageMode::Previous),
                PageOffset::Next if pages_index == self.reader.pages.len() - 1 => {
                    Some(TransitionPageMode::Next)
                }
                _ => None,
            };
            if let Some(mode) = edge {
                self.set_transition_mode(mode);
                return;
            }
        }

        let index = get_next_page_index(offset, pages_index, &self.reader.pages);
        if let Err(e) = self.open_page(index, false) {
            warn!("Failed to navigate {offset:?}: {e}");
        }
    }

    fn navigate_towards_left(&mut self) {
        let offset = self
            .config
            .direction
            .option_for_direction(PageOffset::Previous, PageOffset::Next);
        self.navigate(offset);
    }

    fn navigate_towards_right(&mut self) {
        let offset = self
            .config
            .direction
            .option_for_direction(PageOffset::Next, PageOffset::Previous);
        self.navigate(offset);
    }

    fn jump_to_first(&mut self) {
        let index = self.reader.pages.first().primary.index;
        if let Err(e) = self.open_page(index, true) {
            warn!("Failed to jump to the first page: {e}");
        }
    }

    fn jump_to_last(&mut self) {
        let index = get_next_index_from_page(self.reader.pages.last());
        if let Err(e) = self.open_page(index, true) {
            warn!("Failed to jump to the last page: {e}");
        }
    }

    pub fn jump_back(&mut self) {
        let Some(index) = self.reader.history.pop() else {
            debug!("History is empty");
            return;
        };
        let options = OpenPageOptions {
            origin: NavigationOrigin::History,
        };
        if let Err(e) = self.reader.open_page(index, options, false) {
            warn!("Failed to go back to page {index}: {e}");
        }
    }

    pub fn toggle_direction(&mut self) {
        self.config.direction = self.config.direction.toggled();
        info!("Reading direction: {:?}", self.config.direction);
    }

    pub fn cycle_progress_bar_position(&mut self) {
        self.drag.on_drag_end();
        self.config.position = self.config.position.cycle();
        self.last_track_area = None;
        info!("Progress bar position: {:?}", self.config.position);
    }

    pub fn change_preload_amount(&mut self, delta: isize) {
        let amount = self
            .config
            .preload_amount
            .saturating_add_signed(delta)
            .min(MAX_PRELOAD_AMOUNT);
        self.config.preload_amount = amount;
        debug!("Preload amount: {amount}");
    }

    /// Rebuilds the sequence in the other page mode. This starts a new reader
    /// session, the current physical page is kept.
    pub fn toggle_double_page(&mut self) -> Result<()> {
        let mut config = self.config;
        config.double_page = !config.double_page;

        let pages = config.build_pages(self.reader.pages.physical_page_count())?;
        let current_page_index = self.reader.current_page_index;

        self.drag.on_drag_end();
        self.window.reset();
        self.reader = ReaderState::new(pages);
        self.reader.current_page_index = current_page_index;
        self.config = config;
        info!("Double page mode: {}", config.double_page);
        Ok(())
    }

    fn progress_context<'a>(&self, pages: &'a PageSequence, track: Rect) -> ProgressContext<'a> {
        ProgressContext {
            pages,
            current: self.current_page(),
            track: TrackRect::from(track),
            position: self.config.position,
            direction: self.config.direction,
        }
    }

    fn seek_to_pointer(&mut self, pointer: PointerPosition) -> DragOutcome {
        let Some(track) = self.last_track_area else {
            return DragOutcome::Ignored;
        };

        let pages = Rc::clone(&self.reader.pages);
        let context = self.progress_context(&pages, track);
        self.drag.on_drag_move(pointer, &context, &mut self.reader)
    }

    pub fn handle_mouse_event(&mut self, mouse_event: MouseEvent) {
        let pointer = PointerPosition::from_cell(mouse_event.column, mouse_event.row);

        match mouse_event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let on_track = self
                    .last_track_area
                    .is_some_and(|track| TrackRect::from(track).contains(pointer));
                if !on_track {
                    return;
                }

                let source: Rc<dyn PointerEventSource> = self.pointer_events.clone();
                if self.drag.on_drag_start(&source) {
                    self.seek_to_pointer(pointer);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if self.pointer_events.is_listening(PointerKind::Mouse) {
                    self.seek_to_pointer(pointer);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.drag.on_drag_end();
            }
            MouseEventKind::ScrollDown => self.navigate(PageOffset::Next),
            MouseEventKind::ScrollUp => self.navigate(PageOffset::Previous),
            _ => {
                //do nothing
            }
        }
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            KeyCode::Char('l') | KeyCode::Right => self.navigate_towards_right(),
            KeyCode::Char('h') | KeyCode::Left => self.navigate_towards_left(),
            KeyCode::Char('j') | KeyCode::Down | KeyCode::PageDown | KeyCode::Char(' ') => {
                self.navigate(PageOffset::Next)
            }
            KeyCode::Char('k') | KeyCode::Up | KeyCode::PageUp => {
                self.navigate(PageOffset::Previous)
            }
            KeyCode::Char('g') | KeyCode::Home => self.jump_to_first(),
            KeyCode::Char('G') | KeyCode::End => self.jump_to_last(),
            KeyCode::Backspace => self.jump_back(),
            KeyCode::Char('d') => self.toggle_direction(),
            KeyCode::Char('p') => self.cycle_progress_bar_position(),
            KeyCode::Char('+') => self.change_preload_amount(1),
            KeyCode::Char('-') => self.change_preload_amount(-1),
            KeyCode::Char('D') => {
                if let Err(e) = self.toggle_double_page() {
                    warn!("Failed to switch page mode: {e}");
                }
            }
            _ => {}
        }
        None
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let area = f.area();

        let (content_area, bar_area) = match self.config.position {
            ProgressBarPosition::Bottom => {
                let chunks =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(3)]).split(area);
                (chunks[0], chunks[1])
            }
            ProgressBarPosition::Left => {
                let chunks =
                    Layout::horizontal([Constraint::Length(3), Constraint::Min(1)]).split(area);
                (chunks[1], chunks[0])
            }
            ProgressBarPosition::Right => {
                let chunks =
                    Layout::horizontal([Constraint::Min(1), Constraint::Length(3)]).split(area);
                (chunks[0], chunks[1])
            }
        };

        self.render_pages(f, content_area);
        self.render_progress_bar(f, bar_area);
    }

    fn render_pages(&mut self, f: &mut Frame, area: Rect) {
        let current = self.current_page();
        let slots = self.page_slots();
        let priority = self.load_priority();
        let pages = Rc::clone(&self.reader.pages);

        let mut strip = Vec::with_capacity(slots.len() * 2);
        for slot in &slots {
            let (label, style) = match *slot {
                PageSlot::Transition(side) => {
                    let label = match side {
                        TransitionSide::Previous => "<< previous chapter",
                        TransitionSide::Next => "next chapter >>",
                    };
                    (
                        label.to_string(),
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::BOLD),
                    )
                }
                // mounted behind a transition page
                PageSlot::Page {
                    should_display: false,
                    ..
                } => continue,
                PageSlot::Page {
                    pages_index,
                    should_load,
                    ..
                } => {
                    let entry = &pages[pages_index];
                    if pages_index == current.pages_index {
                        let style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Yellow)
                            .add_modifier(Modifier::BOLD);
                        (entry.label(), style)
                    } else if should_load {
                        (entry.label(), Style::default().fg(Color::Green))
                    } else {
                        let placeholder = "·".repeat(entry.label().chars().count());
                        (placeholder, Style::default().fg(Color::DarkGray))
                    }
                }
            };
            strip.push(Span::styled(label, style));
            strip.push(Span::raw(" "));
        }

        let loaded: Vec<String> = priority
            .iter()
            .map(|pages_index| pages[*pages_index].label())
            .collect();

        let lines = vec![
            Line::from(vec![
                Span::styled("Page ", Style::default().fg(Color::Gray)),
                Span::styled(
                    current.entry.label(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" / {}", pages.physical_page_count())),
                Span::styled(
                    format!(
                        "  {:>3.0}%",
                        progress_fraction(&current, &pages) * 100.0
                    ),
                    Style::default().fg(Color::Gray),
                ),
            ]),
            Line::from(format!(
                "{:?} · preload {} · {}",
                self.config.direction,
                self.config.preload_amount,
                if self.config.double_page {
                    "double page"
                } else {
                    "single page"
                }
            )),
            Line::from(format!("Loading: {}", loaded.join(" "))),
            Line::from(""),
            Line::from(strip),
        ];

        let paragraph = Paragraph::new(lines)
            .block(Block::default().title(" Reader ").borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_progress_bar(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let track = block.inner(area);
        f.render_widget(block, area);

        if track.width == 0 || track.height == 0 {
            self.last_track_area = None;
            return;
        }
        self.last_track_area = Some(track);

        let pages = Rc::clone(&self.reader.pages);
        let context = self.progress_context(&pages, track);
        let is_horizontal = context.position.info().is_horizontal;
        let current_index = context.current.pages_index;

        let mut cells = Vec::with_capacity(usize::from(track.width.max(track.height)));
        for x in track.x..track.x + track.width {
            for y in track.y..track.y + track.height {
                let pages_index = resolve_index_for_pointer(
                    PointerPosition::from_cell(x, y),
                    &context.track,
                    context.pages.len(),
                    is_horizontal,
                    context.direction,
                );

                let (symbol, style) = if pages_index == current_index {
                    ("█", Style::default().fg(Color::Yellow))
                } else if pages_index < current_index {
                    ("█", Style::default().fg(Color::Blue))
                } else {
                    ("░", Style::default().fg(Color::DarkGray))
                };
                cells.push((x, y, symbol, style));
            }
        }

        let buffer = f.buffer_mut();
        for (x, y, symbol, style) in cells {
            if let Some(cell) = buffer.cell_mut((x, y)) {
                cell.set_symbol(symbol).set_style(style);
            }
        }
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()> {
    let tick_rate = Duration::from_millis(50);
    let mut first_render = true;
    loop {
        let mut events_processed = 0;
        let mut should_quit = false;

        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            match event {
                Event::Mouse(mouse_event) => app.handle_mouse_event(mouse_event),
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        should_quit = true;
                    }
                }
                Event::Resize(_cols, _rows) => {
                    // the track moves with the layout; the next draw records it
                    app.drag.on_drag_end();
                }
                _ => {}
            }

            if should_quit {
                break;
            }
        }

        if events_processed > 0 || first_render {
            first_render = false;
            terminal.draw(|f| app.draw(f))?;
        }

        if should_quit {
            return Ok(());
        }

        if events_processed == 0 {
            let _ = event_source.poll(tick_rate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_page_rejects_pages_outside_chapter() {
        let mut reader = ReaderState::new(PageSequence::single(3).unwrap());
        let result = reader.open_page(3, OpenPageOptions::default(), true);
        assert!(result.is_err());
        assert_eq!(reader.current_page_index, 0);
        assert!(reader.history.is_empty());
    }

    #[test]
    fn test_history_is_capped() {
        let mut reader = ReaderState::new(PageSequence::single(2).unwrap());
        for i in 0..(MAX_HISTORY + 10) {
            reader
                .open_page((i + 1) % 2, OpenPageOptions::default(), true)
                .unwrap();
        }
        assert_eq!(reader.history.len(), MAX_HISTORY);
    }

    #[test]
    fn test_preload_amount_is_bounded() {
        let mut app = App::with_page_count(4, ReaderConfig::from(&Settings::default())).unwrap();
        app.change_preload_amount(-10);
        assert_eq!(app.config().preload_amount, 0);
        app.change_preload_amount(100);
        assert_eq!(app.config().preload_amount, MAX_PRELOAD_AMOUNT);
    }

    #[test]
    fn test_empty_chapter_is_rejected() {
        assert!(App::with_page_count(0, ReaderConfig::from(&Settings::default())).is_err());
    }
}
