//! Helpers for driving the reader from tests.

use crate::event_source::EventSource;
use crate::main_app::{App, ReaderConfig};
use crate::settings::Settings;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{Terminal, backend::TestBackend};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Reader over `page_count` pages with default settings adjusted by `configure`.
pub fn create_test_app(page_count: usize, configure: impl FnOnce(&mut Settings)) -> App {
    let mut settings = Settings::default();
    configure(&mut settings);
    App::with_page_count(page_count, ReaderConfig::from(&settings))
        .expect("Failed to create test app")
}

/// Draws one frame and returns the screen as text, one string per row.
pub fn render_to_lines(terminal: &mut Terminal<TestBackend>, app: &mut App) -> Vec<String> {
    terminal
        .draw(|f| app.draw(f))
        .expect("Failed to draw test frame");
    let buffer = terminal.backend().buffer();
    let area = buffer.area;
    (area.y..area.y + area.height)
        .map(|y| {
            (area.x..area.x + area.width)
                .map(|x| buffer[(x, y)].symbol())
                .collect::<String>()
        })
        .collect()
}

/// Replays a fixed list of events, used by tests.
#[derive(Default)]
pub struct SimulatedEventSource {
    events: VecDeque<Event>,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
        }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn is_drained(&self) -> bool {
        self.events.is_empty()
    }

    pub fn char_key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::empty()))
    }

    pub fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    pub fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::empty(),
        })
    }

    pub fn left_down(column: u16, row: u16) -> Event {
        Self::mouse(MouseEventKind::Down(MouseButton::Left), column, row)
    }

    pub fn left_drag(column: u16, row: u16) -> Event {
        Self::mouse(MouseEventKind::Drag(MouseButton::Left), column, row)
    }

    pub fn left_up(column: u16, row: u16) -> Event {
        Self::mouse(MouseEventKind::Up(MouseButton::Left), column, row)
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn read(&mut self) -> io::Result<Event> {
        self.events
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more events"))
    }
}
