use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{self, Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, execute, queue, terminal};
use std::io::{self, Stdout, Write};
use std::time::Duration;
use stroop_core::Color;
use stroop_experiment::SessionEvent;

/// What a key press asks the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Answer(Color),
    TogglePause,
    Stop,
}

/// Letter keys, the home row and the numeric keypad all answer.
pub fn map_key(code: KeyCode) -> Option<Input> {
    match code {
        KeyCode::Esc => Some(Input::Stop),
        KeyCode::Pause | KeyCode::Char(' ') => Some(Input::TogglePause),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'r' | 'a' | '7' => Some(Input::Answer(Color::Red)),
            'g' | 's' | '4' => Some(Input::Answer(Color::Green)),
            'b' | 'd' | '1' => Some(Input::Answer(Color::Blue)),
            'y' | 'f' | '0' => Some(Input::Answer(Color::Yellow)),
            _ => None,
        },
        _ => None,
    }
}

fn term_color(color: Color) -> style::Color {
    let [r, g, b] = color.rgb();
    style::Color::Rgb { r, g, b }
}

/// Raw-mode alternate screen. Restored on drop.
pub struct Screen {
    out: Stdout,
}

impl Screen {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(
            out,
            terminal::EnterAlternateScreen,
            terminal::Clear(terminal::ClearType::All),
            cursor::Hide
        )?;
        Ok(Self { out })
    }

    fn clear(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            style::ResetColor,
            terminal::Clear(terminal::ClearType::All)
        )
    }

    /// Top-left corner of a `w`×`h` box centered on screen.
    fn centered(w: u16, h: u16) -> io::Result<(u16, u16)> {
        let (cols, rows) = terminal::size()?;
        Ok((cols.saturating_sub(w) / 2, rows.saturating_sub(h) / 2))
    }

    pub fn message(&mut self, lines: &[String]) -> io::Result<()> {
        self.clear()?;
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16;
        let (x, y) = Self::centered(width, lines.len() as u16)?;
        for (i, line) in lines.iter().enumerate() {
            queue!(self.out, cursor::MoveTo(x, y + i as u16), Print(line))?;
        }
        self.out.flush()
    }

    fn fixation(&mut self) -> io::Result<()> {
        self.clear()?;
        let (x, y) = Self::centered(1, 1)?;
        queue!(self.out, cursor::MoveTo(x, y), SetAttribute(Attribute::Bold), Print('+'))?;
        queue!(self.out, SetAttribute(Attribute::Reset))?;
        self.out.flush()
    }

    fn quad(&mut self, color: Color) -> io::Result<()> {
        const W: u16 = 16;
        const H: u16 = 7;
        self.clear()?;
        let (x, y) = Self::centered(W, H)?;
        let row = " ".repeat(W as usize);
        queue!(self.out, SetBackgroundColor(term_color(color)))?;
        for dy in 0..H {
            queue!(self.out, cursor::MoveTo(x, y + dy), Print(&row))?;
        }
        queue!(self.out, style::ResetColor)?;
        self.out.flush()
    }

    fn writing(&mut self, text: &str, color: Color) -> io::Result<()> {
        self.clear()?;
        let (x, y) = Self::centered(text.chars().count() as u16, 1)?;
        queue!(
            self.out,
            cursor::MoveTo(x, y),
            SetForegroundColor(term_color(color)),
            SetAttribute(Attribute::Bold),
            Print(text),
            SetAttribute(Attribute::Reset),
            style::ResetColor
        )?;
        self.out.flush()
    }

    /// Renders the presentation requests of a session event. Others are ignored.
    pub fn present(&mut self, event: &SessionEvent) -> io::Result<()> {
        match event {
            SessionEvent::FixationPoint => self.fixation(),
            SessionEvent::ColoredQuad(color) => self.quad(*color),
            SessionEvent::ColoredWriting { text, color } => self.writing(text, *color),
            _ => Ok(()),
        }
    }

    /// Waits up to `timeout` for a mapped key press.
    pub fn next_input(&mut self, timeout: Duration) -> io::Result<Option<Input>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(map_key(key.code)),
            _ => Ok(None),
        }
    }
}

impl Drop for Screen {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            style::ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}
