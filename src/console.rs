use rsvp_core::{
    ConfigError, KeyEvent, KeySource, SessionError, StimulusParams, StimulusRenderer,
};
use rsvp_timing::Timer;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::time::Duration;
use tracing::debug;

/// Terminal stand-in for a display: redraws the current item in place and
/// paces each frame to the nominal refresh interval.
pub struct ConsoleRenderer<W, Tm> {
    out: W,
    timer: Tm,
    frame: Duration,
    current: String,
}

impl<W: Write, Tm: Timer<Timestamp = u64>> ConsoleRenderer<W, Tm> {
    pub fn new(out: W, timer: Tm, refresh_hz: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            out,
            timer,
            frame: frame_interval(refresh_hz)?,
            current: String::new(),
        })
    }

    pub fn timer(&self) -> &Tm {
        &self.timer
    }

    /// Draws `frames` blank frames so the timer collects frame statistics.
    pub fn calibrate(&mut self, frames: usize) -> Result<(), SessionError> {
        self.current.clear();
        for _ in 0..frames {
            self.draw_frame()?;
        }
        Ok(())
    }

    fn redraw(&mut self, text: &str) -> Result<(), SessionError> {
        write!(self.out, "\r\x1b[2K{text:^9}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write, Tm: Timer<Timestamp = u64>> StimulusRenderer for ConsoleRenderer<W, Tm> {
    fn show_fixation(&mut self, symbol: &str) -> Result<(), SessionError> {
        self.current = symbol.to_string();
        self.redraw(symbol)
    }

    fn set_item(&mut self, label: &str, stimulus: &StimulusParams) {
        debug!(
            label,
            size_deg = stimulus.size_deg,
            contrast_pct = stimulus.contrast_pct,
            "item"
        );
        self.current = label.to_string();
    }

    fn draw_frame(&mut self) -> Result<(), SessionError> {
        let start = self.timer.now();
        let text = std::mem::take(&mut self.current);
        let drawn = self.redraw(&text);
        self.current = text;
        drawn?;
        let spent = self.timer.elapsed(start);
        if spent < self.frame {
            self.timer.sleep(self.frame - spent);
        }
        let total = self.timer.elapsed(start);
        self.timer.record_frame(total);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.current.clear();
        writeln!(self.out, "\r\x1b[2K")?;
        self.out.flush()?;
        Ok(())
    }
}

/// One refresh interval at `refresh_hz`, which must be positive and finite.
pub fn frame_interval(refresh_hz: f64) -> Result<Duration, ConfigError> {
    if refresh_hz > 0.0 && refresh_hz.is_finite() {
        Duration::try_from_secs_f64(1.0 / refresh_hz).map_err(|_| ConfigError::NonPositive {
            name: "display_hz",
            value: refresh_hz,
        })
    } else {
        Err(ConfigError::NonPositive {
            name: "display_hz",
            value: refresh_hz,
        })
    }
}

/// Line-based keyboard: each typed line becomes key events followed by
/// Enter. An empty line is a bare Enter, `esc` or `quit` is Escape. Keys
/// left over from a previous screen are dropped when a new prompt shows.
pub struct LineKeys<B, W> {
    input: B,
    out: W,
    pending: VecDeque<KeyEvent>,
}

impl<B: BufRead, W: Write> LineKeys<B, W> {
    pub fn new(input: B, out: W) -> Self {
        Self {
            input,
            out,
            pending: VecDeque::new(),
        }
    }

    fn read_line(&mut self) -> Result<(), SessionError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SessionError::InputClosed);
        }
        self.pending.extend(line_to_keys(line.trim_end_matches(['\r', '\n'])));
        Ok(())
    }
}

pub fn line_to_keys(line: &str) -> Vec<KeyEvent> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("esc") || trimmed.eq_ignore_ascii_case("quit") {
        return vec![KeyEvent::Escape];
    }
    let mut keys: Vec<KeyEvent> = line
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' => Some(KeyEvent::key(c.to_string())),
            'A'..='Z' => Some(KeyEvent::shifted(c.to_ascii_lowercase().to_string())),
            ' ' => Some(KeyEvent::key("space")),
            '=' => Some(KeyEvent::key("equal")),
            '+' => Some(KeyEvent::shifted("equal")),
            '-' => Some(KeyEvent::key("minus")),
            '\u{1b}' => Some(KeyEvent::Escape),
            '\u{8}' | '\u{7f}' => Some(KeyEvent::Backspace),
            _ => None,
        })
        .collect();
    keys.push(KeyEvent::Enter);
    keys
}

impl<B: BufRead, W: Write> KeySource for LineKeys<B, W> {
    fn next_key(&mut self) -> Result<KeyEvent, SessionError> {
        loop {
            if let Some(key) = self.pending.pop_front() {
                return Ok(key);
            }
            self.read_line()?;
        }
    }

    fn prompt(&mut self, text: &str) {
        self.pending.clear();
        let _ = writeln!(self.out, "\n{text}");
        let _ = self.out.flush();
    }

    fn echo(&mut self, typed: &str) {
        let _ = writeln!(self.out, "> {typed}");
    }
}
