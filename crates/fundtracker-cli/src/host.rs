//! Terminal implementations of the session collaborators and the loop
//! that drives frames and announcement ticks.

use std::cell::{Cell, RefCell};
use std::io::{BufRead, IsTerminal, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::debug;

use fundtracker_core::error::Result;
use fundtracker_core::{
    Config, ConfirmPrompt, Database, FrameDriver, HiddenSurface, KvContributionStore, Notifier,
    PcgRandom, RecordingNotifier, RenderSurface, Rgb, RotatedRect, Session, Stage,
};

/// Nominal frame interval.
const FRAME_MS: f64 = 16.0;
/// How often an animated run re-reads the terminal size.
const SIZE_POLL_MS: f64 = 250.0;
/// Surface units per terminal cell.
const CELL_WIDTH: f64 = 8.0;
const CELL_HEIGHT: f64 = 16.0;

/// State shared between the notifier and the terminal surface, so messages
/// land in the banner row while the confetti owns the screen.
#[derive(Debug, Default)]
struct Screen {
    /// Terminal size in cells.
    size: (usize, usize),
    visible: bool,
    banner: Option<String>,
    held: Vec<String>,
}

/// Prints each message on its own line, or into the banner while the
/// confetti is on screen. Durations are not applied: lines stay in the
/// scrollback.
pub struct TerminalNotifier {
    screen: Rc<RefCell<Screen>>,
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, message: &str, _duration_ms: u64) {
        let mut screen = self.screen.borrow_mut();
        if screen.visible {
            screen.banner = Some(message.to_string());
            screen.held.push(message.to_string());
        } else {
            println!("» {message}");
        }
    }
}

/// Character-cell canvas drawn with ANSI truecolor escapes.
pub struct TerminalSurface {
    cols: usize,
    rows: usize,
    cells: Vec<Option<Rgb>>,
    screen: Rc<RefCell<Screen>>,
    /// Set after a resize so the next frame wipes stale cells.
    repaint: bool,
}

impl TerminalSurface {
    fn new(cols: usize, rows: usize, screen: Rc<RefCell<Screen>>) -> Self {
        screen.borrow_mut().size = (cols, rows);
        Self {
            cols,
            rows,
            cells: vec![None; cols * rows],
            screen,
            repaint: false,
        }
    }

    /// Pick up a size change published through the shared screen.
    fn sync_size(&mut self) {
        let (cols, rows) = self.screen.borrow().size;
        if (cols, rows) != (self.cols, self.rows) {
            self.cols = cols;
            self.rows = rows;
            self.cells = vec![None; cols * rows];
            self.repaint = true;
        }
    }

    fn plot(&mut self, col: isize, row: isize, color: Rgb) {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return;
        }
        self.cells[row as usize * self.cols + col as usize] = Some(color);
    }
}

impl RenderSurface for TerminalSurface {
    fn width(&self) -> f64 {
        self.screen.borrow().size.0 as f64 * CELL_WIDTH
    }

    fn height(&self) -> f64 {
        self.screen.borrow().size.1 as f64 * CELL_HEIGHT
    }

    fn clear(&mut self) {
        self.sync_size();
        self.cells.iter_mut().for_each(|c| *c = None);
    }

    fn fill_rotated_rect(&mut self, rect: RotatedRect) {
        let (sin, cos) = rect.rotation.sin_cos();
        let half_w = rect.width / 2.0;
        let half_h = rect.height / 2.0;
        let reach = half_w.hypot(half_h);

        let col_lo = ((rect.x - reach) / CELL_WIDTH).floor() as isize;
        let col_hi = ((rect.x + reach) / CELL_WIDTH).floor() as isize;
        let row_lo = ((rect.y - reach) / CELL_HEIGHT).floor() as isize;
        let row_hi = ((rect.y + reach) / CELL_HEIGHT).floor() as isize;

        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                let dx = (col as f64 + 0.5) * CELL_WIDTH - rect.x;
                let dy = (row as f64 + 0.5) * CELL_HEIGHT - rect.y;
                let lx = dx * cos + dy * sin;
                let ly = -dx * sin + dy * cos;
                if lx.abs() <= half_w && ly.abs() <= half_h {
                    self.plot(col, row, rect.color);
                }
            }
        }
        // Pieces smaller than a cell still show up.
        self.plot(
            (rect.x / CELL_WIDTH).floor() as isize,
            (rect.y / CELL_HEIGHT).floor() as isize,
            rect.color,
        );
    }

    fn set_visible(&mut self, visible: bool) {
        let mut out = std::io::stdout().lock();
        let held = {
            let mut screen = self.screen.borrow_mut();
            screen.visible = visible;
            if visible {
                Vec::new()
            } else {
                screen.banner = None;
                std::mem::take(&mut screen.held)
            }
        };
        if visible {
            let _ = write!(out, "\x1b[?25l\x1b[2J");
        } else {
            let _ = write!(out, "\x1b[2J\x1b[H\x1b[?25h");
            for message in held {
                let _ = writeln!(out, "» {message}");
            }
        }
        let _ = out.flush();
    }

    fn present(&mut self) {
        if !self.screen.borrow().visible {
            return;
        }
        let banner = self.screen.borrow().banner.clone().unwrap_or_default();
        let mut frame = String::with_capacity(self.cols * self.rows * 4);
        if std::mem::take(&mut self.repaint) {
            frame.push_str("\x1b[2J");
        }
        frame.push_str("\x1b[H");
        for row in 0..self.rows {
            if row + 1 == self.rows {
                frame.push_str("\x1b[0m\x1b[1m");
                frame.extend(banner.chars().take(self.cols));
                frame.push_str("\x1b[0m\x1b[K");
                break;
            }
            for col in 0..self.cols {
                match self.cells[row * self.cols + col] {
                    Some(c) => frame.push_str(&format!("\x1b[38;2;{};{};{}m█", c.r, c.g, c.b)),
                    None => frame.push(' '),
                }
            }
            frame.push_str("\x1b[0m\r\n");
        }
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(frame.as_bytes());
        let _ = out.flush();
    }
}

/// Records frame requests for the drive loop.
#[derive(Clone, Default)]
pub struct FramePump {
    requested: Rc<Cell<bool>>,
}

impl FramePump {
    /// Consume an outstanding request.
    pub fn take(&self) -> bool {
        self.requested.replace(false)
    }
}

impl FrameDriver for FramePump {
    fn request_frame(&mut self) {
        self.requested.set(true);
    }

    fn cancel_frame(&mut self) {
        self.requested.set(false);
    }
}

/// Reads a y/N answer from stdin.
pub struct StdinPrompt;

impl ConfirmPrompt for StdinPrompt {
    fn confirm(&mut self, message: &str) -> bool {
        eprint!("{message} [y/N] ");
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Wall clock for interactive runs, or a synthetic one that advances a
/// fixed step per frame without sleeping.
pub enum Clock {
    Real(Instant),
    Synthetic(f64),
}

impl Clock {
    pub fn now(&self) -> f64 {
        match self {
            Clock::Real(start) => start.elapsed().as_secs_f64() * 1000.0,
            Clock::Synthetic(t) => *t,
        }
    }

    fn advance(&mut self) -> f64 {
        match self {
            Clock::Real(_) => std::thread::sleep(Duration::from_millis(FRAME_MS as u64)),
            Clock::Synthetic(t) => *t += FRAME_MS,
        }
        self.now()
    }
}

/// How output is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Confetti drawn in the terminal.
    Animated,
    /// Plain lines, confetti simulated off screen.
    Plain,
    /// Messages collected for JSON output.
    Json,
}

impl Mode {
    pub fn select(json: bool, no_animation: bool) -> Self {
        if json {
            Mode::Json
        } else if no_animation || !std::io::stdout().is_terminal() {
            Mode::Plain
        } else {
            Mode::Animated
        }
    }
}

/// A session wired to this terminal.
pub struct Host {
    pub session: Session,
    pub frames: FramePump,
    pub clock: Clock,
    pub messages: RecordingNotifier,
    mode: Mode,
    screen: Rc<RefCell<Screen>>,
}

impl Host {
    pub fn open(mode: Mode) -> Result<Self> {
        let config = Config::load()?;
        let store = KvContributionStore::new(Database::open()?, config.storage.key.clone());
        Self::with_store(config, store, mode)
    }

    pub fn with_store(config: Config, store: KvContributionStore, mode: Mode) -> Result<Self> {
        let frames = FramePump::default();
        let messages = RecordingNotifier::new();
        let (cols, rows) = terminal_size();
        let screen = Rc::new(RefCell::new(Screen {
            size: (cols, rows),
            ..Screen::default()
        }));
        debug!(?mode, cols, rows, "opening session");

        let surface: Box<dyn RenderSurface> = match mode {
            Mode::Animated => Box::new(TerminalSurface::new(cols, rows, screen.clone())),
            Mode::Plain | Mode::Json => Box::new(HiddenSurface::new(
                cols as f64 * CELL_WIDTH,
                rows as f64 * CELL_HEIGHT,
            )),
        };
        let stage = Stage {
            surface,
            frames: Box::new(frames.clone()),
            rng: Box::new(PcgRandom::from_entropy()),
        };
        let clock = match mode {
            Mode::Animated => Clock::Real(Instant::now()),
            Mode::Plain | Mode::Json => Clock::Synthetic(0.0),
        };

        let session = match mode {
            Mode::Json => Session::new(config, store, messages.clone(), stage)?,
            Mode::Animated | Mode::Plain => Session::new(
                config,
                store,
                TerminalNotifier {
                    screen: screen.clone(),
                },
                stage,
            )?,
        };

        Ok(Self {
            session,
            frames,
            clock,
            messages,
            mode,
            screen,
        })
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Publish a new terminal size to the surface and the running batch.
    pub fn apply_size(&mut self, cols: usize, rows: usize) {
        {
            let mut screen = self.screen.borrow_mut();
            if screen.size == (cols, rows) {
                return;
            }
            screen.size = (cols, rows);
        }
        debug!(cols, rows, "terminal resized");
        self.session
            .resize(cols as f64 * CELL_WIDTH, rows as f64 * CELL_HEIGHT);
    }

    /// Run frames and announcement ticks until nothing is outstanding.
    pub fn drive(&mut self) {
        let mut frames = 0u64;
        let mut next_size_poll = self.clock.now() + SIZE_POLL_MS;
        while self.session.is_busy() {
            let now = self.clock.advance();
            if self.mode == Mode::Animated && now >= next_size_poll {
                let (cols, rows) = terminal_size();
                self.apply_size(cols, rows);
                next_size_poll = now + SIZE_POLL_MS;
            }
            if self.frames.take() {
                self.session.frame(now);
                frames += 1;
            }
            self.session.tick(now);
        }
        if frames > 0 {
            debug!(frames, elapsed_ms = self.clock.now(), "host loop idle");
        }
    }
}

/// Terminal size in cells. `COLUMNS`/`LINES` win when set, then the
/// controlling terminal as reported by `stty size`, then 80x24.
fn terminal_size() -> (usize, usize) {
    let read = |name: &str| {
        std::env::var(name)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n >= 2)
    };
    let tty = tty_size();
    let cols = read("COLUMNS").or(tty.map(|(c, _)| c)).unwrap_or(80);
    let rows = read("LINES").or(tty.map(|(_, r)| r)).unwrap_or(24);
    (cols, rows)
}

fn tty_size() -> Option<(usize, usize)> {
    let tty = std::fs::File::open("/dev/tty").ok()?;
    let output = std::process::Command::new("stty")
        .arg("size")
        .stdin(tty)
        .stderr(std::process::Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_stty_size(&String::from_utf8_lossy(&output.stdout))
}

/// Parse `stty size` output: `<rows> <cols>`.
fn parse_stty_size(text: &str) -> Option<(usize, usize)> {
    let mut parts = text.split_whitespace().map(str::parse::<usize>);
    let rows = parts.next()?.ok()?;
    let cols = parts.next()?.ok()?;
    (rows >= 2 && cols >= 2).then_some((cols, rows))
}
