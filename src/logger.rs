//! Terminal logging with colored prefixes and in-place progress bars.
//!
//! Two pieces live here:
//! - the [`log!`] macro, printing `[module] message` lines with a color
//!   picked per module
//! - [`ProgressBars`], one terminal line per counted task, redrawn in
//!   place through cursor movement
//!
//! Both write to the same stdout. `log` consults the active bar count so
//! its messages land above the bar block, which then redraws below.
//!
//! # Example
//!
//! ```ignore
//! log!("content"; "loaded {} pages", count);
//!
//! let progress = ProgressBars::new(&[("render", 100), ("assets", 50)]);
//! progress.inc_by_name("render");
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Terminal width, measured once on first use.
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Number of bar lines currently on screen.
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Layout Constants
// ============================================================================
//
// One bar line reads: "[render] [████░░░░] 42/100"

/// `[` and `]` around the module name.
const BRACKET_LEN: usize = 2;
/// Space between prefix and bar.
const SPACE_AFTER_PREFIX: usize = 1;
/// Space plus brackets around the bar cells.
const BAR_WRAPPER_LEN: usize = 3;
/// Space between bar and counter.
const SPACE_BEFORE_COUNT: usize = 1;
/// Narrowest bar worth drawing.
const MIN_BAR_WIDTH: usize = 10;
/// Cap so the bar does not span wide terminals.
const MAX_BAR_WIDTH: usize = 40;

/// Display width of `[module] ` for a module name of `module_len` bytes.
#[inline]
const fn prefix_width(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Cached terminal width, 120 columns when detection fails.
fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120)) as usize
}

// ============================================================================
// Log Macro
// ============================================================================

/// Print a message under a colored `[module]` prefix.
///
/// ```ignore
/// log!("render"; "{} pages written", count);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Progress Bars
// ============================================================================

/// A block of progress bars, one terminal line each.
///
/// A mutex keeps concurrent increments from interleaving their cursor
/// movements.
pub struct ProgressBars {
    bars: Vec<ProgressBar>,
    lock: Mutex<()>,
}

/// State of a single bar.
struct ProgressBar {
    /// Name the bar is addressed by in [`ProgressBars::inc_by_name`].
    name: &'static str,
    /// Colored `[name]` prefix.
    prefix: ColoredString,
    /// Display width of the prefix.
    prefix_len: usize,
    /// Item count the bar runs up to.
    total: usize,
    current: AtomicUsize,
    /// Line index inside the bar block, top line first.
    row: usize,
}

impl ProgressBars {
    /// Reserve one terminal line per `(name, total)` pair.
    pub fn new(modules: &[(&'static str, usize)]) -> Self {
        let mut stdout = stdout().lock();
        for _ in 0..modules.len() {
            writeln!(stdout).ok();
        }
        stdout.flush().ok();

        BAR_COUNT.store(modules.len(), Ordering::SeqCst);

        let bars = modules
            .iter()
            .enumerate()
            .map(|(row, (name, total))| ProgressBar {
                name,
                prefix: colorize_prefix(name),
                prefix_len: prefix_width(name.len()),
                total: *total,
                current: AtomicUsize::new(0),
                row,
            })
            .collect();

        Self {
            bars,
            lock: Mutex::new(()),
        }
    }

    /// Like [`ProgressBars::new`], but bars with a zero total are left
    /// out, and `None` comes back when there is at most one item to
    /// count overall.
    pub fn new_filtered(modules: &[(&'static str, usize)]) -> Option<Self> {
        let kept: Vec<_> = modules
            .iter()
            .filter(|(_, total)| *total > 0)
            .copied()
            .collect();
        let combined: usize = kept.iter().map(|(_, total)| total).sum();

        (combined > 1).then(|| Self::new(&kept))
    }

    /// Advance the bar registered under `name` by one.
    #[inline]
    pub fn inc_by_name(&self, name: &str) {
        if let Some(bar) = self.bars.iter().find(|bar| bar.name == name) {
            let current = bar.current.fetch_add(1, Ordering::Relaxed) + 1;
            self.redraw(bar, current);
        }
    }

    /// Redraw one bar line at its row inside the block.
    fn redraw(&self, bar: &ProgressBar, current: usize) {
        let _guard = self.lock.lock().ok();

        let counter = format!("{}/{}", current, bar.total);
        let overhead = bar.prefix_len + BAR_WRAPPER_LEN + SPACE_BEFORE_COUNT + counter.len();
        let bar_cols = terminal_width()
            .saturating_sub(overhead)
            .clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH);

        let filled = if bar.total > 0 {
            (current * bar_cols) / bar.total
        } else {
            0
        };
        let cells = "█".repeat(filled) + &"░".repeat(bar_cols.saturating_sub(filled));

        let mut stdout = stdout().lock();
        #[allow(clippy::cast_possible_truncation)] // bar blocks stay tiny
        let lines_up = (self.bars.len() - bar.row) as u16;
        execute!(stdout, cursor::MoveUp(lines_up)).ok();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} [{}] {}", bar.prefix, cells, counter).ok();
        execute!(stdout, cursor::MoveDown(lines_up)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }

    /// Wipe the bar block off the terminal.
    #[allow(clippy::cast_possible_truncation)] // bar blocks stay tiny
    pub fn finish(&self) {
        BAR_COUNT.store(0, Ordering::SeqCst);
        let _guard = self.lock.lock().ok();

        let mut stdout = stdout().lock();
        let height = self.bars.len() as u16;

        execute!(stdout, cursor::MoveUp(height)).ok();
        for _ in &self.bars {
            execute!(stdout, Clear(ClearType::CurrentLine)).ok();
            execute!(stdout, cursor::MoveDown(1)).ok();
        }
        execute!(stdout, cursor::MoveUp(height)).ok();
        stdout.flush().ok();
    }
}

impl Drop for ProgressBars {
    fn drop(&mut self) {
        self.finish();
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Print `message` under the colored `[module]` prefix.
///
/// Single-line messages are truncated to the terminal width; multiline
/// messages go out whole. With an active bar block the message is
/// written above it and blank lines are left for the bars to redraw
/// into.
#[inline]
#[allow(clippy::cast_possible_truncation)] // bar blocks stay tiny
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    let bar_count = BAR_COUNT.load(Ordering::SeqCst);
    if bar_count > 0 {
        execute!(stdout, cursor::MoveUp(bar_count as u16)).ok();
        execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
    } else {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    if message.contains('\n') {
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        let room = terminal_width().saturating_sub(prefix_width(module.len()));
        writeln!(stdout, "{prefix} {}", truncate_str(message, room)).ok();
    }

    for _ in 0..bar_count {
        writeln!(stdout).ok();
    }

    stdout.flush().ok();
}

/// Color a `[module]` prefix by module name.
#[inline]
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "render" => prefix.bright_blue().bold(),
        "i18n" => prefix.bright_green().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Cut a string to at most `max_len` bytes on a character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================
