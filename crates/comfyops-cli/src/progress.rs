//! Terminal progress for weight downloads.
//!
//! Rendered on stderr so stdout carries only results. A terminal gets one
//! indicatif bar per file; anything else gets a throttled status line with
//! a smoothed transfer rate.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use comfyops_download::ProgressCallback;
use indicatif::{HumanBytes, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};

// ============================================================================
// Constants
// ============================================================================

/// Smoothing factor for the exponentially weighted transfer rate.
const RATE_SMOOTHING: f64 = 0.1;

/// Minimum spacing between plain status lines for the same file.
const PLAIN_INTERVAL: Duration = Duration::from_millis(500);

const MAX_LABEL: usize = 40;

// ============================================================================
// Printer
// ============================================================================

/// Progress display that picks a bar or plain lines based on stderr.
pub struct DownloadProgress {
    render: Render,
}

enum Render {
    Bar(BarProgress),
    Plain(PlainProgress),
}

impl DownloadProgress {
    pub fn new() -> Self {
        let render = if io::stderr().is_terminal() {
            Render::Bar(BarProgress::default())
        } else {
            Render::Plain(PlainProgress::default())
        };
        Self { render }
    }

    /// Record `downloaded` of `total` bytes for `path` (`total` 0 = unknown).
    pub fn update(&mut self, path: &Path, downloaded: u64, total: u64) {
        let label = file_label(path);
        match &mut self.render {
            Render::Bar(inner) => inner.update(&label, downloaded, total),
            Render::Plain(inner) => inner.update(&label, downloaded, total),
        }
    }

    /// Clear any bar still on screen.
    pub fn finish(&mut self) {
        match &mut self.render {
            Render::Bar(inner) => inner.finish(),
            Render::Plain(inner) => inner.finish(),
        }
    }

    /// Wrap the printer as a callback for the download manager.
    ///
    /// The returned handle is used to call [`Self::finish`] after the run.
    pub fn into_callback(self) -> (ProgressCallback, Arc<Mutex<Self>>) {
        let shared = Arc::new(Mutex::new(self));
        let sink = Arc::clone(&shared);
        let callback: ProgressCallback = Arc::new(move |path: &Path, downloaded: u64, total: u64| {
            if let Ok(mut printer) = sink.lock() {
                printer.update(path, downloaded, total);
            }
        });
        (callback, shared)
    }
}

impl Default for DownloadProgress {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Terminal Bars (indicatif)
// ============================================================================

#[derive(Default)]
struct BarProgress {
    current: Option<(String, ProgressBar)>,
}

impl BarProgress {
    fn update(&mut self, label: &str, downloaded: u64, total: u64) {
        if self.current.as_ref().is_none_or(|(name, _)| name != label) {
            self.finish();
            self.current = Some((label.to_string(), Self::start(label)));
        }
        let Some((_, bar)) = &self.current else {
            return;
        };

        if total > 0 {
            if bar.length() != Some(total) {
                bar.set_style(bar_style());
                bar.set_length(total);
            }
            bar.set_position(downloaded.min(total));
        } else {
            bar.set_message(format!("{label} ({})", HumanBytes(downloaded)));
        }
    }

    fn start(label: &str) -> ProgressBar {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(spinner_style());
        bar.set_message(label.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }

    fn finish(&mut self) {
        if let Some((_, bar)) = self.current.take() {
            bar.finish_and_clear();
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{msg:40} {bar:28.cyan/blue} {done:>9} / {size:>9} ({percent:>3}%) @ {binary_bytes_per_sec} ETA {eta}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .with_key("done", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
        let _ = write!(w, "{}", HumanBytes(state.pos()));
    })
    .with_key("size", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
        let value = state
            .len()
            .map_or_else(|| "?".to_string(), |len| HumanBytes(len).to_string());
        let _ = write!(w, "{value}");
    })
}

// ============================================================================
// Plain Lines (non-terminal)
// ============================================================================

#[derive(Default)]
struct PlainProgress {
    label: String,
    last_emit: Option<Instant>,
    last_bytes: u64,
    rate: RateEstimate,
}

impl PlainProgress {
    fn update(&mut self, label: &str, downloaded: u64, total: u64) {
        if self.label != label {
            self.label = label.to_string();
            self.last_emit = None;
            self.last_bytes = 0;
            self.rate = RateEstimate::default();
        }

        let now = Instant::now();
        let finished = total > 0 && downloaded >= total;
        if let Some(last) = self.last_emit {
            let elapsed = now.duration_since(last);
            if !finished && elapsed < PLAIN_INTERVAL {
                return;
            }
            self.rate
                .observe(downloaded.saturating_sub(self.last_bytes), elapsed);
        }
        self.last_emit = Some(now);
        self.last_bytes = downloaded;

        eprintln!("{}", plain_line(label, downloaded, total, self.rate.bytes_per_sec()));
    }

    fn finish(&mut self) {
        self.label.clear();
        self.last_emit = None;
    }
}

/// Exponentially weighted bytes-per-second.
#[derive(Default)]
struct RateEstimate {
    value: Option<f64>,
}

impl RateEstimate {
    fn observe(&mut self, bytes: u64, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        if secs <= 0.0 {
            return;
        }
        #[allow(clippy::cast_precision_loss)]
        let sample = bytes as f64 / secs;
        self.value = Some(match self.value {
            Some(prev) => RATE_SMOOTHING.mul_add(sample, (1.0 - RATE_SMOOTHING) * prev),
            None => sample,
        });
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn bytes_per_sec(&self) -> Option<u64> {
        self.value.map(|v| v.max(0.0).round() as u64)
    }
}

fn plain_line(label: &str, downloaded: u64, total: u64, rate: Option<u64>) -> String {
    let mut line = if total > 0 {
        #[allow(clippy::cast_precision_loss)]
        let percent = (downloaded as f64 / total as f64) * 100.0;
        format!(
            "{label}: {} / {} ({percent:.1}%)",
            HumanBytes(downloaded),
            HumanBytes(total)
        )
    } else {
        format!("{label}: {}", HumanBytes(downloaded))
    };

    if let Some(rate) = rate.filter(|r| *r > 0) {
        line.push_str(&format!(" @ {}/s", HumanBytes(rate)));
    }
    line
}

/// File name of the destination, shortened for display.
fn file_label(path: &Path) -> String {
    let raw = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy());

    if raw.chars().count() <= MAX_LABEL {
        return raw.into_owned();
    }
    let mut short: String = raw.chars().take(MAX_LABEL - 1).collect();
    short.push('…');
    short
}
