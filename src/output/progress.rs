//! Progress reporting for batches
//!
//! A [`ProgressSink`] is notified once when a batch starts, once per
//! completed unit (absent ones included) and once when the batch is done. It
//! only observes; nothing it does feeds back into scheduling.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Observer of batch completions
pub trait ProgressSink: Send + Sync {
    /// A batch of `total` units is about to run
    fn start(&self, total: usize);

    /// One unit completed
    fn advance(&self, label: &str);

    /// Every unit of the batch completed
    fn finish(&self);
}

/// Sink that discards everything (quiet mode)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&self, _total: usize) {}
    fn advance(&self, _label: &str) {}
    fn finish(&self) {}
}

/// Terminal progress bar, one bar per batch
#[derive(Debug, Default)]
pub struct BarProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template("{bar:40} {percent}% | {pos} of {len} | {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█░")
    }

    fn current(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|bar| bar.clone())
    }
}

impl ProgressSink for BarProgress {
    fn start(&self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(Self::style());
        bar.set_message("Processing...");
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn advance(&self, label: &str) {
        if let Some(bar) = self.current() {
            bar.set_message(label.to_string());
            bar.inc(1);
        }
    }

    fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(bar) = slot.take() {
                bar.finish();
            }
        }
    }
}

/// Sink that counts notifications instead of rendering them
///
/// Useful for headless callers and for checking that a batch reported every
/// unit exactly once.
#[derive(Debug, Default)]
pub struct ProgressTally {
    batches: AtomicUsize,
    expected: AtomicUsize,
    completed: AtomicUsize,
    finished: AtomicUsize,
    last_label: Mutex<Option<String>>,
}

impl ProgressTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches started
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    /// Sum of the totals announced by every started batch
    pub fn expected(&self) -> usize {
        self.expected.load(Ordering::SeqCst)
    }

    /// Number of completion notifications received
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Number of batches finished
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn last_label(&self) -> Option<String> {
        self.last_label.lock().ok().and_then(|label| label.clone())
    }
}

impl ProgressSink for ProgressTally {
    fn start(&self, total: usize) {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.expected.fetch_add(total, Ordering::SeqCst);
    }

    fn advance(&self, label: &str) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_label.lock() {
            *last = Some(label.to_string());
        }
    }

    fn finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}
