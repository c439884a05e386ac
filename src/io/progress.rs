//! Progress display for batch assembly runs

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;
use std::time::Duration;

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Maps: [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

/// Progress bar over a batch of assembly attempts
///
/// A single attempt finishes too quickly to be worth a bar; the spinner
/// only appears for multi-map batches.
pub struct ProgressManager {
    bar: Option<ProgressBar>,
}

impl ProgressManager {
    /// Create a progress display for `count` assembly runs
    pub fn new(count: usize) -> Self {
        let bar = (count > 1).then(|| {
            let bar = ProgressBar::new(count as u64);
            bar.set_style(BATCH_STYLE.clone());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        });
        Self { bar }
    }

    /// Note the assembly currently being built
    pub fn start_map(&self, assembly: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(assembly.to_string());
        }
    }

    /// Mark one assembly run as finished
    pub fn complete_map(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Tear down the display
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
