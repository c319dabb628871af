//! CLI-specific progress handling for osm-osw
//!
//! One progress bar per feature kind, created the first time the parser of
//! that kind reports.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use osm_osw_reformatter::{FeatureKind, ProgressCallback};

/// Creates a progress bar for CLI display
pub fn create_progress_bar(total: u64, kind: FeatureKind) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {prefix:>8} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%)")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_prefix(kind.to_string());
    pb
}

/// Progress bars of one conversion, keyed by feature kind
#[derive(Default)]
pub struct ProgressManager {
    multi: MultiProgress,
    bars: Mutex<BTreeMap<FeatureKind, ProgressBar>>,
}

impl ProgressManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the bar of `kind` to `visited`, finishing it at `total`
    pub fn update(&self, kind: FeatureKind, visited: u64, total: u64) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let bar = bars
            .entry(kind)
            .or_insert_with(|| self.multi.add(create_progress_bar(total, kind)));
        bar.set_position(visited);
        if visited >= total {
            bar.finish();
        }
    }

    /// Callback feeding this manager, for [`osm_osw_reformatter::ConvertOptions`]
    pub fn callback(self: &Arc<Self>) -> ProgressCallback {
        let manager = Arc::clone(self);
        Arc::new(move |kind, visited, total| manager.update(kind, visited, total))
    }

    pub fn finish(&self) {
        if let Ok(bars) = self.bars.lock() {
            for bar in bars.values() {
                bar.finish();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar() {
        let pb = create_progress_bar(1000, FeatureKind::Way);
        assert_eq!(pb.length(), Some(1000));
        assert_eq!(pb.prefix(), "way");
        pb.set_position(100);
        pb.finish();
    }

    #[test]
    fn test_bars_are_created_per_kind() {
        let manager = Arc::new(ProgressManager::new());
        let callback = manager.callback();
        callback(FeatureKind::Way, 1, 10);
        callback(FeatureKind::Way, 2, 10);
        callback(FeatureKind::Point, 5, 5);

        let bars = manager.bars.lock().unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[&FeatureKind::Way].position(), 2);
        assert!(bars[&FeatureKind::Point].is_finished());
    }
}
