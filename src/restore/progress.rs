// zabbixtool/src/restore/progress.rs
use indicatif::{ProgressBar, ProgressStyle};

/// Restore progress sink, advanced once per completed unit (the schema plus
/// one per data artifact). The hidden variant is a real `ProgressBar` that
/// draws nothing, so the worker loop has no progress branch.
#[derive(Clone)]
pub struct ProgressTracker {
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total: u64, hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
                )
                .expect("static progress template is valid"),
            );
            bar
        };
        ProgressTracker { bar }
    }

    pub fn advance(&self) {
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}
