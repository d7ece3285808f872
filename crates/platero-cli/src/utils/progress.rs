use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use platero::engine::progress::{Progress, ProgressCallback};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

const SPINNER_TICK: Duration = Duration::from_millis(100);

/// Draws workflow events on stderr and tallies the plates and notes a run reported.
///
/// Clones share the bar and the tallies, so a clone can be handed to a blocking task while
/// the original reads the counts afterwards.
#[derive(Clone)]
pub struct CliProgressHandler {
    bar: ProgressBar,
    phases: Arc<AtomicUsize>,
    skipped: Arc<AtomicUsize>,
    notes: Arc<AtomicUsize>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target).with_style(spinner_style());
        Self {
            bar,
            phases: Arc::new(AtomicUsize::new(0)),
            skipped: Arc::new(AtomicUsize::new(0)),
            notes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Plates reported as skipped so far.
    pub fn skipped_count(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn note_count(&self) -> usize {
        self.notes.load(Ordering::Relaxed)
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = self.clone();
        Box::new(move |progress: Progress| handler.handle(progress))
    }

    fn handle(&self, progress: Progress) {
        let bar = &self.bar;
        match progress {
            Progress::PhaseStart { name } => {
                let number = self.phases.fetch_add(1, Ordering::Relaxed) + 1;
                bar.reset();
                bar.set_length(0);
                bar.set_style(spinner_style());
                bar.set_message(format!("[{}] {}", number, name));
                bar.enable_steady_tick(SPINNER_TICK);
            }
            Progress::PhaseFinish => {
                bar.disable_steady_tick();
                bar.finish_with_message(format!("✓ {}", bar.message()));
            }
            Progress::TaskStart { total_steps } => {
                bar.disable_steady_tick();
                bar.reset();
                bar.set_length(total_steps);
                bar.set_style(bar_style());
            }
            Progress::TaskIncrement => bar.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = bar.length() {
                    bar.set_position(length);
                }
            }
            Progress::PlateSkipped { name } => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                bar.println(format!("  ⚠ skipped {}", name));
            }
            Progress::Message(message) => {
                self.notes.fetch_add(1, Ordering::Relaxed);
                bar.println(format!("  ⚠ {}", message));
            }
        }
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("  {msg} {wide_bar:.cyan/blue} {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn hidden() -> CliProgressHandler {
        CliProgressHandler::with_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn phases_are_numbered_and_marked_done() {
        let handler = hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart { name: "Discovery" });
        callback(Progress::PhaseFinish);
        assert_eq!(handler.bar.message(), "✓ [1] Discovery");

        callback(Progress::PhaseStart {
            name: "Interpretation",
        });
        assert_eq!(handler.bar.message(), "[2] Interpretation");
        assert!(!handler.bar.is_finished());

        callback(Progress::TaskStart { total_steps: 3 });
        callback(Progress::TaskIncrement);
        callback(Progress::TaskIncrement);
        assert_eq!(handler.bar.length(), Some(3));
        assert_eq!(handler.bar.position(), 2);

        callback(Progress::TaskFinish);
        assert_eq!(handler.bar.position(), 3);

        callback(Progress::PhaseFinish);
        assert!(handler.bar.is_finished());
        assert_eq!(handler.bar.message(), "✓ [2] Interpretation");
    }

    #[test]
    fn skipped_plates_and_notes_are_tallied() {
        let handler = hidden();
        assert_eq!((handler.skipped_count(), handler.note_count()), (0, 0));

        let callback = handler.get_callback();
        callback(Progress::PlateSkipped {
            name: "plate_00003_b01_p02_results.csv".to_string(),
        });
        callback(Progress::Message(
            "1 interaction(s) were measured on more than one plate".to_string(),
        ));

        assert_eq!(handler.skipped_count(), 1);
        assert_eq!(handler.note_count(), 1);
    }

    #[test]
    fn tallies_are_shared_across_threads() {
        let handler = hidden();
        let workers: Vec<_> = (0..4)
            .map(|i| {
                let callback = handler.get_callback();
                thread::spawn(move || {
                    callback(Progress::PlateSkipped {
                        name: format!("plate_0000{}_b01_p02_results.csv", i),
                    });
                    callback(Progress::TaskIncrement);
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(handler.skipped_count(), 4);
        assert_eq!(handler.bar.position(), 4);
    }
}
