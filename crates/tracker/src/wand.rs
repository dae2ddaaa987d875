use crate::point::Point;
use std::collections::VecDeque;

/// Tuning knobs for the gesture-path state machine.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// A finished path shorter than this is discarded, not emitted.
    pub min_path_len: usize,
    /// Once the path grows past this, the oldest point is evicted
    /// (sliding window).
    pub max_path_len: usize,
    /// Consecutive point-less frames tolerated before the path is flushed.
    pub patience: u32,
    /// Candidates closer than this to the last point are jitter, rejected.
    pub min_step: f64,
    /// Candidates farther than this from the last point are teleports,
    /// rejected.
    pub max_step: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            min_path_len: 10,
            max_path_len: 60,
            patience: 10,
            min_step: 5.0,
            max_step: 100.0,
        }
    }
}

/// Turns the noisy per-frame stream of detected point candidates into
/// discrete, bounded gesture paths.
///
/// One instance per tracking session, advanced exactly once per frame.
pub struct WandTracker {
    config: TrackerConfig,
    path: VecDeque<Point>,
    empty_frames: u32,
}

impl Default for WandTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl WandTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            path: VecDeque::new(),
            empty_frames: 0,
        }
    }

    /// The evolving path, oldest point first.
    pub fn path(&self) -> impl Iterator<Item = Point> + '_ {
        self.path.iter().copied()
    }

    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    /// Pick the candidate that continues the path, if any.
    ///
    /// On an empty path the first candidate wins - the detector returns
    /// candidates in deterministic scan order, so this is top-left first.
    /// Otherwise candidates must land strictly inside the plausible step
    /// band, and the closest survivor wins.
    fn select_candidate(&self, candidates: &[Point]) -> Option<Point> {
        let last = match self.path.back() {
            Some(last) => *last,
            None => return candidates.first().copied(),
        };

        candidates
            .iter()
            .map(|&c| (c, last.dist(&c)))
            .filter(|&(_, d)| d > self.config.min_step && d < self.config.max_step)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, _)| c)
    }

    /// Advance the state machine by one frame's worth of candidates.
    ///
    /// Returns the finished gesture path when one completes: patience ran
    /// out and the path had reached the minimum length. The path is cleared
    /// on every finish, valid or not.
    pub fn advance(&mut self, candidates: &[Point]) -> Option<Vec<Point>> {
        match self.select_candidate(candidates) {
            Some(point) => {
                self.empty_frames = 0;
                self.path.push_back(point);
                if self.path.len() > self.config.max_path_len {
                    self.path.pop_front();
                }
                None
            }
            None => {
                self.empty_frames += 1;
                if self.empty_frames <= self.config.patience {
                    return None;
                }

                let finished = if self.path.len() >= self.config.min_path_len {
                    let gesture: Vec<Point> = self.path.iter().copied().collect();
                    tracing::debug!(points = gesture.len(), "gesture finished");
                    Some(gesture)
                } else {
                    None
                };

                self.path.clear();
                self.empty_frames = 0;
                finished
            }
        }
    }

    /// Abandon the current path and counters without emitting anything.
    pub fn reset(&mut self) {
        self.path.clear();
        self.empty_frames = 0;
    }
}
