use crate::visualize::PathVisualizer;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// How the capture loop decides it is time to stop.
pub enum ExitCheck {
    /// SIGTERM or SIGINT flips the flag; the loop notices on the next frame.
    /// This is the supervisor's termination path.
    Signal(Arc<AtomicBool>),
    /// Defer to the preview window (closed, or `q` pressed).
    Keypress,
}

impl ExitCheck {
    pub fn signal() -> Result<Self> {
        let flag = Arc::new(AtomicBool::new(false));
        for sig in [
            signal_hook::consts::SIGTERM,
            signal_hook::consts::SIGINT,
        ] {
            signal_hook::flag::register(sig, Arc::clone(&flag))
                .context("Failed to register shutdown signal handler")?;
        }
        Ok(Self::Signal(flag))
    }

    pub fn keypress() -> Self {
        Self::Keypress
    }

    pub fn should_stop(&self, visualizer: &PathVisualizer) -> bool {
        match self {
            Self::Signal(flag) => flag.load(Ordering::Relaxed),
            Self::Keypress => visualizer.quit_requested(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_check_stops_once_flag_is_set() {
        let vis = PathVisualizer::disabled();
        let flag = Arc::new(AtomicBool::new(false));
        let check = ExitCheck::Signal(Arc::clone(&flag));

        assert!(!check.should_stop(&vis));
        flag.store(true, Ordering::Relaxed);
        assert!(check.should_stop(&vis));
    }

    #[test]
    fn keypress_check_follows_the_visualizer() {
        // Headless visualizers never request quit, so a keypress check
        // against one simply never fires.
        let vis = PathVisualizer::disabled();
        assert!(!ExitCheck::keypress().should_stop(&vis));
    }
}
