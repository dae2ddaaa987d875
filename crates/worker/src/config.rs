use anyhow::bail;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub use common::Environment;

/// Worker run configuration.
///
/// Constructed as a command line by the supervisor when it spawns a worker;
/// also usable by hand for standalone runs.
#[derive(Parser, Debug)]
#[command(name = "worker", about = "Isolated spellcaster worker process")]
pub struct WorkerArgs {
    /// Operating mode the supervisor selected for this worker.
    #[arg(long, value_enum)]
    pub mode: RunMode,

    /// Name of the spell being recorded. Required in training mode.
    #[arg(long)]
    pub spell: Option<String>,

    #[arg(long, value_enum, default_value_t = ExitPolicy::Signal)]
    pub exit: ExitPolicy,

    #[arg(long, value_enum, default_value_t = VisualizerKind::Channel)]
    pub visualizer: VisualizerKind,

    /// V4L2 device index to capture from.
    #[arg(long, default_value_t = 0)]
    pub device: u32,

    /// Root directory for training samples (one subdirectory per spell).
    #[arg(long, default_value = "data/gestures")]
    pub samples_dir: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Inference,
    Training,
    Debug,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Stop on SIGTERM/SIGINT (the supervisor's termination path).
    Signal,
    /// Stop when the preview window is closed or `q` is pressed.
    /// Only valid together with the window visualizer.
    Keypress,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualizerKind {
    None,
    Window,
    Channel,
}

impl WorkerArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mode == RunMode::Training
            && self.spell.as_deref().unwrap_or("").trim().is_empty()
        {
            bail!("--spell is required in training mode");
        }
        if self.exit == ExitPolicy::Keypress && self.visualizer != VisualizerKind::Window {
            bail!("--exit keypress requires --visualizer window");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> WorkerArgs {
        WorkerArgs::try_parse_from(std::iter::once("worker").chain(args.iter().copied()))
            .expect("args should parse")
    }

    #[test]
    fn inference_defaults() {
        let args = parse(&["--mode", "inference"]);
        assert_eq!(args.mode, RunMode::Inference);
        assert_eq!(args.exit, ExitPolicy::Signal);
        assert_eq!(args.visualizer, VisualizerKind::Channel);
        assert_eq!(args.device, 0);
        args.validate().unwrap();
    }

    #[test]
    fn training_requires_spell_name() {
        let args = parse(&["--mode", "training"]);
        assert!(args.validate().is_err());

        let args = parse(&["--mode", "training", "--spell", "  "]);
        assert!(args.validate().is_err(), "blank spell names are rejected");

        let args = parse(&["--mode", "training", "--spell", "fireball"]);
        args.validate().unwrap();
    }

    #[test]
    fn keypress_exit_requires_window_visualizer() {
        let args = parse(&["--mode", "debug", "--exit", "keypress"]);
        assert!(args.validate().is_err());

        let args = parse(&[
            "--mode",
            "debug",
            "--exit",
            "keypress",
            "--visualizer",
            "window",
        ]);
        args.validate().unwrap();
    }
}
