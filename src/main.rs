//! blockdrop — falling-block puzzle game in the terminal.

mod app;
mod game;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Options derived from CLI that affect the game loop.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub frame_rate: f64,
    pub animations: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref(), args.log_level)?;
    let theme = match theme::Theme::load(args.theme.as_deref(), args.palette) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("theme not loaded ({e}); using defaults");
            theme::Theme::for_palette(args.palette)
        }
    };
    let config = GameConfig {
        seed: args.seed,
        frame_rate: args.frame_rate,
        animations: !args.no_animation,
    };
    log::info!("starting with {config:?}");
    let mut app = App::new(config, theme);
    app.run()
}

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockdrop",
    version,
    about = "Falling-block puzzle in the terminal. Fill rows to clear them; every extra row in one clear doubles its points.",
    long_about = "blockdrop is a single-player falling-block puzzle on a 10x20 board.\n\n\
        Pieces fall on their own, faster every 500 points. Full rows are cleared: the first row \
        of a clear scores 100, the second 200, the third 400 and so on.\n\n\
        CONTROLS:\n  Left/h      Move left    Right/l    Move right\n  Up/k/Space  Rotate       Down/j     Soft drop\n  \
        P           Pause        R/Enter    Restart\n  Q / Esc     Quit"
)]
pub struct Args {
    /// Seed for the piece generator (random if not set).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (`theme[key]="#RRGGBB"` lines; keys piece_t..piece_z, bg, border, fg, title, dim).
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Target render frames per second; the drop timer runs on wall-clock time regardless.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Disable the game-over fade and the line-clear flash.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (no logging otherwise).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log level for --log-file: off, error, warn, info, debug, trace.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["blockdrop"]);
        assert_eq!(args.seed, None);
        assert_eq!(args.palette, Palette::Normal);
        assert_eq!(args.log_level, LevelFilter::Info);
        assert!(!args.no_animation);
    }

    #[test]
    fn test_args_parse_options() {
        let args = Args::parse_from([
            "blockdrop",
            "--seed",
            "99",
            "--palette",
            "colourblind",
            "--log-level",
            "debug",
            "--no-animation",
        ]);
        assert_eq!(args.seed, Some(99));
        assert_eq!(args.palette, Palette::Colorblind);
        assert_eq!(args.log_level, LevelFilter::Debug);
        assert!(args.no_animation);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
