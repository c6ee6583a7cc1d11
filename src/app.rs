//! App: terminal init, frame loop, elapsed-time tick and key handling.

use crate::GameConfig;
use crate::game::GameState;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui::{self, Effects};
use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// Lowest accepted frame rate; keeps the poll timeout bounded.
const MIN_FRAME_RATE: f64 = 1.0;

pub struct App {
    theme: Theme,
    state: GameState,
    effects: Effects,
    frame_duration: Duration,
    last_frame: Instant,
    /// Sub-millisecond remainder not yet fed to `tick`.
    carry: Duration,
    /// Values seen last frame, to trigger effects on change.
    seen_lines: u32,
    seen_game_over: bool,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Self {
        let state = match config.seed {
            Some(seed) => GameState::with_seed(seed),
            None => GameState::from_entropy(),
        };
        let frame_rate = if config.frame_rate.is_finite() {
            config.frame_rate.max(MIN_FRAME_RATE)
        } else {
            MIN_FRAME_RATE
        };
        Self {
            theme,
            state,
            effects: Effects::new(config.animations),
            frame_duration: Duration::from_secs_f64(1.0 / frame_rate),
            last_frame: Instant::now(),
            carry: Duration::ZERO,
            seen_lines: 0,
            seen_game_over: false,
        }
    }

    /// Whole milliseconds elapsed since the previous frame; the remainder carries over.
    fn elapsed_ms(&mut self, now: Instant) -> u32 {
        let total = self.carry + now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        let ms = total.as_millis().min(u128::from(u32::MAX)) as u32;
        self.carry = total.saturating_sub(Duration::from_millis(u64::from(ms)));
        ms
    }

    /// Start or drop effects when the snapshot crossed a line clear, game over or restart.
    fn sync_effects(&mut self) {
        let snap = self.state.snapshot();
        if snap.lines < self.seen_lines || (self.seen_game_over && !snap.game_over) {
            self.effects.reset();
        } else if snap.lines > self.seen_lines {
            self.effects.on_clear(&self.theme);
        }
        if snap.game_over && !self.seen_game_over {
            self.effects.on_game_over(&self.theme);
        }
        self.seen_lines = snap.lines;
        self.seen_game_over = snap.game_over;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode().context("failed to enable raw mode")?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let mut terminal =
            DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        self.last_frame = Instant::now();
        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;
        log::info!(
            "exit with score {} (game over: {})",
            self.state.snapshot().score,
            self.state.is_game_over()
        );

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            let elapsed = self.elapsed_ms(now);
            self.state.tick(elapsed);
            self.sync_effects();

            terminal.draw(|f| {
                ui::draw(f, &self.state.snapshot(), &self.theme, &mut self.effects, now);
            })?;

            let timeout = self.frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        match key_to_action(key) {
                            Action::Quit => return Ok(()),
                            Action::Game(command) => self.state.apply(command),
                            Action::None => {}
                        }
                    }
                }
                self.sync_effects();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Command;

    fn app() -> App {
        App::new(
            GameConfig {
                seed: Some(11),
                frame_rate: 60.0,
                animations: true,
            },
            Theme::default(),
        )
    }

    #[test]
    fn test_elapsed_ms_carries_remainder() {
        let mut a = app();
        let start = a.last_frame;
        assert_eq!(a.elapsed_ms(start + Duration::from_micros(16_700)), 16);
        assert_eq!(a.elapsed_ms(start + Duration::from_micros(33_400)), 17);
        assert_eq!(a.carry, Duration::from_micros(400));
    }

    #[test]
    fn test_frame_rate_is_clamped() {
        let a = App::new(
            GameConfig {
                seed: Some(1),
                frame_rate: 0.0,
                animations: false,
            },
            Theme::default(),
        );
        assert_eq!(a.frame_duration, Duration::from_secs(1));
    }

    #[test]
    fn test_game_over_effect_cleared_on_restart() {
        let mut a = app();
        a.seen_game_over = true;
        a.effects.on_game_over(&a.theme);
        a.state.apply(Command::Restart);
        a.sync_effects();
        assert!(!a.seen_game_over);
        assert_eq!(a.seen_lines, 0);
    }
}
