//! Layout and drawing: board, sidebar, pause and game-over overlays, tachyonfx effects.

use crate::game::{ARENA_HEIGHT, ARENA_WIDTH, EMPTY, Snapshot};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each arena cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const BOARD_OUTER_WIDTH: u16 = ARENA_WIDTH as u16 * CELL_WIDTH + 2;
const BOARD_OUTER_HEIGHT: u16 = ARENA_HEIGHT as u16 + 2;
const SIDEBAR_WIDTH: u16 = 24;

const GAME_OVER_FADE_MS: u32 = 900;
const CLEAR_FLASH_MS: u32 = 350;

/// Running tachyonfx effects and the frame time they were last advanced.
pub struct Effects {
    enabled: bool,
    game_over: Option<Effect>,
    clear_flash: Option<Effect>,
    last_frame: Option<Instant>,
}

impl Effects {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            game_over: None,
            clear_flash: None,
            last_frame: None,
        }
    }

    /// Board fades to the dim colour and stays there.
    pub fn on_game_over(&mut self, theme: &Theme) {
        if self.enabled {
            self.game_over = Some(fx::fade_to(
                theme.dim,
                theme.bg,
                (GAME_OVER_FADE_MS, Interpolation::Linear),
            ));
        }
    }

    /// Stats panel flashes from the title colour.
    pub fn on_clear(&mut self, theme: &Theme) {
        if self.enabled {
            self.clear_flash = Some(fx::fade_from(
                theme.title,
                theme.bg,
                (CLEAR_FLASH_MS, Interpolation::Linear),
            ));
        }
    }

    pub fn reset(&mut self) {
        self.game_over = None;
        self.clear_flash = None;
    }

    fn frame_delta(&mut self, now: Instant) -> TfxDuration {
        let delta = self
            .last_frame
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        self.last_frame = Some(now);
        TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32)
    }
}

/// Board and sidebar rects, centered in `area`.
fn layout(area: Rect) -> (Rect, Rect) {
    let total_w = BOARD_OUTER_WIDTH + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_OUTER_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_OUTER_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);
    (inner[0], inner[1])
}

/// Draw one frame from the snapshot.
pub fn draw(frame: &mut Frame, snap: &Snapshot, theme: &Theme, effects: &mut Effects, now: Instant) {
    let delta = effects.frame_delta(now);
    let (board_area, sidebar_area) = layout(frame.area());

    let board_inner = draw_board(frame, snap, theme, board_area);
    let stats_area = draw_sidebar(frame, snap, theme, sidebar_area);

    if let Some(effect) = effects.clear_flash.as_mut() {
        frame.render_effect(effect, stats_area, delta);
        if effect.done() {
            effects.clear_flash = None;
        }
    }
    if let Some(effect) = effects.game_over.as_mut() {
        frame.render_effect(effect, board_inner, delta);
    }

    if snap.game_over {
        draw_game_over(frame, snap, theme, board_area);
    } else if snap.paused {
        draw_pause_overlay(frame, theme, board_area);
    }
}

/// Returns the inner (cell) rect of the board.
fn draw_board(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border).bg(theme.bg))
        .title(Span::styled(" blockdrop ", theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let buf = frame.buffer_mut();
    for y in 0..ARENA_HEIGHT {
        for x in 0..ARENA_WIDTH {
            let cell = snap.cell(x, y);
            let (symbol, style) = if cell == EMPTY {
                (" ", Style::default().bg(theme.bg))
            } else {
                ("█", Style::default().fg(theme.cell_color(cell)).bg(theme.bg))
            };
            let ry = inner.y + y as u16;
            for dx in 0..CELL_WIDTH {
                let rx = inner.x + x as u16 * CELL_WIDTH + dx;
                if rx < inner.x + inner.width && ry < inner.y + inner.height {
                    buf[(rx, ry)].set_symbol(symbol).set_style(style);
                }
            }
        }
    }
    inner
}

/// Returns the stats rect (target of the clear flash).
fn draw_sidebar(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect) -> Rect {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.fg);
    let border_style = Style::default().fg(theme.border).bg(theme.bg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Stats
            Constraint::Length(1), // gap
            Constraint::Length(3), // Last clear
            Constraint::Length(1), // gap
            Constraint::Length(9), // Controls
        ])
        .split(area);

    let stat = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(label, title_style),
            Span::styled(value, fg_style),
        ])
    };

    let stats_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let stats_inner = stats_block.inner(chunks[0]);
    stats_block.render(chunks[0], frame.buffer_mut());
    Paragraph::new(Text::from(vec![
        stat("Score: ", snap.score.to_string()),
        stat("Level: ", snap.level.to_string()),
        stat("Lines: ", snap.lines.to_string()),
        stat("Speed: ", format!("{} ms", snap.drop_interval_ms)),
        stat("Piece: ", format!("{:?}", snap.kind)),
    ]))
    .render(stats_inner, frame.buffer_mut());

    let last = snap.last_sweep;
    let clear_line = if last.rows == 0 {
        Line::from(Span::styled("Clear: -", fg_style))
    } else {
        stat(
            "Clear: ",
            format!("+{} ({} row{})", last.points, last.rows, if last.rows == 1 { "" } else { "s" }),
        )
    };
    Paragraph::new(clear_line)
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .render(chunks[2], frame.buffer_mut());

    let controls = [
        ("←/h →/l", "move"),
        ("↑/k/spc", "rotate"),
        ("↓/j", "drop"),
        ("p", "pause"),
        ("r/Enter", "restart"),
        ("q/Esc", "quit"),
    ];
    let mut lines = vec![Line::from(Span::styled("Controls", title_style))];
    lines.extend(controls.iter().map(|(keys, what)| {
        Line::from(vec![
            Span::styled(format!("{keys:<9}"), title_style),
            Span::styled(*what, fg_style),
        ])
    }));
    Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .render(chunks[4], frame.buffer_mut());

    chunks[0]
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 20, 5);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(Span::styled(" P — Resume ", Style::default().fg(theme.fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, snap: &Snapshot, theme: &Theme, area: Rect) {
    let popup = centered_popup(area, 20, 8);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", snap.score),
            Style::default().fg(theme.fg).bold(),
        )),
        Line::from(Span::styled(
            format!(" Level {}  Lines {} ", snap.level, snap.lines),
            Style::default().fg(theme.fg),
        )),
        Line::from(Span::styled(" R — Restart ", Style::default().fg(theme.fg))),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border).bg(theme.bg)),
        )
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameState;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render(state: &GameState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(60, 26)).unwrap();
        let theme = Theme::default();
        let mut effects = Effects::new(false);
        terminal
            .draw(|f| draw(f, &state.snapshot(), &theme, &mut effects, Instant::now()))
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        buf.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_layout_fits_board_and_sidebar() {
        let (board, sidebar) = layout(Rect::new(0, 0, 80, 30));
        assert_eq!((board.width, board.height), (BOARD_OUTER_WIDTH, BOARD_OUTER_HEIGHT));
        assert_eq!(sidebar.x, board.x + board.width);
    }

    #[test]
    fn test_draws_score_and_piece() {
        let state = GameState::with_seed(3);
        let out = render(&state);
        assert!(out.contains("Score: 0"));
        assert!(out.contains("Level: 1"));
        assert!(out.contains("██"));
        assert!(!out.contains("Game Over"));
    }

    #[test]
    fn test_pause_overlay() {
        let mut state = GameState::with_seed(3);
        state.toggle_pause();
        assert!(render(&state).contains("Paused"));
    }
}
