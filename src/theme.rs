//! Theme loading: `theme[key]="#RRGGBB"` lines and hex → ratatui Color.

use crate::game::Cell;
use ratatui::style::Color;
use std::path::Path;
use thiserror::Error;

/// Piece colours (by colour id 1..=7) plus UI colours.
#[derive(Debug, Clone)]
pub struct Theme {
    /// pieces[id - 1]: T, O, L, J, I, S, Z.
    pub pieces: [Color; 7],
    /// Arena background.
    pub bg: Color,
    /// Borders.
    pub border: Color,
    /// Text (score, level).
    pub fg: Color,
    /// Titles and labels.
    pub title: Color,
    /// Board tint once the game is over.
    pub dim: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("unknown theme key: {0}")]
    UnknownKey(String),
}

const PIECE_KEYS: [&str; 7] = ["piece_t", "piece_o", "piece_l", "piece_j", "piece_i", "piece_s", "piece_z"];

impl Default for Theme {
    fn default() -> Self {
        Self {
            pieces: [
                Color::Rgb(0x9B, 0x59, 0xB6), // T purple
                Color::Rgb(0xF1, 0xC4, 0x0F), // O yellow
                Color::Rgb(0xE6, 0x7E, 0x22), // L orange
                Color::Rgb(0x34, 0x98, 0xDB), // J blue
                Color::Rgb(0x1A, 0xBC, 0x9C), // I teal
                Color::Rgb(0x2E, 0xCC, 0x71), // S green
                Color::Rgb(0xE7, 0x4C, 0x3C), // Z red
            ],
            bg: Color::Rgb(0x0B, 0x1F, 0x1A),
            border: Color::Rgb(0x2C, 0x4A, 0x42),
            fg: Color::Rgb(0xEA, 0xFF, 0xF6),
            title: Color::Rgb(0xF1, 0xC4, 0x0F),
            dim: Color::Rgb(0x1E, 0x2A, 0x27),
        }
    }
}

impl Theme {
    /// Default colours with the palette override applied.
    pub fn for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::default();
        t.apply_palette(palette);
        t
    }

    /// Load from a theme file, starting from the defaults. No path means defaults.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = Self::default();
        if let Some(path) = path {
            let s = std::fs::read_to_string(path)?;
            for (key, value) in parse_theme_file(&s) {
                theme.set(&key, parse_hex(&value)?)?;
            }
        }
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn set(&mut self, key: &str, color: Color) -> Result<(), ThemeError> {
        if let Some(i) = PIECE_KEYS.iter().position(|k| *k == key) {
            self.pieces[i] = color;
            return Ok(());
        }
        let slot = match key {
            "bg" => &mut self.bg,
            "border" => &mut self.border,
            "fg" => &mut self.fg,
            "title" => &mut self.title,
            "dim" => &mut self.dim,
            _ => return Err(ThemeError::UnknownKey(key.to_string())),
        };
        *slot = color;
        Ok(())
    }

    /// Piece colours for high-contrast or colorblind play. UI colours are kept.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pieces = [
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x88, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0x00),
                ];
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito style: no red/green pair carries meaning on its own
                self.pieces = [
                    Color::Rgb(0xCC, 0x79, 0xA7),
                    Color::Rgb(0xF0, 0xE4, 0x42),
                    Color::Rgb(0xE6, 0x9F, 0x00),
                    Color::Rgb(0x00, 0x72, 0xB2),
                    Color::Rgb(0x56, 0xB4, 0xE9),
                    Color::Rgb(0x00, 0x9E, 0x73),
                    Color::Rgb(0xD5, 0x5E, 0x00),
                ];
            }
        }
    }

    /// Colour for an arena cell; empty cells use the background.
    #[inline]
    pub fn cell_color(&self, cell: Cell) -> Color {
        match cell {
            1..=7 => self.pieces[usize::from(cell) - 1],
            _ => self.bg,
        }
    }
}

/// `theme[key]="value"` (or single-quoted) lines into (key, value) pairs. `#` starts a comment line.
fn parse_theme_file(s: &str) -> Vec<(String, String)> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse "#RRGGBB" or "#RGB".
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let bad = || ThemeError::InvalidHex(s.to_string());
    let channel = |i: usize, len: usize| {
        hex.get(i..i + len)
            .and_then(|c| u8::from_str_radix(c, 16).ok())
            .ok_or_else(bad)
    };
    match hex.len() {
        6 => Ok(Color::Rgb(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
        3 => Ok(Color::Rgb(channel(0, 1)? * 17, channel(1, 1)? * 17, channel(2, 1)? * 17)),
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Palette;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#9B59B6").unwrap();
        assert!(matches!(c, Color::Rgb(0x9B, 0x59, 0xB6)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_lines() {
        let pairs = parse_theme_file(
            "# comment\ntheme[bg]=\"#000000\"\n\ntheme[piece_t] = '#FFF'\nnot a theme line\n",
        );
        assert_eq!(
            pairs,
            vec![
                ("bg".to_string(), "#000000".to_string()),
                ("piece_t".to_string(), "#FFF".to_string()),
            ]
        );
    }

    #[test]
    fn test_cell_color_maps_ids() {
        let t = Theme::default();
        assert_eq!(t.cell_color(0), t.bg);
        assert_eq!(t.cell_color(1), t.pieces[0]);
        assert_eq!(t.cell_color(7), t.pieces[6]);
    }

    #[test]
    fn test_load_file_overrides_and_rejects_unknown_keys() {
        let dir = std::env::temp_dir();
        let good = dir.join("blockdrop-theme-good.theme");
        std::fs::write(&good, "theme[piece_z]=\"#010203\"\ntheme[bg]=\"#000\"\n").unwrap();
        let t = Theme::load(Some(&good), Palette::Normal).unwrap();
        assert_eq!(t.pieces[6], Color::Rgb(1, 2, 3));
        assert_eq!(t.bg, Color::Rgb(0, 0, 0));

        let bad = dir.join("blockdrop-theme-bad.theme");
        std::fs::write(&bad, "theme[mem_box]=\"#010203\"\n").unwrap();
        assert!(matches!(
            Theme::load(Some(&bad), Palette::Normal),
            Err(ThemeError::UnknownKey(k)) if k == "mem_box"
        ));
        let _ = std::fs::remove_file(good);
        let _ = std::fs::remove_file(bad);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("blockdrop-theme-does-not-exist.theme");
        assert!(matches!(
            Theme::load(Some(&path), Palette::Normal),
            Err(ThemeError::Io(_))
        ));
    }
}
