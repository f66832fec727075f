use crossterm::style::{Color, Stylize};

use std::fmt;

/// The kind of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Wall,
    Path,
    Start,
    End,
}

impl CellKind {
    /// The width of each cell when rendered, in character widths.
    pub const CELL_WIDTH: u16 = 2;

    /// Numeric encoding consumed by external renderers:
    /// 0 = Wall, 1 = Path, 2 = Start, 3 = End.
    pub fn code(self) -> u8 {
        match self {
            CellKind::Wall => 0,
            CellKind::Path => 1,
            CellKind::Start => 2,
            CellKind::End => 3,
        }
    }

    /// Inverse of [`CellKind::code`]. Returns `None` for codes outside 0..=3.
    pub fn from_code(code: u8) -> Option<CellKind> {
        match code {
            0 => Some(CellKind::Wall),
            1 => Some(CellKind::Path),
            2 => Some(CellKind::Start),
            3 => Some(CellKind::End),
            _ => None,
        }
    }

    /// Whether a search may step onto this cell.
    pub fn is_open(self) -> bool {
        self != CellKind::Wall
    }
}

/// Overlay marks drawn on top of open cells during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileMark {
    /// A cell revealed by the exploration trace.
    Visited,
    /// A cell on the final route.
    Route,
}

#[cfg(debug_assertions)]
fn assert_cell_width(content: &str) {
    use unicode_width::UnicodeWidthStr;
    assert_eq!(
        content.width(),
        CellKind::CELL_WIDTH as usize,
        "Each cell must occupy exactly two character widths."
    );
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let styled_symbol = match self {
            CellKind::Wall => "⬜".with(Color::White),
            CellKind::Path => "  ".with(Color::Reset),
            CellKind::Start => "🟩".with(Color::Green),
            CellKind::End => "🟥".with(Color::Red),
        };

        #[cfg(debug_assertions)]
        assert_cell_width(styled_symbol.content());

        write!(f, "{}", styled_symbol)
    }
}

impl fmt::Display for TileMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let styled_symbol = match self {
            TileMark::Visited => "* ".with(Color::Blue),
            TileMark::Route => "██".with(Color::Yellow),
        };

        #[cfg(debug_assertions)]
        assert_cell_width(styled_symbol.content());

        write!(f, "{}", styled_symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_codes() {
        assert_eq!(CellKind::Wall.code(), 0);
        assert_eq!(CellKind::Path.code(), 1);
        assert_eq!(CellKind::Start.code(), 2);
        assert_eq!(CellKind::End.code(), 3);
    }

    #[test]
    fn test_code_round_trip() {
        for kind in [CellKind::Wall, CellKind::Path, CellKind::Start, CellKind::End] {
            assert_eq!(CellKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(CellKind::from_code(4), None);
    }

    #[test]
    fn test_only_walls_block() {
        assert!(!CellKind::Wall.is_open());
        assert!(CellKind::Path.is_open());
        assert!(CellKind::Start.is_open());
        assert!(CellKind::End.is_open());
    }
}
