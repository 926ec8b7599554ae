use std::fmt;
use std::io::Write;

use crossterm::{
    queue,
    style::{self, Color, Stylize},
};

use crate::error::FormatError;
use crate::list::{CellRecord, export_blocks};
use crate::maze::Grid;

/// How one block of the block layout is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Wall,
    Path,
    /// Carved but not walkable
    Void,
}

impl Block {
    /// The width of each block when rendered, in character widths.
    pub const WIDTH: u16 = 2;

    fn from_record(record: &CellRecord) -> Block {
        match (record.is_path, record.is_walkable) {
            (_, true) => Block::Path,
            (true, false) => Block::Void,
            (false, false) => Block::Wall,
        }
    }

    fn ascii(self) -> char {
        match self {
            Block::Wall => '#',
            Block::Path => ' ',
            Block::Void => '.',
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let styled_symbol = match self {
            Block::Wall => "⬜".with(Color::White),
            Block::Path => "  ".with(Color::Reset),
            Block::Void => "··".with(Color::DarkGrey),
        };

        #[cfg(debug_assertions)]
        {
            use unicode_width::UnicodeWidthStr;
            assert_eq!(
                styled_symbol.content().width(),
                Block::WIDTH as usize,
                "Each block must occupy exactly two character widths."
            );
        }

        write!(f, "{}", styled_symbol)
    }
}

/// Rows of blocks of the maze's block layout.
fn block_rows(grid: &Grid) -> Result<Vec<Vec<Block>>, FormatError> {
    let blocks = export_blocks(grid)?;
    Ok(blocks
        .records
        .chunks(blocks.width as usize)
        .map(|row| row.iter().map(Block::from_record).collect())
        .collect())
}

/// The block layout as plain text: `#` for walls, space for paths.
pub fn to_ascii(grid: &Grid) -> Result<String, FormatError> {
    let rows = block_rows(grid)?;
    let mut text = String::new();
    for row in rows {
        text.extend(row.into_iter().map(Block::ascii));
        text.push('\n');
    }
    Ok(text)
}

/// Draws the maze with styled blocks.
pub fn render<W: Write>(grid: &Grid, out: &mut W) -> crate::Result<()> {
    for row in block_rows(grid)? {
        for block in row {
            queue!(out, style::Print(block))?;
        }
        queue!(out, style::Print("\r\n"))?;
    }
    out.flush()?;
    Ok(())
}
