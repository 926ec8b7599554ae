//! The list exchange format: one record per cell, row-major, carrying only the cell flags.
//!
//! Open directions are not part of the format. On import two adjacent path cells are
//! always connected, so a per-cell export of a carved maze comes back fully open.
//! [`export_blocks`] writes the wall-block layout instead, which imports back to the
//! same connectivity.

use crate::error::FormatError;
use crate::maze::{Coord, Direction, Grid};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CellRecord {
    pub coord: Coord,
    pub is_path: bool,
    pub is_walkable: bool,
    pub active_path: bool,
}

/// A list maze with its declared dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMaze {
    pub width: u16,
    pub height: u16,
    pub records: Vec<CellRecord>,
}

impl ListMaze {
    pub fn into_grid(self) -> Result<Grid, FormatError> {
        import(&self.records, self.width, self.height)
    }

    /// Parses the text format and takes the dimensions from the largest coordinates.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let records = parse_text(text)?;
        let (width, height) = infer_dimensions(&records)?;
        Ok(ListMaze {
            width,
            height,
            records,
        })
    }

    pub fn to_text(&self) -> String {
        to_text(&self.records)
    }
}

/// One record per cell in row-major order.
pub fn export(grid: &Grid) -> ListMaze {
    let records = grid
        .coords()
        .map(|coord| {
            let cell = &grid[coord];
            CellRecord {
                coord,
                is_path: cell.is_path,
                is_walkable: cell.is_walkable,
                active_path: cell.active_path,
            }
        })
        .collect();
    ListMaze {
        width: grid.width(),
        height: grid.height(),
        records,
    }
}

/// Rebuilds a grid from records in any order. Adjacent path cells are connected.
pub fn import(records: &[CellRecord], width: u16, height: u16) -> Result<Grid, FormatError> {
    let expected = width as usize * height as usize;
    if records.len() != expected {
        return Err(FormatError::RecordCount {
            expected,
            found: records.len(),
        });
    }

    let mut grid = Grid::new(width, height);
    let mut seen = vec![false; expected];
    for (index, record) in records.iter().enumerate() {
        if !grid.is_in_bounds(record.coord) {
            return Err(FormatError::OutOfBounds {
                index,
                coord: record.coord,
                width,
                height,
            });
        }
        let idx = grid.ravel_index(record.coord);
        if seen[idx] {
            return Err(FormatError::Duplicate {
                index,
                coord: record.coord,
            });
        }
        seen[idx] = true;

        let cell = &mut grid[record.coord];
        cell.is_path = record.is_path;
        cell.is_walkable = record.is_walkable;
        cell.active_path = record.active_path;
    }

    for coord in grid.coords() {
        if !grid[coord].is_path {
            continue;
        }
        for direction in [Direction::E, Direction::S] {
            match grid.neighbor(coord, direction) {
                Some(next) if grid[next].is_path => {
                    grid.open_wall(coord, direction);
                }
                _ => {}
            }
        }
    }
    tracing::debug!(
        "[list] imported {}x{} maze with {} connections",
        width,
        height,
        grid.edge_count()
    );
    Ok(grid)
}

/// The maze drawn as wall and path blocks: cell `(x, y)` sits at block `(2x+1, 2y+1)` and
/// the block between two cells is a path when the wall between them is open. Walls opened
/// through the grid edge show on both border blocks.
pub fn export_blocks(grid: &Grid) -> Result<ListMaze, FormatError> {
    let too_large = || FormatError::TooLarge {
        width: grid.width(),
        height: grid.height(),
    };
    let width = grid
        .width()
        .checked_mul(2)
        .and_then(|w| w.checked_add(1))
        .ok_or_else(too_large)?;
    let height = grid
        .height()
        .checked_mul(2)
        .and_then(|h| h.checked_add(1))
        .ok_or_else(too_large)?;

    let block = |bx: u16, by: u16| -> (bool, bool) {
        match (bx % 2 == 1, by % 2 == 1) {
            (true, true) => {
                let cell = &grid[(bx / 2, by / 2)];
                (cell.is_path, cell.is_walkable)
            }
            (false, true) => {
                // Wall between columns bx/2 - 1 and bx/2
                let y = by / 2;
                let open = if bx == 0 {
                    grid[(0, y)].is_open(Direction::W)
                } else {
                    grid[(bx / 2 - 1, y)].is_open(Direction::E)
                };
                (open, open)
            }
            (true, false) => {
                // Wall between rows by/2 - 1 and by/2
                let x = bx / 2;
                let open = if by == 0 {
                    grid[(x, 0)].is_open(Direction::N)
                } else {
                    grid[(x, by / 2 - 1)].is_open(Direction::S)
                };
                (open, open)
            }
            // Corner posts are always walls
            (false, false) => (false, false),
        }
    };

    let records = (0..height)
        .flat_map(|by| (0..width).map(move |bx| (bx, by)))
        .map(|(bx, by)| {
            let (is_path, is_walkable) = block(bx, by);
            CellRecord {
                coord: (bx, by),
                is_path,
                is_walkable,
                active_path: false,
            }
        })
        .collect();
    Ok(ListMaze {
        width,
        height,
        records,
    })
}

/// `x,y,is_path,is_walkable` per line with `1`/`0` flags.
pub fn to_text(records: &[CellRecord]) -> String {
    let mut text = String::with_capacity(records.len() * 12);
    for r in records {
        text.push_str(&format!(
            "{},{},{},{}\n",
            r.coord.0, r.coord.1, r.is_path as u8, r.is_walkable as u8
        ));
    }
    text
}

/// Parses the text format. Blank lines and `#` comments are skipped.
pub fn parse_text(text: &str) -> Result<Vec<CellRecord>, FormatError> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_no, line)| parse_record(line_no, line))
        .collect()
}

fn parse_record(line: usize, text: &str) -> Result<CellRecord, FormatError> {
    let fail = |reason: String| FormatError::Parse { line, reason };
    let fields = text.split(',').map(str::trim).collect::<Vec<_>>();
    if fields.len() != 4 {
        return Err(fail(format!("expected 4 fields, found {}", fields.len())));
    }
    let coordinate = |s: &str| {
        s.parse::<u16>()
            .map_err(|e| fail(format!("bad coordinate {:?}: {}", s, e)))
    };
    let flag = |s: &str| match s.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(fail(format!("bad flag {:?}", s))),
    };
    Ok(CellRecord {
        coord: (coordinate(fields[0])?, coordinate(fields[1])?),
        is_path: flag(fields[2])?,
        is_walkable: flag(fields[3])?,
        active_path: false,
    })
}

/// Width and height spanned by the records' coordinates.
pub fn infer_dimensions(records: &[CellRecord]) -> Result<(u16, u16), FormatError> {
    let too_large = |coord: Coord| FormatError::Parse {
        line: 0,
        reason: format!("coordinate {:?} is too large", coord),
    };
    let mut dims: Option<(u16, u16)> = None;
    for r in records {
        let (x, y) = r.coord;
        let w = x.checked_add(1).ok_or_else(|| too_large(r.coord))?;
        let h = y.checked_add(1).ok_or_else(|| too_large(r.coord))?;
        dims = Some(match dims {
            Some((dw, dh)) => (dw.max(w), dh.max(h)),
            None => (w, h),
        });
    }
    dims.ok_or(FormatError::Empty)
}
