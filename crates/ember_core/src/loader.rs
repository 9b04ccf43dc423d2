//! Textual world description parser.
//!
//! The format is whitespace-separated tokens with `#` comment lines:
//!
//! ```text
//! # rows cols cell_size
//! 3 4 100
//! OPEN OPEN  WATER OPEN
//! OPEN ROCK  ROCK  OPEN
//! OPEN OPEN  OPEN  HABITAT
//! # fires: count, then "row col demand"
//! 1
//! 2 3 1500
//! # units: count, then "row col KIND [speed]"
//! 2
//! 0 0 WHEELED
//! 2 0 AERIAL 120
//! ```
//!
//! Reading the text from disk is the caller's business; the core parses
//! strings only.

use std::str::FromStr;

use crate::error::{Result, SimError};
use crate::grid::{Coord, Grid, Terrain};
use crate::units::{Unit, UnitKind};
use crate::world::WorldState;

/// A token plus the 1-based line it came from.
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    line: usize,
}

/// Whitespace tokenizer that drops `#` comment lines.
struct TokenStream<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    fn new(input: &'a str) -> Self {
        let mut tokens = Vec::new();
        for (index, line) in input.lines().enumerate() {
            if line.trim_start().starts_with('#') {
                continue;
            }
            for word in line.split_whitespace() {
                tokens.push(Token {
                    text: word,
                    line: index + 1,
                });
            }
        }
        Self { tokens, pos: 0 }
    }

    /// Line to report in errors: the last consumed token's, else the end.
    fn error_line(&self) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.line)
    }

    fn next(&mut self, expected: &str) -> Result<Token<'a>> {
        let token = self.tokens.get(self.pos).copied();
        match token {
            Some(t) => {
                self.pos += 1;
                Ok(t)
            }
            None => Err(SimError::WorldParse {
                line: self.error_line(),
                message: format!("expected {expected}, found end of input"),
            }),
        }
    }

    fn next_u32(&mut self, expected: &str) -> Result<(u32, usize)> {
        let token = self.next(expected)?;
        let value = token.text.parse::<u32>().map_err(|_| SimError::WorldParse {
            line: token.line,
            message: format!("expected {expected}, found '{}'", token.text),
        })?;
        Ok((value, token.line))
    }

    /// Consume a number only if the next token sits on the given line.
    ///
    /// Unit speeds are optional and distinguished from the next unit's
    /// row number purely by line placement.
    fn same_line_f64(&mut self, line: usize) -> Option<f64> {
        let token = self.tokens.get(self.pos)?;
        if token.line != line {
            return None;
        }
        let value = token.text.parse::<f64>().ok()?;
        self.pos += 1;
        Some(value)
    }
}

fn parse_terrain(token: Token<'_>) -> Result<Terrain> {
    match token.text {
        "OPEN" => Ok(Terrain::Open),
        "HABITAT" => Ok(Terrain::Habitat),
        "FOREST" => Ok(Terrain::Forest),
        "ROCK" => Ok(Terrain::Rock),
        "WATER" => Ok(Terrain::Water),
        other => Err(SimError::WorldParse {
            line: token.line,
            message: format!("unknown terrain '{other}'"),
        }),
    }
}

/// Parse a complete world description.
///
/// # Errors
///
/// Returns [`SimError::WorldParse`] on any malformed input; the core
/// never attempts recovery from a bad description.
pub fn load_world(input: &str) -> Result<WorldState> {
    let mut ts = TokenStream::new(input);

    let (rows, _) = ts.next_u32("row count")?;
    let (cols, line) = ts.next_u32("column count")?;
    let (cell_size, _) = ts.next_u32("cell size")?;
    if rows == 0 || cols == 0 {
        return Err(SimError::WorldParse {
            line,
            message: "grid dimensions must be positive".to_string(),
        });
    }

    let cell_count = (rows as usize) * (cols as usize);
    let mut cells = Vec::with_capacity(cell_count);
    for _ in 0..cell_count {
        let token = ts.next("terrain kind")?;
        cells.push(parse_terrain(token)?);
    }
    let grid = Grid::new(rows, cols, cell_size, cells);
    let mut world = WorldState::new(grid);

    let (fire_count, _) = ts.next_u32("fire count")?;
    for _ in 0..fire_count {
        let (row, _) = ts.next_u32("fire row")?;
        let (col, _) = ts.next_u32("fire column")?;
        let (demand, line) = ts.next_u32("fire demand")?;
        if demand == 0 {
            return Err(SimError::WorldParse {
                line,
                message: "fire demand must be > 0".to_string(),
            });
        }
        let position = Coord::new(row, col);
        if !world.grid.in_bounds(position) {
            return Err(SimError::WorldParse {
                line,
                message: format!("fire at {position} is outside the grid"),
            });
        }
        world.spawn_fire(position, demand);
    }

    let (unit_count, _) = ts.next_u32("unit count")?;
    for _ in 0..unit_count {
        let (row, _) = ts.next_u32("unit row")?;
        let (col, _) = ts.next_u32("unit column")?;
        let kind_token = ts.next("unit kind")?;
        let kind = UnitKind::from_str(kind_token.text).map_err(|message| SimError::WorldParse {
            line: kind_token.line,
            message,
        })?;
        let position = Coord::new(row, col);
        if !world.grid.in_bounds(position) {
            return Err(SimError::WorldParse {
                line: kind_token.line,
                message: format!("unit at {position} is outside the grid"),
            });
        }
        let unit = match ts.same_line_f64(kind_token.line) {
            Some(speed) => {
                Unit::with_speed(kind, position, speed).map_err(|e| SimError::WorldParse {
                    line: kind_token.line,
                    message: e.to_string(),
                })?
            }
            None => Unit::new(kind, position),
        };
        world.add_unit(unit);
    }

    tracing::debug!(
        rows,
        cols,
        units = world.units.len(),
        fires = world.fires.len(),
        water_cells = world.water_cells.len(),
        "world loaded"
    );
    Ok(world)
}
