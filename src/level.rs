//! Level text format.
//!
//! ```text
//! <rows> <cols>
//! <row_0>
//! ...
//! <row_{rows-1}>
//! ```
//!
//! Symbols: `W` wall, `G` gate, `P` player spawn, `C` enemy spawn, `K` key,
//! `o` pellet, `.` empty. Spawn tiles become empty floor once extracted.

use crate::board::Board;
use crate::constants::MIN_BOARD_SIDE;
use crate::error::LevelError;
use crate::types::{LevelOrigin, Pos, TileRole};

const ALPHABET: [char; 7] = ['W', 'G', 'P', 'C', 'K', 'o', '.'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseMode {
    /// Campaign files: unknown symbols load as empty floor and lines past the
    /// declared row count are ignored.
    Permissive,
    /// Uploads: exact row count and alphabet.
    Strict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelMap {
    pub board: Board,
    pub player_spawn: Pos,
    pub enemy_spawns: Vec<Pos>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    pub map: LevelMap,
    pub ordinal: u32,
    pub origin: LevelOrigin,
}

impl Level {
    /// Campaign levels parse permissively, custom levels strictly.
    pub fn parse(text: &str, ordinal: u32, origin: LevelOrigin) -> Result<Self, LevelError> {
        let mode = match origin {
            LevelOrigin::Campaign => ParseMode::Permissive,
            LevelOrigin::Custom => ParseMode::Strict,
        };
        Ok(Self {
            map: parse_level(text, mode)?,
            ordinal,
            origin,
        })
    }
}

pub fn normalized_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .split('\n')
        .map(|line| line.trim().to_string())
        .collect()
}

pub fn parse_level(text: &str, mode: ParseMode) -> Result<LevelMap, LevelError> {
    let lines = normalized_lines(text);
    let header = lines.first().map(String::as_str).unwrap_or("");
    if header.is_empty() {
        return Err(LevelError::Empty);
    }
    let (rows, cols) = parse_header(header)?;

    let provided = lines.len() - 1;
    let row_count_ok = match mode {
        ParseMode::Strict => provided == rows,
        ParseMode::Permissive => provided >= rows,
    };
    if !row_count_ok {
        return Err(LevelError::RowCount {
            expected: rows,
            found: provided,
        });
    }

    // Row shapes are checked before the grid is allocated so the header
    // alone cannot size it.
    for (row_idx, line) in lines.iter().skip(1).take(rows).enumerate() {
        let found = line.chars().count();
        if found != cols {
            return Err(LevelError::RowLength {
                line: row_idx + 2,
                expected: cols,
                found,
            });
        }
    }

    let mut board = Board::new(rows, cols);
    let mut players = Vec::new();
    let mut enemy_spawns = Vec::new();
    let mut gates = 0usize;
    let mut keys = 0usize;

    for (row_idx, line) in lines.iter().skip(1).take(rows).enumerate() {
        let line_no = row_idx + 2;
        for (col_idx, symbol) in line.chars().enumerate() {
            let pos = Pos::new(row_idx as i32, col_idx as i32);
            if mode == ParseMode::Strict && !ALPHABET.contains(&symbol) {
                return Err(LevelError::BadSymbol {
                    line: line_no,
                    column: col_idx + 1,
                    symbol,
                });
            }
            match symbol {
                'W' => board.set_role(pos, TileRole::Wall),
                'G' => {
                    board.set_role(pos, TileRole::Gate);
                    gates += 1;
                }
                'P' => players.push(pos),
                'C' => enemy_spawns.push(pos),
                'K' => {
                    board.place_key(pos);
                    keys += 1;
                }
                'o' => board.place_pellet(pos),
                _ => {}
            }
        }
    }

    expect_one('P', "player", players.len())?;
    expect_one('G', "gate", gates)?;
    expect_one('K', "key", keys)?;

    Ok(LevelMap {
        board,
        player_spawn: players[0],
        enemy_spawns,
    })
}

/// Strict check used by the upload path.
pub fn validate_upload(text: &str) -> Result<LevelMap, LevelError> {
    parse_level(text, ParseMode::Strict)
}

fn parse_header(header: &str) -> Result<(usize, usize), LevelError> {
    let bad_header = || LevelError::BadHeader {
        found: header.to_string(),
    };
    let parts: Vec<&str> = header.split_whitespace().collect();
    let [rows, cols] = parts.as_slice() else {
        return Err(bad_header());
    };
    let rows = rows.parse::<usize>().map_err(|_| bad_header())?;
    let cols = cols.parse::<usize>().map_err(|_| bad_header())?;
    if rows == 0 || cols == 0 {
        return Err(bad_header());
    }
    if rows < MIN_BOARD_SIDE || cols < MIN_BOARD_SIDE {
        return Err(LevelError::TooSmall {
            rows,
            cols,
            min: MIN_BOARD_SIDE,
        });
    }
    Ok((rows, cols))
}

fn expect_one(symbol: char, what: &'static str, found: usize) -> Result<(), LevelError> {
    if found == 1 {
        return Ok(());
    }
    Err(LevelError::SymbolCount {
        symbol,
        what,
        found,
    })
}

impl LevelMap {
    pub fn rows(&self) -> usize {
        self.board.rows()
    }

    pub fn cols(&self) -> usize {
        self.board.cols()
    }

    fn symbol_at(&self, pos: Pos) -> char {
        if pos == self.player_spawn {
            return 'P';
        }
        if self.enemy_spawns.contains(&pos) {
            return 'C';
        }
        let Some(tile) = self.board.tile(pos) else {
            return '.';
        };
        match tile.role {
            TileRole::Wall => 'W',
            TileRole::Gate => 'G',
            TileRole::Empty if tile.key => 'K',
            TileRole::Empty if tile.pellet => 'o',
            TileRole::Empty => '.',
        }
    }

    /// Re-emits the map in the level text format with `\n` line endings.
    pub fn to_text(&self) -> String {
        let mut out = format!("{} {}\n", self.rows(), self.cols());
        for row in 0..self.rows() {
            let line: String = (0..self.cols())
                .map(|col| self.symbol_at(Pos::new(row as i32, col as i32)))
                .collect();
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}
