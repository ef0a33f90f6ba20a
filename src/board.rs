use crate::types::{Pos, TileRole};

/// One grid cell. `role` is fixed once the level is loaded; the remaining
/// fields are pickups and occupancy layered on top.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tile {
    pub role: TileRole,
    pub pellet: bool,
    pub key: bool,
    pub player_here: bool,
    pub enemies_here: u16,
}

impl Tile {
    pub fn has_enemy(&self) -> bool {
        self.enemies_here > 0
    }
}

/// Fixed-size grid indexed `[row][col]`, origin top-left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
}

impl Board {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            tiles: vec![Tile::default(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row >= 0 && pos.col >= 0 && (pos.row as usize) < self.rows && (pos.col as usize) < self.cols
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(pos.row as usize * self.cols + pos.col as usize)
    }

    pub fn tile(&self, pos: Pos) -> Option<&Tile> {
        self.index(pos).and_then(|idx| self.tiles.get(idx))
    }

    pub(crate) fn tile_mut(&mut self, pos: Pos) -> Option<&mut Tile> {
        let idx = self.index(pos)?;
        self.tiles.get_mut(idx)
    }

    pub fn role(&self, pos: Pos) -> Option<TileRole> {
        self.tile(pos).map(|tile| tile.role)
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.role(pos) == Some(TileRole::Wall)
    }

    pub fn is_gate(&self, pos: Pos) -> bool {
        self.role(pos) == Some(TileRole::Gate)
    }

    pub fn has_pellet(&self, pos: Pos) -> bool {
        self.tile(pos).map(|tile| tile.pellet).unwrap_or(false)
    }

    pub fn has_key(&self, pos: Pos) -> bool {
        self.tile(pos).map(|tile| tile.key).unwrap_or(false)
    }

    pub fn has_enemy(&self, pos: Pos) -> bool {
        self.tile(pos).map(Tile::has_enemy).unwrap_or(false)
    }

    /// Clears the pellet at `pos`, returning whether one was there.
    pub fn take_pellet(&mut self, pos: Pos) -> bool {
        match self.tile_mut(pos) {
            Some(tile) if tile.pellet => {
                tile.pellet = false;
                true
            }
            _ => false,
        }
    }

    pub fn take_key(&mut self, pos: Pos) -> bool {
        match self.tile_mut(pos) {
            Some(tile) if tile.key => {
                tile.key = false;
                true
            }
            _ => false,
        }
    }

    /// In bounds, not a wall, and not a gate unless `holds_key`.
    pub fn is_passable(&self, pos: Pos, holds_key: bool) -> bool {
        match self.role(pos) {
            None | Some(TileRole::Wall) => false,
            Some(TileRole::Gate) => holds_key,
            Some(TileRole::Empty) => true,
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows)
            .flat_map(move |row| (0..self.cols).map(move |col| Pos::new(row as i32, col as i32)))
    }

    pub fn pellet_positions(&self) -> Vec<Pos> {
        self.positions().filter(|pos| self.has_pellet(*pos)).collect()
    }

    pub fn pellet_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.pellet).count()
    }

    pub fn key_position(&self) -> Option<Pos> {
        self.positions().find(|pos| self.has_key(*pos))
    }

    pub fn gate_position(&self) -> Option<Pos> {
        self.positions().find(|pos| self.is_gate(*pos))
    }

    /// Structural roles only, one string per row.
    pub fn role_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.cols.max(1))
            .map(|row| row.iter().map(|tile| tile.role.symbol()).collect())
            .collect()
    }

    pub(crate) fn set_role(&mut self, pos: Pos, role: TileRole) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.role = role;
        }
    }

    pub(crate) fn place_pellet(&mut self, pos: Pos) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.pellet = true;
        }
    }

    pub(crate) fn place_key(&mut self, pos: Pos) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.key = true;
        }
    }

    pub(crate) fn set_player_here(&mut self, pos: Pos, here: bool) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.player_here = here;
        }
    }

    pub(crate) fn add_enemy(&mut self, pos: Pos) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.enemies_here = tile.enemies_here.saturating_add(1);
        }
    }

    pub(crate) fn remove_enemy(&mut self, pos: Pos) {
        if let Some(tile) = self.tile_mut(pos) {
            tile.enemies_here = tile.enemies_here.saturating_sub(1);
        }
    }
}
