use crate::board::Board;
use crate::rng::Rng;
use crate::types::{Direction, EnemyVariant, EnemyView, PlayerView, Pos};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub pos: Pos,
    /// Latched input, read at the start of every tick.
    pub intent: Direction,
    /// Last latched direction, kept for the sprite even when a move is blocked.
    pub facing: Direction,
    pub has_key: bool,
    pub score: u32,
}

impl Player {
    fn spawn(pos: Pos) -> Self {
        Self {
            pos,
            intent: Direction::None,
            facing: Direction::None,
            has_key: false,
            score: 0,
        }
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            row: self.pos.row,
            col: self.pos.col,
            facing: self.facing,
            rotation_deg: self.facing.rotation_degrees(),
            has_key: self.has_key,
            score: self.score,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    pub id: usize,
    pub pos: Pos,
    /// Cosmetic only.
    pub variant: EnemyVariant,
}

impl Enemy {
    pub fn view(&self) -> EnemyView {
        EnemyView {
            id: self.id,
            row: self.pos.row,
            col: self.pos.col,
            variant: self.variant,
        }
    }
}

/// Player and enemies by grid coordinate. Every move goes through here so the
/// board's occupancy flags never drift from these positions.
#[derive(Clone, Debug)]
pub struct Entities {
    player: Player,
    enemies: Vec<Enemy>,
}

impl Entities {
    pub fn spawn(board: &mut Board, player_spawn: Pos, enemy_spawns: &[Pos], rng: &mut Rng) -> Self {
        board.set_player_here(player_spawn, true);
        let enemies = enemy_spawns
            .iter()
            .enumerate()
            .map(|(id, pos)| {
                board.add_enemy(*pos);
                Enemy {
                    id,
                    pos: *pos,
                    variant: if rng.bool(0.5) {
                        EnemyVariant::Red
                    } else {
                        EnemyVariant::Orange
                    },
                }
            })
            .collect();
        Self {
            player: Player::spawn(player_spawn),
            enemies,
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemy(&self, id: usize) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    pub fn any_enemy_at(&self, pos: Pos) -> bool {
        self.enemies.iter().any(|enemy| enemy.pos == pos)
    }

    pub fn player_collides(&self) -> bool {
        self.any_enemy_at(self.player.pos)
    }

    pub(crate) fn move_player(&mut self, board: &mut Board, to: Pos) {
        board.set_player_here(self.player.pos, false);
        board.set_player_here(to, true);
        self.player.pos = to;
    }

    /// Leaves pickups on both tiles untouched.
    pub(crate) fn move_enemy(&mut self, board: &mut Board, id: usize, to: Pos) -> bool {
        let Some(enemy) = self.enemies.iter_mut().find(|enemy| enemy.id == id) else {
            return false;
        };
        board.remove_enemy(enemy.pos);
        board.add_enemy(to);
        enemy.pos = to;
        true
    }

    /// Occupancy flags on `board` agree with the registry.
    pub fn is_consistent_with(&self, board: &Board) -> bool {
        board.positions().all(|pos| {
            let Some(tile) = board.tile(pos) else {
                return false;
            };
            let enemies_here = self.enemies.iter().filter(|enemy| enemy.pos == pos).count();
            tile.player_here == (self.player.pos == pos)
                && usize::from(tile.enemies_here) == enemies_here
        })
    }
}
