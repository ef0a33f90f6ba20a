use crate::board::Board;
use crate::entities::{Enemy, Entities, Player};
use crate::error::StateError;
use crate::level::Level;
use crate::rng::Rng;
use crate::types::{BoardView, Direction, EngineState, LevelOrigin, Pos, TickOutcome};

mod policy;

pub use self::policy::{EnemyMovePolicy, RandomWalk};

enum PlayerStep {
    Continue(TickOutcome),
    Halt(TickOutcome),
}

/// Owns one loaded level and advances it a tile at a time.
#[derive(Clone, Debug)]
pub struct TickEngine {
    ordinal: u32,
    origin: LevelOrigin,
    board: Board,
    entities: Entities,
    state: EngineState,
    tick_counter: u64,
    pellet_value: u32,
}

impl TickEngine {
    /// `rng` only samples the cosmetic enemy variants.
    pub fn new(level: &Level, pellet_value: u32, rng: &mut Rng) -> Self {
        let mut board = level.map.board.clone();
        let entities = Entities::spawn(
            &mut board,
            level.map.player_spawn,
            &level.map.enemy_spawns,
            rng,
        );
        Self {
            ordinal: level.ordinal,
            origin: level.origin,
            board,
            entities,
            state: EngineState::Loaded,
            tick_counter: 0,
            pellet_value,
        }
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn origin(&self) -> LevelOrigin {
        self.origin
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    pub fn player(&self) -> &Player {
        self.entities.player()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Latches `dir` for the next tick; earlier unconsumed input is replaced.
    pub fn set_intent(&mut self, dir: Direction) {
        self.entities.player_mut().intent = dir;
    }

    pub fn tick(&mut self, policy: &mut dyn EnemyMovePolicy) -> Result<TickOutcome, StateError> {
        match self.state {
            EngineState::Cleared => return Err(StateError::Halted("level cleared")),
            EngineState::Lost => return Err(StateError::Halted("player lost")),
            EngineState::Loaded | EngineState::Running => {}
        }
        self.state = EngineState::Running;
        self.tick_counter += 1;

        let outcome = match self.advance_player() {
            PlayerStep::Halt(terminal) => return Ok(self.halt(terminal)),
            PlayerStep::Continue(outcome) => outcome,
        };

        if self.advance_enemies(policy) || self.entities.player_collides() {
            return Ok(self.halt(TickOutcome::PlayerLost));
        }

        Ok(outcome)
    }

    fn halt(&mut self, outcome: TickOutcome) -> TickOutcome {
        self.state = match outcome {
            TickOutcome::LevelCleared => EngineState::Cleared,
            _ => EngineState::Lost,
        };
        outcome
    }

    fn advance_player(&mut self) -> PlayerStep {
        let dir = self.entities.player().intent;
        if dir == Direction::None {
            return PlayerStep::Continue(TickOutcome::None);
        }
        self.entities.player_mut().facing = dir;

        let target = self.entities.player().pos.step(dir);
        if !self.board.is_passable(target, self.entities.player().has_key) {
            return PlayerStep::Continue(TickOutcome::None);
        }

        let mut outcome = TickOutcome::None;
        if self.board.take_pellet(target) {
            let player = self.entities.player_mut();
            player.score = player.score.saturating_add(self.pellet_value);
            outcome = TickOutcome::ScoreChanged {
                delta: self.pellet_value,
            };
        }
        if self.board.take_key(target) {
            self.entities.player_mut().has_key = true;
            outcome = TickOutcome::KeyPicked;
        }
        if self.board.is_gate(target) && self.entities.player().has_key {
            return PlayerStep::Halt(TickOutcome::LevelCleared);
        }
        if self.entities.any_enemy_at(target) {
            return PlayerStep::Halt(TickOutcome::PlayerLost);
        }

        self.entities.move_player(&mut self.board, target);
        PlayerStep::Continue(outcome)
    }

    /// Enemies move in roster order over a copy taken before the phase. The
    /// first one to step onto the player ends the phase and the rest stay put.
    fn advance_enemies(&mut self, policy: &mut dyn EnemyMovePolicy) -> bool {
        let roster: Vec<Enemy> = self.entities.enemies().to_vec();
        let player_pos = self.entities.player().pos;
        for enemy in &roster {
            let dir = policy.choose_move(enemy, &self.board);
            if dir == Direction::None {
                continue;
            }
            let target = enemy.pos.step(dir);
            if !enemy_can_enter(&self.board, target) {
                continue;
            }
            self.entities.move_enemy(&mut self.board, enemy.id, target);
            if target == player_pos {
                return true;
            }
        }
        false
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            rows: self.board.rows(),
            cols: self.board.cols(),
            tiles: self.board.role_rows(),
            pellets: self.board.pellet_positions(),
            key: self.board.key_position(),
            player: self.entities.player().view(),
            enemies: self.entities.enemies().iter().map(Enemy::view).collect(),
            state: self.state,
            tick: self.tick_counter,
        }
    }
}

/// Enemies never hold the key, so gates stay shut to them.
fn enemy_can_enter(board: &Board, target: Pos) -> bool {
    board.is_passable(target, false)
}
