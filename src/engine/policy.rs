use crate::board::Board;
use crate::entities::Enemy;
use crate::rng::Rng;
use crate::types::Direction;

/// Picks the direction an enemy tries this tick. Blocked choices are no-ops,
/// so a policy never needs to check walls itself.
pub trait EnemyMovePolicy {
    fn choose_move(&mut self, enemy: &Enemy, board: &Board) -> Direction;
}

/// Uniform over the four cardinals.
#[derive(Clone, Debug)]
pub struct RandomWalk {
    rng: Rng,
}

impl RandomWalk {
    pub fn new(rng: Rng) -> Self {
        Self { rng }
    }

    pub fn seeded(seed: u32) -> Self {
        Self::new(Rng::new(seed))
    }
}

impl EnemyMovePolicy for RandomWalk {
    fn choose_move(&mut self, _enemy: &Enemy, _board: &Board) -> Direction {
        self.rng.cardinal()
    }
}
