use serde::Serialize;

use crate::constants::{FAST_TICK_MS, NORMAL_TICK_MS, SLOW_TICK_MS};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// Single-letter form used by scripted input (`U`, `D`, `L`, `R`).
    pub fn from_script_char(value: char) -> Option<Self> {
        match value.to_ascii_uppercase() {
            'U' => Some(Self::Up),
            'D' => Some(Self::Down),
            'L' => Some(Self::Left),
            'R' => Some(Self::Right),
            'N' => Some(Self::None),
            _ => None,
        }
    }

    /// Sprite rotation for a player facing this way. The sprite faces left at 0.
    pub fn rotation_degrees(self) -> u16 {
        match self {
            Direction::Left | Direction::None => 0,
            Direction::Up => 90,
            Direction::Right => 180,
            Direction::Down => 270,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Pos {
    pub row: i32,
    pub col: i32,
}

impl Pos {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn step(self, dir: Direction) -> Pos {
        match dir {
            Direction::Up => Pos::new(self.row - 1, self.col),
            Direction::Down => Pos::new(self.row + 1, self.col),
            Direction::Left => Pos::new(self.row, self.col - 1),
            Direction::Right => Pos::new(self.row, self.col + 1),
            Direction::None => self,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileRole {
    #[default]
    Empty,
    Wall,
    Gate,
}

impl TileRole {
    pub fn symbol(self) -> char {
        match self {
            TileRole::Empty => '.',
            TileRole::Wall => 'W',
            TileRole::Gate => 'G',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyVariant {
    Red,
    Orange,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelOrigin {
    Campaign,
    Custom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Loaded,
    Running,
    Cleared,
    Lost,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, EngineState::Cleared | EngineState::Lost)
    }
}

/// At most one outcome is raised per tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TickOutcome {
    None,
    ScoreChanged { delta: u32 },
    KeyPicked,
    LevelCleared,
    PlayerLost,
}

impl TickOutcome {
    pub fn is_terminal(self) -> bool {
        matches!(self, TickOutcome::LevelCleared | TickOutcome::PlayerLost)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speed {
    Fast,
    Normal,
    Slow,
}

impl Speed {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fast" => Some(Self::Fast),
            "normal" => Some(Self::Normal),
            "slow" => Some(Self::Slow),
            _ => None,
        }
    }

    pub fn period_ms(self) -> u64 {
        match self {
            Speed::Fast => FAST_TICK_MS,
            Speed::Normal => NORMAL_TICK_MS,
            Speed::Slow => SLOW_TICK_MS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Menu,
    Playing,
    GameOver,
    CampaignComplete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    ScoreChanged {
        delta: u32,
        score: u32,
    },
    KeyPicked,
    LevelCleared {
        ordinal: u32,
    },
    LevelAdvanced {
        ordinal: u32,
    },
    CampaignComplete {
        score: u32,
    },
    GameOver {
        score: u32,
        #[serde(rename = "canRestart")]
        can_restart: bool,
    },
    LevelLoadFailed {
        message: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub row: i32,
    pub col: i32,
    pub facing: Direction,
    #[serde(rename = "rotationDeg")]
    pub rotation_deg: u16,
    #[serde(rename = "hasKey")]
    pub has_key: bool,
    pub score: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct EnemyView {
    pub id: usize,
    pub row: i32,
    pub col: i32,
    pub variant: EnemyVariant,
}

#[derive(Clone, Debug, Serialize)]
pub struct LevelInfo {
    pub ordinal: u32,
    pub origin: LevelOrigin,
    #[serde(rename = "storyMode")]
    pub story_mode: bool,
}

/// Read-only projection of one board for a renderer.
#[derive(Clone, Debug, Serialize)]
pub struct BoardView {
    pub rows: usize,
    pub cols: usize,
    /// One string per row using `.`, `W` and `G`.
    pub tiles: Vec<String>,
    pub pellets: Vec<Pos>,
    pub key: Option<Pos>,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub state: EngineState,
    pub tick: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub phase: SessionPhase,
    #[serde(rename = "tickMs")]
    pub tick_ms: u64,
    pub level: Option<LevelInfo>,
    pub board: Option<BoardView>,
    pub score: u32,
    #[serde(rename = "hasKey")]
    pub has_key: bool,
    pub events: Vec<SessionEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_one_tile() {
        let origin = Pos::new(3, 3);
        assert_eq!(origin.step(Direction::Up), Pos::new(2, 3));
        assert_eq!(origin.step(Direction::Down), Pos::new(4, 3));
        assert_eq!(origin.step(Direction::Left), Pos::new(3, 2));
        assert_eq!(origin.step(Direction::Right), Pos::new(3, 4));
        assert_eq!(origin.step(Direction::None), origin);
    }

    #[test]
    fn speed_presets_match_menu_periods() {
        assert_eq!(Speed::parse("fast").map(Speed::period_ms), Some(100));
        assert_eq!(Speed::parse("normal").map(Speed::period_ms), Some(200));
        assert_eq!(Speed::parse("slow").map(Speed::period_ms), Some(300));
        assert_eq!(Speed::parse("ludicrous"), None);
    }

    #[test]
    fn script_chars_map_to_directions() {
        assert_eq!(Direction::from_script_char('r'), Some(Direction::Right));
        assert_eq!(Direction::from_script_char('U'), Some(Direction::Up));
        assert_eq!(Direction::from_script_char('x'), None);
    }
}
