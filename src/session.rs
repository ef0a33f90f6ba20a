use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::constants::{clamp_tick_ms, MAX_PENDING_EVENTS};
use crate::engine::{EnemyMovePolicy, RandomWalk, TickEngine};
use crate::error::{GameError, StateError};
use crate::high_scores::HighScoreStore;
use crate::level::Level;
use crate::level_library::LevelLibrary;
use crate::progression::{ClearedAction, LossChoices, Progression};
use crate::rng::Rng;
use crate::types::{
    Direction, LevelInfo, LevelOrigin, SessionEvent, SessionPhase, Snapshot, TickOutcome,
};

/// Result of one driven tick, after progression has acted on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub phase: SessionPhase,
}

/// One player's game: the loaded level, campaign position and the handles
/// it needs to load the next level or record a final score.
pub struct GameSession {
    config: GameConfig,
    library: LevelLibrary,
    high_scores: HighScoreStore,
    policy: Box<dyn EnemyMovePolicy + Send>,
    variant_rng: Rng,
    engine: Option<TickEngine>,
    progression: Option<Progression>,
    loss_choices: Option<LossChoices>,
    phase: SessionPhase,
    tick_ms: u64,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Self {
        let policy = Box::new(RandomWalk::new(Rng::from_entropy()));
        Self::with_policy(config, policy, Rng::from_entropy())
    }

    /// Deterministic enemies and variants for replays and tests.
    pub fn with_seed(config: GameConfig, seed: u32) -> Self {
        let policy = Box::new(RandomWalk::seeded(seed));
        Self::with_policy(config, policy, Rng::new(seed ^ 0x9e37_79b9))
    }

    pub fn with_policy(
        config: GameConfig,
        policy: Box<dyn EnemyMovePolicy + Send>,
        variant_rng: Rng,
    ) -> Self {
        let library = LevelLibrary::new(config.levels_dir.clone());
        let high_scores =
            HighScoreStore::with_capacity(config.high_scores_path.clone(), config.max_high_scores);
        Self {
            tick_ms: clamp_tick_ms(config.tick_ms),
            config,
            library,
            high_scores,
            policy,
            variant_rng,
            engine: None,
            progression: None,
            loss_choices: None,
            phase: SessionPhase::Menu,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn library(&self) -> &LevelLibrary {
        &self.library
    }

    pub fn high_scores(&self) -> &HighScoreStore {
        &self.high_scores
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn tick_ms(&self) -> u64 {
        self.tick_ms
    }

    pub fn engine(&self) -> Option<&TickEngine> {
        self.engine.as_ref()
    }

    pub fn progression(&self) -> Option<Progression> {
        self.progression
    }

    pub fn loss_choices(&self) -> Option<LossChoices> {
        self.loss_choices
    }

    /// Parses `text` and replaces the running level. On error the previous
    /// level (if any) keeps running untouched. Campaign ordinals are clamped
    /// to `1..=campaign_length`; custom runs are always ordinal 1.
    pub fn load_level(&mut self, text: &str, ordinal: u32, story_mode: bool) -> Result<(), GameError> {
        let (origin, progression) = if story_mode {
            (
                LevelOrigin::Campaign,
                Progression::campaign(ordinal, self.config.campaign_length),
            )
        } else {
            (LevelOrigin::Custom, Progression::custom())
        };
        let ordinal = progression.current();
        let level = Level::parse(text, ordinal, origin)?;
        self.engine = Some(TickEngine::new(
            &level,
            self.config.pellet_value,
            &mut self.variant_rng,
        ));
        self.progression = Some(progression);
        self.loss_choices = None;
        self.phase = SessionPhase::Playing;
        info!(
            ordinal,
            story_mode,
            rows = level.map.rows(),
            cols = level.map.cols(),
            enemies = level.map.enemy_spawns.len(),
            "level loaded"
        );
        Ok(())
    }

    pub fn start_campaign(&mut self) -> Result<(), GameError> {
        let text = self.library.read_campaign(1)?;
        self.load_level(&text, 1, true)
    }

    pub fn start_custom(&mut self, name: &str) -> Result<(), GameError> {
        let text = self.library.read_custom(name)?;
        self.load_level(&text, 1, false)
    }

    /// Latches `dir` for the next tick. Ignored when nothing is loaded.
    pub fn set_intent(&mut self, dir: Direction) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_intent(dir);
        }
    }

    /// Returns the clamped period actually applied.
    pub fn set_tick_period(&mut self, ms: u64) -> u64 {
        self.tick_ms = clamp_tick_ms(ms);
        debug!(tick_ms = self.tick_ms, "tick period changed");
        self.tick_ms
    }

    pub fn tick(&mut self) -> Result<TickReport, GameError> {
        let Some(engine) = self.engine.as_mut() else {
            return Err(StateError::NoLevel.into());
        };
        let outcome = engine.tick(self.policy.as_mut())?;
        let score = engine.player().score;

        match outcome {
            TickOutcome::None => {}
            TickOutcome::ScoreChanged { delta } => {
                self.push_event(SessionEvent::ScoreChanged { delta, score });
            }
            TickOutcome::KeyPicked => self.push_event(SessionEvent::KeyPicked),
            TickOutcome::LevelCleared => self.on_level_cleared(score),
            TickOutcome::PlayerLost => self.on_player_lost(score),
        }

        Ok(TickReport {
            outcome,
            phase: self.phase,
        })
    }

    /// Only offered after losing in story mode.
    pub fn restart_from_start(&mut self) -> Result<(), GameError> {
        let allowed = self.phase == SessionPhase::GameOver
            && self
                .loss_choices
                .map(|choices| choices.restart_from_start)
                .unwrap_or(false);
        if !allowed {
            return Err(StateError::RestartUnavailable.into());
        }
        self.start_campaign()
    }

    pub fn return_to_menu(&mut self) {
        self.engine = None;
        self.progression = None;
        self.loss_choices = None;
        self.phase = SessionPhase::Menu;
    }

    pub fn snapshot(&mut self, include_events: bool) -> Snapshot {
        let story_mode = self
            .progression
            .map(|progression| progression.story_mode())
            .unwrap_or(false);
        let level = self.engine.as_ref().map(|engine| LevelInfo {
            ordinal: engine.ordinal(),
            origin: engine.origin(),
            story_mode,
        });
        let (score, has_key) = self
            .engine
            .as_ref()
            .map(|engine| (engine.player().score, engine.player().has_key))
            .unwrap_or((0, false));

        Snapshot {
            phase: self.phase,
            tick_ms: self.tick_ms,
            level,
            board: self.engine.as_ref().map(TickEngine::view),
            score,
            has_key,
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    /// The queue is drained by `snapshot(true)`. A caller that never drains
    /// it keeps only the newest `MAX_PENDING_EVENTS`.
    fn push_event(&mut self, event: SessionEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            let excess = self.events.len() + 1 - MAX_PENDING_EVENTS;
            self.events.drain(..excess);
        }
        self.events.push(event);
    }

    fn on_level_cleared(&mut self, score: u32) {
        let mut progression = self.progression.unwrap_or_else(Progression::custom);
        self.push_event(SessionEvent::LevelCleared {
            ordinal: progression.current(),
        });

        match progression.on_level_cleared() {
            ClearedAction::LoadLevel(next) => {
                let loaded = self.library.read_campaign(next).and_then(|text| {
                    Level::parse(&text, next, LevelOrigin::Campaign).map_err(GameError::from)
                });
                match loaded {
                    Ok(level) => {
                        self.engine = Some(TickEngine::new(
                            &level,
                            self.config.pellet_value,
                            &mut self.variant_rng,
                        ));
                        progression.advance_to(next);
                        self.progression = Some(progression);
                        self.push_event(SessionEvent::LevelAdvanced { ordinal: next });
                        info!(ordinal = next, carried_score = score, "advanced to next level");
                    }
                    Err(error) => {
                        warn!(ordinal = next, %error, "failed to load next level");
                        self.push_event(SessionEvent::LevelLoadFailed {
                            message: error.to_string(),
                        });
                    }
                }
            }
            ClearedAction::CampaignComplete => {
                self.high_scores.save(score);
                self.phase = SessionPhase::CampaignComplete;
                self.push_event(SessionEvent::CampaignComplete { score });
                info!(score, "campaign complete");
            }
        }
    }

    fn on_player_lost(&mut self, score: u32) {
        let progression = self.progression.unwrap_or_else(Progression::custom);
        self.high_scores.save(score);
        let choices = progression.on_player_lost();
        self.loss_choices = Some(choices);
        self.phase = SessionPhase::GameOver;
        self.push_event(SessionEvent::GameOver {
            score,
            can_restart: choices.restart_from_start,
        });
        info!(score, ordinal = progression.current(), "player lost");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::engine::EnemyMovePolicy;
    use crate::entities::Enemy;
    use crate::types::EngineState;
    use std::fs;
    use std::path::PathBuf;

    const FIRST: &str = "3 5\nWWWWW\nWPoKG\nWWWWW\n";
    const SECOND: &str = "3 6\nWWWWWW\nWPKooG\nWWWWWW\n";
    const DEADLY: &str = "4 5\nWWWWW\nWP.CW\nWWWWW\nWKWGW\n";

    struct Fixed(Direction);

    impl EnemyMovePolicy for Fixed {
        fn choose_move(&mut self, _enemy: &Enemy, _board: &Board) -> Direction {
            self.0
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        ))
    }

    fn session_with(name: &str, levels: &[(&str, &str)]) -> (GameSession, PathBuf) {
        let root = temp_dir(name);
        let levels_dir = root.join("levels");
        fs::create_dir_all(&levels_dir).expect("create levels dir");
        for (file, text) in levels {
            fs::write(levels_dir.join(file), text).expect("write level");
        }
        let config = GameConfig {
            levels_dir,
            high_scores_path: root.join("highscores.txt"),
            ..GameConfig::default()
        };
        let session = GameSession::with_policy(config, Box::new(Fixed(Direction::Left)), Rng::new(3));
        (session, root)
    }

    fn tick_right(session: &mut GameSession, times: usize) -> Vec<TickReport> {
        session.set_intent(Direction::Right);
        (0..times)
            .map(|_| session.tick().expect("tick"))
            .collect()
    }

    #[test]
    fn campaign_advances_with_fresh_level_state() {
        let (mut session, root) = session_with(
            "session-advance",
            &[("level1.txt", FIRST), ("level2.txt", SECOND)],
        );
        session.start_campaign().expect("campaign starts");
        session.set_tick_period(100);

        let reports = tick_right(&mut session, 3);
        assert_eq!(reports[2].outcome, TickOutcome::LevelCleared);
        assert_eq!(reports[2].phase, SessionPhase::Playing);

        let snapshot = session.snapshot(true);
        assert_eq!(snapshot.level.as_ref().map(|level| level.ordinal), Some(2));
        assert_eq!(snapshot.score, 0);
        assert!(!snapshot.has_key);
        assert_eq!(snapshot.tick_ms, 100);
        let engine = session.engine().expect("level loaded");
        assert_eq!(engine.player().intent, Direction::None);
        assert_eq!(engine.state(), EngineState::Loaded);
        assert!(snapshot.events.contains(&SessionEvent::LevelCleared { ordinal: 1 }));
        assert!(snapshot.events.contains(&SessionEvent::LevelAdvanced { ordinal: 2 }));

        let reports = tick_right(&mut session, 4);
        assert_eq!(reports[3].outcome, TickOutcome::LevelCleared);
        assert_eq!(session.phase(), SessionPhase::CampaignComplete);
        assert_eq!(session.high_scores().scores(), vec![20]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn loss_records_score_and_offers_restart() {
        let (mut session, root) = session_with("session-loss", &[("level1.txt", DEADLY)]);
        session.start_campaign().expect("campaign starts");

        let report = tick_right(&mut session, 1)[0];
        assert_eq!(report.outcome, TickOutcome::PlayerLost);
        assert_eq!(report.phase, SessionPhase::GameOver);
        assert_eq!(session.high_scores().scores(), vec![0]);
        assert_eq!(
            session.loss_choices(),
            Some(LossChoices {
                return_to_menu: true,
                restart_from_start: true
            })
        );
        assert!(matches!(
            session.tick(),
            Err(GameError::State(StateError::Halted(_)))
        ));

        let events = session.snapshot(true).events;
        assert_eq!(
            events.last(),
            Some(&SessionEvent::GameOver {
                score: 0,
                can_restart: true
            })
        );
        assert!(session.snapshot(true).events.is_empty());

        session.restart_from_start().expect("restart");
        assert_eq!(session.phase(), SessionPhase::Playing);
        assert_eq!(session.engine().map(TickEngine::state), Some(EngineState::Loaded));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn custom_levels_do_not_offer_restart() {
        let (mut session, root) = session_with("session-custom", &[("trap.txt", DEADLY)]);
        session.start_custom("trap").expect("custom starts");
        assert_eq!(
            session.snapshot(false).level.map(|level| level.story_mode),
            Some(false)
        );

        tick_right(&mut session, 1);
        assert_eq!(session.phase(), SessionPhase::GameOver);
        assert!(matches!(
            session.restart_from_start(),
            Err(GameError::State(StateError::RestartUnavailable))
        ));

        session.return_to_menu();
        let snapshot = session.snapshot(false);
        assert_eq!(snapshot.phase, SessionPhase::Menu);
        assert!(snapshot.board.is_none());
        assert!(matches!(session.tick(), Err(GameError::State(StateError::NoLevel))));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn clearing_a_custom_level_completes_the_run() {
        let (mut session, root) = session_with("session-custom-clear", &[("dash.txt", FIRST)]);
        session.start_custom("dash").expect("custom starts");
        tick_right(&mut session, 3);
        assert_eq!(session.phase(), SessionPhase::CampaignComplete);
        assert_eq!(session.high_scores().scores(), vec![10]);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_next_level_halts_without_advancing() {
        let (mut session, root) = session_with("session-missing", &[("level1.txt", FIRST)]);
        session.start_campaign().expect("campaign starts");
        tick_right(&mut session, 3);

        let snapshot = session.snapshot(true);
        assert_eq!(snapshot.level.map(|level| level.ordinal), Some(1));
        assert!(snapshot
            .events
            .iter()
            .any(|event| matches!(event, SessionEvent::LevelLoadFailed { .. })));
        assert!(matches!(
            session.tick(),
            Err(GameError::State(StateError::Halted(_)))
        ));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn invalid_text_keeps_current_level() {
        let (mut session, root) = session_with("session-invalid", &[("level1.txt", FIRST)]);
        session.start_campaign().expect("campaign starts");
        tick_right(&mut session, 1);

        let error = session.load_level("2 2\nPK\nWW\n", 1, false).unwrap_err();
        assert!(matches!(error, GameError::Level(_)));
        let snapshot = session.snapshot(true);
        assert_eq!(snapshot.score, 10);
        assert_eq!(
            snapshot.events,
            vec![SessionEvent::ScoreChanged { delta: 10, score: 10 }]
        );
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn campaign_ordinal_is_clamped_once() {
        let (mut session, root) = session_with("session-ordinal", &[("level1.txt", FIRST)]);
        session.load_level(FIRST, 3, true).expect("level loads");
        assert_eq!(session.engine().map(TickEngine::ordinal), Some(2));
        assert_eq!(session.progression().map(|p| p.current()), Some(2));
        assert_eq!(
            session.snapshot(false).level.map(|level| level.ordinal),
            Some(2)
        );

        tick_right(&mut session, 3);
        assert_eq!(session.phase(), SessionPhase::CampaignComplete);
        assert!(session
            .snapshot(true)
            .events
            .contains(&SessionEvent::LevelCleared { ordinal: 2 }));

        session.load_level(FIRST, 0, true).expect("level loads");
        assert_eq!(session.engine().map(TickEngine::ordinal), Some(1));
        session.load_level(FIRST, 7, false).expect("level loads");
        assert_eq!(session.engine().map(TickEngine::ordinal), Some(1));
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn undrained_events_keep_only_the_newest() {
        let (mut session, root) = session_with("session-event-cap", &[]);
        let pellets = MAX_PENDING_EVENTS + 40;
        let row = format!("WP{}KGW", "o".repeat(pellets));
        let text = format!(
            "3 {cols}\n{wall}\n{row}\n{wall}\n",
            cols = row.len(),
            wall = "W".repeat(row.len())
        );
        session.load_level(&text, 1, false).expect("corridor loads");
        tick_right(&mut session, pellets);

        let events = session.snapshot(true).events;
        assert_eq!(events.len(), MAX_PENDING_EVENTS);
        assert_eq!(
            events.first(),
            Some(&SessionEvent::ScoreChanged {
                delta: 10,
                score: 410
            })
        );
        let last_score = (pellets * 10) as u32;
        assert_eq!(
            events.last(),
            Some(&SessionEvent::ScoreChanged {
                delta: 10,
                score: last_score
            })
        );
        assert!(session.snapshot(true).events.is_empty());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn speed_change_leaves_level_untouched() {
        let (mut session, root) = session_with("session-speed", &[("level1.txt", FIRST)]);
        session.start_campaign().expect("campaign starts");
        tick_right(&mut session, 1);
        let before = session.engine().map(|engine| engine.player().clone());

        assert_eq!(session.set_tick_period(100), 100);
        assert_eq!(session.set_tick_period(5), crate::constants::MIN_TICK_MS);
        assert_eq!(session.engine().map(|engine| engine.player().clone()), before);
        let _ = fs::remove_dir_all(&root);
    }
}
