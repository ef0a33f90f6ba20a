use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;
use pacman_maze_engine::config::GameConfig;
use pacman_maze_engine::custom_maps::{import_level_file, Overwrite};
use pacman_maze_engine::error::{GameError, IntakeError};
use pacman_maze_engine::session::GameSession;
use pacman_maze_engine::types::{Direction, SessionEvent, SessionPhase, Speed};
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless runner for the tile maze engine")]
struct Cli {
    /// One character per tick: U, D, L, R latch a direction, `.` keeps the last one.
    #[arg(long, default_value = "")]
    moves: String,
    /// Play this level file as a custom run instead of the campaign.
    #[arg(long)]
    level: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    /// fast, normal or slow; only reported, ticks run back to back.
    #[arg(long)]
    speed: Option<String>,
    /// Validate and store a level file in the levels directory, then exit.
    #[arg(long)]
    upload: Option<PathBuf>,
    #[arg(long)]
    overwrite: bool,
    /// Print the ranked high-score table and exit.
    #[arg(long)]
    show_scores: bool,
    /// Print the uploaded custom levels and exit.
    #[arg(long)]
    list_levels: bool,
    #[arg(long)]
    levels_dir: Option<PathBuf>,
    #[arg(long)]
    high_scores: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RunResult {
    phase: SessionPhase,
    ordinal: Option<u32>,
    score: u32,
    ticks: usize,
    #[serde(rename = "tickMs")]
    tick_ms: u64,
    events: Vec<SessionEvent>,
    #[serde(rename = "highScores")]
    high_scores: Vec<u32>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<usize>,
    details: Value,
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config = resolve_config(&cli);

    if let Some(source) = cli.upload.as_ref() {
        let overwrite = if cli.overwrite {
            Overwrite::Confirmed
        } else {
            Overwrite::Ask
        };
        match import_level_file(source, &config.levels_dir, overwrite) {
            Ok(stored) => {
                emit_log(
                    "info",
                    "level_stored",
                    None,
                    json!({
                        "name": stored.name,
                        "path": stored.path.to_string_lossy(),
                        "replaced": stored.replaced,
                    }),
                );
                return;
            }
            Err(error) => {
                emit_log(
                    "error",
                    "upload_rejected",
                    None,
                    json!({
                        "source": source.to_string_lossy(),
                        "error": error.to_string(),
                        "needsConfirmation": matches!(error, IntakeError::AlreadyExists { .. }),
                    }),
                );
                std::process::exit(2);
            }
        }
    }

    let mut session = match cli.seed {
        Some(seed) => GameSession::with_seed(config, seed as u32),
        None => GameSession::new(config),
    };

    if cli.show_scores {
        for line in session.high_scores().ranked() {
            println!("{line}");
        }
        return;
    }
    if cli.list_levels {
        for entry in session.library().custom_levels() {
            println!("{}", json!({ "name": entry.name, "displayName": entry.display_name }));
        }
        return;
    }

    let script = match parse_script(&cli.moves) {
        Ok(script) => script,
        Err(symbol) => {
            emit_log(
                "error",
                "bad_move_script",
                None,
                json!({ "symbol": symbol.to_string() }),
            );
            std::process::exit(2);
        }
    };

    if let Some(speed) = cli.speed.as_deref() {
        match Speed::parse(speed) {
            Some(speed) => {
                session.set_tick_period(speed.period_ms());
            }
            None => emit_log("warn", "unknown_speed", None, json!({ "speed": speed })),
        }
    }

    if let Err(error) = start(&mut session, cli.level.as_ref()) {
        emit_log(
            "error",
            "level_load_failed",
            None,
            json!({ "error": error.to_string() }),
        );
        std::process::exit(2);
    }
    emit_log(
        "info",
        "run_started",
        None,
        json!({
            "level": cli.level.as_ref().map(|path| path.to_string_lossy().to_string()),
            "seed": cli.seed,
            "moves": script.len(),
        }),
    );

    let result = run_script(&mut session, &script, |tick, event| {
        emit_log("info", "session_event", Some(tick), json!(event));
    });

    println!(
        "{}",
        serde_json::to_string(&result).expect("run result should serialize")
    );
}

/// Library diagnostics go to stderr next to the JSON log lines; stdout
/// carries only results.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_config(cli: &Cli) -> GameConfig {
    let mut config = GameConfig::from_env();
    if let Some(dir) = cli.levels_dir.clone() {
        config.levels_dir = dir;
    }
    if let Some(path) = cli.high_scores.clone() {
        config.high_scores_path = path;
    }
    config
}

fn start(session: &mut GameSession, level: Option<&PathBuf>) -> Result<(), GameError> {
    match level {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|error| GameError::io(path, error))?;
            session.load_level(&text, 1, false)
        }
        None => session.start_campaign(),
    }
}

/// `None` entries keep the latched direction. Whitespace is ignored.
fn parse_script(raw: &str) -> Result<Vec<Option<Direction>>, char> {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '.' => Ok(None),
            other => Direction::from_script_char(other).map(Some).ok_or(other),
        })
        .collect()
}

/// Ticks once per script entry and stops early once the run is over.
fn run_script(
    session: &mut GameSession,
    script: &[Option<Direction>],
    mut on_event: impl FnMut(usize, &SessionEvent),
) -> RunResult {
    let mut events = Vec::new();
    let mut ticks = 0;

    for (idx, step) in script.iter().enumerate() {
        if let Some(dir) = step {
            session.set_intent(*dir);
        }
        let tick = idx + 1;
        let result = session.tick();
        ticks = tick;
        for event in session.snapshot(true).events {
            on_event(tick, &event);
            events.push(event);
        }
        if result.is_err() || session.phase() != SessionPhase::Playing {
            break;
        }
    }

    let snapshot = session.snapshot(false);
    RunResult {
        phase: snapshot.phase,
        ordinal: snapshot.level.map(|level| level.ordinal),
        score: snapshot.score,
        ticks,
        tick_ms: snapshot.tick_ms,
        events,
        high_scores: session.high_scores().scores(),
    }
}

/// JSON log lines go to stderr so stdout stays parseable as the result.
fn emit_log(level: &str, event: &str, tick: Option<usize>, details: Value) {
    eprintln!("{}", log_line(Utc::now(), level, event, tick, details));
}

fn log_line(
    at: DateTime<Utc>,
    level: &str,
    event: &str,
    tick: Option<usize>,
    details: Value,
) -> String {
    let log_line = StructuredLogLine {
        timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        level: level.to_string(),
        event: event.to_string(),
        tick,
        details,
    };
    serde_json::to_string(&log_line).unwrap_or_else(|_| {
        json!({
            "timestamp": log_line.timestamp,
            "level": "error",
            "event": "log_encode_failed",
        })
        .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        ))
    }

    fn session_in(root: &PathBuf, levels: &[(&str, &str)]) -> GameSession {
        let levels_dir = root.join("levels");
        fs::create_dir_all(&levels_dir).expect("create levels dir");
        for (name, text) in levels {
            fs::write(levels_dir.join(name), text).expect("write level");
        }
        GameSession::with_seed(
            GameConfig {
                levels_dir,
                high_scores_path: root.join("highscores.txt"),
                ..GameConfig::default()
            },
            7,
        )
    }

    #[test]
    fn log_lines_are_single_json_objects() {
        let at = Utc
            .with_ymd_and_hms(2026, 3, 4, 5, 6, 7)
            .single()
            .expect("valid instant");
        let line = log_line(at, "info", "session_event", Some(3), json!({ "kind": "keyPicked" }));
        assert!(!line.contains('\n'));
        let value: Value = serde_json::from_str(&line).expect("log line is json");
        assert_eq!(value["timestamp"], "2026-03-04T05:06:07.000Z");
        assert_eq!(value["level"], "info");
        assert_eq!(value["event"], "session_event");
        assert_eq!(value["tick"], 3);
        assert_eq!(value["details"]["kind"], "keyPicked");

        let untimed = log_line(at, "warn", "unknown_speed", None, json!({}));
        let value: Value = serde_json::from_str(&untimed).expect("log line is json");
        assert!(value.get("tick").is_none());
    }

    #[test]
    fn parse_script_reads_moves_and_holds() {
        assert_eq!(
            parse_script("R . u\nL"),
            Ok(vec![
                Some(Direction::Right),
                None,
                Some(Direction::Up),
                Some(Direction::Left)
            ])
        );
        assert_eq!(parse_script("RX"), Err('X'));
        assert_eq!(parse_script(""), Ok(Vec::new()));
    }

    #[test]
    fn scripted_run_finishes_campaign() {
        let root = temp_root("simulate-campaign");
        let mut session = session_in(
            &root,
            &[
                ("level1.txt", "3 5\nWWWWW\nWPoKG\nWWWWW\n"),
                ("level2.txt", "3 4\nWWWW\nWPKG\nWWWW\n"),
            ],
        );
        session.start_campaign().expect("campaign starts");

        let script = parse_script("R..R.....").expect("script parses");
        let mut seen = Vec::new();
        let result = run_script(&mut session, &script, |tick, event| {
            seen.push((tick, event.clone()))
        });

        assert_eq!(result.phase, SessionPhase::CampaignComplete);
        assert_eq!(result.ticks, 5);
        assert_eq!(result.high_scores, vec![0]);
        assert!(seen.contains(&(3, SessionEvent::LevelAdvanced { ordinal: 2 })));
        assert_eq!(seen.len(), result.events.len());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn scripted_run_stops_at_end_of_script() {
        let root = temp_root("simulate-partial");
        let mut session = session_in(&root, &[("level1.txt", "3 6\nWWWWWW\nWPooKG\nWWWWWW\n")]);
        session.start_campaign().expect("campaign starts");

        let script = parse_script("R.").expect("script parses");
        let result = run_script(&mut session, &script, |_, _| {});
        assert_eq!(result.phase, SessionPhase::Playing);
        assert_eq!(result.score, 20);
        assert_eq!(result.ordinal, Some(1));
        assert!(result.high_scores.is_empty());
        let _ = fs::remove_dir_all(&root);
    }
}
