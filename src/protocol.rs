use serde_json::{json, Value};

use crate::types::{Direction, Snapshot, Speed};

#[derive(Debug, PartialEq)]
pub enum ClientMessage {
    Input { dir: Direction },
    /// Already resolved from `preset` or `ms`; clamping happens in the session.
    Speed { period_ms: u64 },
    StartCampaign,
    StartCustom { name: String },
    Restart,
    Menu,
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ClientMessage::Input { dir })
        }
        "speed" => {
            let period_ms = match (object.get("preset"), object.get("ms")) {
                (Some(preset), _) => Speed::parse(preset.as_str()?)?.period_ms(),
                (None, Some(ms)) => parse_period_ms(ms)?,
                (None, None) => return None,
            };
            Some(ClientMessage::Speed { period_ms })
        }
        "start_campaign" => Some(ClientMessage::StartCampaign),
        "start_custom" => {
            let name = object.get("name")?.as_str()?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            Some(ClientMessage::StartCustom { name })
        }
        "restart" => Some(ClientMessage::Restart),
        "menu" => Some(ClientMessage::Menu),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn parse_period_ms(value: &Value) -> Option<u64> {
    if let Some(number) = value.as_u64() {
        return Some(number);
    }
    let number = value.as_f64()?;
    if !number.is_finite() || number < 0.0 || number > u32::MAX as f64 {
        return None;
    }
    Some(number.floor() as u64)
}

pub fn state_message(snapshot: &Snapshot) -> Value {
    json!({
        "type": "state",
        "snapshot": snapshot,
    })
}

pub fn error_message(message: &str) -> Value {
    json!({
        "type": "error",
        "message": message,
    })
}

pub fn pong_message(t: f64) -> Value {
    json!({
        "type": "pong",
        "t": t,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionPhase;

    #[test]
    fn parse_input_message() {
        assert_eq!(
            parse_client_message(r#"{"type":"input","dir":"left"}"#),
            Some(ClientMessage::Input {
                dir: Direction::Left
            })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"input","dir":"none"}"#),
            Some(ClientMessage::Input {
                dir: Direction::None
            })
        );
    }

    #[test]
    fn parse_input_rejects_invalid_direction() {
        assert!(parse_client_message(r#"{"type":"input","dir":"north"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"input"}"#).is_none());
    }

    #[test]
    fn parse_speed_preset_or_ms() {
        assert_eq!(
            parse_client_message(r#"{"type":"speed","preset":"fast"}"#),
            Some(ClientMessage::Speed { period_ms: 100 })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"speed","ms":150.7}"#),
            Some(ClientMessage::Speed { period_ms: 150 })
        );
        assert!(parse_client_message(r#"{"type":"speed","preset":"ludicrous"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"speed","ms":-5}"#).is_none());
        assert!(parse_client_message(r#"{"type":"speed"}"#).is_none());
    }

    #[test]
    fn parse_level_selection() {
        assert_eq!(
            parse_client_message(r#"{"type":"start_custom","name":" arena "}"#),
            Some(ClientMessage::StartCustom {
                name: "arena".to_string()
            })
        );
        assert!(parse_client_message(r#"{"type":"start_custom","name":""}"#).is_none());
        assert_eq!(
            parse_client_message(r#"{"type":"start_campaign"}"#),
            Some(ClientMessage::StartCampaign)
        );
        assert_eq!(
            parse_client_message(r#"{"type":"menu"}"#),
            Some(ClientMessage::Menu)
        );
    }

    #[test]
    fn parse_ping_requires_number() {
        assert!(matches!(
            parse_client_message(r#"{"type":"ping","t":12.5}"#),
            Some(ClientMessage::Ping { .. })
        ));
        assert!(parse_client_message(r#"{"type":"ping","t":"soon"}"#).is_none());
        assert!(parse_client_message("not json").is_none());
    }

    #[test]
    fn state_message_wraps_snapshot() {
        let snapshot = Snapshot {
            phase: SessionPhase::Menu,
            tick_ms: 200,
            level: None,
            board: None,
            score: 0,
            has_key: false,
            events: Vec::new(),
        };
        let message = state_message(&snapshot);
        assert_eq!(message["type"], "state");
        assert_eq!(message["snapshot"]["phase"], "menu");
        assert_eq!(message["snapshot"]["tickMs"], 200);
        assert_eq!(error_message("bad")["message"], "bad");
    }
}
