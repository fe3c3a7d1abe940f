//! Inbound event model
//!
//! The transport layer (out of scope here) decodes its wire format into these
//! types. The JSON shape is internally tagged on `kind`; an unrecognized kind
//! or polarity fails at decode time rather than being silently dropped.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Chat(ChatEvent),
    Kick(KickEvent),
    Join(PresenceEvent),
    Part(PresenceEvent),
    Mode(ModeEvent),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatEvent {
    pub from: String,
    pub channel: String,
    pub text: String,
    #[serde(default)]
    pub is_self: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KickEvent {
    pub channel: String,
    pub kicker: String,
    pub victim: String,
}

/// A join or part, depending on the enclosing `Event` variant.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceEvent {
    pub nick: String,
    pub channel: String,
    #[serde(default)]
    pub is_self: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeEvent {
    pub nick: String,
    pub channel: String,
    #[serde(default)]
    pub is_self: bool,
    pub changes: Vec<ModeChange>,
}

/// One (polarity, mode letter, target) triple from a mode change.
#[derive(Debug, Clone, Deserialize)]
pub struct ModeChange {
    pub polarity: Polarity,
    pub mode: char,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Polarity {
    #[serde(rename = "+")]
    Grant,
    #[serde(rename = "-")]
    Revoke,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_chat_event() {
        let event: Event = serde_json::from_str(
            r##"{"kind":"chat","from":"Bob","channel":"#rust","text":"hello"}"##,
        )
        .unwrap();
        match event {
            Event::Chat(chat) => {
                assert_eq!(chat.from, "Bob");
                assert!(!chat.is_self);
            }
            other => panic!("expected chat event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_mode_event() {
        let event: Event = serde_json::from_str(
            r##"{"kind":"mode","nick":"Op","channel":"#rust",
                "changes":[{"polarity":"+","mode":"o","target":"Bob"}]}"##,
        )
        .unwrap();
        match event {
            Event::Mode(mode) => {
                assert_eq!(mode.changes.len(), 1);
                assert_eq!(mode.changes[0].polarity, Polarity::Grant);
                assert_eq!(mode.changes[0].mode, 'o');
            }
            other => panic!("expected mode event, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let result: Result<Event, _> =
            serde_json::from_str(r##"{"kind":"quit","nick":"Bob","channel":"#rust"}"##);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_polarity_is_rejected() {
        let result: Result<Event, _> = serde_json::from_str(
            r##"{"kind":"mode","nick":"Op","channel":"#rust",
                "changes":[{"polarity":"~","mode":"o","target":"Bob"}]}"##,
        );
        assert!(result.is_err());
    }
}
