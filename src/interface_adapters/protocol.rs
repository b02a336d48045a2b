// Wire protocol DTOs and conversions for the peer link and the local client.

use crate::domain::{Choice, GameStatus, RoundResult, Weapon};
use crate::use_cases::{GameSnapshot, Intent, PeerCommand, PeerEvent};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponDto {
    Rock,
    Paper,
    Scissors,
}

impl From<Weapon> for WeaponDto {
    fn from(weapon: Weapon) -> Self {
        match weapon {
            Weapon::Rock => WeaponDto::Rock,
            Weapon::Paper => WeaponDto::Paper,
            Weapon::Scissors => WeaponDto::Scissors,
        }
    }
}

impl From<WeaponDto> for Weapon {
    fn from(weapon: WeaponDto) -> Self {
        match weapon {
            WeaponDto::Rock => Weapon::Rock,
            WeaponDto::Paper => Weapon::Paper,
            WeaponDto::Scissors => Weapon::Scissors,
        }
    }
}

/// Frames the two peers exchange over the WebSocket link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PeerMessage {
    // First frame in each direction.
    Hello(HelloPayload),
    StartRequest,
    StartResponse { accept: bool },
    // Sent once the sender's countdown has run out; `null` means no weapon was chosen.
    Reveal { weapon: Option<WeaponDto> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloPayload {
    pub display_name: String,
}

impl From<PeerCommand> for PeerMessage {
    fn from(command: PeerCommand) -> Self {
        match command {
            PeerCommand::RequestStart => PeerMessage::StartRequest,
            PeerCommand::AnswerStart { accept } => PeerMessage::StartResponse { accept },
            PeerCommand::Reveal(weapon) => PeerMessage::Reveal {
                weapon: weapon.map(WeaponDto::from),
            },
        }
    }
}

impl PeerMessage {
    /// Session event carried by this frame; `Hello` belongs to the handshake only.
    pub fn into_event(self) -> Option<PeerEvent> {
        match self {
            PeerMessage::Hello(_) => None,
            PeerMessage::StartRequest => Some(PeerEvent::StartRequested),
            PeerMessage::StartResponse { accept } => Some(PeerEvent::StartAnswered { accept }),
            PeerMessage::Reveal { weapon } => Some(PeerEvent::Revealed(weapon.map(Weapon::from))),
        }
    }
}

/// Intents the local player's client posts to this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    ChooseWeapon { weapon: WeaponDto },
    RequestStart,
    RespondStart { accept: bool },
}

impl From<ClientMessage> for Intent {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::ChooseWeapon { weapon } => Intent::ChooseWeapon(weapon.into()),
            ClientMessage::RequestStart => Intent::RequestStart,
            ClientMessage::RespondStart { accept } => Intent::RespondStart { accept },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusDto {
    AwaitingStart,
    PendingStartSent,
    PendingStartReceived,
    Countdown,
    AwaitingReveal,
    Finished,
    SessionEnded,
}

impl From<GameStatus> for GameStatusDto {
    fn from(status: GameStatus) -> Self {
        match status {
            GameStatus::AwaitingStart => GameStatusDto::AwaitingStart,
            GameStatus::PendingStartSent => GameStatusDto::PendingStartSent,
            GameStatus::PendingStartReceived => GameStatusDto::PendingStartReceived,
            GameStatus::Countdown => GameStatusDto::Countdown,
            GameStatus::AwaitingReveal => GameStatusDto::AwaitingReveal,
            GameStatus::Finished => GameStatusDto::Finished,
            GameStatus::SessionEnded => GameStatusDto::SessionEnded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundResultDto {
    LocalWin,
    OtherWin,
    Draw,
}

impl From<RoundResult> for RoundResultDto {
    fn from(result: RoundResult) -> Self {
        match result {
            RoundResult::LocalWin => RoundResultDto::LocalWin,
            RoundResult::OtherWin => RoundResultDto::OtherWin,
            RoundResult::Draw => RoundResultDto::Draw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreDto {
    pub local: u32,
    pub other: u32,
}

/// Presentation view of the session for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotDto {
    pub session_active: bool,
    pub session_id: Option<String>,
    pub local_name: String,
    pub peer_name: Option<String>,
    pub status: Option<GameStatusDto>,
    pub status_message: String,
    pub countdown: Option<u32>,
    pub local_weapon: Option<WeaponDto>,
    // Stays hidden until the round has a result.
    pub other_weapon: Option<WeaponDto>,
    pub local_forfeited: bool,
    pub other_forfeited: bool,
    pub result: Option<RoundResultDto>,
    pub score: ScoreDto,
    pub rounds_played: u32,
}

impl SnapshotDto {
    /// View used before any peer has connected.
    pub fn idle(local_name: &str) -> Self {
        Self {
            session_active: false,
            session_id: None,
            local_name: local_name.to_string(),
            peer_name: None,
            status: None,
            status_message: "Waiting for an opponent".to_string(),
            countdown: None,
            local_weapon: None,
            other_weapon: None,
            local_forfeited: false,
            other_forfeited: false,
            result: None,
            score: ScoreDto { local: 0, other: 0 },
            rounds_played: 0,
        }
    }
}

impl From<&GameSnapshot> for SnapshotDto {
    fn from(snapshot: &GameSnapshot) -> Self {
        let revealed = snapshot.result.is_some();
        Self {
            session_active: snapshot.is_active(),
            session_id: Some(snapshot.session_id.to_string()),
            local_name: snapshot.local_name.to_string(),
            peer_name: Some(snapshot.peer_name.to_string()),
            status: Some(snapshot.status.into()),
            status_message: status_message(snapshot),
            countdown: snapshot.countdown,
            local_weapon: snapshot.local.choice.weapon().map(WeaponDto::from),
            other_weapon: snapshot
                .other
                .choice
                .weapon()
                .filter(|_| revealed)
                .map(WeaponDto::from),
            local_forfeited: snapshot.local.choice == Choice::Forfeited,
            other_forfeited: snapshot.other.choice == Choice::Forfeited,
            result: snapshot.result.map(RoundResultDto::from),
            score: ScoreDto {
                local: snapshot.score.local,
                other: snapshot.score.other,
            },
            rounds_played: snapshot.rounds_played,
        }
    }
}

/// One-line description of the session shown above the weapons.
pub fn status_message(snapshot: &GameSnapshot) -> String {
    let peer = &snapshot.peer_name;
    match (snapshot.status, snapshot.result) {
        (GameStatus::AwaitingStart, _) => format!("Start a game against {peer}"),
        (GameStatus::PendingStartSent, _) => format!("Waiting for {peer} to accept"),
        (GameStatus::PendingStartReceived, _) => {
            format!("{peer} would like to start the game. Are you ready?")
        }
        (GameStatus::Countdown, _) => "Choose your weapon".to_string(),
        (GameStatus::AwaitingReveal, _) => format!("Waiting for {peer}'s weapon"),
        (GameStatus::Finished, Some(RoundResult::LocalWin)) => "You win!".to_string(),
        (GameStatus::Finished, Some(RoundResult::OtherWin)) => format!("{peer} wins"),
        (GameStatus::Finished, _) => "Draw".to_string(),
        (GameStatus::SessionEnded, _) => "Your opponent has left the game.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Play, Player, ScoreSnapshot};
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn snapshot(status: GameStatus, other: Choice, result: Option<RoundResult>) -> GameSnapshot {
        GameSnapshot {
            session_id: Arc::from("s-1"),
            local_name: Arc::from("Ada"),
            peer_name: Arc::from("Grace"),
            status,
            countdown: None,
            local: Play {
                player: Player::Local,
                choice: Choice::Committed(Weapon::Rock),
            },
            other: Play {
                player: Player::Other,
                choice: other,
            },
            result,
            score: ScoreSnapshot { local: 2, other: 1 },
            rounds_played: 3,
            ignored_events: 0,
        }
    }

    #[test]
    fn when_peer_frames_are_parsed_then_they_map_to_session_events() {
        let start: PeerMessage =
            serde_json::from_value(json!({ "type": "StartRequest" })).expect("valid frame");
        let reveal: PeerMessage = serde_json::from_value(
            json!({ "type": "Reveal", "data": { "weapon": "scissors" } }),
        )
        .expect("valid frame");
        let empty: PeerMessage =
            serde_json::from_value(json!({ "type": "Reveal", "data": { "weapon": null } }))
                .expect("valid frame");

        assert_eq!(start.into_event(), Some(PeerEvent::StartRequested));
        assert_eq!(
            reveal.into_event(),
            Some(PeerEvent::Revealed(Some(Weapon::Scissors)))
        );
        assert_eq!(empty.into_event(), Some(PeerEvent::Revealed(None)));
        assert!(
            serde_json::from_value::<PeerMessage>(
                json!({ "type": "Weapon", "data": { "weapon": "rock" } })
            )
            .is_err()
        );
    }

    #[test]
    fn when_countdown_expires_without_weapon_then_reveal_is_null() {
        let frame = serde_json::to_value(PeerMessage::from(PeerCommand::Reveal(None)))
            .expect("serializable");

        assert_eq!(frame, json!({ "type": "Reveal", "data": { "weapon": null } }));
    }

    #[test]
    fn when_commands_are_serialized_then_frames_use_tagged_layout() {
        let frame = serde_json::to_value(PeerMessage::from(PeerCommand::AnswerStart {
            accept: false,
        }))
        .expect("serializable");
        let hello = serde_json::to_value(PeerMessage::Hello(HelloPayload {
            display_name: "Ada".to_string(),
        }))
        .expect("serializable");

        assert_eq!(
            frame,
            json!({ "type": "StartResponse", "data": { "accept": false } })
        );
        assert_eq!(
            hello,
            json!({ "type": "Hello", "data": { "display_name": "Ada" } })
        );
    }

    #[test]
    fn when_hello_arrives_mid_session_then_it_carries_no_event() {
        let hello = PeerMessage::Hello(HelloPayload {
            display_name: "Grace".to_string(),
        });

        assert_eq!(hello.into_event(), None);
    }

    #[test]
    fn when_client_posts_intent_then_it_becomes_a_local_intent() {
        let choose: ClientMessage = serde_json::from_value(
            json!({ "type": "ChooseWeapon", "data": { "weapon": "paper" } }),
        )
        .expect("valid intent");
        let respond: ClientMessage =
            serde_json::from_value(json!({ "type": "RespondStart", "data": { "accept": true } }))
                .expect("valid intent");

        assert_eq!(Intent::from(choose), Intent::ChooseWeapon(Weapon::Paper));
        assert_eq!(Intent::from(respond), Intent::RespondStart { accept: true });
        assert!(serde_json::from_value::<ClientMessage>(json!({ "type": "Cheat" })).is_err());
    }

    #[test]
    fn when_round_is_unresolved_then_other_weapon_is_hidden() {
        let counting = snapshot(
            GameStatus::Countdown,
            Choice::Committed(Weapon::Paper),
            None,
        );

        let dto = SnapshotDto::from(&counting);

        assert_eq!(dto.local_weapon, Some(WeaponDto::Rock));
        assert_eq!(dto.other_weapon, None);
        assert_eq!(dto.status_message, "Choose your weapon");
    }

    #[test]
    fn when_waiting_for_peer_reveal_then_other_weapon_stays_hidden() {
        let waiting = snapshot(GameStatus::AwaitingReveal, Choice::Pending, None);

        let value = serde_json::to_value(SnapshotDto::from(&waiting)).expect("serializable");

        assert_eq!(value["status"], json!("awaiting_reveal"));
        assert_eq!(value["other_weapon"], Value::Null);
        assert_eq!(value["status_message"], json!("Waiting for Grace's weapon"));
    }

    #[test]
    fn when_round_is_resolved_then_both_weapons_and_result_are_shown() {
        let finished = snapshot(
            GameStatus::Finished,
            Choice::Committed(Weapon::Paper),
            Some(RoundResult::OtherWin),
        );

        let dto = SnapshotDto::from(&finished);

        assert_eq!(dto.other_weapon, Some(WeaponDto::Paper));
        assert_eq!(dto.result, Some(RoundResultDto::OtherWin));
        assert_eq!(dto.status_message, "Grace wins");
        assert_eq!(dto.score, ScoreDto { local: 2, other: 1 });
        assert!(dto.session_active);
    }

    #[test]
    fn when_other_forfeits_then_flag_is_set() {
        let finished = snapshot(
            GameStatus::Finished,
            Choice::Forfeited,
            Some(RoundResult::LocalWin),
        );

        let dto = SnapshotDto::from(&finished);

        assert!(dto.other_forfeited);
        assert_eq!(dto.other_weapon, None);
        assert_eq!(dto.status_message, "You win!");
    }

    #[test]
    fn when_session_has_ended_then_snapshot_is_inactive() {
        let ended = snapshot(GameStatus::SessionEnded, Choice::Pending, None);

        let value = serde_json::to_value(SnapshotDto::from(&ended)).expect("serializable");

        assert_eq!(value["session_active"], json!(false));
        assert_eq!(value["status"], json!("session_ended"));
        assert_eq!(value["status_message"], json!("Your opponent has left the game."));
    }
}
