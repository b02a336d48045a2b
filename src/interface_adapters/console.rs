// Terminal front end: stdin commands in, rendered snapshots out.

use crate::domain::{Choice, GameStatus, Weapon};
use crate::interface_adapters::protocol::status_message;
use crate::use_cases::{GameSnapshot, Intent, SessionEvent, SessionRegistry};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Intent(Intent),
    Quit,
}

pub fn parse_command(line: &str) -> Option<ConsoleCommand> {
    let command = match line.trim().to_ascii_lowercase().as_str() {
        "rock" | "r" => ConsoleCommand::Intent(Intent::ChooseWeapon(Weapon::Rock)),
        "paper" | "p" => ConsoleCommand::Intent(Intent::ChooseWeapon(Weapon::Paper)),
        "scissors" | "s" => ConsoleCommand::Intent(Intent::ChooseWeapon(Weapon::Scissors)),
        "start" => ConsoleCommand::Intent(Intent::RequestStart),
        "accept" | "y" => ConsoleCommand::Intent(Intent::RespondStart { accept: true }),
        "decline" | "n" => ConsoleCommand::Intent(Intent::RespondStart { accept: false }),
        "quit" | "leave" => ConsoleCommand::Quit,
        _ => return None,
    };
    Some(command)
}

fn weapon_label(choice: Choice, revealed: bool) -> &'static str {
    match choice {
        Choice::Committed(_) if !revealed => "ready",
        Choice::Committed(Weapon::Rock) => "rock",
        Choice::Committed(Weapon::Paper) => "paper",
        Choice::Committed(Weapon::Scissors) => "scissors",
        Choice::Forfeited => "none",
        Choice::Pending => "-",
    }
}

/// Text block printed after every snapshot change.
pub fn render_snapshot(snapshot: &GameSnapshot) -> String {
    let mut out = String::new();
    let revealed = snapshot.result.is_some();

    let _ = writeln!(
        out,
        "{} {}  -  {} {}",
        snapshot.local_name, snapshot.score.local, snapshot.score.other, snapshot.peer_name
    );
    match (snapshot.status, snapshot.countdown) {
        (GameStatus::Countdown, Some(n)) => {
            let _ = writeln!(out, "[{n}] {}", status_message(snapshot));
        }
        _ => {
            let _ = writeln!(out, "{}", status_message(snapshot));
        }
    }
    if matches!(
        snapshot.status,
        GameStatus::Countdown | GameStatus::AwaitingReveal | GameStatus::Finished
    ) {
        let _ = writeln!(
            out,
            "you: {}  |  {}: {}",
            weapon_label(snapshot.local.choice, true),
            snapshot.peer_name,
            weapon_label(snapshot.other.choice, revealed)
        );
    }
    out
}

/// Reads commands from stdin and forwards them to the active session.
pub async fn run_console_input(registry: Arc<SessionRegistry>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "console read failed");
                break;
            }
        };

        let Some(command) = parse_command(&line) else {
            println!("commands: rock|r paper|p scissors|s start accept|y decline|n quit");
            continue;
        };
        let Some(session) = registry.active().await else {
            println!("no opponent connected yet");
            continue;
        };

        match command {
            ConsoleCommand::Intent(intent) => {
                if session.event_tx.send(SessionEvent::Local(intent)).await.is_err() {
                    println!("the session has ended");
                }
            }
            ConsoleCommand::Quit => {
                registry.end_active().await;
            }
        }
    }
}

/// Prints every snapshot change until the registry goes away.
pub async fn run_console_output(registry: Arc<SessionRegistry>) {
    let mut presentation = registry.presentation();
    drop(registry);

    while presentation.changed().await.is_ok() {
        let rendered = presentation.borrow_and_update().as_ref().map(render_snapshot);
        if let Some(rendered) = rendered {
            println!("{rendered}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Play, Player, RoundResult, ScoreSnapshot};

    fn snapshot(status: GameStatus, countdown: Option<u32>, result: Option<RoundResult>) -> GameSnapshot {
        // The opponent's weapon is only known locally once the round is scored.
        let other = if result.is_some() {
            Choice::Committed(Weapon::Rock)
        } else {
            Choice::Pending
        };
        GameSnapshot {
            session_id: Arc::from("s-1"),
            local_name: Arc::from("Ada"),
            peer_name: Arc::from("Grace"),
            status,
            countdown,
            local: Play {
                player: Player::Local,
                choice: Choice::Committed(Weapon::Paper),
            },
            other: Play {
                player: Player::Other,
                choice: other,
            },
            result,
            score: ScoreSnapshot { local: 1, other: 0 },
            rounds_played: 1,
            ignored_events: 0,
        }
    }

    #[test]
    fn when_lines_are_typed_then_commands_are_recognised() {
        assert_eq!(
            parse_command(" Rock "),
            Some(ConsoleCommand::Intent(Intent::ChooseWeapon(Weapon::Rock)))
        );
        assert_eq!(
            parse_command("y"),
            Some(ConsoleCommand::Intent(Intent::RespondStart { accept: true }))
        );
        assert_eq!(
            parse_command("start"),
            Some(ConsoleCommand::Intent(Intent::RequestStart))
        );
        assert_eq!(parse_command("quit"), Some(ConsoleCommand::Quit));
        assert_eq!(parse_command("lizard"), None);
    }

    #[test]
    fn when_counting_down_then_opponent_weapon_is_masked() {
        let rendered = render_snapshot(&snapshot(GameStatus::Countdown, Some(2), None));

        assert!(rendered.contains("[2] Choose your weapon"));
        assert!(rendered.contains("you: paper"));
        assert!(rendered.contains("Grace: -"));
        assert!(!rendered.contains("rock"));
    }

    #[test]
    fn when_waiting_for_reveal_then_own_weapon_stays_on_screen() {
        let rendered = render_snapshot(&snapshot(GameStatus::AwaitingReveal, None, None));

        assert!(rendered.contains("Waiting for Grace's weapon"));
        assert!(rendered.contains("you: paper"));
        assert!(!rendered.contains("rock"));
    }

    #[test]
    fn when_finished_then_both_weapons_and_score_are_shown() {
        let rendered = render_snapshot(&snapshot(
            GameStatus::Finished,
            None,
            Some(RoundResult::LocalWin),
        ));

        assert!(rendered.starts_with("Ada 1  -  0 Grace"));
        assert!(rendered.contains("You win!"));
        assert!(rendered.contains("Grace: rock"));
    }
}
