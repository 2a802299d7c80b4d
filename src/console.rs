//! Line commands for the interactive binary, and a plain-text rendering of the snapshot.

use std::fmt::Write as _;

use crate::{
    client::Session,
    error::ClientError,
    snapshot::{GameState, Snapshot},
    transport::GameTransport,
    view::{Notifier, ViewModel},
};

pub const HELP: &str = "\
commands:
  start                                   start the game (host only)
  hand <field>                            play top card of hand
  market <card_id> <field>                play card from market
  pending <card_id> <field>               play card from pending
  draw market | draw hand                 draw cards
  trade <player> <ids,...> <wants,...>    propose a trade
  accept <trade_id> <ids,...>             accept a trade
  reject <trade_id>                       reject a trade
  buy                                     buy third field
  refresh                                 fetch full state
  show                                    print current snapshot
  raw                                     print raw player_info
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    PlayHand { field: usize },
    PlayMarket { card_id: String, field: usize },
    PlayPending { card_id: String, field: usize },
    DrawMarket,
    DrawHand,
    Trade {
        other_player: String,
        card_ids: Vec<String>,
        wants: Vec<String>,
    },
    Accept { trade_id: String, card_ids: Vec<String> },
    Reject { trade_id: String },
    Buy,
    Refresh,
    Show,
    Raw,
    Help,
    Quit,
}

fn split_list(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_field(arg: Option<&str>) -> Result<usize, String> {
    let arg = arg.ok_or("missing field index")?;
    arg.parse()
        .map_err(|_| format!("invalid field index '{}'", arg))
}

impl std::str::FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let head = parts.next().ok_or("empty command")?;

        let command = match head {
            "start" => Command::Start,
            "hand" => Command::PlayHand {
                field: parse_field(parts.next())?,
            },
            "market" | "pending" => {
                let card_id = parts.next().ok_or("missing card id")?.to_string();
                let field = parse_field(parts.next())?;
                if head == "market" {
                    Command::PlayMarket { card_id, field }
                } else {
                    Command::PlayPending { card_id, field }
                }
            }
            "draw" => match parts.next() {
                Some("market") => Command::DrawMarket,
                Some("hand") => Command::DrawHand,
                _ => return Err("usage: draw market | draw hand".to_string()),
            },
            "trade" => {
                let other_player = parts.next().ok_or("missing player")?.to_string();
                let card_ids = split_list(parts.next().ok_or("missing card ids")?);
                let wants = parts.next().map(split_list).unwrap_or_default();
                Command::Trade {
                    other_player,
                    card_ids,
                    wants,
                }
            }
            "accept" => Command::Accept {
                trade_id: parts.next().ok_or("missing trade id")?.to_string(),
                card_ids: parts.next().map(split_list).unwrap_or_default(),
            },
            "reject" => Command::Reject {
                trade_id: parts.next().ok_or("missing trade id")?.to_string(),
            },
            "buy" => Command::Buy,
            "refresh" => Command::Refresh,
            "show" => Command::Show,
            "raw" => Command::Raw,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}'", other)),
        };

        match parts.next() {
            Some(extra) => Err(format!("unexpected argument '{}'", extra)),
            None => Ok(command),
        }
    }
}

/// Runs one command. Returns `false` when the loop should end.
pub async fn execute<T: GameTransport>(view: &ViewModel<T>, command: Command) -> bool {
    match command {
        Command::Start => {
            view.start_game().await;
        }
        Command::PlayHand { field } => {
            view.play_card_from_hand(field).await;
        }
        Command::PlayMarket { card_id, field } => {
            view.play_card_from_market(&card_id, field).await;
        }
        Command::PlayPending { card_id, field } => {
            view.play_card_from_pending(&card_id, field).await;
        }
        Command::DrawMarket => {
            view.draw_cards_to_market().await;
        }
        Command::DrawHand => {
            view.draw_cards_to_hand().await;
        }
        Command::Trade {
            other_player,
            card_ids,
            wants,
        } => {
            view.create_trade(card_ids, &other_player, wants).await;
        }
        Command::Accept { trade_id, card_ids } => {
            view.accept_trade(&trade_id, card_ids).await;
        }
        Command::Reject { trade_id } => {
            view.reject_trade(&trade_id).await;
        }
        Command::Buy => {
            view.buy_field().await;
        }
        Command::Refresh => {
            view.update().await;
        }
        Command::Show => {}
        Command::Raw => {
            match view.player_info() {
                Some(info) => println!("{:#}", info),
                None => println!("(no snapshot yet)"),
            }
            return true;
        }
        Command::Help => {
            println!("{}", HELP);
            return true;
        }
        Command::Quit => return false,
    }

    println!("{}", render(view.session().as_ref(), view.snapshot().as_ref()));
    true
}

pub fn render(session: Option<&Session>, snapshot: Option<&Snapshot>) -> String {
    let mut out = String::new();
    match session {
        Some(s) => {
            let _ = writeln!(out, "game {} as {}", s.game, s.username);
        }
        None => {
            let _ = writeln!(out, "not logged in");
            return out;
        }
    }

    let Some(snapshot) = snapshot else {
        let _ = writeln!(out, "(no snapshot yet)");
        return out;
    };

    match snapshot.game_state() {
        Ok(state) => render_state(&mut out, &state),
        // 형식이 맞지 않으면 원본 그대로 출력
        Err(_) => {
            let _ = writeln!(out, "{:#}", snapshot.all_data());
        }
    }
    out
}

fn render_state(out: &mut String, state: &GameState) {
    let me = &state.player_info;
    let _ = writeln!(
        out,
        "status {:?} | stage {:?} | turn {}{}",
        state.status,
        state.stage,
        state.current_player,
        if state.is_my_turn() { " (you)" } else { "" }
    );
    let _ = writeln!(
        out,
        "deck {} | discard {} | playthrough {}",
        state.deck_count, state.discard_count, state.playthrough
    );

    for slot in 0..2 {
        let card = state
            .market_slot(slot)
            .map(|c| c.name.as_str())
            .unwrap_or("-");
        let _ = writeln!(out, "market[{}] {}", slot, card);
    }

    let _ = writeln!(out, "coins {}", me.public.coins);
    for (i, field) in me.public.fields.iter().enumerate() {
        let lock = if field.enabled { "" } else { " (locked)" };
        let _ = writeln!(out, "field[{}] {} x{}{}", i, field.name, field.count, lock);
    }
    let hand: Vec<&str> = me.hand.iter().map(|c| c.name.as_str()).collect();
    let _ = writeln!(out, "hand [{}]", hand.join(", "));
    if !me.pending_cards.is_empty() {
        let pending: Vec<&str> = me.pending_cards.iter().map(|c| c.name.as_str()).collect();
        let _ = writeln!(out, "pending [{}]", pending.join(", "));
    }
    for player in state.players.iter().filter(|p| p.name != me.public.name) {
        let _ = writeln!(
            out,
            "  {} - hand {} coins {}{}",
            player.name,
            player.hand_count,
            player.coins,
            if player.is_host { " (host)" } else { "" }
        );
    }
}

/// Prints alerts to stderr.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, error: &ClientError) {
        eprintln!("[alert] {}", error.user_message());
    }
}
