//! Last full game state reported by the server.
//!
//! A [`Snapshot`] is always replaced wholesale; nothing here merges two payloads.
//! [`GameState`] is a typed reading of the same payload for renderers that want
//! fields instead of raw JSON.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientResult;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    all_data: Value,
    player_info: Value,
}

impl Snapshot {
    pub fn from_value(all_data: Value) -> Self {
        let player_info = all_data.get("player_info").cloned().unwrap_or(Value::Null);
        Self {
            all_data,
            player_info,
        }
    }

    pub fn all_data(&self) -> &Value {
        &self.all_data
    }

    /// The subset of the payload that belongs to the current user.
    pub fn player_info(&self) -> &Value {
        &self.player_info
    }

    pub fn game_state(&self) -> ClientResult<GameState> {
        Ok(GameState::deserialize(&self.all_data)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum GameStatus {
    Awaiting,
    Running,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Stage {
    #[serde(rename = "First Card")]
    FirstCard,
    #[serde(rename = "Second Card")]
    SecondCard,
    #[serde(rename = "Pre Market Flip")]
    PreMarketFlip,
    #[serde(rename = "Post Market Flip")]
    PostMarketFlip,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CardView {
    pub name: String,
    pub count: u32,
    pub values: Vec<u32>,
    #[serde(default)]
    pub img: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldView {
    pub name: String,
    pub count: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublicPlayer {
    pub name: String,
    pub hand_count: u32,
    pub fields: Vec<FieldView>,
    pub coins: u32,
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerInfo {
    #[serde(flatten)]
    pub public: PublicPlayer,
    #[serde(default)]
    pub hand: Vec<CardView>,
    #[serde(default)]
    pub pending_cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameState {
    pub player_info: PlayerInfo,
    #[serde(default)]
    pub players: Vec<PublicPlayer>,
    pub deck_count: u32,
    #[serde(default)]
    pub playthrough: u32,
    pub discard_count: u32,
    pub current_player: String,
    pub status: GameStatus,
    pub game_id: String,
    pub stage: Stage,
    /// 마켓 슬롯. 키는 "0", "1"
    #[serde(default)]
    pub market: BTreeMap<String, Option<CardView>>,
}

impl GameState {
    pub fn market_slot(&self, index: usize) -> Option<&CardView> {
        self.market
            .get(&index.to_string())
            .and_then(|slot| slot.as_ref())
    }

    pub fn is_my_turn(&self) -> bool {
        self.current_player == self.player_info.public.name
    }
}
