use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// 서버가 발급하는 게임 식별자
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GameId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GameId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    Public,
    Private,
}

impl std::str::FromStr for GameType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(ClientError::Validation {
                message: format!("unknown game type '{}'", other),
            }),
        }
    }
}

// --- 요청 본문 ---

#[derive(Debug, Serialize)]
pub struct CreateRequest<'a> {
    pub name: &'a str,
    pub game_type: GameType,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub name: &'a str,
    pub game: &'a GameId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartRequest {
    pub name: String,
    pub game: GameId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayRequest {
    pub field_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeCreateRequest {
    pub card_ids: Vec<String>,
    pub other_player: String,
    pub wants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeAcceptRequest {
    pub trade_id: String,
    pub card_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRejectRequest {
    pub trade_id: String,
}

// --- 응답 본문 ---

#[derive(Debug, Clone, Deserialize)]
pub struct CreateResponse {
    pub game: GameId,
}

/// login 응답. 서버에 따라 `{game}` 또는 `{success}` 만 돌아옴
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinResponse {
    #[serde(default)]
    pub game: Option<GameId>,
    #[serde(default)]
    pub success: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessResponse {
    pub game: GameId,
    #[serde(default)]
    pub player_name: Option<String>,
}

/// Game-scoped POST routes under `/api/game/{game}/`.
#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    Start(StartRequest),
    PlayFromHand(PlayRequest),
    PlayFromMarket(PlayRequest),
    PlayFromPending(PlayRequest),
    DrawToMarket,
    DrawToHand,
    CreateTrade(TradeCreateRequest),
    AcceptTrade(TradeAcceptRequest),
    RejectTrade(TradeRejectRequest),
    BuyField,
}

impl GameAction {
    pub fn play_from_hand(field_index: usize) -> Self {
        Self::PlayFromHand(PlayRequest {
            field_index,
            card_id: None,
        })
    }

    pub fn play_from_market(card_id: impl Into<String>, field_index: usize) -> Self {
        Self::PlayFromMarket(PlayRequest {
            field_index,
            card_id: Some(card_id.into()),
        })
    }

    pub fn play_from_pending(card_id: impl Into<String>, field_index: usize) -> Self {
        Self::PlayFromPending(PlayRequest {
            field_index,
            card_id: Some(card_id.into()),
        })
    }

    /// 게임 경로 뒤에 붙는 세그먼트
    pub fn route(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::PlayFromHand(_) => "play/hand",
            Self::PlayFromMarket(_) => "play/market",
            Self::PlayFromPending(_) => "play/pending",
            Self::DrawToMarket => "draw/market",
            Self::DrawToHand => "draw/hand",
            Self::CreateTrade(_) => "trade/create",
            Self::AcceptTrade(_) => "trade/accept",
            Self::RejectTrade(_) => "trade/reject",
            Self::BuyField => "buy",
        }
    }

    /// JSON body, or `None` for routes that post nothing.
    pub fn body(&self) -> ClientResult<Option<Value>> {
        let value = match self {
            Self::Start(req) => serde_json::to_value(req)?,
            Self::PlayFromHand(req) | Self::PlayFromMarket(req) | Self::PlayFromPending(req) => {
                serde_json::to_value(req)?
            }
            Self::CreateTrade(req) => serde_json::to_value(req)?,
            Self::AcceptTrade(req) => serde_json::to_value(req)?,
            Self::RejectTrade(req) => serde_json::to_value(req)?,
            Self::DrawToMarket | Self::DrawToHand | Self::BuyField => return Ok(None),
        };
        Ok(Some(value))
    }
}

pub fn game_path(game: &GameId) -> String {
    format!("api/game/{}", game)
}

pub fn action_path(game: &GameId, action: &GameAction) -> String {
    format!("api/game/{}/{}", game, action.route())
}

// --- 실시간 채널 ---

pub const EVENT_LOGIN: &str = "login";
pub const EVENT_CLIENT_FULL: &str = "client full";
pub const EVENT_CLIENT_UPDATE: &str = "client update";
pub const EVENT_ERROR: &str = "error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginPayload {
    pub game: GameId,
    pub token: String,
}

/// Named event frame exchanged over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn login(payload: &LoginPayload) -> ClientResult<Self> {
        Ok(Self {
            event: EVENT_LOGIN.to_string(),
            data: serde_json::to_value(payload)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// 전체 상태
    Full(Value),
    /// 이전 상태 대비 JSON patch
    Update(Value),
    Error(String),
    Other { event: String, data: Value },
}

impl From<Envelope> for PushEvent {
    fn from(envelope: Envelope) -> Self {
        // 서버는 payload 를 JSON 문자열로 한 번 더 감싸서 보냄
        let data = match envelope.data {
            Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            other => other,
        };
        match envelope.event.as_str() {
            EVENT_CLIENT_FULL => Self::Full(data),
            EVENT_CLIENT_UPDATE => Self::Update(data),
            EVENT_ERROR => Self::Error(match data {
                Value::String(message) => message,
                other => other.to_string(),
            }),
            _ => Self::Other {
                event: envelope.event,
                data,
            },
        }
    }
}
