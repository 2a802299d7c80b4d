use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    error::{ClientError, ClientResult},
    protocol::{
        GameAction, GameId, GameType, StartRequest, TradeAcceptRequest, TradeCreateRequest,
        TradeRejectRequest,
    },
    snapshot::Snapshot,
    transport::GameTransport,
};

/// Identity of the current user inside one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub game: GameId,
}

/// 클라이언트가 보유한 상태. 세션은 최대 하나, 스냅샷은 항상 통째로 교체됩니다.
#[derive(Debug, Default)]
pub struct ClientState {
    session: Option<Session>,
    snapshot: Option<Snapshot>,
}

impl ClientState {
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }
}

/// Translates user intents into server calls and keeps the local snapshot current.
///
/// Every mutating call either fails with the server's error or succeeds and is
/// followed by exactly one [`GameClient::update`]. Refreshes are not sequenced:
/// when two overlap, whichever response arrives last is kept.
pub struct GameClient<T: GameTransport> {
    transport: Arc<T>,
    state: Arc<RwLock<ClientState>>,
    game_type: GameType,
}

impl<T: GameTransport> Clone for GameClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            state: self.state.clone(),
            game_type: self.game_type,
        }
    }
}

impl<T: GameTransport> GameClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            state: Arc::new(RwLock::new(ClientState::default())),
            game_type: GameType::Private,
        }
    }

    /// Game type sent by [`GameClient::create_game`].
    pub fn with_game_type(mut self, game_type: GameType) -> Self {
        self.game_type = game_type;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> Option<Session> {
        self.state.read().session.clone()
    }

    pub fn game(&self) -> Option<GameId> {
        self.state.read().session.as_ref().map(|s| s.game.clone())
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.state.read().snapshot.clone()
    }

    pub fn player_info(&self) -> Option<Value> {
        self.state
            .read()
            .snapshot
            .as_ref()
            .map(|s| s.player_info().clone())
    }

    fn require_session(&self) -> ClientResult<Session> {
        self.session().ok_or(ClientError::NoSession)
    }

    fn set_session(&self, session: Session) {
        let mut state = self.state.write();
        if state.session.as_ref() != Some(&session) {
            // 다른 게임의 스냅샷이 남아있지 않도록
            state.snapshot = None;
        }
        state.session = Some(session);
    }

    /// Drops the session and snapshot.
    pub fn clear_session(&self) {
        let mut state = self.state.write();
        state.session = None;
        state.snapshot = None;
    }

    // --- 로그인 ---

    pub async fn create_game(&self, username: &str) -> ClientResult<()> {
        let response = self.transport.create(username, self.game_type).await?;
        info!(game = %response.game, username, "game created");
        self.set_session(Session {
            username: username.to_string(),
            game: response.game,
        });
        self.update().await
    }

    pub async fn join_game(&self, username: &str, game: &GameId) -> ClientResult<()> {
        let response = self.transport.login(username, game).await?;
        let game = response.game.unwrap_or_else(|| game.clone());
        info!(%game, username, "joined game");
        self.set_session(Session {
            username: username.to_string(),
            game,
        });
        self.update().await
    }

    /// Re-authenticates with the stored credential.
    ///
    /// A rejected or failed access check means "not logged in" and yields `Ok(None)`;
    /// only the refresh that follows a successful check can return an error.
    pub async fn check_access(&self) -> ClientResult<Option<Session>> {
        let response = match self.transport.access().await {
            Ok(response) => response,
            Err(e) => {
                debug!("access check skipped: {}", e);
                return Ok(None);
            }
        };

        let username = response
            .player_name
            .or_else(|| self.session().map(|s| s.username))
            .unwrap_or_default();
        let session = Session {
            username,
            game: response.game,
        };
        info!(game = %session.game, username = %session.username, "session resumed");
        self.set_session(session.clone());
        self.update().await?;
        Ok(Some(session))
    }

    // --- 게임 액션 ---

    pub async fn start_game(&self) -> ClientResult<()> {
        let session = self.require_session()?;
        self.perform(GameAction::Start(StartRequest {
            name: session.username,
            game: session.game,
        }))
        .await
    }

    pub async fn play_card_from_hand(&self, field_index: usize) -> ClientResult<()> {
        self.perform(GameAction::play_from_hand(field_index)).await
    }

    pub async fn play_card_from_market(&self, card_id: &str, field_index: usize) -> ClientResult<()> {
        self.perform(GameAction::play_from_market(card_id, field_index))
            .await
    }

    pub async fn play_card_from_pending(&self, card_id: &str, field_index: usize) -> ClientResult<()> {
        self.perform(GameAction::play_from_pending(card_id, field_index))
            .await
    }

    pub async fn draw_cards_to_market(&self) -> ClientResult<()> {
        self.perform(GameAction::DrawToMarket).await
    }

    pub async fn draw_cards_to_hand(&self) -> ClientResult<()> {
        self.perform(GameAction::DrawToHand).await
    }

    pub async fn create_trade(
        &self,
        card_ids: Vec<String>,
        other_player: &str,
        wants: Vec<String>,
    ) -> ClientResult<()> {
        self.perform(GameAction::CreateTrade(TradeCreateRequest {
            card_ids,
            other_player: other_player.to_string(),
            wants,
        }))
        .await
    }

    pub async fn accept_trade(&self, trade_id: &str, card_ids: Vec<String>) -> ClientResult<()> {
        self.perform(GameAction::AcceptTrade(TradeAcceptRequest {
            trade_id: trade_id.to_string(),
            card_ids,
        }))
        .await
    }

    pub async fn reject_trade(&self, trade_id: &str) -> ClientResult<()> {
        self.perform(GameAction::RejectTrade(TradeRejectRequest {
            trade_id: trade_id.to_string(),
        }))
        .await
    }

    pub async fn buy_field(&self) -> ClientResult<()> {
        self.perform(GameAction::BuyField).await
    }

    async fn perform(&self, action: GameAction) -> ClientResult<()> {
        let session = self.require_session()?;
        if let Err(e) = self.transport.send_action(&session.game, &action).await {
            warn!(game = %session.game, route = action.route(), "action failed: {}", e);
            return Err(e);
        }
        self.update().await
    }

    /// Fetches the full game state and replaces the held snapshot.
    pub async fn update(&self) -> ClientResult<()> {
        let game = self.require_session()?.game;
        let payload = match self.transport.fetch_game(&game).await {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%game, "refresh failed: {}", e);
                return Err(e);
            }
        };

        let snapshot = Snapshot::from_value(payload);
        let mut state = self.state.write();
        // 응답이 도착하는 사이 세션이 바뀌었다면 버림
        if state.session.as_ref().map(|s| &s.game) != Some(&game) {
            debug!(%game, "discarding snapshot for a session that is no longer active");
            return Ok(());
        }
        state.snapshot = Some(snapshot);
        debug!(%game, "snapshot replaced");
        Ok(())
    }
}
