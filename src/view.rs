use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tbg_env::SyncMode;
use tracing::{error, info, warn};
use url::Url;

use crate::{
    client::{GameClient, Session},
    error::{ClientError, ClientResult},
    poller::Poller,
    protocol::{GameId, LoginPayload},
    push::{LoggingPushHandler, PushChannel, PushHandler},
    snapshot::Snapshot,
    transport::GameTransport,
};

/// User-visible failure surface (the blocking alert of a UI).
pub trait Notifier: Send + Sync {
    fn alert(&self, error: &ClientError);
}

/// Headless notifier: every alert becomes an `error!` event.
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn alert(&self, error: &ClientError) {
        error!("{}", error.user_message());
    }
}

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub mode: SyncMode,
    pub poll_interval: Duration,
    /// 실시간 채널 주소. Push 모드에서만 사용
    pub ws_url: Option<Url>,
}

impl SyncSettings {
    pub fn manual() -> Self {
        Self {
            mode: SyncMode::Manual,
            poll_interval: Duration::from_secs(2),
            ws_url: None,
        }
    }

    pub fn polling(poll_interval: Duration) -> Self {
        Self {
            mode: SyncMode::Polling,
            poll_interval,
            ws_url: None,
        }
    }

    pub fn push(ws_url: Url) -> Self {
        Self {
            mode: SyncMode::Push,
            poll_interval: Duration::from_secs(2),
            ws_url: Some(ws_url),
        }
    }

    pub fn from_config(config: &tbg_env::ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            mode: config.sync.mode,
            poll_interval: config.sync.poll_interval(),
            ws_url: Some(Url::parse(&config.server.ws_url())?),
        })
    }
}

/// Binds a [`GameClient`] to a presentation layer.
///
/// Operations return `true` on success; failures are handed to the [`Notifier`]
/// (except for [`ViewModel::check_access`], which never alerts). Background
/// sync started after a login is owned here and ends with [`ViewModel::teardown`]
/// or when the view is dropped.
pub struct ViewModel<T: GameTransport> {
    client: GameClient<T>,
    notifier: Arc<dyn Notifier>,
    push_handler: Arc<dyn PushHandler>,
    sync: SyncSettings,
    poller: Option<Poller>,
    push: Option<PushChannel>,
}

impl<T: GameTransport> ViewModel<T> {
    pub fn new(client: GameClient<T>, notifier: Arc<dyn Notifier>, sync: SyncSettings) -> Self {
        Self {
            client,
            notifier,
            push_handler: Arc::new(LoggingPushHandler),
            sync,
            poller: None,
            push: None,
        }
    }

    pub fn with_push_handler(mut self, handler: Arc<dyn PushHandler>) -> Self {
        self.push_handler = handler;
        self
    }

    pub fn client(&self) -> &GameClient<T> {
        &self.client
    }

    pub fn session(&self) -> Option<Session> {
        self.client.session()
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.client.snapshot()
    }

    pub fn player_info(&self) -> Option<Value> {
        self.client.player_info()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_running)
    }

    pub fn is_push_open(&self) -> bool {
        self.push.as_ref().is_some_and(PushChannel::is_open)
    }

    fn surface(&self, result: ClientResult<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                self.notifier.alert(&e);
                false
            }
        }
    }

    // --- 로그인 ---

    pub async fn create_game(&mut self, username: &str) -> bool {
        let result = self.client.create_game(username).await;
        self.after_login(result).await
    }

    pub async fn join_game(&mut self, username: &str, game: &GameId) -> bool {
        let result = self.client.join_game(username, game).await;
        self.after_login(result).await
    }

    /// Silent auto-login. A rejected credential returns `false` without alerting.
    pub async fn check_access(&mut self) -> bool {
        match self.client.check_access().await {
            Ok(Some(_)) => self.after_login(Ok(())).await,
            Ok(None) => false,
            // access 자체는 성공, 이어진 refresh 가 실패한 경우
            Err(e) => {
                self.notifier.alert(&e);
                self.start_sync().await;
                false
            }
        }
    }

    async fn after_login(&mut self, result: ClientResult<()>) -> bool {
        match result {
            Ok(()) => {
                self.start_sync().await;
                true
            }
            Err(e) => {
                // 세션은 확보됐지만 첫 refresh 가 실패한 경우에도 동기화는 시작
                if self.client.session().is_some() {
                    self.start_sync().await;
                }
                self.notifier.alert(&e);
                false
            }
        }
    }

    async fn start_sync(&mut self) {
        self.stop_sync();

        match self.sync.mode {
            SyncMode::Manual => {}
            SyncMode::Polling => {
                self.poller = Some(Poller::spawn(
                    self.client.clone(),
                    self.sync.poll_interval,
                    self.notifier.clone(),
                ));
            }
            SyncMode::Push => self.open_push().await,
        }
    }

    async fn open_push(&mut self) {
        let Some(ws_url) = self.sync.ws_url.clone() else {
            warn!("push sync requested without a channel url");
            return;
        };
        let Some(game) = self.client.game() else {
            return;
        };
        let Some(token) = self.client.transport().session_token() else {
            warn!(%game, "no session cookie; push channel not opened");
            return;
        };

        match PushChannel::connect(&ws_url, LoginPayload { game, token }, self.push_handler.clone()).await {
            Ok(channel) => self.push = Some(channel),
            Err(e) => warn!("push channel unavailable: {}", e),
        }
    }

    fn stop_sync(&mut self) {
        if let Some(mut poller) = self.poller.take() {
            poller.stop();
        }
        if let Some(mut push) = self.push.take() {
            push.stop();
        }
    }

    /// Stops background sync and forgets the session.
    pub fn teardown(&mut self) {
        self.stop_sync();
        self.client.clear_session();
        info!("view torn down");
    }

    // --- 게임 액션 ---

    pub async fn start_game(&self) -> bool {
        self.surface(self.client.start_game().await)
    }

    pub async fn play_card_from_hand(&self, field_index: usize) -> bool {
        self.surface(self.client.play_card_from_hand(field_index).await)
    }

    pub async fn play_card_from_market(&self, card_id: &str, field_index: usize) -> bool {
        self.surface(self.client.play_card_from_market(card_id, field_index).await)
    }

    pub async fn play_card_from_pending(&self, card_id: &str, field_index: usize) -> bool {
        self.surface(
            self.client
                .play_card_from_pending(card_id, field_index)
                .await,
        )
    }

    pub async fn draw_cards_to_market(&self) -> bool {
        self.surface(self.client.draw_cards_to_market().await)
    }

    pub async fn draw_cards_to_hand(&self) -> bool {
        self.surface(self.client.draw_cards_to_hand().await)
    }

    pub async fn create_trade(
        &self,
        card_ids: Vec<String>,
        other_player: &str,
        wants: Vec<String>,
    ) -> bool {
        self.surface(self.client.create_trade(card_ids, other_player, wants).await)
    }

    pub async fn accept_trade(&self, trade_id: &str, card_ids: Vec<String>) -> bool {
        self.surface(self.client.accept_trade(trade_id, card_ids).await)
    }

    pub async fn reject_trade(&self, trade_id: &str) -> bool {
        self.surface(self.client.reject_trade(trade_id).await)
    }

    pub async fn buy_field(&self) -> bool {
        self.surface(self.client.buy_field().await)
    }

    pub async fn update(&self) -> bool {
        self.surface(self.client.update().await)
    }
}
