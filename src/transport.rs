use std::sync::Arc;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{
    error::{ClientError, ClientResult},
    protocol::{
        action_path, game_path, AccessResponse, CreateRequest, CreateResponse, GameAction, GameId,
        GameType, JoinResponse, LoginRequest,
    },
};

pub const DEFAULT_COOKIE_NAME: &str = "tbg_token";

/// 서버와의 요청/응답 경계. 테스트에서는 스크립트된 구현으로 교체합니다.
#[async_trait]
pub trait GameTransport: Send + Sync + 'static {
    /// POST /api/create
    async fn create(&self, name: &str, game_type: GameType) -> ClientResult<CreateResponse>;

    /// POST /api/login
    async fn login(&self, name: &str, game: &GameId) -> ClientResult<JoinResponse>;

    /// GET /api/access, authenticated by the stored cookie.
    async fn access(&self) -> ClientResult<AccessResponse>;

    /// POST /api/game/{game}/... . The response body is not interpreted.
    async fn send_action(&self, game: &GameId, action: &GameAction) -> ClientResult<()>;

    /// GET /api/game/{game}
    async fn fetch_game(&self, game: &GameId) -> ClientResult<Value>;

    /// Credential the server issued for this client, if any.
    fn session_token(&self) -> Option<String>;
}

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    cookies: Arc<Jar>,
    cookie_name: String,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_cookie_name(base_url, DEFAULT_COOKIE_NAME)
    }

    pub fn with_cookie_name(base_url: &str, cookie_name: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        // join() 이 마지막 세그먼트를 덮어쓰지 않도록
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .build()?;

        Ok(Self {
            http,
            base_url,
            cookies,
            cookie_name: cookie_name.to_string(),
        })
    }

    /// Seeds the cookie jar with a previously issued token so `access` can resume a session.
    pub fn with_token(self, token: &str) -> Self {
        let cookie = format!("{}={}", self.cookie_name, token);
        self.cookies.add_cookie_str(&cookie, &self.base_url);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, "request rejected");
            return Err(ClientError::from_response(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl GameTransport for HttpTransport {
    async fn create(&self, name: &str, game_type: GameType) -> ClientResult<CreateResponse> {
        let url = self.endpoint("api/create")?;
        debug!(%url, "POST create");
        let response = self
            .http
            .post(url)
            .json(&CreateRequest { name, game_type })
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn login(&self, name: &str, game: &GameId) -> ClientResult<JoinResponse> {
        let url = self.endpoint("api/login")?;
        debug!(%url, %game, "POST login");
        let response = self
            .http
            .post(url)
            .json(&LoginRequest { name, game })
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn access(&self) -> ClientResult<AccessResponse> {
        let url = self.endpoint("api/access")?;
        debug!(%url, "GET access");
        let response = self.http.get(url).send().await?;
        Self::read_json(response).await
    }

    async fn send_action(&self, game: &GameId, action: &GameAction) -> ClientResult<()> {
        let url = self.endpoint(&action_path(game, action))?;
        debug!(%url, route = action.route(), "POST action");

        let request = self.http.post(url);
        let request = match action.body()? {
            Some(body) => request.json(&body),
            None => request,
        };
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), body = %body, route = action.route(), "action rejected");
            return Err(ClientError::from_response(status.as_u16(), &body));
        }
        debug!(body = %body, "action accepted");
        Ok(())
    }

    async fn fetch_game(&self, game: &GameId) -> ClientResult<Value> {
        let url = self.endpoint(&game_path(game))?;
        debug!(%url, "GET game");
        let response = self.http.get(url).send().await?;
        Self::read_json(response).await
    }

    fn session_token(&self) -> Option<String> {
        let header = self.cookies.cookies(&self.base_url)?;
        let header = header.to_str().ok()?;
        find_cookie(header, &self.cookie_name)
    }
}

/// `a=1; b=2` 형식의 Cookie 헤더에서 값을 찾습니다.
fn find_cookie(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}
