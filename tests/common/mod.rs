#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use actix_web::{
    cookie::Cookie,
    dev::ServerHandle,
    web::{self, Bytes, Data},
    App, HttpRequest, HttpResponse, HttpServer,
};
use serde_json::{json, Value};
use tbg_client::{ClientError, Notifier};

pub const GAME_ID: &str = "G1";
pub const TOKEN: &str = "token-alice";

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
    pub token: Option<String>,
}

/// 요청을 기록하고 미리 정해둔 응답을 돌려주는 게임 서버 대역
pub struct MockGame {
    pub log: Mutex<Vec<Recorded>>,
    pub state: Mutex<Value>,
    /// path -> (status, body)
    pub failures: Mutex<HashMap<String, (u16, String)>>,
    /// login 응답에 game 을 포함할지
    pub login_returns_game: AtomicBool,
}

impl MockGame {
    pub fn new() -> Data<Self> {
        Data::new(Self {
            log: Mutex::new(Vec::new()),
            state: Mutex::new(game_payload("alice", 0)),
            failures: Mutex::new(HashMap::new()),
            login_returns_game: AtomicBool::new(false),
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn fail(&self, path: &str, status: u16, body: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn return_game_on_login(&self) {
        self.login_returns_game.store(true, Ordering::SeqCst);
    }

    pub fn set_state(&self, state: Value) {
        *self.state.lock().unwrap() = state;
    }
}

pub fn game_payload(name: &str, coins: u32) -> Value {
    json!({
        "player_info": {
            "name": name,
            "hand_count": 5,
            "fields": [
                {"name": "Empty", "count": 0, "enabled": true},
                {"name": "Empty", "count": 0, "enabled": true},
                {"name": "Empty", "count": 0, "enabled": false}
            ],
            "coins": coins,
            "is_host": true,
            "hand": [],
            "pending_cards": []
        },
        "players": [],
        "deck_count": 154,
        "playthrough": 0,
        "discard_count": 0,
        "current_player": name,
        "status": "Awaiting",
        "game_id": GAME_ID,
        "stage": "First Card",
        "market": {"0": null, "1": null}
    })
}

fn error(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": message }))
}

fn token_cookie() -> Cookie<'static> {
    Cookie::build("tbg_token", TOKEN).path("/").finish()
}

async fn mock_handler(req: HttpRequest, body: Bytes, mock: Data<MockGame>) -> HttpResponse {
    let path = req.path().to_string();
    let token = req.cookie("tbg_token").map(|c| c.value().to_string());
    mock.log.lock().unwrap().push(Recorded {
        method: req.method().to_string(),
        path: path.clone(),
        body: serde_json::from_slice(&body).ok(),
        token: token.clone(),
    });

    if let Some((status, body)) = mock.failures.lock().unwrap().get(&path).cloned() {
        let status = actix_web::http::StatusCode::from_u16(status).unwrap();
        return HttpResponse::build(status).body(body);
    }

    let game_prefix = format!("/api/game/{}", GAME_ID);
    match (req.method().as_str(), path.as_str()) {
        ("POST", "/api/create") => HttpResponse::Ok()
            .cookie(token_cookie())
            .json(json!({ "game": GAME_ID })),
        ("POST", "/api/login") => {
            let response = if mock.login_returns_game.load(Ordering::SeqCst) {
                json!({ "game": GAME_ID })
            } else {
                json!({ "success": "Successfully logged into game" })
            };
            HttpResponse::Ok().cookie(token_cookie()).json(response)
        }
        ("GET", "/api/access") => match token.as_deref() {
            Some(TOKEN) => HttpResponse::Ok().json(json!({ "game": GAME_ID, "player_name": "alice" })),
            _ => error("Access denied"),
        },
        ("GET", p) if p.starts_with("/api/game/") => {
            if p != game_prefix {
                return error("Game does not exist");
            }
            if token.as_deref() != Some(TOKEN) {
                return error("Not authorized to view game");
            }
            HttpResponse::Ok().json(mock.state.lock().unwrap().clone())
        }
        ("POST", p) if p.starts_with(&format!("{}/", game_prefix)) => {
            HttpResponse::Ok().json(json!({ "success": "ok" }))
        }
        _ => HttpResponse::NotFound().finish(),
    }
}

pub async fn spawn_server(mock: Data<MockGame>) -> (SocketAddr, ServerHandle) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(mock.clone())
            .default_service(web::to(mock_handler))
    })
    .workers(1)
    .listen(listener)
    .unwrap()
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(server);

    (addr, handle)
}

pub fn base_url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

/// 사용자에게 보여질 알림을 모아두는 Notifier
#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, error: &ClientError) {
        self.alerts.lock().unwrap().push(error.user_message());
    }
}
