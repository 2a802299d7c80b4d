use serde::Deserialize;
use thiserror::Error;

/// 요청 형식 자체가 잘못되었을 때 서버가 돌려주는 메시지
const VALIDATION_MESSAGES: &[&str] = &[
    "Incorrect JSON data",
    "Name not supplied",
    "Game type not supplied",
    "Invalid game type parameter",
];

/// 세션/쿠키가 거부되었을 때 서버가 돌려주는 메시지
const UNAUTHORIZED_MESSAGES: &[&str] = &[
    "Access denied",
    "Not authorized to view game",
    "Game does not exist",
    "User does not exist",
];

/// Errors produced by the game session client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request rejected as malformed: {message}")]
    Validation { message: String },

    #[error("Not authorized: {message}")]
    Unauthorized { message: String },

    #[error("Game rule violation: {message}")]
    GameRule { message: String },

    #[error("Unexpected server response ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No active game session")]
    NoSession,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Push channel failed: {0}")]
    Push(#[from] tokio_tungstenite::tungstenite::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ClientError {
    /// 실패 응답을 상태 코드와 본문으로 분류합니다.
    /// 본문이 `{"error": ...}` 형식이 아니면 원문 그대로 `Server` 로 남깁니다.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed.error,
            Err(_) => {
                return Self::Server {
                    status,
                    body: body.to_string(),
                }
            }
        };

        if status == 401 || status == 403 || UNAUTHORIZED_MESSAGES.contains(&message.as_str()) {
            Self::Unauthorized { message }
        } else if VALIDATION_MESSAGES.contains(&message.as_str()) {
            Self::Validation { message }
        } else if status >= 500 {
            Self::Server {
                status,
                body: body.to_string(),
            }
        } else {
            Self::GameRule { message }
        }
    }

    /// Text shown to the user. Server-reported messages are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message }
            | Self::Unauthorized { message }
            | Self::GameRule { message } => message.clone(),
            Self::Server { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Push(_))
    }
}
