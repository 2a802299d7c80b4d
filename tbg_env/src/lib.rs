use anyhow::Result;
use clap::ValueEnum;
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env as std_env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 게임 클라이언트 전체 환경 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server: ServerEndpoint,
    pub sync: SyncConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
}

impl ServerEndpoint {
    pub fn url(&self) -> String {
        let protocol = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", protocol, self.host, self.port)
    }

    pub fn ws_url(&self) -> String {
        let protocol = if self.use_tls { "wss" } else { "ws" };
        format!("{}://{}:{}", protocol, self.host, self.port)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 서버 상태를 로컬 스냅샷으로 가져오는 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// 고정 주기로 전체 상태를 다시 가져옴
    Polling,
    /// 실시간 채널 연결. 핸들러는 로그만 남기므로 스냅샷을 갱신하지 않음
    Push,
    /// 액션 이후의 refresh 만 수행
    Manual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub mode: SyncMode,
    pub poll_interval_ms: u64,
}

impl SyncConfig {
    /// 0 은 1ms 로 올림
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// 서버가 발급하는 인증 쿠키 이름
    pub cookie_name: String,
    /// create 시 사용할 게임 공개 여부 ("public" | "private")
    pub default_game_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub filename: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerEndpoint {
                host: "127.0.0.1".to_string(),
                port: 8080,
                use_tls: false,
            },
            sync: SyncConfig {
                mode: SyncMode::Polling,
                poll_interval_ms: 2000,
            },
            session: SessionConfig {
                cookie_name: "tbg_token".to_string(),
                default_game_type: "private".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                filename: "tbg_client.log".to_string(),
            },
        }
    }
}

static CONFIG: Lazy<ClientConfig> = Lazy::new(|| {
    ClientConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        ClientConfig::default()
    })
});

impl ClientConfig {
    /// 전역 설정 인스턴스 가져오기
    pub fn global() -> &'static ClientConfig {
        &CONFIG
    }

    /// 설정 파일 로드
    pub fn load() -> Result<Self, ConfigError> {
        let config_file = Self::config_file();

        info!("Loading configuration from: {:?}", config_file);

        let settings = Config::builder()
            // 기본값
            .add_source(Config::try_from(&Self::default())?)
            // 설정 파일 (선택사항)
            .add_source(File::from(config_file).required(false))
            // 환경 변수 오버라이드, 예: TBG__SERVER__PORT=9090
            .add_source(Environment::with_prefix("TBG").separator("__"))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// 설정 파일 저장
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::get_config_dir();
        std::fs::create_dir_all(&config_dir)?;

        let config_file = Self::config_file();
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(config_file, toml_string)?;

        Ok(())
    }

    pub fn config_file() -> PathBuf {
        Self::get_config_dir().join("tbg.toml")
    }

    fn get_config_dir() -> PathBuf {
        if let Ok(config_home) = std_env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_home).join("tbg")
        } else if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".config").join("tbg")
        } else {
            PathBuf::from("./config")
        }
    }

    /// 개발 환경용 설정
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.server.host = "localhost".to_string();
        config
    }

    /// 테스트 환경용 설정. 백그라운드 refresh 없이 동작
    pub fn testing() -> Self {
        let mut config = Self::default();
        config.logging.level = "trace".to_string();
        config.sync.mode = SyncMode::Manual;
        config.sync.poll_interval_ms = 50;
        config
    }
}

/// 설정 초기화 함수
pub fn init() -> Result<()> {
    dotenv::dotenv().ok();

    let config = ClientConfig::global();
    info!("Client configuration initialized");
    debug!("Configuration: {:?}", config);

    Ok(())
}

/// 기본 설정 파일을 쓰고 그 경로를 돌려줌
pub fn create_default_config() -> Result<PathBuf> {
    let config = ClientConfig::default();
    config.save()?;
    let path = ClientConfig::config_file();
    info!("Default configuration file created at {:?}", path);
    Ok(path)
}
