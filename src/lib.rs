pub mod client;
pub mod console;
pub mod error;
pub mod poller;
pub mod protocol;
pub mod push;
pub mod snapshot;
pub mod transport;
pub mod view;

pub use client::{ClientState, GameClient, Session};
pub use error::{ClientError, ClientResult};
pub use protocol::{GameAction, GameId, GameType};
pub use snapshot::Snapshot;
pub use transport::{GameTransport, HttpTransport};
pub use view::{Notifier, SyncSettings, ViewModel};

use once_cell::sync::OnceCell;
use tbg_env::LoggingConfig;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static GUARD: OnceCell<WorkerGuard> = OnceCell::new();

// --- 로거 설정 ---
// 여러 번 호출해도 처음 한 번만 적용됨
pub fn setup_logger(config: &LoggingConfig) {
    GUARD.get_or_init(|| {
        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.directory, &config.filename);
        let (non_blocking_file_writer, guard) = tracing_appender::non_blocking(file_appender);

        // RUST_LOG 가 있으면 설정값보다 우선
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
            .compact();

        let file_layer = fmt::layer()
            .with_writer(non_blocking_file_writer)
            .with_ansi(false)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(false);

        // 테스트처럼 이미 subscriber 가 있으면 그대로 둠
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init();

        info!(
            "Logger initialized. Log file: {}/{}",
            config.directory, config.filename
        );
        guard
    });
}
