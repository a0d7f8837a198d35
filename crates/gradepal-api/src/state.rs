//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the REST API.
//! Core services are generic over repository traits; AppState pins them to
//! the SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gradepal_core::chat::service::ConversationStore;
use gradepal_core::chat::turn::ChatTurns;
use gradepal_core::context::aggregator::ContextAggregator;
use gradepal_core::llm::box_provider::BoxLlmProvider;
use gradepal_core::llm::bridge::{CompletionBridge, CompletionSettings};
use gradepal_core::notify::bus::NotificationBus;
use gradepal_core::prompt::history::HistoryWindow;
use gradepal_core::records::service::RecordsService;
use gradepal_core::starters::catalog::PromptCatalog;
use gradepal_infra::config::{MODEL_ENV, apply_overrides, load_config, resolve_data_dir};
use gradepal_infra::llm::create_provider;
use gradepal_infra::sqlite::chat::SqliteChatRepository;
use gradepal_infra::sqlite::identity::SqliteIdentityRepository;
use gradepal_infra::sqlite::pool::{DatabasePool, database_url};
use gradepal_infra::sqlite::records::SqliteRecordsRepository;
use gradepal_types::config::AppConfig;
use tokio_util::sync::CancellationToken;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteChatTurns = ChatTurns<SqliteChatRepository, SqliteRecordsRepository>;

pub type ConcreteRecordsService = RecordsService<SqliteRecordsRepository>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ConcreteChatTurns>,
    pub records: Arc<ConcreteRecordsService>,
    pub notifications: Arc<NotificationBus>,
    pub prompts: Arc<PromptCatalog>,
    pub identity: SqliteIdentityRepository,
    pub config: Arc<AppConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    /// Cancelled on server shutdown; every open stream watches a child of it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Initialize the application state: load config, connect to the DB,
    /// build the provider and wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let (config, data_dir) = load_settings().await?;
        let db_pool = open_database(&data_dir).await?;
        let provider = create_provider(&config.llm);
        Self::from_parts(config, data_dir, db_pool, provider)
    }

    /// Wire services from already-constructed parts.
    ///
    /// Fails only if the embedded prompt catalog does not parse.
    pub fn from_parts(
        config: AppConfig,
        data_dir: PathBuf,
        db_pool: DatabasePool,
        provider: BoxLlmProvider,
    ) -> anyhow::Result<Self> {
        let chat_repo = SqliteChatRepository::new(db_pool.clone());
        let records_repo = SqliteRecordsRepository::new(db_pool.clone());

        let bridge = CompletionBridge::new(provider, CompletionSettings::from(&config.llm));
        let chat = ChatTurns::new(
            ConversationStore::new(chat_repo),
            ContextAggregator::new(records_repo.clone(), config.context.clone()),
            bridge,
            HistoryWindow::from(&config.chat),
        );

        // One broker per process, shared by the grade path and every subscriber.
        let notifications = Arc::new(NotificationBus::default());
        let records = RecordsService::new(records_repo, Arc::clone(&notifications));

        Ok(Self {
            chat: Arc::new(chat),
            records: Arc::new(records),
            notifications,
            prompts: Arc::new(PromptCatalog::embedded()?),
            identity: SqliteIdentityRepository::new(db_pool.clone()),
            config: Arc::new(config),
            data_dir,
            db_pool,
            shutdown: CancellationToken::new(),
        })
    }

    /// Keep-alive interval for chat streams; `None` when disabled in config.
    pub fn keep_alive(&self) -> Option<Duration> {
        match self.config.server.keep_alive_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Resolve the data directory, make sure it exists, and load `config.toml`
/// with environment overrides applied.
pub async fn load_settings() -> anyhow::Result<(AppConfig, PathBuf)> {
    let data_dir = resolve_data_dir();
    tokio::fs::create_dir_all(&data_dir).await?;
    let config = load_config(&data_dir).await;
    let config = apply_overrides(config, std::env::var(MODEL_ENV).ok());
    Ok((config, data_dir))
}

/// Open (and migrate) `gradepal.db` inside `data_dir`.
pub async fn open_database(data_dir: &std::path::Path) -> anyhow::Result<DatabasePool> {
    Ok(DatabasePool::new(&database_url(data_dir)).await?)
}
