pub mod account;
pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod post;
pub mod relay;
pub mod settings;
pub mod staging;
pub mod testing;
pub mod worker;

pub use account::{
    Account, AccountDirectory, AccountError, FileAccountDirectory, InMemoryAccountDirectory,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AccountsConfig, Config, ConfigError,
    LoggingConfig, QueueConfig, SanitizedConfig, ServerConfig, SettingsConfig,
};
pub use orchestrator::{
    AutomationOrchestrator, ImportSummary, JobError, OrchestratorConfig, OrchestratorError,
    OrchestratorStatus, RunJobRequest, RunJobResponse, StartOutcome,
};
pub use post::{
    CreatePostRequest, ImportMode, MediaDescriptor, MediaKind, MediaRef, Post, PostError,
    PostFilter, PostQueue, PostStatus, SharedQueue, SortOrder, SourceKind, StatusCounts,
    UpdatePostRequest,
};
pub use relay::{JobLog, LogFileWriter, LogLevel, LogRelay, RelayMessage};
pub use settings::{
    AutomationSettings, InMemorySettingsStore, JsonFileSettingsStore, SettingsError,
    SettingsStore, Speed,
};
pub use staging::{
    CleanupHandle, CleanupReport, MediaStagingManager, StagedMedia, StagingConfig, StagingError,
    StoredUpload,
};
pub use worker::{ProcessWorker, Worker, WorkerConfig, WorkerJob, WorkerResult};
