pub mod config;
pub mod credentials;
pub mod matching;
pub mod metadata;
pub mod metrics;
pub mod reconcile;
pub mod scheduler;
pub mod searcher;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, SanitizedConfig,
};
pub use credentials::{OperatorCredentials, UserCredentials};
pub use metadata::{build_search_key, CatalogRecord, CatalogSource, StashDbClient};
pub use reconcile::{CycleReport, PipelineError, ReconciliationPipeline};
pub use scheduler::{RefreshScheduler, SchedulerState, SchedulerStatus, TriggerOutcome};
pub use searcher::{materialize_stream_url, EasynewsClient, FileSearch, SearchCandidate};
pub use store::{ReconciledRecord, ResultStore};
