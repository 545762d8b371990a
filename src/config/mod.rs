//! Configuration module

mod credentials;
mod site;

pub use credentials::{require, Credentials};
pub use site::{
    GithubConfig, SiteConfig, SourceKind, SyncDefaults, TargetKind, TrelloConfig, WorkerConfig,
};
