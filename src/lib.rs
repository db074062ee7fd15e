pub mod api;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod naming;
pub mod notify;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod sync;

pub use api::{Catalog, CatalogTitle, CinemetaClient, ExternalId, SearchKind, SeriesDetail};
pub use classifier::{Classification, Classifier, ClassifierConfig, MediaCandidate};
pub use config::Settings;
pub use console::{Console, ConsoleConfig};
pub use error::{AppError, ExitCode};
pub use ledger::{IgnoreSet, Ledger, StateConfig};
pub use notify::{Notifier, PlexNotifier};
pub use resolver::{AutoPrompter, CatalogResolver, Prompter, ResolvedIdentity, ResolverConfig};
pub use scanner::{scan_sources, ScannerError, SourceFile};
pub use sync::{FileOutcome, SyncEngine, SyncError, SyncOptions, SyncReport};
