//! Competition Results Enrichment Library
//!
//! Adds two facts that result spreadsheets lack, the **course length** and the
//! **number of starters** in the athlete's class, by fetching each event's
//! results page from Eventor and reading it heuristically.
//!
//! # Architecture
//!
//! - **Extraction** ([`extract`]): pure, total functions from markup to facts.
//!   They never fail; a miss is a zero or an empty string.
//! - **Transport** ([`transport`]): one "fetch a results page" operation,
//!   direct with retry-with-backoff first and the proxy collaborator second.
//! - **Orchestration** ([`pipeline`]): drives rows through transport and
//!   extraction, sequentially, with a pause between rows, cooperative
//!   cancellation, progress reporting and persistence.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use results_enricher::{
//!     BatchEnricher, EnrichConfig, LayeredFetcher, MemoryStore, NoopObserver, TransportConfig,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! let fetcher = LayeredFetcher::new(&TransportConfig::default())?;
//! let enricher = BatchEnricher::new(
//!     Arc::new(fetcher),
//!     Arc::new(MemoryStore::new()),
//!     EnrichConfig::default(),
//! );
//!
//! let outcome = enricher
//!     .run("club-admin", "spring.json", rows, &NoopObserver, &CancellationToken::new())
//!     .await?;
//! for row in &outcome.results {
//!     println!("{} {} m, {} starters", row.name, row.length, row.total_participants);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for persistence, transport, audit and progress
//! - [`types`] - Rows, facts, jobs, audit entries and configuration
//! - [`document`] - The queryable document capability over `scraper`
//! - [`stores`] - Storage implementations (MemoryStore)
//! - [`audit`] - Log sink implementations
//! - [`testing`] - Mock implementations for testing

pub mod audit;
pub mod credentials;
pub mod document;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod transport;
pub mod types;

// Re-export core types at crate root
pub use credentials::ApiKey;
pub use document::{normalize_ws, HtmlDocument, QueryableDocument};
pub use error::{
    EnrichError, FetchError, FetchErrorKind, FetchResult, Result, StoreError, StoreResult,
};
pub use traits::{
    fetcher::{ProxyClient, ResultPageFetcher},
    log_sink::LogSink,
    observer::{BatchObserver, NoopObserver},
    store::{ProcessingState, ResultStore},
};
pub use types::{
    config::{EnrichConfig, RetryPolicy, TransportConfig, DEFAULT_BASE_URL},
    facts::{ClassFacts, ClassStarts, EventInfo, PositionFacts},
    job::{row_progress, Job, JobStatus, StopReason},
    log::{LogEntry, LogStatus},
    row::{time_to_seconds, EnrichedResult, SourceRow},
    FetchOutcome,
};

// Re-export extraction functions
pub use extract::{
    extract_class_facts, extract_class_name_for_row, extract_course_length, extract_date,
    extract_event_info, extract_position_facts, parse_rows_for_club,
};

// Re-export implementations
pub use audit::{FanoutLog, MemoryLog, StoreLog, TracingLog};
pub use pipeline::{BatchEnricher, BatchOutcome};
pub use stores::MemoryStore;
pub use transport::{DirectFetcher, HttpProxyClient, LayeredFetcher};
