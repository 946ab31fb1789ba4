#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod ingest;
pub mod session;
pub mod stats;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, IngestError, SessionError, StatsError};
pub use ingest::{IngestReport, IngestService, RawSource, load_sources};
pub use session::{ALL_SUBJECTS, RevealFeedback, SessionService};
pub use stats::StatsService;
