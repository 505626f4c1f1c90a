//! Syncwatch engine: HTTP access to the migration service and effect execution.
mod client;
mod engine;
mod export;
mod filename;
mod persist;
mod types;

pub use client::{ActionGateway, ClientSettings, HttpClient, StatusSource};
pub use engine::{ChannelEventSink, EngineError, EngineHandle, EventSink};
pub use export::{export_job_logs, render_export, ExportError, ExportOptions, ExportSummary};
pub use filename::export_filename;
pub use persist::{ensure_export_dir, write_atomically, PersistError};
pub use types::{CommandError, EngineEvent, FailureKind, FetchError};
