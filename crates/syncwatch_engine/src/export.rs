use std::path::PathBuf;

use syncwatch_core::{JobSnapshot, MailboxSnapshot};
use syncwatch_logging::{watch_info, watch_warn};

use crate::client::StatusSource;
use crate::filename::export_filename;
use crate::persist::{write_atomically, PersistError};
use crate::{FailureKind, FetchError};

const RULE: &str = "========================================";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    /// Human-readable timestamp printed in the header.
    pub exported_at: String,
    /// `YYYY-MM-DD`, used in the file name.
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub mailbox_count: usize,
    pub failed_logs: usize,
    pub output_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("could not load job: {0}")]
    Job(#[from] FetchError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Fetches the job and every mailbox log one after another and writes them to
/// a single text file. A mailbox whose log cannot be fetched gets an inline
/// note; only a failure to load the job itself aborts the export.
pub async fn export_job_logs(
    source: &dyn StatusSource,
    job_id: &str,
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let job = source.job(job_id).await?;

    let mut logs = Vec::with_capacity(job.mailboxes.len());
    for mailbox in &job.mailboxes {
        let result = source.mailbox_log(mailbox.id).await;
        if let Err(err) = &result {
            watch_warn!("Export: log for mailbox {} unavailable: {err}", mailbox.id);
        }
        logs.push(result);
    }

    let failed_logs = logs.iter().filter(|r| r.is_err()).count();
    let document = render_export(&job, &logs, &options.exported_at);
    let filename = export_filename(job.display_name(), &options.date);
    let output_path = write_atomically(&options.output_dir, &filename, &document)?;
    watch_info!(
        "Exported {} mailbox logs for job {job_id} to {}",
        job.mailboxes.len(),
        output_path.display()
    );

    Ok(ExportSummary {
        mailbox_count: job.mailboxes.len(),
        failed_logs,
        output_path,
    })
}

/// `logs` is parallel to `job.mailboxes`.
pub fn render_export(
    job: &JobSnapshot,
    logs: &[Result<String, FetchError>],
    exported_at: &str,
) -> String {
    let mut buffer = String::new();
    buffer.push_str(RULE);
    buffer.push('\n');
    buffer.push_str("IMAP SYNC - LOGS EXPORT\n");
    buffer.push_str(&format!("Job: {}\n", job.display_name()));
    buffer.push_str(&format!("Source: {} → Target: {}\n", job.source, job.target));
    buffer.push_str(&format!("Exported at: {exported_at}\n"));
    buffer.push_str(RULE);
    buffer.push_str("\n\n");

    if job.mailboxes.is_empty() {
        buffer.push_str("No mailboxes found in this job.\n");
        return buffer;
    }

    for (mailbox, log) in job.mailboxes.iter().zip(logs) {
        push_mailbox_section(&mut buffer, mailbox, log);
    }
    buffer
}

fn push_mailbox_section(
    buffer: &mut String,
    mailbox: &MailboxSnapshot,
    log: &Result<String, FetchError>,
) {
    buffer.push('\n');
    buffer.push_str(RULE);
    buffer.push('\n');
    buffer.push_str(&format!(
        "MAILBOX: {} → {}\n",
        mailbox.user, mailbox.target_user
    ));
    buffer.push_str(&format!("Status: {}\n", mailbox.status.as_str()));
    let message = mailbox
        .msg
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or("N/A");
    buffer.push_str(&format!("Message: {message}\n"));
    buffer.push_str(RULE);
    buffer.push_str("\n\n");

    match log {
        Ok(text) if text.is_empty() => buffer.push_str("No logs available"),
        Ok(text) => buffer.push_str(text),
        Err(err) => match err.kind {
            FailureKind::NotFound | FailureKind::Unauthorized | FailureKind::HttpStatus(_) => {
                buffer.push_str("Failed to fetch logs for this mailbox")
            }
            _ => buffer.push_str(&format!("Error fetching logs: {}", err.message)),
        },
    }
    buffer.push_str("\n\n");
}
