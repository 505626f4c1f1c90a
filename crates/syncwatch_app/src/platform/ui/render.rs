use std::fmt::Write;

use syncwatch_core::{
    AppViewModel, DashboardView, JobDetailView, LogView, StatusStyle, ToastKind, ToastView,
};

/// Terminal rendering of the view model. Pure: returns the text to print.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    /// Height of one log line in scroll units.
    pub line_height: u32,
}

impl Renderer {
    pub fn render(&self, view: &AppViewModel) -> String {
        let mut out = String::new();
        if let Some(job) = &view.job {
            render_job(&mut out, job);
        }
        if let Some(log) = &view.log {
            out.push('\n');
            self.render_log_window(&mut out, log);
        }
        render_toasts(&mut out, &view.toasts);
        if let Some(prompt) = &view.confirmation {
            let _ = writeln!(out, "? {prompt} [y/n]");
        }
        out
    }

    fn render_log_window(&self, out: &mut String, log: &LogView) {
        let follow = if log.auto_scroll { "follow" } else { "hold" };
        let _ = writeln!(
            out,
            "-- log: mailbox {} ({follow}, offset {}/{}) --",
            log.mailbox_id, log.offset, log.max_offset
        );
        if log.degraded {
            let _ = writeln!(out, "   (log not updating; retrying)");
        }
        match &log.text {
            None => {
                let _ = writeln!(out, "Loading...");
            }
            Some(text) => {
                for line in visible_lines(text, log, self.line_height) {
                    let _ = writeln!(out, "{line}");
                }
            }
        }
    }
}

/// Lines inside the viewport at the current scroll offset.
pub fn visible_lines<'a>(text: &'a str, log: &LogView, line_height: u32) -> Vec<&'a str> {
    let line_height = line_height.max(1);
    let first = (log.offset / line_height) as usize;
    let count = (log.viewport_height / line_height).max(1) as usize;
    text.lines().skip(first).take(count).collect()
}

fn render_job(out: &mut String, job: &JobDetailView) {
    if let Some(error) = &job.error {
        let _ = writeln!(out, "{error}");
    }
    let Some(header) = &job.header else {
        if job.error.is_none() {
            let _ = writeln!(out, "Loading job {}...", job.job_id);
        }
        return;
    };

    let _ = writeln!(
        out,
        "{} {} [{}] {}%{}",
        style_marker(header.style),
        header.name,
        header.status,
        header.progress,
        if job.polling { "  (live)" } else { "" }
    );
    let _ = writeln!(out, "{}", progress_bar(header.progress, 30));
    let _ = writeln!(out, "Source: {} → Target: {}", header.source, header.target);
    let _ = writeln!(
        out,
        "Total {} | Completed {} | Failed {} | Data {}",
        header.total, header.completed, header.failed, header.data_transferred
    );
    if !job.filter.is_empty() {
        let _ = writeln!(
            out,
            "Filter {:?}: {} shown, {} hidden",
            job.filter,
            job.rows.len(),
            job.hidden_rows
        );
    }

    for row in &job.rows {
        let mut actions = Vec::new();
        if row.can_stop {
            actions.push("stop");
        }
        if row.can_retry {
            actions.push("retry");
        }
        let _ = writeln!(
            out,
            "{} #{:<5} {:<9} {} → {}  {}{}",
            style_marker(row.style),
            row.mailbox_id,
            row.status,
            row.user,
            row.target_user,
            row.message,
            if actions.is_empty() {
                String::new()
            } else {
                format!("  [{}]", actions.join("|"))
            }
        );
    }
    if header.can_cancel_all {
        let _ = writeln!(out, "(type `cancel` to stop all running mailboxes)");
    }
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    if let Some(stats) = &view.stats {
        let _ = writeln!(
            out,
            "Jobs {} | Active {} | Mailboxes done {} | Data {}",
            stats.total_jobs, stats.active_jobs, stats.completed_mailboxes, stats.data_transferred
        );
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "{error}");
    }
    if view.loaded && view.jobs.is_empty() {
        let _ = writeln!(out, "No jobs yet.");
    }
    for job in &view.jobs {
        let _ = writeln!(
            out,
            "{} {}  {} [{}] {}%  {} → {}  {}",
            style_marker(job.style),
            job.job_id,
            job.name,
            job.status,
            job.progress,
            job.source,
            job.target,
            job.created_at.as_deref().unwrap_or("-")
        );
    }
    out
}

pub fn render_toasts(out: &mut String, toasts: &[ToastView]) {
    for toast in toasts {
        let label = match toast.kind {
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
            ToastKind::Info => "info",
            ToastKind::Warning => "warn",
        };
        let _ = writeln!(out, "[{label}] {}", toast.message);
    }
}

fn style_marker(style: StatusStyle) -> char {
    match style {
        StatusStyle::Waiting => '…',
        StatusStyle::Active => '▶',
        StatusStyle::Done => '✓',
        StatusStyle::Error => '✗',
        StatusStyle::Neutral => '·',
    }
}

fn progress_bar(percent: u8, width: usize) -> String {
    let filled = usize::from(percent.min(100)) * width / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
