use std::fs;
use std::path::Path;
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use syncwatch_core::{
    CoreSettings, LogTailSettings, NotifySettings, PollSettings, RetryResumePolicy,
};
use syncwatch_engine::ClientSettings;
use syncwatch_logging::{watch_info, watch_warn};

use super::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "syncwatch.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetryResume {
    #[default]
    OneShot,
    UntilObserved {
        max_cycles: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Contents of `syncwatch.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub poll_interval_ms: u64,
    pub log_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub scroll_threshold: u32,
    pub log_line_height: u32,
    pub log_viewport_height: u32,
    pub auto_scroll: bool,
    pub log_failure_notice_after: u32,
    pub toast_ttl_ms: u64,
    pub toast_capacity: usize,
    pub retry_resume: RetryResume,
    pub log_level: LogLevel,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let poll = PollSettings::default();
        let log = LogTailSettings::default();
        let notify = NotifySettings::default();
        Self {
            base_url: client.base_url,
            access_token: None,
            poll_interval_ms: millis(poll.interval),
            log_interval_ms: millis(log.interval),
            request_timeout_ms: millis(client.request_timeout),
            connect_timeout_ms: millis(client.connect_timeout),
            scroll_threshold: log.bottom_threshold,
            log_line_height: log.line_height,
            log_viewport_height: log.viewport_height,
            auto_scroll: log.auto_scroll,
            log_failure_notice_after: log.failure_notice_after,
            toast_ttl_ms: notify.ttl_ms,
            toast_capacity: notify.capacity,
            retry_resume: RetryResume::OneShot,
            log_level: LogLevel::Info,
            log_destination: LogDestination::File,
        }
    }
}

impl AppConfig {
    pub fn core_settings(&self) -> CoreSettings {
        CoreSettings {
            poll: PollSettings {
                interval: Duration::from_millis(self.poll_interval_ms.max(1)),
                retry_resume: match self.retry_resume {
                    RetryResume::OneShot => RetryResumePolicy::OneShot,
                    RetryResume::UntilObserved { max_cycles } => {
                        RetryResumePolicy::UntilObserved { max_cycles }
                    }
                },
            },
            log: LogTailSettings {
                interval: Duration::from_millis(self.log_interval_ms.max(1)),
                bottom_threshold: self.scroll_threshold,
                line_height: self.log_line_height.max(1),
                viewport_height: self.log_viewport_height,
                auto_scroll: self.auto_scroll,
                failure_notice_after: self.log_failure_notice_after,
            },
            notify: NotifySettings {
                ttl_ms: self.toast_ttl_ms,
                capacity: self.toast_capacity.max(1),
            },
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            access_token: self.access_token.clone().filter(|t| !t.is_empty()),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..ClientSettings::default()
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Reads the config file. A missing file yields defaults; an unreadable or
/// malformed file is reported and also yields defaults.
pub(crate) fn load_config(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            watch_info!("No config at {:?}; using defaults", path);
            return AppConfig::default();
        }
        Err(err) => {
            watch_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            watch_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            watch_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}
