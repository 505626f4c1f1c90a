use std::time::Duration;

use crate::MailboxId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTailSettings {
    pub interval: Duration,
    /// Distance from the bottom, in viewer units, that still counts as "at the bottom".
    pub bottom_threshold: u32,
    pub line_height: u32,
    pub viewport_height: u32,
    pub auto_scroll: bool,
    /// Consecutive failed fetches before a degraded-log notice is raised.
    pub failure_notice_after: u32,
}

impl Default for LogTailSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            bottom_threshold: 50,
            line_height: 16,
            viewport_height: 480,
            auto_scroll: true,
            failure_notice_after: 3,
        }
    }
}

/// Scroll geometry of the log viewer, in viewer units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub offset: u32,
    pub viewport_height: u32,
    pub content_height: u32,
}

impl ScrollMetrics {
    pub fn max_offset(&self) -> u32 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    pub fn is_at_bottom(&self, threshold: u32) -> bool {
        self.max_offset() <= self.offset.saturating_add(threshold)
    }

    pub fn scroll_to(&mut self, offset: u32) {
        self.offset = offset.min(self.max_offset());
    }
}

/// State of the single open log viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogViewState {
    mailbox_id: MailboxId,
    generation: u64,
    /// `None` until the first fetch lands.
    text: Option<String>,
    scroll: ScrollMetrics,
    auto_scroll: bool,
    consecutive_failures: u32,
    degraded: bool,
    in_flight: bool,
}

impl LogViewState {
    pub fn open(mailbox_id: MailboxId, generation: u64, settings: &LogTailSettings) -> Self {
        Self {
            mailbox_id,
            generation,
            text: None,
            scroll: ScrollMetrics {
                offset: 0,
                viewport_height: settings.viewport_height,
                content_height: 0,
            },
            auto_scroll: settings.auto_scroll,
            consecutive_failures: 0,
            degraded: false,
            // Opening issues the first fetch right away.
            in_flight: true,
        }
    }

    pub fn mailbox_id(&self) -> MailboxId {
        self.mailbox_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn scroll(&self) -> ScrollMetrics {
        self.scroll
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn matches(&self, mailbox_id: MailboxId, generation: u64) -> bool {
        self.mailbox_id == mailbox_id && self.generation == generation
    }

    /// Returns true when a tick should issue a fetch. Ticks that land while
    /// the previous fetch is outstanding are skipped so answers cannot
    /// arrive out of order.
    pub fn begin_fetch(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn set_auto_scroll(&mut self, enabled: bool) {
        self.auto_scroll = enabled;
    }

    pub fn scroll_to(&mut self, offset: u32) {
        self.scroll.scroll_to(offset);
    }

    pub fn resize_viewport(&mut self, height: u32) {
        self.scroll.viewport_height = height;
        let offset = self.scroll.offset;
        self.scroll.scroll_to(offset);
    }

    /// Replaces the displayed text with the full latest log.
    ///
    /// Follows the tail only when the viewer was at the bottom before the
    /// replacement and auto-scroll is on; otherwise the offset is kept.
    /// Returns whether the view followed the tail.
    pub fn apply_text(&mut self, text: String, settings: &LogTailSettings) -> bool {
        let was_at_bottom = self.scroll.is_at_bottom(settings.bottom_threshold);

        self.scroll.content_height = content_height(&text, settings.line_height);
        self.text = Some(text);
        self.in_flight = false;
        self.consecutive_failures = 0;
        self.degraded = false;

        let followed = was_at_bottom && self.auto_scroll;
        let target = if followed {
            self.scroll.max_offset()
        } else {
            self.scroll.offset
        };
        self.scroll.scroll_to(target);
        followed
    }

    /// Records a failed fetch. Returns true exactly once per failure streak,
    /// when the streak reaches the notice threshold.
    pub fn record_failure(&mut self, settings: &LogTailSettings) -> bool {
        self.in_flight = false;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if !self.degraded && self.consecutive_failures >= settings.failure_notice_after.max(1) {
            self.degraded = true;
            return true;
        }
        false
    }
}

fn content_height(text: &str, line_height: u32) -> u32 {
    let lines = u32::try_from(text.lines().count()).unwrap_or(u32::MAX);
    lines.saturating_mul(line_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_check_uses_threshold() {
        let metrics = ScrollMetrics {
            offset: 1070,
            viewport_height: 480,
            content_height: 1600,
        };
        assert!(metrics.is_at_bottom(50));
        assert!(!metrics.is_at_bottom(49));
    }

    #[test]
    fn short_content_is_always_at_bottom() {
        let metrics = ScrollMetrics {
            offset: 0,
            viewport_height: 480,
            content_height: 100,
        };
        assert_eq!(metrics.max_offset(), 0);
        assert!(metrics.is_at_bottom(0));
    }

    #[test]
    fn ticks_skip_while_fetch_outstanding() {
        let settings = LogTailSettings::default();
        let mut view = LogViewState::open(1, 1, &settings);
        assert!(!view.begin_fetch());
        view.apply_text("line\n".into(), &settings);
        assert!(view.begin_fetch());
        assert!(!view.begin_fetch());
        view.record_failure(&settings);
        assert!(view.begin_fetch());
    }

    #[test]
    fn degraded_notice_fires_once_per_streak() {
        let settings = LogTailSettings::default();
        let mut view = LogViewState::open(1, 1, &settings);
        assert!(!view.record_failure(&settings));
        assert!(!view.record_failure(&settings));
        assert!(view.record_failure(&settings));
        assert!(!view.record_failure(&settings));

        view.apply_text("ok\n".into(), &settings);
        assert_eq!(view.consecutive_failures(), 0);
        assert!(!view.is_degraded());
    }
}
