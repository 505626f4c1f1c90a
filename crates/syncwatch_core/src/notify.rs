use std::collections::VecDeque;

pub type ToastId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub kind: ToastKind,
    pub message: String,
    pub expires_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifySettings {
    pub ttl_ms: u64,
    pub capacity: usize,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            ttl_ms: 5000,
            capacity: 5,
        }
    }
}

/// Transient user-facing feedback. Oldest toasts are dropped past capacity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationQueue {
    toasts: VecDeque<Toast>,
    next_id: ToastId,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        kind: ToastKind,
        message: impl Into<String>,
        now_ms: u64,
        settings: &NotifySettings,
    ) -> ToastId {
        self.next_id += 1;
        let id = self.next_id;
        self.toasts.push_back(Toast {
            id,
            kind,
            message: message.into(),
            expires_at_ms: now_ms.saturating_add(settings.ttl_ms),
        });
        while self.toasts.len() > settings.capacity.max(1) {
            self.toasts.pop_front();
        }
        id
    }

    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != before
    }

    /// Drops expired toasts; returns true if anything was removed.
    pub fn expire(&mut self, now_ms: u64) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|t| t.expires_at_ms > now_ms);
        self.toasts.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_ttl() {
        let settings = NotifySettings::default();
        let mut queue = NotificationQueue::new();
        queue.push(ToastKind::Info, "a", 1_000, &settings);
        assert!(!queue.expire(5_999));
        assert!(queue.expire(6_000));
        assert!(queue.is_empty());
    }

    #[test]
    fn capacity_drops_oldest() {
        let settings = NotifySettings {
            ttl_ms: 5000,
            capacity: 2,
        };
        let mut queue = NotificationQueue::new();
        let first = queue.push(ToastKind::Info, "a", 0, &settings);
        queue.push(ToastKind::Info, "b", 0, &settings);
        queue.push(ToastKind::Info, "c", 0, &settings);
        let messages: Vec<_> = queue.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "c"]);
        assert!(!queue.dismiss(first));
    }
}
