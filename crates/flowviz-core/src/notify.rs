use std::collections::VecDeque;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::render::{icon, Element};

/// How long a notification stays visible.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::Success => "success",
            NoticeKind::Error => "error",
            NoticeKind::Info => "info",
        }
    }

    fn icon(&self) -> &'static str {
        match self {
            NoticeKind::Success => "fa-solid fa-check-circle",
            NoticeKind::Error => "fa-solid fa-exclamation-circle",
            NoticeKind::Info => "fa-solid fa-info-circle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip)]
    pub shown_at: Instant,
}

impl Notice {
    pub fn element(&self) -> Element {
        Element::new("div")
            .class(&format!("notification {} show", self.kind.as_str()))
            .child(icon(self.kind.icon()))
            .text(format!(" {}", self.message))
    }
}

/// Single-slot notifications replace each other; stacked ones pile up in a
/// container until they expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLayout {
    Single,
    Stacked,
}

#[derive(Debug, Clone)]
pub struct Notifier {
    layout: NoticeLayout,
    notices: VecDeque<Notice>,
}

impl Notifier {
    pub fn new(layout: NoticeLayout) -> Self {
        Self {
            layout,
            notices: VecDeque::new(),
        }
    }

    pub fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notify_at(kind, message, Instant::now());
    }

    pub fn notify_at(&mut self, kind: NoticeKind, message: impl Into<String>, now: Instant) {
        if self.layout == NoticeLayout::Single {
            self.notices.clear();
        }
        self.notices.push_back(Notice {
            kind,
            message: message.into(),
            shown_at: now,
        });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(NoticeKind::Success, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(NoticeKind::Error, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(NoticeKind::Info, message);
    }

    /// Drop notices older than [`NOTIFICATION_TTL`].
    pub fn expire(&mut self, now: Instant) {
        self.notices
            .retain(|n| now.saturating_duration_since(n.shown_at) < NOTIFICATION_TTL);
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn element(&self) -> Element {
        let mut container = Element::new("div").class("notification-container");
        for n in &self.notices {
            container.push(n.element());
        }
        container
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_layout_replaces() {
        let mut n = Notifier::new(NoticeLayout::Single);
        n.success("first");
        n.error("second");
        assert_eq!(n.visible().count(), 1);
        assert_eq!(n.latest().unwrap().message, "second");
    }

    #[test]
    fn stacked_layout_expires_after_ttl() {
        let start = Instant::now();
        let mut n = Notifier::new(NoticeLayout::Stacked);
        n.notify_at(NoticeKind::Info, "old", start);
        n.notify_at(NoticeKind::Info, "new", start + Duration::from_secs(2));
        n.expire(start + Duration::from_millis(3500));
        let left: Vec<_> = n.visible().map(|x| x.message.as_str()).collect();
        assert_eq!(left, vec!["new"]);
    }

    #[test]
    fn element_carries_kind_class() {
        let mut n = Notifier::new(NoticeLayout::Single);
        n.error("Block with ID \"a\" already exists");
        let el = n.latest().unwrap().element();
        assert!(el.has_class("error"));
        assert!(el.text_content().contains("already exists"));
    }
}
