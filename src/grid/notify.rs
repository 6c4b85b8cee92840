// src/grid/notify.rs
//! Presentation boundary: notification sink and confirmation dialog.

use async_trait::async_trait;
use bevy::log::{error, info, warn};
use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Where success/error toasts go.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Sink that only writes to the log. Used when no view is attached (CLI, tests).
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!("{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Info | NoticeLevel::Success => info!("{}", notice.message),
        }
    }
}

/// Sink that forwards notices over a channel; the Bevy layer drains the receiver into events.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<Notice>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<Notice>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.tx.send(notice) {
            // Receiver gone (view torn down); keep the message in the log.
            LogSink.notify(e.0);
        }
    }
}

/// Confirmation dialog shown before destructive or expensive operations.
#[async_trait]
pub trait ConfirmationService: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Accepts every prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

#[async_trait]
impl ConfirmationService for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        info!("Auto-confirming: {}", prompt);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.notify(Notice::success("saved"));
        sink.notify(Notice::error("boom"));
        assert_eq!(rx.try_recv().unwrap(), Notice::success("saved"));
        assert!(rx.try_recv().unwrap().is_error());
        assert!(rx.try_recv().is_err());
    }
}
