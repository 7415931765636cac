//! Outbound collaborators: message delivery and chat logging.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;
use tracing::info;

use crate::account::Account;
use crate::channel::Context;
use crate::common::{StorageError, StorageResult};
use crate::render::RenderedMessage;

/// Hands a rendered message to one recipient.
pub trait DeliverySink: Send + Sync {
    fn deliver(&self, recipient: &dyn Account, message: &RenderedMessage);
}

/// Persists messages of loggable channels.
pub trait ChatLogger: Send + Sync {
    fn log_message(&self, label: &str, context: &Context) -> StorageResult<()>;
}

fn log_line(label: &str, context: &Context) -> String {
    let sender = context.sender().map(|s| s.name()).unwrap_or_default();
    let server = context
        .server()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    let text = context.best_text().unwrap_or_default();
    format!("[{}] [{}] {}: {}", server, label, sender, text)
}

/// Writes chat log lines as tracing events under the `chat_log` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChatLogger;

impl ChatLogger for TracingChatLogger {
    fn log_message(&self, label: &str, context: &Context) -> StorageResult<()> {
        info!(target: "chat_log", label, "{}", log_line(label, context));
        Ok(())
    }
}

/// Appends timestamped chat log lines to a file.
#[derive(Debug)]
pub struct FileChatLogger {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileChatLogger {
    /// The file is opened on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChatLogger for FileChatLogger {
    fn log_message(&self, label: &str, context: &Context) -> StorageResult<()> {
        let mut guard = self.file.lock();
        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            *guard = Some(file);
        }
        let file = guard.as_mut().ok_or_else(|| StorageError::Unavailable {
            message: format!("{} is not open", self.path.display()),
        })?;
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(file, "[{}] {}", timestamp, log_line(label, context))?;
        file.flush()?;
        Ok(())
    }
}
