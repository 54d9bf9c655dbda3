//! One-shot messages queued in the session for the next page render.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use utoipa::ToSchema;

use super::session::session_error;
use crate::config::{MAX_FLASH_MESSAGES, SESSION_KEY_FLASH};
use crate::errors::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Add `flash` to a queue, skipping a repeat of the newest message and
/// dropping the oldest ones beyond [`MAX_FLASH_MESSAGES`].
fn enqueue(queue: &mut Vec<Flash>, flash: Flash) {
    if queue.last() == Some(&flash) {
        return;
    }
    queue.push(flash);
    if queue.len() > MAX_FLASH_MESSAGES {
        let excess = queue.len() - MAX_FLASH_MESSAGES;
        queue.drain(..excess);
    }
}

/// Append a message to the queue.
pub async fn push(session: &Session, flash: Flash) -> AppResult<()> {
    let mut queue: Vec<Flash> = session
        .get(SESSION_KEY_FLASH)
        .await
        .map_err(session_error)?
        .unwrap_or_default();
    enqueue(&mut queue, flash);
    session
        .insert(SESSION_KEY_FLASH, queue)
        .await
        .map_err(session_error)
}

/// Take every queued message, leaving the queue empty.
pub async fn drain(session: &Session) -> AppResult<Vec<Flash>> {
    Ok(session
        .remove::<Vec<Flash>>(SESSION_KEY_FLASH)
        .await
        .map_err(session_error)?
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_message_is_queued_once() {
        let mut queue = Vec::new();
        for _ in 0..3 {
            enqueue(&mut queue, Flash::new(FlashLevel::Error, "Access denied"));
        }
        assert_eq!(queue.len(), 1);

        enqueue(&mut queue, Flash::new(FlashLevel::Info, "Signed out"));
        enqueue(&mut queue, Flash::new(FlashLevel::Error, "Access denied"));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_queue_keeps_newest_messages() {
        let mut queue = Vec::new();
        for i in 0..25 {
            enqueue(&mut queue, Flash::new(FlashLevel::Info, format!("message {}", i)));
        }
        assert_eq!(queue.len(), MAX_FLASH_MESSAGES);
        assert_eq!(queue[0].message, "message 15");
        assert_eq!(queue[MAX_FLASH_MESSAGES - 1].message, "message 24");
    }
}
