//! Outgoing mail spooled to SQLite.
//!
//! Sending means recording the message and its attachments in one
//! transaction. Nothing in this process delivers mail: rows stay in the
//! `outbox` table until an external relay drains it.

use crate::engine::ports::{Messenger, OutgoingMessage};
use crate::error::{Error, Result};
use rusqlite::{params, Connection};
use serde::Serialize;

/// A spooled message as listed by the outbox endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboxEntry {
    pub id: i64,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<String>,
    pub created_at: String,
}

/// [`Messenger`] that spools messages into the `outbox` tables.
pub struct SqliteOutbox {
    conn: Connection,
}

impl SqliteOutbox {
    /// The connection must already carry the schema from `open_database`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Most recent first.
    pub fn list(&self, limit: usize) -> Result<Vec<OutboxEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, recipient, subject, body, created_at FROM outbox ORDER BY id DESC LIMIT ?1",
        )?;
        let mut entries = stmt
            .query_map(params![limit as i64], |row| {
                Ok(OutboxEntry {
                    id: row.get(0)?,
                    recipient: row.get(1)?,
                    subject: row.get(2)?,
                    body: row.get(3)?,
                    attachments: Vec::new(),
                    created_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut names = self
            .conn
            .prepare("SELECT name FROM outbox_attachments WHERE message_id = ?1 ORDER BY rowid")?;
        for entry in &mut entries {
            entry.attachments = names
                .query_map(params![entry.id], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
        }
        Ok(entries)
    }
}

impl Messenger for SqliteOutbox {
    fn send(&self, message: &OutgoingMessage) -> Result<()> {
        if !message.to.contains('@') {
            return Err(Error::Backend(format!(
                "invalid recipient address: {:?}",
                message.to
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO outbox (recipient, subject, body) VALUES (?1, ?2, ?3)",
            params![&message.to, &message.subject, &message.body],
        )?;
        let message_id = tx.last_insert_rowid();
        for attachment in &message.attachments {
            tx.execute(
                "INSERT INTO outbox_attachments (message_id, name, content_type, bytes)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    message_id,
                    &attachment.name,
                    &attachment.content_type,
                    &attachment.bytes
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ports::Attachment;
    use crate::store::open_in_memory;

    fn message(to: &str) -> OutgoingMessage {
        OutgoingMessage {
            to: to.to_string(),
            subject: "Your certificate".to_string(),
            body: "Attached.".to_string(),
            attachments: vec![Attachment {
                name: "Ann.pdf".to_string(),
                content_type: "application/pdf".to_string(),
                bytes: vec![1, 2, 3],
            }],
        }
    }

    #[test]
    fn spooled_messages_are_listed_newest_first() {
        let outbox = SqliteOutbox::new(open_in_memory().unwrap());
        outbox.send(&message("a@x.com")).unwrap();
        outbox.send(&message("b@x.com")).unwrap();

        let entries = outbox.list(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].recipient, "b@x.com");
        assert_eq!(entries[1].attachments, ["Ann.pdf"]);
    }

    #[test]
    fn malformed_recipient_is_a_send_failure() {
        let outbox = SqliteOutbox::new(open_in_memory().unwrap());
        assert!(outbox.send(&message("not-an-address")).is_err());
        assert!(outbox.list(10).unwrap().is_empty());
    }

    #[test]
    fn failed_attachment_leaves_no_message_behind() {
        let outbox = SqliteOutbox::new(open_in_memory().unwrap());
        outbox
            .conn
            .execute_batch(
                "CREATE TRIGGER reject_attachments BEFORE INSERT ON outbox_attachments
                 BEGIN SELECT RAISE(ABORT, 'no space'); END;",
            )
            .unwrap();

        assert!(outbox.send(&message("a@x.com")).is_err());
        assert!(outbox.list(10).unwrap().is_empty());

        outbox.conn.execute_batch("DROP TRIGGER reject_attachments").unwrap();
        outbox.send(&message("a@x.com")).unwrap();
        assert_eq!(outbox.list(10).unwrap().len(), 1);
    }
}
