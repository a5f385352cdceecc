use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use stride_types::api::{CreateMessageRequest, MessageQuery, UpdateMessageRequest};
use stride_types::models::{Message, PopulatedMessage, UserSummary};
use stride_types::patch::Patch;
use tracing::debug;
use uuid::Uuid;

use crate::codec::{
    decode_id, decode_time, encode_time, parse_id, parse_ref, required_text, set_required,
    set_required_text,
};
use crate::{Database, DbError, DbResult, Repository};

const MESSAGE_SELECT_SQL: &str = "SELECT m.id, m.sender, m.receiver, m.content, m.date, m.reply_to
FROM messages m";

// Users are LEFT JOINed: a deleted sender or receiver resolves to a NULL username.
const POPULATED_SELECT_SQL: &str = "SELECT
    m.id, m.sender, s.username, m.receiver, r.username, m.content, m.date, m.reply_to
FROM messages m
LEFT JOIN users s ON s.id = m.sender
LEFT JOIN users r ON r.id = m.receiver";

pub struct Messages<'a> {
    db: &'a Database,
}

impl<'a> Messages<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Single message with sender and receiver resolved to user summaries.
    pub fn get_populated(&self, id: &str) -> DbResult<Option<PopulatedMessage>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| {
            let raw = conn
                .query_row(
                    &format!("{POPULATED_SELECT_SQL} WHERE m.id = ?1"),
                    [&id],
                    RawPopulated::from_row,
                )
                .optional()?;
            raw.map(RawPopulated::decode).transpose()
        })
    }

    /// Every message matching `filter`, with sender and receiver resolved.
    pub fn get_all_populated(&self, filter: &MessageQuery) -> DbResult<Vec<PopulatedMessage>> {
        let (where_sql, values) = filter_clause(filter)?;
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{POPULATED_SELECT_SQL}{where_sql} ORDER BY m.rowid"))?;
            let raws = stmt
                .query_map(params_from_iter(values), RawPopulated::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            raws.into_iter().map(RawPopulated::decode).collect()
        })
    }
}

impl Repository for Messages<'_> {
    type Record = Message;
    type New = CreateMessageRequest;
    type Patch = UpdateMessageRequest;
    type Filter = MessageQuery;

    fn create(&self, req: CreateMessageRequest) -> DbResult<Message> {
        let sender = parse_ref(&required_text(req.sender, "sender")?, "sender")?;
        let receiver = parse_ref(&required_text(req.receiver, "receiver")?, "receiver")?;
        let content = required_text(req.content, "content")?;
        let reply_to = req
            .reply_to
            .as_deref()
            .map(|raw| parse_ref(raw, "replyTo"))
            .transpose()?;

        let message = Message {
            id: Uuid::new_v4(),
            sender,
            receiver,
            content,
            date: Utc::now(),
            reply_to,
        };

        self.db.with_conn(|conn| {
            check_references(
                conn,
                message.id,
                Some(message.sender),
                Some(message.receiver),
                message.reply_to,
            )?;
            conn.execute(
                "INSERT INTO messages (id, sender, receiver, content, date, reply_to)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id.to_string(),
                    message.sender.to_string(),
                    message.receiver.to_string(),
                    message.content,
                    encode_time(message.date),
                    message.reply_to.map(|id| id.to_string()),
                ],
            )?;
            Ok(())
        })?;

        debug!(message_id = %message.id, sender = %message.sender, "message created");
        Ok(message)
    }

    fn get_by_id(&self, id: &str) -> DbResult<Option<Message>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| query_one(conn, &id))
    }

    fn get_all(&self, filter: &MessageQuery) -> DbResult<Vec<Message>> {
        let (where_sql, values) = filter_clause(filter)?;
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{MESSAGE_SELECT_SQL}{where_sql} ORDER BY m.rowid"))?;
            let raws = stmt
                .query_map(params_from_iter(values), RawMessage::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            raws.into_iter().map(RawMessage::decode).collect()
        })
    }

    fn update(&self, id: &str, patch: UpdateMessageRequest) -> DbResult<Option<Message>> {
        let id = parse_id(id)?.to_string();
        let sender = parse_ref_patch(patch.sender, "sender")?;
        let receiver = parse_ref_patch(patch.receiver, "receiver")?;
        let reply_to = parse_ref_patch(patch.reply_to, "replyTo")?;

        self.db.with_conn(|conn| {
            let Some(mut message) = query_one(conn, &id)? else {
                return Ok(None);
            };
            // Only references carried by the patch are checked again.
            check_references(
                conn,
                message.id,
                patched_ref(&sender),
                patched_ref(&receiver),
                patched_ref(&reply_to),
            )?;
            set_required(sender, &mut message.sender, "sender")?;
            set_required(receiver, &mut message.receiver, "receiver")?;
            set_required_text(patch.content, &mut message.content, "content")?;
            reply_to.apply_to(&mut message.reply_to);

            conn.execute(
                "UPDATE messages SET sender = ?2, receiver = ?3, content = ?4, reply_to = ?5
                 WHERE id = ?1",
                params![
                    id,
                    message.sender.to_string(),
                    message.receiver.to_string(),
                    message.content,
                    message.reply_to.map(|id| id.to_string()),
                ],
            )?;
            Ok(Some(message))
        })
    }

    fn delete(&self, id: &str) -> DbResult<Option<Message>> {
        let id = parse_id(id)?.to_string();
        self.db.with_conn(|conn| {
            let Some(message) = query_one(conn, &id)? else {
                return Ok(None);
            };
            conn.execute("DELETE FROM messages WHERE id = ?1", [&id])?;
            debug!(message_id = %id, "message deleted");
            Ok(Some(message))
        })
    }
}

fn parse_ref_patch(patch: Patch<String>, field: &str) -> DbResult<Patch<Uuid>> {
    Ok(match patch {
        Patch::Absent => Patch::Absent,
        Patch::Null => Patch::Null,
        Patch::Value(raw) => Patch::Value(parse_ref(&raw, field)?),
    })
}

fn patched_ref(patch: &Patch<Uuid>) -> Option<Uuid> {
    match patch {
        Patch::Value(id) => Some(*id),
        Patch::Absent | Patch::Null => None,
    }
}

/// Sender and receiver must be existing users; `reply_to` an existing other message.
fn check_references(
    conn: &Connection,
    message_id: Uuid,
    sender: Option<Uuid>,
    receiver: Option<Uuid>,
    reply_to: Option<Uuid>,
) -> DbResult<()> {
    if let Some(sender) = sender {
        if !exists(conn, "users", sender)? {
            return Err(DbError::Validation(
                "sender does not reference an existing user".into(),
            ));
        }
    }
    if let Some(receiver) = receiver {
        if !exists(conn, "users", receiver)? {
            return Err(DbError::Validation(
                "receiver does not reference an existing user".into(),
            ));
        }
    }
    if let Some(reply_to) = reply_to {
        if reply_to == message_id {
            return Err(DbError::Validation(
                "a message cannot reply to itself".into(),
            ));
        }
        if !exists(conn, "messages", reply_to)? {
            return Err(DbError::Validation(
                "replyTo does not reference an existing message".into(),
            ));
        }
    }
    Ok(())
}

fn exists(conn: &Connection, table: &str, id: Uuid) -> DbResult<bool> {
    let found = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
        [id.to_string()],
        |r| r.get(0),
    )?;
    Ok(found)
}

fn filter_clause(filter: &MessageQuery) -> DbResult<(String, Vec<Value>)> {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(sender) = &filter.sender {
        values.push(Value::Text(parse_id(sender)?.to_string()));
        clauses.push(format!("m.sender = ?{}", values.len()));
    }
    if let Some(receiver) = &filter.receiver {
        values.push(Value::Text(parse_id(receiver)?.to_string()));
        clauses.push(format!("m.receiver = ?{}", values.len()));
    }
    if let Some(content) = &filter.content {
        values.push(Value::Text(content.clone()));
        clauses.push(format!("instr(m.content, ?{}) > 0", values.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    Ok((where_sql, values))
}

fn query_one(conn: &Connection, id: &str) -> DbResult<Option<Message>> {
    let raw = conn
        .query_row(
            &format!("{MESSAGE_SELECT_SQL} WHERE m.id = ?1"),
            [id],
            RawMessage::from_row,
        )
        .optional()?;
    raw.map(RawMessage::decode).transpose()
}

struct RawMessage {
    id: String,
    sender: String,
    receiver: String,
    content: String,
    date: String,
    reply_to: Option<String>,
}

impl RawMessage {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sender: row.get(1)?,
            receiver: row.get(2)?,
            content: row.get(3)?,
            date: row.get(4)?,
            reply_to: row.get(5)?,
        })
    }

    fn decode(self) -> DbResult<Message> {
        Ok(Message {
            id: decode_id(&self.id, "messages.id")?,
            sender: decode_id(&self.sender, "messages.sender")?,
            receiver: decode_id(&self.receiver, "messages.receiver")?,
            content: self.content,
            date: decode_time(&self.date, "messages.date")?,
            reply_to: self
                .reply_to
                .as_deref()
                .map(|raw| decode_id(raw, "messages.reply_to"))
                .transpose()?,
        })
    }
}

struct RawPopulated {
    message: RawMessage,
    sender_username: Option<String>,
    receiver_username: Option<String>,
}

impl RawPopulated {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            message: RawMessage {
                id: row.get(0)?,
                sender: row.get(1)?,
                receiver: row.get(3)?,
                content: row.get(5)?,
                date: row.get(6)?,
                reply_to: row.get(7)?,
            },
            sender_username: row.get(2)?,
            receiver_username: row.get(4)?,
        })
    }

    fn decode(self) -> DbResult<PopulatedMessage> {
        let message = self.message.decode()?;
        Ok(PopulatedMessage {
            id: message.id,
            sender: UserSummary {
                id: message.sender,
                username: self.sender_username,
            },
            receiver: UserSummary {
                id: message.receiver,
                username: self.receiver_username,
            },
            content: message.content,
            date: message.date,
            reply_to: message.reply_to,
        })
    }
}
