//! Normalized records extracted from proxy responses

use serde::Serialize;
use serde_json::Value;

use super::shape::{extract, Collection};

/// Power level at or above which a member is an admin
pub const ADMIN_POWER_LEVEL: i64 = 100;
/// Power level at or above which a member is a moderator
pub const MODERATOR_POWER_LEVEL: i64 = 50;

/// A joined room
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Room {
    pub room_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_alias: Option<String>,
    pub is_direct: bool,
    pub is_space: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
}

impl Room {
    /// Normalize one record
    ///
    /// A bare string is taken as a room id (the `joined_rooms` shape).
    /// Records without a room id are dropped.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(id) if !id.is_empty() => Some(Self {
                room_id: id.clone(),
                name: None,
                canonical_alias: None,
                is_direct: false,
                is_space: false,
                member_count: None,
            }),
            Value::Object(_) => {
                let room_id = non_empty_str(value, "room_id")?;
                Some(Self {
                    room_id,
                    name: non_empty_str(value, "name"),
                    canonical_alias: non_empty_str(value, "canonical_alias"),
                    is_direct: value.get("is_direct").and_then(Value::as_bool).unwrap_or(false),
                    is_space: value.get("is_space").and_then(Value::as_bool).unwrap_or(false),
                    member_count: value.get("member_count").and_then(Value::as_u64),
                })
            }
            _ => None,
        }
    }

    /// Name, else canonical alias, else room id
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.canonical_alias.as_deref())
            .unwrap_or(&self.room_id)
    }
}

/// Rooms found in a room listing response
pub fn rooms_from(body: &Value) -> Vec<Room> {
    extract(body, Collection::Rooms)
        .iter()
        .filter_map(Room::from_value)
        .collect()
}

/// Room counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoomBreakdown {
    pub direct: usize,
    pub rooms: usize,
    pub spaces: usize,
}

impl RoomBreakdown {
    pub fn of(rooms: &[Room]) -> Self {
        rooms.iter().fold(Self::default(), |mut acc, room| {
            if room.is_direct {
                acc.direct += 1;
            }
            if room.is_space {
                acc.spaces += 1;
            }
            if !room.is_direct && !room.is_space {
                acc.rooms += 1;
            }
            acc
        })
    }
}

/// A timeline message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub sender: String,
    pub body: String,
}

impl Message {
    /// Normalize one record; non-objects are dropped
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let sender = non_empty_str(value, "sender").unwrap_or_else(|| "Unknown".to_string());
        let body = value
            .get("body")
            .and_then(Value::as_str)
            .or_else(|| value.pointer("/content/body").and_then(Value::as_str))
            .unwrap_or("No content")
            .to_string();
        Some(Self { sender, body })
    }
}

/// Messages found in a message listing response
pub fn messages_from(body: &Value) -> Vec<Message> {
    extract(body, Collection::Messages)
        .iter()
        .filter_map(Message::from_value)
        .collect()
}

/// Member role derived from the power level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Moderator,
    Regular,
}

impl Role {
    pub fn from_power_level(level: i64) -> Self {
        if level >= ADMIN_POWER_LEVEL {
            Role::Admin
        } else if level >= MODERATOR_POWER_LEVEL {
            Role::Moderator
        } else {
            Role::Regular
        }
    }
}

/// Member counts for a room
///
/// Members listed as bare id strings count toward `total` but fall in no
/// role bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    pub total: usize,
    pub admins: usize,
    pub moderators: usize,
    pub regular: usize,
}

impl MemberSummary {
    /// Members without a power level, i.e. bare strings
    pub fn unclassified(&self) -> usize {
        self.total - self.admins - self.moderators - self.regular
    }
}

/// Summarise a member listing response
pub fn members_from(body: &Value) -> MemberSummary {
    let members = extract(body, Collection::Members);
    let mut summary = MemberSummary {
        total: members.len(),
        ..MemberSummary::default()
    };
    for member in members.iter().filter(|m| m.is_object()) {
        let level = member.get("power_level").and_then(Value::as_i64).unwrap_or(0);
        match Role::from_power_level(level) {
            Role::Admin => summary.admins += 1,
            Role::Moderator => summary.moderators += 1,
            Role::Regular => summary.regular += 1,
        }
    }
    summary
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
