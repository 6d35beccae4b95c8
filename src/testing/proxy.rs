//! The message-proxy smoke sequence
//!
//! ```text
//! health (critical) → authenticate (critical) → rooms → messages → members
//!                   → send_message → typing → logout
//! ```
//!
//! Room scenarios act on the first room of the listing and are skipped when
//! there is none. Everything after authentication is skipped when no
//! credentials are available.

use serde_json::{json, Value};

use crate::api::types::{members_from, messages_from, rooms_from};
use crate::api::{ApiRequest, ApiResponse, Room, RoomBreakdown};
use crate::common::config::ScenarioConfig;
use crate::common::{truncate, Error, Result};
use crate::credentials::{AuthPath, Session};

use super::context::RunContext;
use super::scenario::{Artifact, Guard, Pass, Scenario};

pub const HEALTH: &str = "health";
pub const AUTHENTICATE: &str = "authenticate";
pub const ROOMS: &str = "rooms";
pub const MESSAGES: &str = "messages";
pub const MEMBERS: &str = "members";
pub const SEND_MESSAGE: &str = "send_message";
pub const TYPING: &str = "typing";
pub const LOGOUT: &str = "logout";

/// Rooms listed by name in the room scenario output
const ROOMS_SHOWN: usize = 3;
/// Most recent messages shown
const MESSAGES_SHOWN: usize = 2;
/// Width of a shown message body
const MESSAGE_WIDTH: usize = 40;

/// The full sequence in run order
pub fn scenarios(config: &ScenarioConfig) -> Vec<Box<dyn Scenario>> {
    vec![
        Box::new(HealthCheck),
        Box::new(Authenticate),
        Box::new(ListRooms),
        Box::new(ListMessages),
        Box::new(ListMembers),
        Box::new(SendMessage {
            text: config.test_message.clone(),
        }),
        Box::new(Typing {
            timeout_ms: config.typing_timeout_ms,
        }),
        Box::new(Logout),
    ]
}

/// Rooms found by the room listing, empty if it has not run
pub fn rooms(ctx: &RunContext) -> &[Room] {
    match ctx.artifact(ROOMS) {
        Some(Artifact::Rooms(rooms)) => rooms.as_slice(),
        _ => &[],
    }
}

pub fn first_room(ctx: &RunContext) -> Option<&Room> {
    rooms(ctx).first()
}

fn require_session(ctx: &RunContext) -> Guard {
    if ctx.has_artifact(AUTHENTICATE) {
        Guard::Ready
    } else {
        Guard::skip("not authenticated")
    }
}

fn require_room(ctx: &RunContext) -> Guard {
    match require_session(ctx) {
        Guard::Ready if first_room(ctx).is_none() => Guard::skip("no rooms available"),
        guard => guard,
    }
}

fn first_room_id(ctx: &RunContext) -> Result<String> {
    first_room(ctx)
        .map(|room| room.room_id.clone())
        .ok_or_else(|| Error::Internal("room scenario ran without a room".to_string()))
}

fn first_response(responses: &[ApiResponse]) -> Result<&ApiResponse> {
    responses
        .first()
        .ok_or_else(|| Error::Internal("no response to classify".to_string()))
}

/// `GET /health`
pub struct HealthCheck;

impl Scenario for HealthCheck {
    fn id(&self) -> &'static str {
        HEALTH
    }

    fn title(&self, _ctx: &RunContext) -> String {
        "Message proxy health".to_string()
    }

    fn critical(&self) -> bool {
        true
    }

    fn requests(&self, _ctx: &RunContext) -> Result<Vec<ApiRequest>> {
        Ok(vec![ApiRequest::get("/health")])
    }

    fn classify(&self, responses: &[ApiResponse], _ctx: &RunContext) -> Result<Pass> {
        first_response(responses)?.require_success()?;
        Ok(Pass::new().detail("Message proxy is healthy"))
    }
}

/// `POST /login` or `POST /restore_session`, whichever the credentials allow
pub struct Authenticate;

impl Authenticate {
    fn path(ctx: &RunContext) -> Option<AuthPath> {
        ctx.credentials().auth_path()
    }
}

impl Scenario for Authenticate {
    fn id(&self) -> &'static str {
        AUTHENTICATE
    }

    fn title(&self, ctx: &RunContext) -> String {
        match Self::path(ctx) {
            Some(AuthPath::Login) => "Authentication (login)".to_string(),
            Some(AuthPath::Restore) => "Authentication (session restore)".to_string(),
            None => "Authentication".to_string(),
        }
    }

    fn critical(&self) -> bool {
        true
    }

    fn guard(&self, ctx: &RunContext) -> Guard {
        match Self::path(ctx) {
            Some(_) => Guard::Ready,
            None => Guard::skip(Error::MissingCredentials.to_string()),
        }
    }

    fn requests(&self, ctx: &RunContext) -> Result<Vec<ApiRequest>> {
        let creds = ctx.credentials();
        let request = match Self::path(ctx).ok_or(Error::MissingCredentials)? {
            AuthPath::Login => ApiRequest::post("/login").json(json!({
                "homeserver": creds.homeserver,
                "username": creds.username,
                "password": creds.password,
            })),
            AuthPath::Restore => ApiRequest::post("/restore_session").json(json!({
                "homeserver_url": creds.homeserver,
                "user_id": creds.user_id,
                "access_token": creds.access_token,
                "device_id": creds.device_id,
            })),
        };
        Ok(vec![request])
    }

    fn classify(&self, responses: &[ApiResponse], ctx: &RunContext) -> Result<Pass> {
        let response = first_response(responses)?.require_accepted()?;
        let creds = ctx.credentials();

        match Self::path(ctx).ok_or(Error::MissingCredentials)? {
            AuthPath::Login => {
                let access_token = response
                    .str_field("access_token")
                    .ok_or_else(|| Error::MissingField("access_token".to_string()))?;
                let session = Session {
                    access_token: Some(access_token.to_string()),
                    device_id: response.str_field("device_id").map(str::to_string),
                    user_id: response.str_field("user_id").map(str::to_string),
                };
                let issued = creds.with_session(session);
                let user = issued.user_id.clone().unwrap_or_else(|| "Unknown".to_string());
                Ok(Pass::new()
                    .artifact(Artifact::Session(issued))
                    .detail("Login successful")
                    .detail(format!("User: {}", user)))
            }
            AuthPath::Restore => {
                let user = response.body.get("user");
                let field = |key: &str| user.and_then(|u| u.get(key)).and_then(Value::as_str);
                let shown = field("display_name")
                    .or_else(|| field("user_id"))
                    .unwrap_or("Unknown");
                let session = Session {
                    user_id: field("user_id").map(str::to_string),
                    ..Session::default()
                };
                Ok(Pass::new()
                    .artifact(Artifact::Session(creds.with_session(session)))
                    .detail("Session restored successfully")
                    .detail(format!("User: {}", shown)))
            }
        }
    }
}

/// `GET /rooms`
pub struct ListRooms;

impl Scenario for ListRooms {
    fn id(&self) -> &'static str {
        ROOMS
    }

    fn title(&self, _ctx: &RunContext) -> String {
        "Room list".to_string()
    }

    fn guard(&self, ctx: &RunContext) -> Guard {
        require_session(ctx)
    }

    fn requests(&self, _ctx: &RunContext) -> Result<Vec<ApiRequest>> {
        Ok(vec![ApiRequest::get("/rooms")])
    }

    fn classify(&self, responses: &[ApiResponse], _ctx: &RunContext) -> Result<Pass> {
        let response = first_response(responses)?.require_not_rejected()?;
        let rooms = rooms_from(&response.body);

        let mut pass = Pass::new().detail(format!("Retrieved {} rooms", rooms.len()));
        if !rooms.is_empty() {
            let breakdown = RoomBreakdown::of(&rooms);
            pass = pass
                .detail(format!("Direct Messages: {}", breakdown.direct))
                .detail(format!("Rooms: {}", breakdown.rooms))
                .detail(format!("Spaces: {}", breakdown.spaces));
            for room in rooms.iter().take(ROOMS_SHOWN) {
                pass = pass.detail(format!(
                    "{} ({} members)",
                    room.display_name(),
                    room.member_count.unwrap_or(0)
                ));
            }
            if rooms.len() > ROOMS_SHOWN {
                pass = pass.detail(format!("... and {} more rooms", rooms.len() - ROOMS_SHOWN));
            }
        }
        Ok(pass.artifact(Artifact::Rooms(rooms)))
    }
}

/// `GET /rooms/{room_id}/messages` on the first room
pub struct ListMessages;

impl Scenario for ListMessages {
    fn id(&self) -> &'static str {
        MESSAGES
    }

    fn title(&self, ctx: &RunContext) -> String {
        match first_room(ctx) {
            Some(room) => format!("Messages in '{}'", room.display_name()),
            None => "Messages".to_string(),
        }
    }

    fn guard(&self, ctx: &RunContext) -> Guard {
        require_room(ctx)
    }

    fn requests(&self, ctx: &RunContext) -> Result<Vec<ApiRequest>> {
        Ok(vec![
            ApiRequest::get("/rooms/{room_id}/messages").var("room_id", first_room_id(ctx)?)
        ])
    }

    fn classify(&self, responses: &[ApiResponse], _ctx: &RunContext) -> Result<Pass> {
        let response = first_response(responses)?.require_not_rejected()?;
        let messages = messages_from(&response.body);

        let mut pass = Pass::new().detail(format!("Retrieved {} messages", messages.len()));
        let recent = messages.len().saturating_sub(MESSAGES_SHOWN);
        for message in &messages[recent..] {
            pass = pass.detail(format!(
                "{}: {}",
                message.sender,
                truncate(&message.body, MESSAGE_WIDTH)
            ));
        }
        Ok(pass.artifact(Artifact::Messages(messages)))
    }
}

/// `GET /rooms/{room_id}/members` on the first room
pub struct ListMembers;

impl Scenario for ListMembers {
    fn id(&self) -> &'static str {
        MEMBERS
    }

    fn title(&self, _ctx: &RunContext) -> String {
        "Member list".to_string()
    }

    fn guard(&self, ctx: &RunContext) -> Guard {
        require_room(ctx)
    }

    fn requests(&self, ctx: &RunContext) -> Result<Vec<ApiRequest>> {
        Ok(vec![
            ApiRequest::get("/rooms/{room_id}/members").var("room_id", first_room_id(ctx)?)
        ])
    }

    fn classify(&self, responses: &[ApiResponse], _ctx: &RunContext) -> Result<Pass> {
        let response = first_response(responses)?.require_not_rejected()?;
        let members = members_from(&response.body);
        Ok(Pass::new()
            .detail(format!("Retrieved {} members", members.total))
            .detail(format!("Admins: {}", members.admins))
            .detail(format!("Moderators: {}", members.moderators))
            .detail(format!("Members: {}", members.regular))
            .artifact(Artifact::Members(members)))
    }
}

/// `POST /rooms/{room_id}/send` on the first room
///
/// Posts a real message; the target room will show it.
pub struct SendMessage {
    pub text: String,
}

impl Scenario for SendMessage {
    fn id(&self) -> &'static str {
        SEND_MESSAGE
    }

    fn title(&self, _ctx: &RunContext) -> String {
        "Message sending".to_string()
    }

    fn guard(&self, ctx: &RunContext) -> Guard {
        require_room(ctx)
    }

    fn requests(&self, ctx: &RunContext) -> Result<Vec<ApiRequest>> {
        Ok(vec![ApiRequest::post("/rooms/{room_id}/send")
            .var("room_id", first_room_id(ctx)?)
            .json(json!({
                "message": self.text,
                "msg_type": "m.text",
            }))])
    }

    fn classify(&self, responses: &[ApiResponse], _ctx: &RunContext) -> Result<Pass> {
        let response = first_response(responses)?.require_accepted()?;
        let event_id = response.str_field("event_id").unwrap_or("Unknown").to_string();
        Ok(Pass::new()
            .detail("Test message sent successfully")
            .detail(format!("Event ID: {}", event_id))
            .artifact(Artifact::Event(event_id)))
    }
}

/// `PUT /rooms/{room_id}/typing`, set then cleared
pub struct Typing {
    pub timeout_ms: u64,
}

impl Scenario for Typing {
    fn id(&self) -> &'static str {
        TYPING
    }

    fn title(&self, _ctx: &RunContext) -> String {
        "Typing indicators".to_string()
    }

    fn guard(&self, ctx: &RunContext) -> Guard {
        require_room(ctx)
    }

    fn best_effort_tail(&self) -> bool {
        true
    }

    fn requests(&self, ctx: &RunContext) -> Result<Vec<ApiRequest>> {
        let room_id = first_room_id(ctx)?;
        Ok(vec![
            ApiRequest::put("/rooms/{room_id}/typing")
                .var("room_id", room_id.clone())
                .json(json!({"typing": true, "timeout": self.timeout_ms})),
            ApiRequest::put("/rooms/{room_id}/typing")
                .var("room_id", room_id)
                .json(json!({"typing": false, "timeout": 0})),
        ])
    }

    fn classify(&self, responses: &[ApiResponse], _ctx: &RunContext) -> Result<Pass> {
        first_response(responses)?.require_success()?;
        let pass = Pass::new().detail("Typing indicator sent");
        // Clearing is best effort; the indicator expires on its own
        match responses.get(1) {
            Some(cleared) if cleared.is_success() => Ok(pass.detail("Typing indicator stopped")),
            Some(cleared) => {
                tracing::warn!("Clearing typing indicator returned {}", cleared.status);
                Ok(pass.detail(format!(
                    "Typing indicator not cleared (HTTP {})",
                    cleared.status.as_u16()
                )))
            }
            None => Ok(pass.detail("Typing indicator not cleared")),
        }
    }
}

/// `POST /logout`
pub struct Logout;

impl Scenario for Logout {
    fn id(&self) -> &'static str {
        LOGOUT
    }

    fn title(&self, _ctx: &RunContext) -> String {
        "Logout".to_string()
    }

    fn guard(&self, ctx: &RunContext) -> Guard {
        require_session(ctx)
    }

    fn requests(&self, _ctx: &RunContext) -> Result<Vec<ApiRequest>> {
        Ok(vec![ApiRequest::post("/logout")])
    }

    fn classify(&self, responses: &[ApiResponse], _ctx: &RunContext) -> Result<Pass> {
        first_response(responses)?.require_success()?;
        Ok(Pass::new().detail("Logout successful"))
    }
}
