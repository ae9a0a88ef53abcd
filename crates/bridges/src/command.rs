//! Caller-facing wrapper: run a membership command, get a displayable reply.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, ErrorKind},
    service::BridgeService,
};

/// A membership command as issued by the command layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum BridgeCommand {
    Join {
        channel: String,
        platform: String,
        name: Option<String>,
    },
    Leave {
        channel: String,
        platform: String,
    },
    Reset {
        channel: String,
        platform: String,
        name: Option<String>,
    },
}

/// Machine-readable outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Ok,
    MissingName,
    AlreadyInBridge,
    NotInBridge,
    NoPlugin,
    LookupFailed,
    CreateFailed,
    PersistFailed,
}

impl From<ErrorKind> for StatusCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::MissingName => Self::MissingName,
            ErrorKind::AlreadyInBridge => Self::AlreadyInBridge,
            ErrorKind::NotInBridge => Self::NotInBridge,
            ErrorKind::NoPlugin => Self::NoPlugin,
            ErrorKind::LookupFailed => Self::LookupFailed,
            ErrorKind::CreateFailed => Self::CreateFailed,
            ErrorKind::PersistFailed => Self::PersistFailed,
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        self.kind().into()
    }
}

/// Reply to a command: a status code plus a message ready for the end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub code: StatusCode,
    pub message: String,
    /// Id of the bridge the channel ended up in (or left), on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_id: Option<String>,
}

impl CommandResponse {
    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    fn ok(message: &str, bridge_id: String) -> Self {
        Self {
            code: StatusCode::Ok,
            message: message.to_owned(),
            bridge_id: Some(bridge_id),
        }
    }

    fn from_error(err: &Error, help_command: &str) -> Self {
        Self {
            code: err.status_code(),
            message: err.user_message(help_command),
            bridge_id: None,
        }
    }
}

const JOINED: &str = "Joined a bridge!";
const LEFT: &str = "Left a bridge!";
const RESET: &str = "Reset this bridge!";

impl BridgeService {
    /// Run `command`, turning any failure into a displayable response.
    ///
    /// Errors have already been logged by the operation itself.
    pub async fn execute(&self, command: BridgeCommand) -> CommandResponse {
        let (result, success) = match &command {
            BridgeCommand::Join {
                channel,
                platform,
                name,
            } => (self.join(channel, platform, name.as_deref()).await, JOINED),
            BridgeCommand::Leave { channel, platform } => {
                (self.leave(channel, platform).await, LEFT)
            },
            BridgeCommand::Reset {
                channel,
                platform,
                name,
            } => (self.reset(channel, platform, name.as_deref()).await, RESET),
        };

        match result {
            Ok(bridge) => CommandResponse::ok(success, bridge.id),
            Err(e) => CommandResponse::from_error(&e, &self.settings().help_command),
        }
    }
}
