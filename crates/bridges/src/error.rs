use std::{error::Error as StdError, fmt};

/// Crate-wide result type for membership operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong during a membership operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Join was invoked without a bridge name.
    MissingName,
    /// The channel already belongs to a bridge.
    AlreadyInBridge,
    /// The channel does not belong to any bridge.
    NotInBridge,
    /// No adapter is registered for the platform.
    NoPlugin,
    /// Reading the bridge store failed.
    LookupFailed,
    /// The adapter could not produce senddata for the channel.
    CreateFailed,
    /// Writing the bridge store failed.
    PersistFailed,
}

/// Coarse grouping that decides how an error is logged and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Expected; reported to the user as-is.
    UserInput,
    /// Deployment problem; logged as an internal error.
    Configuration,
    /// A store or adapter call failed; retryable by re-running the command.
    Collaborator,
}

impl ErrorKind {
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::MissingName | Self::AlreadyInBridge | Self::NotInBridge => {
                ErrorCategory::UserInput
            },
            Self::NoPlugin => ErrorCategory::Configuration,
            Self::LookupFailed | Self::CreateFailed | Self::PersistFailed => {
                ErrorCategory::Collaborator
            },
        }
    }

    /// Stable snake_case name, used as a metrics label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingName => "missing_name",
            Self::AlreadyInBridge => "already_in_bridge",
            Self::NotInBridge => "not_in_bridge",
            Self::NoPlugin => "no_plugin",
            Self::LookupFailed => "lookup_failed",
            Self::CreateFailed => "create_failed",
            Self::PersistFailed => "persist_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingName => "bridge name is missing",
            Self::AlreadyInBridge => "channel is already in a bridge",
            Self::NotInBridge => "channel is not in a bridge",
            Self::NoPlugin => "no adapter registered for platform",
            Self::LookupFailed => "bridge lookup failed",
            Self::CreateFailed => "adapter failed to create senddata",
            Self::PersistFailed => "bridge update failed",
        };
        f.write_str(text)
    }
}

/// The operation's inputs, attached to every error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub platform: Option<String>,
    pub channel: String,
    pub name: Option<String>,
}

impl ErrorContext {
    pub fn new(channel: &str, platform: Option<&str>, name: Option<&str>) -> Self {
        Self {
            platform: platform.map(str::to_owned),
            channel: channel.to_owned(),
            name: name.map(str::to_owned),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel={}", self.channel)?;
        if let Some(platform) = &self.platform {
            write!(f, " platform={platform}")?;
        }
        if let Some(name) = &self.name {
            write!(f, " name={name}")?;
        }
        Ok(())
    }
}

/// A failed membership operation.
#[derive(Debug, thiserror::Error)]
#[error("{kind} ({context})")]
pub struct Error {
    kind: ErrorKind,
    context: ErrorContext,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    #[must_use]
    pub fn new(kind: ErrorKind, context: ErrorContext) -> Self {
        Self {
            kind,
            context,
            source: None,
        }
    }

    /// Wrap a collaborator failure, keeping it as the error source.
    #[must_use]
    pub fn with_source(
        kind: ErrorKind,
        context: ErrorContext,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            context,
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn context(&self) -> &ErrorContext {
        &self.context
    }

    /// The wrapped collaborator error, if any.
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }

    /// Message safe to show an end user. Never includes the wrapped cause.
    pub fn user_message(&self, help_command: &str) -> String {
        match self.kind {
            ErrorKind::AlreadyInBridge => format!(
                "To run this command you can't be in a bridge. To learn more, run `{help_command}`."
            ),
            ErrorKind::MissingName => format!(
                "Please provide a name for your bridge. To learn more, run `{help_command}`."
            ),
            ErrorKind::NotInBridge => format!(
                "To run this command you need to be in a bridge. To learn more, run `{help_command}`."
            ),
            ErrorKind::NoPlugin => {
                "This platform can't be bridged right now. Please contact the bot operator.".into()
            },
            ErrorKind::LookupFailed | ErrorKind::CreateFailed | ErrorKind::PersistFailed => {
                "Something went wrong while updating this bridge. Please try again later.".into()
            },
        }
    }
}
