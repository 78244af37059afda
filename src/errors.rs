use thiserror::Error;

/// Every failure the application can report
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File or socket failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Template compilation or rendering failure
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Session token could not be signed or verified
    #[error("Session token error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    /// Password could not be hashed
    #[error("Password hashing error: {message}")]
    PasswordHash { message: String },

    /// Input rejected by a business rule
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// A record that does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A record with the same key already exists
    #[error("Already exists: {message}")]
    Conflict { message: String },

    /// The user already has a register open
    #[error("Register {register_id} is still open")]
    RegisterAlreadyOpen { register_id: i64 },

    /// The user may not perform the action
    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    /// Wrong username or password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No valid session
    #[error("Authentication required")]
    Unauthenticated,
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Forbidden`] with the given message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Errors caused by the request itself rather than by the system.
    ///
    /// These are reported back to the user as flash messages; everything else is
    /// logged and answered with a generic error page.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotFound { .. }
                | Self::Conflict { .. }
                | Self::RegisterAlreadyOpen { .. }
                | Self::Forbidden { .. }
                | Self::InvalidCredentials
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
