//! Error taxonomy for the auction API client.
//!
//! Resource-client functions signal failure with a short, user-presentable
//! message. Callers catch at the point of user interaction and render the
//! message; nothing here is retried automatically, and no failure is fatal
//! to the whole application.

/// A failure raised by the session guard or a resource-client call.
///
/// Transport-level errors (network unreachable, DNS failure) are not part of
/// this taxonomy; they propagate unmodified as `anyhow` errors from the
/// transport.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// A required input was absent (e.g. no listing id).
    MissingParameter(&'static str),
    /// No profile is stored for an operation that needs the current user.
    MissingUser,
    /// No token is stored for an operation that requires authentication.
    MissingSession,
    /// A read returned a non-success HTTP status.
    FetchFailed { status: u16, message: String },
    /// Listing creation returned a non-success HTTP status.
    CreateFailed { status: u16, message: String },
    /// Bid placement returned a non-success HTTP status.
    BidFailed { status: u16, message: String },
    /// Profile update returned a non-success HTTP status.
    UpdateFailed { status: u16, message: String },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingParameter(what) => write!(f, "{} is required", what),
            Self::MissingUser => write!(f, "no profile found in the session store"),
            Self::MissingSession => {
                write!(f, "you must be logged in to access this feature")
            }
            Self::FetchFailed { status, message } => {
                write!(f, "fetch failed ({}): {}", status, message)
            }
            Self::CreateFailed { status, message } => {
                write!(f, "failed to create listing ({}): {}", status, message)
            }
            Self::BidFailed { status, message } => {
                write!(f, "failed to place bid ({}): {}", status, message)
            }
            Self::UpdateFailed { status, message } => {
                write!(f, "failed to update profile ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}
