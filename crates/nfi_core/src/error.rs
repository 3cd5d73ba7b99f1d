use thiserror::Error;

/// Failure taxonomy for fleet event processing.
///
/// An unrecognized pattern tag is deliberately NOT represented here: it is a
/// decision outcome (an `Alert` verdict through the policy table's default
/// arm), not a failure.
#[derive(Debug, Error)]
pub enum FleetError {
    /// The event targets a server id nobody registered. The coordinator
    /// never guesses a default target.
    #[error("no server registered with id `{0}`")]
    UnknownServer(String),

    /// A second agent was registered under an id already in use.
    #[error("server id `{0}` is already registered")]
    DuplicateServer(String),

    /// The event is missing a required attribute for its category. Rejected
    /// before encoding; the encoder never substitutes defaults.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// A construction-time parameter lies outside its valid domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = core::result::Result<T, FleetError>;
