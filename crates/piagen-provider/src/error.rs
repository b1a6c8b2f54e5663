use thiserror::Error;

/// Errors raised by a provider client
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The region directory could not be fetched or parsed
    #[error("Failed to load region directory: {0}")]
    Directory(String),

    /// The requested region is not part of the directory
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// The region exists but has no usable server of the given kind
    #[error("Region '{region}' has no {kind} server")]
    NoServers { region: String, kind: &'static str },

    /// Local keypair generation failed
    #[error("Failed to generate keypair: {0}")]
    KeyGeneration(String),

    /// The provider rejected the supplied credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Connection, TLS or timeout failure while talking to the provider
    #[error("Transport error: {0}")]
    Transport(String),

    /// The provider refused to register the public key
    #[error("Key registration failed: {0}")]
    Registration(String),

    /// The provider answered with something we could not interpret
    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}
