use piagen_provider::ProviderError;
use thiserror::Error;

/// Broad category of a provisioning failure, used to pick the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Registration,
    Directory,
    Internal,
}

/// Errors returned by [`crate::Provisioner`]
///
/// `Display` yields the message shown to the user; provider details are
/// kept as the error source.
#[derive(Debug, Error)]
pub enum ProvisioningError {
    /// One of username, password or region is missing or empty
    #[error("All fields are required")]
    MissingFields,

    /// The region is not in the provider's directory
    #[error("Invalid region selected: {0}")]
    InvalidRegion(String),

    /// The provider rejected the credentials
    #[error("Invalid credentials or authentication failed")]
    Authentication,

    /// The provider refused to register the public key
    #[error("Failed to register key with server")]
    Registration(#[source] ProviderError),

    /// The region directory could not be loaded
    #[error("{0}")]
    Directory(#[source] ProviderError),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl ProvisioningError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProvisioningError::MissingFields | ProvisioningError::InvalidRegion(_) => {
                ErrorKind::Validation
            }
            ProvisioningError::Authentication => ErrorKind::Auth,
            ProvisioningError::Registration(_) => ErrorKind::Registration,
            ProvisioningError::Directory(_) => ErrorKind::Directory,
            ProvisioningError::Internal(_) => ErrorKind::Internal,
        }
    }
}
