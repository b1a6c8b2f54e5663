//! Provisioning core: turns credentials and a region into a WireGuard config

pub mod error;
pub mod provision;
pub mod render;
pub mod sanitize;

pub use error::{ErrorKind, ProvisioningError};
pub use provision::{
    tunnel_name, ConfigResult, GeneratedConfig, ProvisioningRequest, Provisioner,
    TUNNEL_NAME_PREFIX,
};
pub use render::render;
pub use sanitize::sanitize;
