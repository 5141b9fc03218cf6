//! Container create-request validation.
//!
//! Pure functions only — limits arrive as arguments, never from the
//! process environment, so tests stay deterministic.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::LxcError;

pub const MAX_HOSTNAME_LEN: usize = 255;
pub const DEFAULT_PASSWORD_MIN_LEN: usize = 5;
pub const MIN_CORES: u32 = 1;
pub const MIN_MEMORY_MB: u32 = 128;
pub const MIN_ROOTFS_GB: u32 = 4;

static HOSTNAME_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern — cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?$").expect("valid regex")
});

/// Validate a container hostname: at most 255 characters, dot-separated
/// labels that are alphanumeric with interior hyphens.
///
/// # Errors
///
/// Returns `HostnameTooLong` or `InvalidHostname`.
pub fn validate_hostname(hostname: &str) -> Result<(), LxcError> {
    if hostname.len() > MAX_HOSTNAME_LEN {
        return Err(LxcError::HostnameTooLong);
    }
    if hostname.is_empty()
        || !hostname.split('.').all(|label| HOSTNAME_LABEL_RE.is_match(label))
    {
        return Err(LxcError::InvalidHostname {
            hostname: hostname.to_string(),
        });
    }
    Ok(())
}

/// Validate a container root password against a configurable minimum
/// length (deployments set it via `GANGWAY_LXC_PASSWORD_MIN_LENGTH`).
///
/// # Errors
///
/// Returns `PasswordTooShort` when below `min_len`.
pub fn validate_password(password: &str, min_len: usize) -> Result<(), LxcError> {
    if password.chars().count() < min_len {
        return Err(LxcError::PasswordTooShort { min: min_len });
    }
    Ok(())
}

/// Validate resource floors for container creation.
///
/// # Errors
///
/// Returns the first violated floor.
pub fn validate_resources(cores: u32, memory_mb: u32, rootfs_gb: u32) -> Result<(), LxcError> {
    if cores < MIN_CORES {
        return Err(LxcError::TooFewCores);
    }
    if memory_mb < MIN_MEMORY_MB {
        return Err(LxcError::TooLittleMemory);
    }
    if rootfs_gb < MIN_ROOTFS_GB {
        return Err(LxcError::RootfsTooSmall);
    }
    Ok(())
}

/// Validate the `ip_cidr` field: either the literal `dhcp` or
/// `address/prefix` with a prefix that fits the address family.
///
/// # Errors
///
/// Returns `InvalidIpCidr` on anything else.
pub fn validate_ip_cidr(value: &str) -> Result<(), LxcError> {
    if value == "dhcp" {
        return Ok(());
    }
    let invalid = || LxcError::InvalidIpCidr {
        value: value.to_string(),
    };
    let (addr, prefix) = value.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid());
    }
    Ok(())
}

/// Validate the `gateway` field as a plain IP address.
///
/// # Errors
///
/// Returns `InvalidGateway` when the value does not parse.
pub fn validate_gateway(value: &str) -> Result<(), LxcError> {
    value
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| LxcError::InvalidGateway {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Hostname
    // -----------------------------------------------------------------------

    #[test]
    fn test_validate_hostname_accepts_simple_and_dotted_names() {
        assert!(validate_hostname("ct116").is_ok());
        assert!(validate_hostname("example.com").is_ok());
        assert!(validate_hostname("a-b.c-d.e").is_ok());
    }

    #[test]
    fn test_validate_hostname_accepts_unresolvable_names() {
        // Format rules only — no DNS probe.
        assert!(validate_hostname("unresolvable").is_ok());
    }

    #[test]
    fn test_validate_hostname_rejects_invalid_characters() {
        let err = validate_hostname("bad_host!").expect_err("underscore and bang");
        assert!(err.to_string().contains("alphanumeric"));
    }

    #[test]
    fn test_validate_hostname_rejects_hyphen_at_label_edge() {
        assert!(validate_hostname("-leading").is_err());
        assert!(validate_hostname("trailing-").is_err());
        assert!(validate_hostname("ok.-bad").is_err());
    }

    #[test]
    fn test_validate_hostname_rejects_empty_and_empty_label() {
        assert!(validate_hostname("").is_err());
        assert!(validate_hostname("a..b").is_err());
        assert!(validate_hostname(".a").is_err());
    }

    #[test]
    fn test_validate_hostname_rejects_over_255_characters() {
        let long = "a".repeat(256);
        let err = validate_hostname(&long).expect_err("too long");
        assert!(err.to_string().contains("255 characters or less"));
        assert!(validate_hostname(&"a".repeat(255)).is_ok());
    }

    // -----------------------------------------------------------------------
    // Password
    // -----------------------------------------------------------------------

    #[test]
    fn test_validate_password_default_minimum() {
        let err = validate_password("1234", DEFAULT_PASSWORD_MIN_LEN).expect_err("too short");
        assert!(err.to_string().contains("at least 5 characters"));
        assert!(validate_password("12345", DEFAULT_PASSWORD_MIN_LEN).is_ok());
    }

    #[test]
    fn test_validate_password_respects_configured_minimum() {
        assert!(validate_password("1023", 4).is_ok());
        assert!(validate_password("102", 4).is_err());
    }

    // -----------------------------------------------------------------------
    // Resources
    // -----------------------------------------------------------------------

    #[test]
    fn test_validate_resources_floors() {
        assert!(validate_resources(1, 128, 4).is_ok());
        assert_eq!(validate_resources(0, 2048, 16), Err(LxcError::TooFewCores));
        assert_eq!(validate_resources(2, 64, 16), Err(LxcError::TooLittleMemory));
        assert_eq!(validate_resources(2, 2048, 2), Err(LxcError::RootfsTooSmall));
    }

    // -----------------------------------------------------------------------
    // Network fields
    // -----------------------------------------------------------------------

    #[test]
    fn test_validate_ip_cidr_accepts_dhcp_and_cidr() {
        assert!(validate_ip_cidr("dhcp").is_ok());
        assert!(validate_ip_cidr("192.168.1.150/24").is_ok());
        assert!(validate_ip_cidr("fd00::10/64").is_ok());
    }

    #[test]
    fn test_validate_ip_cidr_rejects_malformed_values() {
        assert!(validate_ip_cidr("192.168.1.150").is_err());
        assert!(validate_ip_cidr("not-an-ip/24").is_err());
        assert!(validate_ip_cidr("192.168.1.150/33").is_err());
        assert!(validate_ip_cidr("fd00::10/129").is_err());
        assert!(validate_ip_cidr("DHCP").is_err());
    }

    #[test]
    fn test_validate_gateway() {
        assert!(validate_gateway("192.168.1.1").is_ok());
        assert!(validate_gateway("fd00::1").is_ok());
        assert!(validate_gateway("gateway").is_err());
    }
}
