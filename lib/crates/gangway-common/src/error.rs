//! Typed error enums for the validation core.
//!
//! This module has zero imports from `std::fs`, `std::process`, or
//! `std::net`. Every rejection is deterministic and carries the offending
//! fragment so the HTTP layer can build a precise client-facing message
//! without leaking internals.

use thiserror::Error;

// ── Connection-spec resolution errors ────────────────────────────────────────

/// Failures while resolving a raw connection target into a `ConnectionSpec`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("SSH host cannot be empty")]
    EmptyHost,

    #[error("Unsupported SSH URI scheme: {scheme}")]
    UnsupportedScheme { scheme: String },

    #[error("SSH host specification must not include a path component (got: {host:?})")]
    HostHasPathComponent { host: String },

    #[error("SSH username in host specification cannot be empty")]
    EmptyUser,

    #[error("Invalid SSH port value: {value} (expected an integer between 1 and 65535)")]
    InvalidPort { value: String },

    #[error("SSH port in host specification cannot be empty")]
    EmptyPort,

    #[error("Invalid IPv6 SSH host format (got: {host:?}); expected [addr] or [addr]:port")]
    InvalidIpv6Literal { host: String },

    #[error("Invalid SSH key material: {reason}")]
    InvalidKeyMaterial { reason: String },
}

// ── Command validation errors ────────────────────────────────────────────────

/// Failures while validating a raw shell command against the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    #[error("Command cannot be empty")]
    EmptyCommand,

    #[error("Shell metacharacter {0:?} is not allowed")]
    ForbiddenMetacharacter(char),

    #[error("Invalid command: {0}")]
    InvalidSyntax(String),

    #[error("Use spaces around '&&' to chain commands (got token: {token:?})")]
    ChainingSyntax { token: String },

    #[error("Command segment cannot be empty before '&&'")]
    EmptySegment,

    #[error("Command cannot end with '&&'")]
    TrailingChain,

    #[error("Executable {executable:?} is not allowed. Allowed executables: {allowed}")]
    ExecutableNotAllowed { executable: String, allowed: String },

    #[error("Command list cannot be empty")]
    EmptyCommandList,

    #[error("Invalid environment variable name: {key:?} (expected letters, digits, underscores, not starting with a digit)")]
    InvalidEnvKey { key: String },
}

// ── LXC create-request validation errors ─────────────────────────────────────

/// Failures while validating container creation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LxcError {
    #[error("Hostname must be 255 characters or less")]
    HostnameTooLong,

    #[error("Hostname labels must be alphanumeric with interior hyphens (got: {hostname:?})")]
    InvalidHostname { hostname: String },

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("cores must be >= 1")]
    TooFewCores,

    #[error("memory must be >= 128 MB")]
    TooLittleMemory,

    #[error("rootfs_gb must be >= 4 GB")]
    RootfsTooSmall,

    #[error("Invalid ip_cidr value: {value:?} (expected 'dhcp' or address/prefix)")]
    InvalidIpCidr { value: String },

    #[error("Invalid gateway address: {value:?}")]
    InvalidGateway { value: String },
}
