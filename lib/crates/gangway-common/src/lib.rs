//! Pure validation core for the gangway controller.
//!
//! Two leaf components live here: the connection-spec resolver
//! ([`connection`]) and the command allow-list validator ([`command`]),
//! plus the small helpers both the `/lxc/create` and `/deploy` surfaces
//! need ([`lxc`], [`deploy`]). Everything is synchronous and free of
//! I/O — the only impure step, the default-key-file existence check, is
//! injected through the [`connection::FileProbe`] trait.

pub mod command;
pub mod connection;
pub mod deploy;
pub mod error;
pub mod lxc;
pub mod quote;

pub use command::{AllowList, CommandPlan, join_rendered, validate, validate_all, validate_env_keys};
pub use connection::{
    ConnectionDefaults, ConnectionRequest, ConnectionSpec, Credential, FileProbe, FsProbe, resolve,
};
pub use deploy::{render_all, render_template};
pub use error::{LxcError, ResolveError, ValidateError};
pub use quote::sh_quote;
