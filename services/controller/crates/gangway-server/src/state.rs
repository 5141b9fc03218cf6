//! Shared per-process state handed to every request handler.

use gangway_common::{AllowList, ConnectionDefaults};

use crate::ops_log::OperationLog;
use crate::proxmox::ProxmoxClient;

pub struct AppState {
    /// `None` when no Proxmox host is configured; Proxmox routes then
    /// answer 503.
    pub proxmox: Option<ProxmoxClient>,
    pub allow_list: AllowList,
    pub ssh_defaults: ConnectionDefaults,
    pub ops_log: OperationLog,
    pub lxc_password_min_length: usize,
}
