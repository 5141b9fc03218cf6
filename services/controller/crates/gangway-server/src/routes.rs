//! HTTP surface: request/response types, handlers, and the error-to-status
//! mapping.
//!
//! Handlers stay thin: every decision with interesting semantics lives in
//! `gangway-common` (resolution, validation, rendering) or in a
//! collaborator (`proxmox`, `ssh`); this module wires them together and
//! translates typed failures into HTTP statuses.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::{Value, json};

use gangway_common::{
    ConnectionRequest, FsProbe, LxcError, ResolveError, ValidateError, join_rendered, resolve,
    validate, validate_all, validate_env_keys,
};

use crate::proxmox::ProxmoxError;
use crate::ssh::{ExecOutput, SshRunner, pct_exec_command};
use crate::state::AppState;

/// Remote command wall-clock limits, matching the original deployment's
/// behaviour: generous for deploys, tighter for ad-hoc commands.
const EXEC_TIMEOUT: Duration = Duration::from_secs(1800);
const DEPLOY_STEP_TIMEOUT: Duration = Duration::from_secs(3600);

const DEFAULT_OPERATIONS_LIMIT: usize = 50;

// ===================================================================
// Router
// ===================================================================

pub fn router(state: Arc<AppState>) -> axum::Router {
    axum::Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/nodes", get(nodes))
        .route("/lxc", get(list_lxc))
        .route("/lxc/start", post(start_lxc))
        .route("/lxc/stop", post(stop_lxc))
        .route("/lxc/create", post(create_lxc))
        .route("/lxc/exec", post(lxc_exec))
        .route("/deploy", post(deploy))
        .route("/ssh/run", post(ssh_run))
        .route("/operations", get(operations))
        .with_state(state)
}

// ===================================================================
// Error mapping
// ===================================================================

/// Handler-level failure, carrying the HTTP status it maps to. The body is
/// always `{"detail": "..."}` with the typed message; stack traces and
/// internal chains never leak.
#[derive(Debug)]
pub enum ApiError {
    /// The request itself is invalid (parse/validate failures, upstream
    /// parameter rejection).
    BadRequest(String),
    /// The upstream (Proxmox API, SSH transport) could not be reached or
    /// failed mid-flight.
    Upstream(String),
    /// No Proxmox API configured for a route that needs one.
    Unavailable(String),
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> &str {
        match self {
            Self::BadRequest(d) | Self::Upstream(d) | Self::Unavailable(d) | Self::Internal(d) => d,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, detail = %self.detail(), "request failed");
        } else {
            tracing::warn!(status = %status, detail = %self.detail(), "request rejected");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ValidateError> for ApiError {
    fn from(err: ValidateError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<LxcError> for ApiError {
    fn from(err: LxcError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<ProxmoxError> for ApiError {
    fn from(err: ProxmoxError) -> Self {
        match err {
            // A 4xx from Proxmox is the client's problem (bad vmid, bad
            // create params); anything else is the upstream's.
            ProxmoxError::Api { status, .. } if status < 500 => Self::BadRequest(err.to_string()),
            ProxmoxError::Api { .. } | ProxmoxError::Transport(_) => Self::Upstream(err.to_string()),
            ProxmoxError::NoNodes => Self::Internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Upstream(format!("{err:#}"))
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

// ===================================================================
// Liveness and Proxmox passthrough
// ===================================================================

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn version(State(state): State<Arc<AppState>>) -> ApiResult {
    let data = proxmox(&state)?.version().await?;
    Ok(Json(data))
}

async fn nodes(State(state): State<Arc<AppState>>) -> ApiResult {
    let data = proxmox(&state)?.nodes().await?;
    Ok(Json(data))
}

#[derive(Debug, Deserialize)]
struct NodeQuery {
    node: Option<String>,
}

async fn list_lxc(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NodeQuery>,
) -> ApiResult {
    let client = proxmox(&state)?;
    let node = resolve_node(client, query.node).await?;
    let data = client.list_lxc(&node).await?;
    Ok(Json(data))
}

// ===================================================================
// LXC lifecycle
// ===================================================================

#[derive(Debug, Deserialize)]
struct LifecycleRequest {
    vmid: u32,
    node: Option<String>,
}

async fn start_lxc(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LifecycleRequest>,
) -> ApiResult {
    let client = proxmox(&state)?;
    let node = resolve_node(client, body.node).await?;
    let metadata = json!({ "node": node, "vmid": body.vmid });

    let outcome = client.start_lxc(&node, body.vmid).await;
    record(&state, "lxc.start", metadata, &outcome);
    let task = outcome?;
    Ok(Json(json!({ "ok": true, "task": task })))
}

#[derive(Debug, Deserialize)]
struct StopQuery {
    #[serde(default)]
    force: bool,
}

async fn stop_lxc(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StopQuery>,
    Json(body): Json<LifecycleRequest>,
) -> ApiResult {
    let client = proxmox(&state)?;
    let node = resolve_node(client, body.node).await?;
    let metadata = json!({ "node": node, "vmid": body.vmid, "force": query.force });

    let outcome = client.stop_lxc(&node, body.vmid, query.force).await;
    record(&state, "lxc.stop", metadata, &outcome);
    let task = outcome?;
    Ok(Json(json!({ "ok": true, "task": task })))
}

#[derive(Debug, Deserialize)]
struct CreateLxcRequest {
    vmid: u32,
    hostname: String,
    ostemplate: String,
    node: Option<String>,
    #[serde(default = "default_storage")]
    storage: String,
    #[serde(default = "default_cores")]
    cores: u32,
    #[serde(default = "default_memory_mb")]
    memory: u32,
    #[serde(default = "default_rootfs_gb")]
    rootfs_gb: u32,
    #[serde(default = "default_bridge")]
    bridge: String,
    /// `dhcp` or `address/prefix`.
    ip_cidr: Option<String>,
    gateway: Option<String>,
    /// Injected as the container root's authorized key.
    ssh_public_key: Option<String>,
    /// Root password; key-only containers omit it.
    password: Option<String>,
    /// e.g. `{"nesting": 1, "keyctl": 1}`.
    features: Option<BTreeMap<String, u8>>,
    #[serde(default = "default_true")]
    unprivileged: bool,
    #[serde(default = "default_true")]
    start: bool,
}

fn default_storage() -> String {
    "local-lvm".to_string()
}

fn default_cores() -> u32 {
    2
}

fn default_memory_mb() -> u32 {
    2048
}

fn default_rootfs_gb() -> u32 {
    16
}

fn default_bridge() -> String {
    "vmbr0".to_string()
}

fn default_true() -> bool {
    true
}

async fn create_lxc(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateLxcRequest>,
) -> ApiResult {
    gangway_common::lxc::validate_hostname(&body.hostname)?;
    if let Some(password) = &body.password {
        gangway_common::lxc::validate_password(password, state.lxc_password_min_length)?;
    }
    gangway_common::lxc::validate_resources(body.cores, body.memory, body.rootfs_gb)?;
    if let Some(ip) = &body.ip_cidr {
        gangway_common::lxc::validate_ip_cidr(ip)?;
    }
    if let Some(gateway) = &body.gateway {
        gangway_common::lxc::validate_gateway(gateway)?;
    }

    let client = proxmox(&state)?;
    let node = resolve_node(client, body.node.clone()).await?;
    let params = create_params(&body);
    let metadata = json!({
        "node": node,
        "vmid": body.vmid,
        "hostname": body.hostname,
        "ostemplate": body.ostemplate,
        "password": body.password,
    });

    // `start=1` rides on the create call itself so Proxmox sequences the
    // start after the (asynchronous) creation; a follow-up start request
    // would race it.
    let outcome = client.create_lxc(&node, &params).await;
    record(&state, "lxc.create", metadata, &outcome);
    let task = outcome?;
    Ok(Json(json!({ "ok": true, "task": task })))
}

/// Flatten a validated create request into Proxmox API form parameters.
/// A gateway only makes sense alongside a static address, so `gw` is
/// emitted only when `ip_cidr` is present.
fn create_params(body: &CreateLxcRequest) -> Vec<(String, String)> {
    let mut net0 = format!("name=eth0,bridge={}", body.bridge);
    if let Some(ip) = &body.ip_cidr {
        net0.push_str(",ip=");
        net0.push_str(ip);
        if let Some(gateway) = &body.gateway {
            net0.push_str(",gw=");
            net0.push_str(gateway);
        }
    }

    let mut params = vec![
        ("vmid".to_string(), body.vmid.to_string()),
        ("hostname".to_string(), body.hostname.clone()),
        ("ostemplate".to_string(), body.ostemplate.clone()),
        ("cores".to_string(), body.cores.to_string()),
        ("memory".to_string(), body.memory.to_string()),
        ("storage".to_string(), body.storage.clone()),
        (
            "rootfs".to_string(),
            format!("{}:{}", body.storage, body.rootfs_gb),
        ),
        ("net0".to_string(), net0),
        (
            "unprivileged".to_string(),
            u8::from(body.unprivileged).to_string(),
        ),
        ("start".to_string(), u8::from(body.start).to_string()),
    ];
    if let Some(key) = &body.ssh_public_key {
        params.push(("ssh-public-keys".to_string(), key.clone()));
    }
    if let Some(password) = &body.password {
        params.push(("password".to_string(), password.clone()));
    }
    if let Some(features) = body.features.as_ref().filter(|f| !f.is_empty()) {
        let rendered = features
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("features".to_string(), rendered));
    }
    params
}

// ===================================================================
// Command execution inside containers
// ===================================================================

#[derive(Debug, Deserialize)]
struct LxcExecRequest {
    vmid: u32,
    cmd: Option<String>,
    commands: Option<Vec<String>>,
}

async fn lxc_exec(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LxcExecRequest>,
) -> ApiResult {
    let command = match (&body.cmd, &body.commands) {
        (Some(cmd), None) => validate(cmd, &state.allow_list)?.rendered().to_string(),
        (None, Some(commands)) => join_rendered(&validate_all(commands, &state.allow_list)?),
        _ => {
            return Err(ApiError::BadRequest(
                "Provide exactly one of 'cmd' or 'commands'".to_string(),
            ));
        }
    };

    let runner = pve_runner(&state)?;
    let metadata = json!({ "vmid": body.vmid, "cmd": command });
    let outcome = runner
        .run(&pct_exec_command(body.vmid, &command), None, None, EXEC_TIMEOUT)
        .await;
    record_exec(&state, "lxc.exec", metadata, &outcome);
    let output = outcome?;
    Ok(Json(json!({
        "rc": output.rc,
        "stdout": output.stdout,
        "stderr": output.stderr,
    })))
}

// ===================================================================
// Deploy
// ===================================================================

/// Deploy a repository into a container by templated shell steps. The
/// steps are operator-supplied (or the built-in defaults) rather than
/// client-validated commands, so they are rendered and quoted but not
/// allow-list checked; only the `{{repo_url}}`/`{{workdir}}` values are
/// untrusted, and those are shell-quoted on substitution.
#[derive(Debug, Deserialize)]
struct DeployRequest {
    target_vmid: u32,
    repo_url: String,
    #[serde(default = "default_workdir")]
    workdir: String,
    #[serde(default = "default_setup")]
    setup: Vec<String>,
    #[serde(default = "default_deploy_commands")]
    commands: Vec<String>,
}

fn default_workdir() -> String {
    "/opt/app".to_string()
}

fn default_setup() -> Vec<String> {
    vec![
        "apt-get update".to_string(),
        "apt-get install -y git curl python3 python3-venv".to_string(),
    ]
}

fn default_deploy_commands() -> Vec<String> {
    vec![
        "git clone {{repo_url}} {{workdir}} || (rm -rf {{workdir}} && git clone {{repo_url}} {{workdir}})"
            .to_string(),
        "cd {{workdir}} && if [ -f requirements.txt ]; then python3 -m venv .venv && . .venv/bin/activate && pip install -U pip -r requirements.txt; fi"
            .to_string(),
        "cd {{workdir}} && if [ -f docker-compose.yml ]; then curl -fsSL https://get.docker.com | sh && systemctl start docker && docker compose up -d; fi"
            .to_string(),
        "cd {{workdir}} && if [ -f Makefile ]; then make run || true; fi".to_string(),
    ]
}

async fn deploy(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DeployRequest>,
) -> ApiResult {
    let runner = pve_runner(&state)?;

    let context: BTreeMap<String, String> = [
        ("repo_url".to_string(), body.repo_url.clone()),
        ("workdir".to_string(), body.workdir.clone()),
    ]
    .into_iter()
    .collect();

    let mut steps: Vec<Value> = Vec::new();
    let mut ok = true;
    for template in body.setup.iter().chain(&body.commands) {
        let rendered = gangway_common::render_template(template, &context);
        let result = runner
            .run(
                &pct_exec_command(body.target_vmid, &rendered),
                None,
                None,
                DEPLOY_STEP_TIMEOUT,
            )
            .await;
        match result {
            Ok(output) => {
                let failed = output.rc != 0;
                steps.push(json!({
                    "cmd": rendered,
                    "rc": output.rc,
                    "stdout": output.stdout,
                    "stderr": output.stderr,
                }));
                if failed {
                    ok = false;
                    break;
                }
            }
            Err(err) => {
                steps.push(json!({
                    "cmd": rendered,
                    "rc": -1,
                    "stdout": "",
                    "stderr": format!("{err:#}"),
                }));
                ok = false;
                break;
            }
        }
    }

    state.ops_log.record(
        "deploy",
        json!({
            "vmid": body.target_vmid,
            "repo_url": body.repo_url,
            "workdir": body.workdir,
        }),
        Some(json!({ "ok": ok, "steps": steps.len() })),
        (!ok).then(|| "deploy stopped on failed step".to_string()),
    );

    Ok(Json(json!({ "ok": ok, "steps": steps })))
}

// ===================================================================
// Arbitrary-host SSH
// ===================================================================

#[derive(Debug, Deserialize)]
struct SshRunRequest {
    #[serde(flatten)]
    connection: ConnectionRequest,
    cmd: String,
    env: Option<BTreeMap<String, String>>,
    cwd: Option<String>,
}

async fn ssh_run(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SshRunRequest>,
) -> ApiResult {
    let plan = validate(&body.cmd, &state.allow_list)?;
    if let Some(env) = &body.env {
        validate_env_keys(env.keys().map(String::as_str))?;
    }
    let spec = resolve(&body.connection, &state.ssh_defaults, &FsProbe)?;

    let metadata = json!({
        "host": spec.host(),
        "user": spec.user(),
        "port": spec.port(),
        "cmd": plan.rendered(),
    });
    let outcome = SshRunner::new(spec)
        .run(plan.rendered(), body.env.as_ref(), body.cwd.as_deref(), EXEC_TIMEOUT)
        .await;
    record_exec(&state, "ssh.run", metadata, &outcome);
    let output = outcome?;
    Ok(Json(json!({
        "rc": output.rc,
        "stdout": output.stdout,
        "stderr": output.stderr,
    })))
}

// ===================================================================
// Operation log
// ===================================================================

#[derive(Debug, Deserialize)]
struct OperationsQuery {
    limit: Option<usize>,
}

async fn operations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OperationsQuery>,
) -> Json<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_OPERATIONS_LIMIT);
    let entries = state.ops_log.latest(limit);
    Json(json!({ "operations": entries }))
}

// ===================================================================
// Helpers
// ===================================================================

fn proxmox(state: &AppState) -> Result<&crate::proxmox::ProxmoxClient, ApiError> {
    state.proxmox.as_ref().ok_or_else(|| {
        ApiError::Unavailable("Proxmox API is not configured (set GANGWAY_PROXMOX_HOST)".to_string())
    })
}

async fn resolve_node(
    client: &crate::proxmox::ProxmoxClient,
    node: Option<String>,
) -> Result<String, ApiError> {
    match node {
        Some(node) if !node.trim().is_empty() => Ok(node),
        _ => Ok(client.first_node().await?),
    }
}

/// The PVE-host SSH runner used by `/lxc/exec` and `/deploy`, built from
/// the configured defaults alone.
fn pve_runner(state: &AppState) -> Result<SshRunner, ApiError> {
    let spec = resolve(&ConnectionRequest::default(), &state.ssh_defaults, &FsProbe)?;
    Ok(SshRunner::new(spec))
}

fn record(
    state: &AppState,
    kind: &str,
    metadata: Value,
    outcome: &Result<Value, ProxmoxError>,
) {
    match outcome {
        Ok(result) => state
            .ops_log
            .record(kind, metadata, Some(result.clone()), None),
        Err(err) => state
            .ops_log
            .record(kind, metadata, None, Some(err.to_string())),
    }
}

fn record_exec(
    state: &AppState,
    kind: &str,
    metadata: Value,
    outcome: &Result<ExecOutput, anyhow::Error>,
) {
    match outcome {
        Ok(output) => state.ops_log.record(
            kind,
            metadata,
            Some(json!({ "rc": output.rc })),
            (output.rc != 0).then(|| format!("exited with rc {}", output.rc)),
        ),
        Err(err) => state
            .ops_log
            .record(kind, metadata, None, Some(format!("{err:#}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Request deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn test_create_lxc_request_fills_defaults() {
        // Neither password nor ssh_public_key is required; a key-only
        // container omits the password entirely.
        let body: CreateLxcRequest = serde_json::from_value(json!({
            "vmid": 116,
            "hostname": "web1",
            "ostemplate": "local:vztmpl/debian-12-standard_12.2-1_amd64.tar.zst",
        }))
        .expect("deserialize");
        assert_eq!(body.storage, "local-lvm");
        assert_eq!(body.cores, 2);
        assert_eq!(body.memory, 2048);
        assert_eq!(body.rootfs_gb, 16);
        assert_eq!(body.bridge, "vmbr0");
        assert!(body.unprivileged);
        assert!(body.start);
        assert!(body.password.is_none());
        assert!(body.ssh_public_key.is_none());
        assert!(body.features.is_none());
    }

    #[test]
    fn test_ssh_run_request_flattens_connection_fields() {
        let body: SshRunRequest = serde_json::from_value(json!({
            "host": "ssh://admin@10.0.0.5:2200",
            "key_data_b64": "LS0tLS1CRUdJTg==",
            "cmd": "ls -la",
            "cwd": "/opt",
        }))
        .expect("deserialize");
        assert_eq!(body.connection.host.as_deref(), Some("ssh://admin@10.0.0.5:2200"));
        assert_eq!(body.connection.key_material.as_deref(), Some("LS0tLS1CRUdJTg=="));
        assert_eq!(body.cmd, "ls -la");
        assert_eq!(body.cwd.as_deref(), Some("/opt"));
    }

    #[test]
    fn test_deploy_request_default_steps_are_templated() {
        let body: DeployRequest = serde_json::from_value(json!({
            "target_vmid": 9,
            "repo_url": "https://example.com/repo.git",
        }))
        .expect("deserialize");
        assert_eq!(body.workdir, "/opt/app");
        assert_eq!(body.setup.len(), 2);
        assert!(body.commands.iter().any(|c| c.contains("{{repo_url}}")));
    }

    // -----------------------------------------------------------------------
    // Create-parameter flattening
    // -----------------------------------------------------------------------

    fn create_request() -> CreateLxcRequest {
        serde_json::from_value(json!({
            "vmid": 116,
            "hostname": "web1",
            "password": "secret",
            "ostemplate": "local:vztmpl/debian-12.tar.zst",
            "ip_cidr": "10.0.0.16/24",
            "gateway": "10.0.0.1",
            "features": {"nesting": 1, "keyctl": 1},
        }))
        .expect("deserialize")
    }

    fn lookup<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_create_params_flattens_rootfs_net0_and_features() {
        let params = create_params(&create_request());
        assert_eq!(lookup(&params, "storage"), Some("local-lvm"));
        assert_eq!(lookup(&params, "rootfs"), Some("local-lvm:16"));
        assert_eq!(
            lookup(&params, "net0"),
            Some("name=eth0,bridge=vmbr0,ip=10.0.0.16/24,gw=10.0.0.1")
        );
        assert_eq!(lookup(&params, "features"), Some("keyctl=1,nesting=1"));
        assert_eq!(lookup(&params, "unprivileged"), Some("1"));
        assert_eq!(lookup(&params, "password"), Some("secret"));
    }

    #[test]
    fn test_create_params_sequences_start_through_proxmox() {
        // `start` is a create parameter, not a separate call, so the
        // upstream orders it after the asynchronous creation.
        let params = create_params(&create_request());
        assert_eq!(lookup(&params, "start"), Some("1"));

        let mut request = create_request();
        request.start = false;
        assert_eq!(lookup(&create_params(&request), "start"), Some("0"));
    }

    #[test]
    fn test_create_params_key_only_container() {
        let mut request = create_request();
        request.password = None;
        request.ssh_public_key = Some("ssh-ed25519 AAAA... ops@bastion".to_string());
        let params = create_params(&request);
        assert!(!params.iter().any(|(k, _)| k == "password"));
        assert_eq!(
            lookup(&params, "ssh-public-keys"),
            Some("ssh-ed25519 AAAA... ops@bastion")
        );
    }

    #[test]
    fn test_create_params_omits_gateway_without_static_ip() {
        let mut request = create_request();
        request.ip_cidr = None;
        let params = create_params(&request);
        assert_eq!(lookup(&params, "net0"), Some("name=eth0,bridge=vmbr0"));
    }

    #[test]
    fn test_create_params_omits_features_when_absent_or_empty() {
        let mut request = create_request();
        request.features = None;
        assert!(!create_params(&request).iter().any(|(k, _)| k == "features"));
        request.features = Some(BTreeMap::new());
        assert!(!create_params(&request).iter().any(|(k, _)| k == "features"));
    }

    // -----------------------------------------------------------------------
    // Error mapping
    // -----------------------------------------------------------------------

    #[test]
    fn test_api_error_statuses() {
        assert_eq!(
            ApiError::from(ResolveError::EmptyHost).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ValidateError::ForbiddenMetacharacter(';')).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ProxmoxError::Api {
                status: 400,
                message: "Parameter verification failed".to_string(),
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ProxmoxError::Api {
                status: 500,
                message: "internal error".to_string(),
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(ProxmoxError::Transport("connection refused".to_string())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(ProxmoxError::NoNodes).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_detail_carries_typed_message() {
        let err = ApiError::from(ValidateError::ExecutableNotAllowed {
            executable: "rm".to_string(),
            allowed: "bash, ls".to_string(),
        });
        assert!(err.detail().contains("rm"));
    }
}
