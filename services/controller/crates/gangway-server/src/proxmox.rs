//! Thin Proxmox VE API client.
//!
//! Treated as an external collaborator: the interesting parts of the
//! server never depend on more than the narrow methods exposed here.
//! Token auth is preferred (`Authorization: PVEAPIToken=...`); password
//! auth performs a one-time ticket login and carries the cookie plus CSRF
//! token on write requests.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use thiserror::Error;

use crate::config::{Config, resolve_api_user};

/// Failures from the Proxmox API collaborator.
#[derive(Debug, Error)]
pub enum ProxmoxError {
    /// The API answered with a non-success status; `message` carries the
    /// upstream diagnostic (e.g. parameter verification details).
    #[error("Proxmox API rejected the request: {status} {message}")]
    Api { status: u16, message: String },

    #[error("Proxmox API transport error: {0}")]
    Transport(String),

    #[error("No Proxmox nodes available")]
    NoNodes,
}

enum Auth {
    /// Pre-built `PVEAPIToken=user@realm!name=value` header value.
    Token(String),
    /// Ticket from `POST /access/ticket`.
    Ticket { cookie: String, csrf: String },
}

pub struct ProxmoxClient {
    http: reqwest::Client,
    base: String,
    auth: Auth,
}

impl ProxmoxClient {
    /// Build a client from `config`, performing the ticket login when
    /// password auth is configured. Returns `None` when no Proxmox host is
    /// configured — the API routes then report that instead of failing at
    /// startup.
    ///
    /// # Errors
    ///
    /// Fails when neither token nor password credentials are configured,
    /// or when the ticket login is rejected.
    pub async fn connect(config: &Config) -> Result<Option<Self>> {
        let Some(host) = config.proxmox_host.as_deref() else {
            return Ok(None);
        };

        let (user, token_name) = resolve_api_user(
            config.proxmox_user.as_deref(),
            &config.proxmox_realm,
            config.proxmox_token_name.as_deref(),
        )?;

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.proxmox_verify_ssl)
            .build()
            .context("failed to build Proxmox HTTP client")?;
        let base = format!("https://{host}:{}/api2/json", config.proxmox_port);

        let auth = match (token_name, config.proxmox_token_value.as_deref()) {
            (Some(name), Some(value)) => {
                tracing::info!(user = %user, token = %name, "using Proxmox API token authentication");
                Auth::Token(format!("PVEAPIToken={user}!{name}={value}"))
            }
            _ => match config.proxmox_password.as_deref() {
                Some(password) => {
                    tracing::warn!(
                        user = %user,
                        "using Proxmox password authentication (consider an API token instead)"
                    );
                    login(&http, &base, &user, password).await?
                }
                None => bail!(
                    "provide either GANGWAY_PROXMOX_TOKEN_NAME + GANGWAY_PROXMOX_TOKEN_VALUE \
                     or GANGWAY_PROXMOX_PASSWORD"
                ),
            },
        };

        tracing::info!(
            base = %base,
            verify_ssl = config.proxmox_verify_ssl,
            "connected to Proxmox API"
        );
        Ok(Some(Self { http, base, auth }))
    }

    pub async fn version(&self) -> Result<Value, ProxmoxError> {
        self.get("/version").await
    }

    pub async fn nodes(&self) -> Result<Value, ProxmoxError> {
        self.get("/nodes").await
    }

    /// The first node name of the cluster, used when a request leaves
    /// `node` unset.
    pub async fn first_node(&self) -> Result<String, ProxmoxError> {
        let nodes = self.nodes().await?;
        nodes
            .as_array()
            .and_then(|list| list.first())
            .and_then(|node| node.get("node"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ProxmoxError::NoNodes)
    }

    pub async fn list_lxc(&self, node: &str) -> Result<Value, ProxmoxError> {
        self.get(&format!("/nodes/{node}/lxc")).await
    }

    pub async fn start_lxc(&self, node: &str, vmid: u32) -> Result<Value, ProxmoxError> {
        self.post(&format!("/nodes/{node}/lxc/{vmid}/status/start"), &[])
            .await
    }

    /// Graceful shutdown, or hard stop when `force` is set.
    pub async fn stop_lxc(&self, node: &str, vmid: u32, force: bool) -> Result<Value, ProxmoxError> {
        if force {
            self.post(
                &format!("/nodes/{node}/lxc/{vmid}/status/stop"),
                &[("force".to_string(), "1".to_string())],
            )
            .await
        } else {
            self.post(&format!("/nodes/{node}/lxc/{vmid}/status/shutdown"), &[])
                .await
        }
    }

    pub async fn create_lxc(
        &self,
        node: &str,
        params: &[(String, String)],
    ) -> Result<Value, ProxmoxError> {
        self.post(&format!("/nodes/{node}/lxc"), params).await
    }

    async fn get(&self, path: &str) -> Result<Value, ProxmoxError> {
        let request = self.apply_auth(self.http.get(format!("{}{path}", self.base)), false);
        let response = request
            .send()
            .await
            .map_err(|e| ProxmoxError::Transport(e.to_string()))?;
        unwrap_data(response).await
    }

    async fn post(&self, path: &str, params: &[(String, String)]) -> Result<Value, ProxmoxError> {
        let request = self
            .apply_auth(self.http.post(format!("{}{path}", self.base)), true)
            .form(params);
        let response = request
            .send()
            .await
            .map_err(|e| ProxmoxError::Transport(e.to_string()))?;
        unwrap_data(response).await
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder, write: bool) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Token(header) => request.header(reqwest::header::AUTHORIZATION, header),
            Auth::Ticket { cookie, csrf } => {
                let request =
                    request.header(reqwest::header::COOKIE, format!("PVEAuthCookie={cookie}"));
                if write {
                    request.header("CSRFPreventionToken", csrf)
                } else {
                    request
                }
            }
        }
    }
}

/// `POST /access/ticket` password login.
async fn login(
    http: &reqwest::Client,
    base: &str,
    user: &str,
    password: &str,
) -> Result<Auth> {
    let response = http
        .post(format!("{base}/access/ticket"))
        .form(&[("username", user), ("password", password)])
        .send()
        .await
        .context("Proxmox ticket login failed")?;
    let data = unwrap_data(response)
        .await
        .context("Proxmox ticket login rejected")?;

    let cookie = data
        .get("ticket")
        .and_then(Value::as_str)
        .context("Proxmox ticket response missing 'ticket'")?
        .to_string();
    let csrf = data
        .get("CSRFPreventionToken")
        .and_then(Value::as_str)
        .context("Proxmox ticket response missing 'CSRFPreventionToken'")?
        .to_string();
    Ok(Auth::Ticket { cookie, csrf })
}

/// Unwrap the `{"data": ...}` envelope or surface the upstream error with
/// its per-field diagnostics.
async fn unwrap_data(response: reqwest::Response) -> Result<Value, ProxmoxError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProxmoxError::Transport(e.to_string()))?;

    if !status.is_success() {
        let mut message = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        if let Some(detail) = extract_error_detail(&body) {
            message.push_str(": ");
            message.push_str(&detail);
        }
        return Err(ProxmoxError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let value: Value = serde_json::from_str(&body)
        .map_err(|e| ProxmoxError::Transport(format!("invalid JSON from Proxmox: {e}")))?;
    Ok(value.get("data").cloned().unwrap_or(Value::Null))
}

/// Flatten a Proxmox error body (`{"errors": {"field": "reason", ...}}`)
/// into a single diagnostic line.
fn extract_error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let errors = value.get("errors")?.as_object()?;
    if errors.is_empty() {
        return None;
    }
    let mut parts: Vec<String> = errors
        .iter()
        .map(|(field, reason)| {
            let reason = reason.as_str().map_or_else(|| reason.to_string(), str::to_string);
            format!("{field}: {reason}")
        })
        .collect();
    parts.sort();
    Some(parts.join("; "))
}
