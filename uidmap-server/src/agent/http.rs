//! HTTPS agent client
//!
//! Talks to the agent over mutual TLS using the material in the certificate
//! directory. The reqwest client is built on first use and cached; a probe
//! drops the cache so freshly uploaded certificates are picked up.

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info};
use uidmap_core::domain::connection::ConnectionConfig;
use uidmap_core::domain::work_item::WorkItem;

use super::message;
use super::{AgentAck, AgentClient, AgentError, ProbeError, ProbeStage};
use crate::config::ServerConfig;

pub const ROOT_CA_FILE: &str = "rootCA.crt";
pub const CLIENT_CERT_FILE: &str = "uia-client.crt";
pub const CLIENT_KEY_FILE: &str = "uia-client.key";
pub const SERVER_BUNDLE_FILE: &str = "uia-server-bundle.pem";

/// Locations of the client TLS material
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub root_ca: PathBuf,
    pub client_cert: PathBuf,
    pub client_key: PathBuf,
}

impl TlsPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            root_ca: dir.join(ROOT_CA_FILE),
            client_cert: dir.join(CLIENT_CERT_FILE),
            client_key: dir.join(CLIENT_KEY_FILE),
        }
    }

    fn missing(&self) -> Vec<String> {
        [&self.root_ca, &self.client_cert, &self.client_key]
            .into_iter()
            .filter(|p| !p.exists())
            .map(|p| p.display().to_string())
            .collect()
    }
}

pub struct HttpAgentClient {
    cert_dir: PathBuf,
    timeout: Duration,
    probe_timeout: Duration,
    client: RwLock<Option<reqwest::Client>>,
}

impl HttpAgentClient {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            cert_dir: config.cert_dir.clone(),
            timeout: config.agent_timeout,
            probe_timeout: config.probe_timeout,
            client: RwLock::new(None),
        }
    }

    /// Forgets the cached TLS client
    pub fn reload(&self) {
        *self.client.write() = None;
    }

    fn http_client(&self) -> Result<reqwest::Client, AgentError> {
        if let Some(client) = self.client.read().as_ref() {
            return Ok(client.clone());
        }

        let client = self.build_client()?;
        *self.client.write() = Some(client.clone());
        Ok(client)
    }

    fn build_client(&self) -> Result<reqwest::Client, AgentError> {
        let paths = TlsPaths::in_dir(&self.cert_dir);

        let missing = paths.missing();
        if !missing.is_empty() {
            return Err(AgentError::Misconfigured(format!(
                "missing certificate files: {}",
                missing.join(", ")
            )));
        }

        let read = |path: &Path| {
            std::fs::read(path).map_err(|e| {
                AgentError::Misconfigured(format!("cannot read {}: {}", path.display(), e))
            })
        };

        let root_ca = reqwest::Certificate::from_pem(&read(&paths.root_ca)?)
            .map_err(|e| AgentError::Misconfigured(format!("invalid root CA: {}", e)))?;

        let mut identity_pem = read(&paths.client_cert)?;
        identity_pem.push(b'\n');
        identity_pem.extend(read(&paths.client_key)?);
        let identity = reqwest::Identity::from_pem(&identity_pem)
            .map_err(|e| AgentError::Misconfigured(format!("invalid client identity: {}", e)))?;

        debug!("Building agent TLS client from {}", self.cert_dir.display());

        // Agent certificates are usually issued for an IP, not a hostname.
        reqwest::Client::builder()
            .use_rustls_tls()
            .add_root_certificate(root_ca)
            .identity(identity)
            .danger_accept_invalid_hostnames(true)
            .timeout(self.timeout)
            .build()
            .map_err(|e| AgentError::Misconfigured(format!("cannot build TLS client: {}", e)))
    }

    async fn send(&self, endpoint: &str, body: String) -> Result<AgentAck, AgentError> {
        ConnectionConfig::parse_endpoint(endpoint)
            .map_err(|e| AgentError::Misconfigured(e.to_string()))?;

        let client = self.http_client()?;
        let url = format!("https://{}/", endpoint);

        let response = client
            .post(&url)
            .header(CONTENT_TYPE, "application/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| AgentError::Unreachable(describe(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AgentError::Unreachable(format!("failed to read reply: {}", e)))?;

        message::parse_reply(&text)
            .map_err(|detail| AgentError::Rejected(format!("UIA agent error: {}", detail)))?;

        if status.is_client_error() || status.is_server_error() {
            return Err(AgentError::Rejected(format!("HTTP {}", status)));
        }

        Ok(AgentAck {
            status: status.as_u16(),
            body: text,
        })
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection error: {}", error)
    } else {
        error.to_string()
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn execute(
        &self,
        connection: &ConnectionConfig,
        item: &WorkItem,
    ) -> Result<AgentAck, AgentError> {
        self.send(&connection.endpoint, message::update_message(item))
            .await
    }

    /// Two stages: TCP connect, then `show version` over mutual TLS
    async fn probe(&self, endpoint: &str) -> Result<(), ProbeError> {
        let (host, port) = ConnectionConfig::parse_endpoint(endpoint)
            .map_err(|e| ProbeError::new(ProbeStage::Format, e.to_string()))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');

        info!("Stage 1: testing TCP connectivity to {}", endpoint);
        match tokio::time::timeout(self.probe_timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => info!("Stage 1 succeeded: port {} is open", port),
            Ok(Err(e)) => {
                return Err(ProbeError::new(
                    ProbeStage::Tcp,
                    format!("port {} is not reachable ({}); check firewall/service", port, e),
                ));
            }
            Err(_) => {
                return Err(ProbeError::new(
                    ProbeStage::Tcp,
                    format!("port {} did not answer within {:?}", port, self.probe_timeout),
                ));
            }
        }

        info!("Stage 2: testing mTLS and API response");
        self.reload();
        self.send(endpoint, message::version_request().to_string())
            .await
            .map_err(|e| ProbeError::new(ProbeStage::Api, e.to_string()))?;

        info!("Stage 2 succeeded: agent responded");
        Ok(())
    }
}
