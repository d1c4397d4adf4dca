//! Docker adapter for the container engine trait, built on bollard

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    AttachContainerOptions, Config, CreateContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions, WaitContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CommitContainerOptions;
use bollard::models::HostConfig;
use bollard::{Docker, API_DEFAULT_VERSION};
use futures::StreamExt;
use tracing::debug;

use super::{Change, ChangeKind, ContainerEngine, ContainerSpec, EngineError, EngineResult, OutputStream};
use crate::error::{CyclopsError, Result};

/// Request timeout. Waiting on a long build step is a single request, so this is generous.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Seconds the daemon waits after SIGTERM before killing a stopped container
const STOP_GRACE_SECS: i64 = 10;

/// How to reach the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// Platform default socket
    LocalDefaults,
    /// Explicit `unix://` socket
    Socket(String),
    /// Plain TCP
    Http(String),
    /// TCP with client certificates from `cert_dir`
    Tls { addr: String, cert_dir: PathBuf },
}

/// Connection settings, usually taken from `DOCKER_HOST`, `DOCKER_TLS_VERIFY`
/// and `DOCKER_CERT_PATH`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerConfig {
    pub transport: Transport,
}

impl DockerConfig {
    /// Validate the raw settings and pick a transport
    pub fn resolve(host: Option<&str>, tls_verify: Option<&str>, cert_path: Option<&str>) -> Result<Self> {
        let host = host.map(str::trim).filter(|h| !h.is_empty());
        let tls = tls_verify.map(is_truthy).unwrap_or(false);
        let cert_path = cert_path.map(str::trim).filter(|p| !p.is_empty());

        let transport = match host {
            None if tls => {
                return Err(CyclopsError::Connection(
                    "DOCKER_TLS_VERIFY set without DOCKER_HOST".to_string(),
                ))
            }
            None => Transport::LocalDefaults,
            Some(h) if h.starts_with("unix://") || h.starts_with("npipe://") => Transport::Socket(h.to_string()),
            Some(h) if tls => {
                let cert_dir = cert_path.ok_or_else(|| {
                    CyclopsError::Connection("DOCKER_TLS_VERIFY set without DOCKER_CERT_PATH".to_string())
                })?;
                Transport::Tls {
                    addr: h.to_string(),
                    cert_dir: PathBuf::from(cert_dir),
                }
            }
            Some(h) => Transport::Http(h.to_string()),
        };

        Ok(Self { transport })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "yes" | "true")
}

/// Container engine backed by a Docker daemon
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Build the client for `config`. Does not contact the daemon; call `ping` for that.
    pub fn connect(config: &DockerConfig) -> Result<Self> {
        let timeout = REQUEST_TIMEOUT.as_secs();
        let docker = match &config.transport {
            Transport::LocalDefaults => Docker::connect_with_local_defaults(),
            Transport::Socket(path) => Docker::connect_with_socket(path, timeout, API_DEFAULT_VERSION),
            Transport::Http(addr) => Docker::connect_with_http(addr, timeout, API_DEFAULT_VERSION),
            Transport::Tls { addr, cert_dir } => Docker::connect_with_ssl(
                addr,
                &cert_dir.join("key.pem"),
                &cert_dir.join("cert.pem"),
                &cert_dir.join("ca.pem"),
                timeout,
                API_DEFAULT_VERSION,
            ),
        }
        .map_err(|e| CyclopsError::Connection(e.to_string()))?;

        Ok(Self {
            docker: docker.with_timeout(REQUEST_TIMEOUT),
        })
    }
}

fn is_not_found(err: &BollardError) -> bool {
    matches!(err, BollardError::DockerResponseServerError { status_code: 404, .. })
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn ping(&self) -> EngineResult<()> {
        self.docker.ping().await?;
        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String> {
        let config = Config {
            image: Some(spec.image.clone()),
            cmd: Some(spec.cmd.clone()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            host_config: Some(HostConfig {
                binds: Some(spec.binds.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    EngineError::ImageNotFound(spec.image.clone())
                } else {
                    EngineError::from(e)
                }
            })?;

        for warning in &created.warnings {
            debug!(container_id = %created.id, %warning, "engine warning on create");
        }
        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> EngineResult<()> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(())
    }

    async fn attach_output(&self, id: &str) -> EngineResult<OutputStream> {
        let options = AttachContainerOptions::<String> {
            stdout: Some(true),
            stderr: Some(true),
            stream: Some(true),
            logs: Some(true),
            ..Default::default()
        };
        let attached = self.docker.attach_container(id, Some(options)).await?;

        let output = attached
            .output
            .map(|frame| {
                frame
                    .map(|log| log.into_bytes().to_vec())
                    .map_err(EngineError::from)
            })
            .boxed();
        Ok(output)
    }

    async fn wait_container(&self, id: &str) -> EngineResult<i64> {
        let mut responses = Box::pin(
            self.docker
                .wait_container(id, None::<WaitContainerOptions<String>>),
        );

        match responses.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard reports a non-zero exit as an error carrying the code
            Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(e.into()),
            None => Err(EngineError::Other(format!("wait on {} returned no status", id))),
        }
    }

    async fn stop_container(&self, id: &str) -> EngineResult<()> {
        self.docker
            .stop_container(id, Some(StopContainerOptions { t: STOP_GRACE_SECS }))
            .await?;
        Ok(())
    }

    async fn inspect_image(&self, name: &str) -> EngineResult<bool> {
        match self.docker.inspect_image(name).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn commit_container(&self, id: &str) -> EngineResult<String> {
        let options = CommitContainerOptions {
            container: id.to_string(),
            pause: true,
            ..Default::default()
        };
        let commit = self
            .docker
            .commit_container(options, Config::<String>::default())
            .await?;

        commit
            .id
            .ok_or_else(|| EngineError::Other(format!("commit of {} returned no image id", id)))
    }

    async fn container_changes(&self, id: &str) -> EngineResult<Vec<Change>> {
        let changes = self.docker.container_changes(id).await?.unwrap_or_default();

        Ok(changes
            .into_iter()
            .filter_map(|change| {
                let kind = ChangeKind::from_code(change.kind as i64)?;
                Some(Change::new(change.path, kind))
            })
            .collect())
    }

    async fn remove_container(&self, id: &str) -> EngineResult<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    EngineError::ContainerNotFound(id.to_string())
                } else {
                    EngineError::from(e)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_no_host_uses_local_defaults() {
        let config = DockerConfig::resolve(None, None, None).unwrap();
        assert_eq!(config.transport, Transport::LocalDefaults);

        let config = DockerConfig::resolve(Some("  "), Some("0"), None).unwrap();
        assert_eq!(config.transport, Transport::LocalDefaults);
    }

    #[test]
    fn test_resolve_socket() {
        let config = DockerConfig::resolve(Some("unix:///var/run/docker.sock"), None, None).unwrap();
        assert_eq!(
            config.transport,
            Transport::Socket("unix:///var/run/docker.sock".to_string())
        );
    }

    #[test]
    fn test_resolve_tls_requires_cert_path() {
        for flag in ["yes", "1", "TRUE"] {
            let err = DockerConfig::resolve(Some("tcp://192.168.254.254:2376/"), Some(flag), None).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Cannot connect to container engine: DOCKER_TLS_VERIFY set without DOCKER_CERT_PATH"
            );
        }
    }

    #[test]
    fn test_resolve_tls() {
        let config = DockerConfig::resolve(
            Some("tcp://192.168.254.254:2376/"),
            Some("1"),
            Some("fixtures/certs/"),
        )
        .unwrap();
        assert_eq!(
            config.transport,
            Transport::Tls {
                addr: "tcp://192.168.254.254:2376/".to_string(),
                cert_dir: PathBuf::from("fixtures/certs/"),
            }
        );
    }

    #[test]
    fn test_resolve_insecure_tcp() {
        for flag in [Some("no"), Some("0"), Some(""), None] {
            let config = DockerConfig::resolve(Some("tcp://192.168.254.254:2376/"), flag, None).unwrap();
            assert_eq!(
                config.transport,
                Transport::Http("tcp://192.168.254.254:2376/".to_string())
            );
        }
    }
}
