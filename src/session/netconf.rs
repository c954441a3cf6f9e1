//! NETCONF device session
//!
//! Implements [`DeviceSession`] with Junos NETCONF RPCs (RFC 6241 plus the
//! Junos `load-configuration`, `commit-configuration` and `command` RPCs).
//!
//! Replies are scanned for `<rpc-error>` elements: severity `error` fails the
//! operation, severity `warning` is returned to the caller (commit warnings)
//! or logged.

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use super::{CommitOptions, DeviceSession, SessionFactory, SystemInformation};
use crate::config::DeviceConfig;
use crate::connection::{Connection, ConnectionError, TransportKind};
use crate::error::{Error, Result};

// ============================================================================
// NETCONF XML Namespaces
// ============================================================================

/// NETCONF base namespace (RFC 6241)
const NETCONF_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

// ============================================================================
// RPC Reply
// ============================================================================

/// Parsed NETCONF RPC reply
#[derive(Debug, Clone, Default)]
pub struct RpcReply {
    /// Whether the reply carried `<ok/>`
    pub ok: bool,
    /// Errors and warnings reported by the device
    pub errors: Vec<RpcError>,
    /// Content of the `<rpc-reply>` element
    pub data: String,
}

impl RpcReply {
    /// Parse NETCONF RPC reply
    pub fn parse(response: &str) -> Self {
        let data = match response.find("<rpc-reply") {
            Some(start) => {
                let body_start = response[start..]
                    .find('>')
                    .map(|end| start + end + 1)
                    .unwrap_or(response.len());
                let body_end = response.rfind("</rpc-reply>").unwrap_or(response.len());
                response[body_start..body_end.max(body_start)].to_string()
            }
            None => response.to_string(),
        };

        RpcReply {
            ok: data.contains("<ok/>") || data.contains("<ok />"),
            errors: Self::parse_errors(&data),
            data,
        }
    }

    /// Parse RPC errors from response
    fn parse_errors(response: &str) -> Vec<RpcError> {
        let mut errors = Vec::new();
        let mut search_start = 0;

        while let Some(start) = response[search_start..].find("<rpc-error>") {
            let abs_start = search_start + start;
            if let Some(end) = response[abs_start..].find("</rpc-error>") {
                let error_xml = &response[abs_start..abs_start + end + "</rpc-error>".len()];
                errors.push(RpcError::parse(error_xml));
                search_start = abs_start + end + "</rpc-error>".len();
            } else {
                break;
            }
        }

        errors
    }

    /// Errors with severity `error`
    pub fn failures(&self) -> impl Iterator<Item = &RpcError> {
        self.errors.iter().filter(|e| !e.is_warning())
    }

    /// Messages of errors with severity `warning`
    pub fn warnings(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|e| e.is_warning())
            .map(ToString::to_string)
            .collect()
    }

    /// Fail if the reply carries at least one error
    fn check(self, operation: &'static str) -> Result<Self> {
        let failures: Vec<String> = self.failures().map(ToString::to_string).collect();
        if failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::device(operation, failures.join("\n")))
        }
    }
}

/// NETCONF RPC error
#[derive(Debug, Clone)]
pub struct RpcError {
    /// Error type (protocol, application, etc.)
    pub error_type: String,
    /// Error tag (e.g., invalid-value, operation-failed)
    pub error_tag: String,
    /// Error severity (error, warning)
    pub error_severity: String,
    /// Error message
    pub error_message: Option<String>,
    /// Error path (configuration element that caused the error)
    pub error_path: Option<String>,
}

impl RpcError {
    /// Parse a single rpc-error element
    fn parse(xml: &str) -> Self {
        RpcError {
            error_type: extract_element(xml, "error-type").unwrap_or_default(),
            error_tag: extract_element(xml, "error-tag").unwrap_or_default(),
            error_severity: extract_element(xml, "error-severity")
                .unwrap_or_else(|| "error".to_string()),
            error_message: extract_element(xml, "error-message").map(|m| unescape_xml(&m)),
            error_path: extract_element(xml, "error-path"),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.error_severity.eq_ignore_ascii_case("warning")
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.error_tag.is_empty() {
            write!(f, "[{}] ", self.error_tag)?;
        }
        write!(
            f,
            "{}",
            self.error_message.as_deref().unwrap_or("Unknown error")
        )?;
        if let Some(ref path) = self.error_path {
            write!(f, " at {}", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// NETCONF Session
// ============================================================================

/// Junos session speaking NETCONF over a [`Connection`]
pub struct NetconfSession<C: Connection> {
    connection: C,
    /// Session ID assigned by the device
    session_id: Option<u32>,
    /// NETCONF capabilities received from device
    capabilities: Vec<String>,
    next_message_id: u32,
    system_information: Option<SystemInformation>,
    closed: bool,
}

impl<C: Connection> NetconfSession<C> {
    /// Exchange hello messages on a fresh connection
    pub async fn establish(mut connection: C) -> Result<Self> {
        let server_hello = connection.receive().await?;
        if !server_hello.contains("<hello") {
            return Err(Error::Connection(ConnectionError::ConnectionFailed(format!(
                "unexpected NETCONF greeting from {}",
                connection.identifier()
            ))));
        }
        connection.send(&build_client_hello()).await?;

        let mut session = Self {
            connection,
            session_id: None,
            capabilities: Vec::new(),
            next_message_id: 1,
            system_information: None,
            closed: false,
        };
        session.parse_server_hello(&server_hello);
        debug!(
            device = %session.connection.identifier(),
            session_id = ?session.session_id,
            capabilities = session.capabilities.len(),
            "NETCONF session established"
        );
        Ok(session)
    }

    /// Parse server hello message
    fn parse_server_hello(&mut self, response: &str) {
        self.session_id =
            extract_element(response, "session-id").and_then(|id| id.trim().parse::<u32>().ok());

        let mut capabilities = Vec::new();
        let mut search_start = 0;
        while let Some(start) = response[search_start..].find("<capability>") {
            let abs_start = search_start + start + "<capability>".len();
            if let Some(end) = response[abs_start..].find("</capability>") {
                capabilities.push(response[abs_start..abs_start + end].trim().to_string());
                search_start = abs_start + end;
            } else {
                break;
            }
        }
        self.capabilities = capabilities;
    }

    /// Send one RPC and wait for its reply
    async fn rpc(&mut self, operation: &str) -> Result<RpcReply> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        let message_id = self.next_message_id;
        self.next_message_id += 1;

        let rpc = format!(
            r#"<rpc xmlns="{}" message-id="{}">{}</rpc>"#,
            NETCONF_NS, message_id, operation
        );
        trace!(device = %self.connection.identifier(), rpc = %rpc, "NETCONF request");
        self.connection.send(&rpc).await?;
        let response = self.connection.receive().await?;
        trace!(device = %self.connection.identifier(), reply = %response, "NETCONF reply");

        let reply = RpcReply::parse(&response);
        for warning in reply.warnings() {
            debug!(device = %self.connection.identifier(), warning = %warning, "NETCONF warning");
        }
        Ok(reply)
    }

    /// Check if a capability is supported
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c.contains(capability))
    }

    /// Get session ID
    pub fn session_id(&self) -> Option<u32> {
        self.session_id
    }
}

#[async_trait]
impl<C: Connection> DeviceSession for NetconfSession<C> {
    async fn command(&mut self, command: &str) -> Result<String> {
        let operation = format!(r#"<command format="text">{}</command>"#, escape_xml(command));
        let reply = self.rpc(&operation).await?.check("command")?;
        Ok(unescape_xml(&reply.data))
    }

    async fn config_set(&mut self, lines: &[String]) -> Result<()> {
        let operation = format!(
            r#"<load-configuration action="set" format="text"><configuration-set>{}</configuration-set></load-configuration>"#,
            escape_xml(&lines.join("\n"))
        );
        self.rpc(&operation).await?.check("load-configuration")?;
        Ok(())
    }

    async fn config_lock(&mut self) -> Result<()> {
        self.rpc("<lock><target><candidate/></target></lock>")
            .await?
            .check("lock")?;
        Ok(())
    }

    async fn config_unlock(&mut self) -> Result<()> {
        self.rpc("<unlock><target><candidate/></target></unlock>")
            .await?
            .check("unlock")?;
        Ok(())
    }

    async fn config_clear(&mut self) -> Result<()> {
        self.rpc("<discard-changes/>")
            .await?
            .check("discard-changes")?;
        Ok(())
    }

    async fn commit_conf(&mut self, options: &CommitOptions) -> Result<Vec<String>> {
        let log = options
            .comment
            .as_ref()
            .map(|comment| format!("<log>{}</log>", escape_xml(comment)))
            .unwrap_or_default();

        let mut warnings = Vec::new();
        if let Some(minutes) = options.confirm_timeout {
            let operation = format!(
                "<commit-configuration><confirmed/><confirm-timeout>{}</confirm-timeout>{}</commit-configuration>",
                minutes, log
            );
            let reply = self.rpc(&operation).await?.check("commit confirmed")?;
            warnings.extend(reply.warnings());

            // A commit check confirms the pending commit
            let reply = self
                .rpc("<commit-configuration><check/></commit-configuration>")
                .await?
                .check("commit check")?;
            warnings.extend(reply.warnings());
        } else {
            let operation = format!("<commit-configuration>{}</commit-configuration>", log);
            let reply = self.rpc(&operation).await?.check("commit")?;
            warnings.extend(reply.warnings());
        }
        Ok(warnings)
    }

    async fn system_information(&mut self) -> Result<SystemInformation> {
        if let Some(ref info) = self.system_information {
            return Ok(info.clone());
        }
        let reply = self
            .rpc("<get-system-information/>")
            .await?
            .check("get-system-information")?;
        let info = SystemInformation {
            hardware_model: extract_element(&reply.data, "hardware-model").unwrap_or_default(),
            os_name: extract_element(&reply.data, "os-name").unwrap_or_default(),
            os_version: extract_element(&reply.data, "os-version").unwrap_or_default(),
            host_name: extract_element(&reply.data, "host-name").unwrap_or_default(),
        };
        self.system_information = Some(info.clone());
        Ok(info)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if let Err(err) = self.rpc("<close-session/>").await {
            warn!(device = %self.connection.identifier(), error = %err, "close-session failed");
        }
        self.closed = true;
        self.connection.close().await?;
        Ok(())
    }
}

// ============================================================================
// Session Factory
// ============================================================================

/// Opens a NETCONF session per operation with the configured transport
#[derive(Debug, Clone)]
pub struct NetconfSessionFactory {
    device: DeviceConfig,
}

impl NetconfSessionFactory {
    pub fn new(device: DeviceConfig) -> Self {
        Self { device }
    }
}

#[async_trait]
impl SessionFactory for NetconfSessionFactory {
    async fn open(&self) -> Result<Box<dyn DeviceSession>> {
        match self.device.transport {
            #[cfg(feature = "ssh")]
            TransportKind::Ssh => {
                let connection =
                    crate::connection::SshConnection::connect(&self.device.ssh_options())?;
                Ok(Box::new(NetconfSession::establish(connection).await?))
            }
            #[cfg(feature = "local")]
            TransportKind::Local => {
                let connection = crate::connection::LocalConnection::spawn(std::time::Duration::from_secs(
                    self.device.read_timeout,
                ))?;
                Ok(Box::new(NetconfSession::establish(connection).await?))
            }
            #[allow(unreachable_patterns)]
            other => Err(Error::Connection(ConnectionError::UnsupportedTransport(
                other.to_string(),
            ))),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Build client hello message
fn build_client_hello() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<hello xmlns="{}">
  <capabilities>
    <capability>urn:ietf:params:netconf:base:1.0</capability>
    <capability>urn:ietf:params:netconf:capability:candidate:1.0</capability>
    <capability>urn:ietf:params:netconf:capability:confirmed-commit:1.0</capability>
    <capability>urn:ietf:params:netconf:capability:validate:1.0</capability>
  </capabilities>
</hello>"#,
        NETCONF_NS
    )
}

/// Extract text content of an XML element
fn extract_element(xml: &str, element: &str) -> Option<String> {
    let start_tag = format!("<{}>", element);
    let end_tag = format!("</{}>", element);

    let start = xml.find(&start_tag)?;
    let content_start = start + start_tag.len();
    let end = xml[content_start..].find(&end_tag)?;
    Some(xml[content_start..content_start + end].trim().to_string())
}

/// Escape special XML characters in text content
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Reverse [`escape_xml`]
fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ============================================================================
// Tests
// ============================================================================
