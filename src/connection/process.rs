//! Child-process message channel
//!
//! Runs the NETCONF peer as a child process and exchanges
//! `]]>]]>`-delimited messages over its stdin/stdout.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, trace};

use super::{ConnectionError, ConnectionResult, NETCONF_1_0_DELIMITER};

const READ_CHUNK: usize = 8192;

/// Framed channel over a child process's stdio
#[derive(Debug)]
pub struct ProcessChannel {
    identifier: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: ChildStdout,
    buffer: Vec<u8>,
    read_timeout: Duration,
}

impl ProcessChannel {
    /// Spawn the peer process
    pub fn spawn(
        identifier: impl Into<String>,
        mut command: Command,
        read_timeout: Duration,
    ) -> ConnectionResult<Self> {
        let identifier = identifier.into();
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(target_id = %identifier, "Spawning NETCONF peer process");
        let mut child = command.spawn().map_err(|e| {
            ConnectionError::ConnectionFailed(format!("Failed to spawn process: {}", e))
        })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            ConnectionError::ConnectionFailed("Child process has no stdin".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            ConnectionError::ConnectionFailed("Child process has no stdout".to_string())
        })?;

        Ok(Self {
            identifier,
            child,
            stdin: Some(stdin),
            stdout,
            buffer: Vec::new(),
            read_timeout,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Write one message followed by the delimiter
    pub async fn write_message(&mut self, message: &str) -> ConnectionResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or(ConnectionError::ConnectionClosed(None))?;
        trace!(target_id = %self.identifier, bytes = message.len(), "Sending message");
        stdin.write_all(message.as_bytes()).await?;
        stdin.write_all(NETCONF_1_0_DELIMITER.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read until the next delimiter
    pub async fn read_message(&mut self) -> ConnectionResult<String> {
        loop {
            if let Some(message) = take_frame(&mut self.buffer) {
                trace!(target_id = %self.identifier, bytes = message.len(), "Received message");
                return Ok(message);
            }

            let mut chunk = [0u8; READ_CHUNK];
            let read = tokio::time::timeout(self.read_timeout, self.stdout.read(&mut chunk))
                .await
                .map_err(|_| ConnectionError::Timeout(self.read_timeout.as_secs()))??;
            if read == 0 {
                let stderr = self.collect_stderr().await;
                return Err(ConnectionError::ConnectionClosed(stderr));
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    /// Close stdin and wait for the process to exit, killing it if it lingers
    pub async fn shutdown(&mut self) -> ConnectionResult<()> {
        drop(self.stdin.take());
        match tokio::time::timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(target_id = %self.identifier, status = %status, "Peer process exited");
            }
            Err(_) => {
                debug!(target_id = %self.identifier, "Peer process did not exit, killing it");
                self.child.kill().await?;
            }
        }
        Ok(())
    }

    async fn collect_stderr(&mut self) -> Option<String> {
        let mut stderr = self.child.stderr.take()?;
        let mut output = String::new();
        let read = tokio::time::timeout(
            Duration::from_secs(1),
            stderr.read_to_string(&mut output),
        )
        .await;
        match read {
            Ok(Ok(_)) if !output.trim().is_empty() => Some(output.trim().to_string()),
            _ => None,
        }
    }
}

/// Remove and return the first complete frame from the buffer
fn take_frame(buffer: &mut Vec<u8>) -> Option<String> {
    let delimiter = NETCONF_1_0_DELIMITER.as_bytes();
    let position = buffer
        .windows(delimiter.len())
        .position(|window| window == delimiter)?;
    let frame: Vec<u8> = buffer.drain(..position + delimiter.len()).collect();
    Some(String::from_utf8_lossy(&frame[..position]).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_frame_splits_messages() {
        let mut buffer = b"<hello/>]]>]]><rpc-reply/>]]>]]><partial".to_vec();
        assert_eq!(take_frame(&mut buffer).as_deref(), Some("<hello/>"));
        assert_eq!(take_frame(&mut buffer).as_deref(), Some("<rpc-reply/>"));
        assert_eq!(take_frame(&mut buffer), None);
        assert_eq!(buffer, b"<partial".to_vec());
    }

    #[tokio::test]
    async fn test_process_channel_round_trip() {
        // `cat` echoes every framed message back
        let channel = ProcessChannel::spawn("cat", Command::new("cat"), Duration::from_secs(5));
        let mut channel = match channel {
            Ok(channel) => channel,
            Err(_) => return,
        };

        channel.write_message("<rpc>one</rpc>").await.unwrap();
        channel.write_message("<rpc>two</rpc>").await.unwrap();
        assert_eq!(channel.read_message().await.unwrap(), "<rpc>one</rpc>");
        assert_eq!(channel.read_message().await.unwrap(), "<rpc>two</rpc>");
        channel.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_process_channel_reports_closed_peer() {
        let mut command = Command::new("sh");
        command.arg("-c").arg("echo 'no netconf here' >&2");
        let mut channel = match ProcessChannel::spawn("sh", command, Duration::from_secs(5)) {
            Ok(channel) => channel,
            Err(_) => return,
        };

        let err = channel.read_message().await.unwrap_err();
        match err {
            ConnectionError::ConnectionClosed(stderr) => {
                assert_eq!(stderr.as_deref(), Some("no netconf here"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
