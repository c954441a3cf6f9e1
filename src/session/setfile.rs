//! Fake operations writing to a set file
//!
//! Instead of touching the device, a fake operation appends its lines to a
//! local file that an operator can load later with `load set`.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Error, Result};

/// Default permission of a created set file
pub const DEFAULT_FILE_PERMISSION: u32 = 0o644;

/// Append-only file of configuration lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetFile {
    path: PathBuf,
    permission: u32,
}

impl SetFile {
    pub fn new(path: impl Into<PathBuf>, permission: u32) -> Self {
        Self {
            path: path.into(),
            permission,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn permission(&self) -> u32 {
        self.permission
    }

    /// Append `lines`, one per line, creating the file if needed
    pub async fn append(&self, lines: &[String]) -> Result<()> {
        let mut options = tokio::fs::OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(self.permission);

        let mut file = options.open(&self.path).await?;
        let mut content = lines.join("\n");
        content.push('\n');
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let current = file.metadata().await?.permissions().mode() & 0o7777;
            if current != self.permission {
                tokio::fs::set_permissions(
                    &self.path,
                    std::fs::Permissions::from_mode(self.permission),
                )
                .await?;
            }
        }

        debug!(path = %self.path.display(), lines = lines.len(), "Appended lines to set file");
        Ok(())
    }
}

/// Parse an octal permission such as `0644` or `644`
pub fn parse_permission(value: &str) -> Result<u32> {
    let value = value.trim();
    let digits = value
        .strip_prefix("0o")
        .or_else(|| value.strip_prefix('0').filter(|rest| !rest.is_empty()))
        .unwrap_or(value);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| Error::Config(format!("file permission '{}' is not octal", value)))?;
    if digits.len() > 4 || mode > 0o7777 {
        return Err(Error::Config(format!(
            "file permission '{}' is out of range",
            value
        )));
    }
    Ok(mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_permission() {
        assert_eq!(parse_permission("0644").unwrap(), 0o644);
        assert_eq!(parse_permission("600").unwrap(), 0o600);
        assert_eq!(parse_permission("0o755").unwrap(), 0o755);
        assert!(parse_permission("0999").is_err());
        assert!(parse_permission("rw-r--r--").is_err());
        assert!(parse_permission("17777").is_err());
    }

    #[tokio::test]
    async fn test_append_creates_and_extends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.set");
        let file = SetFile::new(&path, 0o600);

        file.append(&["set routing-options router-id 192.0.2.1".to_string()])
            .await
            .unwrap();
        file.append(&[
            "delete routing-options nonstop-routing".to_string(),
            "set routing-options nonstop-routing".to_string(),
        ])
        .await
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "set routing-options router-id 192.0.2.1\n\
             delete routing-options nonstop-routing\n\
             set routing-options nonstop-routing\n"
        );

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(mode, 0o600);
        }
    }
}
