//! Disc identity through the external `cd-discid` program

use super::drive::{DiscIdentity, DiscReadError, DiscReader, LegacyToc, ReleaseToc};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

const CD_DISCID: &str = "cd-discid";

/// Runs `cd-discid` twice: once for the CDDB TOC, once with `--musicbrainz`
#[derive(Debug, Clone)]
pub struct CdDiscIdReader {
    program: String,
    device: String,
}

impl CdDiscIdReader {
    pub fn new(device: impl Into<String>) -> Self {
        Self::with_program(CD_DISCID, device)
    }

    pub fn with_program(program: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            device: device.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, DiscReadError> {
        debug!("Running {} {:?} {}", self.program, args, self.device);

        let output = Command::new(&self.program)
            .args(args)
            .arg(&self.device)
            .output()
            .await
            .map_err(|e| DiscReadError::Command {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(DiscReadError::Command {
                program: self.program.clone(),
                message: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl DiscReader for CdDiscIdReader {
    async fn read_identity(&self) -> Result<DiscIdentity, DiscReadError> {
        info!("💿 Reading TOC from {} with {}", self.device, self.program);

        let legacy_toc = LegacyToc::parse(&self.run(&[]).await?)?;
        debug!("GNU TOC: {}", legacy_toc);

        let release_toc = ReleaseToc::from_cd_discid(&self.run(&["--musicbrainz"]).await?)?;
        debug!("MusicBrainz TOC: {}", release_toc);

        Ok(DiscIdentity {
            legacy_toc,
            release_toc,
        })
    }
}
