//! CUPS printing through the `lp` command
//!
//! `lp -o raw` hands the bytes to the queue without filtering, the CUPS
//! equivalent of a `RAW` winspool document. Each job is an `lp` process fed
//! through stdin.

use std::io::Write;
use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

use super::{DocInfo, Spooler};
use crate::error::{PrintError, PrintResult};

/// CUPS queue spooler
#[derive(Debug, Clone)]
pub struct LpSpooler {
    lp: String,
    lpstat: String,
}

impl Default for LpSpooler {
    fn default() -> Self {
        Self {
            lp: "lp".to_string(),
            lpstat: "lpstat".to_string(),
        }
    }
}

/// Open queue and its running `lp` process, if a job was started
#[derive(Debug)]
pub struct LpHandle {
    queue: String,
    child: Option<Child>,
}

impl LpSpooler {
    /// Use other `lp` / `lpstat` executables
    pub fn with_programs(lp: impl Into<String>, lpstat: impl Into<String>) -> Self {
        Self {
            lp: lp.into(),
            lpstat: lpstat.into(),
        }
    }

    /// List queue names (`lpstat -e`)
    pub fn list() -> PrintResult<Vec<String>> {
        Self::default().queues()
    }

    fn queues(&self) -> PrintResult<Vec<String>> {
        let output = Command::new(&self.lpstat).arg("-e").output()?;
        if !output.status.success() {
            return Err(PrintError::InvalidConfig(format!(
                "{} -e exited with {}",
                self.lpstat, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

impl Spooler for LpSpooler {
    type Handle = LpHandle;

    fn open(&self, destination: &str) -> PrintResult<LpHandle> {
        let cannot_open = |reason: String| PrintError::CannotOpen {
            destination: destination.to_string(),
            reason,
        };

        let status = Command::new(&self.lpstat)
            .args(["-p", destination])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| cannot_open(format!("{}: {}", self.lpstat, e)))?;

        if !status.success() {
            return Err(cannot_open("no such queue".to_string()));
        }

        Ok(LpHandle {
            queue: destination.to_string(),
            child: None,
        })
    }

    fn start_job(&self, handle: &mut LpHandle, doc: &DocInfo) -> PrintResult<()> {
        let mut cmd = Command::new(&self.lp);
        cmd.args(["-d", handle.queue.as_str(), "-t", doc.name.as_str()]);
        if doc.data_type.eq_ignore_ascii_case("RAW") {
            cmd.args(["-o", "raw"]);
        }

        let child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PrintError::StartJob(format!("{}: {}", self.lp, e)))?;

        debug!(pid = child.id(), "lp started");
        handle.child = Some(child);
        Ok(())
    }

    fn start_page(&self, _handle: &mut LpHandle) -> PrintResult<()> {
        Ok(())
    }

    fn write(&self, handle: &mut LpHandle, data: &[u8]) -> PrintResult<usize> {
        let stdin = handle
            .child
            .as_mut()
            .and_then(|c| c.stdin.as_mut())
            .ok_or_else(|| PrintError::Write("no job started".to_string()))?;

        stdin
            .write_all(data)
            .map_err(|e| PrintError::Write(e.to_string()))?;
        Ok(data.len())
    }

    fn end_page(&self, _handle: &mut LpHandle) -> PrintResult<()> {
        Ok(())
    }

    fn end_job(&self, handle: &mut LpHandle) -> PrintResult<()> {
        let Some(mut child) = handle.child.take() else {
            return Ok(());
        };

        // Closing stdin submits the job
        drop(child.stdin.take());
        let output = child
            .wait_with_output()
            .map_err(|e| PrintError::Cleanup(format!("{}: {}", self.lp, e)))?;

        if !output.status.success() {
            return Err(PrintError::Cleanup(format!(
                "{} exited with {}: {}",
                self.lp,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        info!(
            queue = %handle.queue,
            response = %String::from_utf8_lossy(&output.stdout).trim(),
            "Job queued"
        );
        Ok(())
    }

    fn close(&self, handle: &mut LpHandle) -> PrintResult<()> {
        // Job never ended, cancel it
        if let Some(mut child) = handle.child.take() {
            warn!(queue = %handle.queue, "Cancelling unfinished lp job");
            let _ = child.kill();
            child
                .wait()
                .map_err(|e| PrintError::Cleanup(format!("{}: {}", self.lp, e)))?;
        }
        Ok(())
    }
}
