//! Direct device printing
//!
//! USB and Bluetooth label printers show up as character devices
//! (`/dev/usb/lp0`, `/dev/rfcomm0`) that accept raw bytes. The same path
//! works for plain files, which is handy for capturing payloads.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use super::{DocInfo, Spooler};
use crate::error::{PrintError, PrintResult};

/// Spooler that writes straight to a device node or file
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceSpooler;

/// Open device
#[derive(Debug)]
pub struct DeviceHandle {
    path: PathBuf,
    file: File,
}

impl Spooler for DeviceSpooler {
    type Handle = DeviceHandle;

    fn open(&self, destination: &str) -> PrintResult<DeviceHandle> {
        // Only `file:` targets may be created; a missing device node means the
        // printer is not there.
        let (path, capture) = match destination.strip_prefix("file:") {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(destination), false),
        };
        let file = OpenOptions::new()
            .write(true)
            .create(capture)
            .truncate(capture)
            .open(&path)
            .map_err(|e| PrintError::CannotOpen {
                destination: destination.to_string(),
                reason: e.to_string(),
            })?;

        Ok(DeviceHandle { path, file })
    }

    fn start_job(&self, handle: &mut DeviceHandle, doc: &DocInfo) -> PrintResult<()> {
        debug!(path = %handle.path.display(), doc = %doc.name, "Device job started");
        Ok(())
    }

    fn start_page(&self, _handle: &mut DeviceHandle) -> PrintResult<()> {
        Ok(())
    }

    fn write(&self, handle: &mut DeviceHandle, data: &[u8]) -> PrintResult<usize> {
        handle
            .file
            .write_all(data)
            .map_err(|e| PrintError::Write(format!("{}: {}", handle.path.display(), e)))?;
        Ok(data.len())
    }

    fn end_page(&self, _handle: &mut DeviceHandle) -> PrintResult<()> {
        Ok(())
    }

    fn end_job(&self, handle: &mut DeviceHandle) -> PrintResult<()> {
        handle
            .file
            .flush()
            .map_err(|e| PrintError::Cleanup(format!("{}: {}", handle.path.display(), e)))
    }

    fn close(&self, _handle: &mut DeviceHandle) -> PrintResult<()> {
        // File is closed when the handle drops
        Ok(())
    }
}

impl DeviceSpooler {
    /// Character devices that look like printers
    pub fn list() -> PrintResult<Vec<String>> {
        let mut result = Vec::new();
        for dir in ["/dev/usb", "/dev"] {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with("lp") || name.starts_with("rfcomm") {
                    result.push(format!("{}/{}", dir, name));
                }
            }
        }
        result.sort();
        Ok(result)
    }
}
