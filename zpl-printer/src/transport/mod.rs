//! Raw print transport
//!
//! A [`Spooler`] mirrors the Win32 raw printing sequence: open the printer,
//! start a document, start a page, write bytes, then end page, end document
//! and close. [`send_raw`] drives that sequence through scoped guards so every
//! stage that was started is ended again, in reverse order, whether or not
//! the write succeeded.
//!
//! Backends:
//! - [`DeviceSpooler`] - character devices or files (`/dev/usb/lp0`)
//! - `WindowsSpooler` - Windows print spooler (winspool)
//! - `LpSpooler` - CUPS `lp` on other systems

mod device;
#[cfg(not(windows))]
mod lp;
#[cfg(windows)]
mod winspool;

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, instrument, warn};

use crate::error::{PrintError, PrintResult};

pub use device::DeviceSpooler;
#[cfg(not(windows))]
pub use lp::LpSpooler;
#[cfg(windows)]
pub use winspool::WindowsSpooler;

/// Spooler for named print queues on this platform
#[cfg(windows)]
pub type QueueSpooler = WindowsSpooler;
/// Spooler for named print queues on this platform
#[cfg(not(windows))]
pub type QueueSpooler = LpSpooler;

/// Document metadata passed when a job starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocInfo {
    pub name: String,
    /// Spooler data type, `RAW` bypasses driver rendering
    pub data_type: String,
}

impl DocInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: "RAW".to_string(),
        }
    }
}

impl Default for DocInfo {
    fn default() -> Self {
        Self::new("Raw Label")
    }
}

/// Low-level raw print operations
///
/// `end_page`, `end_job` and `close` are cleanup calls. [`send_raw`] only
/// reports their failure when everything before them succeeded.
pub trait Spooler {
    /// Open printer state
    type Handle;

    fn open(&self, destination: &str) -> PrintResult<Self::Handle>;

    fn start_job(&self, handle: &mut Self::Handle, doc: &DocInfo) -> PrintResult<()>;

    fn start_page(&self, handle: &mut Self::Handle) -> PrintResult<()>;

    /// Write bytes, returning how many the spooler accepted
    fn write(&self, handle: &mut Self::Handle, data: &[u8]) -> PrintResult<usize>;

    fn end_page(&self, handle: &mut Self::Handle) -> PrintResult<()>;

    fn end_job(&self, handle: &mut Self::Handle) -> PrintResult<()>;

    fn close(&self, handle: &mut Self::Handle) -> PrintResult<()>;
}

/// Where a label is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Named spooler queue, e.g. `ZDesigner ZT411-600dpi ZPL`
    Queue(String),
    /// Device node or file written directly
    Device(PathBuf),
}

impl Destination {
    /// Interpret a destination identifier
    ///
    /// `file:<path>` and paths under `/dev/` are devices, anything else is a
    /// queue name.
    pub fn parse(identifier: &str) -> Self {
        if let Some(path) = identifier.strip_prefix("file:") {
            return Self::Device(PathBuf::from(path));
        }
        if identifier.starts_with("/dev/") {
            return Self::Device(PathBuf::from(identifier));
        }
        Self::Queue(identifier.to_string())
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queue(name) => write!(f, "{}", name),
            Self::Device(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Send bytes as a single raw job with one page
///
/// Returns the number of bytes written.
#[instrument(skip(spooler, doc, data), fields(doc = %doc.name, data_len = data.len()))]
pub fn send_raw<S: Spooler>(
    spooler: &S,
    destination: &str,
    doc: &DocInfo,
    data: &[u8],
) -> PrintResult<usize> {
    let mut printer = PrinterGuard::open(spooler, destination)?;
    let mut job = printer.start_job(doc)?;
    let mut page = job.start_page()?;

    let written = page.write(data)?;

    page.finish()?;
    job.finish()?;
    printer.close()?;

    if written != data.len() {
        return Err(PrintError::IncompleteWrite {
            written,
            expected: data.len(),
        });
    }

    info!(written, "Print job sent successfully");
    Ok(written)
}

struct PrinterGuard<'a, S: Spooler> {
    spooler: &'a S,
    handle: S::Handle,
    open: bool,
}

impl<'a, S: Spooler> PrinterGuard<'a, S> {
    fn open(spooler: &'a S, destination: &str) -> PrintResult<Self> {
        if destination.trim().is_empty() {
            return Err(PrintError::CannotOpen {
                destination: destination.to_string(),
                reason: "empty printer name".to_string(),
            });
        }

        let handle = spooler.open(destination)?;
        debug!("Printer opened");
        Ok(Self {
            spooler,
            handle,
            open: true,
        })
    }

    fn start_job(&mut self, doc: &DocInfo) -> PrintResult<JobGuard<'_, 'a, S>> {
        self.spooler.start_job(&mut self.handle, doc)?;
        debug!("Job started");
        Ok(JobGuard {
            printer: self,
            active: true,
        })
    }

    fn close(mut self) -> PrintResult<()> {
        self.open = false;
        self.spooler.close(&mut self.handle)
    }
}

impl<S: Spooler> Drop for PrinterGuard<'_, S> {
    fn drop(&mut self) {
        if self.open
            && let Err(e) = self.spooler.close(&mut self.handle)
        {
            warn!(error = %e, "Close printer failed");
        }
    }
}

struct JobGuard<'p, 'a, S: Spooler> {
    printer: &'p mut PrinterGuard<'a, S>,
    active: bool,
}

impl<'p, 'a, S: Spooler> JobGuard<'p, 'a, S> {
    fn start_page(&mut self) -> PrintResult<PageGuard<'_, 'p, 'a, S>> {
        let printer = &mut *self.printer;
        printer.spooler.start_page(&mut printer.handle)?;
        debug!("Page started");
        Ok(PageGuard {
            job: self,
            active: true,
        })
    }

    fn finish(mut self) -> PrintResult<()> {
        self.active = false;
        let printer = &mut *self.printer;
        printer.spooler.end_job(&mut printer.handle)
    }
}

impl<S: Spooler> Drop for JobGuard<'_, '_, S> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let printer = &mut *self.printer;
        if let Err(e) = printer.spooler.end_job(&mut printer.handle) {
            warn!(error = %e, "End job failed");
        }
    }
}

struct PageGuard<'j, 'p, 'a, S: Spooler> {
    job: &'j mut JobGuard<'p, 'a, S>,
    active: bool,
}

impl<S: Spooler> PageGuard<'_, '_, '_, S> {
    fn write(&mut self, data: &[u8]) -> PrintResult<usize> {
        let printer = &mut *self.job.printer;
        printer.spooler.write(&mut printer.handle, data)
    }

    fn finish(mut self) -> PrintResult<()> {
        self.active = false;
        let printer = &mut *self.job.printer;
        printer.spooler.end_page(&mut printer.handle)
    }
}

impl<S: Spooler> Drop for PageGuard<'_, '_, '_, S> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let printer = &mut *self.job.printer;
        if let Err(e) = printer.spooler.end_page(&mut printer.handle) {
            warn!(error = %e, "End page failed");
        }
    }
}

/// List print queues known to the system spooler
pub fn list_queues() -> PrintResult<Vec<String>> {
    QueueSpooler::list()
}
