//! One-shot label print job
//!
//! Render the template, then hand the payload to a spooler. Rendering
//! failures abort before the printer is touched.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::bindings::BindingSet;
use crate::encoding::AnsiEncoder;
use crate::error::PrintResult;
use crate::template::{display_path, read_source, render_file};
use crate::transport::{DeviceSpooler, Destination, DocInfo, QueueSpooler, Spooler, send_raw};

/// Everything needed to print one label
#[derive(Debug, Clone)]
pub struct LabelJob {
    pub template: PathBuf,
    pub destination: String,
    pub bindings: BindingSet,
    pub doc: DocInfo,
}

impl LabelJob {
    pub fn new(
        template: impl Into<PathBuf>,
        destination: impl Into<String>,
        bindings: BindingSet,
    ) -> Self {
        Self {
            template: template.into(),
            destination: destination.into(),
            bindings,
            doc: DocInfo::default(),
        }
    }

    /// Set the spooler document name
    pub fn with_doc_name(mut self, name: impl Into<String>) -> Self {
        self.doc.name = name.into();
        self
    }

    /// Render the payload without printing
    pub fn render(&self, encoder: &AnsiEncoder) -> PrintResult<Vec<u8>> {
        render_file(&self.template, &self.bindings, encoder)
    }
}

/// Outcome of a successful print
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintReport {
    pub template: PathBuf,
    pub destination: String,
    pub encoding: String,
    pub payload_bytes: usize,
    pub bytes_written: usize,
}

/// Render a job and send it through `spooler`
#[instrument(skip(spooler, job, encoder), fields(template = %job.template.display(), destination = %job.destination))]
pub fn print_label<S: Spooler>(
    spooler: &S,
    job: &LabelJob,
    encoder: &AnsiEncoder,
) -> PrintResult<PrintReport> {
    let payload = job.render(encoder)?;
    let bytes_written = send_raw(spooler, &job.destination, &job.doc, &payload)?;

    Ok(PrintReport {
        template: display_path(&job.template),
        destination: job.destination.clone(),
        encoding: encoder.name().to_string(),
        payload_bytes: payload.len(),
        bytes_written,
    })
}

/// Print a job on the queue or device its destination names
pub fn print_label_to(job: &LabelJob, encoder: &AnsiEncoder) -> PrintResult<PrintReport> {
    match Destination::parse(&job.destination) {
        Destination::Queue(_) => print_label(&QueueSpooler::default(), job, encoder),
        Destination::Device(_) => print_label(&DeviceSpooler, job, encoder),
    }
}

/// Send a prepared file to a printer as-is
///
/// No substitution or line ending removal is applied.
#[instrument(skip(spooler, doc))]
pub fn send_file<S: Spooler>(
    spooler: &S,
    destination: &str,
    path: &Path,
    doc: &DocInfo,
) -> PrintResult<usize> {
    let bytes = read_source(path)?;

    info!(bytes = bytes.len(), "Sending file");
    send_raw(spooler, destination, doc, &bytes)
}

/// Send a prepared file to the queue or device `destination` names
pub fn send_file_to(destination: &str, path: &Path, doc: &DocInfo) -> PrintResult<usize> {
    match Destination::parse(destination) {
        Destination::Queue(_) => send_file(&QueueSpooler::default(), destination, path, doc),
        Destination::Device(_) => send_file(&DeviceSpooler, destination, path, doc),
    }
}
