//! # zpl-printer
//!
//! Raw label printing from templates.
//!
//! ## Scope
//!
//! - Placeholder substitution in label templates (ZPL or any other markup)
//! - Line ending removal for raw-mode framing
//! - Code page encoding of the payload (Windows-1252 by default)
//! - Raw print jobs through the Windows spooler, CUPS `lp`, or a device node
//!
//! The label markup itself is opaque: nothing here parses or validates it.
//!
//! ## Example
//!
//! ```ignore
//! use zpl_printer::{AnsiEncoder, BindingSet, LabelJob, print_label_to};
//!
//! let bindings = BindingSet::from_csv("Product Key^,NID^", "RT-4230^,00549D7C2^")?;
//! let job = LabelJob::new("testlabel.prn", "ZDesigner ZT411-600dpi ZPL", bindings);
//! let report = print_label_to(&job, &AnsiEncoder::default())?;
//! ```

mod bindings;
mod encoding;
mod error;
mod job;
mod template;
mod transport;

// Re-exports
pub use bindings::{BindingSet, parse_list};
pub use encoding::{AnsiEncoder, DEFAULT_ENCODING, decode_text};
pub use error::{PrintError, PrintResult};
pub use job::{LabelJob, PrintReport, print_label, print_label_to, send_file, send_file_to};
pub use template::{Template, render_file, strip_line_endings};
pub use transport::{
    DeviceSpooler, Destination, DocInfo, QueueSpooler, Spooler, list_queues, send_raw,
};

#[cfg(not(windows))]
pub use transport::LpSpooler;

#[cfg(windows)]
pub use transport::WindowsSpooler;
