//! Label template rendering
//!
//! A template is plain label markup (ZPL, EPL, ...) with literal placeholder
//! tokens. Rendering replaces the tokens and strips line endings so the
//! payload goes to the printer as one raw stream.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::bindings::BindingSet;
use crate::encoding::{AnsiEncoder, decode_text};
use crate::error::{PrintError, PrintResult};

/// Label template text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a template file in full
    #[instrument]
    pub fn load(path: &Path) -> PrintResult<Self> {
        let bytes = read_source(path)?;
        debug!(bytes = bytes.len(), "Template loaded");
        Ok(Self::new(decode_text(&bytes)))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Apply bindings in order
    ///
    /// Each step replaces every occurrence of its token in the text produced
    /// by the previous step, so a value containing a later token is replaced
    /// again.
    pub fn substitute(&self, bindings: &BindingSet) -> String {
        bindings
            .iter()
            .fold(self.text.clone(), |text, (name, value)| {
                text.replace(name, value)
            })
    }

    /// Substitute then strip line endings
    pub fn render(&self, bindings: &BindingSet) -> String {
        strip_line_endings(&self.substitute(bindings))
    }
}

/// Remove every `\n` and `\r`
pub fn strip_line_endings(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '\n' | '\r')).collect()
}

/// Load, render and encode a template file into printer bytes
#[instrument(skip(bindings, encoder), fields(bindings = bindings.len()))]
pub fn render_file(
    path: &Path,
    bindings: &BindingSet,
    encoder: &AnsiEncoder,
) -> PrintResult<Vec<u8>> {
    let template = Template::load(path)?;
    let payload = encoder.encode(&template.render(bindings));
    debug!(payload_bytes = payload.len(), "Template rendered");
    Ok(payload)
}

/// Read a whole source file, reporting a missing file as `SourceNotFound`
pub(crate) fn read_source(path: &Path) -> PrintResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PrintError::SourceNotFound(path.to_path_buf()),
        _ => PrintError::Io(e),
    })
}

/// Resolve a template path relative to the working directory for reports
pub(crate) fn display_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
