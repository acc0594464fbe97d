//! Payload encoding
//!
//! Label printers in raw mode expect single-byte text, usually the Windows
//! ANSI code page. Templates are read as Unicode text and converted back to
//! bytes here, right before they are handed to the spooler.

use encoding_rs::Encoding;
use tracing::{instrument, warn};

use crate::error::{PrintError, PrintResult};

/// Encoding used when none is configured
pub const DEFAULT_ENCODING: &str = "windows-1252";

/// Unicode to code page encoder
#[derive(Debug, Clone, Copy)]
pub struct AnsiEncoder {
    encoding: &'static Encoding,
}

impl AnsiEncoder {
    /// Look up an encoder by WHATWG label (`windows-1252`, `latin1`, `gbk`, ...)
    pub fn for_label(label: &str) -> PrintResult<Self> {
        Encoding::for_label(label.trim().as_bytes())
            .map(|encoding| Self {
                encoding: encoding.output_encoding(),
            })
            .ok_or_else(|| PrintError::UnknownEncoding(label.to_string()))
    }

    /// Canonical name of the selected encoding
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Encode text for the printer
    ///
    /// Characters the code page cannot represent become `?`.
    #[instrument(skip(self, text), fields(encoding = self.name(), bytes = text.len()))]
    pub fn encode(&self, text: &str) -> Vec<u8> {
        let (bytes, _, had_errors) = self.encoding.encode(text);
        if !had_errors {
            return bytes.into_owned();
        }

        // encoding_rs writes HTML numeric references for unmappable chars,
        // which would end up printed on the label.
        let mut result = Vec::with_capacity(text.len());
        let mut replaced = 0usize;
        let mut buf = [0u8; 4];
        for c in text.chars() {
            let (bytes, _, unmappable) = self.encoding.encode(c.encode_utf8(&mut buf));
            if unmappable {
                result.push(b'?');
                replaced += 1;
            } else {
                result.extend_from_slice(&bytes);
            }
        }

        warn!(replaced, "Characters not representable in code page were replaced");
        result
    }
}

impl Default for AnsiEncoder {
    fn default() -> Self {
        Self {
            encoding: encoding_rs::WINDOWS_1252,
        }
    }
}

/// Decode template file bytes into text
///
/// UTF-8 and UTF-16 byte order marks are honoured and stripped, anything
/// else is read as UTF-8 with malformed sequences replaced.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _, _) = encoding_rs::UTF_8.decode(bytes);
    text.into_owned()
}
