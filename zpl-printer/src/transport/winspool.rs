//! Windows print spooler
//!
//! Uses the winspool API with a `RAW` document so the driver forwards the
//! label markup to the printer untouched.

use core::ffi::c_void;

use tracing::debug;
use windows::Win32::Foundation::GetLastError;
use windows::Win32::Graphics::Printing::{
    ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumPrintersW, OpenPrinterW,
    PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_HANDLE, PRINTER_INFO_5W,
    StartDocPrinterW, StartPagePrinter, WritePrinter,
};
use windows::core::{PCWSTR, PWSTR};

use super::{DocInfo, Spooler};
use crate::error::{PrintError, PrintResult};

/// Winspool spooler
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsSpooler;

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn last_error(call: &str) -> String {
    let code = unsafe { GetLastError().0 };
    format!("{} failed (error {})", call, code)
}

/// Ports that never reach a physical printer
fn is_virtual_port(port: &str) -> bool {
    let port = port.to_ascii_lowercase();
    matches!(port.as_str(), "file:" | "portprompt:" | "xpsport:" | "nul:")
        || port.starts_with("onenote")
        || port.starts_with("wfsport:")
}

/// Copy a wide string out of a spooler buffer
///
/// # Safety
///
/// `p` must be null or point at a NUL-terminated UTF-16 string.
unsafe fn read_wide(p: PWSTR) -> Option<String> {
    if p.is_null() {
        return None;
    }
    unsafe { p.to_string() }.ok()
}

impl WindowsSpooler {
    /// Installed queues with a physical port
    pub fn list() -> PrintResult<Vec<String>> {
        let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
        let mut needed: u32 = 0;
        let mut returned: u32 = 0;

        // Sizing call, fails with ERROR_INSUFFICIENT_BUFFER when queues exist
        let sized = unsafe { EnumPrintersW(flags, None, 5, None, &mut needed, &mut returned) };
        if needed == 0 {
            return match sized {
                Ok(()) => Ok(Vec::new()),
                Err(_) => Err(PrintError::InvalidConfig(last_error("EnumPrintersW"))),
            };
        }

        // u64 backing keeps the PRINTER_INFO_5W records aligned
        let mut buf = vec![0u64; (needed as usize).div_ceil(8)];
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr().cast::<u8>(), needed as usize)
        };
        unsafe { EnumPrintersW(flags, None, 5, Some(bytes), &mut needed, &mut returned) }
            .map_err(|_| PrintError::InvalidConfig(last_error("EnumPrintersW")))?;

        let infos = unsafe {
            std::slice::from_raw_parts(buf.as_ptr().cast::<PRINTER_INFO_5W>(), returned as usize)
        };
        let queues = infos
            .iter()
            .filter_map(|info| {
                let name = unsafe { read_wide(info.pPrinterName) }?;
                let port = unsafe { read_wide(info.pPortName) }.unwrap_or_default();
                if is_virtual_port(&port) {
                    debug!(queue = %name, port = %port, "Skipping virtual printer");
                    return None;
                }
                Some(name)
            })
            .collect();

        Ok(queues)
    }
}

impl Spooler for WindowsSpooler {
    type Handle = PRINTER_HANDLE;

    fn open(&self, destination: &str) -> PrintResult<PRINTER_HANDLE> {
        let mut handle = PRINTER_HANDLE::default();
        let name_w = to_wide(destination);

        unsafe { OpenPrinterW(PCWSTR::from_raw(name_w.as_ptr()), &mut handle, None) }.map_err(
            |_| PrintError::CannotOpen {
                destination: destination.to_string(),
                reason: last_error("OpenPrinterW"),
            },
        )?;

        Ok(handle)
    }

    fn start_job(&self, handle: &mut PRINTER_HANDLE, doc: &DocInfo) -> PrintResult<()> {
        let doc_name_w = to_wide(&doc.name);
        let datatype_w = to_wide(&doc.data_type);
        let doc_info = DOC_INFO_1W {
            pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
            pOutputFile: PWSTR::null(),
            pDatatype: PWSTR(datatype_w.as_ptr() as *mut _),
        };

        let job_id = unsafe { StartDocPrinterW(*handle, 1, &doc_info as *const DOC_INFO_1W) };
        if job_id == 0 {
            return Err(PrintError::StartJob(last_error("StartDocPrinterW")));
        }

        debug!(job_id, "Spooler job started");
        Ok(())
    }

    fn start_page(&self, handle: &mut PRINTER_HANDLE) -> PrintResult<()> {
        if !unsafe { StartPagePrinter(*handle) }.as_bool() {
            return Err(PrintError::StartPage(last_error("StartPagePrinter")));
        }
        Ok(())
    }

    fn write(&self, handle: &mut PRINTER_HANDLE, data: &[u8]) -> PrintResult<usize> {
        let len = u32::try_from(data.len())
            .map_err(|_| PrintError::Write(format!("payload too large: {} bytes", data.len())))?;

        let mut written: u32 = 0;
        let ok = unsafe {
            WritePrinter(
                *handle,
                data.as_ptr() as *const c_void,
                len,
                &mut written,
            )
        };

        if !ok.as_bool() {
            return Err(PrintError::Write(last_error("WritePrinter")));
        }

        Ok(written as usize)
    }

    fn end_page(&self, handle: &mut PRINTER_HANDLE) -> PrintResult<()> {
        if !unsafe { EndPagePrinter(*handle) }.as_bool() {
            return Err(PrintError::Cleanup(last_error("EndPagePrinter")));
        }
        Ok(())
    }

    fn end_job(&self, handle: &mut PRINTER_HANDLE) -> PrintResult<()> {
        if !unsafe { EndDocPrinter(*handle) }.as_bool() {
            return Err(PrintError::Cleanup(last_error("EndDocPrinter")));
        }
        Ok(())
    }

    fn close(&self, handle: &mut PRINTER_HANDLE) -> PrintResult<()> {
        unsafe { ClosePrinter(*handle) }
            .map_err(|_| PrintError::Cleanup(last_error("ClosePrinter")))
    }
}
