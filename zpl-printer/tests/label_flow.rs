use std::cell::RefCell;
use std::path::Path;

use zpl_printer::{
    AnsiEncoder, BindingSet, DocInfo, LabelJob, PrintError, PrintResult, Spooler, print_label,
    print_label_to, send_file,
};

/// Spooler that keeps every call and the written bytes in memory
#[derive(Default)]
struct RecordingSpooler {
    calls: RefCell<Vec<String>>,
    written: RefCell<Vec<u8>>,
}

impl Spooler for RecordingSpooler {
    type Handle = String;

    fn open(&self, destination: &str) -> PrintResult<String> {
        self.calls.borrow_mut().push(format!("open:{}", destination));
        Ok(destination.to_string())
    }

    fn start_job(&self, _: &mut String, doc: &DocInfo) -> PrintResult<()> {
        self.calls
            .borrow_mut()
            .push(format!("start_job:{}:{}", doc.name, doc.data_type));
        Ok(())
    }

    fn start_page(&self, _: &mut String) -> PrintResult<()> {
        self.calls.borrow_mut().push("start_page".to_string());
        Ok(())
    }

    fn write(&self, _: &mut String, data: &[u8]) -> PrintResult<usize> {
        self.calls.borrow_mut().push("write".to_string());
        self.written.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn end_page(&self, _: &mut String) -> PrintResult<()> {
        self.calls.borrow_mut().push("end_page".to_string());
        Ok(())
    }

    fn end_job(&self, _: &mut String) -> PrintResult<()> {
        self.calls.borrow_mut().push("end_job".to_string());
        Ok(())
    }

    fn close(&self, _: &mut String) -> PrintResult<()> {
        self.calls.borrow_mut().push("close".to_string());
        Ok(())
    }
}

fn write_template(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("testlabel.prn");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_product_label_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(
        dir.path(),
        "^XA\r\n^FO50,50^A0N,40^FDProduct Key^FS\r\n^FO50,100^BCN,80^FDBarcode^FS\r\n^XZ\r\n",
    );

    let bindings = BindingSet::from_csv("Product Key,Barcode", "RT-4230,0549D7C27E").unwrap();
    let job = LabelJob::new(&template, "ZDesigner ZT411-600dpi ZPL", bindings)
        .with_doc_name("Product label");
    let spooler = RecordingSpooler::default();

    let report = print_label(&spooler, &job, &AnsiEncoder::default()).unwrap();

    let expected = "^XA^FO50,50^A0N,40^FDRT-4230^FS^FO50,100^BCN,80^FD0549D7C27E^FS^XZ";
    assert_eq!(spooler.written.borrow().as_slice(), expected.as_bytes());
    assert_eq!(report.payload_bytes, expected.len());
    assert_eq!(report.bytes_written, expected.len());
    assert_eq!(report.encoding, "windows-1252");
    assert_eq!(report.destination, "ZDesigner ZT411-600dpi ZPL");
    assert_eq!(
        spooler.calls.borrow().as_slice(),
        [
            "open:ZDesigner ZT411-600dpi ZPL",
            "start_job:Product label:RAW",
            "start_page",
            "write",
            "end_page",
            "end_job",
            "close",
        ]
    );
}

#[test]
fn test_caret_delimited_placeholders() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path(), "^XAProduct Key^FS...^XZ\n");

    let bindings = BindingSet::from_csv("Product Key^", "RT-4230^").unwrap();
    let job = LabelJob::new(&template, "ZT411", bindings);
    let spooler = RecordingSpooler::default();

    print_label(&spooler, &job, &AnsiEncoder::default()).unwrap();

    assert_eq!(spooler.written.borrow().as_slice(), b"^XART-4230^FS...^XZ");
}

#[test]
fn test_missing_template_never_opens_printer() {
    let dir = tempfile::tempdir().unwrap();
    let job = LabelJob::new(dir.path().join("missing.prn"), "ZT411", BindingSet::default());
    let spooler = RecordingSpooler::default();

    let err = print_label(&spooler, &job, &AnsiEncoder::default()).unwrap_err();

    assert!(matches!(err, PrintError::SourceNotFound(_)));
    assert!(spooler.calls.borrow().is_empty());
}

#[test]
fn test_non_ascii_values_use_code_page() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path(), "^XA^FDName^FS^XZ");

    let bindings = BindingSet::from_csv("Name", "Müller").unwrap();
    let job = LabelJob::new(&template, "ZT411", bindings);
    let spooler = RecordingSpooler::default();

    print_label(&spooler, &job, &AnsiEncoder::default()).unwrap();

    assert_eq!(spooler.written.borrow().as_slice(), b"^XA^FDM\xFCller^FS^XZ");
}

#[test]
fn test_send_file_is_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path(), "^XA\r\nProduct Key\r\n^XZ");
    let spooler = RecordingSpooler::default();

    let written = send_file(&spooler, "ZT411", &template, &DocInfo::default()).unwrap();

    assert_eq!(written, 21);
    assert_eq!(
        spooler.written.borrow().as_slice(),
        b"^XA\r\nProduct Key\r\n^XZ"
    );
}

#[test]
fn test_send_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let spooler = RecordingSpooler::default();

    let err = send_file(
        &spooler,
        "ZT411",
        &dir.path().join("missing.prn"),
        &DocInfo::default(),
    )
    .unwrap_err();

    assert!(matches!(err, PrintError::SourceNotFound(_)));
    assert!(spooler.calls.borrow().is_empty());
}

#[test]
fn test_print_to_device_file() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path(), "^XA\n^FDNID^^FS\n^XZ");
    let out = dir.path().join("lp0");

    let bindings = BindingSet::from_csv("NID^", "00549D7C2^").unwrap();
    let job = LabelJob::new(&template, format!("file:{}", out.display()), bindings);

    let report = print_label_to(&job, &AnsiEncoder::default()).unwrap();

    assert_eq!(std::fs::read(&out).unwrap(), b"^XA^FD00549D7C2^^FS^XZ");
    assert_eq!(report.destination, format!("file:{}", out.display()));
}

#[test]
fn test_report_serializes() {
    let dir = tempfile::tempdir().unwrap();
    let template = write_template(dir.path(), "^XA^XZ");
    let job = LabelJob::new(&template, "ZT411", BindingSet::default());
    let spooler = RecordingSpooler::default();

    let report = print_label(&spooler, &job, &AnsiEncoder::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["destination"], "ZT411");
    assert_eq!(json["payload_bytes"], 6);
    assert_eq!(json["bytes_written"], 6);
}
