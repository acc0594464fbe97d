//! zpl-print
//!
//! Fill a label template and send it to a printer as a raw job:
//!
//! ```text
//! zpl-print testlabel.prn "ZDesigner ZT411-600dpi ZPL" "Product Key^,NID^" "RT-4230^,00549D7C2^"
//! ```

mod config;
mod logger;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use config::Config;
use tracing::{error, info, warn};
use zpl_printer::{
    AnsiEncoder, BindingSet, DeviceSpooler, DocInfo, LabelJob, PrintError, list_queues,
    print_label_to, send_file_to,
};

const EXIT_FAILURE: u8 = 1;
const EXIT_BINDINGS: u8 = 3;
const EXIT_SOURCE_NOT_FOUND: u8 = 4;
const EXIT_CANNOT_OPEN: u8 = 5;
const EXIT_TRANSPORT: u8 = 6;
const EXIT_CONFIG: u8 = 7;

/// Fill a label template and print it as a raw job
#[derive(Debug, Parser)]
#[command(name = "zpl-print", version, about, long_about = None)]
struct Cli {
    /// Label template file (.prn, .zpl)
    #[arg(required_unless_present = "list_printers")]
    template: Option<PathBuf>,

    /// Printer queue name, or file:<path> or /dev/... to write a device directly
    #[arg(required_unless_present = "list_printers")]
    destination: Option<String>,

    /// Placeholder names, comma separated
    #[arg(required_unless_present_any = ["list_printers", "raw"])]
    names: Option<String>,

    /// Replacement values, comma separated, same order as the names
    #[arg(required_unless_present_any = ["list_printers", "raw"])]
    values: Option<String>,

    /// Payload code page [env: ZPL_ENCODING, default: windows-1252]
    #[arg(long)]
    encoding: Option<String>,

    /// Document name in the print queue [env: ZPL_DOC_NAME]
    #[arg(long)]
    doc_name: Option<String>,

    /// Write the rendered payload to stdout instead of printing
    #[arg(long, conflicts_with = "raw")]
    dry_run: bool,

    /// Send the template file as-is, without substitution
    #[arg(long)]
    raw: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// List printers and exit
    #[arg(long)]
    list_printers: bool,

    /// Log level [env: LOG_LEVEL, default: info]
    #[arg(long)]
    log_level: Option<String>,

    /// Also write logs to daily files in this directory [env: LOG_DIR]
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> Config {
        Config::from_env().with_overrides(
            self.encoding.as_deref(),
            self.doc_name.as_deref(),
            self.log_level.as_deref(),
            self.log_dir.clone(),
        )
    }

    /// Machine-readable output only, no service banner
    fn quiet(&self) -> bool {
        self.dry_run || self.json
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = cli.config();

    let _guard = match logger::init_logger(&config.log_level, config.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    if cli.list_printers {
        return match list_printers() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = %format!("{:#}", e), "Listing printers failed");
                ExitCode::from(exit_code(&e))
            }
        };
    }

    if !cli.quiet() {
        println!("\nStarting Print Service");
    }

    let code = match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "Print failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    };

    if !cli.quiet() {
        println!("\nPrint Service End");
    }

    code
}

fn run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let template = cli.template.as_deref().context("Missing template path")?;
    let destination = cli.destination.as_deref().context("Missing destination")?;
    let doc = DocInfo::new(&config.doc_name);

    if cli.raw {
        let written = send_file_to(destination, template, &doc)?;
        return report_raw(cli, template, destination, written);
    }

    let encoder = AnsiEncoder::for_label(&config.encoding)?;
    let bindings = BindingSet::from_csv(
        cli.names.as_deref().unwrap_or_default(),
        cli.values.as_deref().unwrap_or_default(),
    )?;
    info!(
        template = %template.display(),
        destination,
        bindings = bindings.len(),
        encoding = encoder.name(),
        "Rendering label"
    );

    let job = LabelJob::new(template, destination, bindings).with_doc_name(&config.doc_name);

    if cli.dry_run {
        let payload = job.render(&encoder)?;
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(&payload)
            .and_then(|()| stdout.flush())
            .context("Failed to write payload to stdout")?;
        return Ok(());
    }

    let report = print_label_to(&job, &encoder)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Sent {} bytes to {}",
            report.bytes_written, report.destination
        );
    }
    Ok(())
}

fn report_raw(cli: &Cli, template: &Path, destination: &str, written: usize) -> anyhow::Result<()> {
    if cli.json {
        let report = serde_json::json!({
            "template": template.display().to_string(),
            "destination": destination,
            "bytes_written": written,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sent {} bytes to {}", written, destination);
    }
    Ok(())
}

fn list_printers() -> anyhow::Result<()> {
    match list_queues() {
        Ok(queues) => {
            for queue in queues {
                println!("{}", queue);
            }
        }
        Err(e) => warn!(error = %e, "Could not list print queues"),
    }

    for device in DeviceSpooler::list().context("Failed to list devices")? {
        println!("{}", device);
    }
    Ok(())
}

/// Map an error to the process exit code
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PrintError>() {
        Some(e) if e.is_binding() => EXIT_BINDINGS,
        Some(PrintError::SourceNotFound(_)) => EXIT_SOURCE_NOT_FOUND,
        Some(PrintError::CannotOpen { .. }) => EXIT_CANNOT_OPEN,
        Some(e) if e.is_transport() => EXIT_TRANSPORT,
        Some(PrintError::UnknownEncoding(_) | PrintError::InvalidConfig(_)) => EXIT_CONFIG,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("zpl-print").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_positional_arguments() {
        let cli = parse(&[
            "testlabel.prn",
            "ZDesigner ZT411-600dpi ZPL",
            "Product Key^,Barcode^",
            "RT-4230^,0549D7C27E^",
        ])
        .unwrap();

        assert_eq!(cli.template, Some(PathBuf::from("testlabel.prn")));
        assert_eq!(cli.destination.as_deref(), Some("ZDesigner ZT411-600dpi ZPL"));
        assert_eq!(cli.names.as_deref(), Some("Product Key^,Barcode^"));
        assert_eq!(cli.values.as_deref(), Some("RT-4230^,0549D7C27E^"));
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_missing_values_is_usage_error() {
        assert!(parse(&["testlabel.prn", "ZT411", "A^"]).is_err());
    }

    #[test]
    fn test_list_printers_needs_no_positionals() {
        let cli = parse(&["--list-printers"]).unwrap();
        assert!(cli.list_printers);
        assert!(cli.template.is_none());
    }

    #[test]
    fn test_raw_needs_no_bindings() {
        let cli = parse(&["--raw", "label.zpl", "/dev/usb/lp0"]).unwrap();
        assert!(cli.raw);
        assert!(cli.names.is_none());
    }

    #[test]
    fn test_dry_run_conflicts_with_raw() {
        assert!(parse(&["--raw", "--dry-run", "label.zpl", "ZT411"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let code = |e: PrintError| exit_code(&anyhow::Error::from(e));

        assert_eq!(
            code(PrintError::BindingLengthMismatch {
                names: 2,
                values: 1
            }),
            EXIT_BINDINGS
        );
        assert_eq!(code(PrintError::EmptyPlaceholder(0)), EXIT_BINDINGS);
        assert_eq!(
            code(PrintError::SourceNotFound(PathBuf::from("a.prn"))),
            EXIT_SOURCE_NOT_FOUND
        );
        assert_eq!(
            code(PrintError::CannotOpen {
                destination: "ZT411".to_string(),
                reason: "offline".to_string()
            }),
            EXIT_CANNOT_OPEN
        );
        assert_eq!(code(PrintError::Write("x".to_string())), EXIT_TRANSPORT);
        assert_eq!(code(PrintError::StartJob("x".to_string())), EXIT_TRANSPORT);
        assert_eq!(
            code(PrintError::UnknownEncoding("x".to_string())),
            EXIT_CONFIG
        );
        assert_eq!(
            exit_code(&anyhow::anyhow!("something else")),
            EXIT_FAILURE
        );
    }

    #[test]
    fn test_exit_code_through_context() {
        let err = anyhow::Error::from(PrintError::SourceNotFound(PathBuf::from("a.prn")))
            .context("Printing label");
        assert_eq!(exit_code(&err), EXIT_SOURCE_NOT_FOUND);
    }

    #[test]
    fn test_run_binding_mismatch_before_template() {
        let cli = parse(&["missing.prn", "ZT411", "A,B", "1"]).unwrap();
        let config = Config {
            encoding: "windows-1252".to_string(),
            doc_name: "Raw Label".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        };

        let err = run(&cli, &config).unwrap_err();
        assert_eq!(exit_code(&err), EXIT_BINDINGS);
    }

    #[test]
    fn test_run_prints_to_device_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("label.prn");
        std::fs::write(&template, "^XA\r\n^FDProduct Key^FS\r\n^XZ\r\n").unwrap();
        let out = dir.path().join("lp0");
        let destination = format!("file:{}", out.display());

        let cli = parse(&[
            template.to_str().unwrap(),
            destination.as_str(),
            "Product Key",
            "RT-4230",
        ])
        .unwrap();
        let config = Config {
            encoding: "windows-1252".to_string(),
            doc_name: "Raw Label".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
        };

        run(&cli, &config).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"^XA^FDRT-4230^FS^XZ");
    }
}
