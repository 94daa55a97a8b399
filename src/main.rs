//! booklet – command-line resume-booklet exporter.
//!
//! Usage:
//!   booklet <snapshot.json> [output.pdf] [--title "My Booklet"]
//!           [--watermark] [--layout classic|modern|storybook] [--settle-ms N]
//!
//! If `output.pdf` is omitted the PDF is written next to the input file with
//! the same stem (e.g. `profile.json` → `profile.pdf`).

use std::{env, fs, path::PathBuf, process, time::Duration};

use booklet_forge::pipeline::{export_booklet, BookletConfig};
use booklet_forge::snapshot::LayoutTemplate;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut title: Option<String> = None;
    let mut watermark = false;
    let mut layout: Option<LayoutTemplate> = None;
    let mut settle_ms: u64 = 0;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--watermark" | "-w" => watermark = true,
            "--title" | "-t" => match iter.next() {
                Some(v) => title = Some(v.clone()),
                None => {
                    eprintln!("--title requires a value");
                    process::exit(1);
                }
            },
            "--layout" | "-l" => match iter.next().and_then(|v| LayoutTemplate::parse(v)) {
                Some(v) => layout = Some(v),
                None => {
                    eprintln!("--layout requires one of: classic, modern, storybook");
                    process::exit(1);
                }
            },
            "--settle-ms" => match iter.next().and_then(|v| v.parse().ok()) {
                Some(v) => settle_ms = v,
                None => {
                    eprintln!("--settle-ms requires a number of milliseconds");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no snapshot file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    // Default output: same directory + same stem as input, but with .pdf
    let output = output_path.unwrap_or_else(|| {
        let mut o = input.clone();
        o.set_extension("pdf");
        o
    });

    let raw = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("Error creating output directory: {e}");
                process::exit(1);
            }
        }
    }

    let config = BookletConfig {
        title,
        watermark,
        layout,
        settle_delay: Duration::from_millis(settle_ms),
    };

    match export_booklet(Some(&raw), &output, &config) {
        Ok((doc, _outcome)) => {
            let pages = doc.pages.len();
            eprintln!(
                "Wrote '{}' ({} page{})",
                output.display(),
                pages,
                if pages == 1 { "" } else { "s" }
            );
        }
        Err(e) => {
            eprintln!("Error exporting booklet: {e}");
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("booklet – resume-booklet PDF exporter (booklet-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <snapshot.json> [output.pdf] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <snapshot.json>  Profile snapshot (images must be base64 data URIs; others are skipped)");
    eprintln!("  [output.pdf]     Output path  (default: same stem as input with .pdf)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --title, -t      Document title in PDF metadata (default: derived from the subject's name)");
    eprintln!("  --watermark, -w  Overlay the preview watermark on every page");
    eprintln!("  --layout, -l     Override the stored layout template (classic|modern|storybook)");
    eprintln!("  --settle-ms      Delay before the print backend runs (default: 0)");
    eprintln!("  --help           Print this message");
}
