// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

use verification_lib::config::VerifierConfig;
use verification_lib::matching::VerificationEngine;
use verification_lib::models::{FlatInputRecord, ReviewType, VerificationInput};
use verification_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about = "Verify claimant records against lookup results", long_about = None)]
struct VerifyArgs {
    /// JSON-lines file with one flat input record per line
    #[arg(long)]
    input: PathBuf,

    /// Where to write JSON-lines decisions (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Suffix table CSV, overriding SUFFIX_TABLE_PATH
    #[arg(long)]
    suffixes: Option<PathBuf>,

    /// Classifier artifact, overriding CLASSIFIER_MODEL_PATH
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq)]
struct RunSummary {
    records: usize,
    verified: usize,
    visual_review: usize,
    skipped_lines: usize,
}

/// Verifies one JSON record per input line, writing one decision per line.
///
/// Lines that are not UTF-8 or not a valid record are logged and skipped.
/// Read and write failures end the run.
fn verify_lines<R: BufRead, W: Write>(
    engine: &VerificationEngine,
    mut reader: R,
    writer: &mut W,
    pb: Option<&ProgressBar>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .context("Failed to read input")?;
        if read == 0 {
            break;
        }
        line_no += 1;
        if let Some(pb) = pb {
            pb.inc(1);
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                warn!("Skipping line {}: not valid UTF-8 ({})", line_no, e);
                summary.skipped_lines += 1;
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let row: FlatInputRecord = match serde_json::from_str(line) {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping line {}: not a valid input record ({})", line_no, e);
                summary.skipped_lines += 1;
                continue;
            }
        };

        let decision = engine.verify(&VerificationInput::from(row));
        summary.records += 1;
        if decision.verified == 1 {
            summary.verified += 1;
        }
        if decision.review == ReviewType::Visual {
            summary.visual_review += 1;
        }

        serde_json::to_writer(&mut *writer, &decision).context("Failed to write decision")?;
        writer.write_all(b"\n").context("Failed to write decision")?;
    }
    writer.flush().context("Failed to flush output")?;
    Ok(summary)
}

fn main() -> Result<()> {
    load_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = VerifyArgs::parse();
    let run_id = Uuid::new_v4();
    let start_time = Instant::now();
    info!("Starting claimant verification run {}", run_id);

    let mut config = VerifierConfig::from_env();
    if let Some(path) = args.suffixes {
        config.suffix_table_path = path;
    }
    if let Some(path) = args.model {
        config.classifier_model_path = path;
    }
    config.log_config();

    let engine = VerificationEngine::from_config(&config)?;

    let reader = BufReader::new(
        File::open(&args.input)
            .with_context(|| format!("Failed to open input file {}", args.input.display()))?,
    );

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    // Input is streamed, so the total is unknown up front.
    let pb = if config.progress_enabled {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} lines {msg}")?,
        );
        pb.set_message("Verifying claimants...");
        Some(pb)
    } else {
        None
    };

    let summary = verify_lines(&engine, reader, &mut writer, pb.as_ref())
        .with_context(|| format!("Verification of {} failed", args.input.display()))?;

    if let Some(pb) = pb {
        pb.finish_with_message("Verification complete");
    }

    info!(
        "Run {} finished in {:.2?}: {} records, {} verified, {} flagged for visual review, {} lines skipped",
        run_id,
        start_time.elapsed(),
        summary.records,
        summary.verified,
        summary.visual_review,
        summary.skipped_lines
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use verification_lib::matching::classifier::FEATURE_VECTOR_SIZE;
    use verification_lib::matching::SuffixTable;

    const ROW: &str = r#"{"claim_number": "C-1", "first_name": "John", "last_name": "Smith", "ssn": "123-45-6789", "date_of_birth": "01/01/1956", "tlo_first_name_1": "JOHN", "tlo_last_name_1": "SMITH", "tlo_ssn": "123456789", "tlo_dob": "0056-01-01"}"#;

    fn engine() -> VerificationEngine {
        let suffixes = SuffixTable::from_entries([("JR", "Junior")]);
        VerificationEngine::new(suffixes, |_: &[f64; FEATURE_VECTOR_SIZE]| true)
    }

    fn run(input: Vec<u8>) -> (RunSummary, Vec<String>) {
        let mut output = Vec::new();
        let summary = verify_lines(&engine(), Cursor::new(input), &mut output, None).unwrap();
        let lines = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        (summary, lines)
    }

    #[test]
    fn test_invalid_lines_are_skipped() {
        let mut input = Vec::new();
        input.extend_from_slice(ROW.as_bytes());
        input.extend_from_slice(b"\n\xE9\n");
        input.extend_from_slice(ROW.as_bytes());
        input.extend_from_slice(b"\nnot json\n");

        let (summary, lines) = run(input);
        assert_eq!(
            summary,
            RunSummary {
                records: 2,
                verified: 2,
                visual_review: 0,
                skipped_lines: 2,
            }
        );
        assert_eq!(lines.len(), 2);
        let decision: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(decision["claim_number"], "C-1");
        assert_eq!(decision["verified"], 1);
    }

    #[test]
    fn test_blank_lines_and_crlf_endings() {
        let input = format!("\r\n{}\r\n\n   \n{}", ROW, ROW).into_bytes();
        let (summary, lines) = run(input);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.skipped_lines, 0);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let (summary, lines) = run(Vec::new());
        assert_eq!(summary, RunSummary::default());
        assert!(lines.is_empty());
    }
}
