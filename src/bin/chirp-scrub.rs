//! Filter and scrub JSONL records.
//!
//! Each input line is a JSON object. Records whose `--filter-key` value appears in
//! `--not-in` are dropped, and `--scrub` values are removed from the `--scrub-key` array.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use chirp_data::config::{self, PipelineConfig};
use chirp_data::filter_scrub::{Record, not_in, scrub};
use chirp_data::logging;
use serde_json::Value;
use tracing::info;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let config = match &options.config {
        Some(path) => config::load_from(path).map_err(|err| err.to_string())?,
        None => PipelineConfig::default(),
    };
    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let reader: Box<dyn BufRead> = match &options.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).map_err(|err| format!("Open {}: {err}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };
    let mut writer: Box<dyn Write> = match &options.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|err| format!("Create {}: {err}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    };

    let mut stats = Stats::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| format!("Read line {}: {err}", idx + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        stats.read += 1;
        let record: Record = serde_json::from_str(&line)
            .map_err(|err| format!("line {}: {err}", idx + 1))?;
        let Some(record) = apply(&options, record).map_err(|err| format!("line {}: {err}", idx + 1))?
        else {
            stats.dropped += 1;
            continue;
        };
        serde_json::to_writer(&mut writer, &record).map_err(|err| err.to_string())?;
        writer.write_all(b"\n").map_err(|err| err.to_string())?;
        stats.written += 1;
    }
    writer.flush().map_err(|err| err.to_string())?;

    info!(
        "Processed {} records: {} written, {} dropped",
        stats.read, stats.written, stats.dropped
    );
    Ok(())
}

fn apply(
    options: &CliOptions,
    record: Record,
) -> Result<Option<Record>, chirp_data::filter_scrub::FilterError> {
    if let Some(key) = &options.filter_key {
        if !not_in(&record, key, &options.not_in)? {
            return Ok(None);
        }
    }
    match &options.scrub_key {
        Some(key) => Ok(Some(scrub(&record, key, &options.scrub)?.into_owned())),
        None => Ok(Some(record)),
    }
}

#[derive(Debug, Default)]
struct Stats {
    read: usize,
    written: usize,
    dropped: usize,
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    filter_key: Option<String>,
    not_in: Vec<Value>,
    scrub_key: Option<String>,
    scrub: Vec<Value>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--input" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--input requires a value".to_string())?;
                options.input = Some(PathBuf::from(value));
            }
            "--output" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--output requires a value".to_string())?;
                options.output = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            "--filter-key" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--filter-key requires a value".to_string())?;
                options.filter_key = Some(value.clone());
            }
            "--not-in" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--not-in requires a value".to_string())?;
                options.not_in = parse_json_array("--not-in", value)?;
            }
            "--scrub-key" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--scrub-key requires a value".to_string())?;
                options.scrub_key = Some(value.clone());
            }
            "--scrub" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--scrub requires a value".to_string())?;
                options.scrub = parse_json_array("--scrub", value)?;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    if options.filter_key.is_none() && options.scrub_key.is_none() {
        return Err(help_text());
    }
    Ok(options)
}

fn parse_json_array(flag: &str, value: &str) -> Result<Vec<Value>, String> {
    match serde_json::from_str::<Value>(value) {
        Ok(Value::Array(values)) => Ok(values),
        Ok(_) => Err(format!("{flag} expects a JSON array, got: {value}")),
        Err(err) => Err(format!("Invalid {flag} value: {err}")),
    }
}

fn help_text() -> String {
    [
        "chirp-scrub",
        "",
        "Filters and scrubs JSONL records.",
        "",
        "Usage:",
        "  chirp-scrub [--input in.jsonl] [--output out.jsonl] --filter-key <key> --not-in <json>",
        "  chirp-scrub [--input in.jsonl] [--output out.jsonl] --scrub-key <key> --scrub <json>",
        "",
        "Options:",
        "  --input <file>        Input JSONL (default: stdin).",
        "  --output <file>       Output JSONL (default: stdout).",
        "  --config <file>       Pipeline config TOML (logging settings).",
        "  --filter-key <key>    Drop records whose value at <key> is listed in --not-in.",
        "  --not-in <json>       JSON array of values, e.g. '[\"ostric\"]'.",
        "  --scrub-key <key>     Remove --scrub values from the array at <key>.",
        "  --scrub <json>        JSON array of values to remove.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn parses_filter_and_scrub_flags() {
        let options = parse_args(args(&[
            "--filter-key",
            "species",
            "--not-in",
            r#"["ostric"]"#,
            "--scrub-key",
            "bg_labels",
            "--scrub",
            r#"["ostric", "grhowl"]"#,
        ]))
        .unwrap();
        assert_eq!(options.filter_key.as_deref(), Some("species"));
        assert_eq!(options.not_in, vec![json!("ostric")]);
        assert_eq!(options.scrub.len(), 2);
    }

    #[test]
    fn requires_an_operation_and_arrays() {
        assert!(parse_args(Vec::new()).is_err());
        assert!(parse_args(args(&["--scrub-key", "x", "--scrub", "3"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }

    #[test]
    fn apply_filters_then_scrubs() {
        let options = parse_args(args(&[
            "--filter-key",
            "species",
            "--not-in",
            r#"["ostric"]"#,
            "--scrub-key",
            "bg_labels",
            "--scrub",
            r#"["ostric"]"#,
        ]))
        .unwrap();
        let keep: Record = serde_json::from_value(json!({
            "species": "amecro",
            "bg_labels": ["ostric", "grhowl"],
        }))
        .unwrap();
        let drop: Record = serde_json::from_value(json!({
            "species": "ostric",
            "bg_labels": [],
        }))
        .unwrap();
        let kept = apply(&options, keep).unwrap().unwrap();
        assert_eq!(kept["bg_labels"], json!(["grhowl"]));
        assert!(apply(&options, drop).unwrap().is_none());
    }
}
