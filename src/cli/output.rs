//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputArgs, OutputFormat};
use crate::error::Result;
use crate::index::driver::BuildStats;

/// Result of `spimi-index`.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexBuildResult {
    pub dictionary: String,
    pub postings: String,
    pub dictionary_size_bytes: u64,
    pub postings_size_bytes: u64,
    #[serde(flatten)]
    pub stats: BuildStats,
}

/// Result of `spimi-postings`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupResult {
    pub term: String,
    pub found: bool,
    pub doc_frequency: u64,
    pub documents: Vec<String>,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &OutputArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &OutputArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    let value = serde_json::to_value(result)?;
    for line in human_lines(&value) {
        println!("{line}");
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &OutputArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

fn human_lines(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Object(obj) => obj
            .iter()
            .map(|(key, val)| {
                let formatted_val = if key.ends_with("_bytes") {
                    val.as_u64().map(format_bytes).unwrap_or_else(|| format_value(val))
                } else {
                    format_value(val)
                };
                format!("{key}: {formatted_val}")
            })
            .collect(),
        _ => vec![format_value(value)],
    }
}

/// Format a JSON value for human-readable output.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

/// Format bytes in human-readable format.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    let unit = UNITS[unit_index];
    if unit_index == 0 {
        format!("{bytes} {unit}")
    } else {
        format!("{size:.1} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(
            format_value(&serde_json::Value::String("test".to_string())),
            "test"
        );
        assert_eq!(format_value(&serde_json::json!(["1", "3"])), "[1, 3]");
        assert_eq!(format_value(&serde_json::Value::Null), "null");
    }

    #[test]
    fn test_build_result_flattens_stats() {
        let result = IndexBuildResult {
            dictionary: "index.dict".to_string(),
            postings: "index.post".to_string(),
            dictionary_size_bytes: 2048,
            postings_size_bytes: 10,
            stats: BuildStats {
                documents: 3,
                blocks_written: 2,
                merges: 1,
                terms: 5,
                postings: 6,
                elapsed_ms: 12,
            },
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["documents"], 3);
        assert_eq!(value["merges"], 1);

        let lines = human_lines(&value);
        assert!(lines.contains(&"dictionary_size_bytes: 2.0 KB".to_string()));
        assert!(lines.contains(&"terms: 5".to_string()));
    }
}
