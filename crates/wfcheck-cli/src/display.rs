use chrono::{Local, LocalResult, TimeZone};
use colored::Colorize;
use wfcheck_core::{AnalyzeError, FileError};

/// One line per valid workflow.
pub fn print_valid(name: &str) {
    println!("{} {name} is valid", "✓".green());
}

/// One structured paragraph per failing workflow: a headline with the
/// workflow and failure, then indented message/path pairs for schema
/// errors.
pub fn print_failure(name: &str, err: &AnalyzeError) {
    println!("{} {name}: {}", "✗".red(), headline(err));

    if let AnalyzeError::File(file_err) = err {
        if let Some(errors) = file_err.schema_errors() {
            for schema_err in errors {
                println!("  - {}", schema_err.message);
                println!("      {}", schema_err.path.dimmed());
            }
        }
        if let Some(referenced_by) = file_err.referenced_by() {
            println!("  - referenced by {}", referenced_by.dimmed());
        }
    }
}

fn headline(err: &AnalyzeError) -> String {
    match err {
        AnalyzeError::Runtime { message } => message.clone(),
        AnalyzeError::File(FileError::RateLimited { reset_epoch }) => format!(
            "GitHub API rate limit exhausted, resets at {}",
            reset_local_time(*reset_epoch)
        ),
        AnalyzeError::File(inner) => inner.to_string(),
    }
}

fn reset_local_time(epoch: u64) -> String {
    match Local.timestamp_opt(epoch as i64, 0) {
        LocalResult::Single(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => format!("epoch {epoch}"),
    }
}

/// Machine-readable report of every workflow's outcome.
pub fn print_json(reports: &[(String, Result<(), AnalyzeError>)]) -> anyhow::Result<()> {
    let entries: Vec<serde_json::Value> = reports
        .iter()
        .map(|(name, result)| match result {
            Ok(()) => serde_json::json!({
                "workflow": name,
                "valid": true,
            }),
            Err(err) => {
                let mut entry = serde_json::json!({
                    "workflow": name,
                    "valid": false,
                    "code": err.code(),
                    "message": headline(err),
                });
                if let AnalyzeError::File(file_err) = err {
                    if let Some(errors) = file_err.schema_errors() {
                        entry["errors"] = serde_json::to_value(errors).unwrap_or_default();
                    }
                }
                entry
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline_runtime_passthrough() {
        let err = AnalyzeError::Runtime {
            message: "input `x` is required to call workflow from job `verify`".to_string(),
        };
        assert_eq!(
            headline(&err),
            "input `x` is required to call workflow from job `verify`"
        );
    }

    #[test]
    fn test_headline_rate_limit_renders_local_time() {
        let err = AnalyzeError::File(FileError::RateLimited {
            reset_epoch: 1_700_000_000,
        });
        let line = headline(&err);
        assert!(line.starts_with("GitHub API rate limit exhausted, resets at "));
        // A concrete timestamp, not the raw epoch fallback.
        assert!(!line.contains("epoch"));
    }

    #[test]
    fn test_json_report_shape() {
        let reports = vec![
            ("ci.yml".to_string(), Ok(())),
            (
                "release.yml".to_string(),
                Err(AnalyzeError::Runtime {
                    message: "boom".to_string(),
                }),
            ),
        ];
        // Shape is exercised through the serializer used by print_json.
        let entry = match &reports[1].1 {
            Err(err) => serde_json::json!({ "code": err.code() }),
            Ok(()) => unreachable!(),
        };
        assert_eq!(entry["code"], "WORKFLOW_RUNTIME");
    }
}
