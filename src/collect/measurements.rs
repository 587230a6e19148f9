// src/collect/measurements.rs

//! Benchmark result files → flat `"<benchmark>/<metric>"` map.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher};
use serde_json::Value;
use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Measurement namespace: `"<benchmark>/<metric>"` → statistics record.
pub type Measurements = BTreeMap<String, Value>;

const STATISTICS_KEY: &str = "statistics";

/// Re-key the `statistics` of one result record under `benchmark`.
///
/// Returns an empty map when `record` is not an object, has no
/// `"statistics"` object, or when `benchmark` is `None` (a file stem that
/// is not valid UTF-8).
pub fn format_measurement(record: &Value, benchmark: Option<&str>) -> Measurements {
    let Some(benchmark) = benchmark else {
        return Measurements::new();
    };
    let Some(statistics) = record.get(STATISTICS_KEY).and_then(Value::as_object) else {
        return Measurements::new();
    };

    statistics
        .iter()
        .map(|(metric, stats)| (format!("{benchmark}/{metric}"), stats.clone()))
        .collect()
}

/// Scans a job output directory for result files.
#[derive(Debug, Clone)]
pub struct MeasurementCollector {
    matcher: GlobMatcher,
}

impl MeasurementCollector {
    /// `pattern` is matched against file names, e.g. `"*.json"`.
    pub fn new(pattern: &str) -> Result<Self> {
        let matcher = Glob::new(pattern)
            .with_context(|| format!("compiling result pattern '{pattern}'"))?
            .compile_matcher();
        Ok(Self { matcher })
    }

    /// Collect every matching file in `output_dir`.
    ///
    /// Unreadable or malformed files contribute nothing. Files are merged in
    /// enumeration order; a later file overwrites an earlier one on key
    /// collision.
    pub fn collect(&self, fs: &dyn FileSystem, output_dir: &Path) -> Measurements {
        let entries = match fs.read_dir(output_dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %output_dir.display(), error = %err, "cannot list output dir; no measurements");
                return Measurements::new();
            }
        };

        let mut measurements = Measurements::new();
        for path in entries {
            let Some(name) = path.file_name() else {
                continue;
            };
            if !self.matcher.is_match(name) || !fs.is_file(&path) {
                continue;
            }

            let record = match fs
                .read_to_string(&path)
                .and_then(|s| serde_json::from_str::<Value>(&s).map_err(Into::into))
            {
                Ok(record) => record,
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping unreadable result file");
                    continue;
                }
            };

            let benchmark = path.file_stem().and_then(|s| s.to_str());
            let formatted = format_measurement(&record, benchmark);
            debug!(file = %path.display(), metrics = formatted.len(), "collected result file");
            measurements.extend(formatted);
        }

        measurements
    }
}

impl Default for MeasurementCollector {
    fn default() -> Self {
        Self {
            matcher: Glob::new("*.json")
                .expect("static glob is valid")
                .compile_matcher(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use serde_json::json;

    #[test]
    fn rekeys_statistics_under_benchmark_name() {
        let record = json!({ "statistics": { "a": { "average": 1.0 }, "b": 2 } });
        let formatted = format_measurement(&record, Some("insert"));
        assert_eq!(formatted.len(), 2);
        assert_eq!(formatted["insert/a"], json!({ "average": 1.0 }));
        assert_eq!(formatted["insert/b"], json!(2));
    }

    #[test]
    fn missing_statistics_yields_nothing() {
        assert!(format_measurement(&json!({}), Some("insert")).is_empty());
        assert!(format_measurement(&json!({ "statistics": [1, 2] }), Some("insert")).is_empty());
        assert!(format_measurement(&json!([1, 2, 3]), Some("insert")).is_empty());
        assert!(format_measurement(&json!("statistics"), Some("insert")).is_empty());
    }

    #[test]
    fn non_string_benchmark_name_yields_nothing() {
        let record = json!({ "statistics": { "a": 1 } });
        assert!(format_measurement(&record, None).is_empty());
    }

    #[test]
    fn empty_benchmark_name_keeps_separator() {
        let record = json!({ "statistics": { "a": 1, "b": 2 } });
        let keys: Vec<_> = format_measurement(&record, Some("")).into_keys().collect();
        assert_eq!(keys, vec!["/a".to_string(), "/b".to_string()]);
    }

    #[test]
    fn collect_skips_non_matching_and_malformed_files() {
        let fs = MockFileSystem::new();
        fs.add_file("/out/9/insert.json", r#"{"statistics": {"ips": 10}}"#);
        fs.add_file("/out/9/broken.json", "{ not json");
        fs.add_file("/out/9/empty.json", r#"{"run_time": 3}"#);
        fs.add_file("/out/9/9-config.yml", "version: '3'");
        fs.add_file("/out/9/mix.lock", "%{}");

        let collected = MeasurementCollector::default().collect(&fs, Path::new("/out/9"));
        assert_eq!(collected, [("insert/ips".to_string(), json!(10))].into_iter().collect());
    }

    #[test]
    fn later_files_win_on_collision() {
        let fs = MockFileSystem::new();
        fs.add_file("/out/1/q.json", r#"{"statistics": {"x": 1, "y": 1}}"#);
        fs.add_file("/out/1/q.txt", r#"{"statistics": {"x": 2}}"#);
        fs.add_file("/out/1/sub/q.json", r#"{"statistics": {"x": 99}}"#);

        let collected = MeasurementCollector::new("q.*").unwrap().collect(&fs, Path::new("/out/1"));
        assert_eq!(collected["q/x"], json!(2));
        assert_eq!(collected["q/y"], json!(1));
        assert_eq!(collected.len(), 2);
    }

    #[test]
    fn missing_dir_yields_nothing() {
        let fs = MockFileSystem::new();
        assert!(MeasurementCollector::default().collect(&fs, Path::new("/nope")).is_empty());
    }
}
