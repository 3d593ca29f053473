use std::path::Path;

use crate::runner::PathResult;

/// A complete baseline containing results from all paths.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Baseline {
    pub timestamp: String,
    pub results: Vec<PathResult>,
}

/// Load a baseline from a JSON file. Returns None if the file doesn't exist
/// or can't be parsed.
pub fn load_baseline(path: &Path) -> Option<Baseline> {
    let contents = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Save a baseline to a JSON file.
pub fn save_baseline(path: &Path, baseline: &Baseline) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(baseline).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

/// Compare mean tick cost against a baseline. Returns (path name, percent
/// change) for every path over the threshold.
pub fn compare(
    current: &[PathResult],
    baseline: &Baseline,
    threshold_pct: f64,
) -> Vec<(String, f64)> {
    let mut regressions = Vec::new();

    for result in current {
        let Some(base) = baseline
            .results
            .iter()
            .find(|b| b.path_name == result.path_name)
        else {
            continue;
        };
        if base.timings.mean_ms <= 0.0 {
            continue;
        }
        let pct_change =
            (result.timings.mean_ms - base.timings.mean_ms) / base.timings.mean_ms * 100.0;
        if pct_change > threshold_pct {
            regressions.push((result.path_name.clone(), pct_change));
        }
    }

    regressions
}

/// Format results as a markdown summary table.
pub fn format_markdown(results: &[PathResult]) -> String {
    let mut out = String::new();
    out.push_str("| Path | Startup (ms) | Created | Evicted | Completed | Pending | Triangles | Mean (ms) | P95 (ms) | P99 (ms) | Max (ms) |\n");
    out.push_str("|------|--------------|---------|---------|-----------|---------|-----------|-----------|----------|----------|----------|\n");

    for r in results {
        out.push_str(&format!(
            "| {} | {:.1} | {} | {} | {} | {} | {} | {:.3} | {:.3} | {:.3} | {:.3} |\n",
            r.path_name,
            r.startup_ms,
            r.chunks_created,
            r.chunks_evicted,
            r.chunks_completed,
            r.pending_at_end,
            r.triangles_attached,
            r.timings.mean_ms,
            r.timings.p95_ms,
            r.timings.p99_ms,
            r.timings.max_ms,
        ));
    }

    out
}

/// Format a comparison report showing regressions.
pub fn format_comparison(regressions: &[(String, f64)], threshold_pct: f64) -> String {
    if regressions.is_empty() {
        return format!(
            "All paths within {:.0}% threshold. No regressions detected.\n",
            threshold_pct
        );
    }

    let mut out = String::new();
    out.push_str(&format!(
        "REGRESSIONS DETECTED (>{:.0}% threshold):\n",
        threshold_pct
    ));
    for (path, pct) in regressions {
        out.push_str(&format!("  - {}: +{:.1}%\n", path, pct));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::TimingSeries;

    fn result(name: &str, mean_ms: f64) -> PathResult {
        PathResult {
            path_name: name.to_string(),
            tick_count: 10,
            startup_ms: 1.0,
            initial_chunks: 8,
            chunks_created: 0,
            chunks_evicted: 0,
            chunks_completed: 0,
            pending_at_end: 0,
            triangles_attached: 0,
            timings: TimingSeries {
                mean_ms,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_compare_flags_only_slower_paths() {
        let baseline = Baseline {
            timestamp: "t".into(),
            results: vec![result("walk", 1.0), result("sprint", 2.0), result("idle", 0.0)],
        };
        let current = [
            result("walk", 1.05),
            result("sprint", 3.0),
            result("idle", 5.0),
            result("new", 9.0),
        ];
        let regressions = compare(&current, &baseline, 10.0);
        assert_eq!(regressions.len(), 1);
        assert_eq!(regressions[0].0, "sprint");
        assert!((regressions[0].1 - 50.0).abs() < 1e-9);
        assert!(format_comparison(&regressions, 10.0).contains("sprint: +50.0%"));
    }

    #[test]
    fn test_baseline_json_survives_save_and_load() {
        let dir = std::env::temp_dir().join(format!("altitude-bench-{}", std::process::id()));
        let path = dir.join("baseline.json");
        let baseline = Baseline {
            timestamp: "t".into(),
            results: vec![result("walk", 1.25)],
        };
        save_baseline(&path, &baseline).expect("saves");
        let loaded = load_baseline(&path).expect("loads");
        assert_eq!(loaded.results[0].path_name, "walk");
        assert_eq!(loaded.results[0].timings.mean_ms, 1.25);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_markdown_has_row_per_path() {
        let table = format_markdown(&[result("walk", 1.0), result("idle", 0.5)]);
        assert_eq!(table.lines().count(), 4);
        assert!(table.contains("| walk |"));
    }
}
