//! Parser for `kubectl get pods` listing lines

use std::sync::LazyLock;

use regex::Regex;

use crate::model::PodRow;

static POD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>\S+)\s+(?P<ready>\d+)/(?P<total>\d+)\s+(?P<phase>\S+)\s+(?P<restarts>\d+)\s+(?P<age>\S+)\s*$",
    )
    .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// Extracts pod rows from remote output
///
/// Every line is matched against the fixed five-field pod pattern
/// (`NAME READY STATUS RESTARTS AGE`); headers, echoed markers, blank
/// lines and `(none)` placeholders are silently skipped.
#[must_use]
pub fn parse_pod_lines(text: &str) -> Vec<PodRow> {
    text.lines()
        .filter_map(|line| {
            let captures = POD_LINE.captures(line.trim())?;
            Some(PodRow {
                name: captures["name"].to_string(),
                ready_current: captures["ready"].parse().ok()?,
                ready_total: captures["total"].parse().ok()?,
                phase: captures["phase"].to_string(),
                restarts: captures["restarts"].parse().ok()?,
                age: captures["age"].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
Tue Aug 12 10:30:01 UTC 2025
NAMESPACE=dis-nci

### GET_PODS grep=ice-mapreduce
ice-mapreduce-0                    1/1     Running   0          42d
ice-mapreduce-1                    0/1     CrashLoopBackOff   12     3h2m

### GET_PODS grep=webservice-rest
webservice-rest-7d4b9c6f5-x2kqp    2/2     Running   1          12d

### GET_PODS grep=iceca
(none)
";

    #[test]
    fn test_parses_only_pod_lines() {
        let rows = parse_pod_lines(OUTPUT);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name, "ice-mapreduce-0");
        assert_eq!(rows[0].ready_current, 1);
        assert_eq!(rows[0].ready_total, 1);
        assert_eq!(rows[0].phase, "Running");
        assert_eq!(rows[0].restarts, 0);
        assert_eq!(rows[0].age, "42d");
    }

    #[test]
    fn test_crashing_pod_is_captured() {
        let rows = parse_pod_lines(OUTPUT);
        let crashing = &rows[1];
        assert_eq!(crashing.phase, "CrashLoopBackOff");
        assert!(!crashing.ready_complete());
        assert_eq!(crashing.restarts, 12);
    }

    #[test]
    fn test_rows_preserve_emission_order() {
        let rows = parse_pod_lines(OUTPUT);
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "ice-mapreduce-0",
                "ice-mapreduce-1",
                "webservice-rest-7d4b9c6f5-x2kqp"
            ]
        );
    }

    #[test]
    fn test_empty_and_noise_only_input() {
        assert!(parse_pod_lines("").is_empty());
        assert!(parse_pod_lines("NAME READY STATUS RESTARTS AGE\n(none)\n").is_empty());
    }
}
