//! Parser for psql aligned table output
//!
//! Locates the header line containing all expected column names, confirms
//! the dashed separator beneath it, then reads pipe-delimited rows until
//! the `(N rows)` footer. The expected column names are configurable so the
//! acceptance grammar can follow schema drift without code changes.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::model::QueryRow;

/// Timestamp format used by both the `NOW_LOCAL` marker and the
/// `maxvalue` column
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static NOW_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"NOW_LOCAL=(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})")
        .unwrap_or_else(|e| unreachable!("static regex: {e}"))
});

/// Expected header column names, in table order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    /// The three required column names
    pub columns: [String; 3],
}

impl Default for TableSpec {
    fn default() -> Self {
        Self {
            columns: ["jobid".into(), "maxvalue".into(), "region_id".into()],
        }
    }
}

/// Outcome of a table parse: rows plus a count of rows dropped for
/// missing required fields (kept visible for observability rather than
/// silently discarded)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableParse {
    /// Successfully parsed rows, in emission order
    pub rows: Vec<QueryRow>,
    /// Pipe-delimited lines rejected for having fewer than three
    /// non-empty fields
    pub dropped_rows: usize,
}

/// Parses an aligned psql table from (sanitized) command output
///
/// Returns an empty parse when no header/separator pair is found.
#[must_use]
pub fn parse_table(text: &str, spec: &TableSpec) -> TableParse {
    let lines: Vec<&str> = text.lines().collect();

    let mut header_idx = None;
    for (i, line) in lines.iter().enumerate() {
        let has_all_columns = spec.columns.iter().all(|c| line.contains(c.as_str()));
        if has_all_columns && line.contains('|') {
            // The header only counts if the next line is the separator.
            if let Some(next) = lines.get(i + 1) {
                if next.contains('+') && next.contains('-') {
                    header_idx = Some(i);
                }
            }
            break;
        }
    }

    let Some(header_idx) = header_idx else {
        return TableParse::default();
    };

    let mut parse = TableParse::default();
    for line in &lines[header_idx + 2..] {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('(') && trimmed.ends_with("rows)") {
            break;
        }
        if !line.contains('|') {
            continue;
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() < 3 || fields[..3].iter().any(|f| f.is_empty()) {
            parse.dropped_rows += 1;
            continue;
        }

        parse.rows.push(QueryRow {
            job_id: fields[0].to_string(),
            max_value: fields[1].to_string(),
            region_id: fields[2].to_string(),
        });
    }

    parse
}

/// Extracts the remote host's own clock from a `NOW_LOCAL=...` marker line
///
/// The remote clock, not the harness clock, is the reference "current
/// time" for freshness math — the two may legitimately differ.
#[must_use]
pub fn extract_remote_now(text: &str) -> Option<NaiveDateTime> {
    let captures = NOW_MARKER.captures(text)?;
    NaiveDateTime::parse_from_str(&captures[1], TIMESTAMP_FORMAT).ok()
}

/// Returns the maximum parseable `maxvalue` timestamp across rows
///
/// Unparseable values are skipped; `None` when no row carries a valid
/// timestamp.
#[must_use]
pub fn newest_timestamp(rows: &[QueryRow]) -> Option<NaiveDateTime> {
    rows.iter()
        .filter_map(|r| NaiveDateTime::parse_from_str(r.max_value.trim(), TIMESTAMP_FORMAT).ok())
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
NOW_LOCAL=2025-08-12 10:30:00
            jobid            |      maxvalue       | region_id
-----------------------------+---------------------+-----------
 NokiaUsageCollector         | 2025-08-12 10:05:00 | EMEA
 VodafoneUsageAggregator     | 2025-08-12 10:22:00 | APAC
 OrangeUsageCollector        | 2025-08-12 09:48:00 | LATAM
(3 rows)
";

    #[test]
    fn test_parse_aligned_table() {
        let parse = parse_table(OUTPUT, &TableSpec::default());
        assert_eq!(parse.rows.len(), 3);
        assert_eq!(parse.dropped_rows, 0);
        assert_eq!(parse.rows[0].job_id, "NokiaUsageCollector");
        assert_eq!(parse.rows[1].max_value, "2025-08-12 10:22:00");
        assert_eq!(parse.rows[2].region_id, "LATAM");
    }

    #[test]
    fn test_rows_preserve_emission_order() {
        let parse = parse_table(OUTPUT, &TableSpec::default());
        let jobs: Vec<&str> = parse.rows.iter().map(|r| r.job_id.as_str()).collect();
        assert_eq!(
            jobs,
            [
                "NokiaUsageCollector",
                "VodafoneUsageAggregator",
                "OrangeUsageCollector"
            ]
        );
    }

    #[test]
    fn test_missing_header_yields_empty_parse() {
        let parse = parse_table("no table here\njust text\n", &TableSpec::default());
        assert!(parse.rows.is_empty());
        assert_eq!(parse.dropped_rows, 0);
    }

    #[test]
    fn test_header_without_separator_is_not_a_table() {
        let text = " jobid | maxvalue | region_id\n a | b | c\n";
        let parse = parse_table(text, &TableSpec::default());
        assert!(parse.rows.is_empty());
    }

    #[test]
    fn test_rows_with_missing_fields_are_dropped_and_counted() {
        let text = "\
 jobid | maxvalue | region_id
-------+----------+-----------
 job_a | 2025-08-12 10:00:00 | EMEA
 job_b |          | EMEA
 job_c | 2025-08-12 10:01:00
(3 rows)
";
        let parse = parse_table(text, &TableSpec::default());
        assert_eq!(parse.rows.len(), 1);
        assert_eq!(parse.dropped_rows, 2);
    }

    #[test]
    fn test_stops_at_row_count_footer() {
        let text = "\
 jobid | maxvalue | region_id
-------+----------+-----------
 job_a | 2025-08-12 10:00:00 | EMEA
(1 rows)
 job_b | 2025-08-12 11:00:00 | APAC
";
        let parse = parse_table(text, &TableSpec::default());
        assert_eq!(parse.rows.len(), 1);
    }

    #[test]
    fn test_custom_column_names() {
        let spec = TableSpec {
            columns: ["task".into(), "high_water".into(), "zone".into()],
        };
        let text = "\
 task | high_water | zone
------+------------+------
 t1   | 2025-01-01 00:00:00 | z1
(1 rows)
";
        let parse = parse_table(text, &spec);
        assert_eq!(parse.rows.len(), 1);
        assert_eq!(parse.rows[0].job_id, "t1");
    }

    #[test]
    fn test_extract_remote_now() {
        let now = extract_remote_now(OUTPUT).unwrap();
        assert_eq!(now.to_string(), "2025-08-12 10:30:00");
        assert!(extract_remote_now("no marker").is_none());
        assert!(extract_remote_now("NOW_LOCAL=garbage").is_none());
    }

    #[test]
    fn test_newest_timestamp_skips_unparseable_values() {
        let rows = vec![
            QueryRow {
                job_id: "a".into(),
                max_value: "2025-08-12 10:05:00".into(),
                region_id: "EMEA".into(),
            },
            QueryRow {
                job_id: "b".into(),
                max_value: "not a timestamp".into(),
                region_id: "EMEA".into(),
            },
            QueryRow {
                job_id: "c".into(),
                max_value: "2025-08-12 10:22:00".into(),
                region_id: "APAC".into(),
            },
        ];
        let newest = newest_timestamp(&rows).unwrap();
        assert_eq!(newest.to_string(), "2025-08-12 10:22:00");
    }

    #[test]
    fn test_newest_timestamp_none_when_nothing_parses() {
        let rows = vec![QueryRow {
            job_id: "a".into(),
            max_value: "???".into(),
            region_id: "EMEA".into(),
        }];
        assert!(newest_timestamp(&rows).is_none());
        assert!(newest_timestamp(&[]).is_none());
    }
}
