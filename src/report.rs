use crate::cache::PolicyKind;
use crate::results::{AccessResult, Report};

/// Rendered in place of a hit rate which doesn't exist, such as for page size 0
pub const NOT_APPLICABLE: &str = "n/a";

/// Renders a report as an ASCII table, one row per page size and one hit rate column per policy
///
/// # Examples
///
/// ```
/// use pagesim::geometry::Geometry;
/// use pagesim::report::render_table;
/// use pagesim::results::{AggregateRow, Report};
///
/// let mut report = Report::new(0, 0);
/// report.push(AggregateRow::new(0, Geometry::Undefined));
/// let table = render_table(&report);
/// assert!(table.contains("| Page Size | OPT(Hit Rate) |"));
/// ```
pub fn render_table(report: &Report) -> String {
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(report.rows().len() + 1);
    let mut header = vec!["Page Size".to_string()];
    header.extend(PolicyKind::ALL.iter().map(|policy| format!("{policy}(Hit Rate)")));
    cells.push(header);
    for row in report.rows() {
        let mut line = vec![row.page_size.to_string()];
        line.extend(row.results.iter().map(|(_, result)| format_hit_rate(&result)));
        cells.push(line);
    }

    let widths: Vec<usize> = (0..=PolicyKind::COUNT)
        .map(|column| cells.iter().map(|line| line[column].len()).max().unwrap_or(0))
        .collect();
    let lines: Vec<String> = cells
        .iter()
        .map(|line| {
            let padded: Vec<String> = line
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            format!("| {} |", padded.join(" | "))
        })
        .collect();

    let rule = "-".repeat(lines.first().map_or(0, String::len));
    let mut out = String::new();
    out.push_str(&rule);
    out.push('\n');
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');
    out
}

/// Formats a hit rate with six decimal places
pub fn format_hit_rate(result: &AccessResult) -> String {
    match result.hit_rate() {
        Some(rate) => format!("{rate:.6}"),
        None => NOT_APPLICABLE.to_string(),
    }
}
