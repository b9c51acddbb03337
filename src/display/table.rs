//! Summary table of the stats cache

use crate::display::ColourManager;
use crate::stats::{StatsCache, YearRecord};

const HEADERS: [&str; 9] = ["Year", "Commits", "Content", "Markdown", "AsciiDoc", "Images", "Diagrams", "Words", "Lines"];

fn row(record: &YearRecord) -> [String; 9] {
    [
        record.year.to_string(),
        record.num_commits.to_string(),
        record.num_content_files.to_string(),
        record.num_markdown_files.to_string(),
        record.num_asciidoc_files.to_string(),
        record.num_images.to_string(),
        record.num_diagrams.to_string(),
        record.num_words.to_string(),
        record.num_lines.to_string(),
    ]
}

/// Render every cached year as a right-aligned table, ascending by year
pub fn render_stats_table(cache: &StatsCache, colours: &ColourManager) -> String {
    if cache.is_empty() {
        return format!("{}\n", colours.warning("No yearly stats cached yet."));
    }

    let rows: Vec<[String; 9]> = cache.iter().map(row).collect();
    let widths: Vec<usize> = (0..HEADERS.len())
        .map(|col| rows.iter().map(|r| r[col].len()).chain([HEADERS[col].len()]).max().unwrap_or(0))
        .collect();

    let mut output = String::new();
    let header: Vec<String> = HEADERS.iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:>width$}", colours.highlight(h), width = *w))
        .collect();
    output.push_str(&format!(" {}\n", header.join("  ")));

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&format!(" {}\n", colours.info(&separator.join("  "))));

    for r in &rows {
        let cells: Vec<String> = r.iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:>width$}", cell, width = *w))
            .collect();
        output.push_str(&format!(" {}\n", cells.join("  ")));
    }
    output
}
