use chrono::NaiveDate;

use super::{format_date, format_releases};
use crate::timeline::BranchRecord;

const HEADER: &str = "| Version | Branch creation | RC releases | Formal releases | Last commit |";
const ALIGNMENT: &str = "| :------ | :-------------- | :---------- | :-------------- | :---------- |";

/// Markdown release table, newest version first.
///
/// `image` is the file name of the companion timeline chart. `generated` is
/// passed in rather than read from the clock so identical inputs render
/// identically.
pub fn render_markdown(records: &[BranchRecord], image: &str, generated: NaiveDate) -> String {
    let mut md = String::new();
    md.push_str("# RisingWave Release Timeline\n\n");
    md.push_str(&format!("![timeline]({image})\n\n"));
    md.push_str("## Details\n\n");
    md.push_str(HEADER);
    md.push('\n');
    md.push_str(ALIGNMENT);
    md.push('\n');

    for record in records.iter().rev() {
        md.push_str(&format!(
            "| v{} | {} | {} | {} | {} |\n",
            record.version(),
            creation_cell(record),
            format_releases(&record.rc_releases),
            format_releases(&record.formal_releases),
            format_date(record.last_commit),
        ));
    }

    md.push_str(&format!("\n*Generated {}*\n", generated.format("%Y-%m-%d")));
    md
}

fn creation_cell(record: &BranchRecord) -> String {
    let date = format_date(record.creation_date());
    match record.branch_creation {
        Some(field) if field.is_estimated() => format!("{date} (est.)"),
        _ => date,
    }
}
