use crate::sync::SyncReport;
use std::io::{self, Write};

/// Print the end-of-run summary
pub fn display_sync_report(report: &SyncReport, writer: &mut impl Write) -> io::Result<()> {
    writeln!(writer)?;

    if report.created.is_empty() {
        writeln!(writer, "No new links created.")?;
    } else {
        writeln!(writer, "Created {} links:", report.created.len())?;
        for path in &report.created {
            writeln!(writer, "  {}", path.display())?;
        }
    }

    writeln!(writer)?;
    writeln!(writer, "Summary:")?;
    writeln!(writer, "  {} already linked", report.already_synced)?;
    writeln!(writer, "  {} previously handled", report.already_handled)?;
    writeln!(writer, "  {} ignored", report.ignored)?;

    if report.skipped > 0 {
        writeln!(writer, "  {} skipped", report.skipped)?;
    }
    if report.failed > 0 {
        writeln!(writer, "  {} failed (will retry next run)", report.failed)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_display_report_with_links() {
        let report = SyncReport {
            created: vec![PathBuf::from("/library/movies/Heat (1995) {imdb-tt0113277}/Heat (1995) {imdb-tt0113277}.mkv")],
            already_handled: 4,
            failed: 1,
            ..SyncReport::default()
        };
        let mut output = Vec::new();

        display_sync_report(&report, &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("Created 1 links"));
        assert!(output_str.contains("Heat (1995)"));
        assert!(output_str.contains("4 previously handled"));
        assert!(output_str.contains("1 failed"));
        assert!(!output_str.contains("skipped"));
    }

    #[test]
    fn test_display_empty_report() {
        let mut output = Vec::new();

        display_sync_report(&SyncReport::default(), &mut output).unwrap();

        let output_str = String::from_utf8(output).unwrap();
        assert!(output_str.contains("No new links created"));
    }
}
