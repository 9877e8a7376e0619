//! CSV and report file IO for the transform pipeline.

use std::fs;
use std::path::Path;

use consilia_core::{ConversationRecord, Error, Result};

use crate::pipeline::{RawPair, TransformStats};

fn csv_error(err: csv::Error) -> Error {
    Error::Serialization(err.to_string())
}

/// Read raw (Context, Response) pairs from a CSV file.
///
/// Columns are matched by header name; extra columns are ignored.
pub fn read_raw_pairs(path: &Path) -> Result<Vec<RawPair>> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let mut pairs = Vec::new();
    for row in reader.deserialize() {
        let pair: RawPair = row.map_err(csv_error)?;
        pairs.push(pair);
    }
    Ok(pairs)
}

/// Write transformed records as CSV in the fixed column order
/// `id, Context, Response, category, quality_score, context_length,
/// response_length`.
pub fn write_records(path: &Path, records: &[ConversationRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read previously transformed records, as written by [`write_records`].
pub fn read_records(path: &Path) -> Result<Vec<ConversationRecord>> {
    let mut reader = csv::Reader::from_path(path).map_err(csv_error)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: ConversationRecord = row.map_err(csv_error)?;
        records.push(record);
    }
    Ok(records)
}

/// Write the plain-text statistics report that accompanies a transformed
/// dataset.
pub fn write_stats_report(path: &Path, stats: &TransformStats) -> Result<()> {
    let mut report = String::new();
    report.push_str("Data Processing Statistics\n");
    report.push_str(&"=".repeat(30));
    report.push_str("\n\n");
    report.push_str(&format!("initial_count: {}\n", stats.initial_count));
    report.push_str(&format!("final_count: {}\n", stats.final_count));
    report.push_str(&format!("removed_count: {}\n", stats.removed_count));
    report.push_str(&format!(
        "removal_percentage: {:.2}\n",
        stats.removal_percentage
    ));
    for (category, count) in &stats.categories {
        report.push_str(&format!("category_{}: {}\n", category.as_str(), count));
    }
    report.push_str(&format!(
        "avg_quality_score: {:.2}\n",
        stats.avg_quality_score
    ));
    report.push_str(&format!(
        "avg_context_length: {:.2}\n",
        stats.avg_context_length
    ));
    report.push_str(&format!(
        "avg_response_length: {:.2}\n",
        stats.avg_response_length
    ));
    fs::write(path, report)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use consilia_core::Category;
    use tempfile::tempdir;

    fn record(id: i64, context: &str, response: &str, category: Category) -> ConversationRecord {
        ConversationRecord {
            id,
            context: context.to_string(),
            response: response.to_string(),
            category,
            quality_score: 80.0,
            context_length: context.chars().count() as i32,
            response_length: response.chars().count() as i32,
        }
    }

    #[test]
    fn test_read_raw_pairs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        fs::write(
            &path,
            "Context,Response\nfirst context,first response\n\"quoted, context\",second response\n",
        )
        .unwrap();

        let pairs = read_raw_pairs(&path).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].context, "first context");
        assert_eq!(pairs[0].response, "first response");
        assert_eq!(pairs[1].context, "quoted, context");
    }

    #[test]
    fn test_read_raw_pairs_ignores_extra_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        fs::write(
            &path,
            "source,Context,Response\nforum,some context text,some response text\n",
        )
        .unwrap();

        let pairs = read_raw_pairs(&path).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].context, "some context text");
    }

    #[test]
    fn test_read_missing_file_is_error() {
        let err = read_raw_pairs(Path::new("/nonexistent/raw.csv")).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_record_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.csv");
        let records = vec![
            record(1, "feeling hopeless about everything", "that sounds hard", Category::Depression),
            record(2, "panic before every meeting", "breathing can anchor you", Category::Anxiety),
        ];

        write_records(&path, &records).unwrap();
        let read_back = read_records(&path).unwrap();
        assert_eq!(read_back, records);
    }

    #[test]
    fn test_written_header_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean.csv");
        write_records(
            &path,
            &[record(1, "a context", "a response", Category::General)],
        )
        .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(
            header,
            "id,Context,Response,category,quality_score,context_length,response_length"
        );
    }

    #[test]
    fn test_stats_report_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean_stats.txt");
        let stats = TransformStats {
            initial_count: 4,
            final_count: 3,
            removed_count: 1,
            removal_percentage: 25.0,
            categories: vec![(Category::Depression, 2), (Category::General, 1)],
            avg_quality_score: 86.666,
            avg_context_length: 120.5,
            avg_response_length: 88.0,
        };

        write_stats_report(&path, &stats).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let expected = "Data Processing Statistics\n\
                        ==============================\n\
                        \n\
                        initial_count: 4\n\
                        final_count: 3\n\
                        removed_count: 1\n\
                        removal_percentage: 25.00\n\
                        category_depression: 2\n\
                        category_general: 1\n\
                        avg_quality_score: 86.67\n\
                        avg_context_length: 120.50\n\
                        avg_response_length: 88.00\n";
        assert_eq!(contents, expected);
    }

    #[test]
    fn test_stats_report_empty_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty_stats.txt");
        let stats = TransformStats {
            initial_count: 0,
            final_count: 0,
            removed_count: 0,
            removal_percentage: 0.0,
            categories: vec![],
            avg_quality_score: 0.0,
            avg_context_length: 0.0,
            avg_response_length: 0.0,
        };

        write_stats_report(&path, &stats).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("initial_count: 0\n"));
        assert!(contents.contains("removal_percentage: 0.00\n"));
        assert!(!contents.contains("category_"));
    }
}
