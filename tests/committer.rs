use anyhow::Result;
use chrono::{TimeZone, Utc};
use doublet_loader::committer::BatchCommitter;
use doublet_loader::store::CommitRecord;
use doublet_loader::*;

fn fixed_store() -> FakeDocumentStore {
    FakeDocumentStore::new().with_fixed_time(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap())
}

/// `n` lines where every line whose index is divisible by `skip_every` has a single word.
fn generated_input(n: usize, skip_every: usize) -> String {
    (0..n)
        .map(|i| {
            if skip_every > 0 && i % skip_every == 0 {
                format!("solo{i}")
            } else {
                format!("w{i}a,w{i}b,w{i}c")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn example_file_commits_one_batch_and_summary() -> Result<()> {
    let store = fixed_store();
    let config = ImportConfig::default();

    let report = import_text(&store, &config, "CAT,COT,COG,DOG\nAAA\nONE,TWO")?;
    assert_eq!(
        report,
        ImportReport {
            lines: 3,
            committed: 2,
            skipped: vec![1],
            windows: 1,
        }
    );
    assert_eq!(
        store.commits(),
        vec![CommitRecord {
            ids: vec!["0".to_string(), "2".to_string()],
        }]
    );

    let first: PuzzleRecord = store.get("puzzles", "0")?.unwrap().decode()?;
    assert_eq!(first.ladder, vec!["CAT", "COT", "COG", "DOG"]);
    assert_eq!(first.word_length, 3);
    assert_eq!(first.step_count, 4);
    assert!(store.get("puzzles", "1")?.is_none());

    let summary = store.get("config", "puzzles")?.unwrap();
    let decoded: ImportSummary = summary.decode()?;
    assert_eq!(decoded.total_count, 2);
    assert_eq!(decoded.epoch_date, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(
        summary.fields["lastUpdated"],
        FieldValue::Timestamp(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap())
    );
    Ok(())
}

#[test]
fn created_at_is_resolved_by_the_store() -> Result<()> {
    let store = fixed_store();
    import_text(&store, &ImportConfig::default(), "ONE,TWO")?;

    let doc = store.get("puzzles", "0")?.unwrap();
    assert_eq!(
        doc.fields["createdAt"],
        FieldValue::Timestamp(Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap())
    );
    assert_eq!(doc.fields["index"], FieldValue::Integer(0));
    Ok(())
}

#[test]
fn windows_follow_line_positions() -> Result<()> {
    let store = fixed_store();
    let input = generated_input(1203, 7);

    let report = import_text(&store, &ImportConfig::default(), &input)?;
    let commits = store.commits();
    assert_eq!(commits.len(), 3); // ceil(1203 / 500)
    assert_eq!(report.windows, 3);

    for (w, commit) in commits.iter().enumerate() {
        let lo = w * 500;
        let hi = ((w + 1) * 500).min(1203);
        for id in &commit.ids {
            let index: usize = id.parse()?;
            assert!((lo..hi).contains(&index), "{index} outside window {w}");
            assert_ne!(index % 7, 0, "skipped line {index} was written");
        }
        let expected = (lo..hi).filter(|i| i % 7 != 0).count();
        assert_eq!(commit.ids.len(), expected);
    }

    let valid = (0..1203).filter(|i| i % 7 != 0).count();
    assert_eq!(report.committed, valid);
    assert_eq!(store.document_count("puzzles"), valid);
    assert_eq!(report.skipped.len(), 1203 - valid);
    Ok(())
}

#[test]
fn smaller_windows_are_configurable() -> Result<()> {
    let store = fixed_store();
    let config = ImportConfig {
        window_size: 2,
        ..ImportConfig::default()
    };

    let report = import_text(&store, &config, "A,B\nC\nD,E\nF,G\nH,I")?;
    assert_eq!(report.windows, 3);
    let ids: Vec<Vec<String>> = store.commits().into_iter().map(|c| c.ids).collect();
    assert_eq!(ids, vec![vec!["0"], vec!["2", "3"], vec!["4"]]);
    Ok(())
}

#[test]
fn window_of_only_skipped_lines_still_commits() -> Result<()> {
    let store = fixed_store();
    let config = ImportConfig {
        window_size: 2,
        ..ImportConfig::default()
    };

    let report = import_text(&store, &config, "X\nY\nA,B")?;
    assert_eq!(store.commit_attempts(), 2);
    assert_eq!(store.commits()[0].ids, Vec::<String>::new());
    assert_eq!(report.committed, 1);
    assert_eq!(report.skipped, vec![0, 1]);
    Ok(())
}

#[test]
fn empty_input_writes_only_the_summary() -> Result<()> {
    let store = fixed_store();
    let report = import_text(&store, &ImportConfig::default(), "\n  \n")?;

    assert_eq!(report, ImportReport::default());
    assert_eq!(store.commit_attempts(), 0);
    let summary: ImportSummary = store.get("config", "puzzles")?.unwrap().decode()?;
    assert_eq!(summary.total_count, 0);
    Ok(())
}

#[test]
fn failed_window_keeps_earlier_windows_and_skips_summary() {
    let store = fixed_store();
    store.fail_commit_at(1, ErrorKind::ServiceUnavailable);
    let config = ImportConfig {
        window_size: 3,
        ..ImportConfig::default()
    };

    let err = import_text(&store, &config, &generated_input(10, 0)).unwrap_err();
    match &err {
        ImportError::CommitFailure {
            window,
            first_line,
            last_line,
            source,
        } => {
            assert_eq!(*window, 1);
            assert_eq!((*first_line, *last_line), (3, 5));
            assert_eq!(source.kind, ErrorKind::ServiceUnavailable);
        }
        other => panic!("unexpected error: {other}"),
    }

    // No window after the failing one is attempted.
    assert_eq!(store.commit_attempts(), 2);
    assert_eq!(store.document_count("puzzles"), 3);
    assert!(store.get("puzzles", "3").unwrap().is_none());
    assert!(store.get("config", "puzzles").unwrap().is_none());
}

#[test]
fn timeout_is_reported_as_commit_failure() {
    let store = fixed_store();
    store.fail_commit_at(0, ErrorKind::Timeout);

    let err = import_text(&store, &ImportConfig::default(), "A,B").unwrap_err();
    assert!(matches!(err, ImportError::CommitFailure { .. }));
    assert!(err.is_timeout());
}

#[test]
fn summary_failure_is_fatal_after_all_windows() {
    let store = fixed_store();
    store.fail_set_document(ErrorKind::Authorization);

    let err = import_text(&store, &ImportConfig::default(), "A,B\nC,D").unwrap_err();
    assert!(matches!(err, ImportError::SummaryFailure { .. }));
    assert_eq!(store.document_count("puzzles"), 2);
    assert!(err.to_string().contains("summary"));
}

#[test]
fn rerun_overwrites_with_equal_content() -> Result<()> {
    let store = fixed_store();
    let config = ImportConfig {
        window_size: 4,
        ..ImportConfig::default()
    };
    let input = generated_input(10, 3);

    store.fail_commit_at(1, ErrorKind::Network);
    assert!(import_text(&store, &config, &input).is_err());
    let partial: PuzzleRecord = store.get("puzzles", "1")?.unwrap().decode()?;

    store.clear_faults();
    let report = import_text(&store, &config, &input)?;
    let rerun: PuzzleRecord = store.get("puzzles", "1")?.unwrap().decode()?;
    assert_eq!(partial, rerun);

    // The total is recounted from zero, not added to the partial run.
    let summary: ImportSummary = store.get("config", "puzzles")?.unwrap().decode()?;
    assert_eq!(summary.total_count, report.committed);
    assert_eq!(store.document_count("puzzles"), report.committed);
    Ok(())
}

#[test]
fn committer_rejects_out_of_range_windows() {
    let store = FakeDocumentStore::new();
    assert!(matches!(
        BatchCommitter::new(&store, "puzzles", 0),
        Err(ImportError::InvalidConfig(_))
    ));
    assert!(BatchCommitter::new(&store, "puzzles", MAX_BATCH_WRITES + 1).is_err());
    assert!(BatchCommitter::new(&store, "puzzles", MAX_BATCH_WRITES).is_ok());
}

#[test]
fn committer_works_through_a_trait_object() -> Result<()> {
    let fake = fixed_store();
    let store: &dyn DocumentStore = &fake;
    let committer = BatchCommitter::new(store, "ladders", 500)?;

    let report = committer.commit_windows(parse_puzzles("ONE,TWO\nTHREE"))?;
    assert_eq!(report.committed, 1);
    assert!(fake.get("ladders", "0")?.is_some());
    Ok(())
}

#[test]
fn run_import_reports_missing_puzzle_file() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let config = ImportConfig {
        input_path: tmp.path().join("doublet.csv"),
        ..ImportConfig::default()
    };
    let store = FakeDocumentStore::new();

    let err = run_import(&store, &config).unwrap_err();
    assert!(matches!(err, ImportError::MissingInput { .. }));
    assert!(err.to_string().contains("doublet.csv"));
    assert_eq!(store.commit_attempts(), 0);
    Ok(())
}

#[test]
fn run_import_reads_from_disk() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("doublet.csv");
    std::fs::write(&path, "cold,cord,card,ward,warm\nhead,heal,teal,tell,tall,tail\n")?;
    let config = ImportConfig {
        input_path: path,
        ..ImportConfig::default()
    };
    let store = fixed_store();

    let report = run_import(&store, &config)?;
    assert_eq!(report.committed, 2);
    let tail: PuzzleRecord = store.get("puzzles", "1")?.unwrap().decode()?;
    assert_eq!(tail.ladder.last().map(String::as_str), Some("TAIL"));
    assert_eq!(tail.step_count, 6);
    Ok(())
}
