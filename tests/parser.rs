use doublet_loader::parser::{line_count, parse_line, split_words};
use doublet_loader::{LineOutcome, PuzzleRecord, parse_puzzles};

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_string()).collect()
}

#[test]
fn parses_example_file() {
    let parsed: Vec<_> = parse_puzzles("CAT,COT,COG,DOG\nAAA\nONE,TWO").collect();
    assert_eq!(parsed.len(), 3);

    assert_eq!(
        parsed[0].record(),
        Some(&PuzzleRecord {
            index: 0,
            ladder: words(&["CAT", "COT", "COG", "DOG"]),
            word_length: 3,
            step_count: 4,
        })
    );
    assert_eq!(parsed[1].index, 1);
    assert_eq!(parsed[1].outcome, LineOutcome::Skipped { words: 1 });
    assert_eq!(
        parsed[2].record(),
        Some(&PuzzleRecord {
            index: 2,
            ladder: words(&["ONE", "TWO"]),
            word_length: 3,
            step_count: 2,
        })
    );
}

#[test]
fn words_are_trimmed_and_uppercased() {
    assert_eq!(
        split_words("  cold , Cord,\tcard ,WARD  ,warm"),
        words(&["COLD", "CORD", "CARD", "WARD", "WARM"])
    );
}

#[test]
fn empty_fields_collapse_into_a_skip() {
    // Looks like three fields, but only one word survives.
    let parsed = parse_line(7, "HEAD, ,   ,");
    assert_eq!(parsed.index, 7);
    assert_eq!(parsed.outcome, LineOutcome::Skipped { words: 1 });

    let parsed = parse_line(8, "HEAD,,TAIL,");
    assert_eq!(
        parsed.record().map(|r| r.ladder.clone()),
        Some(words(&["HEAD", "TAIL"]))
    );
}

#[test]
fn skipped_lines_leave_index_gaps() {
    let input = "A,B\n\nSOLO\nC,D\n , \nE,F";
    let indices: Vec<usize> = parse_puzzles(input)
        .filter_map(|line| line.into_record())
        .map(|r| r.index)
        .collect();
    assert_eq!(indices, vec![0, 3, 5]);

    let skipped: Vec<usize> = parse_puzzles(input)
        .filter(|line| line.is_skipped())
        .map(|line| line.index)
        .collect();
    assert_eq!(skipped, vec![1, 2, 4]);
}

#[test]
fn surrounding_whitespace_is_not_a_line() {
    let input = "\n\n  CAT,DOG\nPIG,STY\n\n\n";
    assert_eq!(line_count(input), 2);
    let parsed: Vec<_> = parse_puzzles(input).collect();
    assert_eq!(parsed.len(), 2);
    assert!(parsed.iter().all(|line| !line.is_skipped()));
    assert_eq!(parsed[1].index, 1);
}

#[test]
fn crlf_line_endings_are_accepted() {
    let parsed: Vec<_> = parse_puzzles("CAT,DOG\r\nPIG,STY\r\n").collect();
    assert_eq!(parsed.len(), 2);
    assert_eq!(
        parsed[1].record().map(|r| r.ladder.clone()),
        Some(words(&["PIG", "STY"]))
    );
}

#[test]
fn byte_order_mark_is_not_part_of_the_first_word() {
    let input = "\u{FEFF}CAT,COT,COG,DOG\nONE,TWO";
    assert_eq!(line_count(input), 2);

    let parsed: Vec<_> = parse_puzzles(input).collect();
    let first = parsed[0].record().expect("first line is a puzzle");
    assert_eq!(first.ladder[0], "CAT");
    assert_eq!(first.word_length, 3);
    assert_eq!(parsed[1].record().map(|r| r.index), Some(1));
}

#[test]
fn empty_input_has_no_lines() {
    assert_eq!(line_count(""), 0);
    assert_eq!(line_count(" \n\t\n"), 0);
    assert_eq!(parse_puzzles("   ").count(), 0);
}

#[test]
fn derived_fields_follow_the_ladder() {
    for line in [
        "a,b",
        "love,lose,lost,lust,must",
        "straße,strasse",
        "ape,apt,opt,oat,mat,man",
    ] {
        let parsed = parse_line(0, line);
        let record = parsed.record().expect("line has at least two words");
        assert_eq!(record.step_count, record.ladder.len());
        assert_eq!(record.word_length, record.ladder[0].chars().count());
    }
}

#[test]
fn record_constructor_rejects_short_ladders() {
    assert!(PuzzleRecord::new(0, Vec::new()).is_none());
    assert!(PuzzleRecord::new(0, words(&["ONLY"])).is_none());
    let record = PuzzleRecord::new(4, words(&["HEAT", "HEAD"])).unwrap();
    assert_eq!(record.document_id(), "4");
}
