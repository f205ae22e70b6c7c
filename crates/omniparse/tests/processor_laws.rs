//! Round-trip and idempotence laws for the shared processors.

use omniparse::processors::chapter_detector::detect_chapters;
use omniparse::processors::markdown_converter::{ConvertOptions, html_to_markdown};
use omniparse::processors::text_cleaner::clean_text;

#[test]
fn test_cleaner_idempotent_on_its_output() {
    let inputs = [
        "Plain text already clean.",
        "Messy [1] text\u{2014}with artifacts\u{2026}   and   spacing\n\n\n\nissues",
        "\u{201c}Smart quotes\u{201d} and \u{2018}singles\u{2019} everywhere",
        "caf\u{00c3}\u{00a9} mojibake",
    ];
    for input in inputs {
        let once = clean_text(input);
        let twice = clean_text(&once);
        assert_eq!(once, twice, "cleaner not idempotent for {:?}", input);
    }
}

#[test]
fn test_chapter_detector_stable_on_reconstruction() {
    let markdown = "# First\n\nalpha beta gamma\n\n# Second\n\ndelta epsilon\n\n## Sub\n\nzeta\n";
    let chapters = detect_chapters(markdown, 1, 1);
    assert_eq!(chapters.len(), 2);

    let reconstructed: String = chapters.iter().map(|c| c.content.as_str()).collect();
    let again = detect_chapters(&reconstructed, 1, 1);
    assert_eq!(chapters.len(), again.len());
    for (a, b) in chapters.iter().zip(again.iter()) {
        assert_eq!(a.title, b.title);
        assert_eq!(a.level, b.level);
        assert_eq!(a.word_count, b.word_count);
    }
}

#[test]
fn test_chapter_positions_partition_heading_text() {
    let markdown = "# A\n\none\n\n# B\n\ntwo\n\n# C\n\nthree";
    let chapters = detect_chapters(markdown, 1, 2);
    // Chapters tile the text from the first heading to the end.
    for pair in chapters.windows(2) {
        assert_eq!(pair[0].end_position, pair[1].start_position);
    }
    assert_eq!(chapters.last().unwrap().end_position, markdown.len());
}

#[test]
fn test_converter_then_detector_pipeline() {
    let html = "<h1>Part One</h1><p>some body text</p><h1>Part Two</h1><p>more body</p>";
    let markdown = html_to_markdown(html, &ConvertOptions::default());
    let chapters = detect_chapters(&markdown, 1, 2);
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].title, "Part One");
    assert_eq!(chapters[1].title, "Part Two");
}

#[test]
fn test_converter_output_has_no_triple_newlines() {
    let html = "<div><p>a</p></div><div><p>b</p></div><ul><li>c</li></ul><h2>d</h2><p>e</p>";
    let markdown = html_to_markdown(html, &ConvertOptions::default());
    assert!(!markdown.contains("\n\n\n"));
    assert!(!markdown.starts_with('\n'));
    assert!(!markdown.ends_with('\n'));
}
