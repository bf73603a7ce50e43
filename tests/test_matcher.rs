//! Integration tests for reducing OCR text to a vocabulary label.

mod common;

use pharmalens::MatchStrategy;
use pharmalens::VocabularyMatcher;
use pharmalens::matcher::normalize_text;

use common::*;

fn matcher(labels: &[&str]) -> VocabularyMatcher {
    let vocabulary = Vocabulary::new(labels.iter().copied()).expect("valid vocabulary");
    VocabularyMatcher::new(&vocabulary).expect("matcher builds")
}

#[test]
fn test_case_and_punctuation_are_ignored() {
    let m = matcher(&["ibuprol"]);
    assert_eq!(m.match_label("İBUPROL 400mg!!"), Some("ibuprol"));
    assert_eq!(m.match_label("...Ibuprol,"), Some("ibuprol"));
}

#[test]
fn test_empty_text_matches_nothing() {
    let m = matcher(&LABELS);
    assert_eq!(m.match_label(""), None);
    assert_eq!(m.match_label("   \n\t "), None);
    assert_eq!(m.match_label("!!! ???"), None);
}

#[test]
fn test_unrelated_text_matches_nothing() {
    let m = matcher(&LABELS);
    assert_eq!(m.match_label("Vitamin C 1000 mg effervescent"), None);
}

#[test]
fn test_first_label_in_vocabulary_order_wins() {
    // "para" appears inside "paracetamol" and is listed first
    let m = matcher(&["para", "paracetamol"]);
    let found = m.find("PARACETAMOL 500 mg").unwrap();
    assert_eq!(found.label, "para");
    assert_eq!(found.index, 0);
    assert_eq!(found.strategy, MatchStrategy::Substring);

    let m = matcher(&["paracetamol", "para"]);
    let found = m.find("PARACETAMOL 500 mg").unwrap();
    assert_eq!(found.label, "paracetamol");
    assert_eq!(found.strategy, MatchStrategy::WordBoundary);
}

#[test]
fn test_whole_word_is_reported_before_substring() {
    let m = matcher(&LABELS);
    let found = m.find("Tablet: ASPIRIN 100").unwrap();
    assert_eq!(found.label, "aspirin");
    assert_eq!(found.strategy, MatchStrategy::WordBoundary);
}

#[test]
fn test_label_embedded_in_longer_token_still_matches() {
    let m = matcher(&LABELS);
    let found = m.find("XXASPIRINPLUS").unwrap();
    assert_eq!(found.label, "aspirin");
    assert_eq!(found.strategy, MatchStrategy::Substring);
}

#[test]
fn test_labels_with_punctuation_return_original_form() {
    let m = matcher(&["Parol-500", "Aspirin"]);
    assert_eq!(m.match_label("PAROL 500 film tablet"), Some("Parol-500"));
    assert_eq!(m.match_label("aspirin"), Some("Aspirin"));
}

#[test]
fn test_normalize_collapses_whitespace() {
    assert_eq!(normalize_text("  Parol \n\t 500!! "), "parol 500");
    assert_eq!(normalize_text("İBUPROL"), "ibuprol");
}
