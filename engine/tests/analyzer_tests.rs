use engine::Analyzer;

#[test]
fn it_stems_inflected_forms() {
    let tokens = Analyzer::new().analyze("Searching searched searches");
    assert!(tokens.iter().all(|t| t == "search"));
}

#[test]
fn it_filters_stop_words() {
    let tokens = Analyzer::new().analyze("The history of the encyclopedia");
    assert!(!tokens.contains(&"the".to_string()));
    assert!(!tokens.contains(&"of".to_string()));
    assert!(tokens.contains(&"histori".to_string()));
}

#[test]
fn it_keeps_digits_and_splits_punctuation() {
    let tokens = Analyzer::new().analyze("Wikipedia: Anarchism (1994 edition)");
    assert!(tokens.contains(&"1994".to_string()));
    assert!(tokens.contains(&"anarch".to_string()));
}

#[test]
fn it_is_stable_on_already_analyzed_text() {
    let analyzer = Analyzer::new();
    let once = analyzer.analyze("political philosophy movement");
    let twice = analyzer.analyze(&once.join(" "));
    assert_eq!(once, twice);
}
