use super::*;

fn ids(n: u64) -> Vec<ResourceId> {
    (0..n).map(|i| ResourceId(0xabc0 + i)).collect()
}

#[test]
fn one_slide_per_non_empty_line() {
    let deck = SlideDeck::build("  Fast \n\n Simple\n   \nCheap", &[]);
    assert_eq!(deck.len(), 3);
    let texts: Vec<&str> = deck.slides().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Fast", "Simple", "Cheap"]);
    let ordinals: Vec<usize> = deck.slides().iter().map(|s| s.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);
}

#[test]
fn all_empty_input_still_yields_one_slide() {
    for input in ["", "\n\n", "   \n \t "] {
        let deck = SlideDeck::build(input, &[]);
        assert_eq!(deck.len(), 1);
        assert_eq!(deck.slides()[0].text, "");
        assert!(!deck.is_empty());
    }
}

#[test]
fn images_pair_by_upload_order() {
    let images = ids(2);
    let deck = SlideDeck::build("a\nb\nc", &images);
    assert_eq!(deck.get(0).unwrap().image, Some(images[0]));
    assert_eq!(deck.get(1).unwrap().image, Some(images[1]));
    assert_eq!(deck.get(2).unwrap().image, None);
}

#[test]
fn surplus_images_are_ignored() {
    let deck = SlideDeck::build("only", &ids(5));
    assert_eq!(deck.len(), 1);
    assert!(deck.get(0).unwrap().image.is_some());
}

#[test]
fn crlf_lines_are_trimmed() {
    assert_eq!(parse_benefit_lines("a\r\nb\r\n"), vec!["a", "b"]);
}
