use super::*;
use crate::assets::text::ApproxMeasure;

// 1 px per character at size 1.0.
fn unit() -> ApproxMeasure {
    ApproxMeasure { em_advance: 1.0 }
}

#[test]
fn fitting_text_stays_on_one_line() {
    let lines = wrap_greedy("save hours every week", 100.0, 1.0, &mut unit());
    assert_eq!(lines, vec!["save hours every week"]);
}

#[test]
fn exact_fit_is_allowed() {
    let lines = wrap_greedy("abc def", 7.0, 1.0, &mut unit());
    assert_eq!(lines, vec!["abc def"]);
}

#[test]
fn overflowing_text_breaks_greedily() {
    let lines = wrap_greedy("aa bb cc dd ee", 5.0, 1.0, &mut unit());
    assert_eq!(lines, vec!["aa bb", "cc dd", "ee"]);
    for l in &lines {
        assert!(unit().measure(l, 1.0) <= 5.0);
    }
}

#[test]
fn unbreakable_word_gets_its_own_line() {
    let lines = wrap_greedy("hi supercalifragilistic yo", 6.0, 1.0, &mut unit());
    assert_eq!(lines, vec!["hi", "supercalifragilistic", "yo"]);
    let too_wide: Vec<_> = lines
        .iter()
        .filter(|l| unit().measure(l, 1.0) > 6.0)
        .collect();
    assert_eq!(too_wide.len(), 1);
    assert!(!too_wide[0].contains(' '));
}

#[test]
fn empty_text_is_one_empty_line() {
    assert_eq!(wrap_greedy("", 10.0, 1.0, &mut unit()), vec![String::new()]);
    assert_eq!(wrap_greedy("   ", 10.0, 1.0, &mut unit()), vec![String::new()]);
}

#[test]
fn font_size_scales_measurement() {
    let lines = wrap_greedy("ab cd", 9.0, 2.0, &mut unit());
    assert_eq!(lines, vec!["ab", "cd"]);
}
