// Unit tests for text normalization.
//
// Covers the substitution table, the character filter, whitespace handling,
// and idempotence over a spread of adversarial inputs.

use foulcheck::normalize::normalize;

#[test]
fn empty_input_is_empty() {
    assert_eq!(normalize(""), "");
}

#[test]
fn leet_digits_fold_to_letters() {
    assert_eq!(normalize("h3ll0 w0rld"), "hello world");
}

#[test]
fn every_substitution_rule() {
    assert_eq!(normalize("!¡1|i"), "iiiii");
    assert_eq!(normalize("@4"), "aa");
    assert_eq!(normalize("$5"), "ss");
    assert_eq!(normalize("0"), "o");
    assert_eq!(normalize("3"), "e");
    assert_eq!(normalize("7"), "t");
}

#[test]
fn unmapped_digits_survive() {
    assert_eq!(normalize("2 6 8 9"), "2 6 8 9");
}

#[test]
fn exclamation_marks_become_letters() {
    // Trailing "!!!" folds to "iii" rather than disappearing.
    assert_eq!(normalize("You are such an idiot!!!"), "you are such an idiotiii");
}

#[test]
fn spacing_tricks_collapse() {
    assert_eq!(normalize("f.u.c.k"), "f u c k");
    assert_eq!(normalize("a   -  b"), "a b");
}

#[test]
fn only_whitespace_runs_are_rewritten() {
    assert_eq!(normalize("a\tb"), "a\tb");
    assert_eq!(normalize("line one\nline two"), "line one\nline two");
    assert_eq!(normalize("a\t\n b"), "a b");
    assert_eq!(normalize("a!\tb"), "ai\tb");
    assert_eq!(normalize("a.\tb"), "a b");
}

#[test]
fn mentions_lose_the_at_sign() {
    assert_eq!(normalize("hey @modbot"), "hey amodbot");
}

#[test]
fn idempotent_on_adversarial_inputs() {
    let samples = [
        "",
        "   ",
        "ALL CAPS SHOUTING!!!",
        "$h1t h3ad",
        "İstanbul",
        "tab\tseparated\nlines\r\n",
        "zero\u{200B}width",
        "¡¡¡ ||| @@@ 444 $$$ 555",
        "日本語のテキスト",
        "emoji 🤬 rage",
    ];
    for sample in samples {
        let once = normalize(sample);
        assert_eq!(normalize(&once), once, "normalize not idempotent for {sample:?}");
    }
}

#[test]
fn output_has_no_edge_or_double_spaces() {
    let out = normalize("  ..hello,,,   there..  ");
    assert_eq!(out, "hello there");
    assert!(!out.contains("  "));
}
