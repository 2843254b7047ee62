// Colored terminal rendering of a moderation verdict, for `foulcheck check`.

use colored::{ColoredString, Colorize};

use crate::moderation::{ModerationOutcome, ModerationResult};

/// Print a verdict to stdout.
pub fn display_outcome(outcome: &ModerationOutcome) {
    match outcome {
        ModerationOutcome::Skipped(skipped) => {
            println!(
                "\n{} ({})",
                "SKIPPED".yellow().bold(),
                skipped.reason.dimmed()
            );
            println!("  Message came from the bot itself; no detection was run.");
        }
        ModerationOutcome::Verdict(result) => display_result(result),
    }
}

fn display_result(result: &ModerationResult) {
    let verdict = if result.foul {
        "FOUL".red().bold()
    } else {
        "CLEAN".green().bold()
    };

    println!("\n{verdict}");
    println!("  {:<12} {}", "Input:".dimmed(), result.input);
    println!("  {:<12} {}", "Normalized:".dimmed(), result.norm);
    println!(
        "  {:<12} {}",
        "Lexicon:".dimmed(),
        if result.reasons.lexicon_profanity {
            "hit".red()
        } else {
            "clean".green()
        }
    );

    let threshold = result.reasons.threshold;
    println!(
        "\n  {} (threshold {:.2})",
        "Toxicity scores".bold(),
        threshold
    );
    println!("  {}", "-".repeat(36).dimmed());

    for label in &result.reasons.labels {
        match result.reasons.toxicity_scores.get(label) {
            Some(score) => println!(
                "  {:<20} {}",
                label,
                colorize_score(*score, threshold)
            ),
            None => println!("  {:<20} {}", label, "n/a".dimmed()),
        }
    }
    println!();
}

/// Red at or above the threshold, yellow within half of it, plain otherwise.
fn colorize_score(score: f64, threshold: f64) -> ColoredString {
    let text = format!("{score:.4}");
    if score >= threshold {
        text.red().bold()
    } else if score >= threshold / 2.0 {
        text.yellow()
    } else {
        text.normal()
    }
}
