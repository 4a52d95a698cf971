use crate::models::{BoundedText, TruncationStrategy};

/// Inserted between the retained head and tail of a sampled text.
pub const OMISSION_MARKER: &str = "\n\n[... middle section omitted ...]\n\n";

/// Bound `text` to `max_chars` characters. Head/tail sampling keeps the
/// first and last 40% of the budget each and spends part of the remaining
/// 20% on the omission marker, so both the opening summary and the closing
/// outlook of a report survive. Counts are characters, never bytes.
pub fn truncate(text: &str, max_chars: usize, strategy: TruncationStrategy) -> BoundedText {
    let total = text.chars().count();
    if total <= max_chars {
        return BoundedText {
            text: text.to_string(),
            strategy,
            truncated: false,
        };
    }

    let bounded = match strategy {
        TruncationStrategy::HardCutoff => hard_cutoff(text, max_chars),
        TruncationStrategy::HeadTail => head_tail(text, total, max_chars),
    };

    BoundedText {
        text: bounded,
        strategy,
        truncated: true,
    }
}

fn hard_cutoff(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn head_tail(text: &str, total: usize, max_chars: usize) -> String {
    let keep = max_chars * 2 / 5;
    let reserve = max_chars - keep * 2;

    // The marker has to fit in the reserved fifth of the budget, otherwise
    // the output would overrun it. Tiny budgets degrade to a hard cutoff.
    if keep == 0 || reserve < OMISSION_MARKER.chars().count() {
        return hard_cutoff(text, max_chars);
    }

    let chars: Vec<char> = text.chars().collect();
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[total - keep..].iter().collect();
    format!("{head}{OMISSION_MARKER}{tail}")
}
