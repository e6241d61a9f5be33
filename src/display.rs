//! Text formatting shared by the CLI renderers and notification messages.

use rust_decimal::{Decimal, RoundingStrategy};

const MAX_MASK_LEN: usize = 3;

/// Formats an amount as Turkish lira with two decimals, e.g. `₺200.00`.
pub fn format_lira(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("₺{:.2}", rounded)
}

/// Rounds a percentage to a whole number for display, e.g. `80%`.
pub fn format_percent(percent: Decimal) -> String {
    let rounded = percent.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{}%", rounded.normalize())
}

/// Masks a person's name for public listings: `"Ahmet Yilmaz"` becomes `"A*** Y***"`.
pub fn censor_name(full_name: &str) -> String {
    let words: Vec<String> = full_name
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let rest = chars.count();
                    if rest == 0 {
                        word.to_string()
                    } else {
                        let mut masked: String = first.to_uppercase().collect();
                        masked.push_str(&"*".repeat(rest.min(MAX_MASK_LEN)));
                        masked
                    }
                }
                None => String::new(),
            }
        })
        .collect();

    if words.is_empty() {
        "***".to_string()
    } else {
        words.join(" ")
    }
}
