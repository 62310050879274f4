use crate::compute::{round_to, Summary};
use rust_decimal::Decimal;
use std::io::Write;

const RULE: &str = "==============================";

/// `$1,234.56`: two decimals, thousands separated.
pub(crate) fn format_money(amount: Decimal) -> String {
    let rounded = round_to(amount.abs(), 2).to_string();
    let (int, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, digit) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount.is_sign_negative() && !rounded_is_zero(&rounded) {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{frac}")
}

fn rounded_is_zero(text: &str) -> bool {
    text.chars().all(|c| c == '0' || c == '.')
}

/// Prints the per-category breakdown followed by the framed total.
pub(crate) fn write_summary<W: Write>(mut writer: W, summary: &Summary) -> std::io::Result<()> {
    writeln!(writer, "\nCategory Breakdown:")?;
    for (category, sum, percentage) in summary.breakdown() {
        let share = match percentage {
            Some(percentage) => format!("{}%", round_to(percentage, 1)),
            None => "n/a".to_string(),
        };
        writeln!(writer, "- {category:<15}: {} ({share})", format_money(sum))?;
    }
    writeln!(writer, "\n{RULE}")?;
    writeln!(writer, "TOTAL SPENT: {}", format_money(summary.total()))?;
    writeln!(writer, "{RULE}")?;
    Ok(())
}
