use crate::{
    data::{parse_decimal, Expense, RowError, StoreError},
    store::Rows,
};
use csv::StringRecord;
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::io::Write;

/// Turns one stored row back into an `Expense`.
pub(crate) fn decode_row(row: &StringRecord) -> Result<Expense, RowError> {
    if row.len() != 4 {
        return Err(RowError::FieldCount(row.len()));
    }
    let amount = parse_decimal(&row[1]).ok_or_else(|| RowError::BadAmount(row[1].to_string()))?;
    Ok(Expense {
        date: row[0].to_string(),
        amount,
        category: row[2].to_string(),
        description: row[3].to_string(),
    })
}

/// Running sums over a set of records. Every configured category has a
/// bucket from the start, even if nothing ever lands in it. The total also
/// counts records whose category isn't configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Summary {
    categories: Vec<(String, Decimal)>,
    total: Decimal,
}

impl Summary {
    pub fn new(categories: &[String]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|c| (c.clone(), Decimal::ZERO))
                .collect(),
            total: Decimal::ZERO,
        }
    }

    /// Adds one record. Nothing changes if the record would overflow its
    /// bucket or the total.
    pub fn add(&mut self, expense: &Expense) -> Result<(), RowError> {
        let overflow = || RowError::Overflow(expense.amount);
        let total = self
            .total
            .checked_add(expense.amount)
            .ok_or_else(overflow)?;
        if let Some((_, sum)) = self
            .categories
            .iter_mut()
            .find(|(name, _)| *name == expense.category)
        {
            *sum = sum.checked_add(expense.amount).ok_or_else(overflow)?;
        }
        self.total = total;
        Ok(())
    }

    #[cfg(test)]
    pub fn query(&self, category: &str) -> Option<Decimal> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, sum)| *sum)
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Share of the total, in percent. Zero when the total is zero, `None`
    /// when the share is too large to represent (only possible once refunds
    /// have pushed the total close to zero).
    pub fn percentage(&self, amount: Decimal) -> Option<Decimal> {
        if self.total.is_zero() {
            return Some(Decimal::ZERO);
        }
        amount.checked_div(self.total)?.checked_mul(dec!(100))
    }

    /// Categories that actually got spent on, in configuration order, with
    /// their sum and share of the total.
    pub fn breakdown(&self) -> impl Iterator<Item = (&str, Decimal, Option<Decimal>)> + '_ {
        self.categories
            .iter()
            .filter(|(_, sum)| *sum > Decimal::ZERO)
            .map(|(name, sum)| (name.as_str(), *sum, self.percentage(*sum)))
    }
}

/// Sums every row into a fresh `Summary`. Rows that don't decode, or whose
/// amount would overflow the sums, are reported on `warnings` and skipped;
/// only a failure to read the underlying file stops the pass.
pub(crate) fn aggregate<W: Write>(
    categories: &[String],
    rows: Rows,
    warnings: &mut W,
) -> Result<Summary, StoreError> {
    let mut summary = Summary::new(categories);
    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                let line = match e.position() {
                    Some(pos) => format!("line {}", pos.line()),
                    None => "unknown line".to_string(),
                };
                debug!("skipping undecodable row: {e}");
                writeln!(
                    warnings,
                    "Warning: Skipping corrupted row at {line}: not valid UTF-8"
                )?;
                continue;
            }
        };
        match decode_row(&row).and_then(|expense| summary.add(&expense)) {
            Ok(()) => {}
            Err(e) => {
                debug!("skipping row {:?}: {e}", row.position());
                let fields: Vec<&str> = row.iter().collect();
                writeln!(warnings, "Warning: Skipping corrupted row: {fields:?}")?;
            }
        }
    }
    Ok(summary)
}

/// Rounds half away from zero to `dp` places and pads to exactly `dp`.
pub(crate) fn round_to(amount: Decimal, dp: u32) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    rounded
}

#[cfg(test)]
mod tests {
    use super::{aggregate, decode_row, round_to, Summary};
    use crate::{
        data::{Config, Expense, RowError},
        store::read_rows,
    };
    use csv::StringRecord;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn categories() -> Vec<String> {
        Config::default().categories
    }

    fn expense(category: &str, amount: rust_decimal::Decimal) -> Expense {
        Expense {
            date: "2024-05-01 12:00:00".to_string(),
            amount,
            category: category.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_decode_row() {
        let row = StringRecord::from(vec!["2024-05-01 12:00:00", " 12.30 ", "Food", "lunch, late"]);
        assert_eq!(
            decode_row(&row),
            Ok(Expense {
                date: "2024-05-01 12:00:00".to_string(),
                amount: dec!(12.30),
                category: "Food".to_string(),
                description: "lunch, late".to_string(),
            })
        );
    }

    #[test]
    fn test_decode_corrupted() {
        assert_eq!(
            decode_row(&StringRecord::from(vec!["2024-05-01", "ten", "Food", ""])),
            Err(RowError::BadAmount("ten".to_string()))
        );
        assert_eq!(
            decode_row(&StringRecord::from(vec!["2024-05-01", "10", "Food"])),
            Err(RowError::FieldCount(3))
        );
        assert_eq!(
            decode_row(&StringRecord::from(vec!["a", "1", "Food", "b", "c"])),
            Err(RowError::FieldCount(5))
        );
    }

    #[test]
    fn test_summary() {
        let mut summary = Summary::new(&categories());
        summary.add(&expense("Food", dec!(10.00))).unwrap();
        summary.add(&expense("Food", dec!(5.00))).unwrap();
        summary.add(&expense("Transport", dec!(3.00))).unwrap();
        assert_eq!(summary.query("Food"), Some(dec!(15)));
        assert_eq!(summary.query("Transport"), Some(dec!(3)));
        assert_eq!(summary.query("Other"), Some(dec!(0)));
        assert_eq!(summary.total(), dec!(18));
        let lines: Vec<_> = summary
            .breakdown()
            .map(|(name, sum, pct)| (name, sum, round_to(pct.unwrap(), 1)))
            .collect();
        assert_eq!(
            lines,
            [
                ("Food", dec!(15), dec!(83.3)),
                ("Transport", dec!(3), dec!(16.7))
            ]
        );
    }

    #[test]
    fn test_unknown_category_counts_in_total_only() {
        let mut summary = Summary::new(&categories());
        summary.add(&expense("Food", dec!(6))).unwrap();
        summary.add(&expense("Groceries", dec!(2))).unwrap();
        assert_eq!(summary.query("Groceries"), None);
        assert_eq!(summary.total(), dec!(8));
        let lines: Vec<_> = summary
            .breakdown()
            .map(|(name, _, pct)| (name, round_to(pct.unwrap(), 1)))
            .collect();
        assert_eq!(lines, [("Food", dec!(75.0))]);
    }

    #[test]
    fn test_percentage_of_zero_total() {
        let summary = Summary::new(&categories());
        assert_eq!(summary.percentage(dec!(5)), Some(dec!(0)));
        assert_eq!(summary.breakdown().count(), 0);
    }

    #[test]
    fn test_aggregate_skips_corrupted_rows() {
        let csv = b"\
Date,Amount,Category,Description
2024-05-01 12:00:00,10.00,Food,pizza
2024-05-01 12:00:00,oops,Food,broken
2024-05-01 12:00:00,5.00,Food
2024-05-01 12:00:00,5.00,Food,\"multi
line\"
2024-05-01 12:00:00,3.00,Transport,bus
";
        let mut warnings = Vec::new();
        let summary = aggregate(&categories(), read_rows(&csv[..]), &mut warnings).unwrap();
        assert_eq!(summary.query("Food"), Some(dec!(15)));
        assert_eq!(summary.query("Transport"), Some(dec!(3)));
        assert_eq!(summary.total(), dec!(18));
        assert_eq!(
            String::from_utf8(warnings).unwrap(),
            "Warning: Skipping corrupted row: [\"2024-05-01 12:00:00\", \"oops\", \"Food\", \"broken\"]\n\
             Warning: Skipping corrupted row: [\"2024-05-01 12:00:00\", \"5.00\", \"Food\"]\n"
        );
    }

    #[test]
    fn test_overflowing_amount_is_rejected() {
        let mut summary = Summary::new(&categories());
        summary.add(&expense("Food", Decimal::MAX)).unwrap();
        assert_eq!(
            summary.add(&expense("Transport", Decimal::MAX)),
            Err(RowError::Overflow(Decimal::MAX))
        );
        assert_eq!(
            summary.add(&expense("Food", dec!(1))),
            Err(RowError::Overflow(dec!(1)))
        );
        assert_eq!(summary.query("Food"), Some(Decimal::MAX));
        assert_eq!(summary.query("Transport"), Some(dec!(0)));
        assert_eq!(summary.total(), Decimal::MAX);
    }

    #[test]
    fn test_aggregate_skips_overflowing_rows() {
        let csv = b"\
Date,Amount,Category,Description
2024-05-01 12:00:00,79228162514264337593543950335,Food,big
2024-05-01 12:00:00,79228162514264337593543950335,Food,big
2024-05-01 12:00:00,-5,Other,refund
";
        let mut warnings = Vec::new();
        let summary = aggregate(&categories(), read_rows(&csv[..]), &mut warnings).unwrap();
        assert_eq!(summary.query("Food"), Some(Decimal::MAX));
        assert_eq!(summary.query("Other"), Some(dec!(-5)));
        assert_eq!(summary.total(), Decimal::MAX - dec!(5));
        assert_eq!(
            String::from_utf8(warnings).unwrap(),
            "Warning: Skipping corrupted row: [\"2024-05-01 12:00:00\", \"79228162514264337593543950335\", \"Food\", \"big\"]\n"
        );
    }

    #[test]
    fn test_unrepresentable_percentage() {
        let mut summary = Summary::new(&categories());
        summary.add(&expense("Food", dec!(10))).unwrap();
        summary
            .add(&expense("Refund", dec!(-9.999999999999999999999999999)))
            .unwrap();
        assert_eq!(summary.total(), dec!(0.000000000000000000000000001));
        assert_eq!(summary.percentage(dec!(10)), None);
        let lines: Vec<_> = summary.breakdown().collect();
        assert_eq!(lines, [("Food", dec!(10), None)]);
    }

    #[test]
    fn test_aggregate_skips_invalid_utf8() {
        let csv: &'static [u8] = b"\
Date,Amount,Category,Description
2024-05-01 12:00:00,4,Food,caf\xe9
2024-05-01 12:00:00,6,Food,ok
";
        let mut warnings = Vec::new();
        let summary = aggregate(&categories(), read_rows(csv), &mut warnings).unwrap();
        assert_eq!(summary.total(), dec!(6));
        assert_eq!(
            String::from_utf8(warnings).unwrap(),
            "Warning: Skipping corrupted row at line 2: not valid UTF-8\n"
        );
    }

    #[test]
    fn test_aggregate_header_only() {
        let csv = b"Date,Amount,Category,Description\n";
        let mut warnings = Vec::new();
        let summary = aggregate(&categories(), read_rows(&csv[..]), &mut warnings).unwrap();
        assert_eq!(summary, Summary::new(&categories()));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(dec!(75), 1).to_string(), "75.0");
        assert_eq!(round_to(dec!(0.05), 1).to_string(), "0.1");
        assert_eq!(round_to(dec!(2.345), 2).to_string(), "2.35");
        assert_eq!(round_to(dec!(-2.345), 2).to_string(), "-2.35");
    }
}
