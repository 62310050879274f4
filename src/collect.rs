use crate::data::{parse_decimal, Config, Expense, ValidationError};
use chrono::Local;
use log::debug;
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};

/// Line-oriented prompt/answer over any pair of streams.
pub(crate) struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Shows `text` and blocks for one line of input, returned without its
    /// line terminator. Running out of input is an `UnexpectedEof` error.
    pub fn prompt(&mut self, text: &str) -> io::Result<String> {
        write!(self.output, "{text}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    /// Prompts again and again until `validate` accepts the answer,
    /// printing each rejection.
    pub fn prompt_until<T, F>(&mut self, text: &str, mut validate: F) -> io::Result<T>
    where
        F: FnMut(&str) -> Result<T, ValidationError>,
    {
        loop {
            let line = self.prompt(text)?;
            match validate(&line) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!("rejected {line:?}: {e:?}");
                    writeln!(self.output, "{e}")?;
                }
            }
        }
    }
}

/// An amount must be a number strictly greater than zero.
pub(crate) fn parse_amount(text: &str) -> Result<Decimal, ValidationError> {
    let amount = parse_decimal(text).ok_or(ValidationError::NotANumber)?;
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NotPositive);
    }
    Ok(amount)
}

/// Maps a 1-based menu number onto its category label.
pub(crate) fn parse_category<'a>(
    text: &str,
    categories: &'a [String],
) -> Result<&'a str, ValidationError> {
    let choice: i64 = text
        .trim()
        .parse()
        .map_err(|_| ValidationError::NotANumber)?;
    if choice < 1 {
        return Err(ValidationError::OutOfRange);
    }
    categories
        .get(choice as usize - 1)
        .map(String::as_str)
        .ok_or(ValidationError::OutOfRange)
}

/// Asks for the parts of a new expense.
#[derive(Debug, Clone)]
pub(crate) struct Collector {
    categories: Vec<String>,
}

impl Collector {
    pub fn new(config: &Config) -> Self {
        Self {
            categories: config.categories.clone(),
        }
    }

    pub fn collect_amount<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> io::Result<Decimal> {
        console.prompt_until("Enter amount (e.g., 50.75): ", parse_amount)
    }

    pub fn collect_category<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> io::Result<String> {
        writeln!(console.output(), "\nAvailable Categories:")?;
        for (i, category) in self.categories.iter().enumerate() {
            writeln!(console.output(), "  {}. {category}", i + 1)?;
        }
        let text = format!("Enter category number (1-{}): ", self.categories.len());
        console.prompt_until(&text, |line| {
            parse_category(line, &self.categories).map(str::to_string)
        })
    }

    pub fn collect_description<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> io::Result<String> {
        console.prompt("Enter a brief description (e.g., Coffee, Bus fare): ")
    }

    /// Amount, category and description from the console, stamped with the
    /// current local time.
    pub fn collect_expense<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> io::Result<Expense> {
        let amount = self.collect_amount(console)?;
        let category = self.collect_category(console)?;
        let description = self.collect_description(console)?;
        Ok(Expense::new(
            Local::now().naive_local(),
            amount,
            &category,
            &description,
        ))
    }
}
