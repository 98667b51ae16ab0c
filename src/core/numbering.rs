use chrono::{Datelike, NaiveDate};

use super::error::BillingError;

/// Human-readable reference generator.
///
/// Two shapes are supported:
/// - plain: `{prefix}{sequential}`, e.g. "SUB-00001" (subscription references)
/// - yearly: `{prefix}{year}-{sequential}`, e.g. "INV-2024-001" (invoice numbers),
///   restarting at 1 every year.
#[derive(Debug, Clone)]
pub struct ReferenceSequence {
    prefix: String,
    year: Option<i32>,
    next_number: u64,
    zero_pad: usize,
}

impl ReferenceSequence {
    /// A plain sequence starting at 1, padded to 5 digits.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            year: None,
            next_number: 1,
            zero_pad: 5,
        }
    }

    /// A yearly sequence starting at 1, padded to 3 digits.
    pub fn yearly(prefix: impl Into<String>, year: i32) -> Self {
        Self {
            prefix: prefix.into(),
            year: Some(year),
            next_number: 1,
            zero_pad: 3,
        }
    }

    /// Continue from a given number.
    pub fn starting_at(mut self, next_number: u64) -> Self {
        self.next_number = next_number;
        self
    }

    /// Set zero-padding width.
    pub fn with_padding(mut self, width: usize) -> Self {
        self.zero_pad = width;
        self
    }

    fn format(&self, num: u64) -> String {
        match self.year {
            Some(year) => format!(
                "{}{}-{:0>width$}",
                self.prefix,
                year,
                num,
                width = self.zero_pad
            ),
            None => format!("{}{:0>width$}", self.prefix, num, width = self.zero_pad),
        }
    }

    /// Generate the next reference.
    pub fn next_reference(&mut self) -> String {
        let num = self.next_number;
        self.next_number += 1;
        self.format(num)
    }

    /// Preview the next reference without consuming it.
    pub fn peek(&self) -> String {
        self.format(self.next_number)
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    /// Move a yearly sequence to a later year, resetting the counter.
    pub fn advance_year(&mut self, new_year: i32) -> Result<(), BillingError> {
        match self.year {
            None => Err(BillingError::Builder(
                "a plain sequence has no year to advance".into(),
            )),
            Some(current) if new_year <= current => Err(BillingError::Builder(format!(
                "new year {new_year} must be greater than current year {current}"
            ))),
            Some(_) => {
                self.year = Some(new_year);
                self.next_number = 1;
                Ok(())
            }
        }
    }

    /// Advance a yearly sequence if `date` falls in a later year.
    /// Returns true if the year changed.
    pub fn auto_advance(&mut self, date: NaiveDate) -> bool {
        match self.year {
            Some(current) if date.year() > current => {
                self.year = Some(date.year());
                self.next_number = 1;
                true
            }
            _ => false,
        }
    }
}
