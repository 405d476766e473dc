use std::{ops::RangeInclusive, str::FromStr};

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use rust_decimal::Decimal;

use super::{
    normalize::RawSale,
    sale::{Sale, SalesTable},
};

/// Which component comes first in ambiguous dates such as `03/04/2024`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DateOrder {
    DayFirst,
    MonthFirst,
}

// Two-digit year formats go first: `%Y` would happily read `24` as year 24.
const DAY_FIRST: &[&str] = &[
    "%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%d.%m.%y", "%d.%m.%Y",
];
const MONTH_FIRST: &[&str] = &[
    "%m/%d/%y", "%m/%d/%Y", "%m-%d-%y", "%m-%d-%Y", "%m.%d.%y", "%m.%d.%Y",
];
const YEAR_FIRST: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Years a spreadsheet date cell can hold. Dates outside are treated as
/// unparseable.
pub const SPREADSHEET_YEARS: RangeInclusive<i32> = 1900..=9999;

/// Coerce normalized rows into [`Sale`]s.
///
/// Blank rows go first, then values are coerced (bad dates and numbers become
/// missing), then rows without a customer or a total are dropped and finally
/// exact duplicates are removed, keeping the first occurrence.
pub fn clean(rows: impl IntoIterator<Item = RawSale>) -> SalesTable {
    rows.into_iter()
        .filter(|row| !row.is_blank())
        .filter_map(|row| {
            let customer = title_case(row.customer.trim());
            let total = parse_decimal(&row.total);

            if customer.is_empty() {
                return None;
            }

            Some(Sale {
                date: parse_date(&row.date, DateOrder::DayFirst),
                customer,
                product: title_case(row.product.trim()),
                quantity: parse_decimal(&row.quantity),
                total: total?,
            })
        })
        .unique()
        .collect()
}

/// Upper-case the first letter of every word and lower-case the rest. A word
/// is any run of letters, so `o'neil` becomes `O'Neil`.
pub fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            titled.push(c);
            in_word = false;
        }
    }

    titled
}

/// Parse a number written with either `.` or `,` as decimal separator.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    parse_number(&value.replace(',', "."))
}

/// Parse a plain or scientific (`1e3`) number, surrounding whitespace
/// allowed.
pub fn parse_number(value: &str) -> Option<Decimal> {
    let value = value.trim();

    if value.is_empty() {
        return None;
    }

    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

/// Parse a calendar date, ignoring any time of day that follows it.
///
/// ISO dates (`2024-01-31`) are always read year-first. Otherwise `order`
/// decides, falling back to the other order when the preferred one can't
/// produce a valid date (`13/01/2024` read month-first). Years outside
/// [`SPREADSHEET_YEARS`] (`01/02/202`) count as unparseable.
pub fn parse_date(value: &str, order: DateOrder) -> Option<NaiveDate> {
    let token = value.split_whitespace().next()?;
    let token = token.split('T').next().unwrap_or(token);

    let formats: Vec<&str> = if token.find(|c: char| matches!(c, '-' | '/' | '.')) == Some(4) {
        YEAR_FIRST.to_vec()
    } else {
        match order {
            DateOrder::DayFirst => DAY_FIRST.iter().chain(MONTH_FIRST).copied().collect(),
            DateOrder::MonthFirst => MONTH_FIRST.iter().chain(DAY_FIRST).copied().collect(),
        }
    };

    formats
        .into_iter()
        .find_map(|format| NaiveDate::parse_from_str(token, format).ok())
        .filter(|date| SPREADSHEET_YEARS.contains(&date.year()))
}
