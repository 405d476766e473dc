use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use tracing::info;

use crate::{
    domain::{
        clean::SPREADSHEET_YEARS,
        sale::{Field, SalesTable},
        summary::{Dimension, SummaryTable},
    },
    error::Result,
};

#[derive(Debug, PartialEq, Clone)]
pub enum Cell {
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
    Empty,
}

impl From<Option<Decimal>> for Cell {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Cell::Empty, Cell::Number)
    }
}

impl From<Option<NaiveDate>> for Cell {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(Cell::Empty, Cell::Date)
    }
}

/// One named worksheet: a header row followed by data rows.
#[derive(Debug, PartialEq, Clone)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Sales in canonical column order.
    pub fn sales(name: &str, sales: &SalesTable) -> Self {
        let rows = sales
            .iter()
            .map(|sale| {
                vec![
                    sale.date.into(),
                    Cell::Text(sale.customer.clone()),
                    Cell::Text(sale.product.clone()),
                    sale.quantity.into(),
                    Cell::Number(sale.total),
                ]
            })
            .collect();

        Self {
            name: name.to_string(),
            columns: Field::ALL.iter().map(|f| f.header().to_string()).collect(),
            rows,
        }
    }

    /// Like [`Sheet::sales`] with the derived year-month column appended.
    pub fn sales_with_month(name: &str, sales: &SalesTable) -> Self {
        let mut sheet = Self::sales(name, sales);
        sheet.columns.push(Dimension::MONTH_HEADER.to_string());
        for (row, sale) in sheet.rows.iter_mut().zip(sales.iter()) {
            row.push(sale.month().map_or(Cell::Empty, Cell::Text));
        }
        sheet
    }

    pub fn summary(name: &str, summary: &SummaryTable) -> Self {
        Self {
            name: name.to_string(),
            columns: vec![
                summary.dimension().header().to_string(),
                Field::Total.header().to_string(),
            ],
            rows: summary
                .rows()
                .iter()
                .map(|row| vec![Cell::Text(row.key.clone()), Cell::Number(row.total)])
                .collect(),
        }
    }
}

/// Write `sheets` to a new workbook at `path`, in order.
///
/// The workbook is assembled in memory and only touches the disk once every
/// sheet is written.
pub fn write(path: &Path, sheets: &[Sheet]) -> Result<()> {
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let mut workbook = Workbook::new();

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, column) in sheet.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, column, &header_format)?;
        }

        for (index, row) in sheet.rows.iter().enumerate() {
            for (col, cell) in row.iter().enumerate() {
                write_cell(worksheet, index as u32 + 1, col as u16, cell, &date_format)?;
            }
        }
    }

    workbook.save(path)?;
    info!(path = %path.display(), sheets = sheets.len(), "workbook written");

    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    date_format: &Format,
) -> Result<()> {
    match cell {
        Cell::Text(text) => {
            worksheet.write_string(row, col, text)?;
        }
        Cell::Number(number) => {
            if let Some(number) = number.to_f64() {
                worksheet.write_number(row, col, number)?;
            }
        }
        Cell::Date(date) => {
            // Out of spreadsheet range, left blank.
            if !SPREADSHEET_YEARS.contains(&date.year()) {
                return Ok(());
            }

            let date = ExcelDateTime::from_ymd(
                date.year() as u16,
                date.month() as u8,
                date.day() as u8,
            )?;
            worksheet.write_datetime_with_format(row, col, &date, date_format)?;
        }
        Cell::Empty => {}
    }

    Ok(())
}
