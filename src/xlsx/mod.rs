use std::{
    io,
    path::{Path, PathBuf},
};

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use chrono::{Datelike, NaiveDate};
use glob::Pattern;
use rust_decimal::{prelude::FromPrimitive, Decimal};
use tracing::{info, warn};

use crate::{
    domain::{
        clean::{parse_date, parse_number, DateOrder, SPREADSHEET_YEARS},
        error::Error as SchemaError,
        sale::{Field, Sale, SalesTable},
    },
    error::{Error, Result},
};

/// Load every `*.<extension>` workbook in `dir` and concatenate their rows.
///
/// Each workbook must carry the canonical headers verbatim. Files are read
/// in name order and all of them are validated before anything is returned.
pub fn merge_dir(dir: &Path, extension: &str) -> Result<SalesTable> {
    if !dir.is_dir() {
        return Err(Error::NotFound(dir.to_path_buf()));
    }

    let files = discover(dir, extension)?;
    info!(
        dir = %dir.display(),
        files = ?files.iter().filter_map(|f| f.file_name()).collect::<Vec<_>>(),
        "found input files"
    );

    if files.is_empty() {
        return Err(Error::NoInputFiles {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    let mut sales = Vec::new();
    for file in &files {
        sales.extend(read_workbook(file)?);
    }

    Ok(SalesTable::from(sales))
}

fn discover(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(extension)
    );

    let entries = glob::glob(&pattern)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| err.into_error())?;
        if path.is_file() {
            files.push(path);
        }
    }

    Ok(files)
}

/// Read the first sheet of one workbook. The first row holds the headers.
fn read_workbook(path: &Path) -> Result<Vec<Sale>> {
    info!(file = %path.display(), "reading workbook");

    let spreadsheet_error = |source| Error::SpreadsheetError {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(spreadsheet_error)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(spreadsheet_error)?,
        None => Range::empty(),
    };

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default();

    let columns = Field::ALL.map(|field| headers.iter().position(|h| h == field.header()));
    let missing: Vec<Field> = Field::ALL
        .into_iter()
        .zip(columns)
        .filter_map(|(field, column)| column.is_none().then_some(field))
        .collect();

    if !missing.is_empty() {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        return Err(SchemaError::MissingMandatoryColumns { file, missing }.into());
    }

    let [date_col, customer_col, product_col, quantity_col, total_col] =
        columns.map(|c| c.unwrap_or_default());
    let cell = |row: &[Data], column: usize| row.get(column).cloned().unwrap_or(Data::Empty);

    let mut sales = Vec::new();
    let mut dropped = 0;

    for row in rows {
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }

        let customer = cell_text(&cell(row, customer_col));
        let Some(total) = cell_decimal(&cell(row, total_col)) else {
            dropped += 1;
            continue;
        };
        if customer.trim().is_empty() {
            dropped += 1;
            continue;
        }

        sales.push(Sale {
            date: cell_date(&cell(row, date_col)),
            customer,
            product: cell_text(&cell(row, product_col)),
            quantity: cell_decimal(&cell(row, quantity_col)),
            total,
        });
    }

    if dropped > 0 {
        warn!(file = %path.display(), dropped, "rows without customer or total");
    }

    Ok(sales)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

fn cell_decimal(cell: &Data) -> Option<Decimal> {
    match cell {
        Data::Int(i) => Some(Decimal::from(*i)),
        Data::Float(f) => Decimal::from_f64(*f),
        Data::String(s) => parse_number(s),
        _ => None,
    }
}

fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::String(s) => parse_date(s, DateOrder::MonthFirst),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .filter(|date| SPREADSHEET_YEARS.contains(&date.year())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    use super::*;

    enum Value {
        Text(&'static str),
        Number(f64),
        Date(u16, u8, u8),
    }

    use Value::*;

    const HEADERS: [&str; 5] = ["Data", "Cliente", "Produto", "Quantidade", "Total"];

    fn write_fixture(path: &Path, headers: &[&str], rows: &[Vec<Value>]) {
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header).unwrap();
        }
        for (index, row) in rows.iter().enumerate() {
            let r = index as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                let c = col as u16;
                match value {
                    Text(s) => sheet.write_string(r, c, *s).map(|_| ()),
                    Number(n) => sheet.write_number(r, c, *n).map(|_| ()),
                    Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
                        sheet
                            .write_datetime_with_format(r, c, &date, &date_format)
                            .map(|_| ())
                    }
                }
                .unwrap();
            }
        }

        workbook.save(path).unwrap();
    }

    fn sale_row(date: Value, customer: &'static str, total: f64) -> Vec<Value> {
        vec![date, Text(customer), Text("Caneta"), Number(1.0), Number(total)]
    }

    #[test]
    fn concatenates_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            &dir.path().join("2024-02.xlsx"),
            &HEADERS,
            &[sale_row(Date(2024, 2, 10), "Rui", 30.0)],
        );
        write_fixture(
            &dir.path().join("2024-01.xlsx"),
            &HEADERS,
            &[
                sale_row(Text("2024-01-15"), "Ana", 100.0),
                sale_row(Text("01/20/2024"), "Bia", 2.5),
            ],
        );
        std::fs::write(dir.path().join("notas.csv"), "ignored").unwrap();

        let table = merge_dir(dir.path(), "xlsx").unwrap();

        let sales: Vec<_> = table.into_iter().collect();
        let customers: Vec<_> = sales.iter().map(|s| s.customer.as_str()).collect();
        assert_eq!(customers, ["Ana", "Bia", "Rui"]);
        assert_eq!(sales[0].date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(sales[1].date, NaiveDate::from_ymd_opt(2024, 1, 20));
        assert_eq!(sales[2].date, NaiveDate::from_ymd_opt(2024, 2, 10));
        assert_eq!(sales[1].total, dec!(2.5));
        assert_eq!(sales[0].quantity, Some(dec!(1)));
        assert_eq!(sales[0].product, "Caneta");
    }

    #[test]
    fn file_missing_a_column_fails_the_whole_merge() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            &dir.path().join("a.xlsx"),
            &HEADERS,
            &[sale_row(Text("2024-01-15"), "Ana", 100.0)],
        );
        write_fixture(
            &dir.path().join("b.xlsx"),
            &HEADERS[..4],
            &[vec![Text("2024-01-16"), Text("Rui"), Text("Lapis"), Number(2.0)]],
        );

        let err = merge_dir(dir.path(), "xlsx").unwrap_err();

        match err {
            Error::SchemaError(SchemaError::MissingMandatoryColumns { file, missing }) => {
                assert_eq!(file, "b.xlsx");
                assert_eq!(missing, [Field::Total]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn headers_must_match_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            &dir.path().join("vendas.xlsx"),
            &["Data", "Cliente ", "Produto", "Quantidade", "total"],
            &[],
        );

        let err = merge_dir(dir.path(), "xlsx").unwrap_err();

        assert!(matches!(
            err,
            Error::SchemaError(SchemaError::MissingMandatoryColumns { ref missing, .. })
                if missing == &[Field::Customer, Field::Total]
        ));
    }

    #[test]
    fn header_only_file_gives_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(&dir.path().join("vazio.xlsx"), &HEADERS, &[]);

        let table = merge_dir(dir.path(), "xlsx").unwrap();

        assert!(table.is_empty());
    }

    #[test]
    fn rows_without_customer_or_total_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            &dir.path().join("vendas.xlsx"),
            &HEADERS,
            &[
                sale_row(Text("2024-01-15"), "Ana", 10.0),
                vec![Text("2024-01-15"), Text(""), Text("Caneta"), Number(1.0), Number(5.0)],
                vec![Text("2024-01-15"), Text("Rui"), Text("Caneta"), Number(1.0), Text("n/a")],
            ],
        );

        let table = merge_dir(dir.path(), "xlsx").unwrap();

        assert_eq!(table.len(), 1);
    }

    #[test]
    fn no_matching_files_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vendas.csv"), "a,b").unwrap();

        let err = merge_dir(dir.path(), "xlsx").unwrap_err();
        assert!(matches!(err, Error::NoInputFiles { .. }));
        assert!(err.is_not_found());

        let err = merge_dir(&dir.path().join("dados_brutos"), "xlsx").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn text_cells_take_scientific_numbers_and_skip_old_dates() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(
            &dir.path().join("vendas.xlsx"),
            &HEADERS,
            &[vec![Text("1850-03-01"), Text("Ana"), Text("Caneta"), Text("2"), Text("1e3")]],
        );

        let sales: Vec<_> = merge_dir(dir.path(), "xlsx").unwrap().into_iter().collect();

        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].total, dec!(1000));
        assert_eq!(sales[0].quantity, Some(dec!(2)));
        assert_eq!(sales[0].date, None);
    }
}
