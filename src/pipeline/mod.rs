use std::path::PathBuf;

use tracing::{info, warn};

use crate::{
    config::Config,
    csv,
    domain::{clean::clean, normalize::normalize, sale::SalesTable, summary::Summaries},
    error::Result,
    export::{self, Sheet},
    xlsx,
};

pub const CLEAN_DATA_SHEET: &str = "Dados_Limpos";
pub const CUSTOMER_SHEET: &str = "Resumo_Clientes";
pub const PRODUCT_SHEET: &str = "Resumo_Produtos";
pub const MONTHLY_SHEET: &str = "Resumo_Mensal";

/// Merge every workbook of the input directory and write the yearly report
/// with per customer, per product and per month totals.
///
/// Returns the path of the written report.
pub fn merge_monthly(config: &Config) -> Result<PathBuf> {
    let input_dir = config.resolve(&config.merge.input_dir);
    info!(dir = %input_dir.display(), "merging workbooks");

    let sales = xlsx::merge_dir(&input_dir, &config.merge.extension)?;
    info!(rows = sales.len(), "merged rows");

    let output = config.resolve(&config.merge.output);
    export::write(&output, &monthly_report(&sales)?)?;

    info!(path = %output.display(), "report created");
    Ok(output)
}

pub fn monthly_report(sales: &SalesTable) -> Result<Vec<Sheet>> {
    let summaries = Summaries::from_sales(sales)?;
    if summaries.by_customer.is_empty() {
        warn!("no sales to summarize");
    }

    Ok(vec![
        Sheet::sales_with_month(CLEAN_DATA_SHEET, sales),
        Sheet::summary(CUSTOMER_SHEET, &summaries.by_customer),
        Sheet::summary(PRODUCT_SHEET, &summaries.by_product),
        Sheet::summary(MONTHLY_SHEET, &summaries.by_month),
    ])
}

/// Clean a raw CSV export and write it as a single-sheet workbook.
///
/// Returns the path of the written workbook.
pub fn clean_export(config: &Config) -> Result<PathBuf> {
    let input = config.resolve(&config.export.input);
    info!(path = %input.display(), "reading raw export");

    let (raw, _) = csv::read(&input)?;
    info!(rows = raw.len(), "raw rows");

    let sales = clean(normalize(&raw, &config.synonym_table())?);
    info!(rows = sales.len(), "rows after cleaning");

    let output = config.resolve(&config.export.output);
    export::write(&output, &[Sheet::sales(CLEAN_DATA_SHEET, &sales)])?;

    info!(path = %output.display(), "clean file created");
    Ok(output)
}
