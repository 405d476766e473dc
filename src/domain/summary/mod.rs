use std::cmp::Ordering;

use itertools::Itertools;
use rust_decimal::Decimal;

use super::{
    error::{Error, Result},
    sale::{Field, Sale, SalesTable},
};

/// What a summary groups sales by.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Dimension {
    Customer,
    Product,
    Month,
}

impl Dimension {
    pub const MONTH_HEADER: &'static str = "AnoMes";

    pub fn header(self) -> &'static str {
        match self {
            Dimension::Customer => Field::Customer.header(),
            Dimension::Product => Field::Product.header(),
            Dimension::Month => Self::MONTH_HEADER,
        }
    }

    fn key(self, sale: &Sale) -> Option<String> {
        match self {
            Dimension::Customer => Some(sale.customer.clone()),
            Dimension::Product => Some(sale.product.clone()).filter(|p| !p.is_empty()),
            Dimension::Month => sale.month(),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SummaryRow {
    pub key: String,
    pub total: Decimal,
}

/// Sum of `Total` per key of one [`Dimension`].
#[derive(Debug, PartialEq, Clone)]
pub struct SummaryTable {
    dimension: Dimension,
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Group `sales` by `dimension` and sum their totals.
    ///
    /// Sales without a key for the dimension (no date for [`Dimension::Month`],
    /// no product for [`Dimension::Product`]) are left out. Months are sorted
    /// ascending, everything else by total descending with ties broken by key.
    /// Fails with [`Error::TotalOverflow`] when a key's total can't be
    /// represented.
    pub fn new(sales: &SalesTable, dimension: Dimension) -> Result<Self> {
        let totals = sales
            .iter()
            .filter_map(|sale| dimension.key(sale).map(|key| (key, sale.total)))
            .into_grouping_map()
            .fold(Some(Decimal::ZERO), |sum, _key, total| {
                sum.and_then(|sum| sum.checked_add(total))
            });

        let rows: Vec<SummaryRow> = totals
            .into_iter()
            .map(|(key, total)| match total {
                Some(total) => Ok(SummaryRow { key, total }),
                None => Err(Error::TotalOverflow {
                    dimension: dimension.header(),
                    key,
                }),
            })
            .collect::<Result<_>>()?;

        let rows = rows
            .into_iter()
            .sorted_by(|a, b| match dimension {
                Dimension::Month => a.key.cmp(&b.key),
                Dimension::Customer | Dimension::Product => Self::by_total_desc(a, b),
            })
            .collect();

        Ok(Self { dimension, rows })
    }

    fn by_total_desc(a: &SummaryRow, b: &SummaryRow) -> Ordering {
        b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key))
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The three summaries of the monthly report.
#[derive(Debug, PartialEq, Clone)]
pub struct Summaries {
    pub by_customer: SummaryTable,
    pub by_product: SummaryTable,
    pub by_month: SummaryTable,
}

impl Summaries {
    pub fn from_sales(sales: &SalesTable) -> Result<Self> {
        Ok(Self {
            by_customer: SummaryTable::new(sales, Dimension::Customer)?,
            by_product: SummaryTable::new(sales, Dimension::Product)?,
            by_month: SummaryTable::new(sales, Dimension::Month)?,
        })
    }
}
