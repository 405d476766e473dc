use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

#[cfg(test)]
use super::raw::RawTable;

/// The five columns every report is built from.
#[derive(Debug, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Field {
    #[serde(rename = "Data", alias = "date")]
    Date,
    #[serde(rename = "Cliente", alias = "customer")]
    Customer,
    #[serde(rename = "Produto", alias = "product")]
    Product,
    #[serde(rename = "Quantidade", alias = "quantity")]
    Quantity,
    #[serde(rename = "Total", alias = "total")]
    Total,
}

impl Field {
    /// Schema order, which is also the column order of every exported table.
    pub const ALL: [Field; 5] = [
        Field::Date,
        Field::Customer,
        Field::Product,
        Field::Quantity,
        Field::Total,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Field::Date => "Data",
            Field::Customer => "Cliente",
            Field::Product => "Produto",
            Field::Quantity => "Quantidade",
            Field::Total => "Total",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// A cleaned sale line.
///
/// `customer` is never empty and `total` is always present; rows that can't
/// satisfy this are dropped while cleaning rather than repaired.
#[derive(Debug, Hash, PartialEq, Eq, Clone)]
pub struct Sale {
    pub date: Option<NaiveDate>,
    pub customer: String,
    pub product: String,
    pub quantity: Option<Decimal>,
    pub total: Decimal,
}

impl Sale {
    /// Year-month key (`YYYY-MM`) used by the monthly summary.
    pub fn month(&self) -> Option<String> {
        self.date.map(|date| date.format("%Y-%m").to_string())
    }
}

/// Sales in input order.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct SalesTable {
    sales: Vec<Sale>,
}

impl SalesTable {
    pub fn len(&self) -> usize {
        self.sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sale> {
        self.sales.iter()
    }

    /// Render the table back to raw text with canonical headers, in the shape
    /// a CSV export of it would have.
    #[cfg(test)]
    pub fn to_raw(&self) -> RawTable {
        let headers = Field::ALL.iter().map(|f| f.header().to_string()).collect();
        let rows = self
            .sales
            .iter()
            .map(|sale| {
                vec![
                    sale.date
                        .map(|d| d.format("%d/%m/%Y").to_string())
                        .unwrap_or_default(),
                    sale.customer.clone(),
                    sale.product.clone(),
                    sale.quantity.map(|q| q.to_string()).unwrap_or_default(),
                    sale.total.to_string(),
                ]
            })
            .collect();

        RawTable::new(headers, rows)
    }
}

impl From<Vec<Sale>> for SalesTable {
    fn from(sales: Vec<Sale>) -> Self {
        Self { sales }
    }
}

impl FromIterator<Sale> for SalesTable {
    fn from_iter<I: IntoIterator<Item = Sale>>(iter: I) -> Self {
        Self {
            sales: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SalesTable {
    type Item = Sale;
    type IntoIter = std::vec::IntoIter<Sale>;

    fn into_iter(self) -> Self::IntoIter {
        self.sales.into_iter()
    }
}
