use std::collections::{hash_map::Entry, HashMap};

use tracing::warn;

use super::{
    error::{Error, Result},
    raw::RawTable,
    sale::Field,
};

/// Lower-case header spellings mapped to the canonical column they stand for.
#[derive(Debug, Clone, PartialEq)]
pub struct SynonymTable {
    synonyms: HashMap<String, Field>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        let synonyms = [
            ("data", Field::Date),
            ("cliente", Field::Customer),
            ("produto", Field::Product),
            ("quantidade", Field::Quantity),
            ("qtd", Field::Quantity),
            ("total", Field::Total),
            ("valor", Field::Total),
        ]
        .into_iter()
        .map(|(synonym, field)| (synonym.to_string(), field))
        .collect();

        Self { synonyms }
    }
}

impl SynonymTable {
    /// Add (or override) one synonym. Matching is case-insensitive.
    pub fn insert(&mut self, synonym: &str, field: Field) {
        self.synonyms.insert(synonym.trim().to_lowercase(), field);
    }

    pub fn resolve(&self, header: &str) -> Option<Field> {
        self.synonyms.get(&header.trim().to_lowercase()).copied()
    }

    /// Trim every header and rename the ones with a known synonym. Unknown
    /// headers are kept, trimmed.
    pub fn rename_headers(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|header| match self.resolve(header) {
                Some(field) => field.header().to_string(),
                None => header.trim().to_string(),
            })
            .collect()
    }
}

/// The five retained columns of a row, values still untouched text.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct RawSale {
    pub date: String,
    pub customer: String,
    pub product: String,
    pub quantity: String,
    pub total: String,
}

impl RawSale {
    pub fn is_blank(&self) -> bool {
        [
            &self.date,
            &self.customer,
            &self.product,
            &self.quantity,
            &self.total,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }
}

/// Map a table onto the canonical columns, dropping every other column.
///
/// Fails with [`Error::MissingColumns`] when any canonical column has no
/// matching header. If two headers map to the same column the first one wins.
pub fn normalize(table: &RawTable, synonyms: &SynonymTable) -> Result<Vec<RawSale>> {
    let mut positions = HashMap::new();

    for (index, header) in table.headers().iter().enumerate() {
        let Some(field) = synonyms.resolve(header) else {
            continue;
        };

        match positions.entry(field) {
            Entry::Vacant(entry) => {
                entry.insert(index);
            }
            Entry::Occupied(_) => {
                warn!(column = %header, %field, "ignoring duplicate column");
            }
        }
    }

    let missing: Vec<Field> = Field::ALL
        .into_iter()
        .filter(|field| !positions.contains_key(field))
        .collect();

    if !missing.is_empty() {
        return Err(Error::MissingColumns {
            original: table.headers().to_vec(),
            normalized: synonyms.rename_headers(table.headers()),
            missing,
        });
    }

    let value = |row: &[String], field: Field| row[positions[&field]].clone();

    Ok(table
        .rows()
        .iter()
        .map(|row| RawSale {
            date: value(row, Field::Date),
            customer: value(row, Field::Customer),
            product: value(row, Field::Product),
            quantity: value(row, Field::Quantity),
            total: value(row, Field::Total),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn renames_messy_headers() {
        let headers = strings(&["data", "Cliente ", "PRODUTO", "qtd", "valor"]);

        assert_eq!(
            SynonymTable::default().rename_headers(&headers),
            ["Data", "Cliente", "Produto", "Quantidade", "Total"]
        );
    }

    #[test]
    fn renaming_canonical_headers_is_a_no_op() {
        let synonyms = SynonymTable::default();
        let canonical = strings(&["Data", "Cliente", "Produto", "Quantidade", "Total"]);

        assert_eq!(synonyms.rename_headers(&canonical), canonical);
    }

    #[test]
    fn unknown_headers_are_kept_trimmed() {
        let headers = strings(&[" Vendedor ", "valor"]);

        assert_eq!(
            SynonymTable::default().rename_headers(&headers),
            ["Vendedor", "Total"]
        );
    }

    #[test]
    fn inserted_synonyms_are_case_insensitive() {
        let mut synonyms = SynonymTable::default();
        synonyms.insert("Montante", Field::Total);

        assert_eq!(synonyms.resolve("  MONTANTE"), Some(Field::Total));
        assert_eq!(synonyms.resolve("vendedor"), None);
    }

    #[test]
    fn keeps_only_canonical_columns() {
        let table = RawTable::new(
            strings(&["Vendedor", "valor", "data", "cliente", "qtd", "produto"]),
            vec![strings(&["Rui", "10,5", "01/02/2024", "ana", "2", "caneta"])],
        );

        let rows = normalize(&table, &SynonymTable::default()).unwrap();

        assert_eq!(
            rows,
            [RawSale {
                date: "01/02/2024".to_string(),
                customer: "ana".to_string(),
                product: "caneta".to_string(),
                quantity: "2".to_string(),
                total: "10,5".to_string(),
            }]
        );
    }

    #[test]
    fn first_duplicate_column_wins() {
        let table = RawTable::new(
            strings(&["data", "cliente", "produto", "qtd", "quantidade", "total"]),
            vec![strings(&["", "ana", "caneta", "1", "9", "5"])],
        );

        let rows = normalize(&table, &SynonymTable::default()).unwrap();

        assert_eq!(rows[0].quantity, "1");
    }

    #[test]
    fn reports_missing_columns_with_context() {
        let table = RawTable::new(strings(&["data", "Cliente ", "qtd"]), vec![]);

        let err = normalize(&table, &SynonymTable::default()).unwrap_err();

        assert_eq!(
            err,
            Error::MissingColumns {
                original: strings(&["data", "Cliente ", "qtd"]),
                normalized: strings(&["Data", "Cliente", "Quantidade"]),
                missing: vec![Field::Product, Field::Total],
            }
        );
        assert!(err.to_string().contains("Produto, Total"));
    }

    #[test]
    fn blank_rows_are_detected() {
        assert!(RawSale::default().is_blank());
        assert!(RawSale {
            total: "  ".to_string(),
            ..Default::default()
        }
        .is_blank());
        assert!(!RawSale {
            product: "caneta".to_string(),
            ..Default::default()
        }
        .is_blank());
    }
}
