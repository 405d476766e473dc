/// A table exactly as read from a source file: untrusted headers and
/// untrusted text values.
///
/// Every row has one value per header.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Rows shorter than the header are padded with empty values, longer ones
    /// are truncated.
    pub fn new(headers: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        for row in &mut rows {
            row.resize(headers.len(), String::new());
        }

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
