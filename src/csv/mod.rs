use std::{borrow::Cow, fmt, fs, io, path::Path};

use csv::ReaderBuilder;
use encoding_rs::{mem::decode_latin1, UTF_8, WINDOWS_1252};
use itertools::iproduct;
use tracing::{debug, info, warn};

use crate::{
    domain::raw::RawTable,
    error::{Error, Result},
};

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Delimiters tried, in order.
pub const DELIMITERS: [u8; 2] = [b';', b','];

/// Text encodings tried for each delimiter, in order.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

impl TextEncoding {
    pub const CANDIDATES: [TextEncoding; 3] = [
        TextEncoding::Utf8,
        TextEncoding::Latin1,
        TextEncoding::Windows1252,
    ];

    /// Decode `bytes`, or `None` when they are not valid in this encoding.
    /// A leading UTF-8 byte order mark is dropped.
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            TextEncoding::Utf8 => UTF_8.decode_without_bom_handling_and_without_replacement(
                bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes),
            ),
            TextEncoding::Latin1 => Some(decode_latin1(bytes)),
            TextEncoding::Windows1252 => {
                WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes)
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Latin1 => "latin-1",
            TextEncoding::Windows1252 => "cp1252",
        })
    }
}

/// One delimiter/encoding combination.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Dialect {
    pub delimiter: u8,
    pub encoding: TextEncoding,
}

/// Every dialect in the order they are tried: each delimiter with every
/// encoding before moving on to the next delimiter.
pub fn candidates() -> impl Iterator<Item = Dialect> {
    iproduct!(DELIMITERS, TextEncoding::CANDIDATES)
        .map(|(delimiter, encoding)| Dialect { delimiter, encoding })
}

/// How a file ended up being read.
#[derive(Debug, PartialEq, Clone)]
pub struct Detection {
    pub dialect: Dialect,
    /// No candidate produced more than one column and the lenient comma/UTF-8
    /// parse was used instead.
    pub fallback: bool,
    pub columns: Vec<String>,
}

/// Read a raw CSV export whose delimiter and encoding are unknown.
pub fn read(path: &Path) -> Result<(RawTable, Detection)> {
    let bytes = fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
        _ => err.into(),
    })?;

    let (table, detection) = detect(&bytes)?;

    info!(
        path = %path.display(),
        delimiter = %char::from(detection.dialect.delimiter),
        encoding = %detection.dialect.encoding,
        fallback = detection.fallback,
        columns = ?detection.columns,
        "read raw export"
    );

    Ok((table, detection))
}

/// Try every [`candidates`] dialect and keep the first one that splits the
/// header into more than one column.
pub fn detect(bytes: &[u8]) -> Result<(RawTable, Detection)> {
    for dialect in candidates() {
        let Some(text) = dialect.encoding.decode(bytes) else {
            debug!(encoding = %dialect.encoding, "not valid in encoding");
            continue;
        };

        match parse(&text, dialect.delimiter, true) {
            Ok(table) if table.headers().len() > 1 => {
                let detection = Detection {
                    dialect,
                    fallback: false,
                    columns: table.headers().to_vec(),
                };
                return Ok((table, detection));
            }
            Ok(_) => debug!(?dialect, "single column"),
            Err(err) => debug!(?dialect, %err, "parse failed"),
        }
    }

    let dialect = Dialect {
        delimiter: b',',
        encoding: TextEncoding::Utf8,
    };
    let (text, _) = UTF_8.decode_with_bom_removal(bytes);
    let table = parse(&text, dialect.delimiter, false)?;

    warn!(columns = ?table.headers(), "no dialect matched, used lenient parse");

    let detection = Detection {
        dialect,
        fallback: true,
        columns: table.headers().to_vec(),
    };
    Ok((table, detection))
}

/// Parse decoded text. With `strict`, a row with more fields than the header
/// fails the parse; otherwise extra fields are dropped. Short rows are always
/// padded with empty values.
fn parse(text: &str, delimiter: u8, strict: bool) -> Result<RawTable> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;

        if strict && record.len() > headers.len() {
            return Err(Error::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                expected: headers.len(),
                found: record.len(),
            });
        }

        rows.push(record.iter().map(String::from).collect());
    }

    Ok(RawTable::new(headers, rows))
}
