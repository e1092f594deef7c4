//! Renders products and history entries into delimited text for download.
//!
//! A field is quoted, with inner quotes doubled, only when it contains a comma, a double quote or
//! a newline. Documents start with a UTF-8 byte order mark so spreadsheet tools pick the right
//! encoding.

use crate::model::{CandidateRecord, HistoryEntry, Product};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// The UTF-8 byte order mark.
pub const BOM: char = '\u{feff}';

pub const PRODUCT_COLUMNS: &[&str] = &[
    "Product ID",
    "Product Name",
    "Quantity",
    "Price per Unit",
    "Total Stock Value",
];

pub const HISTORY_COLUMNS: &[&str] = &[
    "Transaction Type",
    "Product ID",
    "Product Name",
    "Quantity",
    "Price per Unit",
    "Total Stock Value",
    "Timestamp",
    "Transaction Hash",
    "Block Number",
];

pub const CANDIDATE_COLUMNS: &[&str] = &["Product Name", "Quantity", "Price"];

/// A single cell value.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Scalar {
    Text(String),
    Int(u128),
    Empty,
}

impl Display for Scalar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Empty => Ok(()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        Scalar::Int(u128::from(value))
    }
}

impl From<u128> for Scalar {
    fn from(value: u128) -> Self {
        Scalar::Int(value)
    }
}

impl From<usize> for Scalar {
    fn from(value: usize) -> Self {
        Scalar::Int(value as u128)
    }
}

/// Something that can be written as one row of a table with fixed columns.
pub trait Tabular {
    /// The header labels, in output order.
    fn columns() -> &'static [&'static str];

    /// The cells of this row, one per column.
    fn row(&self) -> Vec<Scalar>;
}

impl Tabular for CandidateRecord {
    fn columns() -> &'static [&'static str] {
        CANDIDATE_COLUMNS
    }

    fn row(&self) -> Vec<Scalar> {
        vec![
            self.name().into(),
            self.quantity().into(),
            self.price().into(),
        ]
    }
}

impl Tabular for Product {
    fn columns() -> &'static [&'static str] {
        PRODUCT_COLUMNS
    }

    fn row(&self) -> Vec<Scalar> {
        vec![
            self.id().into(),
            self.name().into(),
            self.quantity().into(),
            self.price().into(),
            self.total_value().into(),
        ]
    }
}

impl Tabular for HistoryEntry {
    fn columns() -> &'static [&'static str] {
        HISTORY_COLUMNS
    }

    fn row(&self) -> Vec<Scalar> {
        vec![
            self.kind().action().into(),
            self.product_id().into(),
            self.product_name().into(),
            self.quantity().into(),
            self.price().into(),
            self.total_value().into(),
            self.timestamp().into(),
            self.transaction_hash().into(),
            self.block_number().into(),
        ]
    }
}

/// Quotes `field` if it contains a comma, a double quote or a newline.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn join_row<S: Display>(cells: impl IntoIterator<Item = S>) -> String {
    cells
        .into_iter()
        .map(|cell| escape_field(&cell.to_string()).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders a header line followed by one line per row. Rows are separated, not terminated, by
/// newlines. Each row should have one cell per column.
pub fn serialize_rows<R>(columns: &[&str], rows: R) -> String
where
    R: IntoIterator<Item = Vec<Scalar>>,
{
    let body = rows.into_iter().map(join_row).collect::<Vec<_>>();
    let mut out = join_row(columns);
    out.push('\n');
    out.push_str(&body.join("\n"));
    out
}

/// Renders `rows` under the column headers of `T`.
pub fn serialize<T: Tabular>(rows: &[T]) -> String {
    serialize_rows(T::columns(), rows.iter().map(Tabular::row))
}

/// The datasets that can be exported.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Products,
    History,
    #[serde(alias = "all")]
    Complete,
}

serde_plain::derive_display_from_serialize!(Dataset);
serde_plain::derive_fromstr_from_deserialize!(Dataset);

impl Dataset {
    /// e.g. `inventory_products_2025-01-31.csv`
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("inventory_{self}_{}.csv", date.format("%Y-%m-%d"))
    }
}

/// The summary block at the top of a complete export.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    pub export_date: String,
    pub total_products: usize,
    pub total_transactions: usize,
    pub current_stock_value: u128,
}

impl Summary {
    fn render(&self) -> String {
        let lines = [
            "Inventory Management Export Summary".to_string(),
            join_row(["Export Date", self.export_date.as_str()]),
            join_row(["Total Products".to_string(), self.total_products.to_string()]),
            join_row([
                "Total Transactions".to_string(),
                self.total_transactions.to_string(),
            ]),
            join_row([
                "Current Stock Value".to_string(),
                group_thousands(self.current_stock_value),
            ]),
        ];
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Formats an integer with thousands separators, e.g. `1,234,567`.
pub fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

fn with_bom(body: String) -> String {
    let mut out = String::with_capacity(body.len() + BOM.len_utf8());
    out.push(BOM);
    out.push_str(&body);
    out
}

/// The products-only export document.
pub fn products_document(products: &[Product]) -> String {
    with_bom(serialize(products))
}

/// The history-only export document.
pub fn history_document(history: &[HistoryEntry]) -> String {
    with_bom(serialize(history))
}

/// The complete export: the summary, then products, then history, separated by blank lines.
pub fn complete_document(
    summary: &Summary,
    products: &[Product],
    history: &[HistoryEntry],
) -> String {
    let mut out = summary.render();
    out.push_str("\n--- PRODUCTS ---\n");
    out.push_str(&serialize(products));
    out.push_str("\n\n--- TRANSACTION HISTORY ---\n");
    out.push_str(&serialize(history));
    with_bom(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import;
    use crate::model::{Change, LedgerEvent, ProductLine};
    use std::str::FromStr;

    fn product(id: u64, name: &str, quantity: u64, price: u64) -> Product {
        Product {
            id,
            name: name.to_string(),
            quantity,
            price,
            active: true,
        }
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("Widget \"A\""), "\"Widget \"\"A\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_serialize_candidate() {
        let out = serialize(&[CandidateRecord::new("Widget \"A\"", 10, 5)]);
        assert_eq!(out, "Product Name,Quantity,Price\n\"Widget \"\"A\"\"\",10,5");
    }

    #[test]
    fn test_round_trip_through_parser() {
        let records = vec![
            CandidateRecord::new("Widget \"A\"", 10, 5),
            CandidateRecord::new("Bolts, large", 100, 1),
            CandidateRecord::new("Multi\nline", 2, 30),
            CandidateRecord::new("Plain", 7, 7),
        ];
        let text = with_bom(serialize(&records));
        assert_eq!(import::parse(&text).unwrap(), records);
    }

    #[test]
    fn test_products_export_can_be_imported() {
        let doc = products_document(&[product(1, "Nut, hex", 4, 3), product(2, "Bolt", 2, 9)]);
        assert!(doc.starts_with(BOM));
        let records = import::parse(&doc).unwrap();
        assert_eq!(
            records,
            vec![
                CandidateRecord::new("Nut, hex", 4, 3),
                CandidateRecord::new("Bolt", 2, 9),
            ]
        );
    }

    #[test]
    fn test_products_document_layout() {
        let doc = products_document(&[product(3, "Nut", 4, 3)]);
        assert_eq!(
            doc,
            format!("{BOM}Product ID,Product Name,Quantity,Price per Unit,Total Stock Value\n3,Nut,4,3,12")
        );
    }

    #[test]
    fn test_history_row() {
        let entry = HistoryEntry::new(
            LedgerEvent {
                change: Change::Deleted { product_id: 8 },
                block_number: 12,
                transaction_hash: "0xfeed".to_string(),
            },
            None,
        );
        let doc = history_document(&[entry]);
        assert!(doc.ends_with("\ndelete,8,,0,0,0,Unknown,0xfeed,12"));

        let entry = HistoryEntry::new(
            LedgerEvent {
                change: Change::Added(ProductLine {
                    product_id: 1,
                    product_name: "Widget".to_string(),
                    quantity: 10,
                    price: 5,
                }),
                block_number: 3,
                transaction_hash: "0xbeef".to_string(),
            },
            None,
        );
        assert_eq!(
            join_row(entry.row()),
            "add,1,Widget,10,5,50,Unknown,0xbeef,3"
        );
    }

    #[test]
    fn test_complete_document() {
        let summary = Summary {
            export_date: "2025-01-31 10:00:00".to_string(),
            total_products: 1,
            total_transactions: 0,
            current_stock_value: 1500,
        };
        let doc = complete_document(&summary, &[product(1, "Widget", 300, 5)], &[]);
        let expected = format!(
            "{BOM}Inventory Management Export Summary\n\
             Export Date,2025-01-31 10:00:00\n\
             Total Products,1\n\
             Total Transactions,0\n\
             Current Stock Value,\"1,500\"\n\
             \n--- PRODUCTS ---\n\
             Product ID,Product Name,Quantity,Price per Unit,Total Stock Value\n\
             1,Widget,300,5,1500\
             \n\n--- TRANSACTION HISTORY ---\n\
             Transaction Type,Product ID,Product Name,Quantity,Price per Unit,Total Stock Value,\
             Timestamp,Transaction Hash,Block Number\n"
        );
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(7_900), "7,900");
        assert_eq!(group_thousands((1 << 53) + 1), "9,007,199,254,740,993");
        assert_eq!(
            group_thousands(u64::MAX as u128 * 3),
            "55,340,232,221,128,654,845"
        );
    }

    #[test]
    fn test_dataset_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(
            Dataset::Products.file_name(date),
            "inventory_products_2025-01-31.csv"
        );
        assert_eq!(
            Dataset::from_str("all").unwrap().file_name(date),
            "inventory_complete_2025-01-31.csv"
        );
    }
}
