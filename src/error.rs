use crate::model::Field;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The ways in which a tabular import can fail as a whole. Problems with individual rows are not
/// errors: those rows are skipped and reported as diagnostics instead.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ParseError {
    /// There was no header row, or a header row with no data rows beneath it.
    #[error("The input must have a header row and at least one product row")]
    EmptyInput,

    /// One or more of the required columns could not be found in the header row.
    #[error(
        "The header is missing required columns ({}), expected: Product Name, Quantity, Price per Unit",
        join_fields(.missing)
    )]
    MissingColumns { missing: Vec<Field> },

    /// Every data row was skipped.
    #[error("No valid products were found in the input, please check the format")]
    NoValidRows,
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let e = ParseError::MissingColumns {
            missing: vec![Field::Quantity, Field::Price],
        };
        assert!(e.to_string().contains("(quantity, price)"));
    }
}
