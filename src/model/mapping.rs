use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// The logical fields an import needs to find in the header row.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Quantity,
    Price,
}

serde_plain::derive_display_from_serialize!(Field);
serde_plain::derive_fromstr_from_deserialize!(Field);

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Quantity, Field::Price];

    /// Text which, when found anywhere in a header cell, identifies the field.
    fn token(&self) -> &'static str {
        match self {
            Field::Name => "product name",
            Field::Quantity => "quantity",
            Field::Price => "price",
        }
    }

    /// Short headers that are accepted when they make up the whole cell.
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::Name => &["name", "product", "item"],
            Field::Quantity => &["qty", "count"],
            Field::Price => &["cost", "unit cost"],
        }
    }

    /// Whether the lower-cased, trimmed header `cell` names this field. A cell containing the
    /// token is a strong match, a cell equal to one of the aliases is a weak one.
    fn matches(&self, cell: &str, strong: bool) -> bool {
        if strong {
            cell.contains(self.token())
        } else {
            self.aliases().contains(&cell)
        }
    }
}

/// Maps each `Field` to the index of the column holding it. The three indices are distinct.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ColumnMapping {
    name: usize,
    quantity: usize,
    price: usize,
}

impl ColumnMapping {
    /// Resolves the mapping from a header row. Cells should already be trimmed and lower-cased.
    ///
    /// Fields are resolved in the order name, quantity, price. Strong matches are tried across the
    /// whole row before weak ones, and a column already claimed by an earlier field is never
    /// reused. All three fields must resolve, otherwise `ParseError::MissingColumns` is returned.
    pub fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self, ParseError> {
        let mut claimed: Vec<usize> = Vec::with_capacity(3);
        let mut missing = Vec::new();
        for field in Field::ALL {
            let found = [true, false].into_iter().find_map(|strong| {
                headers
                    .iter()
                    .enumerate()
                    .find(|(ix, cell)| {
                        !claimed.contains(ix) && field.matches((*cell).as_ref(), strong)
                    })
                    .map(|(ix, _)| ix)
            });
            match found {
                Some(ix) => claimed.push(ix),
                None => missing.push(field),
            }
        }

        if !missing.is_empty() {
            return Err(ParseError::MissingColumns { missing });
        }

        Ok(Self {
            name: claimed[0],
            quantity: claimed[1],
            price: claimed[2],
        })
    }

    pub fn name(&self) -> usize {
        self.name
    }

    pub fn quantity(&self) -> usize {
        self.quantity
    }

    pub fn price(&self) -> usize {
        self.price
    }

    /// The minimum number of fields a data row needs for every mapped column to be present.
    pub fn required_len(&self) -> usize {
        self.name.max(self.quantity).max(self.price) + 1
    }
}
