use crate::model::uint;
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A product parsed from an import file that has not yet been written to the ledger.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CandidateRecord {
    pub(crate) name: String,
    pub(crate) quantity: u64,
    pub(crate) price: u64,
}

impl CandidateRecord {
    pub fn new(name: impl Into<String>, quantity: u64, price: u64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn price(&self) -> u64 {
        self.price
    }
}

/// A product row as currently stored on the ledger.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Product {
    pub(crate) id: u64,
    pub(crate) name: String,
    pub(crate) quantity: u64,
    pub(crate) price: u64,
    /// `false` once the product has been deleted.
    pub(crate) active: bool,
}

impl Product {
    /// Decodes the `getProduct` tuple: `[id, name, quantity, price, exists]`.
    pub fn from_tuple(values: &[Value]) -> Result<Self> {
        if values.len() < 5 {
            bail!(
                "A product tuple must have 5 values but {} were returned",
                values.len()
            );
        }
        let name = values[1]
            .as_str()
            .context("The product name is not a string")?
            .to_string();
        let active = match &values[4] {
            Value::Bool(b) => *b,
            other => bail!("The product status is not a boolean: {other}"),
        };
        Ok(Self {
            id: uint(&values[0]).context("Invalid product id")?,
            name,
            quantity: uint(&values[2]).context("Invalid product quantity")?,
            price: uint(&values[3]).context("Invalid product price")?,
            active,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> u64 {
        self.quantity
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The stock value of this product line, `quantity * price`.
    pub fn total_value(&self) -> u128 {
        u128::from(self.quantity) * u128::from(self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_tuple() {
        let p = Product::from_tuple(&[json!("3"), json!("Bolt"), json!("20"), json!(4), json!(true)])
            .unwrap();
        assert_eq!(p.id(), 3);
        assert_eq!(p.name(), "Bolt");
        assert_eq!(p.total_value(), 80);
        assert!(p.is_active());
    }

    #[test]
    fn test_from_tuple_too_short() {
        let e = Product::from_tuple(&[json!(1), json!("Bolt")]).unwrap_err();
        assert!(e.to_string().contains("5 values"));
    }

    #[test]
    fn test_total_value_does_not_overflow() {
        let p = Product {
            quantity: u64::MAX,
            price: 2,
            ..Default::default()
        };
        assert_eq!(p.total_value(), u128::from(u64::MAX) * 2);
    }
}
