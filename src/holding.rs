use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Holding {
    id: u32,
    symbol: String,
    quantity: f64,
    avg_cost: f64,
    current_price: f64,
}

impl Holding {
    pub fn new(id: u32, symbol: &str, quantity: f64, avg_cost: f64, current_price: f64) -> Holding {
        Holding {
            id,
            symbol: symbol.trim().to_uppercase(),
            quantity,
            avg_cost,
            current_price,
        }
    }

    pub fn get_id(&self) -> u32 {
        self.id
    }

    pub fn get_symbol(&self) -> &str {
        &self.symbol
    }

    pub fn get_quantity(&self) -> f64 {
        self.quantity
    }

    pub fn get_avg_cost(&self) -> f64 {
        self.avg_cost
    }

    pub fn get_current_price(&self) -> f64 {
        self.current_price
    }

    pub fn market_value(&self) -> f64 {
        self.quantity * self.current_price
    }

    pub fn invested(&self) -> f64 {
        self.quantity * self.avg_cost
    }

    pub fn pl(&self) -> f64 {
        (self.current_price - self.avg_cost) * self.quantity
    }

    pub fn pl_percent(&self) -> Option<f64> {
        let invested = self.invested();
        if invested > 0.0 {
            Some(self.pl() / invested * 100.0)
        } else {
            None
        }
    }

    pub fn is_loss(&self) -> bool {
        self.pl() < 0.0
    }
}

pub fn from_string(data: &str) -> Result<Vec<Holding>, serde_json::Error> {
    serde_json::from_str::<Vec<Holding>>(data)
}

/// Validates the raw fields of a new transaction.
pub fn parse_transaction(
    symbol: &str,
    quantity: &str,
    price: &str,
) -> Result<(String, f64, f64), ValidationError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ValidationError::SymbolRequired);
    }

    let quantity = quantity
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidQuantity(quantity.to_string()))?;
    if !quantity.is_finite() {
        return Err(ValidationError::InvalidQuantity(quantity.to_string()));
    }
    if quantity <= 0.0 {
        return Err(ValidationError::NonPositiveQuantity(quantity));
    }

    let price = price
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::InvalidPrice(price.to_string()))?;
    if !price.is_finite() {
        return Err(ValidationError::InvalidPrice(price.to_string()));
    }
    if price < 0.0 {
        return Err(ValidationError::NegativePrice(price));
    }

    Ok((symbol.to_uppercase(), quantity, price))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_metrics() {
        let h = Holding::new(1, "fpt", 1000.0, 85_000.0, 96_000.0);
        assert_eq!(h.get_symbol(), "FPT");
        assert_eq!(h.market_value(), 96_000_000.0);
        assert_eq!(h.pl(), 11_000_000.0);
        assert!(!h.is_loss());

        let vnm = Holding::new(3, "VNM", 500.0, 72_000.0, 68_000.0);
        assert_eq!(vnm.pl(), -2_000_000.0);
        assert!(vnm.is_loss());
    }

    #[test]
    fn test_pl_percent_without_cost() {
        let gift = Holding::new(1, "ABC", 10.0, 0.0, 5.0);
        assert_eq!(gift.pl_percent(), None);
    }

    #[test]
    fn test_parse_transaction() {
        assert_eq!(
            parse_transaction(" hpg ", "200", "25000"),
            Ok(("HPG".to_string(), 200.0, 25_000.0))
        );
        assert_eq!(
            parse_transaction("", "1", "1"),
            Err(ValidationError::SymbolRequired)
        );
        assert_eq!(
            parse_transaction("HPG", "abc", "1"),
            Err(ValidationError::InvalidQuantity("abc".to_string()))
        );
        assert_eq!(
            parse_transaction("HPG", "0", "1"),
            Err(ValidationError::NonPositiveQuantity(0.0))
        );
        assert_eq!(
            parse_transaction("HPG", "1", "-2"),
            Err(ValidationError::NegativePrice(-2.0))
        );
    }

    #[test]
    fn test_from_string() {
        let json = r#"[{"Id": 7, "Symbol": "FPT", "Quantity": 10, "AvgCost": 1.5, "CurrentPrice": 2}]"#;
        let holdings = from_string(json).unwrap();
        assert_eq!(holdings[0].get_id(), 7);
        assert_eq!(holdings[0].get_current_price(), 2.0);
    }
}
