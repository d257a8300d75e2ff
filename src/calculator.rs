//! Trade profit/ROI calculator and a mock progressive income tax estimator.
//!
//! Inputs are free text and parsed leniently: anything that does not start
//! with a number counts as zero, so a half-typed value never errors.

use crate::format::{format_currency, format_with_commas};

/// Parses the longest numeric prefix of `input`, falling back to 0.
pub fn parse_lenient(input: &str) -> f64 {
    let trimmed = input.trim();
    let mut ends: Vec<usize> = trimmed
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .collect();
    ends.reverse();

    for end in ends {
        if let Ok(value) = trimmed[..end].parse::<f64>() {
            if value.is_finite() {
                return value;
            }
        }
    }
    0.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitEstimate {
    pub buy_price: f64,
    pub sell_price: f64,
    pub quantity: f64,
    pub profit: f64,
    pub roi: f64,
}

impl ProfitEstimate {
    pub fn new(buy_price: f64, sell_price: f64, quantity: f64) -> ProfitEstimate {
        let profit = (sell_price - buy_price) * quantity;
        let roi = if buy_price > 0.0 {
            (sell_price - buy_price) / buy_price * 100.0
        } else {
            0.0
        };

        ProfitEstimate {
            buy_price,
            sell_price,
            quantity,
            profit,
            roi,
        }
    }

    pub fn from_inputs(buy: &str, sell: &str, quantity: &str) -> ProfitEstimate {
        Self::new(
            parse_lenient(buy),
            parse_lenient(sell),
            parse_lenient(quantity),
        )
    }

    pub fn is_gain(&self) -> bool {
        self.profit >= 0.0
    }

    /// Selling at this price neither gains nor loses.
    pub fn breakeven(&self) -> f64 {
        self.buy_price
    }

    pub fn print(&self, currency: &str, symbol: Option<&str>) {
        use comfy_table::{
            presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor,
            ContentArrangement, Table,
        };

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(80);

        let title = match symbol {
            Some(s) => format!("Trade ({s})"),
            None => "Trade".to_string(),
        };
        table.set_header(vec![
            Cell::new(title).add_attribute(Attribute::Bold),
            Cell::new("").add_attribute(Attribute::Bold),
        ]);

        let color = if self.is_gain() {
            TColor::Green
        } else {
            TColor::Red
        };
        let rows = [
            ("Buy price", format_money(self.buy_price, currency)),
            ("Sell price", format_money(self.sell_price, currency)),
            ("Quantity", format!("{}", self.quantity)),
        ];
        for (label, value) in rows {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(value).set_alignment(CellAlignment::Right),
            ]);
        }
        table.add_row(vec![
            Cell::new("Profit").add_attribute(Attribute::Bold),
            Cell::new(format_money(self.profit, currency))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold)
                .fg(color),
        ]);
        table.add_row(vec![
            Cell::new("ROI").add_attribute(Attribute::Bold),
            Cell::new(format!("{:.2}%", self.roi))
                .set_alignment(CellAlignment::Right)
                .fg(color),
        ]);
        table.add_row(vec![
            Cell::new("Breakeven"),
            Cell::new(format_money(self.breakeven(), currency)).set_alignment(CellAlignment::Right),
        ]);

        println!("{table}");
    }
}

// Large results read as local currency, small ones as plain quotes
fn format_money(value: f64, currency: &str) -> String {
    if value > 1000.0 {
        format_currency(value, currency)
    } else {
        format_with_commas(value)
    }
}

pub const FIRST_BRACKET_CEILING: f64 = 5_000_000.0;
pub const SECOND_BRACKET_CEILING: f64 = 10_000_000.0;
/// Monthly income below this owes nothing.
pub const STANDARD_DEDUCTION: f64 = 11_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxEstimate {
    pub income: f64,
    pub tax: f64,
    pub net: f64,
}

/// Simplified three bracket schedule: 5% up to 5M, 10% up to 10M, 20% above.
/// Flat amounts carry the tax owed on the lower brackets.
pub fn estimate_tax(income: f64) -> TaxEstimate {
    let mut tax = if income > SECOND_BRACKET_CEILING {
        (income - SECOND_BRACKET_CEILING) * 0.2 + 250_000.0 + 250_000.0
    } else if income > FIRST_BRACKET_CEILING {
        (income - FIRST_BRACKET_CEILING) * 0.1 + 250_000.0
    } else {
        income * 0.05
    };

    if income < STANDARD_DEDUCTION {
        tax = 0.0;
    }

    TaxEstimate {
        income,
        tax,
        net: income - tax,
    }
}

impl TaxEstimate {
    pub fn print(&self, currency: &str) {
        use comfy_table::{
            presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor,
            ContentArrangement, Table,
        };

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(80)
            .set_header(vec![
                Cell::new("Income").add_attribute(Attribute::Bold),
                Cell::new("Estimated tax").add_attribute(Attribute::Bold),
                Cell::new("Net income").add_attribute(Attribute::Bold),
            ]);

        table.add_row(vec![
            Cell::new(format_currency(self.income, currency)).set_alignment(CellAlignment::Right),
            Cell::new(format_currency(self.tax, currency))
                .set_alignment(CellAlignment::Right)
                .fg(TColor::Red),
            Cell::new(format_currency(self.net, currency))
                .set_alignment(CellAlignment::Right)
                .fg(TColor::Green),
        ]);

        println!("{table}");
        println!("Estimate only, based on a simplified progressive schedule.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lenient() {
        assert_eq!(parse_lenient("12.5"), 12.5);
        assert_eq!(parse_lenient("  42abc"), 42.0);
        assert_eq!(parse_lenient(""), 0.0);
        assert_eq!(parse_lenient("abc"), 0.0);
        assert_eq!(parse_lenient("-3"), -3.0);
        assert_eq!(parse_lenient("NaN"), 0.0);
    }

    #[test]
    fn test_profit_gain() {
        let p = ProfitEstimate::new(100.0, 150.0, 10.0);
        assert_eq!(p.profit, 500.0);
        assert_eq!(p.roi, 50.0);
        assert!(p.is_gain());
        assert_eq!(p.breakeven(), 100.0);
    }

    #[test]
    fn test_profit_loss_and_zero_buy() {
        let loss = ProfitEstimate::from_inputs("200", "150", "2");
        assert_eq!(loss.profit, -100.0);
        assert_eq!(loss.roi, -25.0);
        assert!(!loss.is_gain());

        let free = ProfitEstimate::from_inputs("", "10", "3");
        assert_eq!(free.profit, 30.0);
        assert_eq!(free.roi, 0.0);
    }

    #[test]
    fn test_tax_below_deduction_is_zero() {
        let t = estimate_tax(10_500_000.0);
        assert_eq!(t.tax, 0.0);
        assert_eq!(t.net, 10_500_000.0);
        assert_eq!(estimate_tax(3_000_000.0).tax, 0.0);
    }

    #[test]
    fn test_tax_top_bracket() {
        let t = estimate_tax(20_000_000.0);
        assert_eq!(t.tax, 2_500_000.0);
        assert_eq!(t.net, 17_500_000.0);

        let edge = estimate_tax(11_000_000.0);
        assert_eq!(edge.tax, 700_000.0);
    }
}
