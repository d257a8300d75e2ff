use crate::error::ValidationError;
use crate::format::{format_amount, format_currency};
use crate::holding::{self, Holding};
use crate::market::MarketItem;
use eyre::WrapErr;
use std::path::Path;

pub struct Portfolio {
    pub holdings: Vec<Holding>,
    // None once u32::MAX has been handed out
    next_id: Option<u32>,
}

impl Default for Portfolio {
    fn default() -> Self {
        Self::new()
    }
}

impl Portfolio {
    pub fn new() -> Portfolio {
        Portfolio {
            holdings: Vec::new(),
            next_id: Some(1),
        }
    }

    pub fn from_holdings(holdings: Vec<Holding>) -> Portfolio {
        let next_id = match holdings.iter().map(Holding::get_id).max() {
            Some(max) => max.checked_add(1),
            None => Some(1),
        };
        Portfolio { holdings, next_id }
    }

    /// The three holdings shown to a new user.
    pub fn demo() -> Portfolio {
        Portfolio::from_holdings(vec![
            Holding::new(1, "FPT", 1000.0, 85_000.0, 96_000.0),
            Holding::new(2, "HPG", 2000.0, 25_000.0, 28_500.0),
            Holding::new(3, "VNM", 500.0, 72_000.0, 68_000.0),
        ])
    }

    /// Adds a purchase. The current price comes from `markets` when a market
    /// with the same symbol exists, otherwise the purchase price is used.
    pub fn add_holding(
        &mut self,
        symbol: &str,
        quantity: &str,
        price: &str,
        markets: &[MarketItem],
    ) -> Result<&Holding, ValidationError> {
        let (symbol, quantity, price) = holding::parse_transaction(symbol, quantity, price)?;
        let current_price = markets
            .iter()
            .find(|m| m.symbol.eq_ignore_ascii_case(&symbol))
            .map(|m| m.price)
            .unwrap_or(price);

        let id = self.next_id.ok_or(ValidationError::HoldingIdsExhausted)?;
        self.next_id = id.checked_add(1);
        tracing::info!(id, symbol = %symbol, quantity, price, "holding added");
        self.holdings
            .push(Holding::new(id, &symbol, quantity, price, current_price));
        Ok(&self.holdings[self.holdings.len() - 1])
    }

    pub fn remove_holding(&mut self, id: u32) -> Result<Holding, ValidationError> {
        let index = self
            .holdings
            .iter()
            .position(|h| h.get_id() == id)
            .ok_or(ValidationError::HoldingNotFound(id))?;
        tracing::info!(id, "holding removed");
        Ok(self.holdings.remove(index))
    }

    pub fn get_total_value(&self) -> f64 {
        self.holdings.iter().map(Holding::market_value).sum()
    }

    pub fn get_total_pl(&self) -> f64 {
        self.holdings.iter().map(Holding::pl).sum()
    }

    /// All-time performance relative to the cost basis.
    pub fn get_pl_percent(&self) -> f64 {
        let total_value = self.get_total_value();
        let total_pl = self.get_total_pl();
        let cost_basis = total_value - total_pl;
        if total_value > 0.0 && cost_basis != 0.0 {
            total_pl / cost_basis * 100.0
        } else {
            0.0
        }
    }

    /// Holdings ordered by market value, largest first.
    pub fn sorted_by_value(&self) -> Vec<&Holding> {
        let mut sorted: Vec<&Holding> = self.holdings.iter().collect();
        sorted.sort_by(|a, b| b.market_value().total_cmp(&a.market_value()));
        sorted
    }

    /// (symbol, value, percent of total) per symbol, largest first.
    pub fn get_allocation(&self) -> Vec<(String, f64, f64)> {
        let total_value = self.get_total_value();
        let mut allocation: Vec<(String, f64, f64)> = Vec::new();

        for h in &self.holdings {
            let value = h.market_value();
            match allocation.iter_mut().find(|(s, _, _)| s == h.get_symbol()) {
                Some(entry) => entry.1 += value,
                None => allocation.push((h.get_symbol().to_string(), value, 0.0)),
            }
        }

        for entry in &mut allocation {
            entry.2 = if total_value > 0.0 {
                entry.1 / total_value * 100.0
            } else {
                0.0
            };
        }
        allocation.sort_by(|a, b| b.1.total_cmp(&a.1));
        allocation
    }

    /// The holding with the largest value.
    pub fn leader(&self) -> Option<&Holding> {
        self.sorted_by_value().into_iter().next()
    }

    pub fn save_to_file(&self, path: &Path) -> eyre::Result<()> {
        let json = serde_json::to_string_pretty(&self.holdings)
            .wrap_err("Failed to serialize holdings")?;
        std::fs::write(path, json)
            .wrap_err_with(|| format!("Failed to write to file {}", path.display()))?;
        Ok(())
    }

    // Print the holdings as a table, largest position first
    pub fn print(&self, currency: &str) {
        use comfy_table::{
            presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor,
            ContentArrangement, Table,
        };

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(120);

        table.set_header(vec![
            Cell::new("Id").add_attribute(Attribute::Bold),
            Cell::new("Asset").add_attribute(Attribute::Bold),
            Cell::new("Qty").add_attribute(Attribute::Bold),
            Cell::new("Avg Cost").add_attribute(Attribute::Bold),
            Cell::new("Price").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
            Cell::new("P/L").add_attribute(Attribute::Bold),
            Cell::new("%").add_attribute(Attribute::Bold),
        ]);

        let color_for = |v: f64| if v >= 0.0 { TColor::Green } else { TColor::Red };

        for h in self.sorted_by_value() {
            let pl = h.pl();
            let pct_cell = match h.pl_percent() {
                Some(p) => Cell::new(format!("{p:.2}%"))
                    .set_alignment(CellAlignment::Right)
                    .fg(color_for(p)),
                None => Cell::new("-").set_alignment(CellAlignment::Right),
            };
            table.add_row(vec![
                Cell::new(h.get_id()),
                Cell::new(h.get_symbol()).add_attribute(Attribute::Bold),
                Cell::new(format_amount(h.get_quantity())).set_alignment(CellAlignment::Right),
                Cell::new(format_currency(h.get_avg_cost(), currency))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format_currency(h.get_current_price(), currency))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format_currency(h.market_value(), currency))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format_currency(pl, currency))
                    .set_alignment(CellAlignment::Right)
                    .fg(color_for(pl)),
                pct_cell,
            ]);
        }

        let total_pl = self.get_total_pl();
        let pl_percent = self.get_pl_percent();
        table.add_row(vec![
            Cell::new("TOTAL").add_attribute(Attribute::Bold),
            Cell::new(format!("{} assets", self.holdings.len())),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format_currency(self.get_total_value(), currency))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
            Cell::new(format_currency(total_pl, currency))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold)
                .fg(color_for(total_pl)),
            Cell::new(format!("{pl_percent:.2}%"))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold)
                .fg(color_for(pl_percent)),
        ]);

        println!("{table}");
    }

    // Print the allocation in descending order %-wise
    pub fn print_allocation(&self) {
        println!("====================================");
        for (symbol, _, percentage) in self.get_allocation() {
            println!("{symbol: >12} | {percentage: >10.2}");
        }
        if let Some(leader) = self.leader() {
            println!("Largest position: {}", leader.get_symbol());
        }
    }
}

pub fn load_portfolio(path: &Path) -> eyre::Result<Portfolio> {
    let data = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Error reading file: {}", path.display()))?;
    let holdings = holding::from_string(&data)
        .wrap_err_with(|| format!("Portfolio file {} is not well-formatted", path.display()))?;
    Ok(Portfolio::from_holdings(holdings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::SAMPLE_MARKETS;

    #[test]
    fn test_demo_totals() {
        let portfolio = Portfolio::demo();
        assert_eq!(portfolio.get_total_value(), 96_000_000.0 + 57_000_000.0 + 34_000_000.0);
        assert_eq!(portfolio.get_total_pl(), 16_000_000.0);
        let expected = 16_000_000.0 / (187_000_000.0 - 16_000_000.0) * 100.0;
        assert!((portfolio.get_pl_percent() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_empty_portfolio() {
        let portfolio = Portfolio::new();
        assert_eq!(portfolio.get_total_value(), 0.0);
        assert_eq!(portfolio.get_pl_percent(), 0.0);
        assert!(portfolio.get_allocation().is_empty());
        assert!(portfolio.leader().is_none());
    }

    #[test]
    fn test_allocation_sorted_by_value() {
        let allocation = Portfolio::demo().get_allocation();
        let symbols: Vec<&str> = allocation.iter().map(|(s, _, _)| s.as_str()).collect();
        assert_eq!(symbols, vec!["FPT", "HPG", "VNM"]);
        let total: f64 = allocation.iter().map(|(_, _, p)| p).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_add_holding_uses_market_price() {
        let mut portfolio = Portfolio::demo();
        let added = portfolio.add_holding("btc", "0.5", "60000", &SAMPLE_MARKETS).unwrap();
        assert_eq!(added.get_id(), 4);
        assert_eq!(added.get_symbol(), "BTC");
        assert_eq!(added.get_current_price(), 64230.5);

        let unknown = portfolio.add_holding("MWG", "10", "50000", &SAMPLE_MARKETS).unwrap();
        assert_eq!(unknown.get_id(), 5);
        assert_eq!(unknown.get_current_price(), 50_000.0);
        assert_eq!(unknown.pl(), 0.0);
    }

    #[test]
    fn test_add_holding_rejects_bad_input() {
        let mut portfolio = Portfolio::new();
        assert_eq!(
            portfolio.add_holding("FPT", "-1", "10", &[]).err(),
            Some(ValidationError::NonPositiveQuantity(-1.0))
        );
        assert!(portfolio.holdings.is_empty());
    }

    #[test]
    fn test_remove_holding_and_ids_never_reused() {
        let mut portfolio = Portfolio::demo();
        let removed = portfolio.remove_holding(3).unwrap();
        assert_eq!(removed.get_symbol(), "VNM");
        assert_eq!(
            portfolio.remove_holding(3).err(),
            Some(ValidationError::HoldingNotFound(3))
        );
        let added = portfolio.add_holding("VIC", "1", "1", &[]).unwrap();
        assert_eq!(added.get_id(), 4);
    }

    #[test]
    fn test_load_example_portfolio() {
        let portfolio = load_portfolio(Path::new("example_portfolio.json")).unwrap();
        assert_eq!(portfolio.holdings.len(), 3);
        assert_eq!(portfolio.leader().map(|h| h.get_symbol()), Some("FPT"));
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("genzf_portfolio_{}.json", std::process::id()));
        let portfolio = Portfolio::demo();
        portfolio.save_to_file(&path).unwrap();
        let reloaded = load_portfolio(&path).unwrap();
        assert_eq!(reloaded.holdings, portfolio.holdings);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_largest_id_does_not_overflow() {
        let json = r#"[{"Id": 4294967295, "Symbol": "FPT", "Quantity": 1, "AvgCost": 1, "CurrentPrice": 1}]"#;
        let mut portfolio = Portfolio::from_holdings(holding::from_string(json).unwrap());
        assert_eq!(
            portfolio.add_holding("HPG", "1", "1", &[]).err(),
            Some(ValidationError::HoldingIdsExhausted)
        );
        assert_eq!(portfolio.holdings.len(), 1);

        let mut near_limit = Portfolio::from_holdings(vec![Holding::new(u32::MAX - 1, "FPT", 1.0, 1.0, 1.0)]);
        assert_eq!(near_limit.add_holding("HPG", "1", "1", &[]).unwrap().get_id(), u32::MAX);
        assert_eq!(
            near_limit.add_holding("VNM", "1", "1", &[]).err(),
            Some(ValidationError::HoldingIdsExhausted)
        );
    }
}
