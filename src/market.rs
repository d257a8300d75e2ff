use crate::error::ValidationError;
use crate::format::{format_percent, format_price};
use chrono::DateTime;
use eyre::{eyre, WrapErr};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Crypto,
    Forex,
    Commodity,
    Etf,
}

impl MarketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Crypto => "crypto",
            MarketKind::Forex => "forex",
            MarketKind::Commodity => "commodity",
            MarketKind::Etf => "etf",
        }
    }

    // Backend categories; ETFs are never sent, unknown values land in commodity
    fn from_backend(category: &str) -> MarketKind {
        match category {
            "CRYPTO" => MarketKind::Crypto,
            "FOREX" => MarketKind::Forex,
            _ => MarketKind::Commodity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub price: f64,
    /// Percent change over the session.
    pub change: f64,
    #[serde(rename = "type")]
    pub kind: MarketKind,
    pub last_updated: String,
    /// Sparkline points, oldest first.
    pub data: Vec<f64>,
}

impl MarketItem {
    pub fn open(&self) -> Option<f64> {
        self.data.first().copied()
    }

    pub fn high(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::max)
    }

    pub fn low(&self) -> Option<f64> {
        self.data.iter().copied().reduce(f64::min)
    }
}

/// Asset record as served by the backend's home endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: String,
    pub symbol: String,
    pub asset_name: String,
    pub current_price: f64,
    pub change_percentage: f64,
    pub category: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub last_updated: String,
}

impl From<AssetRecord> for MarketItem {
    fn from(asset: AssetRecord) -> Self {
        let range = asset.high - asset.low;
        let mid = (asset.open + asset.current_price) / 2.0;
        let data = vec![
            asset.open,
            asset.low + range * 0.2,
            mid,
            asset.high - range * 0.1,
            asset.current_price,
        ];

        MarketItem {
            kind: MarketKind::from_backend(&asset.category),
            last_updated: format_update_time(&asset.last_updated),
            id: asset.id,
            symbol: asset.symbol,
            name: asset.asset_name,
            price: asset.current_price,
            change: asset.change_percentage,
            data,
        }
    }
}

// RFC 3339 timestamp as a 12h clock time, e.g. "09:30 AM"
fn format_update_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(t) => t.format("%I:%M %p").to_string(),
        Err(_) => "N/A".to_string(),
    }
}

fn item(
    id: &str,
    symbol: &str,
    name: &str,
    price: f64,
    change: f64,
    kind: MarketKind,
    data: &[f64],
) -> MarketItem {
    MarketItem {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        price,
        change,
        kind,
        last_updated: "09:30 AM".to_string(),
        data: data.to_vec(),
    }
}

/// Built-in market snapshot used when no market file is configured.
pub static SAMPLE_MARKETS: Lazy<Vec<MarketItem>> = Lazy::new(|| {
    use MarketKind::*;
    vec![
        item("1", "BTC", "Bitcoin", 64230.5, 2.45, Crypto, &[62100.0, 62800.0, 63500.0, 63900.0, 64230.5]),
        item("2", "ETH", "Ethereum", 3450.2, -1.2, Crypto, &[3520.0, 3490.0, 3470.0, 3440.0, 3450.2]),
        item("3", "SOL", "Solana", 145.8, 5.6, Crypto, &[136.0, 139.5, 141.2, 144.0, 145.8]),
        item("4", "EUR/USD", "Euro / US Dollar", 1.0845, 0.12, Forex, &[1.0832, 1.0838, 1.0841, 1.0849, 1.0845]),
        item("5", "USD/VND", "US Dollar / Vietnamese Dong", 25_420.0, 0.05, Forex, &[25_405.0, 25_410.0, 25_415.0, 25_425.0, 25_420.0]),
        item("6", "XAU", "Gold Spot", 2335.4, 0.85, Commodity, &[2315.0, 2320.5, 2328.0, 2338.0, 2335.4]),
        item("7", "WTI", "Crude Oil WTI", 78.35, -2.1, Commodity, &[80.1, 79.6, 79.0, 78.6, 78.35]),
        item("8", "SPY", "SPDR S&P 500 ETF", 524.6, 0.64, Etf, &[521.2, 522.0, 523.4, 525.1, 524.6]),
        item("9", "QQQ", "Invesco QQQ Trust", 448.9, 1.1, Etf, &[443.5, 445.0, 446.8, 449.5, 448.9]),
        item("10", "E1VFVN30", "DCVFM VN30 ETF", 21_350.0, -0.35, Etf, &[21_450.0, 21_420.0, 21_400.0, 21_380.0, 21_350.0]),
    ]
});

/// Reads markets from `path`. Accepts either market items or raw backend
/// asset records.
pub fn load_markets(path: &Path) -> eyre::Result<Vec<MarketItem>> {
    let data = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read market file {}", path.display()))?;
    from_string(&data).wrap_err_with(|| format!("Market file {} is not well-formatted", path.display()))
}

pub fn from_string(data: &str) -> eyre::Result<Vec<MarketItem>> {
    let item_err = match serde_json::from_str::<Vec<MarketItem>>(data) {
        Ok(items) => return Ok(items),
        Err(e) => e,
    };
    match serde_json::from_str::<Vec<AssetRecord>>(data) {
        Ok(assets) => {
            tracing::debug!(count = assets.len(), "remapped backend asset records");
            Ok(assets.into_iter().map(MarketItem::from).collect())
        }
        Err(asset_err) => Err(eyre!(
            "not a list of market items ({item_err}) nor of backend asset records ({asset_err})"
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(MarketKind),
}

impl CategoryFilter {
    pub fn all() -> &'static [CategoryFilter] {
        &[
            CategoryFilter::All,
            CategoryFilter::Only(MarketKind::Crypto),
            CategoryFilter::Only(MarketKind::Forex),
            CategoryFilter::Only(MarketKind::Commodity),
            CategoryFilter::Only(MarketKind::Etf),
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(kind) => kind.as_str(),
        }
    }

    pub fn next(self) -> CategoryFilter {
        let all = Self::all();
        let i = all.iter().position(|c| *c == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }

    fn matches(&self, item: &MarketItem) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(kind) => item.kind == *kind,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(CategoryFilter::All),
            "crypto" => Ok(CategoryFilter::Only(MarketKind::Crypto)),
            "forex" => Ok(CategoryFilter::Only(MarketKind::Forex)),
            "commodity" => Ok(CategoryFilter::Only(MarketKind::Commodity)),
            "etf" => Ok(CategoryFilter::Only(MarketKind::Etf)),
            _ => Err(ValidationError::UnknownMarketCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    NameAsc,
    PriceDesc,
    PriceAsc,
    #[default]
    ChangeDesc,
    ChangeAsc,
}

impl SortOption {
    pub fn all() -> &'static [SortOption] {
        &[
            SortOption::ChangeDesc,
            SortOption::ChangeAsc,
            SortOption::PriceDesc,
            SortOption::PriceAsc,
            SortOption::NameAsc,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::NameAsc => "name-asc",
            SortOption::PriceDesc => "price-desc",
            SortOption::PriceAsc => "price-asc",
            SortOption::ChangeDesc => "change-desc",
            SortOption::ChangeAsc => "change-asc",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SortOption::NameAsc => "Name (A-Z)",
            SortOption::PriceDesc => "Price: high to low",
            SortOption::PriceAsc => "Price: low to high",
            SortOption::ChangeDesc => "Top gainers",
            SortOption::ChangeAsc => "Top losers",
        }
    }

    pub fn next(self) -> SortOption {
        let all = Self::all();
        let i = all.iter().position(|s| *s == self).unwrap_or(0);
        all[(i + 1) % all.len()]
    }

    fn compare(&self, a: &MarketItem, b: &MarketItem) -> Ordering {
        match self {
            SortOption::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortOption::PriceDesc => b.price.total_cmp(&a.price),
            SortOption::PriceAsc => a.price.total_cmp(&b.price),
            SortOption::ChangeDesc => b.change.total_cmp(&a.change),
            SortOption::ChangeAsc => a.change.total_cmp(&b.change),
        }
    }
}

impl FromStr for SortOption {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::all()
            .iter()
            .find(|o| o.as_str() == s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| ValidationError::UnknownSort(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketQuery {
    pub search: String,
    pub category: CategoryFilter,
    pub sort: SortOption,
}

impl MarketQuery {
    /// Category filter, then search on name or symbol, then a stable sort.
    pub fn apply(&self, markets: &[MarketItem]) -> Vec<MarketItem> {
        let needle = self.search.trim().to_lowercase();

        let mut data: Vec<MarketItem> = markets
            .iter()
            .filter(|m| self.category.matches(m))
            .filter(|m| {
                needle.is_empty()
                    || m.name.to_lowercase().contains(&needle)
                    || m.symbol.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        data.sort_by(|a, b| self.sort.compare(a, b));
        data
    }

    pub fn is_filtered(&self) -> bool {
        !self.search.trim().is_empty() || self.category != CategoryFilter::All
    }
}

pub fn find<'a>(markets: &'a [MarketItem], id: &str) -> Result<&'a MarketItem, ValidationError> {
    markets
        .iter()
        .find(|m| m.id == id || m.symbol.eq_ignore_ascii_case(id))
        .ok_or_else(|| ValidationError::MarketNotFound(id.to_string()))
}

pub fn print_markets(markets: &[MarketItem]) {
    use comfy_table::{
        presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor, ContentArrangement,
        Table,
    };

    if markets.is_empty() {
        println!("No markets match the current filters.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);

    table.set_header(vec![
        Cell::new("Symbol").add_attribute(Attribute::Bold),
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Price").add_attribute(Attribute::Bold),
        Cell::new("Change").add_attribute(Attribute::Bold),
        Cell::new("Updated").add_attribute(Attribute::Bold),
    ]);

    for market in markets {
        let kind_color = match market.kind {
            MarketKind::Crypto => TColor::DarkYellow,
            MarketKind::Forex => TColor::DarkCyan,
            MarketKind::Commodity => TColor::DarkMagenta,
            MarketKind::Etf => TColor::DarkBlue,
        };
        let change_color = if market.change >= 0.0 {
            TColor::Green
        } else {
            TColor::Red
        };

        table.add_row(vec![
            Cell::new(&market.symbol).add_attribute(Attribute::Bold),
            Cell::new(&market.name),
            Cell::new(market.kind.as_str()).fg(kind_color),
            Cell::new(format_price(market.price)).set_alignment(CellAlignment::Right),
            Cell::new(format_percent(market.change))
                .set_alignment(CellAlignment::Right)
                .fg(change_color),
            Cell::new(&market.last_updated),
        ]);
    }

    println!("{table}");
}

pub fn print_market_detail(market: &MarketItem) {
    use comfy_table::{presets::UTF8_FULL, Attribute, Cell, CellAlignment, Table};

    let dash = || "-".to_string();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        Cell::new(format!("{} ({})", market.name, market.symbol)).add_attribute(Attribute::Bold),
        Cell::new(market.kind.as_str()),
    ]);

    let rows = [
        ("Price", format_price(market.price)),
        ("Change", format_percent(market.change)),
        ("Open", market.open().map(format_price).unwrap_or_else(dash)),
        ("High", market.high().map(format_price).unwrap_or_else(dash)),
        ("Low", market.low().map(format_price).unwrap_or_else(dash)),
        ("Updated", market.last_updated.clone()),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(items: &[MarketItem]) -> Vec<&str> {
        items.iter().map(|m| m.symbol.as_str()).collect()
    }

    #[test]
    fn test_default_query_sorts_by_change_desc() {
        let result = MarketQuery::default().apply(&SAMPLE_MARKETS);
        assert_eq!(result.len(), SAMPLE_MARKETS.len());
        assert_eq!(result[0].symbol, "SOL");
        assert_eq!(result.last().map(|m| m.symbol.as_str()), Some("WTI"));
    }

    #[test]
    fn test_category_filter_and_price_sort() {
        let query = MarketQuery {
            category: CategoryFilter::Only(MarketKind::Crypto),
            sort: SortOption::PriceAsc,
            ..Default::default()
        };
        assert_eq!(symbols(&query.apply(&SAMPLE_MARKETS)), vec!["SOL", "ETH", "BTC"]);
    }

    #[test]
    fn test_search_matches_name_or_symbol_case_insensitive() {
        let query = MarketQuery {
            search: "dOLLar".to_string(),
            sort: SortOption::NameAsc,
            ..Default::default()
        };
        assert_eq!(symbols(&query.apply(&SAMPLE_MARKETS)), vec!["EUR/USD", "USD/VND"]);

        let by_symbol = MarketQuery {
            search: "qqq".to_string(),
            ..Default::default()
        };
        assert_eq!(symbols(&by_symbol.apply(&SAMPLE_MARKETS)), vec!["QQQ"]);
        assert!(by_symbol.is_filtered());
    }

    #[test]
    fn test_change_asc_and_price_desc() {
        let losers = MarketQuery {
            sort: SortOption::ChangeAsc,
            ..Default::default()
        };
        let result = losers.apply(&SAMPLE_MARKETS);
        assert_eq!(result[0].symbol, "WTI");
        assert_eq!(result.last().map(|m| m.symbol.as_str()), Some("SOL"));

        let expensive = MarketQuery {
            sort: SortOption::PriceDesc,
            ..Default::default()
        };
        let result = expensive.apply(&SAMPLE_MARKETS);
        assert_eq!(symbols(&result[..3]), vec!["BTC", "USD/VND", "E1VFVN30"]);
        assert_eq!(result.last().map(|m| m.symbol.as_str()), Some("EUR/USD"));
    }

    #[test]
    fn test_sort_keeps_input_order_on_ties() {
        use MarketKind::*;
        let markets = vec![
            item("1", "AAA", "Gold", 10.0, 1.0, Commodity, &[]),
            item("2", "BBB", "Zinc", 50.0, 3.0, Commodity, &[]),
            item("3", "CCC", "gold", 10.0, 1.0, Commodity, &[]),
        ];

        let expected: [(SortOption, [&str; 3]); 5] = [
            (SortOption::ChangeDesc, ["BBB", "AAA", "CCC"]),
            (SortOption::ChangeAsc, ["AAA", "CCC", "BBB"]),
            (SortOption::PriceDesc, ["BBB", "AAA", "CCC"]),
            (SortOption::PriceAsc, ["AAA", "CCC", "BBB"]),
            (SortOption::NameAsc, ["AAA", "CCC", "BBB"]),
        ];
        for (sort, order) in expected {
            let query = MarketQuery {
                sort,
                ..Default::default()
            };
            assert_eq!(symbols(&query.apply(&markets)), order, "{}", sort.as_str());
        }

        let mut reversed = markets.clone();
        reversed.swap(0, 2);
        let query = MarketQuery {
            sort: SortOption::PriceAsc,
            ..Default::default()
        };
        assert_eq!(symbols(&query.apply(&reversed)), vec!["CCC", "AAA", "BBB"]);
    }

    #[test]
    fn test_search_with_no_match_is_empty() {
        let query = MarketQuery {
            search: "dogecoin".to_string(),
            ..Default::default()
        };
        assert!(query.apply(&SAMPLE_MARKETS).is_empty());
    }

    #[test]
    fn test_parse_filters_and_sorts() {
        assert_eq!("ETF".parse::<CategoryFilter>(), Ok(CategoryFilter::Only(MarketKind::Etf)));
        assert_eq!("price-desc".parse::<SortOption>(), Ok(SortOption::PriceDesc));
        assert!("volume".parse::<SortOption>().is_err());
        assert!("stocks".parse::<CategoryFilter>().is_err());
        assert_eq!(CategoryFilter::Only(MarketKind::Etf).next(), CategoryFilter::All);
        assert_eq!(SortOption::NameAsc.next(), SortOption::ChangeDesc);
    }

    #[test]
    fn test_asset_record_remap() {
        let json = r#"[{
            "id": "a1", "symbol": "BTC", "assetName": "Bitcoin",
            "currentPrice": 110.0, "changePercentage": 10.0, "category": "CRYPTO",
            "open": 100.0, "high": 120.0, "low": 90.0,
            "lastUpdated": "2024-05-01T14:05:00Z"
        }, {
            "id": "a2", "symbol": "VNINDEX", "assetName": "VN Index",
            "currentPrice": 1.0, "changePercentage": 0.0, "category": "INDEX",
            "open": 1.0, "high": 1.0, "low": 1.0, "lastUpdated": "yesterday"
        }]"#;
        let items = from_string(json).unwrap();

        assert_eq!(items[0].kind, MarketKind::Crypto);
        assert_eq!(items[0].name, "Bitcoin");
        assert_eq!(items[0].data, vec![100.0, 96.0, 105.0, 117.0, 110.0]);
        assert_eq!(items[0].last_updated, "02:05 PM");
        assert_eq!(items[1].kind, MarketKind::Commodity);
        assert_eq!(items[1].last_updated, "N/A");
    }

    #[test]
    fn test_find_and_detail_range() {
        let btc = find(&SAMPLE_MARKETS, "btc").unwrap();
        assert_eq!(btc.id, "1");
        assert_eq!(btc.open(), Some(62100.0));
        assert_eq!(btc.high(), Some(64230.5));
        assert_eq!(btc.low(), Some(62100.0));
        assert_eq!(
            find(&SAMPLE_MARKETS, "404"),
            Err(ValidationError::MarketNotFound("404".to_string()))
        );
    }

    #[test]
    fn test_malformed_market_items_report_both_shapes() {
        let json = r#"[{"id": "1", "symbol": "BTC", "name": "Bitcoin", "price": 1.0,
            "change": 0.0, "type": "crypto", "lastUpdated": "09:30 AM"}]"#;
        let message = from_string(json).unwrap_err().to_string();
        assert!(message.contains("missing field `data`"), "{message}");
        assert!(message.contains("missing field `assetName`"), "{message}");
    }

    #[test]
    fn test_load_example_markets() {
        let markets = load_markets(Path::new("example_markets.json")).unwrap();
        assert!(!markets.is_empty());
    }
}
