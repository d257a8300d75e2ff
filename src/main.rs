use std::path::{Path, PathBuf};

use crate::calculator::{estimate_tax, parse_lenient, ProfitEstimate};
use crate::market::{CategoryFilter, MarketItem, MarketQuery, SortOption, SAMPLE_MARKETS};
use crate::portfolio::Portfolio;
use crate::split::{AllocationState, Category, Planner};

use clap::{arg, value_parser, ArgMatches, Command};
use eyre::{bail, WrapErr};
use serde::Deserialize;
use serde::Serialize;

mod calculator;
mod error;
mod format;
mod holding;
mod market;
mod portfolio;
mod split;
mod tui;

#[derive(Serialize, Deserialize)]
struct Config {
    currency: String,
    income: f64,
    portfolio_file: String,
    markets_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency: "VND".to_string(),
            income: split::DEFAULT_INCOME,
            portfolio_file: String::new(),
            markets_file: String::new(),
        }
    }
}

fn cli() -> Command {
    Command::new("genzf_rs")
        .about("Income split planner, finance calculators, markets and a mock portfolio")
        .arg_required_else_help(true)
        .subcommand(Command::new("config").about("Print the path to the config file"))
        .subcommand(
            Command::new("split")
                .about("Split an income into needs, wants and savings")
                .arg(
                    arg!(--income <AMOUNT> "Monthly income")
                        .value_parser(split::parse_income)
                        .allow_negative_numbers(true),
                )
                .arg(
                    arg!(--needs <PERCENT> "Share for needs")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true),
                )
                .arg(
                    arg!(--wants <PERCENT> "Share for wants")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true),
                )
                .arg(
                    arg!(--save <PERCENT> "Share for savings")
                        .value_parser(value_parser!(i64))
                        .allow_negative_numbers(true),
                )
                .arg(arg!(--plan <FILE> "Start from a previously exported plan"))
                .arg(arg!(--export <FILE> "Write the resulting plan as JSON"))
                .arg(arg!(--"allow-partial" "Export even if the plan is not fully allocated"))
                .arg(arg!(--"no-chart" "Skip the pie chart")),
        )
        .subcommand(
            Command::new("profit")
                .about("Profit and ROI of a trade")
                .arg(arg!(<BUY> "Buy price").allow_negative_numbers(true))
                .arg(arg!(<SELL> "Sell price").allow_negative_numbers(true))
                .arg(arg!(<QTY> "Quantity").allow_negative_numbers(true))
                .arg(arg!(--symbol <SYMBOL> "Label the trade with a symbol")),
        )
        .subcommand(
            Command::new("tax")
                .about("Estimate income tax on a monthly income")
                .arg(arg!(<INCOME> "Monthly income").allow_negative_numbers(true)),
        )
        .subcommand(
            Command::new("markets")
                .about("Browse market prices")
                .arg(arg!(--search <TEXT> "Filter by name or symbol"))
                .arg(
                    arg!(--category <CATEGORY> "all, crypto, forex, commodity or etf")
                        .default_value("all"),
                )
                .arg(
                    arg!(--sort <ORDER> "name-asc, price-desc, price-asc, change-desc or change-asc")
                        .default_value("change-desc"),
                )
                .arg(arg!(--id <ID> "Show a single market by id or symbol"))
                .arg(
                    arg!(<FILE> "JSON file with market data")
                        .required(false)
                        .default_value(""),
                ),
        )
        .subcommand(
            Command::new("portfolio")
                .about("Show your holdings")
                .arg(
                    arg!(--file <FILE> "JSON file with your holdings")
                        .required(false)
                        .default_value(""),
                )
                .subcommand(
                    Command::new("add")
                        .about("Add a transaction")
                        .arg(arg!(<SYMBOL> "Asset symbol"))
                        .arg(arg!(<QTY> "Quantity"))
                        .arg(arg!(<PRICE> "Purchase price per unit")),
                )
                .subcommand(
                    Command::new("remove")
                        .about("Close a position")
                        .arg(arg!(<ID> "Holding id").value_parser(value_parser!(u32))),
                ),
        )
        .subcommand(
            Command::new("tui").about("Start the interactive terminal UI").arg(
                arg!(--tab <TAB> "Initial tab: split, markets or portfolio").required(false),
            ),
        )
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genzf_rs=warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn non_empty(value: &str) -> Option<&Path> {
    if value.is_empty() {
        None
    } else {
        Some(Path::new(value))
    }
}

// markets from the given file, the configured file, or the built-in sample
fn load_market_list(cfg: &Config, file: &str) -> eyre::Result<Vec<MarketItem>> {
    match non_empty(file).or_else(|| non_empty(&cfg.markets_file)) {
        Some(path) => market::load_markets(path),
        None => Ok(SAMPLE_MARKETS.clone()),
    }
}

fn portfolio_path(cfg: &Config, file: &str) -> Option<PathBuf> {
    non_empty(file)
        .or_else(|| non_empty(&cfg.portfolio_file))
        .map(Path::to_path_buf)
}

fn build_split(cfg: &Config, matches: &ArgMatches) -> eyre::Result<AllocationState> {
    let mut state = match matches.get_one::<String>("plan") {
        Some(plan) => split::load_plan(Path::new(plan))?,
        None => AllocationState::new(cfg.income),
    };

    if let Some(income) = matches.get_one::<f64>("income") {
        state = state.set_income(*income);
    }
    for category in Category::all() {
        if let Some(value) = matches.get_one::<i64>(category.as_str()) {
            state = state.set_share(*category, *value);
        }
    }
    Ok(state)
}

fn run_split(cfg: &Config, matches: &ArgMatches) -> eyre::Result<()> {
    let state = build_split(cfg, matches)?;

    state.print(&cfg.currency);
    if !matches.get_flag("no-chart") {
        state.draw_pie_chart();
    }
    if let Some(export) = matches.get_one::<String>("export") {
        split::export_plan(&state, Path::new(export), matches.get_flag("allow-partial"))?;
        println!("Plan saved to {export}");
    }
    Ok(())
}

fn run_markets(cfg: &Config, matches: &ArgMatches) -> eyre::Result<()> {
    let file = matches.get_one::<String>("FILE").map(String::as_str).unwrap_or("");
    let markets = load_market_list(cfg, file)?;

    if let Some(id) = matches.get_one::<String>("id") {
        let market = market::find(&markets, id)?;
        market::print_market_detail(market);
        return Ok(());
    }

    let mut query = MarketQuery::default();
    if let Some(search) = matches.get_one::<String>("search") {
        query.search = search.clone();
    }
    if let Some(category) = matches.get_one::<String>("category") {
        query.category = category.parse::<CategoryFilter>()?;
    }
    if let Some(sort) = matches.get_one::<String>("sort") {
        query.sort = sort.parse::<SortOption>()?;
    }

    market::print_markets(&query.apply(&markets));
    Ok(())
}

fn run_portfolio(cfg: &Config, matches: &ArgMatches) -> eyre::Result<()> {
    let file = matches.get_one::<String>("file").map(String::as_str).unwrap_or("");
    let path = portfolio_path(cfg, file);

    let mut portfolio = match &path {
        Some(path) => portfolio::load_portfolio(path)?,
        None => Portfolio::demo(),
    };

    match matches.subcommand() {
        Some(("add", sub)) => {
            let Some(path) = &path else {
                bail!("No portfolio file given or configured, nothing to add to");
            };
            let markets = load_market_list(cfg, "")?;
            let arg = |name: &str| sub.get_one::<String>(name).map(String::as_str).unwrap_or("");
            let added = portfolio.add_holding(arg("SYMBOL"), arg("QTY"), arg("PRICE"), &markets)?;
            println!("Added {} with id {}", added.get_symbol(), added.get_id());
            portfolio.save_to_file(path)?;
        }
        Some(("remove", sub)) => {
            let Some(path) = &path else {
                bail!("No portfolio file given or configured, nothing to remove from");
            };
            let id = sub.get_one::<u32>("ID").copied().unwrap_or_default();
            let removed = portfolio.remove_holding(id)?;
            println!("Closed position {} ({})", removed.get_symbol(), removed.get_id());
            portfolio.save_to_file(path)?;
        }
        _ => {
            portfolio.print(&cfg.currency);
            portfolio.print_allocation();
        }
    }
    Ok(())
}

async fn run_tui(cfg: &Config, matches: &ArgMatches) -> eyre::Result<()> {
    let tab = match matches.get_one::<String>("tab") {
        Some(t) => match tui::Tab::from_str(t) {
            Some(tab) => Some(tab),
            None => bail!("Unknown tab '{t}', expected split, markets or portfolio"),
        },
        None => None,
    };

    let markets = load_market_list(cfg, "")?;
    let path = portfolio_path(cfg, "");
    let portfolio = match &path {
        Some(path) => portfolio::load_portfolio(path)?,
        None => Portfolio::demo(),
    };
    let planner = Planner::new(AllocationState::new(cfg.income));

    tui::run_tui(planner, markets, portfolio, path, cfg.currency.clone(), tab)
        .await
        .map_err(|e| eyre::eyre!("TUI error: {e}"))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing();

    let cfg: Config = confy::load("genzf", "config").wrap_err("Failed to load config")?;

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("config", _)) => {
            let path = confy::get_configuration_file_path("genzf", "config")
                .wrap_err("Failed to locate config file")?;
            println!("Your config file is located here: \n{}", path.display());
        }
        Some(("split", sub)) => run_split(&cfg, sub)?,
        Some(("profit", sub)) => {
            let arg = |name: &str| sub.get_one::<String>(name).map(String::as_str).unwrap_or("");
            let estimate = ProfitEstimate::from_inputs(arg("BUY"), arg("SELL"), arg("QTY"));
            estimate.print(&cfg.currency, sub.get_one::<String>("symbol").map(String::as_str));
        }
        Some(("tax", sub)) => {
            let income = sub.get_one::<String>("INCOME").map(String::as_str).unwrap_or("");
            estimate_tax(parse_lenient(income)).print(&cfg.currency);
        }
        Some(("markets", sub)) => run_markets(&cfg, sub)?,
        Some(("portfolio", sub)) => run_portfolio(&cfg, sub)?,
        Some(("tui", sub)) => run_tui(&cfg, sub).await?,
        _ => {
            cli().print_help()?;
        }
    }
    Ok(())
}
