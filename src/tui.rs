use crate::error::ValidationError;
use crate::format::{format_amount, format_currency, format_percent, format_price};
use crate::market::{MarketItem, MarketKind, MarketQuery};
use crate::portfolio::Portfolio;
use crate::split::{self, Category, Planner};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tui_big_text::{BigText, PixelSize};

/// Simulated network latency before the market feed shows up.
pub const MARKET_FEED_DELAY: Duration = Duration::from_millis(1200);

const CURSOR_BLINK: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tab {
    Split,
    Markets,
    Portfolio,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppMode {
    Normal,
    EditIncome,
    Search,
    ConfirmRemove,
}

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Tab::Split => "Income Split",
            Tab::Markets => "Markets",
            Tab::Portfolio => "Portfolio",
        }
    }

    fn all() -> &'static [Tab] {
        &[Tab::Split, Tab::Markets, Tab::Portfolio]
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "split" => Some(Tab::Split),
            "markets" => Some(Tab::Markets),
            "portfolio" => Some(Tab::Portfolio),
            _ => None,
        }
    }
}

fn category_color(category: Category) -> Color {
    match category {
        Category::Needs => Color::Blue,
        Category::Wants => Color::Magenta,
        Category::Save => Color::Green,
    }
}

pub struct App {
    pub current_tab: Tab,
    pub mode: AppMode,
    pub should_quit: bool,
    pub currency: String,
    pub error_message: Option<String>,
    pub flash_state: bool,
    pub input: String,
    pub planner: Planner,
    pub selected_category: usize,
    pub markets: Option<Vec<MarketItem>>,
    pub market_query: MarketQuery,
    pub market_receiver: Option<mpsc::UnboundedReceiver<Vec<MarketItem>>>,
    pub portfolio: Portfolio,
    pub portfolio_path: Option<PathBuf>,
    pub selected_holding: usize,
}

impl App {
    pub fn new(
        currency: String,
        planner: Planner,
        portfolio: Portfolio,
        portfolio_path: Option<PathBuf>,
    ) -> App {
        App {
            current_tab: Tab::Split,
            mode: AppMode::Normal,
            should_quit: false,
            currency,
            error_message: None,
            flash_state: false,
            input: String::new(),
            planner,
            selected_category: 0,
            markets: None,
            market_query: MarketQuery::default(),
            market_receiver: None,
            portfolio,
            portfolio_path,
            selected_holding: 0,
        }
    }

    pub fn set_market_receiver(&mut self, receiver: mpsc::UnboundedReceiver<Vec<MarketItem>>) {
        self.market_receiver = Some(receiver);
    }

    pub fn try_receive_markets(&mut self) -> bool {
        if let Some(receiver) = &mut self.market_receiver {
            if let Ok(markets) = receiver.try_recv() {
                self.markets = Some(markets);
                self.market_receiver = None;
                return true;
            }
        }
        false
    }

    pub fn next_tab(&mut self) {
        let tabs = Tab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + 1) % tabs.len()];
    }

    pub fn previous_tab(&mut self) {
        let tabs = Tab::all();
        let current_index = tabs
            .iter()
            .position(|&t| t == self.current_tab)
            .unwrap_or(0);
        self.current_tab = tabs[(current_index + tabs.len() - 1) % tabs.len()];
    }

    pub fn selected_category(&self) -> Category {
        let categories = Category::all();
        categories[self.selected_category.min(categories.len() - 1)]
    }

    pub fn select_next(&mut self) {
        match self.current_tab {
            Tab::Split => {
                if self.selected_category < Category::all().len() - 1 {
                    self.selected_category += 1;
                }
            }
            Tab::Portfolio => {
                if self.selected_holding < self.portfolio.holdings.len().saturating_sub(1) {
                    self.selected_holding += 1;
                }
            }
            Tab::Markets => {}
        }
    }

    pub fn select_previous(&mut self) {
        match self.current_tab {
            Tab::Split => self.selected_category = self.selected_category.saturating_sub(1),
            Tab::Portfolio => self.selected_holding = self.selected_holding.saturating_sub(1),
            Tab::Markets => {}
        }
    }

    pub fn adjust_selected_share(&mut self, delta: i64) {
        let category = self.selected_category();
        self.planner.nudge(category, delta);
    }

    pub fn enter_income_edit(&mut self) {
        self.mode = AppMode::EditIncome;
        let income = self.planner.state().income();
        self.input = if income.fract() == 0.0 {
            format!("{income:.0}")
        } else {
            format!("{income}")
        };
    }

    pub fn exit_input_mode(&mut self) {
        self.mode = AppMode::Normal;
        self.input.clear();
    }

    pub fn save_income(&mut self) -> Result<(), ValidationError> {
        let income = split::parse_income(&self.input)?;
        self.planner.set_income(income);
        self.exit_input_mode();
        Ok(())
    }

    pub fn start_search(&mut self) {
        self.mode = AppMode::Search;
        self.input = self.market_query.search.clone();
    }

    pub fn visible_markets(&self) -> Vec<MarketItem> {
        match &self.markets {
            Some(markets) => self.market_query.apply(markets),
            None => Vec::new(),
        }
    }

    pub fn request_remove(&mut self) {
        if self.selected_holding < self.portfolio.holdings.len() {
            self.mode = AppMode::ConfirmRemove;
        }
    }

    pub fn confirm_remove(&mut self) -> Result<(), String> {
        self.mode = AppMode::Normal;
        let id = match self.portfolio.sorted_by_value().get(self.selected_holding) {
            Some(h) => h.get_id(),
            None => return Err("Invalid holding selected".to_string()),
        };
        self.portfolio.remove_holding(id).map_err(|e| e.to_string())?;
        if self.selected_holding >= self.portfolio.holdings.len() {
            self.selected_holding = self.portfolio.holdings.len().saturating_sub(1);
        }
        if let Some(path) = &self.portfolio_path {
            self.portfolio
                .save_to_file(path)
                .map_err(|e| format!("{e:#}"))?;
        }
        Ok(())
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        if self.error_message.is_some() {
            self.error_message = None;
            return;
        }

        match self.mode {
            AppMode::Normal => self.handle_normal_key(code),
            AppMode::EditIncome => match code {
                KeyCode::Esc => self.exit_input_mode(),
                KeyCode::Enter => {
                    if let Err(e) = self.save_income() {
                        self.error_message = Some(e.to_string());
                        self.exit_input_mode();
                    }
                }
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) => {
                    if c.is_ascii_digit()
                        || (c == '.' && !self.input.contains('.'))
                        || (c == '-' && self.input.is_empty())
                    {
                        self.input.push(c);
                    }
                }
                _ => {}
            },
            AppMode::Search => match code {
                KeyCode::Esc => {
                    self.market_query.search.clear();
                    self.exit_input_mode();
                }
                KeyCode::Enter => self.exit_input_mode(),
                KeyCode::Backspace => {
                    self.input.pop();
                    self.market_query.search = self.input.clone();
                }
                KeyCode::Char(c) => {
                    self.input.push(c);
                    self.market_query.search = self.input.clone();
                }
                _ => {}
            },
            AppMode::ConfirmRemove => match code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    if let Err(e) = self.confirm_remove() {
                        self.error_message = Some(e);
                    }
                }
                _ => self.mode = AppMode::Normal,
            },
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.current_tab == Tab::Markets && self.market_query.is_filtered() {
                    self.market_query = MarketQuery {
                        sort: self.market_query.sort,
                        ..Default::default()
                    };
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Char('h') | KeyCode::BackTab => self.previous_tab(),
            KeyCode::Char('l') | KeyCode::Tab => self.next_tab(),
            KeyCode::Char('1') => self.current_tab = Tab::Split,
            KeyCode::Char('2') => self.current_tab = Tab::Markets,
            KeyCode::Char('3') => self.current_tab = Tab::Portfolio,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_previous(),
            _ => match self.current_tab {
                Tab::Split => match code {
                    KeyCode::Right => self.adjust_selected_share(1),
                    KeyCode::Left => self.adjust_selected_share(-1),
                    KeyCode::Char('L') => self.adjust_selected_share(5),
                    KeyCode::Char('H') => self.adjust_selected_share(-5),
                    KeyCode::Char('i') => self.enter_income_edit(),
                    KeyCode::Char('r') => {
                        self.planner.reset();
                    }
                    KeyCode::Char('s') => self.planner.save_plan(Instant::now()),
                    _ => {}
                },
                Tab::Markets => match code {
                    KeyCode::Char('/') => self.start_search(),
                    KeyCode::Char('c') => {
                        self.market_query.category = self.market_query.category.next();
                    }
                    KeyCode::Char('o') => self.market_query.sort = self.market_query.sort.next(),
                    KeyCode::Left => self.previous_tab(),
                    KeyCode::Right => self.next_tab(),
                    _ => {}
                },
                Tab::Portfolio => match code {
                    KeyCode::Char('d') => self.request_remove(),
                    KeyCode::Left => self.previous_tab(),
                    KeyCode::Right => self.next_tab(),
                    _ => {}
                },
            },
        }
    }
}

pub async fn run_tui(
    planner: Planner,
    markets: Vec<MarketItem>,
    portfolio: Portfolio,
    portfolio_path: Option<PathBuf>,
    currency: String,
    tab: Option<Tab>,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(currency, planner, portfolio, portfolio_path);
    if let Some(tab) = tab {
        app.current_tab = tab;
    }

    let (market_sender, market_receiver) = mpsc::unbounded_channel();
    app.set_market_receiver(market_receiver);

    // The feed is local data; the delay stands in for the network round trip
    tokio::spawn(async move {
        tokio::time::sleep(MARKET_FEED_DELAY).await;
        if market_sender.send(markets).is_err() {
            tracing::debug!("market feed dropped, TUI already closed");
        }
    });

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    let mut last_blink = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        app.try_receive_markets();

        if last_blink.elapsed() >= CURSOR_BLINK {
            app.flash_state = !app.flash_state;
            last_blink = Instant::now();
        }

        if crossterm::event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            break;
        }

        // Let the market feed task make progress between frames
        tokio::task::yield_now().await;
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    let tab_titles: Vec<Line> = Tab::all()
        .iter()
        .map(|t| {
            let style = if *t == app.current_tab {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(t.title(), style))
        })
        .collect();

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title("GenZ Finance"))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow))
        .select(
            Tab::all()
                .iter()
                .position(|&t| t == app.current_tab)
                .unwrap_or(0),
        );

    f.render_widget(tabs, chunks[0]);

    match app.current_tab {
        Tab::Split => render_split(f, chunks[1], app),
        Tab::Markets => render_markets(f, chunks[1], app),
        Tab::Portfolio => render_portfolio(f, chunks[1], app),
    }

    match app.mode {
        AppMode::EditIncome => render_input_dialog(f, app, " Edit Monthly Income ", "New income"),
        AppMode::ConfirmRemove => render_confirm_remove(f, app),
        _ => {}
    }

    if let Some(error) = &app.error_message {
        render_error_popup(f, error);
    }
}

fn render_big_value(f: &mut Frame, area: Rect, title: String, value: String, color: Color) {
    let big_text = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .lines(vec![value.clone().into()])
        .build();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center);
    f.render_widget(block, area);

    let inner = area.inner(ratatui::layout::Margin {
        horizontal: 1,
        vertical: 1,
    });
    // Approximate width per character in quadrant big text
    let big_text_width = value.chars().count() as u16 * 4;
    let centered_area = if big_text_width < inner.width {
        let margin = (inner.width - big_text_width) / 2;
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(margin),
                Constraint::Min(0),
                Constraint::Length(margin),
            ])
            .split(inner)[1]
    } else {
        inner
    };

    f.render_widget(big_text, centered_area);
}

fn render_split(f: &mut Frame, area: Rect, app: &App) {
    let state = app.planner.state();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(3),
            Constraint::Min(9),
            Constraint::Length(3),
        ])
        .split(area);

    render_big_value(
        f,
        chunks[0],
        format!("Monthly Income ({})", app.currency),
        format_currency(state.income(), &app.currency),
        Color::Cyan,
    );

    // Stacked bar: one block per percent point, unallocated in gray
    let inner_width = chunks[1].width.saturating_sub(2) as usize;
    let mut spans = Vec::new();
    let mut used = 0usize;
    for category in Category::all() {
        let width = inner_width * usize::from(state.share(*category)) / 100;
        used += width;
        spans.push(Span::styled(
            "█".repeat(width),
            Style::default().fg(category_color(*category)),
        ));
    }
    if !state.is_fully_allocated() {
        spans.push(Span::styled(
            "░".repeat(inner_width.saturating_sub(used)),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let status = if state.is_fully_allocated() {
        Span::styled(" Fully allocated ", Style::default().fg(Color::Green))
    } else {
        Span::styled(
            format!(" {}% unallocated ", state.unallocated()),
            Style::default().fg(Color::Yellow),
        )
    };
    let bar = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Line::from(vec![Span::raw("Split "), status])),
    );
    f.render_widget(bar, chunks[1]);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(chunks[2]);

    for (i, category) in Category::all().iter().enumerate() {
        let selected = i == app.selected_category;
        let share = state.share(*category);
        let border_style = if selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        let title = format!(
            "{}{} ({}%, max {}%) - {}",
            if selected { "▶ " } else { "" },
            category.title(),
            share,
            state.max_allowed(*category),
            category.description()
        );
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border_style)
                    .title(title),
            )
            .gauge_style(Style::default().fg(category_color(*category)))
            .ratio(f64::from(share) / 100.0)
            .label(format_currency(state.amount(*category), &app.currency));
        f.render_widget(gauge, rows[i]);
    }

    let saved = if app.planner.is_saved(Instant::now()) {
        "✔ Plan saved | "
    } else {
        ""
    };
    let help = Paragraph::new(format!(
        "{saved}j/k (select) | ←/→ (±1) | H/L (±5) | i (income) | r (reset) | s (save) | q (quit)"
    ))
    .block(Block::default().borders(Borders::ALL).title("Help"))
    .style(Style::default().fg(Color::Gray))
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[3]);
}

fn render_markets(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let search_text = if app.mode == AppMode::Search {
        let cursor = if app.flash_state { "█" } else { "▌" };
        format!("{}{cursor}", app.input)
    } else if app.market_query.search.is_empty() {
        "(press / to search)".to_string()
    } else {
        app.market_query.search.clone()
    };
    let controls = Paragraph::new(Line::from(vec![
        Span::styled("Search: ", Style::default().fg(Color::Gray)),
        Span::styled(search_text, Style::default().fg(Color::White)),
        Span::styled("  Category [c]: ", Style::default().fg(Color::Gray)),
        Span::styled(
            app.market_query.category.as_str(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled("  Sort [o]: ", Style::default().fg(Color::Gray)),
        Span::styled(
            app.market_query.sort.title(),
            Style::default().fg(Color::Yellow),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Filters"));
    f.render_widget(controls, chunks[0]);

    if app.markets.is_none() {
        render_loading(f, chunks[1], "Loading market data...");
        return;
    }

    let visible = app.visible_markets();
    if visible.is_empty() {
        let empty = Paragraph::new("No markets match. Esc clears the filters.")
            .block(Block::default().borders(Borders::ALL).title("Markets"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
        return;
    }

    let header_cells = ["Symbol", "Name", "Type", "Price", "Change", "Updated"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = visible.iter().map(|m| {
        let change_color = if m.change >= 0.0 {
            Color::Green
        } else {
            Color::Red
        };
        let kind_color = match m.kind {
            MarketKind::Crypto => Color::Yellow,
            MarketKind::Forex => Color::Cyan,
            MarketKind::Commodity => Color::Magenta,
            MarketKind::Etf => Color::Blue,
        };
        Row::new(vec![
            Cell::from(m.symbol.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
            Cell::from(m.name.clone()),
            Cell::from(m.kind.as_str()).style(Style::default().fg(kind_color)),
            Cell::from(format_price(m.price)),
            Cell::from(format_percent(m.change)).style(Style::default().fg(change_color)),
            Cell::from(m.last_updated.clone()),
        ])
        .height(1)
    });

    let constraints = [
        Constraint::Percentage(14),
        Constraint::Percentage(32),
        Constraint::Percentage(12),
        Constraint::Percentage(16),
        Constraint::Percentage(12),
        Constraint::Percentage(14),
    ];
    let title = format!(
        "Markets ({}) - / (search) | c (category) | o (sort) | Esc (clear)",
        visible.len()
    );
    let table = Table::new(rows, constraints)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(Color::White));

    f.render_widget(table, chunks[1]);
}

fn render_portfolio(f: &mut Frame, area: Rect, app: &App) {
    let portfolio = &app.portfolio;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(area);

    let total_pl = portfolio.get_total_pl();
    let pl_color = if total_pl >= 0.0 {
        Color::Green
    } else {
        Color::Red
    };
    render_big_value(
        f,
        chunks[0],
        format!(
            "Net Worth ({}) | All time {}",
            app.currency,
            format_percent(portfolio.get_pl_percent())
        ),
        format_currency(portfolio.get_total_value(), &app.currency),
        pl_color,
    );

    if portfolio.holdings.is_empty() {
        let empty = Paragraph::new("No active positions. Add one with `genzf_rs portfolio add`.")
            .block(Block::default().borders(Borders::ALL).title("Holdings"))
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, chunks[1]);
        return;
    }

    let header_cells = ["Asset", "Qty", "Avg Cost", "Price", "Value", "P/L"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = portfolio
        .sorted_by_value()
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            let row_style = if i == app.selected_holding {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            let color = if h.is_loss() { Color::Red } else { Color::Green };
            Row::new(vec![
                Cell::from(h.get_symbol().to_string())
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(format_amount(h.get_quantity())),
                Cell::from(format_currency(h.get_avg_cost(), &app.currency)),
                Cell::from(format_currency(h.get_current_price(), &app.currency)),
                Cell::from(format_currency(h.market_value(), &app.currency)),
                Cell::from(format_currency(h.pl(), &app.currency))
                    .style(Style::default().fg(color)),
            ])
            .height(1)
            .style(row_style)
        });

    let total_row = Row::new(vec![
        Cell::from("TOTAL").style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Cell::from(""),
        Cell::from(""),
        Cell::from(""),
        Cell::from(format_currency(portfolio.get_total_value(), &app.currency))
            .style(Style::default().add_modifier(Modifier::BOLD)),
        Cell::from(format_currency(total_pl, &app.currency))
            .style(Style::default().fg(pl_color).add_modifier(Modifier::BOLD)),
    ])
    .height(1);

    let constraints = [
        Constraint::Percentage(12),
        Constraint::Percentage(12),
        Constraint::Percentage(19),
        Constraint::Percentage(19),
        Constraint::Percentage(19),
        Constraint::Percentage(19),
    ];
    let table = Table::new(rows.chain(std::iter::once(total_row)), constraints)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Holdings - j/k (select) | d (close position) | q (quit)"),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(table, chunks[1]);
}

fn render_loading(f: &mut Frame, area: Rect, message: &str) {
    let loading_text = Paragraph::new(message.to_string())
        .block(Block::default().borders(Borders::ALL).title("Loading"))
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center);

    f.render_widget(loading_text, area);
}

fn render_input_dialog(f: &mut Frame, app: &App, title: &str, label: &str) {
    let popup_area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, popup_area);

    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Length(2),
        ])
        .margin(1)
        .split(popup_area);

    let main_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
    f.render_widget(main_block, popup_area);

    let cursor = if app.flash_state { "█" } else { "▌" };
    let input_field = Paragraph::new(format!("{}{cursor}", app.input))
        .style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(format!(" {label} ")),
        );
    f.render_widget(input_field, popup_layout[0]);

    let (preview, style) = match app.input.trim().parse::<f64>() {
        Ok(v) => (
            format_currency(v, &app.currency),
            Style::default().fg(Color::Green),
        ),
        Err(_) if app.input.is_empty() => {
            ("Enter amount...".to_string(), Style::default().fg(Color::Gray))
        }
        Err(_) => (
            "Invalid number format".to_string(),
            Style::default().fg(Color::Red),
        ),
    };
    let preview_paragraph = Paragraph::new(preview)
        .style(style)
        .alignment(Alignment::Center);
    f.render_widget(preview_paragraph, popup_layout[1]);

    let instructions = Paragraph::new("Enter: Save | Esc: Cancel")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    f.render_widget(instructions, popup_layout[2]);
}

fn render_confirm_remove(f: &mut Frame, app: &App) {
    let Some(holding) = app
        .portfolio
        .sorted_by_value()
        .get(app.selected_holding)
        .copied()
    else {
        return;
    };

    let popup_area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, popup_area);

    let text = format!(
        "Close position {} ({} units, {})?\n\ny: confirm | any other key: cancel",
        holding.get_symbol(),
        format_amount(holding.get_quantity()),
        format_currency(holding.market_value(), &app.currency)
    );
    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Close Position ")
                .style(Style::default().fg(Color::Yellow)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

fn render_error_popup(f: &mut Frame, error: &str) {
    let popup_area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, popup_area);

    let error_paragraph = Paragraph::new(error)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .style(Style::default().fg(Color::Red)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(error_paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
