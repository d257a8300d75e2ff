//! Income split planner
//!
//! Divides an income between three budget categories (needs, wants, save).
//! The three shares are integer percentages whose sum never exceeds 100. Moving
//! one share clamps it to the headroom left by the other two; the other two
//! are never rebalanced.

use crate::error::ValidationError;
use crate::format::format_currency;
use colored::Colorize;
use eyre::WrapErr;
use piechart::{Chart, Color};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// 20M VND
pub const DEFAULT_INCOME: f64 = 20_000_000.0;

pub const DEFAULT_SHARES: Shares = Shares {
    needs: 50,
    wants: 30,
    save: 20,
};

/// How long the "plan saved" confirmation stays visible.
pub const SAVED_NOTICE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Needs,
    Wants,
    Save,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Needs, Category::Wants, Category::Save]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Needs => "needs",
            Category::Wants => "wants",
            Category::Save => "save",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::Needs => "Needs",
            Category::Wants => "Wants",
            Category::Save => "Save",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Needs => "Rent, bills, groceries, transport",
            Category::Wants => "Dining out, hobbies, shopping",
            Category::Save => "Savings, investments, debt payoff",
        }
    }

    /// The two categories whose shares bound this one.
    pub fn others(&self) -> [Category; 2] {
        match self {
            Category::Needs => [Category::Wants, Category::Save],
            Category::Wants => [Category::Needs, Category::Save],
            Category::Save => [Category::Needs, Category::Wants],
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "needs" => Ok(Category::Needs),
            "wants" => Ok(Category::Wants),
            "save" | "savings" | "invest" => Ok(Category::Save),
            _ => Err(ValidationError::UnknownCategory(s.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Percentages per category. Only `AllocationState` mutates them, so the sum
/// stays within 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shares {
    pub needs: u8,
    pub wants: u8,
    pub save: u8,
}

impl Shares {
    pub fn get(&self, category: Category) -> u8 {
        match category {
            Category::Needs => self.needs,
            Category::Wants => self.wants,
            Category::Save => self.save,
        }
    }

    fn set(&mut self, category: Category, value: u8) {
        match category {
            Category::Needs => self.needs = value,
            Category::Wants => self.wants = value,
            Category::Save => self.save = value,
        }
    }

    pub fn total(&self) -> u16 {
        u16::from(self.needs) + u16::from(self.wants) + u16::from(self.save)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationState {
    income: f64,
    shares: Shares,
}

impl Default for AllocationState {
    fn default() -> Self {
        Self::new(DEFAULT_INCOME)
    }
}

impl AllocationState {
    pub fn new(income: f64) -> AllocationState {
        AllocationState {
            income,
            shares: DEFAULT_SHARES,
        }
    }

    pub fn income(&self) -> f64 {
        self.income
    }

    pub fn shares(&self) -> Shares {
        self.shares
    }

    pub fn share(&self, category: Category) -> u8 {
        self.shares.get(category)
    }

    /// Highest value `category` may take given the other two shares.
    pub fn max_allowed(&self, category: Category) -> u8 {
        let sum_others: u16 = category
            .others()
            .iter()
            .map(|c| u16::from(self.shares.get(*c)))
            .sum();
        100u16.saturating_sub(sum_others) as u8
    }

    /// Clamps `requested` into `[0, max_allowed(category)]` and stores it.
    /// Never fails and never touches the other two shares.
    pub fn set_share(mut self, category: Category, requested: i64) -> AllocationState {
        let max_allowed = self.max_allowed(category);
        let new_value = requested.clamp(0, i64::from(max_allowed)) as u8;
        if i64::from(new_value) != requested {
            tracing::debug!(
                category = category.as_str(),
                requested,
                clamped = new_value,
                "share clamped to headroom"
            );
        }
        self.shares.set(category, new_value);
        self
    }

    /// Stored as given, negative incomes included.
    pub fn set_income(mut self, income: f64) -> AllocationState {
        self.income = income;
        self
    }

    /// Restores the default shares, keeping the income.
    pub fn reset(mut self) -> AllocationState {
        self.shares = DEFAULT_SHARES;
        self
    }

    pub fn amount(&self, category: Category) -> f64 {
        self.income * f64::from(self.shares.get(category)) / 100.0
    }

    pub fn unallocated(&self) -> u8 {
        100u16.saturating_sub(self.shares.total()) as u8
    }

    pub fn unallocated_amount(&self) -> f64 {
        self.income * f64::from(self.unallocated()) / 100.0
    }

    pub fn is_fully_allocated(&self) -> bool {
        self.unallocated() == 0
    }

    pub fn validate_complete(&self) -> Result<(), ValidationError> {
        match self.unallocated() {
            0 => Ok(()),
            left => Err(ValidationError::IncompletePlan(left)),
        }
    }

    /// Rebuilds a state from untrusted plan values. Shares are replayed from
    /// zero in the order needs, wants, save, so earlier categories win when
    /// the file asks for more than 100.
    pub fn from_plan(plan: &PlanFile) -> AllocationState {
        let empty = AllocationState {
            income: plan.income,
            shares: Shares {
                needs: 0,
                wants: 0,
                save: 0,
            },
        };
        empty
            .set_share(Category::Needs, plan.needs)
            .set_share(Category::Wants, plan.wants)
            .set_share(Category::Save, plan.save)
    }

    pub fn to_plan(&self) -> PlanFile {
        PlanFile {
            income: self.income,
            needs: i64::from(self.shares.needs),
            wants: i64::from(self.shares.wants),
            save: i64::from(self.shares.save),
        }
    }

    // Print the split as a table followed by the remainder status
    pub fn print(&self, currency: &str) {
        use comfy_table::{
            presets::UTF8_FULL, Attribute, Cell, CellAlignment, Color as TColor,
            ContentArrangement, Table,
        };

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_width(100);

        table.set_header(vec![
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Share").add_attribute(Attribute::Bold),
            Cell::new("Max").add_attribute(Attribute::Bold),
            Cell::new("Amount").add_attribute(Attribute::Bold),
            Cell::new("Covers").add_attribute(Attribute::Bold),
        ]);

        for category in Category::all() {
            let color = match category {
                Category::Needs => TColor::DarkBlue,
                Category::Wants => TColor::DarkMagenta,
                Category::Save => TColor::DarkGreen,
            };
            table.add_row(vec![
                Cell::new(category.title()).fg(color),
                Cell::new(format!("{}%", self.share(*category))).set_alignment(CellAlignment::Right),
                Cell::new(format!("{}%", self.max_allowed(*category)))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format_currency(self.amount(*category), currency))
                    .set_alignment(CellAlignment::Right),
                Cell::new(category.description()),
            ]);
        }

        table.add_row(vec![
            Cell::new("TOTAL").add_attribute(Attribute::Bold),
            Cell::new(format!("{}%", self.shares.total()))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(format_currency(self.income, currency))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
            Cell::new(""),
        ]);

        println!("{table}");

        if self.is_fully_allocated() {
            println!("{}", "Fully allocated".green().bold());
        } else {
            println!(
                "{}",
                format!(
                    "{}% unallocated ({})",
                    self.unallocated(),
                    format_currency(self.unallocated_amount(), currency)
                )
                .yellow()
                .bold()
            );
        }
    }

    pub fn draw_pie_chart(&self) {
        let mut data = vec![];

        for category in Category::all() {
            let color = match category {
                Category::Needs => Color::Blue,
                Category::Wants => Color::Purple,
                Category::Save => Color::Green,
            };
            data.push(piechart::Data {
                label: category.title().to_string(),
                value: f32::from(self.share(*category)),
                color: Some(color.into()),
                fill: '•',
            });
        }

        if !self.is_fully_allocated() {
            data.push(piechart::Data {
                label: "Unallocated".to_string(),
                value: f32::from(self.unallocated()),
                color: Some(Color::White.into()),
                fill: '·',
            });
        }

        Chart::new()
            .legend(true)
            .radius(9)
            .aspect_ratio(3)
            .draw(&data);
    }
}

/// On-disk shape of an exported plan. Values are not trusted on import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanFile {
    pub income: f64,
    pub needs: i64,
    pub wants: i64,
    pub save: i64,
}

/// Parses a typed income. Negative values are fine, `inf` and `NaN` are not.
pub fn parse_income(input: &str) -> Result<f64, ValidationError> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidIncome(input.to_string()))
}

pub fn load_plan(path: &Path) -> eyre::Result<AllocationState> {
    let data = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read plan file {}", path.display()))?;
    let plan: PlanFile = serde_json::from_str(&data)
        .wrap_err_with(|| format!("Plan file {} is not well-formatted", path.display()))?;
    Ok(AllocationState::from_plan(&plan))
}

pub fn export_plan(state: &AllocationState, path: &Path, allow_partial: bool) -> eyre::Result<()> {
    if !state.income().is_finite() {
        return Err(ValidationError::InvalidIncome(state.income().to_string()).into());
    }
    if !allow_partial {
        state.validate_complete()?;
    }
    let json = serde_json::to_string_pretty(&state.to_plan())
        .wrap_err("Failed to serialize plan")?;
    std::fs::write(path, json)
        .wrap_err_with(|| format!("Failed to write plan file {}", path.display()))?;
    tracing::info!(path = %path.display(), "plan exported");
    Ok(())
}

/// An editing session around an `AllocationState` with the transient
/// "plan saved" confirmation.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    state: AllocationState,
    saved_at: Option<Instant>,
}

impl Planner {
    pub fn new(state: AllocationState) -> Planner {
        Planner {
            state,
            saved_at: None,
        }
    }

    pub fn state(&self) -> AllocationState {
        self.state
    }

    pub fn set_share(&mut self, category: Category, requested: i64) -> AllocationState {
        self.state = self.state.set_share(category, requested);
        self.saved_at = None;
        self.state
    }

    /// Moves a share relative to its current value.
    pub fn nudge(&mut self, category: Category, delta: i64) -> AllocationState {
        let current = i64::from(self.state.share(category));
        self.set_share(category, current + delta)
    }

    pub fn set_income(&mut self, income: f64) -> AllocationState {
        self.state = self.state.set_income(income);
        self.saved_at = None;
        self.state
    }

    pub fn reset(&mut self) -> AllocationState {
        self.state = self.state.reset();
        self.saved_at = None;
        self.state
    }

    pub fn save_plan(&mut self, now: Instant) {
        self.saved_at = Some(now);
    }

    pub fn is_saved(&self, now: Instant) -> bool {
        match self.saved_at {
            Some(at) => now.saturating_duration_since(at) < SAVED_NOTICE,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(needs: i64, wants: i64, save: i64) -> AllocationState {
        AllocationState::from_plan(&PlanFile {
            income: DEFAULT_INCOME,
            needs,
            wants,
            save,
        })
    }

    #[test]
    fn test_default_state() {
        let s = AllocationState::default();
        assert_eq!(s.shares(), DEFAULT_SHARES);
        assert_eq!(s.income(), 20_000_000.0);
        assert_eq!(s.unallocated(), 0);
    }

    #[test]
    fn test_set_share_clamps_to_headroom() {
        let s = AllocationState::default().set_share(Category::Needs, 80);
        assert_eq!(s.share(Category::Needs), 50);
        assert_eq!(s.unallocated(), 0);
    }

    #[test]
    fn test_set_share_within_range() {
        let s = AllocationState::default().set_share(Category::Wants, 10);
        assert_eq!(
            s.shares(),
            Shares {
                needs: 50,
                wants: 10,
                save: 20
            }
        );
        assert_eq!(s.unallocated(), 20);
        assert_eq!(s.max_allowed(Category::Needs), 70);
    }

    #[test]
    fn test_set_share_negative_clamps_to_zero() {
        let s = AllocationState::default().set_share(Category::Save, -5);
        assert_eq!(s.share(Category::Save), 0);
        assert_eq!(s.unallocated(), 20);
    }

    #[test]
    fn test_sum_never_exceeds_hundred_and_siblings_untouched() {
        for needs in (0..=100).step_by(10) {
            for wants in (0..=100 - needs).step_by(10) {
                let start = state(needs, wants, 100 - needs - wants);
                for category in Category::all() {
                    for requested in (-20..=130).step_by(7) {
                        let next = start.set_share(*category, requested);
                        assert!(next.shares().total() <= 100);
                        for other in category.others() {
                            assert_eq!(next.share(other), start.share(other));
                        }
                        assert_eq!(
                            u16::from(next.unallocated()),
                            100 - next.shares().total()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_set_share_idempotent_in_range() {
        let start = state(40, 20, 10);
        for category in Category::all() {
            for v in 0..=i64::from(start.max_allowed(*category)) {
                let once = start.set_share(*category, v);
                assert_eq!(once.set_share(*category, v), once);
            }
        }
    }

    #[test]
    fn test_ceiling_depends_only_on_other_shares() {
        let a = state(30, 30, 0)
            .set_share(Category::Needs, 60)
            .set_share(Category::Save, 60);
        let b = state(30, 30, 0)
            .set_share(Category::Save, 60)
            .set_share(Category::Needs, 60);
        assert_eq!(a.max_allowed(Category::Wants), 30);
        assert_eq!(b.max_allowed(Category::Wants), 30);
        assert_eq!(a.share(Category::Needs), 60);
        assert_eq!(a.share(Category::Save), 10);
        assert_eq!(b.share(Category::Save), 40);
        assert_eq!(b.share(Category::Needs), 30);
        assert_eq!(a.unallocated(), 0);
        assert_eq!(b.unallocated(), 0);
    }

    #[test]
    fn test_reset_restores_defaults_keeps_income() {
        let s = state(0, 0, 0).set_income(5_000.0).reset();
        assert_eq!(s.shares(), DEFAULT_SHARES);
        assert_eq!(s.income(), 5_000.0);
    }

    #[test]
    fn test_amounts_follow_income() {
        let s = AllocationState::default();
        assert_eq!(s.amount(Category::Needs), 10_000_000.0);
        assert_eq!(s.amount(Category::Wants), 6_000_000.0);
        assert_eq!(s.amount(Category::Save), 4_000_000.0);

        let negative = s.set_income(-1_000.0);
        assert_eq!(negative.income(), -1_000.0);
        assert_eq!(negative.amount(Category::Needs), -500.0);
    }

    #[test]
    fn test_from_plan_replays_in_order() {
        let s = state(70, 50, 10);
        assert_eq!(
            s.shares(),
            Shares {
                needs: 70,
                wants: 30,
                save: 0
            }
        );
        assert_eq!(state(200, -3, 5).share(Category::Needs), 100);
    }

    #[test]
    fn test_validate_complete() {
        assert!(AllocationState::default().validate_complete().is_ok());
        let partial = AllocationState::default().set_share(Category::Wants, 25);
        assert_eq!(
            partial.validate_complete(),
            Err(ValidationError::IncompletePlan(5))
        );
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Needs".parse::<Category>(), Ok(Category::Needs));
        assert_eq!(" invest ".parse::<Category>(), Ok(Category::Save));
        assert!("rent".parse::<Category>().is_err());
    }

    #[test]
    fn test_planner_saved_notice_expires_and_resets() {
        let mut planner = Planner::default();
        let t0 = Instant::now();
        planner.save_plan(t0);
        assert!(planner.is_saved(t0 + Duration::from_secs(2)));
        assert!(!planner.is_saved(t0 + SAVED_NOTICE));

        planner.save_plan(t0);
        planner.nudge(Category::Save, -1);
        assert!(!planner.is_saved(t0));
        assert_eq!(planner.state().share(Category::Save), 19);

        planner.save_plan(t0);
        planner.set_income(1.0);
        assert!(!planner.is_saved(t0));

        planner.save_plan(t0);
        planner.reset();
        assert!(!planner.is_saved(t0));
        assert_eq!(planner.state().shares(), DEFAULT_SHARES);
    }

    #[test]
    fn test_export_and_load_plan() {
        let path = std::env::temp_dir().join(format!("genzf_plan_{}.json", std::process::id()));
        let s = AllocationState::default().set_share(Category::Wants, 20);

        assert!(export_plan(&s, &path, false).is_err());
        export_plan(&s, &path, true).unwrap();
        let loaded = load_plan(&path).unwrap();
        assert_eq!(loaded, s);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_parse_income() {
        assert_eq!(parse_income(" 15000000 "), Ok(15_000_000.0));
        assert_eq!(parse_income("-100"), Ok(-100.0));
        for bad in ["inf", "-inf", "NaN", "abc", ""] {
            assert_eq!(
                parse_income(bad),
                Err(ValidationError::InvalidIncome(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_export_refuses_non_finite_income() {
        let path = std::env::temp_dir().join(format!("genzf_plan_inf_{}.json", std::process::id()));
        let s = AllocationState::default().set_income(f64::INFINITY);

        let err = export_plan(&s, &path, true).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::InvalidIncome("inf".to_string()))
        );
        assert!(!path.exists());

        let finite = s.set_income(-250.0);
        export_plan(&finite, &path, false).unwrap();
        assert_eq!(load_plan(&path).unwrap(), finite);
        std::fs::remove_file(&path).unwrap();
    }
}
