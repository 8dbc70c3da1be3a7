use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    engine::{period::PeriodKind, snapshot::Snapshot},
    tariff::{RateTable, Tier, day::DayRule},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_rate_table(rate_table: &RateTable) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Season", "Months", "Days", "Period", "Start", "End", "Rate"]);
    for (name, season) in rate_table.seasons() {
        let months = season.months.iter().join(", ");
        let day_rules = [("Weekdays", season.weekday.as_ref()), ("Weekends", season.weekend.as_ref())];
        if day_rules.iter().all(|(_, day_rule)| day_rule.is_none()) {
            table.add_row(tier_row(name, &months, "All", &season.fallback, None));
            continue;
        }
        for (days, day_rule) in day_rules {
            let Some(day_rule) = day_rule else {
                continue;
            };
            add_day_rows(&mut table, name, &months, days, day_rule);
        }
    }
    table
}

fn add_day_rows(table: &mut Table, season: &str, months: &str, days: &str, day_rule: &DayRule) {
    for window in &day_rule.windows {
        let start = window.start.format("%H:%M").to_string();
        let end = window.end.format("%H:%M").to_string();
        table.add_row(tier_row(season, months, days, &window.tier, Some((start, end))));
    }
    table.add_row(tier_row(season, months, days, &day_rule.default, None));
}

fn tier_row(
    season: &str,
    months: &str,
    days: &str,
    tier: &Tier,
    window: Option<(String, String)>,
) -> Vec<Cell> {
    let (start, end) = window.unwrap_or_else(|| ("*".to_string(), "*".to_string()));
    vec![
        Cell::new(season),
        Cell::new(months).add_attribute(Attribute::Dim),
        Cell::new(days),
        Cell::new(&tier.label),
        Cell::new(start),
        Cell::new(end).add_attribute(Attribute::Dim),
        Cell::new(tier.rate).set_alignment(CellAlignment::Right),
    ]
}

pub fn build_snapshot_table(snapshot: &Snapshot) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Period", "Energy", "Cost"]);
    for kind in PeriodKind::ALL {
        let totals = snapshot.totals(kind);
        let name = if snapshot.rolled_over.contains(kind) {
            Cell::new(kind).fg(Color::Green)
        } else {
            Cell::new(kind)
        };
        table.add_row(vec![
            name,
            Cell::new(totals.energy).set_alignment(CellAlignment::Right),
            Cell::new(totals.cost).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("previous month").add_attribute(Attribute::Dim),
        Cell::new(snapshot.previous_month.energy).set_alignment(CellAlignment::Right),
        Cell::new(snapshot.previous_month.cost).set_alignment(CellAlignment::Right),
    ]);
    table
}
