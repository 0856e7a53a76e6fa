use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use uuid::Uuid;

use crate::error::ApiError;

/// Raw cost inputs for one project. The precomputed `project_spending` view
/// and the manual three-query join both reduce to this shape; the arithmetic
/// below is the only place totals are derived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendingParts {
    pub budget: Decimal,
    pub manday_costs: Decimal,
    pub ledger_costs: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpendingSummaryRow {
    pub project_id: Uuid,
    pub project_name: String,
    pub total_spent: Decimal,
    pub burn_rate: Decimal,
}

/// Rate × mandays, matched by role. A manday row whose role has no rate
/// contributes 0; an empty rate set or manday set costs 0.
pub fn manday_costs(rates: &[(String, Decimal)], mandays: &[(String, Decimal)]) -> Decimal {
    if rates.is_empty() || mandays.is_empty() {
        return Decimal::ZERO;
    }
    let rate_map: HashMap<&str, Decimal> = rates
        .iter()
        .map(|(role, rate)| (role.as_str(), *rate))
        .collect();
    mandays
        .iter()
        .map(|(role, days)| {
            *days * rate_map.get(role.as_str()).copied().unwrap_or(Decimal::ZERO)
        })
        .sum()
}

pub fn burn_rate(total_spent: Decimal, budget: Decimal) -> Decimal {
    if budget > Decimal::ZERO {
        (total_spent / budget).round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    } else {
        Decimal::ZERO
    }
}

/// The burn rate is taken from the un-rounded total; only the reported
/// figures are rounded.
pub fn summarize(project_id: Uuid, project_name: &str, parts: &SpendingParts) -> SpendingSummaryRow {
    let total_spent = parts.manday_costs + parts.ledger_costs;
    SpendingSummaryRow {
        project_id,
        project_name: project_name.to_string(),
        burn_rate: burn_rate(total_spent, parts.budget),
        total_spent: total_spent
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
    }
}

/// A project whose inputs failed to load degrades to a zero row; the rest of
/// the batch is unaffected.
pub fn summary_row(
    project_id: Uuid,
    project_name: &str,
    parts: Result<SpendingParts, ApiError>,
) -> SpendingSummaryRow {
    match parts {
        Ok(parts) => summarize(project_id, project_name, &parts),
        Err(e) => {
            tracing::error!("spending inputs for project {project_id}: {e}");
            SpendingSummaryRow {
                project_id,
                project_name: project_name.to_string(),
                total_spent: Decimal::ZERO,
                burn_rate: Decimal::ZERO,
            }
        }
    }
}

/// Denormalized project totals recomputed from the ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerTotals {
    pub budget: Decimal,
    pub spent: Decimal,
    pub mandays_allocated: Decimal,
    pub mandays_consumed: Decimal,
}

/// Buckets ledger rows by (type, category). Budget credits fund the budget,
/// budget debits are spend, manday movements track allocation/consumption.
/// Rows outside the four known combinations are ignored.
pub fn ledger_totals(rows: &[(String, String, Decimal)]) -> LedgerTotals {
    let mut totals = LedgerTotals::default();
    for (entry_type, category, amount) in rows {
        match (entry_type.as_str(), category.as_str()) {
            ("credit", "budget") => totals.budget += *amount,
            ("debit", "budget") => totals.spent += *amount,
            ("credit", "mandays") => totals.mandays_allocated += *amount,
            ("debit", "mandays") => totals.mandays_consumed += *amount,
            _ => {}
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates(pairs: &[(&str, i64)]) -> Vec<(String, Decimal)> {
        pairs
            .iter()
            .map(|(role, rate)| (role.to_string(), Decimal::from(*rate)))
            .collect()
    }

    fn mandays(pairs: &[(&str, i64)]) -> Vec<(String, Decimal)> {
        rates(pairs)
    }

    #[test]
    fn manday_costs_zero_when_either_side_empty() {
        let r = rates(&[("BE", 500)]);
        let m = mandays(&[("BE", 10)]);
        assert_eq!(manday_costs(&[], &m), Decimal::ZERO);
        assert_eq!(manday_costs(&r, &[]), Decimal::ZERO);
        assert_eq!(manday_costs(&[], &[]), Decimal::ZERO);
    }

    #[test]
    fn missing_rate_contributes_zero_not_an_error() {
        let r = rates(&[("BE", 500)]);
        let m = mandays(&[("BE", 10), ("QA", 5)]);
        assert_eq!(manday_costs(&r, &m), Decimal::from(5000));
    }

    #[test]
    fn worked_example() {
        // budget 100000, BE rate 500 x 10 mandays, plus a 20000 budget debit
        let parts = SpendingParts {
            budget: Decimal::from(100_000),
            manday_costs: manday_costs(&rates(&[("BE", 500)]), &mandays(&[("BE", 10)])),
            ledger_costs: Decimal::from(20_000),
        };
        assert_eq!(parts.manday_costs, Decimal::from(5000));
        let row = summarize(Uuid::nil(), "CRM Implementation", &parts);
        assert_eq!(row.total_spent, Decimal::from(25_000));
        assert_eq!(row.burn_rate, Decimal::new(25, 2));
    }

    #[test]
    fn total_is_exact_sum_of_both_sources() {
        let parts = SpendingParts {
            budget: Decimal::from(1000),
            manday_costs: Decimal::new(12345, 2),
            ledger_costs: Decimal::new(655, 2),
        };
        // 123.45 + 6.55 = 130.00
        let row = summarize(Uuid::nil(), "p", &parts);
        assert_eq!(row.total_spent, Decimal::from(130));
    }

    #[test]
    fn burn_rate_zero_whenever_budget_is_zero() {
        let parts = SpendingParts {
            budget: Decimal::ZERO,
            manday_costs: Decimal::from(5000),
            ledger_costs: Decimal::from(20_000),
        };
        let row = summarize(Uuid::nil(), "p", &parts);
        assert_eq!(row.total_spent, Decimal::from(25_000));
        assert_eq!(row.burn_rate, Decimal::ZERO);
        assert_eq!(burn_rate(Decimal::from(10), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn reported_figures_are_rounded() {
        let parts = SpendingParts {
            budget: Decimal::from(3),
            manday_costs: Decimal::new(5, 1), // 0.5
            ledger_costs: Decimal::ZERO,
        };
        let row = summarize(Uuid::nil(), "p", &parts);
        // 0.5 rounds half away from zero
        assert_eq!(row.total_spent, Decimal::ONE);
        // 0.5 / 3 = 0.1666... -> 0.1667
        assert_eq!(row.burn_rate, Decimal::new(1667, 4));
    }

    #[test]
    fn failed_input_load_degrades_to_zero_row() {
        let id = Uuid::new_v4();
        let row = summary_row(id, "Broken", Err(ApiError::NotFound("project")));
        assert_eq!(row.project_id, id);
        assert_eq!(row.project_name, "Broken");
        assert_eq!(row.total_spent, Decimal::ZERO);
        assert_eq!(row.burn_rate, Decimal::ZERO);
    }

    fn movement(entry_type: &str, category: &str, amount: i64) -> (String, String, Decimal) {
        (entry_type.to_string(), category.to_string(), Decimal::from(amount))
    }

    #[test]
    fn ledger_totals_split_into_four_buckets() {
        let rows = vec![
            movement("credit", "budget", 100_000),
            movement("credit", "budget", 50_000),
            movement("debit", "budget", 20_000),
            movement("credit", "mandays", 120),
            movement("debit", "mandays", 45),
        ];
        let totals = ledger_totals(&rows);
        assert_eq!(totals.budget, Decimal::from(150_000));
        assert_eq!(totals.spent, Decimal::from(20_000));
        assert_eq!(totals.mandays_allocated, Decimal::from(120));
        assert_eq!(totals.mandays_consumed, Decimal::from(45));
    }

    #[test]
    fn ledger_totals_ignore_unknown_combinations() {
        let rows = vec![movement("debit", "equipment", 999)];
        assert_eq!(ledger_totals(&rows), LedgerTotals::default());
    }

    #[test]
    fn reconciliation_is_idempotent_over_unchanged_rows() {
        let rows = vec![
            movement("credit", "budget", 75_000),
            movement("debit", "budget", 45_000),
        ];
        assert_eq!(ledger_totals(&rows), ledger_totals(&rows));
    }
}
