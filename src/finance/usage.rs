use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::{MONTHS, MONTH_LABELS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRow {
    pub role: String,
    /// Keyed "01".."12"; every month is present, missing data is 0.
    pub months: BTreeMap<String, Decimal>,
    pub total_mandays: Decimal,
    pub rate: Decimal,
    pub total_cost: Decimal,
}

pub const TOTAL_ROLE: &str = "TOTAL";

fn zeroed_months() -> BTreeMap<String, Decimal> {
    MONTHS
        .iter()
        .map(|m| (m.to_string(), Decimal::ZERO))
        .collect()
}

/// One row per distinct role plus a synthetic TOTAL row. `manday_rows` are
/// (role, month, mandays) already filtered to the scope and year; `rates`
/// are (role, cost_per_manday) for the same scope. A role rated in several
/// projects (the "all" scope) gets the mean of its rates; an unrated role
/// gets 0. Empty input yields an empty table, no TOTAL row.
pub fn build_usage_table(
    manday_rows: &[(String, String, Decimal)],
    rates: &[(String, Decimal)],
) -> Vec<UsageRow> {
    let mut per_role: BTreeMap<&str, BTreeMap<String, Decimal>> = BTreeMap::new();
    for (role, month, mandays) in manday_rows {
        let months = per_role.entry(role.as_str()).or_insert_with(zeroed_months);
        if let Some(slot) = months.get_mut(month.as_str()) {
            *slot += *mandays;
        }
    }
    if per_role.is_empty() {
        return Vec::new();
    }

    let mut rows: Vec<UsageRow> = Vec::with_capacity(per_role.len() + 1);
    let mut total = UsageRow {
        role: TOTAL_ROLE.to_string(),
        months: zeroed_months(),
        total_mandays: Decimal::ZERO,
        rate: Decimal::ZERO,
        total_cost: Decimal::ZERO,
    };

    for (role, months) in per_role {
        let matching: Vec<Decimal> = rates
            .iter()
            .filter(|(r, _)| r == role)
            .map(|(_, rate)| *rate)
            .collect();
        let rate = if matching.is_empty() {
            Decimal::ZERO
        } else {
            (matching.iter().copied().sum::<Decimal>() / Decimal::from(matching.len() as i64))
                .round_dp(2)
        };

        let total_mandays: Decimal = months.values().copied().sum();
        let total_cost = total_mandays * rate;

        for (month, mandays) in &months {
            if let Some(slot) = total.months.get_mut(month.as_str()) {
                *slot += *mandays;
            }
        }
        total.total_mandays += total_mandays;
        total.total_cost += total_cost;

        rows.push(UsageRow {
            role: role.to_string(),
            months,
            total_mandays,
            rate,
            total_cost,
        });
    }

    rows.push(total);
    rows
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMandays {
    pub month: &'static str,
    pub mandays: Decimal,
}

/// Twelve labeled rows, Jan..Dec; months with no data report 0.
pub fn monthly_manday_usage(rows: &[(String, Decimal)]) -> Vec<MonthlyMandays> {
    let mut by_month: BTreeMap<&str, Decimal> = BTreeMap::new();
    for (month, mandays) in rows {
        *by_month.entry(month.as_str()).or_insert(Decimal::ZERO) += *mandays;
    }
    MONTHS
        .iter()
        .zip(MONTH_LABELS.iter())
        .map(|(num, label)| MonthlyMandays {
            month: label,
            mandays: by_month.get(num).copied().unwrap_or(Decimal::ZERO),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleMandays {
    pub role: String,
    pub mandays: Decimal,
}

/// Mandays summed per role, largest first; ties break on role name so the
/// output is stable.
pub fn mandays_by_role(rows: &[(String, Decimal)]) -> Vec<RoleMandays> {
    let mut by_role: BTreeMap<&str, Decimal> = BTreeMap::new();
    for (role, mandays) in rows {
        *by_role.entry(role.as_str()).or_insert(Decimal::ZERO) += *mandays;
    }
    let mut out: Vec<RoleMandays> = by_role
        .into_iter()
        .map(|(role, mandays)| RoleMandays {
            role: role.to_string(),
            mandays,
        })
        .collect();
    out.sort_by(|a, b| b.mandays.cmp(&a.mandays).then_with(|| a.role.cmp(&b.role)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manday_row(role: &str, month: &str, mandays: i64) -> (String, String, Decimal) {
        (role.to_string(), month.to_string(), Decimal::from(mandays))
    }

    fn rate(role: &str, cost: i64) -> (String, Decimal) {
        (role.to_string(), Decimal::from(cost))
    }

    #[test]
    fn empty_input_yields_empty_table() {
        assert!(build_usage_table(&[], &[rate("BE", 500)]).is_empty());
    }

    #[test]
    fn missing_months_default_to_zero_not_absent() {
        let rows = build_usage_table(&[manday_row("BE", "04", 10)], &[rate("BE", 500)]);
        let be = &rows[0];
        assert_eq!(be.months.len(), 12);
        assert_eq!(be.months["04"], Decimal::from(10));
        assert_eq!(be.months["01"], Decimal::ZERO);
        assert_eq!(be.months["12"], Decimal::ZERO);
    }

    #[test]
    fn table_totals_and_costs() {
        let mandays = vec![
            manday_row("BE", "01", 10),
            manday_row("BE", "02", 5),
            manday_row("QA", "01", 4),
        ];
        let rows = build_usage_table(&mandays, &[rate("BE", 500), rate("QA", 300)]);
        assert_eq!(rows.len(), 3);

        let be = &rows[0];
        assert_eq!(be.role, "BE");
        assert_eq!(be.total_mandays, Decimal::from(15));
        assert_eq!(be.total_cost, Decimal::from(7500));

        let qa = &rows[1];
        assert_eq!(qa.role, "QA");
        assert_eq!(qa.total_cost, Decimal::from(1200));

        let total = &rows[2];
        assert_eq!(total.role, TOTAL_ROLE);
        assert_eq!(total.months["01"], Decimal::from(14));
        assert_eq!(total.months["02"], Decimal::from(5));
        assert_eq!(total.total_mandays, Decimal::from(19));
        assert_eq!(total.total_cost, Decimal::from(8700));
        assert_eq!(total.rate, Decimal::ZERO);
    }

    #[test]
    fn unrated_role_costs_zero() {
        let rows = build_usage_table(&[manday_row("PO", "06", 8)], &[]);
        assert_eq!(rows[0].rate, Decimal::ZERO);
        assert_eq!(rows[0].total_cost, Decimal::ZERO);
    }

    #[test]
    fn rate_for_all_scope_is_the_mean() {
        let rows = build_usage_table(
            &[manday_row("BE", "01", 2)],
            &[rate("BE", 400), rate("BE", 600)],
        );
        assert_eq!(rows[0].rate, Decimal::from(500));
        assert_eq!(rows[0].total_cost, Decimal::from(1000));
    }

    #[test]
    fn monthly_usage_reports_all_twelve_months() {
        let rows = monthly_manday_usage(&[
            ("04".to_string(), Decimal::from(7)),
            ("04".to_string(), Decimal::from(3)),
            ("11".to_string(), Decimal::from(2)),
        ]);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0], MonthlyMandays { month: "Jan", mandays: Decimal::ZERO });
        assert_eq!(rows[3], MonthlyMandays { month: "Apr", mandays: Decimal::from(10) });
        assert_eq!(rows[10], MonthlyMandays { month: "Nov", mandays: Decimal::from(2) });
    }

    #[test]
    fn roles_sorted_by_mandays_descending() {
        let rows = mandays_by_role(&[
            ("FE".to_string(), Decimal::from(3)),
            ("BE".to_string(), Decimal::from(9)),
            ("QA".to_string(), Decimal::from(3)),
        ]);
        let order: Vec<&str> = rows.iter().map(|r| r.role.as_str()).collect();
        assert_eq!(order, vec!["BE", "FE", "QA"]);
    }
}
