use std::collections::HashMap;

use models::{
    CategorySum, GoalProgress, GroupBreakdown, GroupingColumn, MemberTable, NormalizedRow,
    SummaryTotals,
};

use crate::format::format_pct;

/// Round half away from zero to one decimal.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn summarize(rows: &[NormalizedRow]) -> SummaryTotals {
    rows.iter().fold(SummaryTotals::default(), |mut acc, r| {
        if r.amount > 0 {
            acc.total_assets = acc.total_assets.saturating_add(r.amount);
        } else if r.amount < 0 {
            acc.total_liabilities = acc.total_liabilities.saturating_add(r.amount);
        }
        acc.net_worth = acc.total_assets.saturating_add(acc.total_liabilities);
        acc
    })
}

/// Groups rows by `(member, column)` and computes each group's share of the
/// member's absolute total.
///
/// Groups come out in order of first appearance. Groups whose absolute sum is
/// zero are left out, so an empty result means there is nothing to chart.
/// Callers filter rows beforehand; every row given here is counted.
pub fn breakdown(rows: &[NormalizedRow], column: GroupingColumn) -> Vec<GroupBreakdown> {
    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut sums: HashMap<(&str, &str), i64> = HashMap::new();
    let mut member_totals: HashMap<&str, i64> = HashMap::new();

    for r in rows {
        let key = (r.member.as_str(), column.key(r));
        let abs = r.amount.saturating_abs();
        let sum = sums.entry(key).or_insert_with(|| {
            order.push(key);
            0
        });
        *sum = sum.saturating_add(abs);
        let total = member_totals.entry(key.0).or_insert(0);
        *total = total.saturating_add(abs);
    }

    order
        .into_iter()
        .filter_map(|key @ (member, group)| {
            let amount_abs_sum = sums[&key];
            if amount_abs_sum == 0 {
                return None;
            }
            let member_total = member_totals[member];
            let share_pct = if member_total == 0 {
                0.0
            } else {
                round1(amount_abs_sum as f64 / member_total as f64 * 100.0)
            };
            Some(GroupBreakdown {
                member: member.to_string(),
                group: group.to_string(),
                amount_abs_sum,
                share_pct,
                label: format!("{group} {}", format_pct(share_pct)),
            })
        })
        .collect()
}

/// Signed sum per category, in order of first appearance.
pub fn category_sums(rows: &[NormalizedRow]) -> Vec<CategorySum> {
    let mut out: Vec<CategorySum> = Vec::new();
    for r in rows {
        match out.iter_mut().find(|c| c.category == r.category) {
            Some(c) => c.amount = c.amount.saturating_add(r.amount),
            None => out.push(CategorySum {
                category: r.category.clone(),
                amount: r.amount,
            }),
        }
    }
    out
}

/// Per-member rows and totals, members in order of first appearance.
pub fn member_tables(rows: &[NormalizedRow]) -> Vec<MemberTable> {
    let mut members: Vec<&str> = Vec::new();
    for r in rows {
        if !members.contains(&r.member.as_str()) {
            members.push(&r.member);
        }
    }
    members
        .into_iter()
        .map(|member| {
            let own: Vec<NormalizedRow> = rows.iter().filter(|r| r.member == member).cloned().collect();
            MemberTable {
                member: member.to_string(),
                totals: summarize(&own),
                rows: own,
            }
        })
        .collect()
}

pub fn goal_progress(net_worth: i64, target: i64) -> GoalProgress {
    let achieved_pct = if target <= 0 {
        0.0
    } else {
        round1(net_worth as f64 / target as f64 * 100.0)
    };
    GoalProgress {
        target,
        achieved_pct,
        remaining: target.saturating_sub(net_worth).max(0),
    }
}
