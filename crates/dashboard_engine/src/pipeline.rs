use std::fmt::Write as _;
use std::{fs, path::Path};

use ai_client::{CommentaryClient, CommentaryRequest};
use anyhow::Result;
use chrono::Local;
use live_balance::{collect_live_rows, LiveAccount, PriceLookup};
use models::{
    Commentary, Dashboard, LedgerRow, NormalizedRow, PanelOutput, PanelSpec, Settings, SummaryText,
};
use sheet_source::{FetchError, LedgerSource};

use crate::aggregate::{breakdown, category_sums, goal_progress, member_tables, summarize};
use crate::format::{format_krw, format_pct};
use crate::normalize::normalize;

/// Knobs that shape one dashboard refresh.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub panels: Vec<PanelSpec>,
    /// Goal tracking is on when this is a positive amount.
    pub target_net_worth: Option<i64>,
}

impl PipelineOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        let target_net_worth = if settings.features.goal_tracking {
            settings.target_net_worth.filter(|t| *t > 0)
        } else {
            None
        };
        Self {
            panels: settings.panels.clone(),
            target_net_worth,
        }
    }
}

/// Live exchange lookups to merge into the ledger.
pub struct LiveInputs<'a> {
    pub accounts: &'a [LiveAccount],
    pub prices: &'a dyn PriceLookup,
}

/// Raw rows plus anything that went wrong fetching them.
#[derive(Debug, Default)]
pub struct LedgerSnapshot {
    pub rows: Vec<LedgerRow>,
    pub warnings: Vec<String>,
}

fn fetch_warning(e: &FetchError) -> String {
    match e {
        FetchError::MissingColumn(m) => format!("ledger is missing the '{}' column; showing no data", m.column),
        other => format!("could not load the ledger ({other}); showing no data"),
    }
}

/// Fetches the ledger, turning any failure into an empty table and a warning.
pub fn load_ledger<S: LedgerSource + ?Sized>(source: &S) -> LedgerSnapshot {
    match source.fetch() {
        Ok(rows) => {
            tracing::info!(source = source.name(), rows = rows.len(), "ledger loaded");
            LedgerSnapshot {
                rows,
                warnings: Vec::new(),
            }
        }
        Err(e) => {
            tracing::warn!(source = source.name(), "ledger fetch failed: {e}");
            LedgerSnapshot {
                rows: Vec::new(),
                warnings: vec![fetch_warning(&e)],
            }
        }
    }
}

fn build_commentary(
    client: &dyn CommentaryClient,
    rows: &[NormalizedRow],
    options: &PipelineOptions,
) -> Commentary {
    let totals = summarize(rows);
    let request = CommentaryRequest {
        total_assets: totals.total_assets,
        total_liabilities: totals.total_liabilities,
        net_worth: totals.net_worth,
        category_sums: category_sums(rows),
        target_net_worth: options.target_net_worth,
    };
    match client.commentary(&request) {
        Ok(text) => Commentary::Text(text),
        Err(e) => {
            tracing::warn!(backend = client.name(), "commentary failed: {e}");
            Commentary::Unavailable(format!("AI 코멘트를 불러오지 못했습니다: {e}"))
        }
    }
}

/// Runs normalize → merge live balances → aggregate → commentary.
///
/// Never fails: upstream problems end up in `Dashboard::warnings` and the
/// affected figures degrade to zero or empty.
pub fn build_dashboard(
    ledger: LedgerSnapshot,
    live: Option<LiveInputs<'_>>,
    commentary: Option<&dyn CommentaryClient>,
    options: &PipelineOptions,
) -> Dashboard {
    let mut warnings = ledger.warnings;
    let mut rows = normalize(&ledger.rows);

    if let Some(live) = live {
        let merged = collect_live_rows(live.accounts, live.prices);
        rows.extend(merged.rows);
        warnings.extend(merged.warnings);
    }

    let summary = summarize(&rows);
    let panels = options
        .panels
        .iter()
        .map(|spec| {
            let selected: Vec<NormalizedRow> =
                rows.iter().filter(|r| spec.filter.accepts(r)).cloned().collect();
            PanelOutput {
                name: spec.name.clone(),
                title: spec.title.clone(),
                grouping: spec.grouping,
                groups: breakdown(&selected, spec.grouping),
            }
        })
        .collect();

    let goal = options
        .target_net_worth
        .map(|target| goal_progress(summary.net_worth, target));

    let commentary = match commentary {
        Some(client) if !rows.is_empty() => Some(build_commentary(client, &rows, options)),
        _ => None,
    };

    Dashboard {
        generated_at: Local::now().to_rfc3339(),
        summary,
        summary_text: SummaryText {
            net_worth: format_krw(summary.net_worth),
            total_assets: format_krw(summary.total_assets),
            total_liabilities: format_krw(summary.total_liabilities),
        },
        panels,
        members: member_tables(&rows),
        category_sums: category_sums(&rows),
        goal,
        commentary,
        warnings,
    }
}

/// One full refresh: fetch, then [`build_dashboard`].
pub fn refresh<S: LedgerSource + ?Sized>(
    source: &S,
    live: Option<LiveInputs<'_>>,
    commentary: Option<&dyn CommentaryClient>,
    options: &PipelineOptions,
) -> Dashboard {
    build_dashboard(load_ledger(source), live, commentary, options)
}

/// Plain-text rendering of a dashboard, for terminals and logs.
pub fn render_report(d: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "순자산   {}", d.summary_text.net_worth);
    let _ = writeln!(out, "총 자산  {}", d.summary_text.total_assets);
    let _ = writeln!(out, "총 부채  {}", d.summary_text.total_liabilities);
    if let Some(goal) = &d.goal {
        let _ = writeln!(
            out,
            "목표 {} 달성률 {} (남은 금액 {})",
            format_krw(goal.target),
            format_pct(goal.achieved_pct),
            format_krw(goal.remaining)
        );
    }

    for panel in &d.panels {
        let _ = writeln!(out, "\n[{}]", panel.title);
        if panel.groups.is_empty() {
            let _ = writeln!(out, "  데이터 없음");
            continue;
        }
        for g in &panel.groups {
            let _ = writeln!(
                out,
                "  {:<8} {:<12} {:>18} {:>7}",
                g.member,
                g.group,
                format_krw(g.amount_abs_sum),
                format_pct(g.share_pct)
            );
        }
    }

    for m in &d.members {
        let _ = writeln!(out, "\n<{}> 순자산 {}", m.member, format_krw(m.totals.net_worth));
        for r in &m.rows {
            let _ = writeln!(out, "  {:<12} {:<12} {:>18}", r.category, r.subcategory, format_krw(r.amount));
        }
    }

    if let Some(c) = &d.commentary {
        let text = match c {
            Commentary::Text(t) | Commentary::Unavailable(t) => t,
        };
        let _ = writeln!(out, "\n{text}");
    }
    for w in &d.warnings {
        let _ = writeln!(out, "\n[경고] {w}");
    }
    out
}

pub fn write_dashboard_json(output: &Dashboard, out_path: &Path) -> Result<()> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(output)?;
    fs::write(out_path, json)?;
    Ok(())
}
