use serde::{Deserialize, Serialize};

/// Category value that marks a row as debt.
pub const LIABILITY_CATEGORY: &str = "liability";
/// Category used for rows produced by the live exchange-balance merge.
pub const CRYPTO_CATEGORY: &str = "crypto";

// Ledger rows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerRow {
	pub member: String,
	pub category: String,
	pub subcategory: String,
	/// Amount exactly as exported, e.g. `"₩15,000,000"`. `None` for an empty cell.
	pub amount_raw: Option<String>,
}

impl LedgerRow {
	pub fn new(member: &str, category: &str, subcategory: &str, amount_raw: &str) -> Self {
		Self {
			member: member.to_string(),
			category: category.to_string(),
			subcategory: subcategory.to_string(),
			amount_raw: Some(amount_raw.to_string()),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
	pub member: String,
	pub category: String,
	pub subcategory: String,
	/// Whole won. Negative for liabilities.
	pub amount: i64,
}

// Aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryTotals {
	pub net_worth: i64,
	pub total_assets: i64,
	/// Kept negative.
	pub total_liabilities: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingColumn {
	Category,
	Subcategory,
}

impl GroupingColumn {
	pub fn key<'a>(&self, row: &'a NormalizedRow) -> &'a str {
		match self {
			GroupingColumn::Category => &row.category,
			GroupingColumn::Subcategory => &row.subcategory,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBreakdown {
	pub member: String,
	pub group: String,
	pub amount_abs_sum: i64,
	/// Share of the member's absolute total, one decimal.
	pub share_pct: f64,
	/// Chart label built from `share_pct`, so the two never disagree.
	pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySum {
	pub category: String,
	pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
	pub target: i64,
	pub achieved_pct: f64,
	pub remaining: i64,
}

// Settings models
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
	pub member: String,
	pub category: String,
	pub subcategory: String,
	pub amount: String,
}

impl Default for ColumnNames {
	fn default() -> Self {
		Self {
			member: "member".to_string(),
			category: "category".to_string(),
			subcategory: "subcategory".to_string(),
			amount: "amount".to_string(),
		}
	}
}

/// Row filter applied before a panel's breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelFilter {
	All,
	Include(Vec<String>),
	Exclude(Vec<String>),
}

impl PanelFilter {
	pub fn accepts(&self, row: &NormalizedRow) -> bool {
		match self {
			PanelFilter::All => true,
			PanelFilter::Include(categories) => categories.iter().any(|c| c == &row.category),
			PanelFilter::Exclude(categories) => !categories.iter().any(|c| c == &row.category),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelSpec {
	pub name: String,
	pub title: String,
	pub grouping: GroupingColumn,
	pub filter: PanelFilter,
}

pub fn default_panels() -> Vec<PanelSpec> {
	let names = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect::<Vec<_>>();
	vec![
		PanelSpec {
			name: "overall".to_string(),
			title: "전체 자산".to_string(),
			grouping: GroupingColumn::Category,
			filter: PanelFilter::All,
		},
		PanelSpec {
			name: "financial".to_string(),
			title: "금융 자산".to_string(),
			grouping: GroupingColumn::Subcategory,
			filter: PanelFilter::Exclude(names(&["real_estate", "other", LIABILITY_CATEGORY])),
		},
		PanelSpec {
			name: "real_estate_and_debt".to_string(),
			title: "부동산 및 부채".to_string(),
			grouping: GroupingColumn::Subcategory,
			filter: PanelFilter::Include(names(&["real_estate", LIABILITY_CATEGORY])),
		},
		PanelSpec {
			name: "other".to_string(),
			title: "기타 자산".to_string(),
			grouping: GroupingColumn::Subcategory,
			filter: PanelFilter::Include(names(&["other"])),
		},
	]
}

#[derive(Debug, Clone, Deserialize)]
pub struct CryptoIdentity {
	pub member: String,
	#[serde(default = "default_exchange_label")]
	pub subcategory: String,
	/// Env var holding the access key. Defaults to `UPBIT_ACCESS_KEY_<MEMBER>`.
	#[serde(default)]
	pub access_key_env: Option<String>,
	#[serde(default)]
	pub secret_key_env: Option<String>,
}

fn default_exchange_label() -> String {
	"upbit".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
	pub live_balance: bool,
	pub commentary: bool,
	pub goal_tracking: bool,
}

impl Default for FeatureFlags {
	fn default() -> Self {
		Self {
			live_balance: true,
			commentary: true,
			goal_tracking: true,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub settings_version: u32,
	pub columns: ColumnNames,
	pub panels: Vec<PanelSpec>,
	pub cache_ttl_secs: u64,
	pub target_net_worth: Option<i64>,
	pub features: FeatureFlags,
	pub crypto_identities: Vec<CryptoIdentity>,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			settings_version: 1,
			columns: ColumnNames::default(),
			panels: default_panels(),
			cache_ttl_secs: 300,
			target_net_worth: None,
			features: FeatureFlags::default(),
			crypto_identities: Vec::new(),
		}
	}
}

// Output models
#[derive(Debug, Clone, Serialize)]
pub struct PanelOutput {
	pub name: String,
	pub title: String,
	pub grouping: GroupingColumn,
	/// Empty means "no data" for this panel.
	pub groups: Vec<GroupBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberTable {
	pub member: String,
	pub totals: SummaryTotals,
	pub rows: Vec<NormalizedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Commentary {
	Text(String),
	Unavailable(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryText {
	pub net_worth: String,
	pub total_assets: String,
	pub total_liabilities: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
	pub generated_at: String,
	pub summary: SummaryTotals,
	pub summary_text: SummaryText,
	pub panels: Vec<PanelOutput>,
	pub members: Vec<MemberTable>,
	pub category_sums: Vec<CategorySum>,
	pub goal: Option<GoalProgress>,
	pub commentary: Option<Commentary>,
	pub warnings: Vec<String>,
}
