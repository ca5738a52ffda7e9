//! Family ledger → dashboard figures.
//!
//! [`normalize`] turns exported rows into signed won amounts, [`summarize`] and
//! [`breakdown`] aggregate them, [`format_krw`] renders amounts in 억/만 units,
//! and [`pipeline`] wires the whole refresh together with the optional live
//! balance and commentary collaborators.

pub mod aggregate;
pub mod format;
pub mod normalize;
pub mod pipeline;

pub use aggregate::{breakdown, category_sums, goal_progress, member_tables, summarize};
pub use format::{format_krw, format_pct};
pub use normalize::{normalize, parse_amount};
pub use pipeline::{
    build_dashboard, load_ledger, refresh, render_report, write_dashboard_json, LedgerSnapshot,
    LiveInputs, PipelineOptions,
};
