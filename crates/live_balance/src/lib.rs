//! Live exchange balances merged into the ledger as one `crypto` row per identity.
//!
//! Each identity is looked up independently. When a lookup fails the identity
//! still yields a row, with a zero amount and a placeholder label, so the rest
//! of the ledger is unaffected.

pub mod upbit;

use models::{NormalizedRow, CRYPTO_CATEGORY};
use thiserror::Error;

pub use upbit::{UpbitAccount, UpbitQuotation};

/// Fiat currency held directly on the exchange; valued at face.
pub const QUOTE_CURRENCY: &str = "KRW";

#[derive(Debug, Error)]
pub enum LiveBalanceError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not sign request: {0}")]
    Auth(#[from] jsonwebtoken::errors::Error),
    #[error("no price for {0}")]
    UnknownInstrument(String),
    #[error("unexpected exchange response: {0}")]
    Response(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub currency: String,
    pub quantity: f64,
}

/// Holdings of one exchange identity.
pub trait ExchangeAccount {
    fn holdings(&self) -> Result<Vec<Holding>, LiveBalanceError>;
}

/// Price of one unit of `symbol` in won.
pub trait PriceLookup {
    fn price_krw(&self, symbol: &str) -> Result<f64, LiveBalanceError>;
}

/// One configured identity ready to be queried.
pub struct LiveAccount {
    pub member: String,
    pub subcategory: String,
    pub account: Box<dyn ExchangeAccount>,
}

/// Result of the live-balance pass: rows to merge plus user-facing warnings.
#[derive(Debug, Default)]
pub struct LiveBalances {
    pub rows: Vec<NormalizedRow>,
    pub warnings: Vec<String>,
}

pub fn unavailable_label(subcategory: &str) -> String {
    format!("{subcategory} (unavailable)")
}

/// Values holdings in won, rounded to the nearest won.
///
/// An instrument without a price contributes nothing; the others still count.
pub fn value_holdings(holdings: &[Holding], prices: &dyn PriceLookup) -> i64 {
    let mut total = 0.0;
    for h in holdings {
        if !h.quantity.is_finite() || h.quantity <= 0.0 {
            continue;
        }
        if h.currency.eq_ignore_ascii_case(QUOTE_CURRENCY) {
            total += h.quantity;
            continue;
        }
        match prices.price_krw(&h.currency) {
            Ok(price) if price.is_finite() && price > 0.0 => total += h.quantity * price,
            Ok(price) => tracing::warn!(currency = %h.currency, price, "ignoring non-positive price"),
            Err(e) => tracing::warn!(currency = %h.currency, "skipping holding without price: {e}"),
        }
    }
    total.round() as i64
}

/// Queries every account and produces one row per identity.
pub fn collect_live_rows(accounts: &[LiveAccount], prices: &dyn PriceLookup) -> LiveBalances {
    let mut out = LiveBalances::default();

    for acc in accounts {
        let row = match acc.account.holdings() {
            Ok(holdings) => {
                let amount = value_holdings(&holdings, prices);
                tracing::info!(member = %acc.member, amount, "live balance");
                NormalizedRow {
                    member: acc.member.clone(),
                    category: CRYPTO_CATEGORY.to_string(),
                    subcategory: acc.subcategory.clone(),
                    amount,
                }
            }
            Err(e) => {
                tracing::warn!(member = %acc.member, "live balance lookup failed: {e}");
                out.warnings
                    .push(format!("{}: live balance unavailable ({e})", acc.member));
                NormalizedRow {
                    member: acc.member.clone(),
                    category: CRYPTO_CATEGORY.to_string(),
                    subcategory: unavailable_label(&acc.subcategory),
                    amount: 0,
                }
            }
        };
        out.rows.push(row);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedPrices(HashMap<String, f64>);

    impl PriceLookup for FixedPrices {
        fn price_krw(&self, symbol: &str) -> Result<f64, LiveBalanceError> {
            self.0
                .get(symbol)
                .copied()
                .ok_or_else(|| LiveBalanceError::UnknownInstrument(symbol.to_string()))
        }
    }

    struct StaticAccount(Vec<Holding>);

    impl ExchangeAccount for StaticAccount {
        fn holdings(&self) -> Result<Vec<Holding>, LiveBalanceError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenAccount;

    impl ExchangeAccount for BrokenAccount {
        fn holdings(&self) -> Result<Vec<Holding>, LiveBalanceError> {
            Err(LiveBalanceError::Response("401 invalid_access_key".to_string()))
        }
    }

    fn prices() -> FixedPrices {
        FixedPrices(HashMap::from([
            ("BTC".to_string(), 100_000_000.0),
            ("ETH".to_string(), 4_000_000.0),
        ]))
    }

    fn holding(currency: &str, quantity: f64) -> Holding {
        Holding {
            currency: currency.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_value_holdings_sums_priced_instruments_and_cash() {
        let holdings = vec![
            holding("KRW", 12_345.0),
            holding("BTC", 0.5),
            holding("ETH", 0.25),
        ];
        assert_eq!(value_holdings(&holdings, &prices()), 12_345 + 50_000_000 + 1_000_000);
    }

    #[test]
    fn test_unknown_instrument_contributes_zero() {
        let holdings = vec![holding("BTC", 0.01), holding("DOGE", 1000.0)];
        assert_eq!(value_holdings(&holdings, &prices()), 1_000_000);
    }

    #[test]
    fn test_value_holdings_rounds_to_won() {
        let holdings = vec![holding("ETH", 0.000_000_3)];
        assert_eq!(value_holdings(&holdings, &prices()), 1);
    }

    #[test]
    fn test_collect_degrades_failed_identity_only() {
        let accounts = vec![
            LiveAccount {
                member: "dad".to_string(),
                subcategory: "upbit".to_string(),
                account: Box::new(StaticAccount(vec![holding("BTC", 0.1)])),
            },
            LiveAccount {
                member: "mom".to_string(),
                subcategory: "upbit".to_string(),
                account: Box::new(BrokenAccount),
            },
        ];

        let live = collect_live_rows(&accounts, &prices());

        assert_eq!(live.rows.len(), 2);
        assert_eq!(live.rows[0].amount, 10_000_000);
        assert_eq!(live.rows[0].category, "crypto");
        assert_eq!(live.rows[1].amount, 0);
        assert_eq!(live.rows[1].subcategory, "upbit (unavailable)");
        assert_eq!(live.warnings.len(), 1);
        assert!(live.warnings[0].starts_with("mom:"));
    }
}
