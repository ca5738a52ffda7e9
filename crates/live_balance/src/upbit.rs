use std::time::Duration;

use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use settings_loader::ExchangeCredentials;
use uuid::Uuid;

use crate::{ExchangeAccount, Holding, LiveBalanceError, PriceLookup, QUOTE_CURRENCY};

pub const DEFAULT_BASE_URL: &str = "https://api.upbit.com";

fn http_client() -> Result<Client, LiveBalanceError> {
    Ok(Client::builder().timeout(Duration::from_secs(10)).build()?)
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaims {
    access_key: String,
    nonce: String,
}

/// HS256 bearer token the exchange expects on private endpoints.
fn bearer_token(creds: &ExchangeCredentials) -> Result<String, LiveBalanceError> {
    let claims = AuthClaims {
        access_key: creds.access_key.clone(),
        nonce: Uuid::new_v4().to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(creds.secret_key.as_bytes()),
    )?;
    Ok(format!("Bearer {token}"))
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    currency: String,
    #[serde(default)]
    balance: String,
    #[serde(default)]
    locked: String,
}

fn parse_quantity(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(0.0)
}

/// Free plus locked balance per currency. Zero balances are dropped.
fn holdings_from_accounts(entries: Vec<AccountEntry>) -> Vec<Holding> {
    entries
        .into_iter()
        .map(|e| Holding {
            quantity: parse_quantity(&e.balance) + parse_quantity(&e.locked),
            currency: e.currency,
        })
        .filter(|h| h.quantity > 0.0)
        .collect()
}

/// Private account endpoint for one key pair.
pub struct UpbitAccount {
    http: Client,
    base_url: String,
    credentials: ExchangeCredentials,
}

impl UpbitAccount {
    pub fn new(credentials: ExchangeCredentials) -> Result<Self, LiveBalanceError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(credentials: ExchangeCredentials, base_url: &str) -> Result<Self, LiveBalanceError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }
}

impl ExchangeAccount for UpbitAccount {
    fn holdings(&self) -> Result<Vec<Holding>, LiveBalanceError> {
        let endpoint = format!("{}/v1/accounts", self.base_url);
        let entries: Vec<AccountEntry> = self
            .http
            .get(&endpoint)
            .header(reqwest::header::AUTHORIZATION, bearer_token(&self.credentials)?)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(holdings_from_accounts(entries))
    }
}

#[derive(Debug, Deserialize)]
struct Ticker {
    market: String,
    trade_price: f64,
}

pub fn market_code(symbol: &str) -> String {
    format!("{QUOTE_CURRENCY}-{}", symbol.to_ascii_uppercase())
}

fn price_from_tickers(market: &str, tickers: Vec<Ticker>) -> Result<f64, LiveBalanceError> {
    tickers
        .into_iter()
        .find(|t| t.market == market)
        .map(|t| t.trade_price)
        .ok_or_else(|| LiveBalanceError::UnknownInstrument(market.to_string()))
}

/// Public ticker endpoint; no credentials needed.
pub struct UpbitQuotation {
    http: Client,
    base_url: String,
}

impl UpbitQuotation {
    pub fn new() -> Result<Self, LiveBalanceError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, LiveBalanceError> {
        Ok(Self {
            http: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl PriceLookup for UpbitQuotation {
    fn price_krw(&self, symbol: &str) -> Result<f64, LiveBalanceError> {
        let market = market_code(symbol);
        let endpoint = format!("{}/v1/ticker", self.base_url);
        let response = self
            .http
            .get(&endpoint)
            .query(&[("markets", market.as_str())])
            .send()?;
        // Unlisted markets answer 404.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LiveBalanceError::UnknownInstrument(market));
        }
        let tickers: Vec<Ticker> = response.error_for_status()?.json()?;
        price_from_tickers(&market, tickers)
    }
}
