use models::{LedgerRow, NormalizedRow, LIABILITY_CATEGORY};

/// Thousands separators, spacing and currency glyphs that may surround an amount.
fn is_noise(c: char) -> bool {
    matches!(
        c,
        ',' | '_' | ' ' | '\t' | '\u{a0}' | '\u{3000}' | '₩' | '￦' | '원' | '$'
    )
}

/// Parses an amount cell into whole won.
///
/// Separators and currency glyphs are stripped first. Decimal text is truncated
/// toward zero. Anything that still does not parse (including an empty or
/// missing cell) is `0`; a bad cell never aborts the pipeline.
pub fn parse_amount(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    let mut cleaned: String = raw.chars().filter(|c| !is_noise(*c)).collect();
    if let Some(pos) = cleaned.to_ascii_uppercase().find("KRW") {
        cleaned.replace_range(pos..pos + 3, "");
    }

    if let Ok(v) = cleaned.parse::<i64>() {
        return v;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v.trunc() as i64,
        _ => 0,
    }
}

fn normalize_row(row: &LedgerRow) -> NormalizedRow {
    let parsed = parse_amount(row.amount_raw.as_deref());
    let amount = if row.category == LIABILITY_CATEGORY {
        -parsed.saturating_abs()
    } else {
        parsed
    };
    NormalizedRow {
        member: row.member.clone(),
        category: row.category.clone(),
        subcategory: row.subcategory.clone(),
        amount,
    }
}

/// Maps raw ledger rows to signed amounts. Liabilities are always negative,
/// whatever sign the source text carries. The input is left untouched.
pub fn normalize(rows: &[LedgerRow]) -> Vec<NormalizedRow> {
    let out: Vec<NormalizedRow> = rows.iter().map(normalize_row).collect();
    let zeroed = rows
        .iter()
        .zip(&out)
        .filter(|(raw, n)| n.amount == 0 && raw.amount_raw.as_deref().is_some_and(|s| !s.trim().is_empty()))
        .count();
    if zeroed > 0 {
        tracing::debug!(zeroed, "amount cells coerced to zero");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(category: &str, amount: &str) -> LedgerRow {
        LedgerRow::new("A", category, "sub", amount)
    }

    #[test]
    fn test_parse_amount_strips_separators_and_glyphs() {
        assert_eq!(parse_amount(Some("15,000,000")), 15_000_000);
        assert_eq!(parse_amount(Some("₩15,000,000")), 15_000_000);
        assert_eq!(parse_amount(Some("15,000,000원")), 15_000_000);
        assert_eq!(parse_amount(Some(" 1 000 ")), 1_000);
        assert_eq!(parse_amount(Some("KRW 2,500")), 2_500);
        assert_eq!(parse_amount(Some("2,500 krw")), 2_500);
        assert_eq!(parse_amount(Some("$42")), 42);
    }

    #[test]
    fn test_parse_amount_keeps_sign_and_truncates_decimals() {
        assert_eq!(parse_amount(Some("-5,000,000")), -5_000_000);
        assert_eq!(parse_amount(Some("+300")), 300);
        assert_eq!(parse_amount(Some("1234.99")), 1_234);
        assert_eq!(parse_amount(Some("-0.5")), 0);
    }

    #[test]
    fn test_parse_amount_coerces_garbage_to_zero() {
        assert_eq!(parse_amount(None), 0);
        assert_eq!(parse_amount(Some("")), 0);
        assert_eq!(parse_amount(Some("   ")), 0);
        assert_eq!(parse_amount(Some("N/A")), 0);
        assert_eq!(parse_amount(Some("12abc")), 0);
        assert_eq!(parse_amount(Some("NaN")), 0);
        assert_eq!(parse_amount(Some("inf")), 0);
    }

    #[test]
    fn test_liability_is_always_non_positive() {
        for text in ["5,000,000", "-5,000,000", "₩1", "0", "junk", ""] {
            let n = normalize(&[raw("liability", text)]);
            assert!(n[0].amount <= 0, "{text} -> {}", n[0].amount);
        }
        assert_eq!(normalize(&[raw("liability", "5,000,000")])[0].amount, -5_000_000);
    }

    #[test]
    fn test_non_liability_keeps_parsed_value() {
        for text in ["15,000,000", "₩7", "123"] {
            let n = normalize(&[raw("cash", text)]);
            assert_eq!(n[0].amount, parse_amount(Some(text)));
        }
        assert_eq!(normalize(&[raw("cash", "-10")])[0].amount, -10);
    }

    #[test]
    fn test_liability_match_is_exact() {
        assert_eq!(normalize(&[raw("Liability", "100")])[0].amount, 100);
    }

    #[test]
    fn test_normalize_preserves_order_and_text_columns() {
        let rows = vec![
            LedgerRow::new("A", "liability", "loan", "-5,000,000"),
            LedgerRow::new("B", "cash", "bank", "15,000,000"),
        ];
        let n = normalize(&rows);
        assert_eq!(n.len(), 2);
        assert_eq!(n[0].member, "A");
        assert_eq!(n[0].subcategory, "loan");
        assert_eq!(n[1].member, "B");
        // input untouched
        assert_eq!(rows[0].amount_raw.as_deref(), Some("-5,000,000"));
    }

    #[test]
    fn test_extreme_values_do_not_panic() {
        assert_eq!(parse_amount(Some("1e30")), i64::MAX);
        let n = normalize(&[raw("liability", &i64::MIN.to_string())]);
        assert_eq!(n[0].amount, -i64::MAX);
    }
}
