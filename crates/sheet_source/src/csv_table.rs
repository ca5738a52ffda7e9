use csv::{ReaderBuilder, StringRecord, Trim};
use models::{ColumnNames, LedgerRow};
use std::io::Read;

use crate::{FetchError, MissingColumnError};

const MEMBER_ALIASES: &[&str] = &["member", "name", "owner", "이름", "구성원"];
const CATEGORY_ALIASES: &[&str] = &["category", "type", "분류", "대분류"];
const SUBCATEGORY_ALIASES: &[&str] = &["subcategory", "sub_category", "item", "소분류", "항목"];
const AMOUNT_ALIASES: &[&str] = &["amount", "value", "balance", "금액"];

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    member: Option<usize>,
    category: usize,
    subcategory: Option<usize>,
    amount: usize,
}

fn clean_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn find_column(header: &[String], configured: &str, aliases: &[&str]) -> Option<usize> {
    let configured = clean_header(configured);
    header
        .iter()
        .position(|h| *h == configured)
        .or_else(|| header.iter().position(|h| aliases.contains(&h.as_str())))
}

fn locate_columns(header: &[String], names: &ColumnNames) -> Result<ColumnIndex, MissingColumnError> {
    let missing = |column: &str| MissingColumnError {
        column: column.to_string(),
        header: header.to_vec(),
    };
    let amount = find_column(header, &names.amount, AMOUNT_ALIASES).ok_or_else(|| missing(&names.amount))?;
    let category =
        find_column(header, &names.category, CATEGORY_ALIASES).ok_or_else(|| missing(&names.category))?;

    Ok(ColumnIndex {
        member: find_column(header, &names.member, MEMBER_ALIASES),
        category,
        subcategory: find_column(header, &names.subcategory, SUBCATEGORY_ALIASES),
        amount,
    })
}

fn cell(record: &StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i)).unwrap_or("").to_string()
}

/// Parses a ledger CSV export into raw rows.
///
/// The header row is matched case-insensitively against `names` and a set of
/// common aliases. `amount` and `category` are required; the other columns
/// default to an empty string when absent. Rows whose cells are all blank are
/// skipped, amount cells are kept as text for the normalizer.
pub fn parse_ledger_csv<R: Read>(reader: R, names: &ColumnNames) -> Result<Vec<LedgerRow>, FetchError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let header: Vec<String> = rdr.headers()?.iter().map(clean_header).collect();
    let cols = locate_columns(&header, names)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let amount = cell(&record, Some(cols.amount));
        rows.push(LedgerRow {
            member: cell(&record, cols.member),
            category: cell(&record, Some(cols.category)),
            subcategory: cell(&record, cols.subcategory),
            amount_raw: if amount.is_empty() { None } else { Some(amount) },
        });
    }

    tracing::debug!(rows = rows.len(), "parsed ledger csv");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> Result<Vec<LedgerRow>, FetchError> {
        parse_ledger_csv(csv.as_bytes(), &ColumnNames::default())
    }

    #[test]
    fn test_parse_basic_ledger() {
        let csv = "member,category,subcategory,amount\n\
                   A,liability,loan,\"-5,000,000\"\n\
                   A,cash,bank,\"15,000,000\"\n";
        let rows = parse(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], LedgerRow::new("A", "liability", "loan", "-5,000,000"));
        assert_eq!(rows[1].amount_raw.as_deref(), Some("15,000,000"));
    }

    #[test]
    fn test_header_matching_is_case_insensitive_and_strips_bom() {
        let csv = "\u{feff}Member , Category,SubCategory,AMOUNT\nB,cash,bank,100\n";
        let rows = parse(csv).unwrap();
        assert_eq!(rows[0].member, "B");
        assert_eq!(rows[0].subcategory, "bank");
    }

    #[test]
    fn test_aliases_are_accepted() {
        let csv = "이름,분류,항목,금액\n아빠,cash,예금,\"₩1,000\"\n";
        let rows = parse(csv).unwrap();
        assert_eq!(rows[0], LedgerRow::new("아빠", "cash", "예금", "₩1,000"));
    }

    #[test]
    fn test_missing_amount_column_is_reported() {
        let err = parse("member,category,subcategory\nA,cash,bank\n").unwrap_err();
        match err {
            FetchError::MissingColumn(e) => assert_eq!(e.column, "amount"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_category_column_is_reported() {
        let err = parse("member,amount\nA,10\n").unwrap_err();
        assert!(matches!(err, FetchError::MissingColumn(ref e) if e.column == "category"));
    }

    #[test]
    fn test_optional_columns_default_to_empty() {
        let rows = parse("category,amount\ncash,10\n").unwrap();
        assert_eq!(rows[0].member, "");
        assert_eq!(rows[0].subcategory, "");
        assert_eq!(rows[0].amount_raw.as_deref(), Some("10"));
    }

    #[test]
    fn test_blank_rows_and_empty_amounts() {
        let csv = "member,category,subcategory,amount\n,,,\nA,cash,wallet,\nA,cash,bank,5\n";
        let rows = parse(csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount_raw, None);
    }

    #[test]
    fn test_short_records_are_tolerated() {
        let rows = parse("member,category,subcategory,amount\nA,cash\n").unwrap();
        assert_eq!(rows[0].category, "cash");
        assert_eq!(rows[0].amount_raw, None);
    }

    #[test]
    fn test_configured_column_names_take_precedence() {
        let names = ColumnNames {
            member: "who".to_string(),
            category: "kind".to_string(),
            subcategory: "what".to_string(),
            amount: "krw".to_string(),
        };
        let csv = "who,kind,what,krw,amount\nA,cash,bank,7,999\n";
        let rows = parse_ledger_csv(csv.as_bytes(), &names).unwrap();
        assert_eq!(rows[0].amount_raw.as_deref(), Some("7"));
    }
}
