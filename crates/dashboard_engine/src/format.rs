use num_format::{Locale, ToFormattedString};

const EOK: u64 = 100_000_000;
const MAN: u64 = 10_000;

fn grouped(v: u64) -> String {
    v.to_formatted_string(&Locale::en)
}

/// Renders a won amount in 억/만 units, e.g. `123_456_789` → `"1억 2,345만 원"`.
///
/// Whatever is below one 만 is dropped, not rounded. Amounts smaller than one
/// 만 (but not zero) are shown in plain won so they never render blank.
pub fn format_krw(amount: i64) -> String {
    if amount == 0 {
        return "0 원".to_string();
    }
    let sign = if amount < 0 { "-" } else { "" };
    let magnitude = amount.unsigned_abs();
    let eok = magnitude / EOK;
    let man = (magnitude % EOK) / MAN;

    let body = match (eok, man) {
        (0, 0) => format!("{} 원", grouped(magnitude)),
        (0, m) => format!("{}만 원", grouped(m)),
        (e, 0) => format!("{}억 원", grouped(e)),
        (e, m) => format!("{}억 {}만 원", grouped(e), grouped(m)),
    };
    format!("{sign}{body}")
}

/// One decimal and a percent sign. Pass an already-rounded share.
pub fn format_pct(share_pct: f64) -> String {
    format!("{share_pct:.1}%")
}
