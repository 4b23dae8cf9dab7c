//! pt-BR labels and number formatting shared by the period resolver and the
//! dashboard aggregations.
//!
//! Money is kept in integer cents everywhere; the helpers here only turn those
//! cents (and the percentages derived from them) into display strings.

use chrono::{Datelike, NaiveDate, Weekday};

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

const MONTHS_LONG: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Abbreviated month name, `month0` in `0..12`.
pub fn month_short(month0: u32) -> &'static str {
    MONTHS_SHORT[(month0 % 12) as usize]
}

pub fn month_long(month0: u32) -> &'static str {
    MONTHS_LONG[(month0 % 12) as usize]
}

pub fn weekday_short(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Dom",
        Weekday::Mon => "Seg",
        Weekday::Tue => "Ter",
        Weekday::Wed => "Qua",
        Weekday::Thu => "Qui",
        Weekday::Fri => "Sex",
        Weekday::Sat => "Sáb",
    }
}

pub fn weekday_long(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "Domingo",
        Weekday::Mon => "Segunda-feira",
        Weekday::Tue => "Terça-feira",
        Weekday::Wed => "Quarta-feira",
        Weekday::Thu => "Quinta-feira",
        Weekday::Fri => "Sexta-feira",
        Weekday::Sat => "Sábado",
    }
}

/// Axis label for a daily bucket: `"05"`, or `"05, Seg"` for compact ranges.
pub fn day_label(date: NaiveDate, with_weekday: bool) -> String {
    if with_weekday {
        format!("{:02}, {}", date.day(), weekday_short(date.weekday()))
    } else {
        format!("{:02}", date.day())
    }
}

/// Tooltip title for a daily bucket, e.g. `"05/01 | Segunda-feira"`.
pub fn day_tooltip(date: NaiveDate) -> String {
    format!(
        "{:02}/{:02} | {}",
        date.day(),
        date.month(),
        weekday_long(date.weekday())
    )
}

/// Tooltip title for a monthly bucket, e.g. `"Janeiro de 2026"`.
pub fn month_tooltip(year: i32, month0: u32) -> String {
    format!("{} de {}", month_long(month0), year)
}

/// `dd/mm/yy`
pub fn ddmmyy(date: NaiveDate) -> String {
    format!(
        "{:02}/{:02}/{:02}",
        date.day(),
        date.month(),
        date.year().rem_euclid(100)
    )
}

/// Format cents as Brazilian reais, e.g. `123456` -> `"R$ 1.234,56"`.
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let whole = abs_cents / 100;
    let fractional = abs_cents % 100;
    format!(
        "{}R$ {},{:02}",
        sign,
        format_with_thousands(whole, '.'),
        fractional
    )
}

fn format_with_thousands(n: u64, sep: char) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(sep);
        }
        result.push(c);
    }
    result
}

/// Share of `part` in `whole` as a percentage; 0 when `whole` is not positive.
pub fn percent_of(part: i64, whole: i64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Round a percentage to one decimal place, as shown on the dashboard.
pub fn round_percent(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `"12,5%"`
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", round_percent(value)).replace('.', ",")
}
