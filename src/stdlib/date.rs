//! Date/time functions (§4.4 "date" category).
//!
//! `parseDate` auto-detects Date vs. DateTime; `parseDateOnly` and
//! `parseDateTime` enforce their result type (§4.4, §9.1: a lenient
//! `/`-or-`-` separated `YYYY/MM/DD` date also parses as a plain Date).

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

use crate::error::{Span, UtlxError};
use crate::udm::Udm;

use super::{type_error, Invoker, StdlibFn};

fn arg_str<'a>(args: &'a [crate::udm::Udm], i: usize, func: &str, span: Span) -> Result<&'a str, UtlxError> {
    args[i]
        .as_str()
        .ok_or_else(|| type_error(func, i, "expected a string", span))
}

fn normalize_date_separators(s: &str) -> String {
    s.replace('/', "-")
}

fn try_parse_date(s: &str) -> Option<NaiveDate> {
    let normalized = normalize_date_separators(s);
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok()
}

fn try_parse_datetime(s: &str) -> Option<NaiveDateTime> {
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

fn parse_date(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "parseDate", span)?;
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(Udm::DateTime(dt.with_timezone(&Utc)));
    }
    if let Some(dt) = try_parse_datetime(s) {
        return Ok(Udm::LocalDateTime(dt));
    }
    if let Some(d) = try_parse_date(s) {
        return Ok(Udm::Date(d));
    }
    Err(type_error("parseDate", 0, format!("'{s}' is not a recognizable date or datetime"), span))
}

fn parse_date_only(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "parseDateOnly", span)?;
    try_parse_date(s)
        .map(Udm::Date)
        .ok_or_else(|| type_error("parseDateOnly", 0, format!("'{s}' is not a date"), span))
}

fn parse_date_time(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let s = arg_str(args, 0, "parseDateTime", span)?;
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(Udm::DateTime(dt.with_timezone(&Utc)));
    }
    try_parse_datetime(s)
        .map(Udm::LocalDateTime)
        .ok_or_else(|| type_error("parseDateTime", 0, format!("'{s}' is not a datetime"), span))
}

const MONTH_NAMES_EN: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

fn month_name(month: u32, locale: &str) -> String {
    let idx = (month.saturating_sub(1)).min(11) as usize;
    match locale {
        // A small built-in locale table; anything else falls back to
        // English rather than failing the whole format call.
        "fr" | "fr-FR" => {
            const FR: [&str; 12] = [
                "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août",
                "septembre", "octobre", "novembre", "décembre",
            ];
            FR[idx].to_string()
        }
        "de" | "de-DE" => {
            const DE: [&str; 12] = [
                "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August",
                "September", "Oktober", "November", "Dezember",
            ];
            DE[idx].to_string()
        }
        _ => MONTH_NAMES_EN[idx].to_string(),
    }
}

/// ICU-lite pattern support: `yyyy MM dd HH mm ss MMMM`.
fn format_date(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let pattern = arg_str(args, 1, "formatDate", span)?;
    let locale = if args.len() > 2 { arg_str(args, 2, "formatDate", span)? } else { "en" };

    let (date, time) = match &args[0] {
        Udm::Date(d) => (*d, NaiveTime::from_hms_opt(0, 0, 0).unwrap()),
        Udm::LocalDateTime(dt) => (dt.date(), dt.time()),
        Udm::DateTime(dt) => (dt.naive_utc().date(), dt.naive_utc().time()),
        Udm::Time(t) => (NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(), *t),
        _ => return Err(type_error("formatDate", 0, "expected a date/time value", span)),
    };

    let mut out = String::new();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }
        match c {
            'y' => out.push_str(&format!("{:0width$}", date.year(), width = run)),
            'M' if run >= 4 => out.push_str(&month_name(date.month(), locale)),
            'M' => out.push_str(&format!("{:0width$}", date.month(), width = run)),
            'd' => out.push_str(&format!("{:0width$}", date.day(), width = run)),
            'H' => out.push_str(&format!("{:0width$}", time.hour(), width = run)),
            'm' => out.push_str(&format!("{:0width$}", time.minute(), width = run)),
            's' => out.push_str(&format!("{:0width$}", time.second(), width = run)),
            _ => out.push_str(&c.to_string().repeat(run)),
        }
        i += run;
    }
    Ok(Udm::string(out))
}

fn now(_args: &[Udm], _span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    Ok(Udm::DateTime(Utc::now()))
}

fn date_add_days(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let days = args[1]
        .as_integer()
        .ok_or_else(|| type_error("dateAddDays", 1, "expected an integer", span))?;
    match &args[0] {
        Udm::Date(d) => Ok(Udm::Date(*d + chrono::Duration::days(days))),
        Udm::LocalDateTime(dt) => Ok(Udm::LocalDateTime(*dt + chrono::Duration::days(days))),
        Udm::DateTime(dt) => Ok(Udm::DateTime(*dt + chrono::Duration::days(days))),
        _ => Err(type_error("dateAddDays", 0, "expected a date/datetime value", span)),
    }
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn { name: "parseDate", min_arity: 1, max_arity: 1, implementation: parse_date });
    v.push(StdlibFn { name: "parseDateOnly", min_arity: 1, max_arity: 1, implementation: parse_date_only });
    v.push(StdlibFn { name: "parseDateTime", min_arity: 1, max_arity: 1, implementation: parse_date_time });
    v.push(StdlibFn { name: "formatDate", min_arity: 2, max_arity: 3, implementation: format_date });
    v.push(StdlibFn { name: "now", min_arity: 0, max_arity: 0, implementation: now });
    v.push(StdlibFn { name: "dateAddDays", min_arity: 2, max_arity: 2, implementation: date_add_days });
}
