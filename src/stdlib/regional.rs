//! Regional number formatting (§4.4, §6.2, §9 redesign note: "factor a
//! thin abstraction `{group_sep, decimal_sep, fraction_digits,
//! group_size}` and plug it into both `formatNumber` stdlib and the
//! CSV serializer so behavior is literally identical").
//!
//! The CSV adapter (`crate::formats::csv`) calls [`format_number`]
//! directly so the two call sites can never drift apart.

use crate::error::{Span, UtlxError};
use crate::udm::Udm;

use super::{type_error, Invoker, StdlibFn};

/// One locale's number-presentation rule.
#[derive(Debug, Clone, Copy)]
pub struct NumberStyle {
    pub group_sep: char,
    pub decimal_sep: char,
    pub group_size: usize,
}

pub const NONE: NumberStyle = NumberStyle { group_sep: '\0', decimal_sep: '.', group_size: 0 };
pub const USA: NumberStyle = NumberStyle { group_sep: ',', decimal_sep: '.', group_size: 3 };
pub const EUROPEAN: NumberStyle = NumberStyle { group_sep: '.', decimal_sep: ',', group_size: 3 };
pub const FRENCH: NumberStyle = NumberStyle { group_sep: ' ', decimal_sep: ',', group_size: 3 };
/// Swiss uses an apostrophe thousands separator, substituted onto a
/// US-formatted number (§4.5 CSV "Swiss variant").
pub const SWISS: NumberStyle = NumberStyle { group_sep: '\'', decimal_sep: '.', group_size: 3 };

pub fn style_named(name: &str) -> Option<NumberStyle> {
    match name {
        "none" => Some(NONE),
        "usa" => Some(USA),
        "european" => Some(EUROPEAN),
        "french" => Some(FRENCH),
        "swiss" => Some(SWISS),
        _ => None,
    }
}

/// Renders `n` with `decimals` fractional digits and the given style,
/// optionally inserting group separators (§6.2 `decimals`/`useThousands`).
pub fn format_number(n: f64, style: NumberStyle, decimals: u32, use_thousands: bool) -> String {
    let negative = n.is_sign_negative() && n != 0.0;
    let fixed = format!("{:.*}", decimals as usize, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (fixed, None),
    };

    let grouped = if use_thousands && style.group_size > 0 {
        group_digits(&int_part, style.group_sep, style.group_size)
    } else {
        int_part
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            out.push(style.decimal_sep);
            out.push_str(&frac);
        }
    }
    out
}

fn group_digits(digits: &str, sep: char, group_size: usize) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / group_size);
    for (i, c) in chars.iter().enumerate() {
        let from_end = chars.len() - i;
        if i != 0 && from_end % group_size == 0 {
            out.push(sep);
        }
        out.push(*c);
    }
    out
}

fn format_number_stdlib(args: &[Udm], span: Span, _inv: &dyn Invoker) -> Result<Udm, UtlxError> {
    let n = args[0]
        .as_float()
        .ok_or_else(|| type_error("formatNumber", 0, "expected a number", span))?;
    let style_name = args[1]
        .as_str()
        .ok_or_else(|| type_error("formatNumber", 1, "expected a regional format name", span))?;
    let style = style_named(style_name)
        .ok_or_else(|| type_error("formatNumber", 1, format!("unknown regional format '{style_name}'"), span))?;
    let decimals = if args.len() > 2 {
        args[2]
            .as_integer()
            .ok_or_else(|| type_error("formatNumber", 2, "expected an integer", span))?
            .max(0) as u32
    } else {
        2
    };
    let use_thousands = if args.len() > 3 {
        args[3].as_bool().unwrap_or(true)
    } else {
        true
    };
    Ok(Udm::string(format_number(n, style, decimals, use_thousands)))
}

pub fn register(v: &mut Vec<StdlibFn>) {
    v.push(StdlibFn {
        name: "formatNumber",
        min_arity: 2,
        max_arity: 4,
        implementation: format_number_stdlib,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn european_formatting_matches_scenario_c() {
        assert_eq!(format_number(1234.5, EUROPEAN, 2, true), "1.234,50");
        assert_eq!(format_number(10.0, EUROPEAN, 2, true), "10,00");
    }

    #[test]
    fn swiss_uses_apostrophe_grouping() {
        assert_eq!(format_number(1234567.89, SWISS, 2, true), "1'234'567.89");
    }
}
