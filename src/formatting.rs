//! Brazilian-locale display helpers used by the dashboard cards

/// Format with `.` thousands and `,` decimal separators, e.g. `-1.234,56`
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.*}", decimals, value);

    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{sign}{grouped},{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// `R$ 1.234,56`
pub fn format_currency(value: f64) -> String {
    format!("R$ {}", format_grouped(value, 2))
}

/// Client count, singular for exactly one (`1 cliente`, `-1 cliente`, `7 clientes`)
pub fn format_clients(value: f64) -> String {
    let count = truncate(value);
    if count.abs() == 1 {
        format!("{count} cliente")
    } else {
        format!("{count} clientes")
    }
}

/// Fraction as a locale percentage: `0.054` -> `5,40%`
pub fn format_percentage(fraction: f64, decimals: usize) -> String {
    format!("{}%", format_grouped(fraction * 100.0, decimals))
}

/// Signed ratio with one decimal and a `.` decimal point: `0.2` -> `+20.0%`
pub fn format_signed_ratio(ratio: f64) -> String {
    format!("{:+.1}%", ratio * 100.0)
}

/// Integer part toward zero; non-finite values become zero
pub fn truncate(value: f64) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}
