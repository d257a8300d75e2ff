// Number and currency formatting shared by the printed tables and the TUI

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

fn split_sign(value: f64) -> (&'static str, f64) {
    if value < 0.0 {
        ("-", -value)
    } else {
        ("", value.abs())
    }
}

pub fn format_with_commas(value: f64) -> String {
    let (sign, abs) = split_sign(value);
    let formatted = format!("{abs:.2}");
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    format!("{sign}{}.{decimal_part}", group_digits(integer_part, ','))
}

/// Whole units with `separator` between thousands, e.g. `20.000.000` for VND.
pub fn format_integer(value: f64, separator: char) -> String {
    let (sign, abs) = split_sign(value.round());
    let digits = format!("{abs:.0}");
    if digits == "0" {
        return digits;
    }
    format!("{sign}{}", group_digits(&digits, separator))
}

pub fn format_currency(value: f64, currency: &str) -> String {
    match currency {
        "VND" => format!("{} ₫", format_integer(value, '.')),
        "JPY" => format!("¥{}", format_integer(value, ',')),
        "USD" | "CAD" | "AUD" | "HKD" | "SGD" => format!("${}", format_with_commas(value)),
        "EUR" => format!("{} €", format_with_commas(value)),
        "GBP" => format!("£{}", format_with_commas(value)),
        _ => format!("{} {currency}", format_with_commas(value)),
    }
}

/// Prices below 10 keep four decimals so forex quotes stay readable.
pub fn format_price(price: f64) -> String {
    if price.abs() >= 1000.0 {
        format_with_commas(price)
    } else if price.abs() >= 10.0 {
        format!("{price:.2}")
    } else {
        format!("{price:.4}")
    }
}

pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else if amount >= 1.0 {
        format!("{amount:.2}")
    } else if amount >= 0.01 {
        format!("{amount:.4}")
    } else {
        format!("{amount:.8}")
    }
}

pub fn format_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{value:.2}%")
    } else {
        format!("{value:.2}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas(1234567.891), "1,234,567.89");
        assert_eq!(format_with_commas(999.5), "999.50");
        assert_eq!(format_with_commas(-1234.0), "-1,234.00");
    }

    #[test]
    fn test_format_currency_vnd() {
        assert_eq!(format_currency(20_000_000.0, "VND"), "20.000.000 ₫");
        assert_eq!(format_currency(0.0, "VND"), "0 ₫");
        assert_eq!(format_currency(-2_000_000.0, "VND"), "-2.000.000 ₫");
    }

    #[test]
    fn test_format_currency_others() {
        assert_eq!(format_currency(1500.0, "USD"), "$1,500.00");
        assert_eq!(format_currency(12.5, "EUR"), "12.50 €");
        assert_eq!(format_currency(123456.0, "JPY"), "¥123,456");
        assert_eq!(format_currency(10.0, "CHF"), "10.00 CHF");
    }

    #[test]
    fn test_format_amount_and_price() {
        assert_eq!(format_amount(1000.0), "1000");
        assert_eq!(format_amount(0.5), "0.5000");
        assert_eq!(format_price(1.0845), "1.0845");
        assert_eq!(format_price(1.08), "1.0800");
        assert_eq!(format_price(78.35), "78.35");
        assert_eq!(format_price(0.00072), "0.0007");
        assert_eq!(format_price(64230.5), "64,230.50");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(2.5), "+2.50%");
        assert_eq!(format_percent(-0.25), "-0.25%");
    }
}
