//! Display helpers for console output.

/// `1234.5` → `"$1,234.50"`; negative amounts get a leading minus.
/// Non-USD currencies are rendered as `"1,234.50 EUR"`.
pub fn format_currency(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    if currency.eq_ignore_ascii_case("USD") {
        format!("{sign}${whole}.{:02}", cents % 100)
    } else {
        format!("{sign}{whole}.{:02} {currency}", cents % 100)
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Show only the last four digits.
pub fn mask_account_number(account_number: &str) -> String {
    let count = account_number.chars().count();
    if count <= 4 {
        return account_number.to_string();
    }
    let tail: String = account_number.chars().skip(count - 4).collect();
    format!("****{tail}")
}

/// Ten-digit numbers become `(555) 123-4567`; anything else is returned as is.
pub fn format_phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() == 10 {
        format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
    } else {
        phone.to_string()
    }
}

/// First letters of the first and last name parts, uppercased.
pub fn customer_initials(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    let initial = |s: &str| s.chars().next().map(|c| c.to_uppercase().to_string()).unwrap_or_default();
    match parts.as_slice() {
        [] => String::new(),
        [only] => initial(*only),
        [first, .., last] => format!("{}{}", initial(*first), initial(*last)),
    }
}

pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    (current - previous) / previous * 100.0
}

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...")
}
