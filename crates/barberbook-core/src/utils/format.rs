use chrono::{DateTime, Local, NaiveDate, Utc};

/// Loose e-mail check: something, `@`, something, `.`, something, no spaces.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .rsplit_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                    .unwrap_or(false)
        }
        None => false,
    }
}

/// Parse a `DD/MM/YYYY` date as typed in the registration form.
pub fn parse_birth_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%d/%m/%Y").ok()
}

/// Format a CPF as 000.000.000-00
pub fn format_cpf(cpf: &str) -> String {
    let digits: String = cpf.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != 11 {
        return cpf.to_string(); // Return original if can't format
    }
    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

/// Format a phone number for display
/// Normalizes Brazilian numbers to (XX) XXXXX-XXXX or (XX) XXXX-XXXX
pub fn format_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = match digits.strip_prefix("55") {
        Some(rest) if digits.len() == 12 || digits.len() == 13 => rest.to_string(),
        _ => digits,
    };

    match digits.len() {
        11 => format!("({}) {}-{}", &digits[0..2], &digits[2..7], &digits[7..11]),
        10 => format!("({}) {}-{}", &digits[0..2], &digits[2..6], &digits[6..10]),
        _ => phone.to_string(),
    }
}

/// Format an amount in reais: `R$ 1.234,50`
pub fn format_price(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    let reais = (cents / 100).to_string();

    let mut grouped = String::new();
    for (i, c) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{}R$ {},{:02}", sign, grouped, cents % 100)
}

/// Local date and time, `DD/MM/YYYY HH:MM`
pub fn format_date_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string()
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@mail.co.uk"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana example@x.com"));
        assert!(!is_valid_email("ana@@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_parse_birth_date() {
        assert_eq!(
            parse_birth_date("28/02/1990"),
            NaiveDate::from_ymd_opt(1990, 2, 28)
        );
        assert_eq!(parse_birth_date("31/02/1990"), None);
        assert_eq!(parse_birth_date("1990-02-28"), None);
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("12345678909"), "123.456.789-09");
        assert_eq!(format_cpf("123.456.789-09"), "123.456.789-09");
        assert_eq!(format_cpf("123"), "123"); // Too short, return as-is
    }

    #[test]
    fn test_format_phone() {
        assert_eq!(format_phone("11999990000"), "(11) 99999-0000");
        assert_eq!(format_phone("+55 11 99999-0000"), "(11) 99999-0000");
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone("123"), "123");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(35.0), "R$ 35,00");
        assert_eq!(format_price(25.5), "R$ 25,50");
        assert_eq!(format_price(1234.5), "R$ 1.234,50");
        assert_eq!(format_price(1_000_000.0), "R$ 1.000.000,00");
        assert_eq!(format_price(0.0), "R$ 0,00");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Corte", 10), "Corte");
        assert_eq!(truncate_string("Corte e barba", 8), "Corte...");
        assert_eq!(truncate_string("Oi", 2), "Oi");
    }
}
