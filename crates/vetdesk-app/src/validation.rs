// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use regex::Regex;
use std::sync::LazyLock;
use time::macros::format_description;
use time::{Date, Time};

pub const DATE_LAYOUT: &str = "YYYY-MM-DD";
pub const TIME_LAYOUT: &str = "HH:MM";

/// Body digits plus the check character.
pub const RUT_MAX_CHARS: usize = 9;

const CHILE_COUNTRY_CODE: &str = "56";

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static CHILE_PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?56)?9\d{8}$").expect("phone pattern is valid"));

static PHONE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-().]").expect("separator pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidRut,
    InvalidEmail,
    InvalidPhone,
    InvalidDate,
    InvalidTime,
    InvalidAmount,
    InvalidQuantity,
}

impl ValidationError {
    /// Text shown next to the offending field.
    pub const fn field_message(self) -> &'static str {
        match self {
            Self::InvalidRut => "RUT inválido",
            Self::InvalidEmail => "Correo electrónico inválido",
            Self::InvalidPhone => "Teléfono inválido (ej: +56 9 1234 5678)",
            Self::InvalidDate => "Fecha inválida",
            Self::InvalidTime => "Hora inválida",
            Self::InvalidAmount => "Monto inválido",
            Self::InvalidQuantity => "Cantidad inválida",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRut => f.write_str("invalid RUT value"),
            Self::InvalidEmail => f.write_str("invalid email value"),
            Self::InvalidPhone => f.write_str("invalid phone value"),
            Self::InvalidDate => f.write_str("invalid date value"),
            Self::InvalidTime => f.write_str("invalid time value"),
            Self::InvalidAmount => f.write_str("invalid amount value"),
            Self::InvalidQuantity => f.write_str("invalid quantity value"),
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

fn clean_rut(input: &str) -> String {
    input
        .chars()
        .filter(|c| !matches!(c, '.' | '-') && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Modulo 11 check character for a RUT body.
pub fn rut_check_digit(body: &str) -> Option<char> {
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut sum = 0u32;
    let mut weight = 2u32;
    for digit in body.bytes().rev() {
        sum += u32::from(digit - b'0') * weight;
        weight = if weight == 7 { 2 } else { weight + 1 };
    }

    Some(match 11 - sum % 11 {
        11 => '0',
        10 => 'K',
        value => char::from_digit(value, 10)?,
    })
}

pub fn validate_rut(formatted: &str) -> bool {
    let clean = clean_rut(formatted);
    let mut chars = clean.chars();
    let Some(given) = chars.next_back() else {
        return false;
    };
    match rut_check_digit(chars.as_str()) {
        Some(expected) => expected.eq_ignore_ascii_case(&given),
        None => false,
    }
}

/// Reformats partial RUT input as it is typed; never fails.
pub fn format_rut(raw: &str) -> String {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, 'k' | 'K'))
        .map(|c| c.to_ascii_uppercase())
        .take(RUT_MAX_CHARS)
        .collect();
    if clean.len() <= 1 {
        return clean;
    }

    let (body, check) = clean.split_at(clean.len() - 1);
    format!("{}-{check}", group_thousands(body, '.'))
}

pub fn parse_rut(input: &str) -> ValidationResult<String> {
    let formatted = format_rut(input);
    if !validate_rut(&formatted) {
        return Err(ValidationError::InvalidRut);
    }
    Ok(formatted)
}

pub fn is_valid_email(input: &str) -> bool {
    EMAIL_PATTERN.is_match(input.trim())
}

pub fn is_valid_chile_phone(input: &str) -> bool {
    let compact = PHONE_SEPARATORS.replace_all(input.trim(), "");
    CHILE_PHONE_PATTERN.is_match(&compact)
}

/// Best-effort canonical `+56…` form; validity is decided by the caller.
pub fn normalize_chile_phone(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    let national = match digits.strip_prefix(CHILE_COUNTRY_CODE) {
        Some(rest) if digits.len() > 9 => rest,
        _ => digits.as_str(),
    };
    format!("+{CHILE_COUNTRY_CODE}{national}")
}

pub fn parse_chile_phone(input: &str) -> ValidationResult<String> {
    let normalized = normalize_chile_phone(input);
    if !is_valid_chile_phone(&normalized) {
        return Err(ValidationError::InvalidPhone);
    }
    Ok(normalized)
}

pub fn parse_date(input: &str) -> ValidationResult<Date> {
    Date::parse(input.trim(), &format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)
}

pub fn format_date(value: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        value.year(),
        u8::from(value.month()),
        value.day()
    )
}

pub fn parse_time(input: &str) -> ValidationResult<Time> {
    Time::parse(input.trim(), &format_description!("[hour]:[minute]"))
        .map_err(|_| ValidationError::InvalidTime)
}

pub fn format_time(value: Time) -> String {
    format!("{:02}:{:02}", value.hour(), value.minute())
}

/// Parses peso amounts such as `12990`, `12.990` or `$12.990`.
pub fn parse_clp(input: &str) -> ValidationResult<i64> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(ValidationError::InvalidAmount);
    }
    let digits: String = trimmed.chars().filter(|c| *c != '.').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidAmount);
    }
    digits.parse().map_err(|_| ValidationError::InvalidAmount)
}

pub fn format_clp(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!(
        "{sign}${}",
        group_thousands(&amount.unsigned_abs().to_string(), '.')
    )
}

pub fn parse_quantity(input: &str) -> ValidationResult<u32> {
    input
        .trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::InvalidQuantity)
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{
        ValidationError, format_clp, format_rut, format_time, is_valid_chile_phone,
        is_valid_email, normalize_chile_phone, parse_chile_phone, parse_clp, parse_date,
        parse_quantity, parse_rut, parse_time, rut_check_digit, validate_rut,
    };
    use time::{Date, Month, Time};

    #[test]
    fn validate_rut_accepts_known_good_values() {
        for rut in [
            "12.345.678-5",
            "11.111.111-1",
            "7.654.321-6",
            "14.000.000-0",
            "10.000.013-K",
            "16.543.210-k",
            "123456785",
        ] {
            assert!(validate_rut(rut), "{rut} should be valid");
        }
    }

    #[test]
    fn validate_rut_rejects_every_other_check_character() {
        for (body, good) in [("12345678", '5'), ("14000000", '0'), ("10000013", 'K')] {
            for candidate in "0123456789K".chars().filter(|c| *c != good) {
                let rut = format!("{body}-{candidate}");
                assert!(!validate_rut(&rut), "{rut} should be rejected");
            }
        }
    }

    #[test]
    fn validate_rut_rejects_malformed_input() {
        assert!(!validate_rut(""));
        assert!(!validate_rut("5"));
        assert!(!validate_rut("12.3A5.678-5"));
        assert!(!validate_rut("--"));
    }

    #[test]
    fn check_digit_maps_eleven_and_ten() {
        assert_eq!(rut_check_digit("62"), Some('0'));
        assert_eq!(rut_check_digit("23"), Some('K'));
        assert_eq!(rut_check_digit(""), None);
    }

    #[test]
    fn format_rut_groups_body_and_check_character() {
        assert_eq!(format_rut("123456789"), "12.345.678-9");
        assert_eq!(format_rut("76543216"), "7.654.321-6");
        assert_eq!(format_rut("12.345.678-5"), "12.345.678-5");
        assert_eq!(format_rut("1234"), "123-4");
        assert_eq!(format_rut("1"), "1");
        assert_eq!(format_rut("10000013k"), "10.000.013-K");
    }

    #[test]
    fn format_rut_truncates_beyond_nine_characters() {
        assert_eq!(format_rut("1234567890123"), "12.345.678-9");
    }

    #[test]
    fn parse_rut_returns_formatted_value() {
        assert_eq!(parse_rut("123456785"), Ok("12.345.678-5".to_owned()));
        assert_eq!(parse_rut("123456789"), Err(ValidationError::InvalidRut));
    }

    #[test]
    fn phone_normalization_prepends_country_code() {
        assert_eq!(normalize_chile_phone("56912345678"), "+56912345678");
        assert_eq!(normalize_chile_phone("912345678"), "+56912345678");
        assert_eq!(normalize_chile_phone("+56 9 1234 5678"), "+56912345678");
        // Malformed input still yields a string; validation rejects it.
        assert_eq!(normalize_chile_phone("12345"), "+5612345");
    }

    #[test]
    fn phone_validation_examples() {
        assert!(is_valid_chile_phone("+56 9 1234 5678"));
        assert!(is_valid_chile_phone("+56912345678"));
        assert!(is_valid_chile_phone("912345678"));
        assert!(!is_valid_chile_phone("12345"));
        assert!(!is_valid_chile_phone("+56 2 2345 6789"));
        assert_eq!(
            parse_chile_phone("12345"),
            Err(ValidationError::InvalidPhone)
        );
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("tutor@clinica.cl"));
        assert!(is_valid_email("  a.b@c.co "));
        assert!(!is_valid_email("tutor@clinica"));
        assert!(!is_valid_email("tutor clinica@x.cl"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn date_and_time_parse_iso_layouts() {
        assert_eq!(
            parse_date("2026-03-09"),
            Ok(Date::from_calendar_date(2026, Month::March, 9).expect("valid date"))
        );
        assert_eq!(parse_date("09/03/2026"), Err(ValidationError::InvalidDate));
        let time = parse_time("09:30").expect("valid time");
        assert_eq!(time, Time::from_hms(9, 30, 0).expect("valid time"));
        assert_eq!(format_time(time), "09:30");
        assert_eq!(parse_time("9h"), Err(ValidationError::InvalidTime));
    }

    #[test]
    fn clp_amounts_use_dot_grouping() {
        assert_eq!(format_clp(12_990), "$12.990");
        assert_eq!(format_clp(990), "$990");
        assert_eq!(format_clp(1_250_000), "$1.250.000");
        assert_eq!(parse_clp("$12.990"), Ok(12_990));
        assert_eq!(parse_clp("4990"), Ok(4_990));
        assert_eq!(parse_clp("-5"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_clp("12,5"), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn quantity_must_be_a_non_negative_integer() {
        assert_eq!(parse_quantity(" 12 "), Ok(12));
        assert_eq!(parse_quantity("-1"), Err(ValidationError::InvalidQuantity));
        assert_eq!(parse_quantity("1.5"), Err(ValidationError::InvalidQuantity));
    }
}
