//! Field validators used by the login, checkout and payment forms.

use std::sync::OnceLock;

use regex::Regex;

type Pattern = OnceLock<Option<Regex>>;

static EMAIL: Pattern = OnceLock::new();
static CARD_NUMBER: Pattern = OnceLock::new();
static CVV: Pattern = OnceLock::new();
static ZIP_CODE: Pattern = OnceLock::new();
static EXPIRY: Pattern = OnceLock::new();

/// Compiled once; a pattern that fails to compile matches nothing
fn matches(cell: &'static Pattern, pattern: &str, text: &str) -> bool {
    cell.get_or_init(|| Regex::new(pattern).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

/// Something `@` something `.` something, without whitespace
pub fn validate_email(email: &str) -> bool {
    matches(&EMAIL, r"^[^\s@]+@[^\s@]+\.[^\s@]+$", email)
}

pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= 6
}

/// Exactly 16 digits once whitespace is removed
pub fn validate_card_number(card_number: &str) -> bool {
    let cleaned: String = card_number.chars().filter(|c| !c.is_whitespace()).collect();
    matches(&CARD_NUMBER, r"^[0-9]{16}$", &cleaned)
}

pub fn validate_cvv(cvv: &str) -> bool {
    matches(&CVV, r"^[0-9]{3,4}$", cvv)
}

/// `12345` or `12345-6789`
pub fn validate_zip_code(zip_code: &str) -> bool {
    matches(&ZIP_CODE, r"^[0-9]{5}(-[0-9]{4})?$", zip_code)
}

/// Ten digits, whatever punctuation surrounds them
pub fn validate_phone(phone: &str) -> bool {
    phone.chars().filter(|c| c.is_ascii_digit()).count() == 10
}

/// `MM/YY`; only the shape is checked
pub fn validate_expiry(expiry: &str) -> bool {
    matches(&EXPIRY, r"^[0-9]{2}/[0-9]{2}$", expiry)
}
