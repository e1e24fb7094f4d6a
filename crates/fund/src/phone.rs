//! Kenyan mobile number validation and normalization

use crate::error::{FundError, FundResult};

/// Validate a Kenyan mobile number (Safaricom/Airtel) and normalize it to
/// the international `+254XXXXXXXXX` form.
///
/// Accepted inputs, whitespace ignored: `07XXXXXXXX`, `01XXXXXXXX`,
/// `2547XXXXXXXX`, `+2541XXXXXXXX`, or the bare nine digits starting with
/// `7` or `1`.
pub fn normalize(raw: &str) -> FundResult<String> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

    let rest = if let Some(rest) = cleaned.strip_prefix("+254") {
        rest
    } else if let Some(rest) = cleaned.strip_prefix("254") {
        rest
    } else if let Some(rest) = cleaned.strip_prefix('0') {
        rest
    } else {
        cleaned.as_str()
    };

    let valid = rest.len() == 9
        && rest.starts_with(['1', '7'])
        && rest.chars().all(|c| c.is_ascii_digit());

    if !valid {
        return Err(FundError::validation(
            "Invalid phone number format. Use Kenyan format (e.g., 0712345678 or +254712345678)",
        ));
    }

    Ok(format!("+254{rest}"))
}

/// Mask a phone number for log lines: keep a short prefix and suffix.
pub fn mask(phone: &str) -> String {
    if phone.len() < 4 {
        return "***".to_string();
    }
    format!("{}***{}", &phone[..3], &phone[phone.len() - 2..])
}
