//! Partner domain models with Czech business-ID validation.

use serde::{Deserialize, Serialize};

use crate::audit::Audit;
use crate::errors::{Error, Result, ValidationError};

/// Customer or supplier (or both). Numbers are 70XXXXXX.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: i64,
    pub partner_number: String,
    pub company_name: String,
    /// IČO - Czech business registration number (8 digits, mod-11 checksum).
    pub ico: Option<String>,
    /// DIČ - Czech VAT ID ("CZ" + 8-10 digits).
    pub dic: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: String,
    pub is_customer: bool,
    pub is_supplier: bool,
    pub notes: Option<String>,

    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPartner {
    pub partner_number: String,
    pub company_name: String,
    pub ico: Option<String>,
    pub dic: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub contact_person: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_true")]
    pub is_customer: bool,
    #[serde(default)]
    pub is_supplier: bool,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

fn default_country() -> String {
    "CZ".to_string()
}

fn default_true() -> bool {
    true
}

impl NewPartner {
    pub fn validate(&self) -> Result<()> {
        if self.company_name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "company_name".to_string(),
            )));
        }
        if let Some(ico) = &self.ico {
            validate_ico(ico)?;
        }
        if let Some(dic) = &self.dic {
            validate_dic(dic)?;
        }
        Ok(())
    }
}

/// Validates a Czech IČO: 8 digits with a weighted mod-11 check digit.
/// Returns the normalized (whitespace-stripped) value.
pub fn validate_ico(value: &str) -> Result<String> {
    let ico: String = value.chars().filter(|c| !c.is_whitespace()).collect();

    if ico.len() != 8 || !ico.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "ICO must have exactly 8 digits".to_string(),
        )));
    }

    let digits: Vec<u32> = ico.chars().map(|c| c.to_digit(10).unwrap()).collect();
    let weights = [8u32, 7, 6, 5, 4, 3, 2];
    let checksum: u32 = digits[..7].iter().zip(weights).map(|(d, w)| d * w).sum();
    let remainder = checksum % 11;

    let expected = match remainder {
        0 => 1,
        1 => 0,
        r => (11 - r) % 10,
    };

    if digits[7] != expected {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "ICO has an invalid check digit".to_string(),
        )));
    }

    Ok(ico)
}

/// Validates a Czech DIČ: `CZ` prefix followed by 8-10 digits.
/// Returns the normalized uppercase value.
pub fn validate_dic(value: &str) -> Result<String> {
    let dic: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    let digits = dic.strip_prefix("CZ").ok_or_else(|| {
        Error::Validation(ValidationError::InvalidInput(
            "DIC must start with 'CZ'".to_string(),
        ))
    })?;

    if !(8..=10).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "DIC must be 'CZ' followed by 8-10 digits".to_string(),
        )));
    }

    Ok(dic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ico_accepted() {
        // 25596641: weighted sum 2*8+5*7+5*6+9*5+6*4+6*3+4*2 = 176, 176 % 11 = 0 -> check digit 1
        assert_eq!(validate_ico("25596641").unwrap(), "25596641");
        assert_eq!(validate_ico("255 966 41").unwrap(), "25596641");
    }

    #[test]
    fn test_invalid_ico_rejected() {
        assert!(validate_ico("25596642").is_err()); // wrong check digit
        assert!(validate_ico("1234567").is_err()); // too short
        assert!(validate_ico("abcdefgh").is_err());
    }

    #[test]
    fn test_dic_validation() {
        assert_eq!(validate_dic("cz25596641").unwrap(), "CZ25596641");
        assert!(validate_dic("25596641").is_err());
        assert!(validate_dic("CZ123").is_err());
    }
}
