use crate::utils::error::{Result, ShippingError};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ShippingError::validation(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ShippingError::validation(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(ShippingError::validation(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ShippingError::validation(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(ShippingError::validation(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

/// 重量、尺寸必須是有限的正數
pub fn validate_positive_number(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ShippingError::validation(
            field_name,
            value,
            "Value must be greater than 0",
        ));
    }
    Ok(())
}

pub fn validate_non_negative_number(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ShippingError::validation(
            field_name,
            value,
            "Value cannot be negative",
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ShippingError::validation(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ShippingError::validation(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn postal_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9A-Za-z][0-9A-Za-z \-]{2,9}$").unwrap())
}

pub fn validate_postal_code(field_name: &str, value: &str) -> Result<()> {
    if !postal_code_regex().is_match(value.trim()) {
        return Err(ShippingError::validation(
            field_name,
            value,
            "Postal code must be 3 to 10 letters or digits",
        ));
    }
    Ok(())
}

/// 確認 id 不重複，也不含 offer id 使用的分隔字元
pub fn validate_identifiers<'a, I>(field_name: &str, ids: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for id in ids {
        validate_non_empty_string(field_name, id)?;
        if id.contains(':') {
            return Err(ShippingError::validation(
                field_name,
                id,
                "Identifier cannot contain ':'",
            ));
        }
        if !seen.insert(id) {
            return Err(ShippingError::validation(field_name, id, "Duplicate identifier"));
        }
    }
    Ok(())
}
