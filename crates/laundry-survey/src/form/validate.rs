//! Field validation for the survey form.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;

use super::SurveyForm;
use crate::entry::{Category, SurveyEntry};

/// 10-digit Indian mobile number.
pub const PHONE_PATTERN: &str = r"^[6-9]\d{9}$";

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("phone pattern is a valid regex"));

const REQUIRED: &str = "This field is required";
const OTHER_CATEGORY_REQUIRED: &str = "Please specify category";
const UNKNOWN_CATEGORY: &str = "Select a category from the list";
const INVALID_PHONE: &str = "Enter valid 10-digit Indian phone number";
const LOCATION_REQUIRED: &str = "Google location is required";
const INVALID_URL: &str = "Please enter a valid URL";
const LEAD_DETAIL_REQUIRED: &str = "Please enter lead details";

/// A validation failure on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Column name of the failing field.
    pub field: &'static str,
    /// Message shown next to the field.
    pub message: &'static str,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: &'static str, message: &'static str) -> Self {
        Self { field, message }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field error found in one validation pass, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the failures.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// The failure for a field, if any.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.0.iter().find(|e| e.field == field)
    }

    /// Whether a field failed.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.field(field).is_some()
    }

    fn push(&mut self, field: &'static str, message: &'static str) {
        self.0.push(FieldError::new(field, message));
    }
}

impl From<Vec<FieldError>> for ValidationErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// A trimmed, non-blank value.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn is_valid_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

/// A well-formed absolute web URL.
fn is_valid_url(value: &str) -> bool {
    Url::parse(value)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
}

/// Validate the form and assemble the entry to persist.
///
/// Every field is checked; all failures are returned together.
///
/// # Errors
///
/// Returns the field errors if any rule fails.
pub fn validate(form: &SurveyForm) -> Result<SurveyEntry, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let establishment_name = present(form.establishment_name.as_ref());
    if establishment_name.is_none() {
        errors.push("establishment_name", REQUIRED);
    }

    let category = match present(form.category.as_ref()) {
        None => {
            errors.push("category", REQUIRED);
            None
        }
        Some(selected) if selected == Category::OTHERS => {
            let category =
                Category::from_selection(selected, present(form.other_category.as_ref()));
            if category.is_none() {
                errors.push("other_category", OTHER_CATEGORY_REQUIRED);
            }
            category
        }
        Some(selected) => {
            let category = Category::from_selection(selected, None);
            if category.is_none() {
                errors.push("category", UNKNOWN_CATEGORY);
            }
            category
        }
    };

    let gm_phone = present(form.gm_phone.as_ref()).unwrap_or_default();
    if !gm_phone.is_empty() && !is_valid_phone(gm_phone) {
        errors.push("gm_phone", INVALID_PHONE);
    }

    let hk_phone = present(form.hk_phone.as_ref()).unwrap_or_default();
    if !hk_phone.is_empty() && !is_valid_phone(hk_phone) {
        errors.push("hk_phone", INVALID_PHONE);
    }

    let location = present(form.location.as_ref());
    match location {
        None => errors.push("location", LOCATION_REQUIRED),
        Some(url) if !is_valid_url(url) => errors.push("location", INVALID_URL),
        Some(_) => {}
    }

    let lead_detail = present(form.lead_detail.as_ref()).unwrap_or_default();
    if form.lead.is_yes() && lead_detail.is_empty() {
        errors.push("lead_detail", LEAD_DETAIL_REQUIRED);
    }

    match (establishment_name, category, location) {
        (Some(name), Some(category), Some(location)) if errors.is_empty() => Ok(SurveyEntry {
            establishment_name: name.to_string(),
            category,
            gm_name: present(form.gm_name.as_ref()).unwrap_or_default().to_string(),
            gm_phone: gm_phone.to_string(),
            hk_name: present(form.hk_name.as_ref()).unwrap_or_default().to_string(),
            hk_phone: hk_phone.to_string(),
            location: location.to_string(),
            photo_url: String::new(),
            in_house_laundry: form.in_house_laundry.is_yes(),
            current_laundry: present(form.current_laundry.as_ref())
                .unwrap_or_default()
                .to_string(),
            lead: form.lead.is_yes(),
            lead_detail: lead_detail.to_string(),
            created_by: None,
        }),
        _ => Err(errors),
    }
}
