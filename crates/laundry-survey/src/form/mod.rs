//! The survey data entry form.
//!
//! [`SurveyForm`] holds what the surveyor typed, unvalidated.
//! [`validate`] turns it into a [`SurveyEntry`](crate::entry::SurveyEntry)
//! or a list of field errors, and [`FormController`] runs the whole submit
//! flow against a gateway.

mod controller;
mod validate;

use serde::{Deserialize, Serialize};

use crate::gateway::PhotoUpload;

pub use controller::{photo_object_path, FormController, LocationStatus, SubmitOutcome};
pub use validate::{validate, FieldError, ValidationErrors, PHONE_PATTERN};

/// A yes/no radio choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YesNo {
    /// Yes.
    Yes,
    /// No.
    #[default]
    No,
}

impl YesNo {
    /// Whether the answer is yes.
    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

impl std::fmt::Display for YesNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
        }
    }
}

/// Raw form state, as typed.
///
/// `location` is never typed; it is filled in by a geolocation refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurveyForm {
    /// Name of establishment.
    pub establishment_name: Option<String>,
    /// Selected category option.
    pub category: Option<String>,
    /// Free-text category, shown when `Others` is selected.
    pub other_category: Option<String>,
    /// General manager's name.
    pub gm_name: Option<String>,
    /// General manager's phone.
    pub gm_phone: Option<String>,
    /// Housekeeping contact's name.
    pub hk_name: Option<String>,
    /// Housekeeping contact's phone.
    pub hk_phone: Option<String>,
    /// Map link from the last successful geolocation.
    pub location: Option<String>,
    /// Attached photo.
    pub photo: Option<PhotoUpload>,
    /// In-house laundry present.
    pub in_house_laundry: YesNo,
    /// Laundry service currently used.
    pub current_laundry: Option<String>,
    /// Lead.
    pub lead: YesNo,
    /// Lead detail; required when `lead` is yes.
    pub lead_detail: Option<String>,
}

impl SurveyForm {
    /// Create an empty form with default answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every field back to its initial value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Select a category. Choosing anything but `Others` clears the
    /// free-text category.
    pub fn select_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        if category != crate::entry::Category::OTHERS {
            self.other_category = None;
        }
        self.category = Some(category);
    }

    /// Whether the free-text category field is shown.
    #[must_use]
    pub fn shows_other_category(&self) -> bool {
        self.category.as_deref() == Some(crate::entry::Category::OTHERS)
    }
}
