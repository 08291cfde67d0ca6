//! Survey entry types.
//!
//! A [`SurveyEntry`] is one laundry-establishment record as it is stored in
//! the `laundry_entries` table. Entries are built by the form validator and
//! never updated afterwards.

use serde::{Deserialize, Serialize};

/// Name of the table holding survey entries.
pub const ENTRIES_TABLE_NAME: &str = "laundry_entries";

/// Name of the storage bucket holding establishment photos.
pub const STORAGE_BUCKET_NAME: &str = "establishment-photos";

/// Object path prefix for uploaded photos.
pub const PHOTO_PATH_PREFIX: &str = "establishments";

/// Prefix stored in front of a free-text category.
pub const OTHER_CATEGORY_PREFIX: &str = "Others - ";

/// Category of establishment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    /// Hotel.
    Hotel,
    /// Spa.
    Spa,
    /// Privately run guesthouse.
    PrivateGuesthouse,
    /// Government guesthouse.
    GovtGuesthouse,
    /// Lodge.
    Lodge,
    /// Tent house.
    TentHouse,
    /// Marriage hall.
    MarriageHall,
    /// Banquet hall.
    BanquetHall,
    /// Anything else, with the surveyor's description.
    Other(String),
}

impl Category {
    /// Selectable options, in display order. `Others` asks for free text.
    pub const OPTIONS: [&'static str; 9] = [
        "Hotel",
        "Spa",
        "Private Guesthouse",
        "Govt Guesthouse",
        "Lodge",
        "Tent House",
        "Marriage Hall",
        "Banquet Hall",
        "Others",
    ];

    /// The option label that selects a free-text category.
    pub const OTHERS: &'static str = "Others";

    /// Resolve a selected option, consulting `other` when `Others` is chosen.
    ///
    /// Returns `None` if `selected` is not one of [`Category::OPTIONS`], or
    /// if `Others` is selected without a non-blank description.
    #[must_use]
    pub fn from_selection(selected: &str, other: Option<&str>) -> Option<Self> {
        let category = match selected {
            "Hotel" => Self::Hotel,
            "Spa" => Self::Spa,
            "Private Guesthouse" => Self::PrivateGuesthouse,
            "Govt Guesthouse" => Self::GovtGuesthouse,
            "Lodge" => Self::Lodge,
            "Tent House" => Self::TentHouse,
            "Marriage Hall" => Self::MarriageHall,
            "Banquet Hall" => Self::BanquetHall,
            Self::OTHERS => {
                let text = other.map(str::trim).filter(|t| !t.is_empty())?;
                Self::Other(text.to_string())
            }
            _ => return None,
        };
        Some(category)
    }

    /// Parse the stored form back into a category.
    #[must_use]
    pub fn from_stored(stored: &str) -> Option<Self> {
        match stored.strip_prefix(OTHER_CATEGORY_PREFIX) {
            Some(text) if !text.is_empty() => Some(Self::Other(text.to_string())),
            Some(_) => None,
            None if stored == Self::OTHERS => None,
            None => Self::from_selection(stored, None),
        }
    }

    /// Check whether this is a free-text category.
    #[must_use]
    pub fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hotel => write!(f, "Hotel"),
            Self::Spa => write!(f, "Spa"),
            Self::PrivateGuesthouse => write!(f, "Private Guesthouse"),
            Self::GovtGuesthouse => write!(f, "Govt Guesthouse"),
            Self::Lodge => write!(f, "Lodge"),
            Self::TentHouse => write!(f, "Tent House"),
            Self::MarriageHall => write!(f, "Marriage Hall"),
            Self::BanquetHall => write!(f, "Banquet Hall"),
            Self::Other(text) => write!(f, "{OTHER_CATEGORY_PREFIX}{text}"),
        }
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_stored(&value).ok_or_else(|| format!("unknown category: {value}"))
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.to_string()
    }
}

/// One laundry-establishment survey record.
///
/// Field order matches the table's column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyEntry {
    /// Name of the establishment.
    pub establishment_name: String,
    /// Establishment category.
    pub category: Category,
    /// General manager's name.
    #[serde(default)]
    pub gm_name: String,
    /// General manager's phone.
    #[serde(default)]
    pub gm_phone: String,
    /// Housekeeping contact's name.
    #[serde(default)]
    pub hk_name: String,
    /// Housekeeping contact's phone.
    #[serde(default)]
    pub hk_phone: String,
    /// Map link for the establishment.
    pub location: String,
    /// Public URL of the uploaded photo, empty if none.
    #[serde(default)]
    pub photo_url: String,
    /// Whether the establishment runs its own laundry.
    #[serde(default)]
    pub in_house_laundry: bool,
    /// Laundry service currently used.
    #[serde(default)]
    pub current_laundry: String,
    /// Whether this is a sales lead.
    #[serde(default)]
    pub lead: bool,
    /// Lead details; non-empty whenever `lead` is set.
    #[serde(default)]
    pub lead_detail: String,
    /// Set by the backend, never by the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl SurveyEntry {
    /// Check the lead invariant: a lead always carries details.
    #[must_use]
    pub fn has_consistent_lead(&self) -> bool {
        !self.lead || !self.lead_detail.trim().is_empty()
    }

    /// Check whether a photo was attached.
    #[must_use]
    pub fn has_photo(&self) -> bool {
        !self.photo_url.is_empty()
    }
}
