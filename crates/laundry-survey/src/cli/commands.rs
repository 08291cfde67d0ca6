//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::error::Result;
use crate::form::{SurveyForm, YesNo};
use crate::gateway::PhotoUpload;

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Submit command arguments: one survey entry.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Name of establishment
    #[arg(long)]
    pub name: Option<String>,

    /// Category (Hotel, Spa, Private Guesthouse, Govt Guesthouse, Lodge,
    /// Tent House, Marriage Hall, Banquet Hall, Others)
    #[arg(long)]
    pub category: Option<String>,

    /// Category text when --category is Others
    #[arg(long, value_name = "TEXT")]
    pub other_category: Option<String>,

    /// General manager's name
    #[arg(long)]
    pub gm_name: Option<String>,

    /// General manager's phone
    #[arg(long, value_name = "PHONE")]
    pub gm_phone: Option<String>,

    /// Housekeeping contact's name
    #[arg(long)]
    pub hk_name: Option<String>,

    /// Housekeeping contact's phone
    #[arg(long, value_name = "PHONE")]
    pub hk_phone: Option<String>,

    /// Photo of the establishment
    #[arg(long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// In-house laundry present
    #[arg(long, value_enum, default_value = "no")]
    pub in_house_laundry: YesNoArg,

    /// Laundry service currently used
    #[arg(long)]
    pub current_laundry: Option<String>,

    /// Lead
    #[arg(long, value_enum, default_value = "no")]
    pub lead: YesNoArg,

    /// Lead details, required with --lead yes
    #[arg(long, value_name = "TEXT")]
    pub lead_detail: Option<String>,

    /// Latitude of the current position
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the current position
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Validate and run the submission against an in-memory backend
    #[arg(long)]
    pub dry_run: bool,
}

impl SubmitCommand {
    /// Fill a survey form from the arguments, reading the photo if given.
    ///
    /// The location is left empty; it comes from a geolocation refresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the photo file cannot be read.
    pub async fn to_form(&self) -> Result<SurveyForm> {
        let photo = match &self.photo {
            Some(path) => Some(PhotoUpload::from_path(path).await?),
            None => None,
        };

        let mut form = SurveyForm {
            establishment_name: self.name.clone(),
            gm_name: self.gm_name.clone(),
            gm_phone: self.gm_phone.clone(),
            hk_name: self.hk_name.clone(),
            hk_phone: self.hk_phone.clone(),
            photo,
            in_house_laundry: self.in_house_laundry.into(),
            current_laundry: self.current_laundry.clone(),
            lead: self.lead.into(),
            lead_detail: self.lead_detail.clone(),
            ..SurveyForm::default()
        };
        if let Some(category) = &self.category {
            form.select_category(category.clone());
        }
        if form.shows_other_category() {
            form.other_category = self.other_category.clone();
        }
        Ok(form)
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Page to show, starting at 1
    #[arg(short, long, default_value = "1")]
    pub page: usize,

    /// Rows per page (defaults to the configured page size)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Keep rows whose column contains TEXT (repeatable)
    #[arg(short, long = "filter", value_name = "COLUMN=TEXT")]
    pub filters: Vec<String>,

    /// Sort by a column, optionally descending
    #[arg(short, long, value_name = "COLUMN[:desc]")]
    pub sort: Option<String>,

    /// Columns to show, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Output file (defaults to the configured directory and file name)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// A yes/no radio answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum YesNoArg {
    /// Yes
    Yes,
    /// No
    #[default]
    No,
}

impl From<YesNoArg> for YesNo {
    fn from(arg: YesNoArg) -> Self {
        match arg {
            YesNoArg::Yes => Self::Yes,
            YesNoArg::No => Self::No,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}
