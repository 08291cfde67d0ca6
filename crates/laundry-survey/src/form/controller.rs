//! Submit flow for the survey form.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use super::{validate, SurveyForm};
use crate::entry::{SurveyEntry, PHOTO_PATH_PREFIX};
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::geo::Geolocator;

/// Object path for an uploaded photo: `{prefix}/{unix_millis}.{ext}`.
#[must_use]
pub fn photo_object_path(prefix: &str, file_name: &str, now: DateTime<Utc>) -> String {
    let extension = file_name.rsplit('.').next().unwrap_or_default();
    format!(
        "{}/{}.{extension}",
        prefix.trim_end_matches('/'),
        now.timestamp_millis()
    )
}

/// Result of a location refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationStatus {
    /// The location field now holds this link.
    Updated(String),
    /// No position was available; the field is unchanged.
    Unavailable(String),
}

/// What a successful submission wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The entry as inserted.
    pub entry: SurveyEntry,
    /// Object path of the uploaded photo, if one was attached.
    pub photo_path: Option<String>,
}

/// Drives the survey form: location refresh, validation, upload, insert.
///
/// The form is reset only after a successful insert; any failure leaves it
/// as it was so the surveyor can resubmit. There is no idempotency key, so a
/// resubmission after an ambiguous failure may store a duplicate.
pub struct FormController<'g> {
    gateway: &'g dyn Gateway,
    locator: Box<dyn Geolocator + 'g>,
    photo_prefix: String,
    form: SurveyForm,
}

impl std::fmt::Debug for FormController<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("gateway", &self.gateway.name())
            .field("photo_prefix", &self.photo_prefix)
            .field("form", &self.form)
            .finish_non_exhaustive()
    }
}

impl<'g> FormController<'g> {
    /// Create a controller with an empty form.
    #[must_use]
    pub fn new(gateway: &'g dyn Gateway, locator: impl Geolocator + 'g) -> Self {
        Self {
            gateway,
            locator: Box::new(locator),
            photo_prefix: PHOTO_PATH_PREFIX.to_string(),
            form: SurveyForm::default(),
        }
    }

    /// Use a different object path prefix for photos.
    #[must_use]
    pub fn with_photo_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.photo_prefix = prefix.into();
        self
    }

    /// Current form state.
    #[must_use]
    pub fn form(&self) -> &SurveyForm {
        &self.form
    }

    /// Mutable access to the form state.
    pub fn form_mut(&mut self) -> &mut SurveyForm {
        &mut self.form
    }

    /// Ask the locator for the current position and fill in the location.
    ///
    /// A failure is logged as a warning and leaves the field untouched; an
    /// empty location then blocks submission until a refresh succeeds.
    pub async fn refresh_location(&mut self) -> LocationStatus {
        match self.locator.current_position().await {
            Ok(coordinates) => {
                let link = coordinates.maps_link();
                self.form.location = Some(link.clone());
                LocationStatus::Updated(link)
            }
            Err(e) => {
                let message = e.user_message();
                warn!("Location unavailable: {}", message);
                LocationStatus::Unavailable(message)
            }
        }
    }

    /// Validate and persist the form.
    ///
    /// Order of side effects: photo upload (if attached), then exactly one
    /// insert. A failed upload aborts before the insert.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] without touching the gateway,
    /// [`Error::Upload`] if the photo upload fails, or the gateway's error if
    /// the insert fails.
    pub async fn submit(&mut self) -> Result<SubmitOutcome> {
        let mut entry = validate(&self.form)?;

        let mut photo_path = None;
        if let Some(photo) = &self.form.photo {
            let path = photo_object_path(&self.photo_prefix, &photo.file_name, Utc::now());
            if let Err(e) = self.gateway.upload(&path, photo).await {
                error!("Error during upload: {}", e);
                return Err(Error::upload(path, e));
            }
            entry.photo_url = self.gateway.public_url(&path);
            photo_path = Some(path);
        }

        if let Err(e) = self.gateway.insert(&entry).await {
            error!("Error during save: {}", e);
            return Err(e);
        }

        info!("Saved survey entry for {}", entry.establishment_name);
        self.form.reset();
        Ok(SubmitOutcome { entry, photo_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::YesNo;
    use crate::gateway::{GatewayCall, MemoryGateway, PhotoUpload};
    use crate::geo::{Coordinates, FixedLocator, UnavailableLocator};
    use chrono::TimeZone;

    fn locator() -> FixedLocator {
        FixedLocator::new(Coordinates::new(12.9716, 77.5946).unwrap())
    }

    fn fill(form: &mut SurveyForm) {
        form.establishment_name = Some("Hotel A".to_string());
        form.select_category("Hotel");
        form.in_house_laundry = YesNo::Yes;
    }

    #[test]
    fn test_photo_object_path() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            photo_object_path("establishments", "front.jpg", now),
            "establishments/1700000000123.jpg"
        );
        assert_eq!(
            photo_object_path("establishments/", "IMG.2024.PNG", now),
            "establishments/1700000000123.PNG"
        );
    }

    #[test]
    fn test_photo_object_path_without_extension() {
        let now = Utc.timestamp_millis_opt(5).unwrap();
        assert_eq!(
            photo_object_path("establishments", "photo", now),
            "establishments/5.photo"
        );
    }

    #[tokio::test]
    async fn test_refresh_location_sets_link() {
        let gateway = MemoryGateway::new();
        let mut controller = FormController::new(&gateway, locator());

        let status = controller.refresh_location().await;
        let link = "https://www.google.com/maps?q=12.9716,77.5946".to_string();
        assert_eq!(status, LocationStatus::Updated(link.clone()));
        assert_eq!(controller.form().location, Some(link));
    }

    #[tokio::test]
    async fn test_refresh_location_failure_blocks_submit() {
        let gateway = MemoryGateway::new();
        let mut controller =
            FormController::new(&gateway, UnavailableLocator::with_reason("denied"));
        fill(controller.form_mut());

        let status = controller.refresh_location().await;
        assert_eq!(status, LocationStatus::Unavailable("denied".to_string()));
        assert!(controller.form().location.is_none());

        let err = controller.submit().await.unwrap_err();
        assert!(err.is_validation());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_photo() {
        let gateway = MemoryGateway::new();
        let mut controller = FormController::new(&gateway, locator());
        controller.refresh_location().await;
        fill(controller.form_mut());

        let outcome = controller.submit().await.unwrap();
        assert_eq!(outcome.entry.photo_url, "");
        assert!(outcome.photo_path.is_none());
        assert_eq!(gateway.upload_count(), 0);
        assert_eq!(gateway.calls(), vec![GatewayCall::Insert("Hotel A".to_string())]);
        assert_eq!(gateway.rows()[0]["photo_url"], "");
    }

    #[tokio::test]
    async fn test_submit_with_photo_uploads_then_inserts() {
        let gateway = MemoryGateway::new();
        let mut controller = FormController::new(&gateway, locator());
        controller.refresh_location().await;
        fill(controller.form_mut());
        controller.form_mut().photo = Some(PhotoUpload::new("front.jpg", b"jpeg".to_vec()));

        let outcome = controller.submit().await.unwrap();
        let path = outcome.photo_path.unwrap();
        assert!(path.starts_with("establishments/"));
        assert!(path.ends_with(".jpg"));

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], GatewayCall::Upload(path.clone()));
        assert_eq!(calls[1], GatewayCall::Insert("Hotel A".to_string()));
        assert_eq!(outcome.entry.photo_url, gateway.public_url(&path));
        assert_eq!(gateway.object(&path), Some(b"jpeg".to_vec()));
    }

    #[tokio::test]
    async fn test_upload_failure_skips_insert_and_keeps_form() {
        let gateway = MemoryGateway::new();
        gateway.fail_uploads("bucket unavailable");
        let mut controller = FormController::new(&gateway, locator());
        controller.refresh_location().await;
        fill(controller.form_mut());
        controller.form_mut().photo = Some(PhotoUpload::new("front.jpg", vec![1]));
        let before = controller.form().clone();

        let err = controller.submit().await.unwrap_err();
        assert!(matches!(err, Error::Upload { .. }));
        assert_eq!(gateway.insert_count(), 0);
        assert!(gateway.rows().is_empty());
        assert_eq!(controller.form(), &before);
    }

    #[tokio::test]
    async fn test_insert_failure_keeps_form() {
        let gateway = MemoryGateway::new();
        gateway.fail_inserts("connection reset");
        let mut controller = FormController::new(&gateway, locator());
        controller.refresh_location().await;
        fill(controller.form_mut());
        let before = controller.form().clone();

        let err = controller.submit().await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(err.user_message(), crate::error::GENERIC_FAILURE_MESSAGE);
        assert_eq!(controller.form(), &before);
    }

    #[tokio::test]
    async fn test_success_resets_form() {
        let gateway = MemoryGateway::new();
        let mut controller = FormController::new(&gateway, locator());
        controller.refresh_location().await;
        fill(controller.form_mut());

        controller.submit().await.unwrap();
        assert_eq!(controller.form(), &SurveyForm::default());
    }

    #[tokio::test]
    async fn test_resubmission_creates_duplicate() {
        let gateway = MemoryGateway::new();
        let mut controller = FormController::new(&gateway, locator());

        for _ in 0..2 {
            controller.refresh_location().await;
            fill(controller.form_mut());
            controller.submit().await.unwrap();
        }
        assert_eq!(gateway.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_validation_failure_touches_nothing() {
        let gateway = MemoryGateway::new();
        let mut controller = FormController::new(&gateway, locator());
        controller.refresh_location().await;
        fill(controller.form_mut());
        controller.form_mut().lead = YesNo::Yes;
        controller.form_mut().photo = Some(PhotoUpload::new("front.jpg", vec![1]));

        let err = controller.submit().await.unwrap_err();
        assert!(err.is_validation());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_custom_photo_prefix() {
        let gateway = MemoryGateway::new();
        let mut controller =
            FormController::new(&gateway, locator()).with_photo_prefix("pilot");
        controller.refresh_location().await;
        fill(controller.form_mut());
        controller.form_mut().photo = Some(PhotoUpload::new("a.png", vec![1]));

        let outcome = controller.submit().await.unwrap();
        assert!(outcome.photo_path.unwrap().starts_with("pilot/"));
    }
}
