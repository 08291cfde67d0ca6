//! Geolocation for the survey form.
//!
//! The form never lets the surveyor type a location; it asks a
//! [`Geolocator`] for the current position and turns it into a map link.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Base of the generated map links.
const MAPS_BASE_URL: &str = "https://www.google.com/maps";

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude, -90 to 90.
    pub latitude: f64,
    /// Longitude, -180 to 180.
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting values outside the valid ranges.
    ///
    /// # Errors
    ///
    /// Returns a geolocation error if either value is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::geolocation(format!(
                "latitude {latitude} is out of range"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::geolocation(format!(
                "longitude {longitude} is out of range"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The map link for these coordinates.
    #[must_use]
    pub fn maps_link(&self) -> String {
        maps_link(self.latitude, self.longitude)
    }
}

/// Build a map link from a latitude and longitude.
#[must_use]
pub fn maps_link(latitude: f64, longitude: f64) -> String {
    format!("{MAPS_BASE_URL}?q={latitude},{longitude}")
}

/// A source of the device's current position.
///
/// Only one position request is outstanding at a time; callers await each
/// request before issuing the next.
#[async_trait::async_trait]
pub trait Geolocator: Send + Sync {
    /// Resolve the current position.
    ///
    /// # Errors
    ///
    /// Returns a geolocation error if the position cannot be determined.
    async fn current_position(&self) -> Result<Coordinates>;
}

/// A locator that always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator {
    coordinates: Coordinates,
}

impl FixedLocator {
    /// Create a locator for the given coordinates.
    #[must_use]
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait::async_trait]
impl Geolocator for FixedLocator {
    async fn current_position(&self) -> Result<Coordinates> {
        Ok(self.coordinates)
    }
}

/// A locator for devices without a position source.
#[derive(Debug, Clone, Default)]
pub struct UnavailableLocator {
    reason: Option<String>,
}

impl UnavailableLocator {
    /// Create a locator that fails with the given reason.
    #[must_use]
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

#[async_trait::async_trait]
impl Geolocator for UnavailableLocator {
    async fn current_position(&self) -> Result<Coordinates> {
        Err(Error::geolocation(self.reason.clone().unwrap_or_else(|| {
            "Geolocation is not supported on this device.".to_string()
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maps_link_format() {
        assert_eq!(
            maps_link(12.9716, 77.5946),
            "https://www.google.com/maps?q=12.9716,77.5946"
        );
    }

    #[test]
    fn test_maps_link_whole_numbers() {
        assert_eq!(maps_link(1.0, 2.0), "https://www.google.com/maps?q=1,2");
    }

    #[test]
    fn test_maps_link_negative() {
        assert_eq!(
            maps_link(-33.5, -70.25),
            "https://www.google.com/maps?q=-33.5,-70.25"
        );
    }

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(90.1, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[tokio::test]
    async fn test_fixed_locator() {
        let coords = Coordinates::new(28.6139, 77.209).unwrap();
        let locator = FixedLocator::new(coords);
        assert_eq!(locator.current_position().await.unwrap(), coords);
    }

    #[tokio::test]
    async fn test_unavailable_locator() {
        let err = UnavailableLocator::default()
            .current_position()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Geolocation { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_locator_reason() {
        let err = UnavailableLocator::with_reason("User denied Geolocation")
            .current_position()
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "User denied Geolocation");
    }
}
