//! Flight and booking backend
//!
//! [`MockFlightBackend`] generates offers from the injected clock and keeps
//! bookings in memory. Nothing here touches a database.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, NaiveTime};
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::clock::{Clock, IdSource, RandomIds, SystemClock};

const AIRLINE: &str = "AirlineNexus";
const AIRCRAFT: &str = "Boeing 737-800";
const CURRENCY: &str = "USD";
const DEMO_REFERENCES: [&str; 2] = ["ABC123", "XYZ789"];

/// Business condition failures reported back as `{success: false, error}`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// Unknown flight number
    #[error("Flight {0} not found")]
    FlightNotFound(String),

    /// Unknown booking reference
    #[error("Booking {0} not found")]
    BookingNotFound(String),
}

/// Seat class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CabinClass {
    /// Business, 2.5x the economy fare
    Business,
    /// First, 4x the economy fare
    First,
    /// Economy; unrecognised class names are priced as economy
    #[default]
    #[serde(other)]
    Economy,
}

impl CabinClass {
    fn fare_multiplier(self) -> f64 {
        match self {
            Self::Economy => 1.0,
            Self::Business => 2.5,
            Self::First => 4.0,
        }
    }
}

fn default_passengers() -> u32 {
    1
}

/// Flight search criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchCriteria {
    /// Airport code (e.g., 'JFK', 'LAX')
    #[serde(default)]
    pub departure_airport: Option<String>,
    /// Airport code (e.g., 'JFK', 'LAX')
    #[serde(default)]
    pub arrival_airport: Option<String>,
    /// Date in YYYY-MM-DD format
    #[serde(default)]
    pub departure_date: Option<String>,
    /// Number of passengers
    #[serde(default = "default_passengers")]
    pub passengers: u32,
    /// 'economy', 'business', or 'first'
    #[serde(default)]
    pub class_preference: CabinClass,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            departure_airport: None,
            arrival_airport: None,
            departure_date: None,
            passengers: default_passengers(),
            class_preference: CabinClass::Economy,
        }
    }
}

/// A bookable flight returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub flight_number: String,
    pub airline: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub duration: String,
    pub aircraft: String,
    /// Total for all passengers
    pub price: u64,
    pub currency: String,
    pub available_seats: u32,
    pub class: CabinClass,
    pub stops: u32,
    pub status: String,
}

/// Search results plus the criteria that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightSearch {
    pub flights: Vec<FlightOffer>,
    pub total_results: usize,
    pub search_criteria: SearchCriteria,
}

/// Full details of one flight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightDetails {
    pub flight_number: String,
    pub airline: String,
    pub departure_airport: String,
    pub departure_city: String,
    pub arrival_airport: String,
    pub arrival_city: String,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub duration: String,
    pub aircraft: String,
    pub terminal_departure: String,
    pub terminal_arrival: String,
    pub gate_departure: String,
    pub gate_arrival: String,
    pub status: String,
    pub price: u64,
    pub currency: String,
    pub available_seats: u32,
    pub class_options: Vec<CabinClass>,
    pub amenities: Vec<String>,
}

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// Input for [`FlightBackend::create_booking`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewBooking {
    /// Flight number to book
    pub flight_number: String,
    /// Primary passenger name
    pub passenger_name: String,
    /// Passenger email
    pub passenger_email: String,
    /// Contact phone number
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Any special requests
    #[serde(default)]
    pub special_requests: Option<String>,
}

/// A passenger booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub booking_reference: String,
    pub flight_number: String,
    pub passenger_name: String,
    pub passenger_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub booking_date: NaiveDateTime,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_date: Option<NaiveDateTime>,
    pub total_price: u64,
    pub flight_details: FlightDetails,
}

/// Booking plus the confirmation line shown to the passenger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub booking: Booking,
    pub message: String,
}

/// The five flight operations exposed to the flight responder
#[async_trait]
pub trait FlightBackend: Send + Sync {
    /// Search for available flights based on criteria
    async fn search_flights(&self, criteria: SearchCriteria) -> Result<FlightSearch, BackendError>;

    /// Get detailed information about a specific flight
    async fn get_flight_details(&self, flight_number: &str) -> Result<FlightDetails, BackendError>;

    /// Create a flight booking
    async fn create_booking(&self, request: NewBooking) -> Result<BookingConfirmation, BackendError>;

    /// Get booking status and details
    async fn get_booking_status(&self, booking_reference: &str) -> Result<Booking, BackendError>;

    /// Cancel a booking
    async fn cancel_booking(&self, booking_reference: &str)
        -> Result<BookingConfirmation, BackendError>;
}

/// Generated flights with in-memory bookings
pub struct MockFlightBackend {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    bookings: DashMap<String, Booking>,
}

impl Default for MockFlightBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFlightBackend {
    /// Backend on the system clock with random references
    pub fn new() -> Self {
        Self::with_sources(Arc::new(SystemClock), Arc::new(RandomIds))
    }

    /// Backend on injected time and id sources
    pub fn with_sources(clock: Arc<dyn Clock>, ids: Arc<dyn IdSource>) -> Self {
        Self {
            clock,
            ids,
            bookings: DashMap::new(),
        }
    }

    /// Number of bookings created or modified in this process
    pub fn stored_bookings(&self) -> usize {
        self.bookings.len()
    }

    fn offers(&self, criteria: &SearchCriteria) -> Vec<FlightOffer> {
        let tomorrow = (self.clock.now() + Duration::days(1)).date();
        let departure_airport = criteria
            .departure_airport
            .clone()
            .unwrap_or_else(|| "JFK".to_string());
        let arrival_airport = criteria
            .arrival_airport
            .clone()
            .unwrap_or_else(|| "LAX".to_string());

        (3u32..5)
            .map(|i| {
                let departure_time = tomorrow
                    .and_time(NaiveTime::from_hms_opt(6 + i * 2, 0, 0).unwrap_or(NaiveTime::MIN));
                let arrival_time = departure_time + Duration::minutes(180 + 30 * i64::from(i));
                let base_price =
                    f64::from(200 + i * 50) * criteria.class_preference.fare_multiplier();

                FlightOffer {
                    flight_number: format!("AN{}", 100 + i),
                    airline: AIRLINE.to_string(),
                    departure_airport: departure_airport.clone(),
                    arrival_airport: arrival_airport.clone(),
                    departure_time,
                    arrival_time,
                    duration: "5h 30m".to_string(),
                    aircraft: AIRCRAFT.to_string(),
                    price: (base_price * f64::from(criteria.passengers)) as u64,
                    currency: CURRENCY.to_string(),
                    available_seats: 45 - i * 5,
                    class: criteria.class_preference,
                    stops: if i < 3 { 0 } else { 1 },
                    status: "available".to_string(),
                }
            })
            .collect()
    }

    fn details(&self, flight_number: &str) -> FlightDetails {
        let departure_time = self.clock.now() + Duration::days(1) + Duration::hours(8);
        FlightDetails {
            flight_number: flight_number.to_string(),
            airline: AIRLINE.to_string(),
            departure_airport: "JFK".to_string(),
            departure_city: "New York".to_string(),
            arrival_airport: "LAX".to_string(),
            arrival_city: "Los Angeles".to_string(),
            departure_time,
            arrival_time: departure_time + Duration::minutes(5 * 60 + 30),
            duration: "5h 30m".to_string(),
            aircraft: AIRCRAFT.to_string(),
            terminal_departure: "4".to_string(),
            terminal_arrival: "2".to_string(),
            gate_departure: "A12".to_string(),
            gate_arrival: "B8".to_string(),
            status: "on_time".to_string(),
            price: 299,
            currency: CURRENCY.to_string(),
            available_seats: 42,
            class_options: vec![CabinClass::Economy, CabinClass::Business, CabinClass::First],
            amenities: ["WiFi", "In-flight Entertainment", "Meals", "Power Outlets"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    fn demo_booking(&self, booking_reference: &str) -> Booking {
        Booking {
            booking_reference: booking_reference.to_string(),
            flight_number: "AN101".to_string(),
            passenger_name: "John Doe".to_string(),
            passenger_email: "john.doe@email.com".to_string(),
            phone_number: None,
            special_requests: None,
            booking_date: self.clock.now(),
            status: BookingStatus::Confirmed,
            cancellation_date: None,
            total_price: 299,
            flight_details: self.details("AN101"),
        }
    }

    fn retrieve(&self, booking_reference: &str) -> Option<Booking> {
        if let Some(stored) = self.bookings.get(booking_reference) {
            return Some(stored.clone());
        }
        DEMO_REFERENCES
            .contains(&booking_reference)
            .then(|| self.demo_booking(booking_reference))
    }

    fn store(&self, booking: Booking) {
        info!("Stored booking: {}", booking.booking_reference);
        self.bookings
            .insert(booking.booking_reference.clone(), booking);
    }
}

#[async_trait]
impl FlightBackend for MockFlightBackend {
    async fn search_flights(&self, criteria: SearchCriteria) -> Result<FlightSearch, BackendError> {
        let flights = self.offers(&criteria);
        Ok(FlightSearch {
            total_results: flights.len(),
            flights,
            search_criteria: criteria,
        })
    }

    async fn get_flight_details(&self, flight_number: &str) -> Result<FlightDetails, BackendError> {
        if flight_number.trim().is_empty() {
            return Err(BackendError::FlightNotFound(flight_number.to_string()));
        }
        Ok(self.details(flight_number))
    }

    async fn create_booking(&self, request: NewBooking) -> Result<BookingConfirmation, BackendError> {
        let booking_reference = self.ids.booking_reference();
        let flight_details = self.get_flight_details(&request.flight_number).await?;

        let booking = Booking {
            booking_reference: booking_reference.clone(),
            flight_number: request.flight_number,
            passenger_name: request.passenger_name,
            passenger_email: request.passenger_email,
            phone_number: request.phone_number,
            special_requests: request.special_requests,
            booking_date: self.clock.now(),
            status: BookingStatus::Confirmed,
            cancellation_date: None,
            total_price: flight_details.price,
            flight_details,
        };
        self.store(booking.clone());

        Ok(BookingConfirmation {
            booking,
            message: format!("Booking confirmed! Reference: {}", booking_reference),
        })
    }

    async fn get_booking_status(&self, booking_reference: &str) -> Result<Booking, BackendError> {
        self.retrieve(booking_reference)
            .ok_or_else(|| BackendError::BookingNotFound(booking_reference.to_string()))
    }

    async fn cancel_booking(
        &self,
        booking_reference: &str,
    ) -> Result<BookingConfirmation, BackendError> {
        let mut booking = self.get_booking_status(booking_reference).await?;
        booking.status = BookingStatus::Cancelled;
        booking.cancellation_date = Some(self.clock.now());
        self.store(booking.clone());

        Ok(BookingConfirmation {
            booking,
            message: format!("Booking {} has been cancelled", booking_reference),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::clock::{FixedClock, SequenceIds};
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid date")
    }

    fn backend() -> MockFlightBackend {
        MockFlightBackend::with_sources(Arc::new(FixedClock(noon())), Arc::new(SequenceIds::default()))
    }

    #[tokio::test]
    async fn test_search_defaults() {
        let search = backend()
            .search_flights(SearchCriteria::default())
            .await
            .expect("search succeeds");

        assert_eq!(search.total_results, 2);
        let first = &search.flights[0];
        assert_eq!(first.flight_number, "AN103");
        assert_eq!(first.departure_airport, "JFK");
        assert_eq!(first.arrival_airport, "LAX");
        assert_eq!(first.departure_time.to_string(), "2025-03-15 12:00:00");
        assert_eq!(first.arrival_time.to_string(), "2025-03-15 16:30:00");
        assert_eq!(first.price, 350);
        assert_eq!(first.available_seats, 30);
        assert_eq!(first.stops, 1);

        let second = &search.flights[1];
        assert_eq!(second.flight_number, "AN104");
        assert_eq!(second.arrival_time.to_string(), "2025-03-15 19:00:00");
        assert_eq!(second.price, 400);
    }

    #[tokio::test]
    async fn test_business_fare_scales_with_passengers() {
        let criteria = SearchCriteria {
            departure_airport: Some("SFO".into()),
            passengers: 2,
            class_preference: CabinClass::Business,
            ..SearchCriteria::default()
        };
        let search = backend().search_flights(criteria).await.expect("search succeeds");

        assert_eq!(search.flights[0].departure_airport, "SFO");
        assert_eq!(search.flights[0].price, 1750);
        assert_eq!(search.search_criteria.passengers, 2);
    }

    #[tokio::test]
    async fn test_booking_lifecycle() {
        let backend = backend();
        let confirmation = backend
            .create_booking(NewBooking {
                flight_number: "AN103".into(),
                passenger_name: "Ada Lovelace".into(),
                passenger_email: "ada@example.com".into(),
                phone_number: None,
                special_requests: Some("window seat".into()),
            })
            .await
            .expect("booking succeeds");

        assert_eq!(confirmation.message, "Booking confirmed! Reference: 000001");
        assert_eq!(confirmation.booking.total_price, 299);

        let status = backend
            .get_booking_status("000001")
            .await
            .expect("booking is remembered");
        assert_eq!(status.passenger_name, "Ada Lovelace");

        let cancelled = backend.cancel_booking("000001").await.expect("cancel succeeds");
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.booking.cancellation_date, Some(noon()));
        assert_eq!(cancelled.message, "Booking 000001 has been cancelled");
    }

    #[tokio::test]
    async fn test_demo_and_unknown_references() {
        let backend = backend();
        let demo = backend.get_booking_status("XYZ789").await.expect("demo booking");
        assert_eq!(demo.flight_number, "AN101");
        assert_eq!(demo.passenger_name, "John Doe");

        let err = backend.get_booking_status("NOPE42").await.unwrap_err();
        assert_eq!(err.to_string(), "Booking NOPE42 not found");
        assert_eq!(backend.stored_bookings(), 0);
    }
}
