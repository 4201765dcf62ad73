//! Backends the responders call through tools: flights, bookings and tickets

pub mod clock;
pub mod flight;
pub mod flight_tools;
pub mod tickets;

pub use clock::{Clock, FixedClock, IdSource, RandomIds, SequenceIds, SystemClock};
pub use flight::{
    BackendError, Booking, BookingConfirmation, BookingStatus, CabinClass, FlightBackend,
    FlightDetails, FlightOffer, FlightSearch, MockFlightBackend, NewBooking, SearchCriteria,
};
pub use flight_tools::flight_toolset;
pub use tickets::{format_ticket_response, ticket_toolset, Priority, SupportTicket, TicketDesk};
