use utoipa::OpenApi;

use crate::api::handlers::bookings::{
    BookingDto, BookingListResponse, BookingResponse, CreateBookingResponse, CreatedBookingDto,
    ReceiptDto, ReceiptResponse,
};
use crate::domain::{BookingStatus, CreateBookingRequest, PaymentStatus};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Waypoint API",
        description = "Booking intake and payment reconciliation for the Waypoint services marketplace"
    ),
    paths(
        crate::api::handlers::bookings::create,
        crate::api::handlers::bookings::list,
        crate::api::handlers::bookings::get,
        crate::api::handlers::bookings::accept,
        crate::api::handlers::bookings::start,
        crate::api::handlers::bookings::complete,
        crate::api::handlers::bookings::cancel,
        crate::api::handlers::bookings::receipt,
    ),
    components(schemas(
        CreateBookingRequest,
        CreateBookingResponse,
        CreatedBookingDto,
        BookingResponse,
        BookingListResponse,
        BookingDto,
        ReceiptResponse,
        ReceiptDto,
        BookingStatus,
        PaymentStatus,
    )),
    tags((name = "bookings", description = "Booking lifecycle"))
)]
pub struct ApiDoc;
