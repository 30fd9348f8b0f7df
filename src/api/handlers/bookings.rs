use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Booking, BookingStatus, CreateBookingRequest, PaymentStatus},
    error::Result,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub provider_id: Uuid,
    pub listing_id: Uuid,
    pub scheduled_at: String,
    pub pickup_address: Option<String>,
    pub dropoff_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub distance_miles: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub special_instructions: Option<String>,
    pub total_price: f64,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingDto {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            consumer_id: booking.consumer_id,
            provider_id: booking.provider_id,
            listing_id: booking.listing_id,
            scheduled_at: booking.scheduled_at.to_rfc3339(),
            pickup_address: booking.pickup_address,
            dropoff_address: booking.dropoff_address,
            pickup_lat: booking.pickup_lat,
            pickup_lng: booking.pickup_lng,
            dropoff_lat: booking.dropoff_lat,
            dropoff_lng: booking.dropoff_lng,
            distance_miles: booking.distance_miles,
            duration_minutes: booking.duration_minutes,
            special_instructions: booking.special_instructions,
            total_price: booking.total_price,
            payment_status: booking.payment_status,
            status: booking.status,
            created_at: booking.created_at.to_rfc3339(),
            updated_at: booking.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBookingDto {
    pub id: Uuid,
    pub client_secret: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateBookingResponse {
    pub data: CreatedBookingDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub data: BookingDto,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingListResponse {
    pub data: Vec<BookingDto>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptDto {
    pub receipt_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptResponse {
    pub data: ReceiptDto,
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created with a payment authorization", body = CreateBookingResponse),
        (status = 400, description = "Validation failure or invalid schedule"),
        (status = 401, description = "Missing or invalid session token"),
        (status = 404, description = "Listing not found"),
    ),
    tag = "bookings"
)]
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>)> {
    let created = state
        .services
        .booking_service
        .create_booking(&user.profile, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            data: CreatedBookingDto { id: created.id, client_secret: created.client_secret },
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    responses(
        (status = 200, description = "Bookings where the caller is a party", body = BookingListResponse),
        (status = 401, description = "Missing or invalid session token"),
    ),
    tag = "bookings"
)]
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<BookingListResponse>> {
    let bookings = state.services.booking_service.list_bookings(&user.profile).await?;
    Ok(Json(BookingListResponse { data: bookings.into_iter().map(Into::into).collect() }))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking detail", body = BookingResponse),
        (status = 404, description = "Booking not found or caller is not a party"),
    ),
    tag = "bookings"
)]
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    let booking = state.services.booking_service.get_booking(&user.profile, id).await?;
    Ok(Json(BookingResponse { data: booking.into() }))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/accept",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking accepted", body = BookingResponse),
        (status = 400, description = "Transition not allowed from the current status"),
        (status = 404, description = "Booking not found or caller is not a party"),
    ),
    tag = "bookings"
)]
pub async fn accept(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    let booking = state.services.booking_service.accept(&user.profile, id).await?;
    Ok(Json(BookingResponse { data: booking.into() }))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/start",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Work started", body = BookingResponse),
        (status = 400, description = "Transition not allowed from the current status"),
        (status = 404, description = "Booking not found or caller is not a party"),
    ),
    tag = "bookings"
)]
pub async fn start(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    let booking = state.services.booking_service.start(&user.profile, id).await?;
    Ok(Json(BookingResponse { data: booking.into() }))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/complete",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking completed", body = BookingResponse),
        (status = 400, description = "Transition not allowed from the current status"),
        (status = 404, description = "Booking not found or caller is not a party"),
    ),
    tag = "bookings"
)]
pub async fn complete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    let booking = state.services.booking_service.complete(&user.profile, id).await?;
    Ok(Json(BookingResponse { data: booking.into() }))
}

#[utoipa::path(
    post,
    path = "/api/bookings/{id}/cancel",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 400, description = "Transition not allowed from the current status"),
        (status = 404, description = "Booking not found or caller is not a party"),
    ),
    tag = "bookings"
)]
pub async fn cancel(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>> {
    let booking = state.services.booking_service.cancel(&user.profile, id).await?;
    Ok(Json(BookingResponse { data: booking.into() }))
}

#[utoipa::path(
    get,
    path = "/api/bookings/{id}/receipt",
    params(("id" = Uuid, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Processor receipt for a paid booking", body = ReceiptResponse),
        (status = 404, description = "Booking not found, not a party, or no receipt yet"),
    ),
    tag = "bookings"
)]
pub async fn receipt(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReceiptResponse>> {
    let url = state.services.booking_service.receipt_url(&user.profile, id).await?;
    Ok(Json(ReceiptResponse { data: ReceiptDto { receipt_url: url } }))
}
