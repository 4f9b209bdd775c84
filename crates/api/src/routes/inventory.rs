//! Inventory supply, reservation and availability endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::{ItemId, RecordId, ReservationToken, Version};
use domain::{ReservationRecord, StockRecord};
use reservation_engine::{
    ApplySupply, AvailabilityCache, CancelReservation, ReservationEngine, ReserveItem,
    ReserveOutcome,
};
use serde::{Deserialize, Serialize};
use stock_store::LookupStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: LookupStore, C: AvailabilityCache> {
    pub engine: ReservationEngine<S, C>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct SupplyRequest {
    pub item_id: i64,
    pub name: String,
    pub quantity: u32,
    pub version: Option<i64>,
}

#[derive(Deserialize)]
pub struct ReserveParams {
    pub item_id: i64,
    pub quantity: u32,
    pub reserved_by: String,
}

#[derive(Deserialize)]
pub struct CancelParams {
    pub token: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct SupplyResponse {
    pub item_id: ItemId,
    pub name: String,
    pub total_quantity: u32,
    pub available_quantity: u32,
    pub version: Version,
    pub message: String,
}

#[derive(Serialize)]
pub struct ReserveResponse {
    pub token: ReservationToken,
    pub available_quantity: u32,
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct StockResponse {
    pub id: RecordId,
    pub item_id: ItemId,
    pub name: String,
    pub total_quantity: u32,
    pub reserved_quantity: u32,
    pub available_quantity: u32,
    pub version: Version,
}

impl From<StockRecord> for StockResponse {
    fn from(stock: StockRecord) -> Self {
        Self {
            id: stock.id(),
            item_id: stock.item_id(),
            name: stock.name().to_string(),
            total_quantity: stock.total_quantity(),
            reserved_quantity: stock.reserved_quantity(),
            available_quantity: stock.available_quantity(),
            version: stock.version(),
        }
    }
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub token: ReservationToken,
    pub item_id: ItemId,
    pub quantity: u32,
    pub status: String,
    pub reserved_by: String,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<ReservationRecord> for ReservationResponse {
    fn from(reservation: ReservationRecord) -> Self {
        Self {
            token: reservation.token().clone(),
            item_id: reservation.item_id(),
            quantity: reservation.quantity(),
            status: reservation.status().to_string(),
            reserved_by: reservation.reserved_by().to_string(),
            created_at: reservation.created_at(),
            cancelled_at: reservation.cancelled_at(),
        }
    }
}

// -- Handlers --

/// POST /inventory: register arriving stock, creating the item if new.
#[tracing::instrument(skip(state, req), fields(item_id = req.item_id))]
pub async fn supply<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Json(req): Json<SupplyRequest>,
) -> Result<Json<SupplyResponse>, ApiError>
where
    S: LookupStore + 'static,
    C: AvailabilityCache + 'static,
{
    let mut cmd = ApplySupply::new(ItemId::new(req.item_id), req.name, req.quantity);
    if let Some(version) = req.version {
        cmd = cmd.expecting(Version::new(version));
    }

    let receipt = state.engine.apply_supply(cmd).await?;

    Ok(Json(SupplyResponse {
        message: format!(
            "Supply updated for item ID {}, available quantity: {}",
            receipt.item_id, receipt.total_quantity
        ),
        item_id: receipt.item_id,
        name: receipt.name,
        total_quantity: receipt.total_quantity,
        available_quantity: receipt.available_quantity,
        version: receipt.version,
    }))
}

/// POST /inventory/reserve: claim units of an item.
#[tracing::instrument(skip(state, params), fields(item_id = params.item_id, quantity = params.quantity))]
pub async fn reserve<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Query(params): Query<ReserveParams>,
) -> Result<Json<ReserveResponse>, ApiError>
where
    S: LookupStore + 'static,
    C: AvailabilityCache + 'static,
{
    let cmd = ReserveItem::new(
        ItemId::new(params.item_id),
        params.quantity,
        params.reserved_by,
    );

    match state.engine.reserve(cmd).await? {
        ReserveOutcome::Reserved { token, available } => Ok(Json(ReserveResponse {
            token,
            available_quantity: available,
        })),
        ReserveOutcome::InsufficientStock { .. } => Err(ApiError::insufficient_inventory()),
    }
}

/// POST /inventory/cancel: release a reservation.
#[tracing::instrument(skip(state, params))]
pub async fn cancel<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Query(params): Query<CancelParams>,
) -> Result<Json<CancelResponse>, ApiError>
where
    S: LookupStore + 'static,
    C: AvailabilityCache + 'static,
{
    let outcome = state
        .engine
        .cancel(CancelReservation::new(params.token))
        .await?;

    Ok(Json(CancelResponse {
        status: outcome.message(),
    }))
}

/// GET /inventory/:item_id/availability: units that can still be reserved.
#[tracing::instrument(skip(state))]
pub async fn availability<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(item_id): Path<i64>,
) -> Result<Json<u32>, ApiError>
where
    S: LookupStore + 'static,
    C: AvailabilityCache + 'static,
{
    let available = state.engine.get_availability(ItemId::new(item_id)).await?;
    Ok(Json(available))
}

/// GET /inventory/:item_id: full stock record of an item.
#[tracing::instrument(skip(state))]
pub async fn get<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(item_id): Path<i64>,
) -> Result<Json<StockResponse>, ApiError>
where
    S: LookupStore + 'static,
    C: AvailabilityCache + 'static,
{
    let stock = state.engine.get_stock(ItemId::new(item_id)).await?;
    Ok(Json(stock.into()))
}

/// GET /reservations/:token: a single reservation.
#[tracing::instrument(skip(state))]
pub async fn reservation<S, C>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(token): Path<String>,
) -> Result<Json<ReservationResponse>, ApiError>
where
    S: LookupStore + 'static,
    C: AvailabilityCache + 'static,
{
    let reservation = state
        .engine
        .get_reservation(&ReservationToken::new(token))
        .await?;
    Ok(Json(reservation.into()))
}
