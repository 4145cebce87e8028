use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::delivery_service::DeliveryService;
use crate::domain::access::Principal;
use crate::domain::delivery::{
    ClaimedTask, CourierApplication, CourierApplicationInput, Offer, StatusChange, TaskSummary,
};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksParams {
    /// Restrict the listing to one courier profile (admins only).
    pub courier_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskSummaryResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub status: String,
    pub courier_id: Option<Uuid>,
    pub client_id: Uuid,
    pub restaurant_id: Uuid,
    pub delivery_address: String,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<TaskSummary> for TaskSummaryResponse {
    fn from(summary: TaskSummary) -> Self {
        Self {
            id: summary.task.id,
            order_id: summary.task.order_id,
            status: summary.task.status.as_str().to_string(),
            courier_id: summary.task.courier_id,
            client_id: summary.client_id,
            restaurant_id: summary.restaurant_id,
            delivery_address: summary.delivery_address,
            assigned_at: summary.task.assigned_at,
            completed_at: summary.task.completed_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OfferResponse {
    /// Delivery task id; claim it via `/delivery/offers/{id}/assign/`.
    pub id: Uuid,
    pub order_id: Uuid,
    /// Always PENDING for an open offer.
    pub status: String,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub client_id: Uuid,
    pub delivery_address: String,
    /// Decimal as a string to keep exact cents, e.g. "24.50"
    pub order_total_price: String,
    pub order_created_at: String,
}

impl From<Offer> for OfferResponse {
    fn from(offer: Offer) -> Self {
        Self {
            id: offer.task_id,
            order_id: offer.order_id,
            status: offer.task_status.as_str().to_string(),
            restaurant_id: offer.restaurant_id,
            restaurant_name: offer.restaurant_name,
            client_id: offer.client_id,
            delivery_address: offer.delivery_address,
            order_total_price: offer.order_total_price.with_scale(2).to_string(),
            order_created_at: offer.order_created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AssignResponse {
    pub id: Uuid,
    pub status: String,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub delivery_address: String,
}

impl From<ClaimedTask> for AssignResponse {
    fn from(task: ClaimedTask) -> Self {
        Self {
            id: task.id,
            status: task.status.as_str().to_string(),
            order_id: task.order_id,
            courier_id: task.courier_id,
            delivery_address: task.delivery_address,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    /// One of PENDING, ASSIGNED, IN_PROGRESS, DONE
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub id: Uuid,
    pub status: String,
}

impl From<StatusChange> for StatusResponse {
    fn from(change: StatusChange) -> Self {
        Self {
            id: change.id,
            status: change.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CourierApplicationRequest {
    pub full_name: String,
    /// At most 32 characters
    pub phone: String,
    /// One of FOOT, BIKE, CAR
    pub vehicle_type: String,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CourierApplicationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl From<CourierApplication> for CourierApplicationResponse {
    fn from(application: CourierApplication) -> Self {
        Self {
            id: application.id,
            user_id: application.user_id,
            full_name: application.full_name,
            phone: application.phone,
            vehicle_type: application.vehicle_type.as_str().to_string(),
            comment: application.comment,
            status: application.status.as_str().to_string(),
            created_at: application.created_at.to_rfc3339(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /delivery/tasks/
///
/// Couriers get their own tasks, admins get every task (optionally filtered
/// by `courier_id`).
#[utoipa::path(
    get,
    path = "/delivery/tasks/",
    params(ListTasksParams),
    responses(
        (status = 200, description = "Delivery tasks", body = [TaskSummaryResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Role may not access delivery tasks"),
        (status = 404, description = "Courier profile not found"),
    ),
    tag = "delivery"
)]
pub async fn list_tasks(
    service: web::Data<DeliveryService>,
    principal: Principal,
    query: web::Query<ListTasksParams>,
) -> Result<HttpResponse, AppError> {
    let courier_filter = query.into_inner().courier_id;

    let tasks = web::block(move || service.list_tasks(&principal, courier_filter))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<TaskSummaryResponse> = tasks.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /delivery/offers/
///
/// Pending, unassigned tasks, newest order first.
#[utoipa::path(
    get,
    path = "/delivery/offers/",
    responses(
        (status = 200, description = "Claimable offers", body = [OfferResponse]),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Wrong role or inactive courier"),
        (status = 404, description = "Courier profile not found"),
    ),
    tag = "delivery"
)]
pub async fn list_offers(
    service: web::Data<DeliveryService>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let offers = web::block(move || service.list_offers(&principal))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OfferResponse> = offers.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /delivery/offers/{id}/assign/
///
/// Claims an offer. Exactly one of several simultaneous claims succeeds; the
/// rest get 400 and may re-list offers.
#[utoipa::path(
    post,
    path = "/delivery/offers/{id}/assign/",
    params(
        ("id" = Uuid, Path, description = "Delivery task UUID"),
    ),
    responses(
        (status = 200, description = "Task claimed", body = AssignResponse),
        (status = 400, description = "Task already taken or courier already busy"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Wrong role or inactive courier"),
        (status = 404, description = "Task or courier profile not found"),
    ),
    tag = "delivery"
)]
pub async fn assign_offer(
    service: web::Data<DeliveryService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let task_id = path.into_inner();

    let claimed = web::block(move || service.assign(&principal, task_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(AssignResponse::from(claimed)))
}

/// PATCH /delivery/tasks/{id}/status/
///
/// Moving a task to IN_PROGRESS or DONE also moves its order to ON_DELIVERY
/// or DELIVERED, in the same transaction.
#[utoipa::path(
    patch,
    path = "/delivery/tasks/{id}/status/",
    params(
        ("id" = Uuid, Path, description = "Delivery task UUID"),
    ),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = StatusResponse),
        (status = 400, description = "Invalid status"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Not the task's courier"),
        (status = 404, description = "Task not found"),
    ),
    tag = "delivery"
)]
pub async fn change_task_status(
    service: web::Data<DeliveryService>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<ChangeStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let task_id = path.into_inner();
    let new_status = body.into_inner().status;

    let change = web::block(move || service.change_status(&principal, task_id, &new_status))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(StatusResponse::from(change)))
}

/// POST /delivery/courier/apply/
#[utoipa::path(
    post,
    path = "/delivery/courier/apply/",
    request_body = CourierApplicationRequest,
    responses(
        (status = 201, description = "Application submitted", body = CourierApplicationResponse),
        (status = 400, description = "Missing name or phone, invalid vehicle type, or application already pending"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Only clients can apply"),
    ),
    tag = "delivery"
)]
pub async fn apply_courier(
    service: web::Data<DeliveryService>,
    principal: Principal,
    body: web::Json<CourierApplicationRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let input = CourierApplicationInput {
        full_name: body.full_name,
        phone: body.phone,
        vehicle_type: body.vehicle_type,
        comment: body.comment,
    };

    let application = web::block(move || service.apply_courier(&principal, input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CourierApplicationResponse::from(application)))
}

/// Mounts the delivery routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid JSON: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid path parameter: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid query parameter: {}", err)).into()
    }))
    .service(
        web::scope("/delivery")
            .route("/tasks/", web::get().to(list_tasks))
            .route("/tasks/{id}/status/", web::patch().to(change_task_status))
            .route("/offers/", web::get().to(list_offers))
            .route("/offers/{id}/assign/", web::post().to(assign_offer))
            .route("/courier/apply/", web::post().to(apply_courier)),
    );
}
