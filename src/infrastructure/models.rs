use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::delivery::{CourierApplication, CourierProfile, DeliveryTask, OrderRecord};
use crate::domain::errors::DomainError;
use crate::schema::{
    courier_applications, courier_profiles, delivery_outbox, delivery_tasks, orders, restaurants,
    users,
};

/// Parses an enum column, treating unknown values as a corrupt row.
fn stored<T: FromStr<Err = DomainError>>(column: &str, raw: &str) -> Result<T, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::Internal(format!("unexpected {} value '{}'", column, raw)))
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurantRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: String,
    pub total_price: BigDecimal,
    pub delivery_address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for OrderRecord {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(OrderRecord {
            id: row.id,
            client_id: row.client_id,
            restaurant_id: row.restaurant_id,
            status: stored("orders.status", &row.status)?,
            total_price: row.total_price,
            delivery_address: row.delivery_address,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub client_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: String,
    pub total_price: BigDecimal,
    pub delivery_address: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = courier_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourierProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_type: String,
    pub is_active: bool,
}

impl TryFrom<CourierProfileRow> for CourierProfile {
    type Error = DomainError;

    fn try_from(row: CourierProfileRow) -> Result<Self, Self::Error> {
        Ok(CourierProfile {
            id: row.id,
            user_id: row.user_id,
            vehicle_type: stored("courier_profiles.vehicle_type", &row.vehicle_type)?,
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = delivery_tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DeliveryTaskRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub status: String,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<DeliveryTaskRow> for DeliveryTask {
    type Error = DomainError;

    fn try_from(row: DeliveryTaskRow) -> Result<Self, Self::Error> {
        Ok(DeliveryTask {
            id: row.id,
            order_id: row.order_id,
            courier_id: row.courier_id,
            status: stored("delivery_tasks.status", &row.status)?,
            assigned_at: row.assigned_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = courier_applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourierApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub comment: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&CourierApplication> for CourierApplicationRow {
    fn from(application: &CourierApplication) -> Self {
        CourierApplicationRow {
            id: application.id,
            user_id: application.user_id,
            full_name: application.full_name.clone(),
            phone: application.phone.clone(),
            vehicle_type: application.vehicle_type.as_str().to_string(),
            comment: application.comment.clone(),
            status: application.status.as_str().to_string(),
            created_at: application.created_at,
        }
    }
}

impl TryFrom<CourierApplicationRow> for CourierApplication {
    type Error = DomainError;

    fn try_from(row: CourierApplicationRow) -> Result<Self, Self::Error> {
        Ok(CourierApplication {
            id: row.id,
            user_id: row.user_id,
            full_name: row.full_name,
            phone: row.phone,
            vehicle_type: stored("courier_applications.vehicle_type", &row.vehicle_type)?,
            comment: row.comment,
            status: stored("courier_applications.status", &row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = delivery_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = delivery_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
