use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Lifecycle of a delivery task. `Pending` is set when the order is placed,
/// `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::Assigned,
        TaskStatus::InProgress,
        TaskStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }

    /// A courier may hold at most one task in an active status.
    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Assigned | TaskStatus::InProgress)
    }

    /// The order status forced by moving a task into this status, if any.
    pub fn synced_order_status(self) -> Option<OrderStatus> {
        match self {
            TaskStatus::InProgress => Some(OrderStatus::OnDelivery),
            TaskStatus::Done => Some(OrderStatus::Delivered),
            TaskStatus::Pending | TaskStatus::Assigned => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = TaskStatus::ALL.iter().map(|s| s.as_str()).collect();
                DomainError::InvalidArgument(format!(
                    "Invalid status '{}'. Allowed: {:?}",
                    s, allowed
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    New,
    Cooking,
    Ready,
    OnDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::New,
        OrderStatus::Cooking,
        OrderStatus::Ready,
        OrderStatus::OnDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Cooking => "COOKING",
            OrderStatus::Ready => "READY",
            OrderStatus::OnDelivery => "ON_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::InvalidArgument(format!("Unknown order status '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Foot,
    Bike,
    Car,
}

impl VehicleType {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleType::Foot => "FOOT",
            VehicleType::Bike => "BIKE",
            VehicleType::Car => "CAR",
        }
    }
}

impl FromStr for VehicleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOOT" => Ok(VehicleType::Foot),
            "BIKE" => Ok(VehicleType::Bike),
            "CAR" => Ok(VehicleType::Car),
            other => Err(DomainError::InvalidArgument(format!(
                "Invalid vehicle_type '{}'. Allowed: [\"FOOT\", \"BIKE\", \"CAR\"]",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "APPROVED" => Ok(ApplicationStatus::Approved),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            other => Err(DomainError::InvalidArgument(format!(
                "Unknown application status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourierProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vehicle_type: VehicleType,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryTask {
    pub id: Uuid,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub status: TaskStatus,
    pub assigned_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeliveryTask {
    /// An offer is a task nobody has claimed yet.
    pub fn is_claimable(&self) -> bool {
        self.status == TaskStatus::Pending && self.courier_id.is_none()
    }
}

/// The slice of an order the delivery core reads.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub total_price: BigDecimal,
    pub delivery_address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub task_id: Uuid,
    pub task_status: TaskStatus,
    pub order_id: Uuid,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub client_id: Uuid,
    pub delivery_address: String,
    pub order_total_price: BigDecimal,
    pub order_created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub task: DeliveryTask,
    pub client_id: Uuid,
    pub restaurant_id: Uuid,
    pub delivery_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    All,
    Courier(Uuid),
}

/// Result of a successful claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedTask {
    pub id: Uuid,
    pub status: TaskStatus,
    pub order_id: Uuid,
    pub courier_id: Option<Uuid>,
    pub delivery_address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub id: Uuid,
    pub status: TaskStatus,
}

/// Column widths of `courier_applications`, in characters.
pub const FULL_NAME_MAX_LEN: usize = 255;
pub const PHONE_MAX_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct CourierApplicationInput {
    pub full_name: String,
    pub phone: String,
    pub vehicle_type: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourierApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    pub comment: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// An integration event written to the outbox in the same transaction as the
/// change it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryEvent {
    pub task_id: Uuid,
    pub event_type: &'static str,
    pub payload: serde_json::Value,
}

impl DeliveryEvent {
    pub const AGGREGATE_TYPE: &'static str = "DeliveryTask";
    pub const TASK_ASSIGNED: &'static str = "DeliveryTaskAssigned";
    pub const TASK_STATUS_CHANGED: &'static str = "DeliveryTaskStatusChanged";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_parses_every_wire_value() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_task_status_is_invalid_argument() {
        let err = "CANCELLED".parse::<TaskStatus>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert!(err.to_string().contains("IN_PROGRESS"));
    }

    #[test]
    fn task_status_parsing_is_case_sensitive() {
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn only_in_progress_and_done_sync_the_order() {
        assert_eq!(
            TaskStatus::InProgress.synced_order_status(),
            Some(OrderStatus::OnDelivery)
        );
        assert_eq!(
            TaskStatus::Done.synced_order_status(),
            Some(OrderStatus::Delivered)
        );
        assert_eq!(TaskStatus::Pending.synced_order_status(), None);
        assert_eq!(TaskStatus::Assigned.synced_order_status(), None);
    }

    #[test]
    fn active_statuses() {
        assert!(!TaskStatus::Pending.is_active());
        assert!(TaskStatus::Assigned.is_active());
        assert!(TaskStatus::InProgress.is_active());
        assert!(!TaskStatus::Done.is_active());
    }

    #[test]
    fn claimable_requires_pending_and_no_courier() {
        let mut task = DeliveryTask {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            courier_id: None,
            status: TaskStatus::Pending,
            assigned_at: None,
            completed_at: None,
        };
        assert!(task.is_claimable());

        task.courier_id = Some(Uuid::new_v4());
        assert!(!task.is_claimable());

        task.courier_id = None;
        task.status = TaskStatus::Assigned;
        assert!(!task.is_claimable());
    }

    #[test]
    fn vehicle_type_rejects_unknown_value() {
        assert_eq!("BIKE".parse::<VehicleType>().unwrap(), VehicleType::Bike);
        assert!(matches!(
            "BOAT".parse::<VehicleType>(),
            Err(DomainError::InvalidArgument(_))
        ));
    }
}
