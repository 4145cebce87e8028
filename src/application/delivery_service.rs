use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::domain::access::{self, DeliveryActor, Principal};
use crate::domain::delivery::{
    ApplicationStatus, ClaimedTask, CourierApplication, CourierApplicationInput, DeliveryEvent,
    Offer, StatusChange, TaskScope, TaskStatus, TaskSummary, VehicleType, FULL_NAME_MAX_LEN,
    PHONE_MAX_LEN,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::DeliveryStore;

fn task_not_found() -> DomainError {
    DomainError::NotFound("Delivery task not found".to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims a mandatory text field and checks it fits its column.
fn required_text(field: &str, value: &str, max_len: usize) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::InvalidArgument(format!(
            "Field '{}' is required",
            field
        )));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::InvalidArgument(format!(
            "Field '{}' must be at most {} characters",
            field, max_len
        )));
    }
    Ok(value.to_string())
}

/// Offer pool, claim arbitration and task lifecycle on top of a [`DeliveryStore`].
#[derive(Clone)]
pub struct DeliveryService {
    store: Arc<dyn DeliveryStore>,
}

impl DeliveryService {
    pub fn new(store: Arc<dyn DeliveryStore>) -> Self {
        Self { store }
    }

    /// Admins see every task (optionally one courier's); couriers see only their own.
    pub fn list_tasks(
        &self,
        principal: &Principal,
        courier_filter: Option<Uuid>,
    ) -> Result<Vec<TaskSummary>, DomainError> {
        access::ensure_delivery_role(principal)?;
        self.store.atomic(|uow| {
            let scope = match access::delivery_actor(uow, principal)? {
                DeliveryActor::Admin => courier_filter.map_or(TaskScope::All, TaskScope::Courier),
                DeliveryActor::Courier(profile) => TaskScope::Courier(profile.id),
            };
            uow.list_tasks(scope)
        })
    }

    /// Tasks that are pending and unassigned, newest order first.
    pub fn list_offers(&self, principal: &Principal) -> Result<Vec<Offer>, DomainError> {
        access::ensure_delivery_role(principal)?;
        self.store.atomic(|uow| {
            let actor = access::delivery_actor(uow, principal)?;
            access::ensure_active(&actor)?;
            uow.list_offers()
        })
    }

    /// Claims an offer. Concurrent claims on the same task serialize on the
    /// task's row lock; the first wins and every later one gets `Conflict`.
    pub fn assign(
        &self,
        principal: &Principal,
        task_id: Uuid,
    ) -> Result<ClaimedTask, DomainError> {
        access::ensure_delivery_role(principal)?;
        let result = self.store.atomic(|uow| {
            let actor = access::claiming_actor(uow, principal)?;
            if let Some(courier_id) = actor.courier_id() {
                if uow.courier_has_active_task(courier_id)? {
                    return Err(DomainError::AlreadyHasActiveTask);
                }
            }

            let mut task = uow.lock_task(task_id)?.ok_or_else(task_not_found)?;
            if !task.is_claimable() {
                return Err(DomainError::Conflict(
                    "Delivery task is already taken".to_string(),
                ));
            }

            task.courier_id = actor.courier_id();
            task.status = TaskStatus::Assigned;
            task.assigned_at = Some(Utc::now());
            uow.save_task(&task)?;

            let order = uow
                .find_order(task.order_id)?
                .ok_or_else(|| DomainError::NotFound("Order not found".to_string()))?;

            uow.record_event(&DeliveryEvent {
                task_id: task.id,
                event_type: DeliveryEvent::TASK_ASSIGNED,
                payload: json!({
                    "task_id": task.id,
                    "order_id": task.order_id,
                    "courier_id": task.courier_id,
                    "status": task.status.as_str(),
                    "assigned_at": task.assigned_at,
                }),
            })?;

            Ok(ClaimedTask {
                id: task.id,
                status: task.status,
                order_id: task.order_id,
                courier_id: task.courier_id,
                delivery_address: order.delivery_address,
            })
        });

        match &result {
            Ok(claimed) => log::info!(
                "delivery task {} claimed by user {} (courier {:?})",
                claimed.id,
                principal.user_id,
                claimed.courier_id
            ),
            Err(DomainError::Conflict(_)) => log::warn!(
                "user {} lost the claim race for delivery task {}",
                principal.user_id,
                task_id
            ),
            Err(DomainError::AlreadyHasActiveTask) => log::info!(
                "user {} tried to claim task {} while holding an active task",
                principal.user_id,
                task_id
            ),
            Err(_) => {}
        }
        result
    }

    /// Sets a task's status and keeps the parent order in step: IN_PROGRESS
    /// puts the order ON_DELIVERY, DONE marks it DELIVERED.
    ///
    /// Any of the four statuses may be set from any other; only role and
    /// ownership are checked.
    pub fn change_status(
        &self,
        principal: &Principal,
        task_id: Uuid,
        new_status: &str,
    ) -> Result<StatusChange, DomainError> {
        access::ensure_delivery_role(principal)?;
        let status: TaskStatus = new_status.parse()?;

        let change = self.store.atomic(|uow| {
            let task = uow.find_task(task_id)?.ok_or_else(task_not_found)?;
            access::authorize_task_mutation(uow, principal, &task)?;

            let completed_at = match status {
                TaskStatus::Done => task.completed_at.or_else(|| Some(Utc::now())),
                _ => task.completed_at,
            };
            uow.update_task_status(task.id, status, completed_at)?;

            let order_status = status.synced_order_status();
            if let Some(order_status) = order_status {
                uow.set_order_status(task.order_id, order_status)?;
            }

            uow.record_event(&DeliveryEvent {
                task_id: task.id,
                event_type: DeliveryEvent::TASK_STATUS_CHANGED,
                payload: json!({
                    "task_id": task.id,
                    "order_id": task.order_id,
                    "courier_id": task.courier_id,
                    "previous_status": task.status.as_str(),
                    "status": status.as_str(),
                    "order_status": order_status.map(|s| s.as_str()),
                }),
            })?;

            Ok(StatusChange {
                id: task.id,
                status,
            })
        })?;

        log::info!(
            "delivery task {} moved to {} by user {}",
            change.id,
            change.status,
            principal.user_id
        );
        Ok(change)
    }

    /// Records a client's request to become a courier, pending admin review.
    pub fn apply_courier(
        &self,
        principal: &Principal,
        input: CourierApplicationInput,
    ) -> Result<CourierApplication, DomainError> {
        access::ensure_can_apply(principal)?;
        let full_name = required_text("full_name", &input.full_name, FULL_NAME_MAX_LEN)?;
        let phone = required_text("phone", &input.phone, PHONE_MAX_LEN)?;
        let vehicle_type: VehicleType = input.vehicle_type.trim().parse()?;

        let application = CourierApplication {
            id: Uuid::new_v4(),
            user_id: principal.user_id,
            full_name,
            phone,
            vehicle_type,
            comment: non_blank(input.comment),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        };

        let application = self.store.atomic(|uow| {
            if uow.find_pending_application(principal.user_id)?.is_some() {
                return Err(DomainError::Conflict(
                    "A courier application is already pending review".to_string(),
                ));
            }
            uow.insert_courier_application(&application)?;
            Ok(application)
        })?;

        log::info!(
            "courier application {} submitted by user {}",
            application.id,
            principal.user_id
        );
        Ok(application)
    }
}
