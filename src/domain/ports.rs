use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::delivery::{
    CourierApplication, CourierProfile, DeliveryEvent, DeliveryTask, Offer, OrderRecord,
    OrderStatus, TaskScope, TaskStatus, TaskSummary,
};
use super::errors::DomainError;

/// Operations available inside one atomic unit of work.
///
/// Row locks taken through `lock_*` are held until the unit of work ends.
/// Writes become visible to other units of work only if the closure passed
/// to [`DeliveryStore::run_atomic`] returns `Ok`.
pub trait UnitOfWork {
    fn find_courier_by_user(&mut self, user_id: Uuid)
        -> Result<Option<CourierProfile>, DomainError>;

    /// Like `find_courier_by_user` but locks the profile row.
    fn lock_courier(&mut self, user_id: Uuid) -> Result<Option<CourierProfile>, DomainError>;

    fn courier_has_active_task(&mut self, courier_id: Uuid) -> Result<bool, DomainError>;

    fn find_task(&mut self, task_id: Uuid) -> Result<Option<DeliveryTask>, DomainError>;

    /// Exclusive lock on the single task row; no other task rows are locked.
    fn lock_task(&mut self, task_id: Uuid) -> Result<Option<DeliveryTask>, DomainError>;

    fn save_task(&mut self, task: &DeliveryTask) -> Result<(), DomainError>;

    /// Writes only the status columns so a concurrent claim is never overwritten.
    fn update_task_status(
        &mut self,
        task_id: Uuid,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError>;

    fn find_order(&mut self, order_id: Uuid) -> Result<Option<OrderRecord>, DomainError>;

    fn set_order_status(&mut self, order_id: Uuid, status: OrderStatus)
        -> Result<(), DomainError>;

    /// Pending, unassigned tasks, newest order first.
    fn list_offers(&mut self) -> Result<Vec<Offer>, DomainError>;

    fn list_tasks(&mut self, scope: TaskScope) -> Result<Vec<TaskSummary>, DomainError>;

    fn find_pending_application(
        &mut self,
        user_id: Uuid,
    ) -> Result<Option<CourierApplication>, DomainError>;

    fn insert_courier_application(
        &mut self,
        application: &CourierApplication,
    ) -> Result<(), DomainError>;

    fn record_event(&mut self, event: &DeliveryEvent) -> Result<(), DomainError>;
}

pub trait DeliveryStore: Send + Sync + 'static {
    /// Run `work` inside a single transaction. Any error rolls everything back.
    fn run_atomic(
        &self,
        work: &mut dyn FnMut(&mut dyn UnitOfWork) -> Result<(), DomainError>,
    ) -> Result<(), DomainError>;
}

impl dyn DeliveryStore {
    /// Typed wrapper over [`DeliveryStore::run_atomic`].
    pub fn atomic<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn UnitOfWork) -> Result<T, DomainError>,
    {
        let mut f = Some(f);
        let mut out = None;
        self.run_atomic(&mut |uow: &mut dyn UnitOfWork| {
            let f = f
                .take()
                .ok_or_else(|| DomainError::Internal("unit of work re-entered".to_string()))?;
            out = Some(f(uow)?);
            Ok(())
        })?;
        out.ok_or_else(|| DomainError::Internal("unit of work produced no result".to_string()))
    }
}
