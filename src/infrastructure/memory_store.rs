//! In-process [`DeliveryStore`].
//!
//! Row locks are a table of held keys guarded by a mutex; waiters park on a
//! condvar until the holder's unit of work ends. Writes are staged per unit
//! of work and applied in one step on commit, so a failed unit of work leaves
//! nothing behind.

use std::collections::{HashMap, HashSet};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::delivery::{
    ApplicationStatus, CourierApplication, CourierProfile, DeliveryEvent, DeliveryTask, Offer,
    OrderRecord, OrderStatus, TaskScope, TaskStatus, TaskSummary,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::{DeliveryStore, UnitOfWork};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum LockKey {
    Courier(Uuid),
    Task(Uuid),
}

#[derive(Debug, Default)]
struct Tables {
    restaurants: HashMap<Uuid, String>,
    orders: HashMap<Uuid, OrderRecord>,
    couriers: HashMap<Uuid, CourierProfile>,
    tasks: HashMap<Uuid, DeliveryTask>,
    applications: Vec<CourierApplication>,
    events: Vec<DeliveryEvent>,
}

#[derive(Debug, Default)]
pub struct MemoryDeliveryStore {
    tables: Mutex<Tables>,
    row_locks: Mutex<HashSet<LockKey>>,
    lock_released: Condvar,
}

impl MemoryDeliveryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_restaurant(&self, id: Uuid, name: &str) {
        self.tables().restaurants.insert(id, name.to_string());
    }

    pub fn insert_order(&self, order: OrderRecord) {
        self.tables().orders.insert(order.id, order);
    }

    pub fn insert_courier(&self, profile: CourierProfile) {
        self.tables().couriers.insert(profile.id, profile);
    }

    pub fn insert_task(&self, task: DeliveryTask) {
        self.tables().tasks.insert(task.id, task);
    }

    pub fn task(&self, id: Uuid) -> Option<DeliveryTask> {
        self.tables().tasks.get(&id).cloned()
    }

    pub fn order(&self, id: Uuid) -> Option<OrderRecord> {
        self.tables().orders.get(&id).cloned()
    }

    pub fn applications(&self) -> Vec<CourierApplication> {
        self.tables().applications.clone()
    }

    pub fn events(&self) -> Vec<DeliveryEvent> {
        self.tables().events.clone()
    }
}

impl DeliveryStore for MemoryDeliveryStore {
    fn run_atomic(
        &self,
        work: &mut dyn FnMut(&mut dyn UnitOfWork) -> Result<(), DomainError>,
    ) -> Result<(), DomainError> {
        let mut uow = MemoryUnitOfWork::new(self);
        work(&mut uow)?;
        uow.commit();
        Ok(())
    }
}

/// Status columns written by `update_task_status`, applied over whatever row
/// is current at commit.
#[derive(Debug, Clone, Copy)]
struct StatusPatch {
    status: TaskStatus,
    completed_at: Option<DateTime<Utc>>,
}

impl StatusPatch {
    fn apply(&self, task: &mut DeliveryTask) {
        task.status = self.status;
        task.completed_at = self.completed_at;
    }
}

struct MemoryUnitOfWork<'s> {
    store: &'s MemoryDeliveryStore,
    held: Vec<LockKey>,
    tasks: HashMap<Uuid, DeliveryTask>,
    status_patches: HashMap<Uuid, StatusPatch>,
    order_statuses: HashMap<Uuid, OrderStatus>,
    applications: Vec<CourierApplication>,
    events: Vec<DeliveryEvent>,
}

impl<'s> MemoryUnitOfWork<'s> {
    fn new(store: &'s MemoryDeliveryStore) -> Self {
        Self {
            store,
            held: Vec::new(),
            tasks: HashMap::new(),
            status_patches: HashMap::new(),
            order_statuses: HashMap::new(),
            applications: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Blocks until `key` is free, then holds it until this unit of work ends.
    fn acquire(&mut self, key: LockKey) -> Result<(), DomainError> {
        if self.held.contains(&key) {
            return Ok(());
        }
        let mut locked = self
            .store
            .row_locks
            .lock()
            .map_err(|_| DomainError::Internal("row lock table poisoned".to_string()))?;
        while locked.contains(&key) {
            locked = self
                .store
                .lock_released
                .wait(locked)
                .map_err(|_| DomainError::Internal("row lock table poisoned".to_string()))?;
        }
        locked.insert(key);
        self.held.push(key);
        Ok(())
    }

    /// The row as this unit of work sees it: staged row or stored row, with
    /// any staged status patch on top.
    fn staged_view(&self, stored: Option<&DeliveryTask>, task_id: Uuid) -> Option<DeliveryTask> {
        let mut task = self.tasks.get(&task_id).or(stored).cloned()?;
        if let Some(patch) = self.status_patches.get(&task_id) {
            patch.apply(&mut task);
        }
        Some(task)
    }

    fn current_task(&self, task_id: Uuid) -> Option<DeliveryTask> {
        let tables = self.store.tables();
        self.staged_view(tables.tasks.get(&task_id), task_id)
    }

    fn current_tasks(&self, tables: &Tables) -> Vec<DeliveryTask> {
        tables
            .tasks
            .values()
            .filter_map(|task| self.staged_view(Some(task), task.id))
            .collect()
    }

    fn commit(mut self) {
        let mut tables = self.store.tables();
        for (id, task) in self.tasks.drain() {
            tables.tasks.insert(id, task);
        }
        // Patches touch only the status columns of the row current at commit.
        for (id, patch) in self.status_patches.drain() {
            if let Some(task) = tables.tasks.get_mut(&id) {
                patch.apply(task);
            }
        }
        for (id, status) in self.order_statuses.drain() {
            if let Some(order) = tables.orders.get_mut(&id) {
                order.status = status;
            }
        }
        tables.applications.append(&mut self.applications);
        tables.events.append(&mut self.events);
    }
}

impl Drop for MemoryUnitOfWork<'_> {
    fn drop(&mut self) {
        if self.held.is_empty() {
            return;
        }
        let mut locked = self
            .store
            .row_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for key in self.held.drain(..) {
            locked.remove(&key);
        }
        drop(locked);
        self.store.lock_released.notify_all();
    }
}

impl UnitOfWork for MemoryUnitOfWork<'_> {
    fn find_courier_by_user(
        &mut self,
        user_id: Uuid,
    ) -> Result<Option<CourierProfile>, DomainError> {
        Ok(self
            .store
            .tables()
            .couriers
            .values()
            .find(|profile| profile.user_id == user_id)
            .cloned())
    }

    fn lock_courier(&mut self, user_id: Uuid) -> Result<Option<CourierProfile>, DomainError> {
        let Some(profile) = self.find_courier_by_user(user_id)? else {
            return Ok(None);
        };
        self.acquire(LockKey::Courier(profile.id))?;
        // Re-read under the lock.
        Ok(self.store.tables().couriers.get(&profile.id).cloned())
    }

    fn courier_has_active_task(&mut self, courier_id: Uuid) -> Result<bool, DomainError> {
        let tables = self.store.tables();
        Ok(self
            .current_tasks(&tables)
            .iter()
            .any(|task| task.courier_id == Some(courier_id) && task.status.is_active()))
    }

    fn find_task(&mut self, task_id: Uuid) -> Result<Option<DeliveryTask>, DomainError> {
        Ok(self.current_task(task_id))
    }

    fn lock_task(&mut self, task_id: Uuid) -> Result<Option<DeliveryTask>, DomainError> {
        if self.current_task(task_id).is_none() {
            return Ok(None);
        }
        self.acquire(LockKey::Task(task_id))?;
        Ok(self.current_task(task_id))
    }

    fn save_task(&mut self, task: &DeliveryTask) -> Result<(), DomainError> {
        self.status_patches.remove(&task.id);
        self.tasks.insert(task.id, task.clone());
        Ok(())
    }

    fn update_task_status(
        &mut self,
        task_id: Uuid,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError> {
        if self.current_task(task_id).is_none() {
            return Err(DomainError::NotFound("Delivery task not found".to_string()));
        }
        self.status_patches.insert(
            task_id,
            StatusPatch {
                status,
                completed_at,
            },
        );
        Ok(())
    }

    fn find_order(&mut self, order_id: Uuid) -> Result<Option<OrderRecord>, DomainError> {
        let order = self.store.tables().orders.get(&order_id).cloned();
        Ok(order.map(|mut order| {
            if let Some(status) = self.order_statuses.get(&order_id) {
                order.status = *status;
            }
            order
        }))
    }

    fn set_order_status(
        &mut self,
        order_id: Uuid,
        status: OrderStatus,
    ) -> Result<(), DomainError> {
        if !self.store.tables().orders.contains_key(&order_id) {
            return Err(DomainError::NotFound("Order not found".to_string()));
        }
        self.order_statuses.insert(order_id, status);
        Ok(())
    }

    fn list_offers(&mut self) -> Result<Vec<Offer>, DomainError> {
        let tables = self.store.tables();
        let mut offers: Vec<Offer> = self
            .current_tasks(&tables)
            .into_iter()
            .filter(DeliveryTask::is_claimable)
            .filter_map(|task| {
                let order = tables.orders.get(&task.order_id)?;
                let restaurant_name = tables.restaurants.get(&order.restaurant_id)?;
                Some(Offer {
                    task_id: task.id,
                    task_status: task.status,
                    order_id: order.id,
                    restaurant_id: order.restaurant_id,
                    restaurant_name: restaurant_name.clone(),
                    client_id: order.client_id,
                    delivery_address: order.delivery_address.clone(),
                    order_total_price: order.total_price.clone(),
                    order_created_at: order.created_at,
                })
            })
            .collect();
        offers.sort_by(|a, b| {
            b.order_created_at
                .cmp(&a.order_created_at)
                .then(a.task_id.cmp(&b.task_id))
        });
        Ok(offers)
    }

    fn list_tasks(&mut self, scope: TaskScope) -> Result<Vec<TaskSummary>, DomainError> {
        let tables = self.store.tables();
        let mut summaries: Vec<TaskSummary> = self
            .current_tasks(&tables)
            .into_iter()
            .filter(|task| match scope {
                TaskScope::All => true,
                TaskScope::Courier(courier_id) => task.courier_id == Some(courier_id),
            })
            .filter_map(|task| {
                let order = tables.orders.get(&task.order_id)?;
                Some(TaskSummary {
                    client_id: order.client_id,
                    restaurant_id: order.restaurant_id,
                    delivery_address: order.delivery_address.clone(),
                    task,
                })
            })
            .collect();
        // Same order as `ORDER BY status, assigned_at DESC` in PostgreSQL,
        // where NULLs sort first under DESC.
        summaries.sort_by(|a, b| {
            a.task
                .status
                .as_str()
                .cmp(b.task.status.as_str())
                .then_with(|| match (a.task.assigned_at, b.task.assigned_at) {
                    (None, None) => std::cmp::Ordering::Equal,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (Some(x), Some(y)) => y.cmp(&x),
                })
                .then(a.task.id.cmp(&b.task.id))
        });
        Ok(summaries)
    }

    fn find_pending_application(
        &mut self,
        user_id: Uuid,
    ) -> Result<Option<CourierApplication>, DomainError> {
        let is_open = |application: &&CourierApplication| {
            application.user_id == user_id && application.status == ApplicationStatus::Pending
        };
        if let Some(staged) = self.applications.iter().find(is_open) {
            return Ok(Some(staged.clone()));
        }
        Ok(self
            .store
            .tables()
            .applications
            .iter()
            .find(is_open)
            .cloned())
    }

    fn insert_courier_application(
        &mut self,
        application: &CourierApplication,
    ) -> Result<(), DomainError> {
        self.applications.push(application.clone());
        Ok(())
    }

    fn record_event(&mut self, event: &DeliveryEvent) -> Result<(), DomainError> {
        self.events.push(event.clone());
        Ok(())
    }
}
