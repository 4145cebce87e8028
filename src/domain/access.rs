//! Role checks for delivery operations.
//!
//! Admins bypass every ownership check. Couriers are scoped to their own
//! profile and the tasks assigned to it. Clients and restaurants have no
//! access to delivery tasks.

use std::str::FromStr;

use uuid::Uuid;

use super::delivery::{CourierProfile, DeliveryTask};
use super::errors::DomainError;
use super::ports::UnitOfWork;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Restaurant,
    Courier,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "CLIENT",
            Role::Restaurant => "RESTAURANT",
            Role::Courier => "COURIER",
            Role::Admin => "ADMIN",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(Role::Client),
            "RESTAURANT" => Ok(Role::Restaurant),
            "COURIER" => Ok(Role::Courier),
            "ADMIN" => Ok(Role::Admin),
            other => Err(DomainError::InvalidArgument(format!("Unknown role '{}'", other))),
        }
    }
}

/// An authenticated caller, as vouched for by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryActor {
    Admin,
    Courier(CourierProfile),
}

impl DeliveryActor {
    pub fn courier_id(&self) -> Option<Uuid> {
        match self {
            DeliveryActor::Admin => None,
            DeliveryActor::Courier(profile) => Some(profile.id),
        }
    }
}

fn delivery_forbidden() -> DomainError {
    DomainError::Forbidden("Only couriers and admins can access delivery tasks".to_string())
}

fn profile_not_found() -> DomainError {
    DomainError::NotFound("Courier profile not found".to_string())
}

/// Rejects roles that never touch delivery tasks, before any store access.
pub fn ensure_delivery_role(principal: &Principal) -> Result<(), DomainError> {
    match principal.role {
        Role::Admin | Role::Courier => Ok(()),
        Role::Client | Role::Restaurant => Err(delivery_forbidden()),
    }
}

/// Resolves the caller to an actor. Couriers must have a profile; it may be inactive.
pub fn delivery_actor(
    uow: &mut dyn UnitOfWork,
    principal: &Principal,
) -> Result<DeliveryActor, DomainError> {
    match principal.role {
        Role::Admin => Ok(DeliveryActor::Admin),
        Role::Courier => uow
            .find_courier_by_user(principal.user_id)?
            .map(DeliveryActor::Courier)
            .ok_or_else(profile_not_found),
        Role::Client | Role::Restaurant => Err(delivery_forbidden()),
    }
}

/// Resolves the caller for a claim: the courier profile row is locked for the
/// rest of the unit of work and must be active.
pub fn claiming_actor(
    uow: &mut dyn UnitOfWork,
    principal: &Principal,
) -> Result<DeliveryActor, DomainError> {
    let actor = match principal.role {
        Role::Admin => DeliveryActor::Admin,
        Role::Courier => uow
            .lock_courier(principal.user_id)?
            .map(DeliveryActor::Courier)
            .ok_or_else(profile_not_found)?,
        Role::Client | Role::Restaurant => return Err(delivery_forbidden()),
    };
    ensure_active(&actor)?;
    Ok(actor)
}

pub fn ensure_active(actor: &DeliveryActor) -> Result<(), DomainError> {
    match actor {
        DeliveryActor::Courier(profile) if !profile.is_active => Err(DomainError::Forbidden(
            "Courier profile is inactive".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Admins may change any task; a courier only the tasks assigned to its profile.
pub fn authorize_task_mutation(
    uow: &mut dyn UnitOfWork,
    principal: &Principal,
    task: &DeliveryTask,
) -> Result<(), DomainError> {
    let owns = match principal.role {
        Role::Admin => true,
        Role::Courier => match uow.find_courier_by_user(principal.user_id)? {
            Some(profile) => task.courier_id == Some(profile.id),
            None => false,
        },
        Role::Client | Role::Restaurant => false,
    };
    if owns {
        Ok(())
    } else {
        Err(DomainError::Forbidden(
            "You are not allowed to change this delivery task".to_string(),
        ))
    }
}

/// Only clients may ask to become couriers.
pub fn ensure_can_apply(principal: &Principal) -> Result<(), DomainError> {
    match principal.role {
        Role::Client => Ok(()),
        Role::Courier => Err(DomainError::Forbidden("User is already a courier".to_string())),
        Role::Restaurant | Role::Admin => Err(DomainError::Forbidden(
            "Only clients can apply to become couriers".to_string(),
        )),
    }
}
