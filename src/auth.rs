//! The identity collaborator authenticates upstream and forwards the caller
//! as `X-User-Id` / `X-User-Role` headers.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpRequest};
use uuid::Uuid;

use crate::domain::access::{Principal, Role};
use crate::domain::errors::DomainError;
use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, DomainError> {
    let user_id = header(headers, USER_ID_HEADER)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or(DomainError::Unauthenticated)?;
    let role = header(headers, USER_ROLE_HEADER)
        .and_then(|raw| raw.parse::<Role>().ok())
        .ok_or(DomainError::Unauthenticated)?;
    Ok(Principal::new(user_id, role))
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(principal_from_headers(req.headers()).map_err(AppError::from))
    }
}
