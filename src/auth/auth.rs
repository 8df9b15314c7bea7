use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::auth::policy::{Capability, authorize};
use crate::{error::AppError, model::role::Role};

/// The authenticated caller, attached to the request by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Missing token".into())),
        )
    }
}

impl AuthUser {
    /// Checks `capability` against a resource owned by `owner_id`.
    pub fn authorize(&self, capability: Capability, owner_id: Option<u64>) -> Result<(), AppError> {
        authorize(self.role, self.user_id, owner_id, capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        self.authorize(capability, None)
    }
}
