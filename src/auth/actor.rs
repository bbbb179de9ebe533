use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::EngineError;
use crate::model::employee::{Employee, Role};

/// The authenticated caller, as the engine sees it. Extracted from the
/// bearer token on every protected route.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub employee_id: u64,
    pub organization_id: u64,
    pub role: Role,
}

impl Actor {
    pub fn require_admin(&self) -> Result<(), EngineError> {
        if self.role == Role::SuperAdmin {
            Ok(())
        } else {
            Err(EngineError::forbidden("super admin only"))
        }
    }

    pub fn require_manager_or_admin(&self) -> Result<(), EngineError> {
        if matches!(self.role, Role::SuperAdmin | Role::ReportingManager) {
            Ok(())
        } else {
            Err(EngineError::forbidden("reporting manager or super admin only"))
        }
    }

    /// Reviewer authority over `target`: the assigned reporting manager, or a
    /// super admin of the same organization.
    pub fn may_review(&self, target: &Employee) -> bool {
        if self.organization_id != target.organization_id {
            return false;
        }
        self.role == Role::SuperAdmin || target.reporting_manager == Some(self.employee_id)
    }
}

impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid or expired token"))),
        };

        ready(Ok(Actor {
            employee_id: claims.sub,
            organization_id: claims.organization_id,
            role: claims.role,
        }))
    }
}
