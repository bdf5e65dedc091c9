//! User location profile and authentication claims

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{error::AppError, geofence::GeoPoint};

/// Read-only projection of an employee consumed by the attendance core.
///
/// Owned by user management; this service never writes it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct UserLocationProfile {
    pub id: Uuid,
    pub employee_id: String,
    pub name: String,
    pub office_lat: f64,
    pub office_long: f64,
    /// Allowed check-in radius around the office anchor, in meters
    pub allowed_radius: f64,
    pub is_active: bool,
}

impl UserLocationProfile {
    pub fn office_anchor(&self) -> GeoPoint {
        GeoPoint::new(self.office_lat, self.office_long)
    }

    /// Profile radius, or `fallback` when the profile carries none
    pub fn radius_or(&self, fallback: f64) -> f64 {
        if self.allowed_radius > 0.0 {
            self.allowed_radius
        } else {
            fallback
        }
    }
}

/// JWT claims issued by the external authentication service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id
    pub sub: String,
    /// "employee", "hr" or "admin"
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn user_id(&self) -> Result<Uuid, AppError> {
        self.sub
            .parse()
            .map_err(|_| AppError::Authentication("Token subject is not a user id".to_string()))
    }

    /// Admin and HR accounts may see everyone's attendance
    pub fn is_staff(&self) -> bool {
        matches!(self.role.as_str(), "admin" | "hr")
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin or HR access required".to_string()))
        }
    }
}
