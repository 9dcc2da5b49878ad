use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    GlobalAdmin,
    HospitalAdmin,
    DepartmentHead,
    Staff,
    Patient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub role: ActorRole,
    pub hospital_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub exp: usize, // expiration time
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(token) = req
            .headers()
            .get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
        else {
            return ready(Err(AppError::Unauthorized));
        };

        let Some(config) = req.app_data::<Data<Config>>() else {
            log::error!("Config missing from app data, cannot verify bearer token");
            return ready(Err(AppError::Unauthorized));
        };

        ready(verify_token(token, config).map_err(|err| {
            log::debug!("Rejected bearer token: {}", err);
            AppError::Unauthorized
        }))
    }
}

/// The caller of an operation, as established by the authorization layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub role: ActorRole,
    pub hospital_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    /// Set when the actor is themselves a staff member.
    pub staff_id: Option<Uuid>,
    /// Set when the actor is a patient.
    pub patient_id: Option<Uuid>,
}

impl ActorContext {
    pub fn global_admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: ActorRole::GlobalAdmin,
            hospital_id: None,
            department_id: None,
            staff_id: None,
            patient_id: None,
        }
    }
}

impl From<Claims> for ActorContext {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            hospital_id: claims.hospital_id,
            department_id: claims.department_id,
            staff_id: claims.staff_id,
            patient_id: claims.patient_id,
        }
    }
}

impl FromRequest for ActorContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        ready(Claims::from_request(req, payload).into_inner().map(Into::into))
    }
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

/// Signs a bearer token for `actor`, valid for the configured number of days.
pub fn issue_token(actor: &ActorContext, config: &Config) -> Result<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::days(config.jwt_expiration_days))
        .ok_or_else(|| anyhow!("Token expiration overflows"))?
        .timestamp() as usize;

    let claims = Claims {
        sub: actor.user_id,
        role: actor.role,
        hospital_id: actor.hospital_id,
        department_id: actor.department_id,
        staff_id: actor.staff_id,
        patient_id: actor.patient_id,
        exp: expiration,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )?;

    Ok(token)
}
