use actix_web::{get, web, HttpResponse, Responder, Scope};
use chrono::{DateTime, Utc};
use expense_repo::HealthCheck;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// When the process started serving, registered as app data for the uptime fields
#[derive(Clone, Copy, Debug)]
pub struct StartTime(Instant);

impl StartTime {
    pub fn now() -> StartTime {
        StartTime(Instant::now())
    }

    pub fn uptime_seconds(&self) -> f64 {
        self.0.elapsed().as_secs_f64()
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime: f64,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct ReadinessStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database: String,
}

pub fn health_service() -> Scope {
    web::scope("/health")
        .service(health)
        .service(ready)
        .service(live)
}

#[get("")]
async fn health(start_time: web::Data<StartTime>) -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "ok".to_owned(),
        timestamp: Utc::now(),
        uptime: start_time.uptime_seconds(),
    })
}

#[get("/ready")]
async fn ready(health_check: web::Data<Arc<dyn HealthCheck>>) -> impl Responder {
    if health_check.check().await {
        HttpResponse::Ok().json(ReadinessStatus {
            status: "ready".to_owned(),
            timestamp: Utc::now(),
            database: "connected".to_owned(),
        })
    } else {
        warn!("Readiness check failed");
        HttpResponse::ServiceUnavailable().json(ReadinessStatus {
            status: "not_ready".to_owned(),
            timestamp: Utc::now(),
            database: "disconnected".to_owned(),
        })
    }
}

#[get("/live")]
async fn live(start_time: web::Data<StartTime>) -> impl Responder {
    HttpResponse::Ok().json(HealthStatus {
        status: "alive".to_owned(),
        timestamp: Utc::now(),
        uptime: start_time.uptime_seconds(),
    })
}
