use actix_web::{get, web, HttpResponse};
use sqlx::PgPool;

#[get("")]
pub async fn health_check(pg_pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pg_pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().finish(),
        Err(err) => {
            tracing::error!("Health check failed to reach the database: {:?}", err);
            HttpResponse::ServiceUnavailable().finish()
        }
    }
}
