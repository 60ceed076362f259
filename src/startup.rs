use crate::configuration::Settings;
use crate::connectors::{ChatCompletion, HttpObjectStorage, LlmClient, ObjectStorage};
use crate::helpers::JsonResponse;
use crate::middleware;
use crate::realtime::{self, RealtimeHub};
use crate::routes;
use actix_cors::Cors;
use actix_web::{dev::Server, error, web, App, HttpServer};
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;

pub async fn run(
    listener: TcpListener,
    pg_pool: Pool<Postgres>,
    settings: Settings,
) -> Result<Server, std::io::Error> {
    let hub = Arc::new(RealtimeHub::new(settings.realtime.channel_capacity));
    let hub = web::Data::new(hub);

    let storage: Arc<dyn ObjectStorage> = Arc::new(HttpObjectStorage::from_settings(&settings.storage));
    let storage = web::Data::new(storage);

    let llm: Arc<dyn ChatCompletion> = Arc::new(LlmClient::new(&settings.chat));
    let llm = web::Data::new(llm);

    let settings = web::Data::new(settings);
    let pg_pool = web::Data::new(pg_pool);

    let oauth_http_client = reqwest::Client::builder()
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    let oauth_http_client = web::Data::new(oauth_http_client);

    let oauth_cache = web::Data::new(middleware::authentication::OAuthCache::new(
        Duration::from_secs(60),
    ));

    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        let msg = match &err {
            error::JsonPayloadError::Deserialize(err) => format!(
                "Invalid JSON at line {}, column {}: {}",
                err.line(),
                err.column(),
                err
            ),
            other => other.to_string(),
        };
        JsonResponse::bad_request(msg)
    });
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| JsonResponse::bad_request(err.to_string()));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(middleware::authentication::Manager::new())
            .wrap(Cors::permissive())
            .app_data(oauth_http_client.clone())
            .app_data(oauth_cache.clone())
            .service(web::scope("/health_check").service(routes::health_check))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/tickets")
                            .service(routes::ticket::tags)
                            .service(routes::ticket::avatars)
                            .service(routes::ticket::admins)
                            .service(routes::ticket::predefined_responses)
                            .service(routes::ticket::status)
                            .service(routes::ticket::assign)
                            .service(routes::ticket::priority)
                            .service(routes::ticket::mark_read)
                            .service(routes::ticket::signed_url)
                            .service(routes::ticket::delete_response)
                            .service(routes::ticket::update_note)
                            .service(routes::ticket::delete_note)
                            .service(routes::ticket::toggle_pin)
                            .service(routes::ticket::list)
                            .service(routes::ticket::add)
                            .service(routes::ticket::item)
                            .service(routes::ticket::add_response)
                            .service(routes::ticket::add_tag)
                            .service(routes::ticket::remove_tag)
                            .service(routes::ticket::list_notes)
                            .service(routes::ticket::add_note),
                    )
                    .service(web::scope("/me").service(routes::user::me))
                    .service(web::scope("/realtime").service(realtime::realtime_websocket))
                    .service(web::scope("/chat").service(routes::chat::completion))
                    .service(
                        web::scope("/meetings")
                            .service(routes::meeting::list)
                            .service(routes::meeting::add)
                            .service(routes::meeting::update)
                            .service(routes::meeting::delete),
                    )
                    .service(
                        web::scope("/study-plan")
                            .service(routes::study_plan::preference)
                            .service(routes::study_plan::dates)
                            .service(routes::study_plan::item),
                    ),
            )
            .app_data(json_config.clone())
            .app_data(query_config.clone())
            .app_data(pg_pool.clone())
            .app_data(hub.clone())
            .app_data(storage.clone())
            .app_data(llm.clone())
            .app_data(settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
