#![allow(dead_code)]

use actix_web::dev::Server;
use actix_web::{get, web, App, HttpRequest, HttpResponse, HttpServer};
use helpdesk::configuration::{get_configuration, DatabaseSettings, Settings};
use helpdesk::forms;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use std::net::TcpListener;
use uuid::Uuid;

pub const ORGANIZATION_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0001);
pub const ADMIN_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_00a1);
pub const CUSTOMER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_00c1);
pub const OTHER_CUSTOMER_ID: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_00c2);

pub const ADMIN_TOKEN: &str = "admin-token";
pub const CUSTOMER_TOKEN: &str = "customer-token";
pub const OTHER_CUSTOMER_TOKEN: &str = "other-customer-token";

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub settings: Settings,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

pub async fn spawn_app_with_configuration(mut configuration: Settings) -> Option<TestApp> {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);
    configuration.database.database_name = Uuid::new_v4().to_string();

    let connection_pool = match configure_database(&configuration.database).await {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("Skipping tests: failed to connect to postgres: {}", err);
            return None;
        }
    };

    let server = helpdesk::startup::run(listener, connection_pool.clone(), configuration.clone())
        .await
        .expect("Failed to bind address.");
    let _ = tokio::spawn(server);

    Some(TestApp {
        address,
        db_pool: connection_pool,
        settings: configuration,
    })
}

/// Server on a random port with a mock auth service answering for the test tokens.
pub async fn spawn_app() -> Option<TestApp> {
    let configuration = get_configuration().expect("Failed to get configuration");
    spawn_app_with(configuration).await
}

pub async fn spawn_app_with(mut configuration: Settings) -> Option<TestApp> {
    let listener =
        TcpListener::bind("127.0.0.1:0").expect("Failed to bind port for testing auth server");
    configuration.auth_url = format!(
        "http://127.0.0.1:{}/me",
        listener.local_addr().unwrap().port()
    );

    let auth_server = mock_auth_server(listener).expect("Failed to bind auth server");
    let _ = tokio::spawn(auth_server);
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    spawn_app_with_configuration(configuration).await
}

pub async fn configure_database(config: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    let mut connection = PgConnection::connect(&config.connection_string_without_db()).await?;
    connection
        .execute(format!(r#"CREATE DATABASE "{}""#, config.database_name).as_str())
        .await?;

    let connection_pool = PgPool::connect(&config.connection_string()).await?;
    sqlx::migrate!("./migrations").run(&connection_pool).await?;
    Ok(connection_pool)
}

fn user_for(token: &str) -> Option<forms::user::User> {
    let (id, role, email) = match token {
        ADMIN_TOKEN => (ADMIN_ID, "admin", "agent@example.com"),
        CUSTOMER_TOKEN => (CUSTOMER_ID, "user", "customer@example.com"),
        OTHER_CUSTOMER_TOKEN => (OTHER_CUSTOMER_ID, "user", "other@example.com"),
        _ => return None,
    };
    Some(forms::user::User {
        id: id.to_string(),
        email: email.to_string(),
        full_name: None,
        role: Some(role.to_string()),
        organization_id: Some(ORGANIZATION_ID.to_string()),
    })
}

#[get("")]
async fn mock_auth(req: HttpRequest) -> HttpResponse {
    let token = req
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or_default();

    match user_for(token) {
        Some(user) => HttpResponse::Ok().json(forms::UserForm { user }),
        None => HttpResponse::Unauthorized().finish(),
    }
}

fn mock_auth_server(listener: TcpListener) -> std::io::Result<Server> {
    Ok(
        HttpServer::new(|| App::new().service(web::scope("/me").service(mock_auth)))
            .listen(listener)?
            .run(),
    )
}
