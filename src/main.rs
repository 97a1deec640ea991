#[macro_use]
extern crate diesel;

mod admin;
mod availability;
mod booking;
mod database;
mod models;
mod protocol;
mod schema;
mod utils;

use actix_web::{web, App, HttpServer};
use diesel::{r2d2::ConnectionManager, PgConnection};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let conn_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not found");
    let manager = ConnectionManager::<PgConnection>::new(conn_url);
    let pool = r2d2::Pool::builder()
        .build(manager)
        .expect("Failed to create pool");

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    info!("{} listening on {}", env!("CARGO_PKG_NAME"), bind);

    HttpServer::new(move || {
        App::new()
            .data(pool.clone())
            // public booking API
            .service(
                web::scope("/api")
                    .configure(booking::config),
            )
            // back office
            .service(
                web::scope("/admin")
                    .configure(admin::config),
            )
    })
    .bind(&bind)?
    .run()
    .await
}
