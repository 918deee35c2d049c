use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{get, App, HttpServer, Responder};
use dotenvy::dotenv;
use tracing::info;
use tracing_appender::rolling;

use attendance_authority::api::AppState;
use attendance_authority::auth::signature::RsaSha256Verifier;
use attendance_authority::clock::SystemClock;
use attendance_authority::config::Config;
use attendance_authority::db::init_db;
use attendance_authority::routes;
use attendance_authority::store::MySqlStore;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance authority is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await;

    let state = AppState::new(
        Arc::new(MySqlStore::new(pool)),
        Arc::new(SystemClock),
        Arc::new(RsaSha256Verifier),
        config.admin_team_id.clone(),
    );

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(state.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
