use actix_web::{middleware, web, App, HttpServer};
use anyhow::{Context, Result};
use carclass::config::{Settings, DEFAULT_CONFIG_FILE};
use carclass::server::routes;
use carclass::service::Predictor;
use std::{env, process};
use tracing::info;

const USAGE: &str = "usage: ./carclass [settings file]";

fn get_args() -> String {
    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => DEFAULT_CONFIG_FILE.to_string(),
        2 => args[1].clone(),
        _ => {
            println!("{USAGE}");
            process::exit(1);
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    let settings = Settings::load(&get_args())?;

    tracing_subscriber::fmt()
        .with_max_level(settings.tracing_level())
        .init();

    // Nothing can be served without the model and its labels
    let predictor = web::Data::new(Predictor::load(&settings).context("startup failed")?);

    let addr = settings.bind_addr();
    info!("listening on {addr}");

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(predictor.clone())
            .app_data(routes::json_config())
            .wrap(middleware::Logger::default())
            .service(routes::predict)
    });
    if let Some(workers) = settings.workers {
        server = server.workers(workers);
    }

    server
        .bind(&addr)
        .with_context(|| format!("failed to bind {addr}"))?
        .run()
        .await?;
    Ok(())
}
