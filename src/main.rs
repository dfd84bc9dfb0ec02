use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use estimator_api::{
    config::AppConfig, db, routes, services::crm_service::CrmService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env();
    info!("Attempting to bind to {}:{}", config.host, config.port);

    let client = match db::mongo::create_mongo_client(&config.mongo_uri, &config.database).await {
        Ok(client) => client,
        Err(e) => {
            error!("Invalid MongoDB configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let crm = web::Data::new(CrmService::new(config.crm.clone()));
    if config.crm.api_url.is_none() {
        info!("CRM sync disabled");
    }

    let bind = (config.host.clone(), config.port);
    let app_config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .app_data(web::Data::new(client.clone()))
            .app_data(app_config.clone())
            .app_data(crm.clone())
            .route("/health", web::get().to(routes::health::health_check))
            .configure(routes::config)
    })
    .bind(bind)?
    .run()
    .await
}
