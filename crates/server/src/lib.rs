//! Dashboard API Server
//!
//! Registers the authentication routes and the gated user routes into a
//! single actix-web server. Dashboard entity routes mount behind the
//! same gates.
mod config;

pub use config::Config;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::web;
use march_auth::*;

async fn welcome() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Welcome to the marching dashboard API" }))
}

async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

/// Route table with its shared state. `/api/users` requires a valid
/// session; `/api/admin` additionally requires [`Role::Admin`].
#[rustfmt::skip]
pub fn routes<R: Directory + 'static>(
    store: web::Data<R>,
    codec: web::Data<Codec>,
    crypto: web::Data<Crypto>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(store)
            .app_data(codec)
            .app_data(crypto.clone())
            .route("/", web::get().to(welcome))
            .route("/health", web::get().to(health))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(register::<R>))
                            .route("/login", web::post().to(login::<R>)),
                    )
                    .service(
                        web::scope("/users")
                            .wrap(Authenticate::new(crypto.clone()))
                            .route("/me", web::get().to(me::<R>))
                            .route("/me/password", web::put().to(change_password::<R>)),
                    )
                    .service(
                        web::scope("/admin")
                            .wrap(Authorize::new([Role::Admin]))
                            .wrap(Authenticate::new(crypto))
                            .route("/users", web::get().to(list::<R>))
                            .route("/users/{id}", web::get().to(fetch::<R>))
                            .route("/users/{id}", web::put().to(update::<R>))
                            .route("/users/{id}", web::delete().to(delete::<R>)),
                    ),
            );
    }
}

/// Create the configured administrator unless that username already exists.
pub async fn bootstrap<R: Directory>(
    store: &R,
    codec: &Codec,
    username: &str,
    password: &str,
) -> anyhow::Result<()> {
    if store.lookup(username).await?.is_some() {
        log::info!("administrator {} already present", username);
        return Ok(());
    }
    policy::validate(password)?;
    let hashword = codec.hash(password)?;
    let member = Member::new(username.to_string(), String::new(), String::new(), Role::Admin);
    store.create(&member, &hashword).await?;
    log::info!("created administrator {}", username);
    Ok(())
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let codec = match config.cost {
        Some(cost) => Codec::with_cost(cost)?,
        None => Codec::default(),
    };
    let codec = web::Data::new(codec);
    let crypto = web::Data::new(Crypto::new(config.secret.as_bytes()));
    #[cfg(feature = "database")]
    if let Some(url) = config.database.as_deref() {
        let client = march_auth::db(url).await?;
        march_auth::migrate(&client).await?;
        return serve(config, web::Data::new(client), codec, crypto).await;
    }
    if config.database.is_some() {
        log::warn!("DB_URL is set but database support is not compiled in");
    }
    log::warn!("using in-memory member store");
    serve(config, web::Data::new(Memory::default()), codec, crypto).await
}

async fn serve<R: Directory + Send + Sync + 'static>(
    config: Config,
    store: web::Data<R>,
    codec: web::Data<Codec>,
    crypto: web::Data<Crypto>,
) -> anyhow::Result<()> {
    if let Some((ref username, ref password)) = config.admin {
        bootstrap(store.get_ref(), &codec, username, password).await?;
    }
    let origins = config.origins;
    log::info!("starting dashboard server on {}", config.bind);
    HttpServer::new(move || {
        let cors = origins.iter().fold(
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE]),
            |cors, origin| cors.allowed_origin(origin),
        );
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(cors)
            .configure(routes(store.clone(), codec.clone(), crypto.clone()))
    })
    .bind(&config.bind)?
    .run()
    .await?;
    Ok(())
}
