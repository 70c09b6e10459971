use natours_api::{observability, routes, AppState, Config, Server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    observability::init_tracing(&config);

    if config.is_production() && config.auth.jwt_secret.starts_with("insecure-dev-only") {
        tracing::warn!("Running in production with the default JWT secret; set NATOURS_AUTH__JWT_SECRET");
    }

    let state = AppState::new(config)?;
    let server = Server::new(state.config.as_ref().clone());
    server.serve(routes::app_router(state)).await?;

    Ok(())
}
