use caminho::config::Config;
use caminho::engine::Engine;
use caminho::error::Error;
use caminho::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let engine = Engine::new(&config)?;

    serve(engine, config.listen_addr).await
}
