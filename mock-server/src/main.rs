use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let echo_port = std::env::var("ECHO_PORT").unwrap_or_else(|_| "3001".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let echo_addr = format!("127.0.0.1:{echo_port}");
    let echo_listener = TcpListener::bind(&echo_addr).await?;
    info!(http = %addr, tcp_echo = %echo_addr, "listening");

    tokio::try_join!(mock_server::run(listener), mock_server::run_tcp_echo(echo_listener))?;
    Ok(())
}
