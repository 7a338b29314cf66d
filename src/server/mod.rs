pub mod api;
pub mod routes;

pub const BIND_ENV: &str = "RATIO_BIND";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

pub fn run_server(bind_addr: &str) -> std::io::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        println!("ratio-advisor server listening on http://{bind_addr}");
        axum::serve(listener, routes::router()).await
    })
}
