#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = bulletin_rust::run().await {
        eprintln!("bulletin-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
