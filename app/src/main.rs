#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ironbank_app::run().await
}
