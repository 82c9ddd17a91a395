#[tokio::main]
async fn main() -> anyhow::Result<()> {
    linkgate::app::run().await
}
