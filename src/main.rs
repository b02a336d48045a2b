#[tokio::main]
async fn main() -> std::io::Result<()> {
    rps_duel::run_with_config().await
}
