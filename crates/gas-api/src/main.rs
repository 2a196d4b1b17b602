#[tokio::main]
async fn main() {
    gas_api::start(std::env::args()).await;
}
