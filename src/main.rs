#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    feed_news_reader::init_tracing();
    feed_news_reader::run().await?;
    Ok(())
}
