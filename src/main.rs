#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let prompt = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let prompt = (!prompt.trim().is_empty()).then_some(prompt);
    fleetchat_lib::run(prompt).await
}
