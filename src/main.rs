use anyhow::Context;
use books_kernel::settings::Settings;
use clap::Parser;

use books_app::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load settings")?;
    cli.apply(&mut settings);

    books_telemetry::init(&settings.telemetry)?;

    books_app::run(settings).await
}
