use clap::Parser;
use usergroups::{Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before anything else that might build a TLS client
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = usergroups::config::Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!("{:?}", args);

    println!("Creating sample data...");
    let result = match usergroups::setup_database(&config).await {
        Ok(pool) => {
            let result = usergroups::create_sample_data(&config, &pool).await;
            pool.close().await;
            result
        }
        Err(e) => Err(e),
    };

    telemetry::shutdown_telemetry();

    let report = result?;
    println!("✅ Sample data created successfully! ({})", report.summary());
    Ok(())
}
