use anyhow::Result;
use colored::Colorize;
use put_scanner::{
    logging, report, ReportFormat, RuntimeOptions, ScanConfig, Scanner, YahooClient,
};
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logging::init_logging();

    // ========================================
    // CONFIGURATION - defaults + environment
    // ========================================
    let config = ScanConfig::from_env();
    config.validate()?;
    let options = RuntimeOptions::from_env()?;

    info!(
        symbols = ?config.symbols,
        as_of = %options.as_of,
        period = config.period.as_str(),
        interval = config.interval.as_str(),
        "Starting daily scan"
    );

    let scanner = Scanner::new(YahooClient::new()?, config);

    let start_time = std::time::Instant::now();
    let reports = scanner.run(options.as_of).await;
    let elapsed = start_time.elapsed();

    match options.format {
        ReportFormat::Json => {
            println!("{}", report::render_json(&reports)?);
        }
        ReportFormat::Text => {
            println!("{}", "=".repeat(60).blue());
            println!("{}", "Daily Put Strategy Scan".green().bold());
            println!("{}", "=".repeat(60).blue());
            println!();

            print!("{}", report::render_text(&reports));

            let failed = reports.iter().filter(|r| r.is_failed()).count();
            println!("{}", "=".repeat(60).blue());
            println!("{} Analyzed: {}", "✓".green(), reports.len() - failed);
            println!("{} Failed: {}", "✗".red(), failed);
            println!("{} Time taken: {:.2}s", "⏱".yellow(), elapsed.as_secs_f64());
            println!("{}", "=".repeat(60).blue());
        }
    }

    Ok(())
}
