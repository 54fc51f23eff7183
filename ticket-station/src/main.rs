use station_printer::{NetworkPrinter, Printer, SerialPrinter};
use std::sync::Arc;
use ticket_station::{print_banner, setup_environment, Config, HttpLedger, Ledger, Station};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Environment (dotenv)
    setup_environment()?;

    print_banner();

    // 2. Configuration
    let config = Arc::new(Config::from_env());
    std::fs::create_dir_all(&config.work_dir)?;

    // 3. Logging
    let log_dir = config.log_to_file.then(|| config.log_dir());
    ticket_station::init_logger("info", log_dir.as_deref())?;

    tracing::info!("Ticket station starting...");

    // 4. Collaborators: remote ledger and printer channel
    let ledger: Arc<dyn Ledger> = Arc::new(HttpLedger::new(
        &config.ledger_url,
        config.request_timeout_secs,
    )?);
    let printer: Arc<dyn Printer> = match &config.printer_addr {
        Some(addr) => Arc::new(NetworkPrinter::from_addr(addr)?),
        None => Arc::new(SerialPrinter::new(&config.printer_device)),
    };

    if !printer.is_online().await {
        tracing::warn!("Printer not reachable at startup, continuing anyway");
    }

    // 5. Boot and run until ctrl-c
    let station = Station::initialize(config, ledger, printer).await;

    if let Err(e) = station.run().await {
        tracing::error!("Station error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
