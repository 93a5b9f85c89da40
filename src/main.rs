use anyhow::Result;
use r6_stats_to_sqlite::{
    cli::{Cli, Commands},
    import::import_file,
    schema::ALL_TABLES,
    ui::{LogUi, UiApp},
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Import(args) => {
            let output = args.validate()?;
            let options = args.options();
            let start = Instant::now();

            // Log lines would tear the full-screen view, so the TUI runs without a subscriber
            let summary = if args.tui {
                let mut ui = UiApp::new()?;
                match import_file(&args.input, &output, &options, &mut ui) {
                    Ok(summary) => {
                        ui.finish(&summary.to_string())?;
                        summary
                    }
                    Err(e) => {
                        ui.restore()?;
                        return Err(e);
                    }
                }
            } else {
                init_logging();
                import_file(&args.input, &output, &options, &mut LogUi::new())?
            };

            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("{}", summary);
                println!("Done in {:.1}s", start.elapsed().as_secs_f64());
            }
        }

        Commands::ListTables => {
            println!("Tables:\n");
            for table in ALL_TABLES {
                println!("  {:24} {}", table.name, table.kind);
            }
        }
    }

    Ok(())
}
