use std::sync::Arc;

use clap::Parser;

mod app;
mod corpus;
mod util;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Pre-aggregated corpus snapshot (JSON export of the analytics backend).
    #[arg(long, default_value = "aggregates.json")]
    snapshot: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let gateway = Arc::new(corpus::load_snapshot_gateway(&args.snapshot)?);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "comention-explorer",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ExplorerApp::new(
                cc,
                args.snapshot.clone(),
                gateway,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(())
}
