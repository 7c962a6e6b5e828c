//! Launchboard Entry Point
//!
//! Opens the dashboard described by the settings file (first argument,
//! default `settings.json`) and prints its layout.

use std::path::PathBuf;

use launchboard_lib::{Dashboard, Item};

fn describe(item: &Item) -> String {
    format!("{:>3}  {:<8} {} ({})", item.position, item.kind().as_str(), item.name, item.id)
}

async fn print_layout(dashboard: &Dashboard) {
    for item in dashboard.items_in(None).await {
        println!("{}", describe(&item));
        if item.is_group() {
            for child in dashboard.items_in(Some(&item.id)).await {
                println!("     {}", describe(&child));
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("settings.json"));

    match launchboard_lib::start(&settings_path).await {
        Ok(dashboard) => print_layout(&dashboard).await,
        Err(e) => {
            eprintln!("Failed to open dashboard: {}", e);
            std::process::exit(1);
        }
    }
}
