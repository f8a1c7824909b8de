//! CLI tool to request a trip plan from the Trip Server.
//!
//! Usage:
//!   cargo run -p trip-cli --bin plan_trip -- --name Barcelona --lat 41.3851 --lng 2.1734

use clap::Parser;
use std::time::Duration;
use trip_cli::client::{summarize, PlanClient};
use trip_core::TripType;

/// Plan a hiking loop or a two-day cycling trip
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Trip Server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Destination name
    #[arg(long, default_value = "Barcelona")]
    name: String,

    /// Destination latitude
    #[arg(long, default_value_t = 41.3851)]
    lat: f64,

    /// Destination longitude
    #[arg(long, default_value_t = 2.1734)]
    lng: f64,

    /// Trip type: hiking or cycling
    #[arg(long, default_value = "hiking")]
    trip_type: TripType,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("Planning {} trip around {} via {}...", args.trip_type, args.name, args.url);
    let client = PlanClient::new(&args.url, Duration::from_secs(args.timeout))?;
    let plan = client.plan(&args.name, args.lat, args.lng, args.trip_type)?;

    print!("{}", summarize(&plan.route));
    println!("Image: {} ({})", plan.image.url, plan.image.alt);
    if let Some(credit) = plan.image.credit {
        println!("Photo by {}", credit);
    }
    Ok(())
}
