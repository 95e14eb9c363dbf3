//! Coverage Aggregator CLI
//!
//! One-shot coverage query against the providers in the configuration file.

use clap::Parser;
use coverage_aggregator::{
	init_tracing, load_config, load_config_from, log_engine_ready, log_service_info,
	log_service_shutdown, CoverageEngine, CoverageQuery, EngineBuilder, Technology,
};

#[derive(Debug, Parser)]
#[command(name = "coverage-aggregator")]
#[command(about = "Check connectivity coverage at a location across all providers", long_about = None)]
struct Args {
	/// Latitude in decimal degrees
	#[arg(long, allow_hyphen_values = true)]
	lat: f64,

	/// Longitude in decimal degrees
	#[arg(long, allow_hyphen_values = true)]
	lng: f64,

	/// Street address, echoed in the result
	#[arg(long)]
	address: Option<String>,

	/// Query a single provider instead of aggregating
	#[arg(long)]
	provider: Option<String>,

	/// Compare the providers able to deliver one technology (e.g. FIBRE, LTE)
	#[arg(long, conflicts_with = "provider")]
	compare: Option<Technology>,

	/// Configuration file (defaults to CONFIG_PATH or config/config)
	#[arg(long, env = "CONFIG_PATH")]
	config: Option<String>,

	/// Print the full result as JSON
	#[arg(long)]
	json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	let settings = match &args.config {
		Some(path) => load_config_from(path)?,
		None => load_config()?,
	};
	init_tracing(&settings.logging);
	log_service_info();

	let engine: CoverageEngine = EngineBuilder::from_settings(settings).build()?;
	let names: Vec<String> = engine.providers().into_iter().map(|p| p.name).collect();
	log_engine_ready(&names);

	if let Some(provider) = &args.provider {
		let result = engine.check_provider(provider, args.lat, args.lng).await?;
		if args.json {
			println!("{}", serde_json::to_string_pretty(&result)?);
		} else {
			println!(
				"{}: covered={} confidence={} technologies={}",
				result.provider,
				result.covered,
				result.confidence,
				join_technologies(result.technologies.iter())
			);
			if let Some(note) = &result.note {
				println!("  {}", note);
			}
		}
		log_service_shutdown();
		return Ok(());
	}

	let mut query = CoverageQuery::new(args.lat, args.lng);
	if let Some(address) = args.address {
		query = query.with_address(address);
	}
	if let Some(technology) = args.compare {
		let comparison = engine.compare_technology(query, technology).await?;
		if args.json {
			println!("{}", serde_json::to_string_pretty(&comparison)?);
		} else {
			println!("{} providers:", comparison.technology);
			for provider in &comparison.providers {
				println!(
					"  {:<12} available={:<5} confidence={:>3}",
					provider.provider, provider.available, provider.confidence
				);
				for pro in &provider.pros {
					println!("    + {}", pro);
				}
				for con in &provider.cons {
					println!("    - {}", con);
				}
			}
		}
		log_service_shutdown();
		return Ok(());
	}

	let result = engine.check_coverage(query).await?;

	if args.json {
		println!("{}", serde_json::to_string_pretty(result.as_ref())?);
	} else {
		match &result.best_provider {
			Some(best) => println!(
				"Covered: best provider {} ({}% confidence), technologies {}",
				best.provider,
				best.confidence,
				join_technologies(result.union_technologies.iter())
			),
			None => println!("No coverage found"),
		}
		for recommendation in result.by_technology.values() {
			println!(
				"  {:<14} recommended {} {}",
				recommendation.technology.as_str(),
				recommendation.recommended,
				if recommendation.alternatives.is_empty() {
					String::new()
				} else {
					format!("(alternatives: {})", recommendation.alternatives.join(", "))
				}
			);
		}
		for provider in &result.providers {
			println!(
				"  {:<12} covered={:<5} confidence={:>3} {}",
				provider.provider,
				provider.covered,
				provider.confidence,
				provider.note.as_deref().unwrap_or("")
			);
		}
	}

	log_service_shutdown();
	Ok(())
}

fn join_technologies<'a>(
	technologies: impl Iterator<Item = &'a Technology>,
) -> String {
	technologies
		.map(|t| t.as_str())
		.collect::<Vec<_>>()
		.join(", ")
}
