use std::io::{self, BufRead, Write};
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use tracing::{info, warn};

use city_client::scenarios::parse_building_count;
use city_client::{
    load_client_config_from_env, run_repl, CityClient, ClientConfig, MenuChoice, Pacer,
    DEFAULT_RANDOM_BUILDINGS,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "City builder automation client", long_about = None)]
struct Cli {
    /// Engine host name or address (overrides CITY_CLIENT_HOST).
    #[arg(long)]
    host: Option<String>,
    /// Engine command port (overrides CITY_CLIENT_PORT).
    #[arg(long)]
    port: Option<u16>,
    /// Timeout for each connect/send/receive attempt, in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,
    /// Multiplier for pauses between scenario steps; 0 disables them.
    #[arg(long)]
    demo_pace: Option<f32>,
    /// Run this entry directly instead of showing the menu
    /// (1-6, connection, basic, planning, random, llm, interactive).
    #[arg(long)]
    scenario: Option<MenuChoice>,
    /// Number of buildings for the random city scenario.
    #[arg(long)]
    buildings: Option<u32>,
}

impl Cli {
    fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout = Duration::from_millis(ms);
        }
        match self.demo_pace {
            Some(pace) => config.with_demo_pace(pace),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = cli.apply(load_client_config_from_env());
    info!(
        target: "city_client",
        address = %config.address(),
        max_attempts = config.max_attempts,
        "client.configured"
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();

    let choice = match cli.scenario {
        Some(choice) => choice,
        None => prompt_menu(&mut input)?,
    };
    let buildings = match (choice, cli.buildings) {
        (_, Some(count)) => count,
        (MenuChoice::RandomCity, None) if cli.scenario.is_none() => {
            prompt_building_count(&mut input)?
        }
        _ => DEFAULT_RANDOM_BUILDINGS,
    };

    let mut client = CityClient::from_config(&config);
    match choice.scenario(buildings) {
        Some(scenario) => {
            scenario.run(&mut client, &Pacer::new(config.demo_pace));
        }
        None => {
            run_repl(&mut client, input);
        }
    }

    Ok(())
}

fn prompt_menu(input: &mut impl BufRead) -> Result<MenuChoice> {
    println!("CITY BUILDER - Rust Client");
    println!("{}", "=".repeat(60));
    println!();
    println!("Select demo:");
    for (index, choice) in MenuChoice::ALL.iter().enumerate() {
        println!("{}. {}", index + 1, choice);
    }
    print!("\nEnter choice (1-6): ");
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(match line.trim().parse::<MenuChoice>() {
        Ok(choice) => choice,
        Err(err) => {
            warn!(target: "city_client", error = %err, "menu.fallback");
            println!("Running basic demo...");
            MenuChoice::BasicCommands
        }
    })
}

fn prompt_building_count(input: &mut impl BufRead) -> Result<u32> {
    print!("Number of buildings (default {}): ", DEFAULT_RANDOM_BUILDINGS);
    io::stdout().flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(match parse_building_count(&line) {
        Ok(count) => count,
        Err(err) => {
            println!(
                "Invalid number '{}' ({}), using {}",
                line.trim(),
                err,
                DEFAULT_RANDOM_BUILDINGS
            );
            DEFAULT_RANDOM_BUILDINGS
        }
    })
}
