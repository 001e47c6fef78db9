//! Propoly CLI - financial life simulator front end.
//!
//! Single binary that provides:
//! - `propoly play` - run a game session against the simulator backend
//! - `propoly houses` - one-shot listing search with filters
//! - `propoly init` - write a default client configuration

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use propoly_core::{ClientConfig, HttpGateway, Synchronizer};
use propoly_protocol::{FilterPatch, GameState, House, LifeEventKind, PropertyKind, SortDir, SortKey};

#[derive(Parser)]
#[command(name = "propoly")]
#[command(about = "Financial life simulator", version)]
struct Cli {
    /// Directory holding .propoly/config.yaml
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session: initialize and advance year by year
    Play {
        /// Player name
        #[arg(long, default_value = "Player")]
        name: String,

        /// Starting age
        #[arg(long, default_value_t = 25)]
        age: u32,

        /// Monthly net income
        #[arg(long, default_value_t = 3500.0)]
        income: f64,

        /// Starting capital
        #[arg(long, default_value_t = 10000.0)]
        capital: f64,

        /// Mortgage interest rate in percent
        #[arg(long, default_value_t = 3.5)]
        interest_rate: f64,

        /// Desired monthly mortgage rate
        #[arg(long, default_value_t = 7.0)]
        desired_rate: f64,

        /// Share of income saved, in percent
        #[arg(long, default_value_t = 20.0)]
        savings_rate: f64,

        /// Years to simulate
        #[arg(long, default_value_t = 10)]
        years: u32,

        /// Life events as kind:onetime:yearly@age, e.g. medical:2000:0@31
        #[arg(long = "event")]
        events: Vec<String>,
    },

    /// Fetch listings for the default state with optional filters
    Houses {
        #[arg(long)]
        max_price: Option<f64>,

        #[arg(long)]
        min_price: Option<f64>,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        region: Option<String>,

        /// Property kinds: apartment, house, land, garage, office
        #[arg(long = "kind")]
        kinds: Vec<String>,

        /// Sort as <key>_<asc|desc>, e.g. price_per_sqm_desc
        #[arg(long)]
        sort: Option<String>,
    },

    /// Write a default .propoly/config.yaml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    let project_dir = cli
        .project
        .unwrap_or_else(|| std::env::current_dir().expect("Failed to get current directory"));

    match cli.command {
        Commands::Play {
            name,
            age,
            income,
            capital,
            interest_rate,
            desired_rate,
            savings_rate,
            years,
            events,
        } => {
            show_guide_once(&project_dir)?;
            let scheduled = events
                .iter()
                .map(|raw| parse_event(raw))
                .collect::<Result<Vec<_>>>()?;
            play(
                &project_dir,
                PlaySetup {
                    name,
                    age,
                    income,
                    capital,
                    interest_rate,
                    desired_rate,
                    savings_rate,
                    years,
                    scheduled,
                },
            )
            .await
        }
        Commands::Houses {
            max_price,
            min_price,
            city,
            region,
            kinds,
            sort,
        } => {
            let kinds = if kinds.is_empty() {
                None
            } else {
                Some(
                    kinds
                        .iter()
                        .map(|k| parse_kind(k))
                        .collect::<Result<Vec<_>>>()?,
                )
            };
            let sort = sort.as_deref().map(parse_sort).transpose()?;
            houses(
                &project_dir,
                FilterPatch {
                    kinds,
                    sort_key: sort.map(|(key, _)| key),
                    sort_by: sort.map(|(_, dir)| dir),
                    min_price,
                    max_price,
                    city,
                    region,
                },
            )
            .await
        }
        Commands::Init => init_project(&project_dir),
    }
}

struct PlaySetup {
    name: String,
    age: u32,
    income: f64,
    capital: f64,
    interest_rate: f64,
    desired_rate: f64,
    savings_rate: f64,
    years: u32,
    /// (event, trigger age)
    scheduled: Vec<(LifeEventSpec, u32)>,
}

struct LifeEventSpec {
    kind: LifeEventKind,
    one_time_cost: f64,
    yearly_cost: f64,
}

async fn play(project_dir: &PathBuf, setup: PlaySetup) -> Result<()> {
    let config = ClientConfig::load_from_dir(project_dir)?;
    tracing::info!(backend = %config.backend_url, "Starting session");

    let gateway = Arc::new(HttpGateway::new(&config)?);
    let sync = Synchronizer::new(gateway, config.prefetch);

    sync.initialize(
        &setup.name,
        setup.age,
        setup.income,
        setup.capital,
        setup.interest_rate,
        setup.desired_rate,
        setup.savings_rate,
    )
    .await?;

    let state = sync.state().await;
    println!("Welcome, {}!", sync.user_name().await);
    print_year(&state);

    for _ in 0..setup.years {
        let age = sync.state().await.age;
        for (spec, _) in setup.scheduled.iter().filter(|(_, at)| *at == age) {
            tracing::info!(age, kind = spec.kind.wire_tag(), "Submitting life event");
            sync.submit_life_event(
                spec.kind.clone(),
                spec.one_time_cost,
                spec.yearly_cost,
            )
            .await?;
        }

        sync.advance_age(1).await?;
        print_year(&sync.state().await);
    }

    sync.flush_prefetch().await;

    let state = sync.state().await;
    println!();
    println!("Listings at age {}:", state.age);
    print_listings(&state.houses, 5);
    Ok(())
}

async fn houses(project_dir: &PathBuf, patch: FilterPatch) -> Result<()> {
    let config = ClientConfig::load_from_dir(project_dir)?;
    let gateway = Arc::new(HttpGateway::new(&config)?);
    let sync = Synchronizer::new(gateway, false);

    let listings = sync.update_filters(patch).await?;
    println!("{} listings", listings.len());
    print_listings(&listings, 20);
    Ok(())
}

fn init_project(project_dir: &PathBuf) -> Result<()> {
    let config_path = ClientConfig::config_path(project_dir);
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !config_path.exists() {
        let default_config = r#"# Propoly client configuration

# Simulator backend base URL
backend_url: http://localhost:8000

# Per-request timeout in seconds
request_timeout_secs: 10

# Speculatively fetch the next-age state after each commit
prefetch: true
"#;
        std::fs::write(&config_path, default_config)?;
    }

    println!("Initialized propoly project at {}", project_dir.display());
    println!();
    println!("Created:");
    println!("  .propoly/config.yaml - client configuration");
    println!();
    println!("Next steps:");
    println!("  1. Point backend_url at a running simulator backend");
    println!("  2. Run: propoly play --name You --age 30 --years 10");

    Ok(())
}

/// Print a one-time onboarding guide, then drop a marker file so it never
/// shows again.
fn show_guide_once(project_dir: &PathBuf) -> Result<()> {
    let marker = project_dir.join(".propoly/guide_seen");
    if marker.exists() {
        return Ok(());
    }

    println!("How to play");
    println!("===========");
    println!("Each turn advances your life by one year. Your savings grow your");
    println!("capital, your capital moves your pawn across the board, and the");
    println!("marketplace shows what you could afford right now. Life events");
    println!("(a child, a car, a medical bill) change your finances and your");
    println!("options. Reach a square you like and buy.");
    println!();

    if let Some(parent) = marker.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&marker, "seen\n")?;
    Ok(())
}

fn print_year(state: &GameState) {
    let equity = state.equity.last().copied().unwrap_or_default();
    println!(
        "Age {:>3} | square {:>2} | capital {:>10.0} | equity {:>10.0} | events {}",
        state.age,
        state.square_id,
        state.finances.capital,
        equity,
        state.active_chance.len()
    );
}

fn print_listings(listings: &[House], limit: usize) {
    for house in listings.iter().take(limit) {
        println!(
            "  {:<40} {:>9.0} | {:>2} rooms | {:>5.0} m2 | {:>6.0}/m2",
            house.title, house.buying_price, house.rooms, house.square_meter, house.price_per_sqm
        );
    }
    if listings.len() > limit {
        println!("  ... and {} more", listings.len() - limit);
    }
}

fn parse_kind(raw: &str) -> Result<PropertyKind> {
    match raw.to_lowercase().as_str() {
        "apartment" => Ok(PropertyKind::Apartment),
        "house" => Ok(PropertyKind::House),
        "land" => Ok(PropertyKind::Land),
        "garage" => Ok(PropertyKind::Garage),
        "office" => Ok(PropertyKind::Office),
        other => Err(anyhow!("unknown property kind `{other}`")),
    }
}

fn parse_sort(raw: &str) -> Result<(SortKey, SortDir)> {
    if let Some((key, dir)) = raw.rsplit_once('_') {
        if let (Some(key), Some(dir)) = (SortKey::from_wire_name(key), SortDir::from_wire_name(dir))
        {
            return Ok((key, dir));
        }
    }
    Err(anyhow!(
        "invalid sort `{raw}`, expected <key>_<asc|desc> such as buying_price_asc"
    ))
}

/// Parse `kind:onetime:yearly@age`, e.g. `medical:2000:0@31`.
fn parse_event(raw: &str) -> Result<(LifeEventSpec, u32)> {
    let (spec, at_age) = raw
        .rsplit_once('@')
        .ok_or_else(|| anyhow!("invalid event `{raw}`, expected kind:onetime:yearly@age"))?;
    let at_age: u32 = at_age
        .parse()
        .map_err(|_| anyhow!("invalid event age in `{raw}`"))?;

    let mut parts = spec.splitn(3, ':');
    let kind = parts
        .next()
        .ok_or_else(|| anyhow!("missing event kind in `{raw}`"))?;
    let kind = match kind {
        "car" => LifeEventKind::Car,
        "child" => LifeEventKind::Child,
        "vacation" => LifeEventKind::Vacation,
        "medical" => LifeEventKind::Medical,
        custom => LifeEventKind::Custom {
            name: custom.to_string(),
        },
    };
    let one_time_cost: f64 = parts
        .next()
        .unwrap_or("0")
        .parse()
        .map_err(|_| anyhow!("invalid one-time cost in `{raw}`"))?;
    let yearly_cost: f64 = parts
        .next()
        .unwrap_or("0")
        .parse()
        .map_err(|_| anyhow!("invalid yearly cost in `{raw}`"))?;

    Ok((
        LifeEventSpec {
            kind,
            one_time_cost,
            yearly_cost,
        },
        at_age,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_event_spec() {
        let (spec, at_age) = parse_event("medical:2000:0@31").unwrap();
        assert_eq!(spec.kind, LifeEventKind::Medical);
        assert_eq!(spec.one_time_cost, 2_000.0);
        assert_eq!(spec.yearly_cost, 0.0);
        assert_eq!(at_age, 31);
    }

    #[test]
    fn custom_event_kinds_are_allowed() {
        let (spec, _) = parse_event("sabbatical:5000:1200@40").unwrap();
        assert_eq!(
            spec.kind,
            LifeEventKind::Custom {
                name: "sabbatical".into()
            }
        );
    }

    #[test]
    fn rejects_events_without_an_age() {
        assert!(parse_event("medical:2000:0").is_err());
    }

    #[test]
    fn parses_sort_keys_with_underscores() {
        assert_eq!(
            parse_sort("price_per_sqm_desc").unwrap(),
            (SortKey::PricePerSqm, SortDir::Desc)
        );
        assert!(parse_sort("sideways").is_err());
    }
}
