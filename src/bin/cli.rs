//! rental-search CLI
//!
//! Runs one search against a rental site and prints a page of the
//! filtered, sorted results.

use std::collections::BTreeSet;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rental_search::{
    error::{AppError, Result},
    models::{CARD_IMAGE_SIZE, CanonicalListing, Config, SearchForm, SourceId},
    pipeline::{SearchCoordinator, SearchSession, run_search},
    query::{QuerySpec, ResultPage, SortKey, parse_terms},
    sources::{self, HttpDetailFetcher},
    utils::{http, strip_tags, truncate_chars},
};

/// Longest description excerpt printed per card.
const EXCERPT_CHARS: usize = 280;

/// rental-search - Rental listing aggregator
#[derive(Parser, Debug)]
#[command(
    name = "rental-search",
    version,
    about = "Search rental listings across Australian property sites"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "rental-search.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every page of a search and print one page of results
    Search(SearchArgs),

    /// Validate the configuration file
    Validate,

    /// List supported sources and the checkbox fields they send
    Sources,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Site to search (domain, rent, realestate, flatmates)
    #[arg(short, long)]
    source: SourceId,

    /// Search form field, as key=value (repeatable)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Checked checkbox field (repeatable)
    #[arg(long = "flag")]
    flags: Vec<String>,

    /// Comma-separated terms; listings whose address contains any are hidden
    #[arg(long, default_value = "")]
    exclude_address: String,

    /// Comma-separated terms; listings whose description contains any are hidden
    #[arg(long, default_value = "")]
    exclude_description: String,

    /// Property type / room category to hide (repeatable)
    #[arg(long = "exclude-type")]
    exclude_types: Vec<String>,

    /// Result order: none, price-asc, price-desc
    #[arg(long, default_value = "none")]
    sort: SortKey,

    /// Result page to show
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Listings per page (default from config)
    #[arg(long)]
    page_size: Option<usize>,

    /// Print the result page as JSON
    #[arg(long)]
    json: bool,

    /// Do not hide the configured default property types
    #[arg(long)]
    no_default_exclusions: bool,
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}", failure_message(&e));
        std::process::exit(1);
    }
}

/// One human-readable line for a failed command.
fn failure_message(err: &AppError) -> String {
    let text = err.to_string();
    let line = text.lines().next().unwrap_or_default();
    match err {
        AppError::Http(_) | AppError::Status { .. } | AppError::Upstream { .. } => {
            format!("Error fetching listings: {line}")
        }
        _ => format!("Error: {line}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = if cli.config.exists() {
        Config::load_or_default(&cli.config)
    } else {
        log::debug!("No config at {}; using defaults", cli.config.display());
        Config::default()
    };

    match cli.command {
        Command::Search(args) => {
            config.validate()?;
            search(&config, args).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            Config::load(&cli.config)?.validate()?;
            log::info!("✓ Config OK ({})", cli.config.display());
        }

        Command::Sources => {
            let client = http::create_async_client(&config.http)?;
            for source in SourceId::ALL {
                let adapter = sources::adapter_for(source, client.clone(), &config.sources);
                let flags = adapter.boolean_flags();
                println!(
                    "{:<11} {:<18} {}",
                    source.as_str(),
                    source.site_name(),
                    if flags.is_empty() {
                        "-".to_string()
                    } else {
                        flags.join(", ")
                    }
                );
            }
        }
    }

    Ok(())
}

async fn search(config: &Config, args: SearchArgs) -> Result<()> {
    let client = http::create_async_client(&config.http)?;
    let adapter = sources::adapter_for(args.source, client.clone(), &config.sources);
    let fetcher = HttpDetailFetcher::new(client);

    let mut form = SearchForm::from_pairs(args.params.iter().cloned());
    for flag in &args.flags {
        form.set(flag, "true");
    }

    let coordinator = SearchCoordinator::new();
    let ticket = coordinator.begin();
    let session = run_search(
        &coordinator,
        &ticket,
        config,
        adapter.as_ref(),
        &fetcher,
        &form,
        |p| log::debug!("Descriptions {}% ({}/{})", p.percent(), p.done, p.total),
    )
    .await?;

    let spec = query_spec(config, &session, &args);
    let page = session.view(&spec);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }
    print_page(&session, &page);
    Ok(())
}

fn query_spec(config: &Config, session: &SearchSession, args: &SearchArgs) -> QuerySpec {
    let mut type_exclude: BTreeSet<String> = args.exclude_types.iter().cloned().collect();
    if !args.no_default_exclusions {
        type_exclude.extend(session.default_exclusions(&config.view));
    }

    QuerySpec {
        address_exclude: parse_terms(&args.exclude_address),
        description_exclude: parse_terms(&args.exclude_description),
        type_exclude,
        sort: args.sort,
        page: args.page,
        page_size: args.page_size.unwrap_or(config.view.page_size),
    }
}

fn print_page(session: &SearchSession, page: &ResultPage) {
    if session.is_empty() {
        println!("No listings found for your criteria.");
        return;
    }
    if page.is_empty() {
        println!("All {} listings are hidden by the current filters.", session.len());
        return;
    }

    let categories = session.available_categories();
    if !categories.is_empty() {
        println!("Categories: {}", categories.join(", "));
        println!();
    }

    for listing in &page.listings {
        print_card(listing);
    }
    println!(
        "Page {} of {} (Total results: {})",
        page.current_page, page.total_pages, page.total_count
    );
}

fn print_card(listing: &CanonicalListing) {
    let title = listing
        .address
        .as_ref()
        .map(|a| a.display())
        .filter(|a| !a.is_empty())
        .unwrap_or("Address not available");
    println!("{title}");
    println!("  Price: {}", listing.display_price());

    if !listing.features.is_empty() {
        println!("  {}", listing.features.join(" | "));
    }
    if let Some(agency) = &listing.agency {
        let listers: Vec<String> = agency
            .listers
            .iter()
            .map(|l| match &l.phone {
                Some(phone) => format!("{} ({phone})", l.name),
                None => l.name.clone(),
            })
            .collect();
        if listers.is_empty() {
            println!("  Agency: {}", agency.name);
        } else {
            println!("  Agency: {} - {}", agency.name, listers.join(", "));
        }
    }
    if let Some(available) = &listing.available_date {
        println!("  Available: {available}");
    }
    if let Some(bond) = &listing.bond {
        println!("  Bond: {bond}");
    }
    for inspection in &listing.inspection_times {
        println!("  Inspection: {}", inspection.display());
    }

    match listing.display_description() {
        Some(description) => {
            println!("  {}", truncate_chars(&strip_tags(description), EXCERPT_CHARS))
        }
        None => println!("  No description available."),
    }
    if let Some(image) = listing.images.first() {
        println!("  Photo: {}", image.resolve(CARD_IMAGE_SIZE));
    }
    if let Some(url) = &listing.detail_url {
        println!("  {url}");
    }
    println!();
}
