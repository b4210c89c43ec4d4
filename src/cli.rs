use std::cmp;
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use atty::Stream;
use clap::{Args, Parser, Subcommand};
use etymology_explorer::atlas::MapEra;
use etymology_explorer::period::{self, format_year};
use etymology_explorer::reference::{known_languages, suggest_languages};
use etymology_explorer::{
    Explorer, ExplorerConfig, HttpMapSource, MapSource, NodeRef, WordEntry, map_for_selection,
};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "etymology-explorer",
    about = "Trace English words through their ancestor languages",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    sources: SourceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Base URL of the dictionary page endpoint.
    #[arg(long, global = true, env = "ETYMOLOGY_DICTIONARY_URL")]
    dictionary_url: Option<String>,
    /// GeoJSON of present-day country borders.
    #[arg(long, global = true, env = "ETYMOLOGY_MODERN_MAP_URL")]
    modern_map_url: Option<String>,
    /// Directory URL holding the historical `world_<era>.geojson` files.
    #[arg(long, global = true, env = "ETYMOLOGY_HISTORICAL_MAP_BASE")]
    historical_map_base: Option<String>,
    #[arg(long, global = true, env = "ETYMOLOGY_USER_AGENT")]
    user_agent: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "ETYMOLOGY_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
    /// Number of map snapshots kept in memory.
    #[arg(long, global = true, env = "ETYMOLOGY_SNAPSHOT_CACHE")]
    snapshot_cache: Option<usize>,
    /// Directory for zstd-compressed map snapshots.
    #[arg(long, global = true, env = "ETYMOLOGY_CACHE_DIR")]
    cache_dir: Option<PathBuf>,
}

impl SourceArgs {
    fn into_config(self) -> ExplorerConfig {
        let defaults = ExplorerConfig::default();
        ExplorerConfig {
            dictionary_url: self.dictionary_url.unwrap_or(defaults.dictionary_url),
            modern_map_url: self.modern_map_url.unwrap_or(defaults.modern_map_url),
            historical_map_base: self
                .historical_map_base
                .unwrap_or(defaults.historical_map_base),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            snapshot_cache_capacity: self
                .snapshot_cache
                .unwrap_or(defaults.snapshot_cache_capacity),
            cache_dir: self.cache_dir.or(defaults.cache_dir),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up a word and print its etymology chain.
    Lookup {
        word: String,
    },
    /// Render the map for a word or one of its etymology nodes.
    Map {
        word: String,
        /// Node to highlight, as `branch.node` (e.g. `0.2`).
        #[arg(long)]
        node: Option<NodeRef>,
        /// Write the SVG here instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// List the languages the parser recognizes.
    Languages {
        /// Rank languages by similarity to this name.
        #[arg(short, long)]
        query: Option<String>,
        /// Maximum number of suggestions to return.
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Show how a period string is dated and which map it selects.
    Period {
        text: String,
    },
    /// Run the HTTP interface.
    #[cfg(feature = "web")]
    Serve(ServeArgs),
}

#[cfg(feature = "web")]
#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, env = "ETYMOLOGY_ADDR", default_value = "127.0.0.1:8080")]
    addr: std::net::SocketAddr,
    /// Use the light color scheme.
    #[arg(long, env = "ETYMOLOGY_LIGHT_THEME")]
    light: bool,
    /// Number of looked-up words kept in memory.
    #[arg(long, env = "ETYMOLOGY_ENTRY_CACHE", default_value_t = 256)]
    entry_cache: usize,
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(&cli.command);
    let config = cli.sources.into_config();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    match cli.command {
        Command::Lookup { word } => runtime.block_on(handle_lookup(&config, &word, cli.json)),
        Command::Map { word, node, out } => {
            runtime.block_on(handle_map(&config, &word, node, out, cli.json))
        }
        Command::Languages { query, limit } => handle_languages(query, limit, cli.json),
        Command::Period { text } => handle_period(&text, cli.json),
        #[cfg(feature = "web")]
        Command::Serve(args) => runtime.block_on(handle_serve(config, args)),
    }
}

fn init_tracing(command: &Command) {
    let default_level = match command {
        #[cfg(feature = "web")]
        Command::Serve(_) => "info",
        _ => "warn",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn handle_lookup(
    config: &ExplorerConfig,
    word: &str,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let explorer = Explorer::from_config(config)?;
    let entry = explorer
        .search(word)
        .await
        .map_err(|err| err.user_message())?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print_entry(&entry);
    }
    Ok(())
}

async fn handle_map(
    config: &ExplorerConfig,
    word: &str,
    node: Option<NodeRef>,
    out: Option<PathBuf>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let explorer = Explorer::from_config(config)?;
    let entry = explorer
        .search(word)
        .await
        .map_err(|err| err.user_message())?;
    if let Some(node) = node {
        if entry.node(node).is_none() {
            return Err(format!("{word:?} has no etymology node {node}").into());
        }
    }
    let maps: Arc<dyn MapSource> = Arc::new(HttpMapSource::new(config)?);
    let view = map_for_selection(maps.as_ref(), &entry, node).await?;

    if let Some(path) = &out {
        tokio::fs::write(path, view.rendered.svg.as_bytes()).await?;
    }
    if as_json {
        let payload = json!({
            "word": entry.word,
            "node": node.map(|n| n.to_string()),
            "requested_era": view.requested_era.slug(),
            "era": view.era.slug(),
            "fell_back": view.fell_back,
            "caption": view.caption(),
            "highlight": view.highlight,
            "highlighted": view.rendered.highlighted,
            "out": out.as_ref().map(|p| p.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if let Some(path) = &out {
        println!("{}", view.caption());
        if view.rendered.highlighted.is_empty() {
            println!("No regions highlighted.");
        } else {
            println!("Highlighted: {}", view.rendered.highlighted.join(", "));
        }
        println!("Wrote {}", path.display());
    } else {
        println!("{}", view.rendered.svg);
    }
    Ok(())
}

fn handle_languages(
    query: Option<String>,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    match query {
        Some(query) => {
            if query.trim().is_empty() {
                return Err("Language query cannot be empty".into());
            }
            let limit = cmp::max(1, limit);
            let matches = suggest_languages(&query, limit);
            if as_json {
                let payload = json!({
                    "query": query,
                    "limit": limit,
                    "results": matches,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_suggestions(&query, &matches);
            }
        }
        None => {
            let languages = known_languages();
            if as_json {
                let payload: Vec<_> = languages
                    .iter()
                    .map(|profile| {
                        json!({
                            "name": profile.name,
                            "color": profile.color,
                            "period": profile.period,
                            "region": profile.region(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_language_table();
            }
        }
    }
    Ok(())
}

fn handle_period(text: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let year = period::start_year(text);
    let era = MapEra::for_year(year);
    if as_json {
        let payload = json!({
            "period": text,
            "start_year": year,
            "era": era.slug(),
            "map": era.label(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("Period:     {text}");
        println!("Start year: {} ({year})", format_year(year));
        println!("Map:        {}", era.label());
    }
    Ok(())
}

#[cfg(feature = "web")]
async fn handle_serve(config: ExplorerConfig, args: ServeArgs) -> Result<(), Box<dyn Error>> {
    use etymology_explorer::web::{WebConfig, WebTheme, serve};

    let web_config = WebConfig {
        addr: args.addr,
        theme: if args.light {
            WebTheme::Light
        } else {
            WebTheme::Dark
        },
        explorer: config,
        entry_cache_capacity: args.entry_cache,
    };
    serve(web_config).await?;
    Ok(())
}

fn print_entry(entry: &WordEntry) {
    println!("Word: {} ({})", entry.word, entry.language);
    println!("Period: {}", entry.period);
    println!("{}: {}", entry.region.label, entry.region.name);
    render_markdown_block("Meaning", &entry.meaning);

    if entry.etymology.is_empty() {
        println!(
            "\nNo etymology chain found. This word may be a recent invention or have a complex etymology."
        );
        return;
    }

    let mut tree = String::new();
    for (branch_idx, branch) in entry.etymology.branches.iter().enumerate() {
        if entry.etymology.has_multiple_branches {
            tree.push_str(&format!("**{}**\n\n", branch.label));
        }
        for (node_idx, node) in branch.nodes.iter().enumerate() {
            tree.push_str(&format!(
                "* `{}` *{}* {} ({}, {}: {})\n",
                NodeRef::new(branch_idx, node_idx),
                node.word,
                node.language,
                node.period,
                node.region.label,
                node.region.name
            ));
        }
        tree.push('\n');
    }
    render_markdown_block("Etymology", &tree);
}

fn print_suggestions(query: &str, rows: &[etymology_explorer::reference::LanguageSuggestion]) {
    if rows.is_empty() {
        println!("No languages resemble \"{query}\".");
        return;
    }
    let width = rows
        .iter()
        .map(|row| row.name.len())
        .max()
        .unwrap_or(query.len())
        .max("LANGUAGE".len());
    println!("Languages like \"{query}\":");
    println!("{:<width$}  {}", "LANGUAGE", "SCORE", width = width);
    println!("{:-<width$}  {}", "", "-----", width = width);
    for row in rows {
        println!("{:<width$}  {:.2}", row.name, row.score, width = width);
    }
}

fn print_language_table() {
    let languages = known_languages();
    let width = languages
        .iter()
        .map(|profile| profile.name.len())
        .max()
        .unwrap_or(0)
        .max("LANGUAGE".len());
    println!("{:<width$}  {:<8}  {}", "LANGUAGE", "COLOR", "PERIOD", width = width);
    println!("{:-<width$}  {:-<8}  {}", "", "", "------", width = width);
    for profile in languages {
        println!(
            "{:<width$}  {:<8}  {}",
            profile.name,
            profile.color,
            profile.period,
            width = width
        );
    }
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
