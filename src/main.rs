use clap::{Parser, Subcommand};
use folio::content::ContentSource;
use folio::gate::AccessGate;
use folio::output::ListedCollection;
use folio::tags::{TagSelection, TagVocabulary};
use folio::{config, generate, output, scan, serve};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(clap::Args, Clone)]
struct ListArgs {
    /// Only list this collection
    #[arg(long)]
    collection: Option<String>,

    /// Only list items with this tag (repeatable; any match counts)
    #[arg(long = "tag", value_name = "TAG_ID")]
    tags: Vec<String>,
}

#[derive(clap::Args, Clone)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Static site generator and gated preview server for portfolio sites")]
#[command(long_about = "\
Static site generator and gated preview server for portfolio sites

Markdown files with YAML front matter become article pages and cards. Only
files named in a collection's `include` list are published, in that order.

Content structure:

  content/
  ├── config.toml                  # Site config: collections, tags, exceptions, gate
  ├── assets/                      # Copied to <output>/assets/
  ├── articles/
  │   ├── rust-ownership.md        # Published when listed in `include`
  │   └── scratch.md               # Not listed: ignored
  └── blogs/
      └── first-post.md

Front matter (required keys first):

  ---
  title: Ownership Without Tears
  cardDescription: A gentle tour of moves and borrows
  cardPageLink: /articles/rust-ownership
  imagePath: /assets/ownership.svg
  tagIds: [rust]
  subTitle: ...  author: ...  dateWritten: ...  dateLastUpdated: ...
  articleType: article | blog
  ---

'folio serve' puts the built site behind the access gate: visitors without
the verification cookie see the challenge page, except on articles whose
exception entry sets bypass_verification.

Run 'folio gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest)
    #[arg(long, default_value = ".folio-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan content directory into a manifest
    Scan,
    /// Produce the HTML site from the manifest
    Generate,
    /// Run the full pipeline: scan → generate
    Build,
    /// Validate content and config without building
    Check,
    /// List published items, optionally filtered by tag
    List(ListArgs),
    /// Serve the built site behind the access gate
    Serve(ServeArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();
    let manifest_path = cli.temp_dir.join("manifest.json");

    match cli.command {
        Command::Scan => {
            init_thread_pool(&cli.source)?;
            let manifest = scan::scan(&cli.source)?;
            manifest.save(&manifest_path)?;
            output::print_scan_output(&manifest, &cli.source);
        }
        Command::Generate => {
            let summary = generate::generate(&manifest_path, &cli.source, &cli.output)?;
            output::print_generate_output(&summary);
        }
        Command::Build => {
            init_thread_pool(&cli.source)?;

            println!("==> Stage 1: Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            manifest.save(&manifest_path)?;
            output::print_scan_output(&manifest, &cli.source);

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            let summary = generate::generate(&manifest_path, &cli.source, &cli.output)?;
            output::print_generate_output(&summary);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            init_thread_pool(&cli.source)?;
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            output::print_scan_output(&manifest, &cli.source);
            let warnings = output::format_check_warnings(&manifest);
            if !warnings.is_empty() {
                println!();
                for line in &warnings {
                    println!("{}", line);
                }
            }
            println!("==> Content is valid");
        }
        Command::List(args) => {
            init_thread_pool(&cli.source)?;
            run_list(&cli.source, &args)?;
        }
        Command::Serve(args) => {
            let site_config = config::load_config(&cli.source)?;
            let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
            let gate = AccessGate::from_config(&site_config);
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(serve::run(addr, gate, cli.output.clone()))?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so stage output on stdout stays clean.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(source: &Path) -> Result<(), config::ConfigError> {
    let site_config = config::load_config(source)?;
    let threads = config::effective_threads(&site_config.processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
    Ok(())
}

/// Front-matter-only listing of published items.
fn run_list(source: &Path, args: &ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let site_config = config::load_config(source)?;
    let vocab = TagVocabulary::new(site_config.tags.clone());

    for tag in args.tags.iter().filter(|t| !vocab.contains(t)) {
        tracing::warn!(tag = %tag, "tag is not in the vocabulary and never matches");
    }
    let mut selection = TagSelection::from_ids(args.tags.iter().cloned(), &vocab);

    let collections: Vec<_> = match &args.collection {
        Some(name) => vec![
            site_config
                .collection(name)
                .ok_or_else(|| format!("Unknown collection '{name}'"))?,
        ],
        None => site_config.collections.iter().collect(),
    };

    let mut listed = Vec::with_capacity(collections.len());
    for collection in collections {
        let content = ContentSource::new(
            source.join(&collection.dir),
            collection.include.as_slice(),
        );
        listed.push(ListedCollection {
            title: collection.title.clone(),
            route: collection.route.clone(),
            records: content.load_all_metadata()?,
        });
    }

    output::print_list_output(&listed, &mut selection, &vocab);
    Ok(())
}
