use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use gallery_curator::{config, curate, generate, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that run the curation pipeline.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Evaluate post ages as of this instant (RFC 3339) instead of now
    #[arg(long, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,
}

impl RunArgs {
    fn instant(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

#[derive(Parser)]
#[command(name = "gallery-curator")]
#[command(about = "Regenerate a blog's photo sidebar and gallery page from its posts")]
#[command(long_about = "\
Regenerate a blog's photo sidebar and gallery page from its posts

Every <id>.md file in the content directory is a post. Its front matter
decides where its images go:

  draft: true                  → nowhere
  date older than max_age_days → gallery page only
  anything else                → sidebar and gallery page
  missing or broken header     → nowhere

Images are found in the post body as ![alt](url) or as
{{< lazyimage <hex> <count> >}} shortcodes.

Site layout (defaults, relative to --root):

  gallery.toml                                             # Optional config
  site/content/
  ├── 1.md                                                 # Posts
  ├── 2.md
  └── gallery.md                                           # Written: full gallery
  site/themes/devhouse-theme/layouts/partials/gallery.html # Written: sidebar

Run 'gallery-curator gen-config' to generate a documented gallery.toml.")]
#[command(version)]
struct Cli {
    /// Site root; config and relative paths resolve against it
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: gallery.toml under the site root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Curate posts and write the sidebar partial and gallery page
    Build(RunArgs),
    /// Curate posts and print the report without writing anything
    Check(RunArgs),
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Build(run) => {
            let config = load_config(&cli)?;
            println!("==> Curating {}", config.content_dir.display());
            let curation = curate::curate(&config, run.instant())?;
            output::print_curation_output(&curation, &config.content_dir);

            println!("==> Writing artifacts");
            generate::generate(
                &curation.views,
                &config.empty_sidebar_message,
                &config.output,
            )?;
            output::print_generate_output(&curation.views, &config.output, &cli.root);
            println!("==> Build complete");
        }
        Command::Check(run) => {
            let config = load_config(&cli)?;
            println!("==> Checking {}", config.content_dir.display());
            let curation = curate::curate(&config, run.instant())?;
            output::print_curation_output(&curation, &config.content_dir);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config named on the command line (or the site default) and
/// anchor its paths at the site root.
fn load_config(cli: &Cli) -> Result<config::GalleryConfig, config::ConfigError> {
    let path = config_path(&cli.root, cli.config.as_deref());
    // Only the implicit gallery.toml may be absent.
    if cli.config.is_some() && !path.exists() {
        return Err(config::ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file not found: {}", path.display()),
        )));
    }
    tracing::debug!(path = %path.display(), "loading config");
    Ok(config::load_config(&path)?.anchored(&cli.root))
}

fn config_path(root: &Path, explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join("gallery.toml"))
}

fn parse_instant(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp like 2024-01-06T09:00:00+09:00: {e}"))
}
