use clap::Parser;
use pagecraft_core::{logging, AppConfig, CoreResult};
use pagecraft_render::{BaseUrlResolver, DisabledScripts, InlineScripts, PageContent, RenderHost};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process;

/// Render stored page content to HTML on stdout.
#[derive(Parser, Debug)]
#[command(name = "render-page", version)]
struct Args {
    /// Page content file (JSON array of component instances)
    content: PathBuf,

    /// JSON object passed to every component as page data
    #[arg(long)]
    page_data: Option<PathBuf>,

    /// Document title
    #[arg(long, default_value = "Page")]
    title: String,

    /// Print only the rendered components, without the document shell
    #[arg(long)]
    fragment: bool,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("render-page: {}", e);
        process::exit(1);
    }
}

fn read_json(path: &Path) -> CoreResult<Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn run(args: Args) -> CoreResult<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    logging::init(&config.log_level);

    let content = PageContent::normalize(&read_json(&args.content)?)?;
    if let Err(e) = content.validate() {
        tracing::warn!(error = %e, "page content is not valid, rendering anyway");
    }
    let page_data = match &args.page_data {
        Some(path) => read_json(path)?,
        None => Value::Object(Default::default()),
    };

    let media = BaseUrlResolver::new(config.media_base_url.clone());
    let mut host = if config.allow_scripts {
        RenderHost::new(media, InlineScripts)
    } else {
        RenderHost::new(media, DisabledScripts)
    };

    let page = host.render_page(&content, &page_data);
    tracing::info!(components = page.len(), "rendered page");
    if args.fragment {
        print!("{}", page.to_html());
    } else {
        print!("{}", host.render_document(&args.title, &page));
    }
    Ok(())
}
