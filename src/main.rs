use std::io::{self, IsTerminal, Read, Write};

use anyhow::{Context, Result};
use clap::Parser;
use page_overlay::{OutputFormat, RenderMode};

#[derive(Parser, Debug)]
#[command(
    name = "page-overlay",
    version,
    about = "Render interactive text overlays on top of page images"
)]
struct Cli {
    /// Page overlay JSON document (reads stdin when omitted or "-")
    document: Option<String>,

    /// Render mode (copyOnly, replace, debug)
    #[arg(short = 'm', long = "mode")]
    mode: Option<RenderMode>,

    /// Rendered container width in px (default: natural width)
    #[arg(short = 'w', long = "width")]
    width: Option<f32>,

    /// Output format (html, svg, png, jpeg, webp, tree)
    #[arg(short = 'f', long = "format")]
    format: Option<OutputFormat>,

    /// Write output to a file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Render the element with this id in its hovered state (repeatable)
    #[arg(long = "hover")]
    hover: Vec<String>,

    /// Inline image and mask references as data URIs
    #[arg(long = "embed-assets")]
    embed_assets: bool,

    /// Skip document validation
    #[arg(long = "no-validate")]
    no_validate: bool,

    /// Validate the document, print issues and exit
    #[arg(long = "validate-only")]
    validate_only: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Font file used for text measurement and rasterizing
    #[arg(long = "font-path")]
    font_path: Option<String>,

    /// Run the HTTP server (empty value uses the configured address)
    #[arg(long = "server", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    page_overlay::logging::init(cli.verbose)?;

    let reads_stdin = cli.server.is_none()
        && cli.document.as_deref().map(|path| path == "-").unwrap_or(true);
    let input = if reads_stdin && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .with_context(|| "stdin must be UTF-8 JSON")?;
        Some(buffer)
    } else {
        None
    };

    let output = page_overlay::run(
        page_overlay::Config {
            document: cli.document,
            mode: cli.mode,
            width: cli.width,
            format: cli.format,
            hover: cli.hover,
            embed_assets: cli.embed_assets,
            no_validate: cli.no_validate,
            validate_only: cli.validate_only,
            settings_path: cli.read_settings,
            font_path: cli.font_path,
            server: cli.server,
        },
        input,
    )
    .await?;

    match cli.output {
        Some(path) => std::fs::write(&path, &output.bytes)
            .with_context(|| format!("failed to write output: {}", path))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&output.bytes)?;
            if !output.mime.starts_with("image/") || output.mime == "image/svg+xml" {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}
