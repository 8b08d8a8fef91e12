use crate::config::load_config;
use crate::pipeline::Renderer;
use crate::service::{self, RenderRequestDto, Response, ResponseBody};
use anyhow::{Context, Result};
use base64::Engine as _;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "shapecloud", version, about = "Shaped word cloud renderer")]
pub struct Args {
    /// Config JSON file
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding template images
    #[arg(long = "asset-dir", env = "SHAPECLOUD_ASSET_DIR", global = true)]
    pub asset_dir: Option<PathBuf>,

    /// Directory saved renders are written to
    #[arg(long = "output-dir", env = "SHAPECLOUD_OUTPUT_DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Log level or filter directives (e.g. "debug" or "warn,shapecloud=trace")
    #[arg(long = "log-level", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a word cloud from command line options
    Render(RenderArgs),
    /// Render from a JSON request document ('-' for stdin)
    Request { input: PathBuf },
    /// List shape ids
    Shapes,
    /// List font ids
    Fonts,
    /// List color themes
    Themes,
}

#[derive(ClapArgs, Debug)]
pub struct RenderArgs {
    /// Comma separated terms, most important first
    #[arg(short = 't', long = "text")]
    pub text: String,

    #[arg(short = 's', long = "shape", default_value = "circle")]
    pub shape: String,

    #[arg(short = 'w', long = "width")]
    pub width: Option<i64>,

    #[arg(short = 'H', long = "height")]
    pub height: Option<i64>,

    /// Background color (name or #rrggbb)
    #[arg(short = 'b', long = "background")]
    pub background: Option<String>,

    /// Mask image for the custom shape, also the palette source
    #[arg(short = 'i', long = "image")]
    pub image: Option<PathBuf>,

    /// Color terms with a palette clustered from --image
    #[arg(long = "image-colors")]
    pub image_colors: bool,

    #[arg(short = 'f', long = "font", default_value = "default")]
    pub font: String,

    #[arg(long = "theme", default_value = "viridis")]
    pub theme: String,

    /// PNG output path
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Also save under the output directory with this file name
    #[arg(long = "save")]
    pub save: Option<String>,

    /// Print the JSON response instead of writing a file
    #[arg(long = "json")]
    pub json: bool,
}

/// Accepts a bare level (`debug`) or full filter directives
/// (`warn,shapecloud=trace`).
fn log_filter(log_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(log_level).with_context(|| format!("invalid log level '{log_level}'"))
}

fn init_tracing(log_level: &str) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(log_level)?)
        .with_target(true)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;
    Ok(())
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    match args.command {
        Command::Shapes => return print_json(&service::shapes()),
        Command::Fonts => return print_json(&service::fonts()),
        Command::Themes => return print_json(&service::themes()),
        _ => {}
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = args.asset_dir {
        config.asset_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    match args.command {
        Command::Render(render) => {
            let dto = render_dto(&render, &config)?;
            let renderer = Renderer::new(config);
            let response = service::handle(&renderer, &dto);
            if render.json {
                print_body(&response)?;
                return check(&response);
            }
            check(&response)?;
            if let Some(path) = render.output.as_deref() {
                write_png(&response, path)?;
            }
            Ok(())
        }
        Command::Request { input } => {
            let raw = read_input(&input)?;
            let dto: RenderRequestDto =
                serde_json::from_str(&raw).context("request document is not valid JSON")?;
            let renderer = Renderer::new(config);
            let response = service::handle(&renderer, &dto);
            print_body(&response)?;
            check(&response)
        }
        Command::Shapes | Command::Fonts | Command::Themes => Ok(()),
    }
}

fn render_dto(args: &RenderArgs, config: &crate::Config) -> Result<RenderRequestDto> {
    let image_data = match args.image.as_deref() {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read image {}", path.display()))?;
            Some(base64::engine::general_purpose::STANDARD.encode(bytes))
        }
        None => None,
    };

    // no explicit destination: keep the render in the output directory
    let save_to_file = args.save.is_some() || (args.output.is_none() && !args.json);

    Ok(RenderRequestDto {
        text: args.text.clone(),
        shape: args.shape.clone(),
        width: args.width.unwrap_or(config.default_width as i64),
        height: args.height.unwrap_or(config.default_height as i64),
        background_color: args
            .background
            .clone()
            .unwrap_or_else(|| config.background.clone()),
        image_data,
        use_image_colors: args.image_colors,
        font_name: args.font.clone(),
        color_theme: args.theme.clone(),
        save_to_file,
        filename: args.save.clone(),
    })
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_body(response: &Response) -> Result<()> {
    println!("{}", serde_json::to_string(&response.body)?);
    Ok(())
}

fn check(response: &Response) -> Result<()> {
    match &response.body {
        ResponseBody::Success { .. } => Ok(()),
        ResponseBody::Failure { error } => {
            Err(anyhow::anyhow!("{} (status {})", error, response.status))
        }
    }
}

fn write_png(response: &Response, path: &Path) -> Result<()> {
    let png = response
        .image_bytes()
        .ok_or_else(|| anyhow::anyhow!("response carries no image"))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, png).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote render");
    Ok(())
}
