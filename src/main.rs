use anyhow::{bail, Context};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use photomark::batch::{render_all, BatchJob};
use photomark::config::AppConfig;
use photomark::export::save;
use photomark::session::load_rgba;
use photomark::templates::TemplateStore;
use photomark::watermark::{
    config::{default_font_size, default_scale},
    Color, Configuration, FontResolver, FsOverlayStore, GridPreset, ImageSpec, RotationAngle,
    TextSpec, WatermarkEngine,
};

/// Photomark - add text and image watermarks to photos
#[derive(Parser, Debug)]
#[command(name = "photomark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: photomark.yaml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watermark one image
    Render {
        input: PathBuf,

        /// Output file; the extension selects the format
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        watermark: WatermarkArgs,
    },

    /// Watermark several images in parallel
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        #[arg(long)]
        out_dir: PathBuf,

        /// File name prefix (default from config)
        #[arg(long)]
        prefix: Option<String>,

        /// File name suffix (default from config)
        #[arg(long)]
        suffix: Option<String>,

        #[command(flatten)]
        watermark: WatermarkArgs,
    },

    /// Manage stored templates
    Template {
        #[command(subcommand)]
        action: TemplateCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TemplateCommand {
    /// List template names
    List,
    /// Print a template as JSON
    Show { name: String },
    /// Save the given watermark options as a new template
    Save {
        name: String,
        #[command(flatten)]
        watermark: WatermarkArgs,
    },
    /// Delete a template
    Delete { name: String },
}

#[derive(ClapArgs, Debug, Default)]
struct WatermarkArgs {
    /// Start from a stored template; other options override it
    #[arg(long)]
    template: Option<String>,

    /// Watermark text
    #[arg(long)]
    text: Option<String>,

    /// Font size in pixels, 10-200
    #[arg(long)]
    font_size: Option<u32>,

    /// Text colour: #RGB, #RRGGBB or #RRGGBBAA
    #[arg(long)]
    color: Option<Color>,

    /// Overlay image path
    #[arg(long)]
    overlay: Option<String>,

    /// Overlay width relative to the base width, (0, 1]
    #[arg(long)]
    scale: Option<f32>,

    /// Grid position, e.g. bottom-right
    #[arg(long)]
    position: Option<GridPreset>,

    /// Manual x coordinate (overrides the grid position)
    #[arg(long, requires = "y", allow_hyphen_values = true)]
    x: Option<i32>,

    /// Manual y coordinate
    #[arg(long, requires = "x", allow_hyphen_values = true)]
    y: Option<i32>,

    /// Counter-clockwise rotation in degrees, 0-360
    #[arg(long)]
    angle: Option<i32>,
}

impl WatermarkArgs {
    /// Build a configuration from the flags, on top of `--template` if given.
    fn build(&self, store: &TemplateStore) -> anyhow::Result<Configuration> {
        let mut config = match &self.template {
            Some(name) => store
                .get(name)
                .cloned()
                .with_context(|| format!("Template '{}' not found", name))?,
            None => Configuration::default(),
        };

        let existing_text = config.text().cloned();
        if self.text.is_some() || self.font_size.is_some() || self.color.is_some() {
            let content = match (&self.text, &existing_text) {
                (Some(text), _) => text.clone(),
                (None, Some(existing)) => existing.content().to_string(),
                (None, None) => bail!("--font-size and --color need --text"),
            };
            let font_size = self
                .font_size
                .or(existing_text.as_ref().map(TextSpec::font_size))
                .unwrap_or_else(default_font_size);
            let color = self
                .color
                .or(existing_text.as_ref().map(TextSpec::color))
                .unwrap_or_else(Color::white);
            config = config.with_text(TextSpec::new(content, font_size, color)?);
        }

        let existing_image = config.image().cloned();
        if self.overlay.is_some() || self.scale.is_some() {
            let overlay = match (&self.overlay, &existing_image) {
                (Some(overlay), _) => overlay.clone(),
                (None, Some(existing)) => existing.overlay().to_string(),
                (None, None) => bail!("--scale needs --overlay"),
            };
            let scale = self
                .scale
                .or(existing_image.as_ref().map(ImageSpec::scale))
                .unwrap_or_else(default_scale);
            config = config.with_image(ImageSpec::new(overlay, scale)?);
        }

        if let Some(preset) = self.position {
            config = config.with_preset(preset);
        }
        if let (Some(x), Some(y)) = (self.x, self.y) {
            config = config.with_manual_point(x, y);
        }
        if let Some(angle) = self.angle {
            config = config.with_angle(RotationAngle::new(angle)?);
        }

        Ok(config)
    }
}

fn build_engine(config: &AppConfig) -> WatermarkEngine {
    WatermarkEngine::new(
        Arc::new(FontResolver::load(&config.fonts.preferred)),
        Arc::new(FsOverlayStore::new()),
    )
}

fn run_render(
    app: &AppConfig,
    store: &TemplateStore,
    input: &Path,
    output: &Path,
    watermark: &WatermarkArgs,
) -> anyhow::Result<()> {
    let config = watermark.build(store)?;
    let engine = build_engine(app);
    let base = load_rgba(input)?;

    let rendered = engine.render(Some(&base), &config)?;
    save(&rendered, output, &app.export.options()?)
        .with_context(|| format!("Failed to export {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn run_batch(
    app: &AppConfig,
    store: &TemplateStore,
    inputs: &[PathBuf],
    job: BatchJob,
    watermark: &WatermarkArgs,
) -> anyhow::Result<()> {
    let config = watermark.build(store)?;
    let engine = build_engine(app);

    std::fs::create_dir_all(&job.out_dir)
        .with_context(|| format!("Failed to create {}", job.out_dir.display()))?;

    let outcomes = render_all(&engine, &config, inputs, &job);
    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(path) => println!("{}", path.display()),
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", outcome.source.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} images failed", failed, outcomes.len());
    }
    Ok(())
}

fn run_template(store: &mut TemplateStore, action: &TemplateCommand) -> anyhow::Result<()> {
    match action {
        TemplateCommand::List => {
            for name in store.names() {
                println!("{}", name);
            }
        }
        TemplateCommand::Show { name } => {
            let template = store
                .get(name)
                .with_context(|| format!("Template '{}' not found", name))?;
            println!("{}", serde_json::to_string_pretty(template)?);
        }
        TemplateCommand::Save { name, watermark } => {
            let config = watermark.build(store)?;
            store.insert(name, config)?;
            store.save()?;
        }
        TemplateCommand::Delete { name } => {
            store.remove(name)?;
            store.save()?;
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let app = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    photomark::logging::init_subscriber(&app.logging)?;

    tracing::debug!(
        config_file = ?args.config,
        font = %app.fonts.preferred.display(),
        templates = %app.templates.path.display(),
        "Configuration loaded successfully"
    );

    let mut store = TemplateStore::load(&app.templates.path);

    match &args.command {
        Command::Render {
            input,
            output,
            watermark,
        } => run_render(&app, &store, input, output, watermark),
        Command::Batch {
            inputs,
            out_dir,
            prefix,
            suffix,
            watermark,
        } => {
            let job = BatchJob {
                out_dir: out_dir.clone(),
                prefix: prefix.clone().unwrap_or_else(|| app.export.prefix.clone()),
                suffix: suffix.clone().unwrap_or_else(|| app.export.suffix.clone()),
                export: app.export.options()?,
            };
            run_batch(&app, &store, inputs, job, watermark)
        }
        Command::Template { action } => run_template(&mut store, action),
    }
}
