// ============================================================================
// matchfit - command-line styling assistant
// ============================================================================
// Usage:
//   matchfit weather London                       Show normalized weather
//   matchfit recommend --occasion "Date Night"    Three outfits for a context
//   matchfit todays-look --location Tokyo         Outfits for today's weather
//   matchfit describe photo.jpg                   Describe the person in a photo
//   matchfit shop --location Paris --style Casual Weather-matched looks
// ============================================================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use matchfit_core::{
    AppConfig, BodyType, Fit, ImageSearchExecutor, InlineImage, LiveBackend, OccasionContext,
    ProfileForm, SessionController, SessionState, Style, WeatherReport, OCCASION_OPTIONS,
};
use tracing::{info, warn};

/// MatchFit styling assistant
#[derive(Parser)]
#[command(name = "matchfit", version, about = "Outfit recommendations for your profile, occasion, and weather")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up and normalize weather for a location
    Weather {
        location: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recommend outfits for an occasion
    Recommend {
        #[command(flatten)]
        profile: ProfileArgs,

        /// Occasion, e.g. one of the built-in options or free text
        #[arg(long, default_value = "Everyday Wear")]
        occasion: String,

        /// Weather description passed to the stylist
        #[arg(long, default_value = "Mild and sunny, about 20°C")]
        weather: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Recommend outfits for today's weather at a location
    TodaysLook {
        #[arg(long)]
        location: String,

        #[command(flatten)]
        profile: ProfileArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Describe the person in a photo
    Describe { image: PathBuf },

    /// Find weather-matched looks via image search
    Shop {
        #[arg(long)]
        location: String,

        #[arg(long, default_value = "Casual")]
        style: Style,
    },

    /// List the built-in profile and occasion options
    Options,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long, default_value = "Average")]
    body_type: BodyType,

    #[arg(long, default_value = "Casual")]
    style: Style,

    /// Comma-separated favorite colors
    #[arg(long, default_value = "")]
    colors: String,

    #[arg(long, default_value = "Comfortable")]
    fit: Fit,

    /// Photo used to describe the person in generated images
    #[arg(long)]
    avatar: Option<PathBuf>,
}

impl ProfileArgs {
    fn form(&self) -> ProfileForm {
        ProfileForm {
            body_type: self.body_type,
            style: self.style,
            colors: ProfileForm::parse_colors(&self.colors),
            fit: self.fit,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// 1-based positions of outfits to render, e.g. --visualize 1,3
    #[arg(long, value_delimiter = ',')]
    visualize: Vec<usize>,

    /// Directory for rendered images
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("matchfit=debug".parse()?)
                .add_directive("matchfit_core=debug".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Weather { location, json } => cmd_weather(&config, &location, json).await,
        Commands::Recommend {
            profile,
            occasion,
            weather,
            output,
        } => {
            let controller = session(&config);
            prepare_profile(&controller, &profile).await?;
            controller
                .submit_context(OccasionContext { occasion, weather })
                .await?;
            finish(&controller, &output).await
        }
        Commands::TodaysLook {
            location,
            profile,
            output,
        } => {
            let controller = session(&config);
            let report = controller.fetch_weather(&location).await?;
            print_weather(&report);
            println!();

            prepare_profile(&controller, &profile).await?;
            controller.todays_look().await?;
            finish(&controller, &output).await
        }
        Commands::Describe { image } => cmd_describe(&config, &image).await,
        Commands::Shop { location, style } => cmd_shop(&config, &location, style).await,
        Commands::Options => {
            cmd_options();
            Ok(())
        }
    }
}

fn session(config: &AppConfig) -> SessionController {
    SessionController::new(Arc::new(LiveBackend::from_config(config)))
}

async fn prepare_profile(controller: &SessionController, profile: &ProfileArgs) -> Result<()> {
    controller.start_session().await?;

    if let Some(path) = &profile.avatar {
        let data_url = read_data_url(path).await?;
        if let Some(description) = controller.set_avatar(Some(data_url)).await? {
            println!("Avatar: {}\n", description);
        }
    }

    controller.submit_profile(profile.form()).await?;
    Ok(())
}

async fn finish(controller: &SessionController, output: &OutputArgs) -> Result<()> {
    print_recommendations(&controller.snapshot().await);

    if output.visualize.is_empty() {
        return Ok(());
    }

    tokio::fs::create_dir_all(&output.out_dir)
        .await
        .with_context(|| format!("Failed to create {}", output.out_dir.display()))?;

    // Each outfit renders independently
    let tasks: Vec<_> = output
        .visualize
        .iter()
        .map(|&position| {
            let controller = controller.clone();
            tokio::spawn(async move {
                let result = match position.checked_sub(1) {
                    Some(index) => controller.visualize_index(index).await,
                    None => Ok(false),
                };
                (position, result)
            })
        })
        .collect();

    for task in tasks {
        let (position, result) = task.await?;
        if let Err(e) = result {
            warn!("Outfit {} was not rendered: {}", position, e);
        }
    }

    let state = controller.snapshot().await;
    for &position in &output.visualize {
        let Some(item) = position.checked_sub(1).and_then(|i| state.recommendations.get(i)) else {
            println!("No outfit at position {}.", position);
            continue;
        };
        match &item.image_url {
            Some(url) => {
                let path = output.out_dir.join(format!("outfit-{}.jpg", position));
                save_image(url, &path).await?;
                println!("Saved '{}' to {}", item.outfit.outfit_name, path.display());
            }
            None => println!("No image for '{}'.", item.outfit.outfit_name),
        }
    }

    if let Some(error) = &state.error {
        println!("\n{}", error);
    }
    Ok(())
}

async fn cmd_weather(config: &AppConfig, location: &str, json: bool) -> Result<()> {
    let controller = session(config);
    let report = controller.fetch_weather(location).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_weather(&report);
    }
    Ok(())
}

async fn cmd_describe(config: &AppConfig, image: &Path) -> Result<()> {
    let controller = session(config);
    let data_url = read_data_url(image).await?;
    if let Some(description) = controller.set_avatar(Some(data_url)).await? {
        println!("{}", description);
    }
    Ok(())
}

async fn cmd_shop(config: &AppConfig, location: &str, style: Style) -> Result<()> {
    let controller = session(config);
    let report = controller.fetch_weather(location).await?;
    print_weather(&report);
    println!();

    let search = ImageSearchExecutor::from_config(config)?;
    let looks = search.search_for_weather(style.label(), &report).await?;

    println!("{:<10}  {:<24}  {}", "ID", "NAME", "IMAGE");
    println!("{}", "-".repeat(90));
    for look in &looks {
        println!("{:<10}  {:<24}  {}", look.id, look.name, look.image_url);
    }
    println!("\nTotal: {} looks", looks.len());
    Ok(())
}

fn cmd_options() {
    println!("Body types: {}", join_labels(BodyType::ALL.iter().map(|b| b.label())));
    println!("Styles:     {}", join_labels(Style::ALL.iter().map(|s| s.label())));
    println!("Fits:       {}", join_labels(Fit::ALL.iter().map(|f| f.label())));
    println!("Occasions:  {}", join_labels(OCCASION_OPTIONS.iter().copied()));
}

fn join_labels<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    labels.collect::<Vec<_>>().join(", ")
}

fn print_weather(report: &WeatherReport) {
    println!("=== Weather for {} ===", report.location);
    println!("Condition:  {}", report.condition);
    println!("Temp:       {}°C (feels like {}°C)", report.temperature, report.feels_like);
    println!("Humidity:   {}%", report.humidity);
    println!("Wind:       {} km/h", report.wind_speed);
    println!("Rain:       {}%", report.rain);
    println!("{}", report.summary);
}

fn print_recommendations(state: &SessionState) {
    println!("=== {} | {} ===", state.context.occasion, state.context.weather);

    if state.recommendations.is_empty() {
        match &state.error {
            Some(error) => println!("{}", error),
            None => println!("No recommendations."),
        }
        return;
    }

    for (i, item) in state.recommendations.iter().enumerate() {
        println!("\n{}. {}", i + 1, item.outfit.outfit_name);
        println!("   {}", item.outfit.description);
        for piece in &item.outfit.items {
            println!("   - {}: {}", piece.name, piece.description);
        }
    }
    println!();
}

/// Read an image file into a data URL
async fn read_data_url(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mime_type = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    };

    info!("Loaded {} ({} bytes, {})", path.display(), bytes.len(), mime_type);
    Ok(InlineImage::from_bytes(mime_type, &bytes).to_data_url())
}

async fn save_image(data_url: &str, path: &Path) -> Result<()> {
    let bytes = InlineImage::from_data_url(data_url)?.decode()?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
