use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use aura_contracts::analysis::{
    AnalysisKind, AnalysisRequest, AnalysisResult, ImageRef, Measurements,
};
use aura_contracts::identity::Identity;
use aura_engine::{default_data_dir, SignupDetails, StylistEngine};

#[derive(Debug, Parser)]
#[command(name = "aura-rs", version, about = "Aura styling assistant CLI")]
struct Cli {
    /// Directory for the local store and event log.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Run without the persisted identity (read-style analyses only).
    #[arg(long, global = true)]
    guest: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Log in and persist the session locally.
    Login(LoginArgs),
    /// Register a new account.
    Signup(SignupArgs),
    /// End the session remotely and clear the persisted identity.
    Logout,
    /// Seasonal color analysis from a photo.
    SkinTone(ImageArgs),
    /// Skin condition analysis from a photo.
    Skin(ImageArgs),
    /// Body shape from a photo or a bust/waist/hips triple.
    BodyShape(BodyShapeArgs),
    /// Outfit recommendation for an occasion.
    Outfit(OutfitArgs),
    /// Virtual try-on; polls the synthesis job to completion.
    TryOn(TryOnArgs),
    /// Weather-based outfit suggestions.
    WeatherOutfit(WeatherOutfitArgs),
    /// Outfit suggestions built from a photo of your wardrobe.
    Wardrobe(ImageArgs),
    /// Skin-care routine for a condition label.
    SkinCare(SkinCareArgs),
    /// Fetch the remote profile of the logged-in user.
    Profile,
    /// Update remote account settings.
    Settings(SettingsArgs),
    /// Show the last stored result for an analysis kind.
    Cached(CachedArgs),
}

#[derive(Debug, Parser)]
struct LoginArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    password: String,
    #[arg(long, requires = "longitude")]
    latitude: Option<f64>,
    #[arg(long, requires = "latitude")]
    longitude: Option<f64>,
}

#[derive(Debug, Parser)]
struct SignupArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    #[arg(long)]
    password: String,
}

#[derive(Debug, Parser)]
struct ImageArgs {
    /// Path, URL, or data: reference to the photo.
    #[arg(long)]
    image: String,
}

#[derive(Debug, Parser)]
struct BodyShapeArgs {
    #[arg(long)]
    image: Option<String>,
    #[arg(long, requires_all = ["waist", "hips"])]
    bust: Option<f64>,
    #[arg(long, requires_all = ["bust", "hips"])]
    waist: Option<f64>,
    #[arg(long, requires_all = ["bust", "waist"])]
    hips: Option<f64>,
}

#[derive(Debug, Parser)]
struct OutfitArgs {
    #[arg(long)]
    occasion: String,
    #[arg(long, default_value = "Mild")]
    weather: String,
    #[arg(long, default_value = "Relaxed")]
    mood: String,
}

#[derive(Debug, Parser)]
struct TryOnArgs {
    /// Photo of the person.
    #[arg(long)]
    person: String,
    /// Photo of the garment.
    #[arg(long)]
    garment: String,
}

#[derive(Debug, Parser)]
struct WeatherOutfitArgs {
    #[arg(long)]
    season: String,
    #[arg(long, default_value = "any")]
    gender: String,
}

#[derive(Debug, Parser)]
struct SkinCareArgs {
    /// One of: Normal, Dry, Oily, Acne. Defaults to the last stored skin
    /// analysis of the logged-in user.
    #[arg(long)]
    label: Option<String>,
}

#[derive(Debug, Parser)]
struct SettingsArgs {
    #[arg(long)]
    dark_mode: Option<bool>,
    #[arg(long)]
    notifications: Option<bool>,
}

#[derive(Debug, Parser)]
struct CachedArgs {
    /// One of: skin-tone, skin-condition, body-shape, outfit.
    #[arg(long)]
    kind: String,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("aura-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let mut engine = StylistEngine::new(&data_dir);
    let identity = if cli.guest {
        None
    } else {
        engine.current_identity()
    };

    match cli.command {
        Command::Login(args) => {
            let location = args.latitude.zip(args.longitude);
            let identity = engine.login(&args.username, &args.password, location)?;
            print_json(&json!({
                "logged_in": identity.owner_id,
                "display_name": identity.display_name,
            }))
        }
        Command::Signup(args) => {
            engine.signup(&SignupDetails {
                name: args.name,
                username: args.username,
                email: args.email,
                phone: args.phone,
                password: args.password,
            })?;
            print_json(&json!({ "registered": true }))
        }
        Command::Logout => {
            // The local session is cleared even when the backend is down.
            let remote = engine.logout();
            if let Err(err) = remote {
                eprintln!("aura-rs: remote logout skipped: {err}");
            }
            print_json(&json!({ "logged_out": true }))
        }
        Command::SkinTone(args) => analyze(
            &mut engine,
            identity.as_ref(),
            AnalysisRequest::SkinTone {
                image: ImageRef::new(args.image),
            },
        ),
        Command::Skin(args) => analyze(
            &mut engine,
            identity.as_ref(),
            AnalysisRequest::SkinCondition {
                image: ImageRef::new(args.image),
            },
        ),
        Command::BodyShape(args) => {
            let measurements = match (args.bust, args.waist, args.hips) {
                (Some(bust), Some(waist), Some(hips)) => {
                    Some(Measurements::new(bust, waist, hips))
                }
                _ => None,
            };
            analyze(
                &mut engine,
                identity.as_ref(),
                AnalysisRequest::BodyShape {
                    image: args.image.map(ImageRef::new),
                    measurements,
                },
            )
        }
        Command::Outfit(args) => analyze(
            &mut engine,
            identity.as_ref(),
            AnalysisRequest::OutfitRecommendation {
                occasion: args.occasion,
                weather: args.weather,
                mood: args.mood,
            },
        ),
        Command::TryOn(args) => analyze(
            &mut engine,
            identity.as_ref(),
            AnalysisRequest::TryOnSynthesis {
                person_image: ImageRef::new(args.person),
                garment_image: ImageRef::new(args.garment),
            },
        ),
        Command::WeatherOutfit(args) => {
            let recommendations = engine.weather_outfit(&args.season, &args.gender)?;
            print_json(&json!({ "recommendations": recommendations }))
        }
        Command::Wardrobe(args) => {
            let recommendations = engine.wardrobe_recommendation(&ImageRef::new(args.image))?;
            print_json(&json!({ "recommendations": recommendations }))
        }
        Command::SkinCare(args) => {
            let label = match args.label {
                Some(label) => label,
                None => {
                    let identity =
                        identity.context("pass --label or log in with a stored skin analysis")?;
                    match engine.cached(&identity.owner_id, AnalysisKind::SkinCondition) {
                        Some(entry) => match entry.payload {
                            AnalysisResult::SkinCondition(result) => result.label,
                            _ => "Normal".to_string(),
                        },
                        None => bail!("no stored skin analysis; pass --label"),
                    }
                }
            };
            let plan = aura_engine::skincare::plan_for(&label);
            print_json(&serde_json::to_value(&plan)?)
        }
        Command::Profile => {
            let identity = identity.context("not logged in; run `aura-rs login` first")?;
            let profile = engine.profile(&identity)?;
            print_json(&profile)
        }
        Command::Settings(args) => {
            let identity = identity.context("not logged in; run `aura-rs login` first")?;
            engine.update_settings(&identity, args.dark_mode, args.notifications)?;
            print_json(&json!({ "updated": true }))
        }
        Command::Cached(args) => {
            let identity = identity.context("not logged in; run `aura-rs login` first")?;
            let kind = parse_kind(&args.kind)?;
            match engine.cached(&identity.owner_id, kind) {
                Some(entry) => print_json(&serde_json::to_value(&entry)?),
                None => {
                    println!("no stored {} result for {}", args.kind, identity.owner_id);
                    Ok(1)
                }
            }
        }
    }
}

fn analyze(
    engine: &mut StylistEngine,
    identity: Option<&Identity>,
    request: AnalysisRequest,
) -> Result<i32> {
    let result = engine.analyze(identity, &request)?;
    print_json(&serde_json::to_value(&result)?)
}

fn print_json(value: &serde_json::Value) -> Result<i32> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(0)
}

fn parse_kind(raw: &str) -> Result<AnalysisKind> {
    let kind = match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
        "skin-tone" => AnalysisKind::SkinTone,
        "skin-condition" | "skin" => AnalysisKind::SkinCondition,
        "body-shape" => AnalysisKind::BodyShape,
        "outfit" | "outfit-recommendation" => AnalysisKind::OutfitRecommendation,
        other => bail!("unknown analysis kind '{other}'"),
    };
    Ok(kind)
}
