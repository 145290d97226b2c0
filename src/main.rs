use std::path::PathBuf;

use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use tracing::{error, info};

use tryon_studio::catalog;
use tryon_studio::commands::{self, BackgroundChoice, GalleryAction, GenerateArgs, PoseChoice};
use tryon_studio::config::CONFIG;
use tryon_studio::studio::scene::{GarmentCategory, VariationCount};
use tryon_studio::studio::UploadTarget;
use tryon_studio::utils::logging::init_logging;
use tryon_studio::utils::timing::{complete_command_timer, start_command_timer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Status,
    Generate(GenerateArgs),
    DescribePose(PathBuf),
    DescribeBackground(PathBuf),
    Gallery(GalleryAction),
    Theme(Option<String>),
    Catalog,
    Help,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Generate(_) => "generate",
            Command::DescribePose(_) => "describe-pose",
            Command::DescribeBackground(_) => "describe-background",
            Command::Gallery(_) => "gallery",
            Command::Theme(_) => "theme",
            Command::Catalog => "catalog",
            Command::Help => "help",
        }
    }
}

fn usage() -> &'static str {
    "Usage: tryon-studio <command>\n\
     \n\
     Commands:\n  \
       status\n  \
       generate --face <path> --garment <path> [--category upper|lower|full]\n           \
         (--pose <id> | --pose-text <text> | --pose-image <path> | --inspire-pose)\n           \
         [--background <id> | --background-text <text> | --background-image <path> | --inspire-background]\n           \
         [--variations <1-4>] [--yes] [--save]\n           \
         more than one variation needs --pose-text, --pose-image or --inspire-pose\n  \
       describe-pose <path>\n  \
       describe-background <path>\n  \
       gallery list|delete <index>|clear|export\n  \
       theme [light|dark|toggle]\n  \
       catalog"
}

fn next_value<'a>(args: &'a [String], index: &mut usize, flag: &str) -> Result<&'a str> {
    *index += 1;
    args.get(*index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

fn parse_id(value: &str, flag: &str) -> Result<u32> {
    value
        .parse::<u32>()
        .map_err(|_| anyhow!("Invalid {flag} value: {value}"))
}

fn parse_generate_args(args: &[String]) -> Result<GenerateArgs> {
    let mut face = None;
    let mut garment = None;
    let mut category = GarmentCategory::Upper;
    let mut pose = None;
    let mut background = BackgroundChoice::None;
    let mut variations = VariationCount::MIN;
    let mut auto_approve = false;
    let mut save_to_gallery = false;

    let mut index = 0;
    while index < args.len() {
        let flag = args[index].as_str();
        match flag {
            "--face" => face = Some(PathBuf::from(next_value(args, &mut index, flag)?)),
            "--garment" => garment = Some(PathBuf::from(next_value(args, &mut index, flag)?)),
            "--category" => {
                category = next_value(args, &mut index, flag)?
                    .parse::<GarmentCategory>()
                    .map_err(|err| anyhow!(err))?;
            }
            "--pose" => {
                pose = Some(PoseChoice::Catalog(parse_id(
                    next_value(args, &mut index, flag)?,
                    flag,
                )?));
            }
            "--pose-text" => {
                pose = Some(PoseChoice::Text(next_value(args, &mut index, flag)?.to_string()));
            }
            "--pose-image" => {
                pose = Some(PoseChoice::Image(PathBuf::from(next_value(
                    args, &mut index, flag,
                )?)));
            }
            "--inspire-pose" => pose = Some(PoseChoice::Inspire),
            "--background" => {
                background = BackgroundChoice::Catalog(parse_id(
                    next_value(args, &mut index, flag)?,
                    flag,
                )?);
            }
            "--background-text" => {
                background =
                    BackgroundChoice::Text(next_value(args, &mut index, flag)?.to_string());
            }
            "--background-image" => {
                background = BackgroundChoice::Image(PathBuf::from(next_value(
                    args, &mut index, flag,
                )?));
            }
            "--inspire-background" => background = BackgroundChoice::Inspire,
            "--variations" => {
                let value = next_value(args, &mut index, flag)?;
                variations = value
                    .parse::<u8>()
                    .map_err(|_| anyhow!("Invalid --variations value: {value}"))?;
            }
            "--yes" | "-y" => auto_approve = true,
            "--save" => save_to_gallery = true,
            other => {
                return Err(anyhow!("Unknown generate argument: {other}\n{}", usage()));
            }
        }
        index += 1;
    }

    Ok(GenerateArgs {
        face: face.ok_or_else(|| anyhow!("--face is required"))?,
        garment: garment.ok_or_else(|| anyhow!("--garment is required"))?,
        category,
        pose,
        background,
        variations,
        auto_approve,
        save_to_gallery,
    })
}

fn parse_gallery_action(args: &[String]) -> Result<GalleryAction> {
    match args.first().map(String::as_str) {
        None | Some("list") => Ok(GalleryAction::List),
        Some("delete") => {
            let value = args
                .get(1)
                .ok_or_else(|| anyhow!("Missing index for gallery delete"))?;
            let index = value
                .parse::<usize>()
                .map_err(|_| anyhow!("Invalid gallery index: {value}"))?;
            Ok(GalleryAction::Delete(index))
        }
        Some("clear") => Ok(GalleryAction::Clear),
        Some("export") => Ok(GalleryAction::Export),
        Some(other) => Err(anyhow!("Unknown gallery action: {other}\n{}", usage())),
    }
}

fn single_path(args: &[String], command: &str) -> Result<PathBuf> {
    args.first()
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("{command} needs an image path"))
}

fn parse_command(args: &[String]) -> Result<Command> {
    let Some(name) = args.get(1) else {
        return Ok(Command::Help);
    };
    let rest = &args[2..];
    match name.as_str() {
        "status" => Ok(Command::Status),
        "generate" => Ok(Command::Generate(parse_generate_args(rest)?)),
        "describe-pose" => Ok(Command::DescribePose(single_path(rest, name)?)),
        "describe-background" => Ok(Command::DescribeBackground(single_path(rest, name)?)),
        "gallery" => Ok(Command::Gallery(parse_gallery_action(rest)?)),
        "theme" => Ok(Command::Theme(rest.first().cloned())),
        "catalog" => Ok(Command::Catalog),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => Err(anyhow!("Unknown command: {other}\n{}", usage())),
    }
}

fn print_catalog() {
    println!("Poses:");
    for pose in catalog::MODEL_POSES.iter() {
        println!("  {:>2}  {:<24} {}", pose.id, pose.name, pose.preview_url);
    }
    println!("Backgrounds:");
    for option in catalog::BACKGROUND_OPTIONS.iter() {
        println!("  {:>2}  {:<24} {}", option.id, option.name, option.preview_url);
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Status => println!("{}", commands::run_status().await?),
        Command::Generate(args) => {
            for path in commands::run_generate(args).await? {
                println!("{}", path.display());
            }
        }
        Command::DescribePose(path) => {
            println!("{}", commands::run_describe(UploadTarget::Pose, &path).await?);
        }
        Command::DescribeBackground(path) => {
            println!(
                "{}",
                commands::run_describe(UploadTarget::Background, &path).await?
            );
        }
        Command::Gallery(action) => {
            for line in commands::run_gallery(action).await? {
                println!("{line}");
            }
        }
        Command::Theme(value) => println!("{}", commands::run_theme(value.as_deref())?),
        Command::Catalog => print_catalog(),
        Command::Help => println!("{}", usage()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let _guards = init_logging(&CONFIG);

    let args: Vec<String> = std::env::args().collect();
    let command = parse_command(&args)?;
    info!("Running tryon-studio {}", command.name());

    let mut timer = start_command_timer(command.name(), args.get(2..).unwrap_or_default());
    let result = run(command).await;
    match &result {
        Ok(()) => complete_command_timer(&mut timer, "success", None),
        Err(err) => {
            error!("Command failed: {err:#}");
            complete_command_timer(&mut timer, "error", Some(err.to_string()));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        std::iter::once("tryon-studio")
            .chain(items.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn generate_flags_are_collected() -> Result<()> {
        let command = parse_command(&argv(&[
            "generate",
            "--face",
            "me.jpg",
            "--garment",
            "jeans.png",
            "--category",
            "lower",
            "--pose-text",
            "spinning",
            "--background-text",
            "beach at noon",
            "--variations",
            "2",
            "--yes",
        ]))?;
        let Command::Generate(args) = command else {
            panic!("expected generate");
        };
        assert_eq!(args.face, PathBuf::from("me.jpg"));
        assert_eq!(args.category, GarmentCategory::Lower);
        assert_eq!(args.pose, Some(PoseChoice::Text("spinning".to_string())));
        assert_eq!(
            args.background,
            BackgroundChoice::Text("beach at noon".to_string())
        );
        assert_eq!(args.variations, 2);
        assert!(args.auto_approve);
        assert!(!args.save_to_gallery);
        Ok(())
    }

    #[test]
    fn generate_requires_face_and_garment() {
        let err = parse_command(&argv(&["generate", "--garment", "shirt.png"]))
            .expect_err("face missing");
        assert_eq!(err.to_string(), "--face is required");
        assert!(parse_command(&argv(&["generate", "--face"])).is_err());
    }

    #[test]
    fn gallery_actions_parse() -> Result<()> {
        assert_eq!(
            parse_command(&argv(&["gallery"]))?,
            Command::Gallery(GalleryAction::List)
        );
        assert_eq!(
            parse_command(&argv(&["gallery", "delete", "2"]))?,
            Command::Gallery(GalleryAction::Delete(2))
        );
        assert!(parse_command(&argv(&["gallery", "delete", "x"])).is_err());
        Ok(())
    }

    #[test]
    fn no_arguments_prints_help() -> Result<()> {
        assert_eq!(parse_command(&argv(&[]))?, Command::Help);
        assert!(parse_command(&argv(&["paint"])).is_err());
        Ok(())
    }
}
