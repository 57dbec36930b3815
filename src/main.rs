// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! CLI entry point for shortcut-remap
//!
//! Provides a command-line interface for checking duplicate bindings,
//! listing bindings, decomposing composites and moving user bindings in and
//! out of the shortcut asset store.

use clap::{Parser, Subcommand};
use colored::*;
use shortcut_remap::config::{
    self, read_action_asset, write_action_asset, AssetStore, DataAsset, JsonAssetStore, RebindSettings,
    ShortcutBindingsAsset, DEFAULT_ASSET_TITLE,
};
use shortcut_remap::core::{
    decompose_asset, devices::read_human_path, ActionAsset, ActionMapLinks, ControlSchemes,
    DeviceType, DuplicateFinder, LookupError,
};
use shortcut_remap::logging::{self, LogConfig};
use std::path::{Path, PathBuf};

const DEVICE_SLOTS: [(DeviceType, bool); 4] = [
    (DeviceType::Keyboard, false),
    (DeviceType::Keyboard, true),
    (DeviceType::Gamepad, false),
    (DeviceType::Gamepad, true),
];

#[derive(Parser)]
#[command(name = "shortcut-remap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log this crate's activity at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Rebind settings file (JSON)
    #[arg(short, long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every device binding for duplicates
    Check {
        /// Path to the action asset file
        #[arg(short, long)]
        actions: PathBuf,

        /// Path to the action map link table
        #[arg(short, long)]
        links: Option<PathBuf>,
    },

    /// List the device bindings of every action
    List {
        /// Path to the action asset file
        #[arg(short, long)]
        actions: PathBuf,
    },

    /// Split flexible composites into plain and fixed-modifier bindings
    Decompose {
        /// Path to the action asset file
        #[arg(short, long)]
        actions: PathBuf,

        /// Where to write the result (defaults to the input file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Save the current bindings into the shortcut asset store
    Export {
        /// Path to the action asset file
        #[arg(short, long)]
        actions: PathBuf,

        /// Shortcut asset store directory
        #[arg(short, long, default_value = "~/.config/shortcut-remap")]
        dir: PathBuf,

        /// Title of the saved shortcut asset
        #[arg(short, long, default_value = DEFAULT_ASSET_TITLE)]
        title: String,
    },

    /// Apply a saved shortcut asset to the action asset file
    Import {
        /// Path to the action asset file
        #[arg(short, long)]
        actions: PathBuf,

        /// Shortcut asset store directory
        #[arg(short, long, default_value = "~/.config/shortcut-remap")]
        dir: PathBuf,

        /// Title of the shortcut asset to apply
        #[arg(short, long, default_value = DEFAULT_ASSET_TITLE)]
        title: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A second initialisation only fails; logging stays usable
    let _ = logging::init(LogConfig { verbose: cli.verbose });

    let settings = match &cli.settings {
        Some(path) => RebindSettings::load(&expand(path)?)?,
        None => RebindSettings::default(),
    };
    let schemes = settings.control_schemes();

    match cli.command {
        Commands::Check { actions, links } => check_duplicates(&actions, links.as_deref(), &schemes)?,
        Commands::List { actions } => list_bindings(&actions, &schemes)?,
        Commands::Decompose { actions, output } => decompose(&actions, output.as_deref())?,
        Commands::Export { actions, dir, title } => export(&actions, &dir, &title, &schemes)?,
        Commands::Import { actions, dir, title } => import(&actions, &dir, &title, &schemes)?,
    }

    Ok(())
}

/// Expands a leading `~` in a path argument.
fn expand(path: &Path) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::tilde(
        path.to_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid path encoding"))?,
    );
    Ok(PathBuf::from(expanded.as_ref()))
}

fn load_actions(path: &Path) -> anyhow::Result<(PathBuf, ActionAsset)> {
    let path = expand(path)?;
    let asset = read_action_asset(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read action asset: {}", e))?;
    Ok((path, asset))
}

/// Check every action's device bindings for duplicates
fn check_duplicates(actions_path: &Path, links_path: Option<&Path>, schemes: &ControlSchemes) -> anyhow::Result<()> {
    let (path, asset) = load_actions(actions_path)?;
    let links = match links_path {
        Some(links_path) => config::load_links(&expand(links_path)?)?,
        None => ActionMapLinks::default(),
    };

    println!("{} Checking bindings: {}", "→".cyan(), path.display());

    let finder = DuplicateFinder::new(&asset, &links);
    let duplicates = finder.find_device_duplicates(&asset.action_refs(), schemes)?;

    if duplicates.is_empty() {
        println!("{} {}", "✓".green().bold(), "No duplicate bindings detected!".bold());
        return Ok(());
    }

    println!(
        "{} Found {} duplicate{}:\n",
        "✗".red().bold(),
        duplicates.len(),
        if duplicates.len() == 1 { "" } else { "s" }
    );

    for (i, found) in duplicates.iter().enumerate() {
        println!(
            "{} {}",
            format!("Duplicate {}", i + 1).yellow().bold(),
            found.combination.to_string().cyan()
        );
        println!("  {} {}", "1.".dimmed(), found.action.to_string().magenta());
        println!("  {} {}", "2.".dimmed(), found.duplicate.action.to_string().magenta());
        println!();
    }

    println!("{}", "⚠ These actions will fire together at runtime!".yellow());
    std::process::exit(1);
}

/// List the human-readable paths of every action
fn list_bindings(actions_path: &Path, schemes: &ControlSchemes) -> anyhow::Result<()> {
    let (path, asset) = load_actions(actions_path)?;

    println!("{}", format!("Bindings from: {}\n", path.display()).bold());

    let action_refs = asset.action_refs();
    for action_ref in &action_refs {
        let mut columns = Vec::new();
        for (device, alternate) in DEVICE_SLOTS {
            let label = if alternate { format!("{} alt", device) } else { device.to_string() };
            let value = match read_human_path(&asset, action_ref, device, schemes, alternate) {
                Ok(human) if human.is_empty() => "-".to_string(),
                Ok(human) => human,
                Err(LookupError::NoBindingForDevice { .. }) => continue,
                Err(e) => return Err(e.into()),
            };
            columns.push(format!("{}: {}", label.dimmed(), value.green()));
        }

        println!("{} → {}", action_ref.to_string().cyan().bold(), columns.join("  "));
    }

    println!("\n{} Total: {} actions", "✓".green(), action_refs.len());

    Ok(())
}

/// Split flexible composites into plain, one-modifier and two-modifier bindings
fn decompose(actions_path: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let (path, mut asset) = load_actions(actions_path)?;
    let output = match output {
        Some(output) => expand(output)?,
        None => path,
    };

    let converted = decompose_asset(&mut asset);
    write_action_asset(&output, &asset)?;

    println!(
        "{} Converted {} binding{} → {}",
        "✓".green(),
        converted,
        if converted == 1 { "" } else { "s" },
        output.display()
    );

    Ok(())
}

fn export(actions_path: &Path, dir: &Path, title: &str, schemes: &ControlSchemes) -> anyhow::Result<()> {
    let (_, asset) = load_actions(actions_path)?;
    let mut store = JsonAssetStore::new(expand(dir)?)?;

    // Re-saving a title keeps its id and the entries of actions not captured now
    let existing = store.load_all()?.into_iter().find(|a| a.title() == title);
    let builder = match &existing {
        Some(existing) => ShortcutBindingsAsset::builder().as_copy(existing).with_id(existing.id()),
        None => ShortcutBindingsAsset::builder().with_id(&uuid::Uuid::new_v4().to_string()),
    }
    .with_title(title);

    let shortcuts = config::capture(&asset, builder, &asset.action_refs(), schemes)?;
    let saved = store.save(&shortcuts)?;

    println!("{} Saved '{}' → {}", "✓".green(), shortcuts, saved.display());

    Ok(())
}

fn import(actions_path: &Path, dir: &Path, title: &str, schemes: &ControlSchemes) -> anyhow::Result<()> {
    let (path, mut asset) = load_actions(actions_path)?;
    let mut store = JsonAssetStore::new(expand(dir)?)?;

    let shortcuts = store
        .load_all()?
        .into_iter()
        .find(|a| a.title() == title)
        .ok_or_else(|| anyhow::anyhow!("No saved shortcuts titled '{}'", title))?;

    let action_refs = asset.action_refs();
    let applied = config::apply(&mut asset, &shortcuts, &action_refs, schemes)?;
    write_action_asset(&path, &asset)?;

    println!(
        "{} Applied {} binding{} from '{}' → {}",
        "✓".green(),
        applied,
        if applied == 1 { "" } else { "s" },
        shortcuts,
        path.display()
    );

    Ok(())
}
