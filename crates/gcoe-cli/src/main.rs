//! GCOE - Global Compliance Orchestration Engine CLI
//!
//! The `gcoe` command assesses a business profile across jurisdictions.
//!
//! ## Commands
//!
//! - `assess`: Run a full assessment and print the report
//! - `jurisdictions`: List registered jurisdictions and accepted aliases
//! - `synergies`: Print the built-in synergy table
//! - `config`: Print the effective engine configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

use gcoe_core::{
    render_report_md, BusinessProfile, ComplianceEngine, EngineConfig, JurisdictionId,
    ProviderRegistry, SynergyBonus, SynergyTable, METRICS,
};
use gcoe_providers::{registry_from_rulebooks, standard_registry, Rulebook};

#[derive(Parser)]
#[command(name = "gcoe")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Global Compliance Orchestration Engine (GCOE)", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Engine configuration file (JSON)
    #[arg(long, global = true, env = "GCOE_CONFIG")]
    config: Option<PathBuf>,

    /// Rulebook overrides (JSON array), replacing built-ins per jurisdiction
    #[arg(long, global = true, env = "GCOE_RULEBOOKS")]
    rulebooks: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assess a business profile and print the global report
    Assess {
        /// Business profile file (JSON)
        #[arg(short, long)]
        profile: PathBuf,

        /// Jurisdictions to assess, overriding the profile's own list
        #[arg(short, long, value_delimiter = ',')]
        jurisdiction: Vec<String>,

        /// Print the report as JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },

    /// List registered jurisdictions and their aliases
    Jurisdictions {
        #[arg(long)]
        json: bool,
    },

    /// Print the built-in synergy table
    Synergies {
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    gcoe_core::init_tracing(cli.json_logs, level);

    let config = load_config(cli.config.as_deref())?;
    let registry = load_registry(cli.rulebooks.as_deref())?;

    let output = match cli.command {
        Commands::Assess {
            profile,
            jurisdiction,
            json,
        } => cmd_assess(registry, config, &profile, &jurisdiction, json).await?,
        Commands::Jurisdictions { json } => cmd_jurisdictions(&registry, json)?,
        Commands::Synergies { json } => cmd_synergies(&SynergyTable::standard(), json)?,
        Commands::Config => serde_json::to_string_pretty(&config)?,
    };
    println!("{output}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn load_registry(rulebooks: Option<&Path>) -> Result<ProviderRegistry> {
    match rulebooks {
        Some(path) => {
            let overrides = Rulebook::list_from_json_file(path)
                .with_context(|| format!("load rulebooks {}", path.display()))?;
            Ok(registry_from_rulebooks(
                Rulebook::standard().into_iter().chain(overrides),
            ))
        }
        None => Ok(standard_registry()),
    }
}

fn load_profile(path: &Path, jurisdictions: &[String]) -> Result<BusinessProfile> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut profile: BusinessProfile =
        serde_json::from_str(&raw).with_context(|| format!("parse profile {}", path.display()))?;
    if !jurisdictions.is_empty() {
        profile.jurisdictions = jurisdictions.iter().map(JurisdictionId::new).collect();
    }
    Ok(profile)
}

async fn cmd_assess(
    registry: ProviderRegistry,
    config: EngineConfig,
    profile_path: &Path,
    jurisdictions: &[String],
    json: bool,
) -> Result<String> {
    let profile = load_profile(profile_path, jurisdictions)?;
    info!(company = %profile.company_name, "assessing profile");

    let engine = ComplianceEngine::new(Arc::new(registry), config);
    let report = engine
        .assess(&profile)
        .await
        .context("assessment request rejected")?;
    METRICS.flush();

    if json {
        Ok(report.to_json_pretty()?)
    } else {
        Ok(render_report_md(&report))
    }
}

#[derive(Serialize)]
struct JurisdictionListing {
    jurisdiction: String,
    aliases: Vec<String>,
}

fn cmd_jurisdictions(registry: &ProviderRegistry, json: bool) -> Result<String> {
    let listing: Vec<JurisdictionListing> = registry
        .jurisdictions()
        .into_iter()
        .map(|id| JurisdictionListing {
            aliases: JurisdictionId::known_aliases()
                .find(|(canonical, _)| *canonical == id.as_str())
                .map(|(_, aliases)| aliases.iter().map(|a| a.to_string()).collect())
                .unwrap_or_default(),
            jurisdiction: id.to_string(),
        })
        .collect();

    if json {
        return Ok(serde_json::to_string_pretty(&listing)?);
    }
    let lines: Vec<String> = listing
        .iter()
        .map(|l| {
            if l.aliases.is_empty() {
                l.jurisdiction.clone()
            } else {
                format!("{:<4} {}", l.jurisdiction, l.aliases.join(", "))
            }
        })
        .collect();
    Ok(lines.join("\n"))
}

#[derive(Serialize)]
struct SynergyListing<'a> {
    pair: String,
    bonus: &'a SynergyBonus,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    complexity_discount: f64,
    rationale: &'a str,
}

fn cmd_synergies(table: &SynergyTable, json: bool) -> Result<String> {
    let listing: Vec<SynergyListing<'_>> = table
        .iter()
        .map(|(pair, rule)| SynergyListing {
            pair: pair.to_string(),
            bonus: &rule.bonus,
            group: rule.group.as_deref(),
            complexity_discount: rule.complexity_discount,
            rationale: &rule.rationale,
        })
        .collect();

    if json {
        return Ok(serde_json::to_string_pretty(&listing)?);
    }
    let lines: Vec<String> = listing
        .iter()
        .map(|s| {
            let bonus = match s.bonus {
                SynergyBonus::RevenueShare { rate } => format!("{:.1}% of revenue", rate * 100.0),
                SynergyBonus::ProfitShare { rate } => format!("{:.1}% of profit", rate * 100.0),
                SynergyBonus::Flat { amount } => format!("{amount:.0} flat"),
            };
            format!(
                "{:<6} {:<18} x{:.2}  {}",
                s.pair, bonus, s.complexity_discount, s.rationale
            )
        })
        .collect();
    Ok(lines.join("\n"))
}
