use std::path::{Path, PathBuf};

use anamnese_core::config::tag_namespace_from_env_value;
use anamnese_core::constants::{
    DEFAULT_TAG_KEY, ENV_MATCHING_CONFIG, ENV_TAG_NAMESPACE, ENV_TAG_STORE_DIR,
};
use anamnese_core::{
    answers_from_json, AppliedTagSet, Answers, CoreConfig, EvaluationService, FileTagStore, Tag,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "anamnese")]
#[command(about = "Evaluate intake questionnaire answers against tag, diagnostic and plan rules")]
struct Cli {
    /// Matching configuration document (.yaml, .yml or .json)
    #[arg(long, env = ENV_MATCHING_CONFIG)]
    config: Option<PathBuf>,
    /// Directory for stored tag records
    #[arg(long, env = ENV_TAG_STORE_DIR)]
    store_dir: Option<PathBuf>,
    /// Namespace for stored tag records
    #[arg(long, env = ENV_TAG_NAMESPACE)]
    namespace: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tags extracted from an answers file
    Tags {
        /// JSON object of question id to answer
        answers: PathBuf,
    },
    /// Run the full evaluation for an answers file
    Evaluate {
        /// JSON object of question id to answer
        answers: PathBuf,
        /// Store the applied tags under this key (requires --store-dir)
        #[arg(long)]
        key: Option<String>,
    },
    /// Print the diagnostic rule selected by a tag list
    Diagnose {
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Print the plans matched by a tag list
    Plans {
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Validate the matching configuration
    CheckConfig,
    /// Print the tags stored under a key
    ShowTags {
        #[arg(long, default_value = DEFAULT_TAG_KEY)]
        key: String,
    },
}

fn applied_from_args(tags: Vec<String>) -> AppliedTagSet {
    tags.into_iter()
        .filter(|tag| !tag.is_empty())
        .map(Tag::from)
        .collect()
}

fn read_answers(path: &Path) -> anyhow::Result<Answers> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read answers file {}", path.display()))?;
    let answers = answers_from_json(&contents)
        .with_context(|| format!("invalid answers file {}", path.display()))?;
    Ok(answers)
}

fn open_store(core: &CoreConfig) -> anyhow::Result<FileTagStore> {
    core.open_tag_store()?.with_context(|| {
        format!("a tag store directory is required (--store-dir or {ENV_TAG_STORE_DIR})")
    })
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("anamnese=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'anamnese --help' for commands");
        return Ok(());
    };

    let config_path = cli.config.with_context(|| {
        format!("a matching configuration is required (--config or {ENV_MATCHING_CONFIG})")
    })?;
    let namespace = tag_namespace_from_env_value(cli.namespace);
    let core = CoreConfig::new(config_path, cli.store_dir, namespace)?;
    let service = EvaluationService::new(core.load_matching_config()?);

    match command {
        Commands::Tags { answers } => {
            let applied = service.extract_tags(&read_answers(&answers)?);
            println!("{}", serde_json::to_string_pretty(&applied)?);
        }
        Commands::Evaluate { answers, key } => {
            let answers = read_answers(&answers)?;
            let evaluation = match key {
                Some(key) => {
                    let store = open_store(&core)?;
                    let key = core.store_key(&key)?;
                    let evaluation = service.evaluate_and_store(&answers, &store, &key)?;
                    tracing::info!(key = %key, "stored applied tags");
                    evaluation
                }
                None => service.evaluate(&answers),
            };
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
        }
        Commands::Diagnose { tags } => {
            let applied = applied_from_args(tags);
            match service.find_diagnostic(&applied) {
                Some(rule) => match &rule.name {
                    Some(name) => println!("{} ({})", rule.id, name),
                    None => println!("{}", rule.id),
                },
                None => println!("none"),
            }
        }
        Commands::Plans { tags } => {
            let applied = applied_from_args(tags);
            let plans = service.find_plans(&applied);
            if plans.is_empty() {
                println!("No plans matched.");
            } else {
                for plan in plans {
                    let matched: Vec<&str> = plan
                        .matched_tags(&applied)
                        .into_iter()
                        .map(Tag::as_str)
                        .collect();
                    println!("{} [{}]", plan.plan_id, matched.join(", "));
                }
            }
        }
        Commands::CheckConfig => {
            let config = service.config();
            println!(
                "OK: {} questions, {} diagnostic rules ({} active), {} plans",
                config.question_mappings.len(),
                config.diagnostic_rules.len(),
                config.active_rule_count(),
                config.plans.len()
            );
        }
        Commands::ShowTags { key } => {
            let store = open_store(&core)?;
            let key = core.store_key(&key)?;
            match store.get_record(&key)? {
                Some(record) => {
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
                None => println!("No tags stored under {}", key),
            }
        }
    }

    Ok(())
}
