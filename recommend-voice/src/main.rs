use anyhow::{Context, Result};
use clap::Parser;
use llm_client::{Config, get_provider_with_fallback};
use recommend_voice::{RecommendSuitableVoiceInput, VoiceConfig, VoiceRecommender};
use std::io::{self, IsTerminal, Read};

const PROGRAM_NAME: &str = "recommend-voice";

#[derive(Parser, Debug)]
#[command(
    name = "recommend-voice",
    version,
    about = "Recommend a synthetic voice for a piece of text",
    long_about = "Asks an LLM which of the configured voices best suits the given text, and why"
)]
struct Args {
    /// LLM preset to use (see ~/.config/cli-programs/llm.toml)
    #[arg(long)]
    preset: Option<String>,

    /// Comma-separated list of voices to choose from
    #[arg(long, value_delimiter = ',')]
    voices: Option<Vec<String>>,

    /// Fail if the model recommends a voice that isn't in the list
    #[arg(long)]
    strict: bool,

    /// Print the recommendation as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the rendered prompt without calling the LLM
    #[arg(long)]
    dry_run: bool,

    /// The text to recommend a voice for (read from stdin if omitted)
    #[arg(trailing_var_arg = true)]
    text: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = load_voice_config(&args)?;
    let text = read_text(&args)?;
    let input = RecommendSuitableVoiceInput { text };

    let recommender = VoiceRecommender::new(config)?;

    if args.dry_run {
        println!("{}", recommender.render(&input)?);
        return Ok(());
    }

    let llm_config = Config::load().context("Failed to load LLM configuration")?;
    let preset_name = args
        .preset
        .as_deref()
        .or(recommender.config().preset.as_deref())
        .unwrap_or_else(|| llm_config.get_default_for_program(PROGRAM_NAME));

    let provider = get_provider_with_fallback(&llm_config, preset_name).with_context(|| {
        format!("Failed to initialize LLM provider for preset '{}'", preset_name)
    })?;
    log::debug!(
        "Using LLM provider: {} (presets: {})",
        provider.primary_name(),
        provider.preset_names().join(" -> ")
    );

    let output = recommender
        .recommend(&provider, &input)
        .await
        .context("Voice recommendation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Voice: {}", output.voice_recommendation);
        println!("Reason: {}", output.reason);
    }

    Ok(())
}

fn load_voice_config(args: &Args) -> Result<VoiceConfig> {
    let mut config = VoiceConfig::load().context("Failed to load recommend-voice configuration")?;

    if let Some(voices) = &args.voices {
        config.allowed_voices = voices.iter().map(|v| v.trim().to_string()).collect();
    }
    if args.strict {
        config.strict = true;
    }

    config.validate()?;
    Ok(config)
}

/// Text comes from the arguments, or from stdin when nothing was given and
/// input is piped. An empty text is allowed.
fn read_text(args: &Args) -> Result<String> {
    if !args.text.is_empty() {
        return Ok(args.text.join(" "));
    }

    if io::stdin().is_terminal() {
        return Ok(String::new());
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read piped input")?;
    Ok(buffer.trim_end_matches(['\r', '\n']).to_string())
}
