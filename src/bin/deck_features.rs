use std::env;
use std::fs;

use decksignal::{
    DeckLite, EngineConfig, build_features_with, compress_lands_with, feature_vector_schema,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Features,
    Lands,
    Schema,
}

#[derive(Debug)]
struct Args {
    deck_path: Option<String>,
    config_path: Option<String>,
    output: Output,
    pretty: bool,
}

fn usage() -> &'static str {
    "usage: deck_features --deck <deck.json> [--lands] [--config <config.json>] [--pretty]\n       deck_features --schema [--pretty]"
}

fn parse_args() -> Result<Args, String> {
    let mut deck_path = None;
    let mut config_path = None;
    let mut output = Output::Features;
    let mut pretty = false;

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--deck" => {
                deck_path = Some(
                    iter.next()
                        .ok_or_else(|| "--deck requires a path".to_string())?,
                );
            }
            "--config" => {
                config_path = Some(
                    iter.next()
                        .ok_or_else(|| "--config requires a path".to_string())?,
                );
            }
            "--lands" => output = Output::Lands,
            "--schema" => output = Output::Schema,
            "--pretty" => pretty = true,
            "-h" | "--help" => return Err(usage().to_string()),
            other => return Err(format!("unknown argument '{other}'\n{}", usage())),
        }
    }

    if output != Output::Schema && deck_path.is_none() {
        return Err(format!("--deck is required\n{}", usage()));
    }

    Ok(Args {
        deck_path,
        config_path,
        output,
        pretty,
    })
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args().map_err(std::io::Error::other)?;

    if args.output == Output::Schema {
        println!("{}", render(&feature_vector_schema(), args.pretty)?);
        return Ok(());
    }

    let config = match &args.config_path {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let deck_path = args
        .deck_path
        .as_deref()
        .ok_or_else(|| std::io::Error::other("--deck is required"))?;
    let deck: DeckLite = serde_json::from_str(&fs::read_to_string(deck_path)?)?;
    info!(deck = %deck.id, entries = deck.deck_cards.len(), "loaded deck");

    let rendered = match args.output {
        Output::Lands => render(&compress_lands_with(&deck, &config)?, args.pretty)?,
        _ => render(&build_features_with(&deck, &config)?, args.pretty)?,
    };
    println!("{rendered}");
    Ok(())
}
