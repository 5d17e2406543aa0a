use std::{path::Path, process};

use axum::http::HeaderMap;
use serde_json::json;
use tessera::{
    config::{self, Command, HeadersArgs, KeysArgs, Settings},
    error::AppError,
    middleware::HeaderState,
    surrogate::{QuerySnapshot, SurrogateKeyCollection, SurrogateKeyCollector, TaxonomyFilter},
    telemetry,
};
use tracing::{Dispatch, Level, debug, dispatcher, error, instrument};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Command::Headers(args) => run_headers(&settings, args).await,
        Command::Keys(args) => run_keys(&settings, args).await,
    }
}

#[instrument(skip_all, fields(snapshot = %args.snapshot.display()))]
async fn run_headers(settings: &Settings, args: HeadersArgs) -> Result<(), AppError> {
    let snapshot = read_snapshot(&args.snapshot).await?;
    let keys = collect_keys(settings, &snapshot);
    let state = HeaderState::from_settings(settings);

    let mut headers = HeaderMap::new();
    state.cache_control.apply(&mut headers)?;
    state.surrogate_keys.apply(&mut headers, &keys)?;
    debug!(headers = headers.len(), "derived response headers");

    let lines = headers
        .iter()
        .map(|(name, value)| {
            let text = value
                .to_str()
                .map_err(|err| AppError::header(name.as_str(), err.to_string()))?;
            Ok((display_name(name.as_str()), text.to_owned()))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    if args.json {
        let rendered: serde_json::Map<_, _> = lines
            .into_iter()
            .map(|(name, value)| (name, json!(value)))
            .collect();
        let output = json!({
            "headers": rendered,
            "directives": state.cache_control.directives(),
            "keys": keys,
        });
        println!("{output:#}");
    } else {
        for (name, value) in lines {
            println!("{name}: {value}");
        }
    }

    Ok(())
}

#[instrument(skip_all, fields(snapshot = %args.snapshot.display()))]
async fn run_keys(settings: &Settings, args: KeysArgs) -> Result<(), AppError> {
    let snapshot = read_snapshot(&args.snapshot).await?;
    let keys = collect_keys(settings, &snapshot);

    for key in keys.keys() {
        println!("{key}");
    }

    Ok(())
}

async fn read_snapshot(path: &Path) -> Result<QuerySnapshot, AppError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AppError::io(path, err))?;
    Ok(QuerySnapshot::from_json(&contents)?)
}

fn collect_keys(settings: &Settings, snapshot: &QuerySnapshot) -> SurrogateKeyCollection {
    let filter = TaxonomyFilter::from_settings(&settings.surrogate_keys);
    SurrogateKeyCollector::new(filter).collect(snapshot, snapshot)
}

/// `surrogate-key` -> `Surrogate-Key`.
fn display_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
