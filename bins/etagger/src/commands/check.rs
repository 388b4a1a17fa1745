//! Replay the conditional GET decision for a file

use crate::OutputFormat;
use anyhow::Context;
use bytes::Bytes;
use etagger::{EtagFilter, EtagOptions, Outcome, SupportedMimeType, MIME_TYPES_ENV};
use etagger_telemetry::{metrics, Timer};
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use std::convert::Infallible;
use std::path::{Path, PathBuf};

/// Arguments for `etagger check`
pub struct CheckArgs {
    pub path: PathBuf,
    pub content_type: Option<String>,
    pub method: String,
    pub if_none_match: Option<String>,
    pub allow: Vec<SupportedMimeType>,
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct Report {
    outcome: &'static str,
    status: Option<u16>,
    etag: Option<String>,
    body_sent: bool,
}

pub async fn run(args: CheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let options = resolve_options(&args.allow, args.config.as_deref())?;
    let body = tokio::fs::read(&args.path)
        .await
        .with_context(|| format!("Failed to read {}", args.path.display()))?;

    let report = evaluate(
        EtagFilter::new(options),
        &args.method,
        args.content_type.as_deref(),
        args.if_none_match.as_deref(),
        Bytes::from(body),
    )
    .await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            println!("outcome: {}", report.outcome);
            if let Some(status) = report.status {
                println!("status: {status}");
            }
            if let Some(etag) = &report.etag {
                println!("etag: {etag}");
            }
        }
    }

    Ok(())
}

/// Explicit `--allow` flags win, then the environment, then config files.
fn resolve_options(allow: &[SupportedMimeType], config: Option<&Path>) -> anyhow::Result<EtagOptions> {
    if !allow.is_empty() {
        return Ok(EtagOptions::new(allow.iter().copied()));
    }
    if config.is_none() && std::env::var_os(MIME_TYPES_ENV).is_some() {
        return EtagOptions::from_env().context("Invalid media type list in environment");
    }
    EtagOptions::load(config).context("Failed to load options")
}

async fn evaluate(
    filter: EtagFilter,
    method: &str,
    content_type: Option<&str>,
    if_none_match: Option<&str>,
    body: Bytes,
) -> anyhow::Result<Report> {
    let mut request = Request::builder().method(method).uri("/");
    if let Some(validator) = if_none_match {
        request = request.header(http::header::IF_NONE_MATCH, validator);
    }
    let request = request.body(()).context("Invalid request")?;

    let mut response = Response::builder();
    if let Some(content_type) = content_type {
        response = response.header(http::header::CONTENT_TYPE, content_type);
    }
    let response = response.body(Full::new(body)).context("Invalid response")?;

    let timer = Timer::start("filter_ms");
    let outcome = filter
        .apply(&request, move || async move { Ok::<_, Infallible>(response) })
        .await?;
    timer.stop();

    metrics().record_outcome(outcome.kind());
    tracing::debug!(outcome = outcome.kind(), "Filter finished");

    let body_sent = matches!(outcome, Outcome::PassThrough(_) | Outcome::Tagged(_));
    let kind = outcome.kind();
    let response = outcome.into_response();

    Ok(Report {
        outcome: kind,
        status: response.as_ref().map(|r| r.status().as_u16()),
        etag: response
            .as_ref()
            .and_then(|r| r.headers().get(http::header::ETAG))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body_sent,
    })
}
