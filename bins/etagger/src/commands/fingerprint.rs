//! Fingerprint files or stdin

use crate::OutputFormat;
use anyhow::Context;
use etagger::{Fingerprint, Fingerprinter};
use etagger_telemetry::Timer;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Serialize)]
struct Entry {
    path: String,
    fingerprint: String,
    bytes: u64,
}

pub async fn run(paths: &[PathBuf], format: OutputFormat) -> anyhow::Result<()> {
    let mut entries = Vec::with_capacity(paths.len());

    for path in paths {
        let _timer = Timer::start("fingerprint_ms");
        let (fingerprint, bytes) = if path == Path::new("-") {
            fingerprint_reader(tokio::io::stdin()).await
        } else {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            fingerprint_reader(file).await
        }
        .with_context(|| format!("Failed to read {}", path.display()))?;

        tracing::debug!(path = %path.display(), %fingerprint, bytes, "Fingerprinted");
        entries.push(Entry {
            path: path.display().to_string(),
            fingerprint: fingerprint.into_string(),
            bytes,
        });
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}  {}", entry.fingerprint, entry.path);
            }
        }
    }

    Ok(())
}

/// Stream a reader through the incremental hasher
async fn fingerprint_reader<R>(mut reader: R) -> std::io::Result<(Fingerprint, u64)>
where
    R: AsyncRead + Unpin,
{
    let mut fingerprinter = Fingerprinter::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        fingerprinter.update(&buf[..n]);
        total += n as u64;
    }

    Ok((fingerprinter.finish(), total))
}
