//! Command-line front-end: record from a microphone and write the result,
//! plus any chunks claimed along the way, to disk.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use voxchunk::audio::{ChunkEncoding, EncodedChunk, Recorder};
use voxchunk::config::AppConfig;
use voxchunk::telemetry;

#[derive(Serialize)]
struct ManifestEntry {
    file: String,
    sequence: u64,
    encoding: ChunkEncoding,
    bytes: usize,
}

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    telemetry::init_tracing(&config);

    if config.list_input_devices {
        match Recorder::list_devices() {
            Ok(names) if names.is_empty() => println!("No audio input devices found."),
            Ok(names) => {
                println!("Detected audio input devices:");
                for name in names {
                    println!("  {name}");
                }
            }
            Err(err) => println!("Failed to list audio input devices: {err}"),
        }
        return Ok(());
    }

    let mut recorder = Recorder::new(config.input_device.as_deref())?;
    eprintln!(
        "recording from '{}' for {}s",
        recorder.device_name(),
        config.seconds
    );
    recorder.start(config.session_config())?;

    if let Some(dir) = &config.chunk_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create chunk dir '{}'", dir.display()))?;
    }

    let mut manifest = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(config.seconds);
    while Instant::now() < deadline {
        thread::sleep(Duration::from_millis(200));
        if let Some(chunk) = recorder.take_chunk() {
            eprintln!(
                "chunk {} ready ({} bytes, level {:.2})",
                chunk.sequence,
                chunk.bytes.len(),
                recorder.level()
            );
            if let Some(dir) = &config.chunk_dir {
                manifest.push(write_chunk(dir, &chunk)?);
            }
        }
    }

    // A chunk completed on the final boundary would otherwise be lost with
    // the session.
    if let Some(chunk) = recorder.take_chunk() {
        if let Some(dir) = &config.chunk_dir {
            manifest.push(write_chunk(dir, &chunk)?);
        }
    }

    let wav = recorder.stop()?;
    fs::write(&config.output, &wav)
        .with_context(|| format!("failed to write '{}'", config.output.display()))?;
    eprintln!("wrote {} bytes to {}", wav.len(), config.output.display());

    if let Some(dir) = &config.chunk_dir {
        let manifest_path = dir.join("manifest.json");
        let body = serde_json::to_vec_pretty(&manifest).context("serialize chunk manifest")?;
        fs::write(&manifest_path, body)
            .with_context(|| format!("failed to write '{}'", manifest_path.display()))?;
        eprintln!(
            "wrote {} chunk(s) and manifest to {}",
            manifest.len(),
            dir.display()
        );
    }

    Ok(())
}

fn write_chunk(dir: &Path, chunk: &EncodedChunk) -> Result<ManifestEntry> {
    let extension = match chunk.encoding {
        ChunkEncoding::PcmWav => "wav",
        ChunkEncoding::Mulaw => "ulaw",
    };
    let file = format!("chunk-{:03}.{extension}", chunk.sequence);
    let path: PathBuf = dir.join(&file);
    fs::write(&path, &chunk.bytes)
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    Ok(ManifestEntry {
        file,
        sequence: chunk.sequence,
        encoding: chunk.encoding,
        bytes: chunk.bytes.len(),
    })
}
