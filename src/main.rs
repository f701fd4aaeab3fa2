//! VFC CLI - run elementary streams through a frame constructor
//!
//! A command-line tool for inspecting how a stream is reassembled for a
//! hardware decoder, and for stripping headers from encoder output.

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use vfc_lib::codec::{CodecKind, SpsInfo};
use vfc_lib::constructor::{ConstructorConfig, FrameConstructor, LogContext, StreamInfo};
use vfc_lib::output::{classify_output, remove_headers, OutputKind};
use vfc_lib::util::BufferStats;
use vfc_lib::{framing, init, Config};

#[derive(Parser)]
#[command(name = "vfc")]
#[command(about = "VFC - elementary-stream frame constructor", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a stream through a frame constructor and report what comes out
    Assemble {
        /// Input file (Annex B for h264/h265, elementary stream for vc1, IVF for vp8/vp9)
        input: PathBuf,

        /// Codec (h264, h265, vc1, vp8, vp9)
        #[arg(short, long)]
        codec: String,

        /// Split every frame into loads of at most this many bytes (0 = whole frames)
        #[arg(long, default_value = "0")]
        chunk: usize,

        /// Constructor configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Drop parameter sets ahead of the first slice of every access unit
    Strip {
        /// Input file (Annex B)
        input: PathBuf,

        /// Codec (h264, h265)
        #[arg(short, long)]
        codec: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List supported codecs
    Codecs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config {
        verbose: cli.verbose,
        debug: cli.debug,
    };
    init(config)?;

    info!("VFC v{}", vfc_lib::VERSION);

    match cli.command {
        Commands::Assemble {
            input,
            codec,
            chunk,
            config,
            json,
        } => {
            let kind = parse_codec(&codec)?;
            cmd_assemble(&input, kind, chunk, config.as_deref(), json)?;
        }
        Commands::Strip {
            input,
            codec,
            output,
        } => {
            let kind = parse_codec(&codec)?;
            cmd_strip(&input, kind, &output)?;
        }
        Commands::Codecs => cmd_codecs()?,
    }

    Ok(())
}

fn parse_codec(name: &str) -> anyhow::Result<CodecKind> {
    name.parse::<CodecKind>()
        .with_context(|| format!("Unsupported codec '{}'", name))
}

#[derive(Debug, Default, Serialize)]
struct AssembleReport {
    file: String,
    codec: String,
    bytes_in: u64,
    bytes_out: u64,
    loads: usize,
    bitstreams: usize,
    sync_frames: usize,
    header_only: usize,
    format_changes: usize,
    buffer: BufferStats,
    interlaced: bool,
    sps: Option<SpsInfo>,
    hdr_sei_types: Vec<u32>,
}

fn cmd_assemble(
    input: &Path,
    kind: CodecKind,
    chunk: usize,
    config: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => ConstructorConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConstructorConfig::default(),
    };

    let data = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let units = framing::split(kind, &data)?;
    let data = Bytes::from(data);

    let mut fc = FrameConstructor::new(kind, config, LogContext::for_codec(kind));
    fc.init(StreamInfo::default())?;

    let mut report = AssembleReport {
        file: input.display().to_string(),
        codec: kind.to_string(),
        bytes_in: data.len() as u64,
        ..Default::default()
    };

    for unit in units {
        let frame = data.slice(unit.range.clone());
        if unit.is_header || chunk == 0 || frame.len() <= chunk {
            fc.load(frame, unit.pts, unit.is_header, !unit.is_header)?;
            report.loads += 1;
            drain(&mut fc, &mut report)?;
            continue;
        }

        let mut pos = 0;
        while pos < frame.len() {
            let end = (pos + chunk).min(frame.len());
            fc.load(frame.slice(pos..end), unit.pts, false, end == frame.len())?;
            report.loads += 1;
            drain(&mut fc, &mut report)?;
            pos = end;
        }
    }

    fc.set_eos_mode(true);
    drain(&mut fc, &mut report)?;
    fc.load(Bytes::new(), -1, false, false)?;

    report.buffer = fc.stats();
    report.interlaced = fc.is_set_interlace_flag();
    report.sps = fc.sps_info().copied();
    report.hdr_sei_types = [137, 144]
        .into_iter()
        .filter(|t| fc.get_sei(*t).is_some())
        .collect();
    fc.close();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Act as the decoder: take everything exposed, then hand it back
fn drain(fc: &mut FrameConstructor, report: &mut AssembleReport) -> anyhow::Result<()> {
    let kind = fc.kind();
    if let Some(bst) = fc.bitstream() {
        let len = bst.data_length();
        report.bitstreams += 1;
        report.bytes_out += len as u64;
        if bst.data_flag.header_only {
            report.header_only += 1;
        }
        if classify_output(bst.data(), kind) == OutputKind::SyncFrame {
            report.sync_frames += 1;
        }
        bst.consume(len)?;
    }
    fc.unload()?;

    if fc.take_format_change() {
        report.format_changes += 1;
    }
    Ok(())
}

fn print_report(report: &AssembleReport) {
    println!("Frame constructor report");
    println!("─────────────────────────────────────────────────────────");
    println!("File:            {}", report.file);
    println!("Codec:           {}", report.codec);
    println!("Bytes in/out:    {} / {}", report.bytes_in, report.bytes_out);
    println!("Loads:           {}", report.loads);
    println!(
        "Bitstreams:      {} ({} sync, {} header-only)",
        report.bitstreams, report.sync_frames, report.header_only
    );
    println!("Format changes:  {}", report.format_changes);
    println!(
        "Buffer:          {} reallocs, {} bytes copied",
        report.buffer.reallocs, report.buffer.copied_bytes
    );
    println!("Interlaced:      {}", report.interlaced);

    if let Some(sps) = &report.sps {
        println!(
            "SPS:             {}x{} profile {} level {} chroma {} {}-bit",
            sps.width,
            sps.height,
            sps.profile_idc,
            sps.level_idc,
            sps.chroma_format_idc,
            sps.bit_depth_luma
        );
    }
    if !report.hdr_sei_types.is_empty() {
        println!("HDR SEI:         {:?}", report.hdr_sei_types);
    }
}

fn cmd_strip(input: &Path, kind: CodecKind, output: &Path) -> anyhow::Result<()> {
    if !kind.is_nal_based() {
        anyhow::bail!("strip only applies to h264 and h265 streams");
    }

    let data = std::fs::read(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let data = Bytes::from(data);

    let mut out = Vec::with_capacity(data.len());
    let mut config_units = 0;
    for range in framing::split_access_units(kind, &data) {
        let au = data.slice(range);
        if classify_output(&au, kind) == OutputKind::CodecConfig {
            config_units += 1;
            continue;
        }
        let mut bst = vfc_lib::Bitstream::borrowed(au);
        remove_headers(&mut bst, kind)?;
        out.extend_from_slice(bst.data());
    }

    std::fs::write(output, &out)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Stripped {} -> {} bytes ({} header-only units dropped)",
        data.len(),
        out.len(),
        config_units
    );
    Ok(())
}

fn cmd_codecs() -> anyhow::Result<()> {
    println!("Supported Codecs:");
    println!("─────────────────────────────────────────────────────────");
    println!("{:<8} {:<6} {:<30}", "ID", "NAL", "Description");
    println!("─────────────────────────────────────────────────────────");

    for kind in CodecKind::ALL {
        let info = kind.info();
        println!(
            "{:<8} {:<6} {:<30}",
            info.name,
            if kind.is_nal_based() { "yes" } else { "no" },
            info.long_name
        );
    }
    Ok(())
}
