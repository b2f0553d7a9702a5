//! speechgen: text-to-speech from the command line
//!
//! Usage:
//!   speechgen synthesize --text "Hello world." --voice alloy
//!   speechgen synthesize --file chapter.txt --voice en-GB-RyanNeural
//!   speechgen voices [--locale en-GB]
//!   speechgen merge a.mp3 b.mp3
//!   speechgen list
//!   speechgen remove speech-1a2b3c4d-5e6f7a8b.wav
//!   speechgen clear

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use speechgen::{Settings, SynthesisRequest, Synthesizer, WavEncoding};
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "speechgen", version)]
#[command(about = "Convert text into speech with a cloud TTS provider")]
struct Cli {
    /// YAML settings file (defaults to $SPEECHGEN_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory for generated audio
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synthesize text into a WAV file
    Synthesize(SynthesizeArgs),
    /// List available voices
    Voices {
        /// Only voices whose locale starts with this prefix
        #[arg(long)]
        locale: Option<String>,
    },
    /// Merge audio files into one WAV, in the order given
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List generated files
    List,
    /// Delete generated files by name
    Remove {
        #[arg(required = true)]
        names: Vec<PathBuf>,
    },
    /// Delete every generated file
    Clear,
}

#[derive(Debug, Args)]
struct SynthesizeArgs {
    /// Text to speak
    #[arg(long, conflicts_with = "file")]
    text: Option<String>,
    /// Read text from a file ("-" for stdin)
    #[arg(long)]
    file: Option<PathBuf>,
    /// Voice id; the provider's first voice when omitted
    #[arg(long)]
    voice: Option<String>,
    /// Locale tag; derived from the voice when omitted
    #[arg(long)]
    locale: Option<String>,
    /// Maximum characters per provider request
    #[arg(long)]
    max_chars: Option<usize>,
    /// Write 32-bit float samples instead of 16-bit PCM
    #[arg(long)]
    float: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    if let Some(dir) = cli.output_dir {
        settings.output_dir = dir;
    }

    match cli.command {
        Commands::Synthesize(args) => cmd_synthesize(settings, args).await,
        Commands::Voices { locale } => cmd_voices(settings, locale).await,
        Commands::Merge { files } => cmd_merge(settings, files),
        Commands::List => cmd_list(settings),
        Commands::Remove { names } => cmd_remove(settings, names),
        Commands::Clear => cmd_clear(settings),
    }
}

async fn cmd_synthesize(mut settings: Settings, args: SynthesizeArgs) -> anyhow::Result<()> {
    let text = match (args.text, args.file) {
        (Some(text), _) => text,
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?,
        (None, None) => bail!("either --text or --file is required"),
    };
    if let Some(max_chars) = args.max_chars {
        settings.max_chars = max_chars;
    }
    if args.float {
        settings.wav_encoding = WavEncoding::Float32;
    }
    settings.validate()?;

    let synthesizer = Synthesizer::from_settings(&settings)?;
    let voice = match args.voice {
        Some(voice) => voice,
        None => match synthesizer.catalog().voices().await?.first() {
            Some(voice) => voice.id.clone(),
            None => bail!("the provider offers no voices"),
        },
    };
    let mut request = SynthesisRequest::new(text, voice);
    if let Some(locale) = args.locale {
        request = request.with_locale(locale);
    }

    let artifact = synthesizer
        .synthesize_with_progress(&request, |p| {
            eprint!("\rGenerating speech... {:>3}%", (p.fraction() * 100.0) as u32);
            let _ = std::io::stderr().flush();
        })
        .await;
    eprintln!();

    let artifact = artifact?;
    println!(
        "{}\t{:.2}s\t{} bytes",
        artifact.path.display(),
        artifact.duration.as_secs_f64(),
        artifact.size_bytes
    );
    Ok(())
}

async fn cmd_voices(settings: Settings, locale: Option<String>) -> anyhow::Result<()> {
    let synthesizer = Synthesizer::from_settings(&settings)?;
    let voices = synthesizer
        .catalog()
        .voices_for_locale(locale.as_deref().unwrap_or(""))
        .await?;
    if voices.is_empty() {
        eprintln!("No voices found.");
    }
    for voice in voices {
        println!(
            "{:<28} {:<8} {:<8} {}",
            voice.id,
            if voice.locale.is_empty() { "any" } else { voice.locale.as_str() },
            voice.gender.as_deref().unwrap_or("-"),
            voice.display_name.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn cmd_merge(settings: Settings, files: Vec<PathBuf>) -> anyhow::Result<()> {
    let store = speechgen::ArtifactStore::new(&settings.output_dir)?;
    let dest = store.artifact_path("merged", files_seed(&files).as_bytes(), "wav");
    let assembler = speechgen::AudioAssembler::new(settings.wav_encoding);
    let artifact = assembler.merge_files(&files, &dest)?;
    println!(
        "{}\t{:.2}s",
        artifact.path.display(),
        artifact.duration.as_secs_f64()
    );
    Ok(())
}

fn files_seed(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|f| f.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn cmd_list(settings: Settings) -> anyhow::Result<()> {
    let store = speechgen::ArtifactStore::new(&settings.output_dir)?;
    let artifacts = store.list()?;
    if artifacts.is_empty() {
        eprintln!("No generated files in {}", store.root().display());
    }
    for artifact in artifacts {
        println!(
            "{:<48} {:>8.2}s {:>10} bytes",
            artifact.file_name(),
            artifact.duration.as_secs_f64(),
            artifact.size_bytes
        );
    }
    Ok(())
}

fn cmd_remove(settings: Settings, names: Vec<PathBuf>) -> anyhow::Result<()> {
    let store = speechgen::ArtifactStore::new(&settings.output_dir)?;
    for name in names {
        store
            .remove(&name)
            .with_context(|| format!("removing {}", name.display()))?;
        println!("Removed {}", name.display());
    }
    Ok(())
}

fn cmd_clear(settings: Settings) -> anyhow::Result<()> {
    let store = speechgen::ArtifactStore::new(&settings.output_dir)?;
    let removed = store.clear()?;
    println!("Removed {} file(s) from {}", removed, store.root().display());
    Ok(())
}
