use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};
use voxshift::analysis::{dominant_frequency, spectral_centroid};
use voxshift::{
    AppConfig, Interpolation, PitchError, SampleBuffer, Strategy, Transcoder, VoiceChanger,
};

/// Preset name used when `--semitones` is given without `--preset`.
const AD_HOC_PRESET: &str = "custom";

#[derive(Parser, Debug)]
#[command(name = "voxshift", version, about = "Shift the pitch of a voice recording")]
struct Cli {
    /// Input audio file (WAV, MP3, FLAC or OGG)
    #[arg(required_unless_present = "list_presets")]
    input: Option<PathBuf>,

    /// Output file (.wav or .mp3)
    #[arg(required_unless_present = "list_presets")]
    output: Option<PathBuf>,

    /// Preset to apply, e.g. "Man to Woman"
    #[arg(short, long)]
    preset: Option<String>,

    /// Ad-hoc shift in semitones (registered under --preset or "custom")
    #[arg(short, long, allow_negative_numbers = true)]
    semitones: Option<f64>,

    /// Shifting strategy: resample or phase-vocoder
    #[arg(long)]
    strategy: Option<Strategy>,

    /// Output sample rate in Hz
    #[arg(long)]
    target_rate: Option<u32>,

    /// Interpolation for rate conversion: linear, cubic or sinc
    #[arg(long)]
    interpolation: Option<Interpolation>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// ffmpeg binary used for MP3 output
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// List the available presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Print processing details
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    if let Err(e) = run(cli) {
        eprintln!("ERROR: {}: {}", e.kind(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PitchError> {
    let mut app = match &cli.config {
        Some(path) => AppConfig::from_json_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(strategy) = cli.strategy {
        app.transform.strategy = strategy;
    }
    if let Some(rate) = cli.target_rate {
        app.transform.target_sample_rate = rate;
    }
    if let Some(interpolation) = cli.interpolation {
        app.transform.interpolation = interpolation;
    }
    if let Some(ffmpeg) = cli.ffmpeg {
        app.ffmpeg_path = Some(ffmpeg);
    }

    let mut changer = VoiceChanger::from_app_config(&app)?;

    if cli.list_presets {
        for preset in changer.presets().iter() {
            let strategy = preset
                .strategy
                .map(|s| format!(" ({})", s))
                .unwrap_or_default();
            println!("{:<28} {:+6.2} semitones{}", preset.name, preset.semitones, strategy);
        }
        return Ok(());
    }

    let preset = match (cli.preset, cli.semitones) {
        (name, Some(semitones)) => {
            let name = name.unwrap_or_else(|| AD_HOC_PRESET.to_string());
            changer.register_preset(name.clone(), semitones)?;
            name
        }
        (Some(name), None) => name,
        (None, None) => {
            return Err(PitchError::InvalidParameter(
                "specify --preset or --semitones".to_string(),
            ))
        }
    };

    let (Some(input), Some(output)) = (cli.input, cli.output) else {
        return Err(PitchError::InvalidParameter(
            "input and output paths are required".to_string(),
        ));
    };

    let transcoder = app
        .ffmpeg_path
        .clone()
        .map(Transcoder::new)
        .unwrap_or_default();

    info!(preset = %preset, config = %changer.config(), "shifting");
    let (source, shifted) =
        voxshift::shift_audio_file(&input, &output, &preset, &changer, Some(&transcoder))?;

    report("Input", &source);
    report("Output", &shifted);
    eprintln!("Written to {}", output.display());
    Ok(())
}

fn report(label: &str, buffer: &SampleBuffer) {
    let first_channel = if buffer.is_empty() {
        Vec::new()
    } else {
        buffer.channel_data(0)
    };
    eprintln!(
        "{}: {:.3}s, {} Hz, {} ch, {}; dominant {:.1} Hz, centroid {:.1} Hz",
        label,
        buffer.duration_secs(),
        buffer.sample_rate(),
        buffer.channels(),
        buffer.sample_format(),
        dominant_frequency(&first_channel, buffer.sample_rate()),
        spectral_centroid(&first_channel, buffer.sample_rate()),
    );
}
