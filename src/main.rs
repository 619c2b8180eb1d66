use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use colloquy::voice::{
    rms_energy, AudioCapture, AudioPlayback, CancelToken, Speaker, SpeechOutput, WakeModel,
    WINDOW_SAMPLES,
};
use colloquy::{Config, Daemon};

/// Colloquy - wake-word activated voice assistant
#[derive(Parser)]
#[command(name = "colloquy", version, about)]
struct Cli {
    /// Wake classifier base URL (serves model.json + metadata.json)
    #[arg(long, env = "COLLOQUY_MODEL_URL")]
    model_url: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// Fetch the wake model and show live per-label scores
    TestWake {
        /// Duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,colloquy=info",
        1 => "info,colloquy=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.model_url)?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, &text).await,
            Command::TestWake { duration } => test_wake(&config, duration).await,
        };
    }

    tracing::info!(assistant = %config.assistant_name, "starting colloquy");

    let daemon = Daemon::new(config);
    daemon.run().await?;

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    println!("Sample rate: {} Hz", capture.sample_rate());
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.take_buffer();
        let energy = rms_energy(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter(energy)
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Visual level meter
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn meter(level: f32) -> String {
    let len = (level * 50.0).min(25.0) as usize;
    "█".repeat(len) + &" ".repeat(25 - len)
}

/// Test speaker output with a sine wave
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let mut playback = AudioPlayback::new()?;

    // 2 seconds of 440Hz sine at the 24kHz playback rate
    let sample_rate = 24000_usize;
    let samples: Vec<f32> = (0..sample_rate * 2)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {sample_rate} Hz...", samples.len());
    playback.play(samples, &CancelToken::new()).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Check your volume levels");

    Ok(())
}

/// Test TTS output
#[allow(clippy::future_not_send)]
async fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Synthesizing: \"{text}\"");

    let playback = AudioPlayback::new()?;
    let mut speaker = Speaker::new(
        playback,
        config.api_base_url.clone(),
        config.api_key.clone(),
        config.tts_model.clone(),
        config.tts_voice.clone(),
        config.tts_speed,
    )?;

    speaker.speak(text).await?;

    println!("Done. If you heard the text, TTS is working!");
    Ok(())
}

/// Fetch the wake model and show live per-label scores
#[allow(clippy::future_not_send)]
async fn test_wake(config: &Config, duration: u64) -> anyhow::Result<()> {
    let model_url = config.require_wake_model_url()?;

    println!("Fetching wake model from {model_url} ...");
    let http = reqwest::Client::new();
    let model = WakeModel::load(&http, model_url).await?;
    println!("Labels: {:?}", model.labels());
    println!("Say your wake phrase!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    let mut window: Vec<f32> = Vec::new();
    for _ in 0..duration * 10 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        window.extend(capture.take_buffer());

        if window.len() < WINDOW_SAMPLES {
            continue;
        }

        let scores = model.score(&window[window.len() - WINDOW_SAMPLES..]);
        let line: Vec<String> = model
            .labels()
            .iter()
            .zip(&scores)
            .map(|(label, score)| format!("{label}: {score:.2} [{}]", meter(*score)))
            .collect();
        println!("{}", line.join("  "));

        window.drain(..window.len() - WINDOW_SAMPLES / 2);
    }

    capture.stop();
    Ok(())
}
