use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info};

use quantizer_core::dsp::renderer::WavFile;
use quantizer_core::error::Result;
use quantizer_core::score::ScoreDocument;
use quantizer_core::session::Session;

#[derive(Parser)]
#[command(name = "quantizer", version, about = "Render quantizer scores offline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a JSON score to a 16-bit mono WAV file
    Render {
        /// Score document
        score: PathBuf,

        /// Output file
        #[arg(short = 'o', long = "output", default_value = "quantizer.wav")]
        output: PathBuf,

        #[command(flatten)]
        session: SessionOverrides,
    },

    /// Print the timing context and the patterns of a score
    Info {
        score: PathBuf,

        #[command(flatten)]
        session: SessionOverrides,
    },
}

#[derive(clap::Args)]
struct SessionOverrides {
    /// Tempo in beats per minute
    #[arg(long = "bpm")]
    bpm: Option<f64>,

    /// Sample rate in Hz
    #[arg(long = "fs")]
    fs: Option<u32>,

    /// Session length in beats
    #[arg(long = "beats")]
    beats: Option<f64>,
}

impl SessionOverrides {
    fn apply(&self, doc: &mut ScoreDocument) {
        if let Some(bpm) = self.bpm {
            doc.session.bpm = bpm;
        }
        if let Some(fs) = self.fs {
            doc.session.fs = fs;
        }
        if let Some(beats) = self.beats {
            doc.session.beats = beats;
            doc.session.samples = None;
        }
    }
}

fn load(path: &PathBuf, overrides: &SessionOverrides) -> Result<ScoreDocument> {
    let source = fs::read_to_string(path)?;
    let mut doc = ScoreDocument::from_json(&source)?;
    overrides.apply(&mut doc);
    Ok(doc)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Render {
            score,
            output,
            session,
        } => {
            let doc = load(&score, &session)?;
            let session = Session::new(&doc.session)?;
            session.export(&doc, &mut WavFile::new(&output))?;
            info!("rendered {} to {}", score.display(), output.display());
        }
        Command::Info { score, session } => {
            let doc = load(&score, &session)?;
            let session = Session::new(&doc.session)?;
            println!("{}", session.context());
            for (name, pattern) in doc.patterns(session.context())? {
                let rests = pattern.events.iter().filter(|e| e.idle).count();
                println!(
                    "{name}: {} events ({rests} rests), {} samples",
                    pattern.len(),
                    pattern.duration()
                );
            }
            println!("{} voices", doc.voices.len());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
