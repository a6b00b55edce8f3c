use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};

use midi_chord_trainer::formatter::{format_midi_time, ChordFormatter, TimelineFormatter};
use midi_chord_trainer::{
    group_chords, HeldPitches, InputEvent, Score, Session, Status, TrainerConfig, Transition,
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(short, long, help = "Config file (defaults to trainer.toml if present)")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tracks of a file with their note and chord counts
    Tracks {
        #[arg(short, long)]
        midi_file: PathBuf,
    },

    /// Print the chord sequence of a track
    Chords {
        #[arg(short, long)]
        midi_file: PathBuf,

        #[arg(short, long, help = "Track to use; all tracks merged if omitted")]
        track: Option<usize>,

        #[arg(short, long, help = "Chord grouping window in seconds")]
        window: Option<f64>,

        #[arg(short, long, help = "Show the longest note length of each chord")]
        lengths: bool,
    },

    /// Run a practice session headlessly with a simulated player
    Autoplay {
        #[arg(short, long)]
        midi_file: PathBuf,

        #[arg(short, long, default_value_t = 0)]
        track: usize,

        #[arg(
            short,
            long,
            default_value_t = 150,
            help = "Delay before the simulated player presses a chord it is waiting on"
        )]
        reaction_ms: u64,

        #[arg(short, long, help = "Require exactly the chord's pitches")]
        strict: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = TrainerConfig::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Tracks { midi_file } => list_tracks(&midi_file, &config),
        Command::Chords {
            midi_file,
            track,
            window,
            lengths,
        } => print_chords(
            &midi_file,
            track,
            window.unwrap_or(config.hit_window_sec),
            lengths,
            &config,
        ),
        Command::Autoplay {
            midi_file,
            track,
            reaction_ms,
            strict,
        } => {
            config.strict |= strict;
            autoplay(&midi_file, track, reaction_ms, &config)
        }
    }
}

fn list_tracks(midi_file: &Path, config: &TrainerConfig) -> Result<()> {
    let score = Score::load(midi_file, config.default_micros_per_beat).context("load midi file")?;
    println!("MIDI FILE: {}", midi_file.display());
    println!("Ticks per quarter note: {}", score.tempo_map().ticks_per_beat());
    println!("Tempo changes: {}", score.tempo_map().declared_changes().len());
    println!("Tracks: {}", score.track_count());

    for index in 0..score.track_count() {
        let parsed = score.parse_track(index)?;
        let chords = group_chords(&parsed.notes, config.hit_window_sec);
        println!(
            "  {:>3}: {:>5} notes {:>5} chords  {}",
            index,
            parsed.notes.len(),
            chords.len(),
            format_midi_time(parsed.total_length_sec)
        );
    }

    Ok(())
}

fn print_chords(
    midi_file: &Path,
    track: Option<usize>,
    window_sec: f64,
    lengths: bool,
    config: &TrainerConfig,
) -> Result<()> {
    ensure!(window_sec >= 0.0, "window must not be negative");

    let score = Score::load(midi_file, config.default_micros_per_beat).context("load midi file")?;
    let parsed = match track {
        Some(index) => score.parse_track(index)?,
        None => score.parse_merged(),
    };
    let chords = group_chords(&parsed.notes, window_sec);

    let formatter = TimelineFormatter::new(lengths);
    for (index, chord) in chords.iter().enumerate() {
        println!("{}", formatter.format(index, chord));
    }
    println!(
        "{} chords, length {}",
        chords.len(),
        format_midi_time(parsed.total_length_sec)
    );

    Ok(())
}

fn autoplay(midi_file: &Path, track: usize, reaction_ms: u64, config: &TrainerConfig) -> Result<()> {
    let mut session =
        Session::load_or_fallback(midi_file, track, config).context("load midi file")?;
    // the core never clamps dt, the frame loop has to
    let dt = (1.0 / config.fps as f64).min(config.max_frame_dt_sec);
    let reaction_sec = reaction_ms as f64 / 1000.0;

    let mut held = HeldPitches::new();
    let mut wall_sec = 0.0;
    let mut paused_sec = 0.0;
    let mut frames: u64 = 0;
    let mut press_at: Option<f64> = None;

    while !session.is_finished() {
        // input first so a chord pressed before this frame counts in it
        let mut messages: Vec<[u8; 3]> = held.pitches().iter().map(|&p| [0x80, p, 64]).collect();
        if let Some(at) = press_at {
            if wall_sec >= at {
                messages.extend(session.required_pitches().into_iter().map(|p| [0x90, p, 100]));
                press_at = None;
            }
        }
        for message in &messages {
            if let Some(transition) = InputEvent::parse(message).and_then(|e| held.apply(e)) {
                log_transition(transition);
            }
        }

        session.tick(dt, held.pitches());
        frames += 1;
        wall_sec += dt;

        if session.status() == Status::Paused {
            paused_sec += dt;
            press_at.get_or_insert(wall_sec + reaction_sec);
        }
    }

    info!(
        "{}: finished track {}/{} after {} frames",
        session.path().display(),
        session.track_index() + 1,
        session.track_count(),
        frames
    );
    println!(
        "{} chords, song {}, wall {}, waited {}",
        session.chords().len(),
        format_midi_time(session.state().total_length_sec),
        format_midi_time(wall_sec),
        format_midi_time(paused_sec)
    );

    Ok(())
}

fn log_transition(transition: Transition) {
    match transition {
        Transition::Pressed(pitch) => debug!("-- press {}", pitch),
        Transition::Released(pitch) => debug!("-- release {}", pitch),
    }
}
