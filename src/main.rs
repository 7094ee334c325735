use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use chess_oracle::{Color, MoveDescriptor, PositionOracle};
use chess_timeline::core::{init_logging, load_settings};
use chess_timeline::game::engine::UciProcessLauncher;
use chess_timeline::game::{
    Difficulty, GameMode, MaterialLedger, MoveCoordinator, MoveTimeline, Navigation,
    SessionBuilder, SessionEventKind,
};

#[derive(Parser)]
#[command(name = "chess_timeline", version, about = "Browse and play chess move timelines")]
struct Cli {
    /// Log filter, overrides the configured one (RUST_LOG still wins)
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Step through a game record and print every position
    Replay {
        /// Notation file, or the movetext itself
        record: String,
    },
    /// Play against a UCI engine
    Play {
        /// Engine executable (defaults to the configured one)
        #[arg(long)]
        engine: Option<PathBuf>,
        /// 0 (beginner) to 4 (master)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
        difficulty: Option<u8>,
        #[arg(long, value_enum, default_value_t = Side::White)]
        side: Side,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(filter) = cli.log {
        settings.log_filter = filter;
    }
    init_logging(&settings.log_filter);

    match cli.command {
        Command::Replay { record } => replay(&record),
        Command::Play {
            engine,
            difficulty,
            side,
        } => {
            if let Some(engine) = engine {
                settings.engine.binary_path = engine;
            }
            if let Some(difficulty) = difficulty {
                settings.engine.difficulty = difficulty;
            }
            play(settings, side.into()).await
        }
    }
}

fn replay(record: &str) -> Result<()> {
    let notation = if Path::new(record).is_file() {
        std::fs::read_to_string(record).with_context(|| format!("reading {record}"))?
    } else {
        record.to_string()
    };

    let mut timeline = MoveTimeline::from_notation(&notation).context("loading game record")?;
    timeline.jump_to_start();
    println!("start  {}", timeline.position().fingerprint());

    while let Some(mv) = timeline.step_forward() {
        println!(
            "{:>3}. {:<8} {}  {}",
            timeline.ply(),
            mv.san_with_suffix(),
            timeline.position().fingerprint(),
            material_line(timeline.material())
        );
    }
    if let Some(result) = timeline.position().status().result_token() {
        println!("result {result}");
    }
    Ok(())
}

async fn play(settings: chess_timeline::core::SessionSettings, player: Color) -> Result<()> {
    let difficulty = Difficulty::from_level(settings.engine.difficulty);
    let launcher = UciProcessLauncher::new(settings.engine.binary_path.clone());
    let coordinator = MoveCoordinator::new(GameMode::Versus {
        player_color: player,
        difficulty,
    })?;
    info!("Playing {:?} against {:?} ({})", player, launcher.binary(), difficulty.name());

    let (handle, task) = SessionBuilder::new(coordinator)
        .engine(Box::new(launcher))
        .settings(settings)
        .spawn();

    let mut events = handle.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event.kind {
                SessionEventKind::Moved { mv, origin, .. } => {
                    println!("{:?} ({:?}) played {}", mv.color(), origin, mv.san_with_suffix());
                }
                SessionEventKind::Dropped(e) => println!("! {e}"),
                SessionEventKind::Resynced { .. } | SessionEventKind::Navigated => {}
                _ => continue,
            }
            println!("  {}  {}", event.board.fen, material_line(&event.material));
            if let Some(result) = event.board.status.result_token() {
                println!("Game over: {result}");
            }
        }
    });

    println!("Moves as e2e4 (e7e8q to promote); back, forward, start, end, quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match line.trim() {
            "" => continue,
            "quit" => break,
            "back" => handle.navigate(Navigation::Back).await,
            "forward" => handle.navigate(Navigation::Forward).await,
            "start" => handle.navigate(Navigation::Start).await,
            "end" => handle.navigate(Navigation::End).await,
            token => match token.parse::<MoveDescriptor>() {
                Ok(descriptor) => handle.submit(descriptor).await.map(|_| ()),
                Err(e) => {
                    println!("! {e}");
                    continue;
                }
            },
        };
        if let Err(e) = outcome {
            println!("! {e}");
        }
    }

    handle.shutdown().await?;
    if let Err(e) = task.await {
        bail!("session task failed: {e}");
    }
    Ok(())
}

fn material_line(material: &MaterialLedger) -> String {
    format!(
        "material W {} B {} ({:+})",
        material.side(Color::White).total,
        material.side(Color::Black).total,
        material.advantage()
    )
}
