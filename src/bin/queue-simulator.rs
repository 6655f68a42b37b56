//! Queue Simulator CLI Tool
//!
//! Drives an in-process matchmaking engine through scripted scenarios for
//! manual testing, without a transport attached.
//!
//! Usage:
//!   cargo run --bin queue-simulator -- --help
//!   cargo run --bin queue-simulator fill-match --batch-size 10
//!   cargo run --bin queue-simulator burst --joins 23
//!   cargo run --bin queue-simulator vote-round --batch-size 4

use anyhow::Result;
use clap::{Parser, Subcommand};
use ready_room::config::MatchmakingSettings;
use ready_room::game::balancer::team_elo_sum;
use ready_room::types::JoinRequest;
use ready_room::{MatchmakingEngine, RecordedNotification, RecordingNotifier};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "queue-simulator")]
#[command(about = "Scripted scenario driver for the ready-room matchmaking engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join exactly one batch of players and print the balanced teams
    FillMatch {
        /// Players per match
        #[arg(short, long, default_value = "10")]
        batch_size: usize,
    },
    /// Fire a burst of joins and report how many matches formed
    Burst {
        /// Number of join events to send
        #[arg(short, long, default_value = "23")]
        joins: usize,
        /// Players per match
        #[arg(short, long, default_value = "10")]
        batch_size: usize,
    },
    /// Fill one match, have every participant vote, and print the tally
    VoteRound {
        /// Players per match
        #[arg(short, long, default_value = "10")]
        batch_size: usize,
    },
}

fn create_engine(batch_size: usize) -> Result<(MatchmakingEngine, Arc<RecordingNotifier>)> {
    let settings = MatchmakingSettings {
        batch_size,
        ..MatchmakingSettings::default()
    };
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = MatchmakingEngine::new(settings, notifier.clone())?;
    Ok((engine, notifier))
}

/// Deterministic synthetic elo for player index `i`
fn synthetic_elo(i: usize) -> i32 {
    800 + ((i * 137) % 900) as i32
}

async fn join_players(engine: &MatchmakingEngine, count: usize) -> Result<()> {
    for i in 0..count {
        let id = format!("sim-conn-{}", i);
        let request = JoinRequest::with_elo(&format!("sim_player_{}", i), synthetic_elo(i));
        engine.handle_join(&id, request).await?;
    }
    Ok(())
}

async fn run_fill_match(batch_size: usize) -> Result<()> {
    let (engine, notifier) = create_engine(batch_size)?;
    join_players(&engine, batch_size).await?;

    for notification in notifier.recorded() {
        if let RecordedNotification::MatchCreated { event, .. } = notification {
            println!("Match {} created", event.match_id);
            println!(
                "  Team 1 (elo sum {}):",
                team_elo_sum(&event.teams.team1)
            );
            for player in &event.teams.team1 {
                println!("    {} ({})", player.username, player.elo);
            }
            println!(
                "  Team 2 (elo sum {}):",
                team_elo_sum(&event.teams.team2)
            );
            for player in &event.teams.team2 {
                println!("    {} ({})", player.username, player.elo);
            }
            println!("  Maps up for vote: {}", event.available_maps.join(", "));
        }
    }
    Ok(())
}

async fn run_burst(joins: usize, batch_size: usize) -> Result<()> {
    let (engine, notifier) = create_engine(batch_size)?;
    join_players(&engine, joins).await?;

    let stats = engine.stats()?;
    println!("Sent {} joins with batch size {}", joins, batch_size);
    println!("  Matches created: {}", stats.matches_created);
    println!("  Players still queued: {}", stats.players_waiting);
    println!(
        "  matchCreated broadcasts: {}",
        notifier.count_of("matchCreated")
    );
    println!(
        "  Estimated wait for next joiner: {}s",
        engine.estimated_wait_seconds()?
    );
    Ok(())
}

async fn run_vote_round(batch_size: usize) -> Result<()> {
    let (engine, notifier) = create_engine(batch_size)?;
    join_players(&engine, batch_size).await?;

    let maps = engine.settings().available_maps.clone();
    let mut last_snapshot = None;
    for i in 0..batch_size {
        let id = format!("sim-conn-{}", i);
        let map = &maps[i % maps.len()];
        last_snapshot = Some(engine.handle_vote(&id, map).await?);
    }

    if let Some(snapshot) = last_snapshot {
        println!("Final tally after {} votes:", batch_size);
        for (map, count) in &snapshot {
            println!("  {:10} {}", map, count);
        }
    }
    println!(
        "  mapVotesUpdate broadcasts: {}",
        notifier.count_of("mapVotesUpdate")
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::FillMatch { batch_size } => run_fill_match(batch_size).await,
        Commands::Burst { joins, batch_size } => run_burst(joins, batch_size).await,
        Commands::VoteRound { batch_size } => run_vote_round(batch_size).await,
    }
}
