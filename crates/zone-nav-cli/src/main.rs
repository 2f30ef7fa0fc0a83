//! zonenav - navigation zone level inspector.
//!
//! - `zonenav graph <level>` - build the zone graph and report adjacency
//! - `zonenav path <level> --from <id> --to <id>` - run a path query
//! - `zonenav replicate <level>` - send the level to an in-process peer and compare graphs

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use zone_nav::{load_level, BuildReport, NavConfig, NavSession, Vec2, ZoneId};
use zone_nav_net::{LoopbackLink, PeerId, ZoneReceiver, ZoneReplicator};

#[derive(Parser)]
#[command(name = "zonenav")]
#[command(about = "Navigation zone level inspector", version)]
struct Cli {
    /// Navigation config (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the zone graph for a level and print its adjacency
    Graph {
        level: PathBuf,

        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find a path between two zones
    Path {
        level: PathBuf,

        #[arg(long)]
        from: u16,

        #[arg(long)]
        to: u16,

        /// Target x; defaults to the target zone's center
        #[arg(long, requires = "y")]
        x: Option<f32>,

        /// Target y
        #[arg(long, requires = "x")]
        y: Option<f32>,
    },

    /// Replicate the level to a loopback peer and verify both graphs match
    Replicate { level: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    fmt().with_env_filter(filter).with_target(false).init();

    let config = NavConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Graph { level, json } => show_graph(&config, &level, json),
        Commands::Path {
            level,
            from,
            to,
            x,
            y,
        } => {
            let target = x.zip(y).map(|(x, y)| Vec2::new(x, y));
            show_path(&config, &level, ZoneId(from), ZoneId(to), target)
        }
        Commands::Replicate { level } => replicate(&config, &level),
    }
}

/// Load a level into a fresh session and build its first graph.
fn open_session(config: &NavConfig, level_path: &Path) -> Result<(NavSession, BuildReport)> {
    let level = load_level(level_path)?;
    for err in &level.errors {
        tracing::warn!(level = %level_path.display(), error = %err, "level line skipped");
    }

    let mut session = NavSession::new(config.clone());
    for err in session.load_level(level.zones) {
        tracing::warn!(error = %err, "zone not loaded");
    }
    let report = session.begin_tick().unwrap_or_default();
    for err in &report.rejected {
        tracing::warn!(error = %err, "zone rejected");
    }
    Ok((session, report))
}

fn show_graph(config: &NavConfig, level_path: &Path, json: bool) -> Result<()> {
    let (session, report) = open_session(config, level_path)?;
    let graph = session.graph();

    if json {
        let text = serde_json::to_string_pretty(&*graph).context("Failed to encode graph")?;
        println!("{text}");
        return Ok(());
    }

    println!("Level: {}", level_path.display());
    println!(
        "Zones: {} ({} rejected, {} concave)",
        graph.len(),
        report.rejected.len(),
        report.concave.len()
    );
    println!("Adjacency entries: {}", graph.edge_count());
    if !report.repaired.is_empty() {
        println!("Repaired asymmetric entries: {}", report.repaired.len());
    }
    println!();
    for node in graph.nodes() {
        println!(
            "{} center ({:.2}, {:.2})",
            node.id, node.center.x, node.center.y
        );
        for entry in node.neighbors.iter() {
            println!(
                "  -> {} border ({:.2}, {:.2})-({:.2}, {:.2}) dist {:.2}",
                entry.zone_id,
                entry.border_start.x,
                entry.border_start.y,
                entry.border_end.x,
                entry.border_end.y,
                entry.dist_to
            );
        }
    }
    Ok(())
}

fn show_path(
    config: &NavConfig,
    level_path: &Path,
    from: ZoneId,
    to: ZoneId,
    target: Option<Vec2>,
) -> Result<()> {
    let (session, _) = open_session(config, level_path)?;
    let graph = session.graph();
    if !graph.contains(from) {
        bail!("zone {from} is not in the graph");
    }
    let Some(target) = target.or_else(|| graph.center(to)) else {
        bail!("zone {to} is not in the graph");
    };

    let path = session.find_path(from, to, target);
    if path.is_empty() {
        println!("No path from {from} to {to}");
        return Ok(());
    }

    let route: Vec<String> = path.zones.iter().map(ToString::to_string).collect();
    println!("Route: {}", route.join(" -> "));
    println!("Cost: {:.2}", path.cost);
    println!("Length: {:.2}", path.length());
    println!("Waypoints:");
    for p in &path.points {
        println!("  ({:.2}, {:.2})", p.x, p.y);
    }
    Ok(())
}

fn replicate(config: &NavConfig, level_path: &Path) -> Result<()> {
    let (host, _) = open_session(config, level_path)?;

    let mut replicator = ZoneReplicator::new(config);
    let mut receiver = ZoneReceiver::new(config);
    let (mut to_peer, mut to_host) = LoopbackLink::pair(PeerId(0), PeerId(1));

    let skipped = replicator.on_peer_connected(PeerId(1), host.store());
    for err in &skipped {
        tracing::warn!(error = %err, "zone not replicated");
    }
    let sent = replicator.flush(&mut to_peer);
    let report = receiver.poll(&mut to_host);

    println!("Sent {sent} payloads, peer received {}", report.received);
    println!("Dropped: {}, stale: {}", report.dropped, report.stale);
    if report.activated.is_none() {
        bail!("peer did not activate a graph");
    }

    let host_graph = host.graph();
    let peer_graph = receiver.graph();
    if skipped.is_empty() && *host_graph != *peer_graph {
        bail!("peer graph differs from host graph");
    }
    println!(
        "Peer graph: {} zones, {} adjacency entries{}",
        peer_graph.len(),
        peer_graph.edge_count(),
        if skipped.is_empty() {
            " (matches host)"
        } else {
            ""
        }
    );
    Ok(())
}
