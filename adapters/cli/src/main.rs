#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that loads a Riverford scenario and plays scripted bridge actions.

mod actions;
mod render;

use std::{fs, path::PathBuf};

use actions::Action;
use anyhow::{Context, Result};
use clap::Parser;
use riverford_core::{Command, Event, GridOffset, RemovalMode, TileCoord, ToolMode, WalkerId};
use riverford_system_bootstrap::Bootstrap;
use riverford_system_bridge_builder::{BridgeBuilder, BridgePreview, BuilderInput};
use riverford_world::{apply, query, World};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const BUNDLED_SCENARIO: &str = include_str!("../scenarios/river_crossing.toml");

/// Loads a scenario, applies scripted bridge actions and prints the resulting map.
#[derive(Debug, Parser)]
#[command(name = "riverford", version, about)]
struct Cli {
    /// Scenario file to load; the bundled river crossing is used when omitted.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Action to perform, repeatable: build|ship|remove|mark|restore|count|walk|leave:X,Y or rotate:cw|ccw.
    #[arg(long = "action", value_name = "ACTION")]
    actions: Vec<Action>,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Entry point for the Riverford command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let contents = match &cli.scenario {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?,
        None => BUNDLED_SCENARIO.to_owned(),
    };
    let bootstrap = Bootstrap::from_toml(&contents).context("failed to load scenario")?;

    let mut session = Session::new(&bootstrap);
    println!("{}", bootstrap.welcome_banner(&session.world));

    for action in cli.actions {
        session.perform(action)?;
    }

    print!("{}", render::render(&session.world));
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// World plus the builder system, with the events the builder has not consumed yet.
struct Session {
    world: World,
    builder: BridgeBuilder,
    events: Vec<Event>,
    next_walker: u32,
}

impl Session {
    fn new(bootstrap: &Bootstrap) -> Self {
        let mut world = World::new();
        let mut events = Vec::new();
        for command in bootstrap.commands() {
            apply(&mut world, command, &mut events);
        }
        apply(
            &mut world,
            Command::SetToolMode {
                mode: ToolMode::Construct,
            },
            &mut events,
        );

        let mut session = Self {
            world,
            builder: BridgeBuilder::new(),
            events,
            next_walker: 0,
        };
        session.settle();
        session
    }

    fn perform(&mut self, action: Action) -> Result<()> {
        info!(?action, "performing action");
        match action {
            Action::Build(kind, tile) => {
                let outcome = query::detect_bridge(&self.world, tile, kind);
                match outcome {
                    Ok(span) if !span.meets_minimum_length() => println!(
                        "{tile:?}: {kind:?} bridge of {} tiles is too short",
                        span.length()
                    ),
                    Ok(span) => println!("{tile:?}: {kind:?} bridge of {} tiles", span.length()),
                    Err(reason) => println!("{tile:?}: cannot build {kind:?} bridge: {reason}"),
                }
                let input = BuilderInput {
                    confirm_action: true,
                    ..BuilderInput::default()
                };
                self.step(Some(BridgePreview::new(kind, tile, outcome)), input);
            }
            Action::Remove(tile) => {
                let input = BuilderInput {
                    remove_action: true,
                    cursor: Some(self.offset(tile)?),
                    ..BuilderInput::default()
                };
                self.step(None, input);
            }
            Action::Mark(tile) => {
                let offset = self.offset(tile)?;
                self.issue(Command::RemoveBridge {
                    offset,
                    mode: RemovalMode::MarkDeleted,
                });
            }
            Action::Restore(tile) => {
                let offset = self.offset(tile)?;
                self.issue(Command::RestoreBridge { offset });
            }
            Action::Count(tile) => {
                let offset = self.offset(tile)?;
                let units = query::count_units_on_bridge(&self.world, offset);
                println!("{tile:?}: {units} walker(s) on bridge");
            }
            Action::Walk(tile) => {
                let offset = self.offset(tile)?;
                let walker = WalkerId::new(self.next_walker);
                self.next_walker += 1;
                self.issue(Command::PlaceWalker { offset, walker });
            }
            Action::Leave(tile) => {
                let offset = self.offset(tile)?;
                self.issue(Command::ClearWalker { offset });
            }
            Action::Rotate(rotation) => {
                let input = BuilderInput {
                    rotate: Some(rotation),
                    ..BuilderInput::default()
                };
                self.step(None, input);
            }
        }

        self.settle();
        Ok(())
    }

    fn offset(&self, tile: TileCoord) -> Result<GridOffset> {
        query::grid_offset(&self.world, tile)
            .with_context(|| format!("tile {tile:?} is not on the map"))
    }

    fn issue(&mut self, command: Command) {
        apply(&mut self.world, command, &mut self.events);
    }

    /// Runs one builder frame and applies the commands it emits.
    fn step(&mut self, preview: Option<BridgePreview>, input: BuilderInput) {
        let events = std::mem::take(&mut self.events);
        for event in &events {
            report(event);
        }

        let mut commands = Vec::new();
        let world = &self.world;
        self.builder.handle(
            &events,
            preview,
            input,
            |offset| query::count_units_on_bridge(world, offset),
            &mut commands,
        );

        for command in commands {
            debug!(?command, "applying builder command");
            apply(&mut self.world, command, &mut self.events);
        }
    }

    /// Runs idle builder frames until no new events are produced.
    fn settle(&mut self) {
        while !self.events.is_empty() {
            self.step(None, BuilderInput::default());
        }
    }
}

fn report(event: &Event) {
    match event {
        Event::TileUpdated { .. } => {}
        Event::BridgeCommitted { span } => {
            println!("  built {:?} bridge of {} tiles", span.kind(), span.length());
        }
        Event::BridgeRejected { reason, .. } => println!("  bridge rejected: {reason}"),
        Event::BridgeRemoved { tiles, mode, .. } => {
            println!("  bridge of {tiles} tiles removed ({mode:?})");
        }
        Event::BridgeRemovalRejected { reason, .. } => println!("  removal rejected: {reason}"),
        Event::BridgeRestored { tiles, .. } => println!("  bridge of {tiles} tiles restored"),
        Event::MapRotated { orientation, .. } => println!("  view rotated to {orientation:?}"),
        Event::RoutingRecomputed {
            citizen_networks,
            noncitizen_networks,
            water_networks,
        } => println!(
            "  routing: {citizen_networks} citizen, {noncitizen_networks} non-citizen, {water_networks} water network(s)"
        ),
        other => debug!(?other, "event"),
    }
}
