//! Interactive host for a shared poker table.
//!
//! Creates a table in the in-process store, prints every committed snapshot,
//! and drives hands from commands typed on stdin.

mod commands;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use poker_tally::{
    TableManager, TableSession, TableState, Transition,
    entities::{Award, SeatIndex},
};
use tokio::io::{AsyncBufReadExt, BufReader};

use commands::{Command, parse_command};
use config::{HostConfig, Overrides};

const HELP: &str = "\
Host a poker table and keep score of chips

USAGE:
  pt_host [OPTIONS]

OPTIONS:
  --seats        N         Seats at the table        [default: env TALLY_SEATS or 6]
  --buy-in       CHIPS     Chips per buy-in          [default: env TALLY_BUY_IN or 100]
  --small-blind  CHIPS     Small blind               [default: env TALLY_SMALL_BLIND or 5]
  --players      NAMES     Comma-separated names     [default: env TALLY_PLAYERS]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  TALLY_SHARE_BASE         Page that share links point at
  TALLY_COMMIT_RETRIES     Extra commit attempts after losing a race
";

const COMMANDS: &str = "\
Commands:
  start [SEAT]             Start a hand (SEAT picks the first dealer)
  fold | check | call      Act for the seat to act
  raise N                  Put N more chips in (must exceed the call)
  all-in                   Commit every remaining chip
  buyin SEAT               Rebuy a seat that went broke
  award SEAT:AMOUNT ...    Split the pot at showdown
  split [SEAT ...]         Even split between seats (default: everyone eligible)
  show | stats | link      Table, buy-in ledger, share link
  help | quit
";

/// How often the manager sweeps expired tables.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

type Session = TableSession<TableManager>;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        seats: pargs.opt_value_from_str("--seats")?,
        buy_in: pargs.opt_value_from_str("--buy-in")?,
        small_blind: pargs.opt_value_from_str("--small-blind")?,
        players: pargs.opt_value_from_str("--players")?,
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = HostConfig::from_env(overrides)?;
    config.validate()?;

    let table_config = config
        .table_config(chrono::Utc::now())
        .context("Failed to build table config")?;
    let initial = TableState::new(table_config, config.player_setups())
        .context("Failed to seat players")?;

    let store = Arc::new(TableManager::new());
    let session = TableSession::create(store.clone(), initial, config.session_config())
        .await
        .context("Failed to create table")?;

    info!(
        "Table {} ready: {} seats, buy-in ${}, blinds ${}/${}",
        session.table_id(),
        config.seats,
        config.buy_in,
        config.small_blind,
        config.small_blind * 2
    );
    println!("Share link: {}", session.table_id().share_url(&config.share_base));

    spawn_watcher(&session).await?;
    spawn_sweeper(store);

    print!("{COMMANDS}");
    run_repl(&session, &config).await?;

    info!("Closing table {}", session.table_id());
    Ok(())
}

/// Print every committed snapshot as it lands.
async fn spawn_watcher(session: &Session) -> Result<(), Error> {
    let mut updates = session.watch().await.context("Failed to subscribe")?;
    tokio::spawn(async move {
        while let Some(state) = updates.recv().await {
            println!("\n{state}");
        }
        info!("Table feed closed");
    });
    Ok(())
}

fn spawn_sweeper(store: Arc<TableManager>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let swept = store.sweep_expired(chrono::Utc::now()).await;
            if swept > 0 {
                info!("Swept {swept} expired table(s)");
            }
        }
    });
}

async fn run_repl(session: &Session, config: &HostConfig) -> Result<(), Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let result = match command {
            Command::Start(dealer) => session.start_hand(dealer).await,
            Command::Act(action) => session.act_current(action).await,
            Command::BuyIn(seat) => session.buy_in(seat).await,
            Command::Award(awards) => session.distribute_pot(awards).await,
            Command::Split(seats) => match split_awards(session, &seats).await {
                Ok(awards) => session.distribute_pot(awards).await,
                Err(e) => Err(e),
            },
            Command::Show => {
                match session.snapshot().await {
                    Ok(state) => show_table(&state),
                    Err(e) => println!("{}", e.client_message()),
                }
                continue;
            }
            Command::Stats => {
                match session.snapshot().await {
                    Ok(state) => state.stats().iter().for_each(|s| println!("{s}")),
                    Err(e) => println!("{}", e.client_message()),
                }
                continue;
            }
            Command::Link => {
                println!("{}", session.table_id().share_url(&config.share_base));
                continue;
            }
            Command::Help => {
                print!("{COMMANDS}");
                continue;
            }
            Command::Quit => break,
        };

        match result {
            Ok(transition) => report(&transition),
            Err(e) if e.is_terminal() => {
                warn!("{e}");
                println!("{}", e.client_message());
                break;
            }
            Err(e) => println!("{}", e.client_message()),
        }
    }

    Ok(())
}

/// Even split of the pending pot across `seats`, or every eligible seat.
async fn split_awards(
    session: &Session,
    seats: &[SeatIndex],
) -> poker_tally::TableResult<Vec<Award>> {
    let state = session.snapshot().await?;
    let Some(request) = state.showdown_request() else {
        return Err(poker_tally::game::InvalidActionReason::NoShowdownPending.into());
    };
    if seats.is_empty() {
        let everyone: Vec<SeatIndex> = request.eligible.iter().map(|p| p.seat).collect();
        Ok(request.even_split(&everyone))
    } else {
        Ok(request.even_split(seats))
    }
}

fn show_table(state: &TableState) {
    println!("{state}");
    if let Some(request) = state.showdown_request() {
        let eligible: Vec<String> = request
            .eligible
            .iter()
            .map(|p| format!("[{}] {}", p.seat, p.name))
            .collect();
        println!("Showdown for ${}: {}", request.pot, eligible.join(", "));
    }
}

fn report(transition: &Transition) {
    for event in &transition.events {
        println!("* {event}");
    }
}
