use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use std::sync::Arc;

use crate::access::{authorize_admin, authorize_collection};
use crate::config::Config;
use crate::db::CollectionStore;
use crate::error::{AppError, CommandError, FeedError};
use crate::models::{CollectionName, Record, Role, VoteRecord, VoterRecord};
use crate::queue::{queue_status, queue_summary};
use crate::tasks::live::{LiveSummary, watch_summary};
use crate::views;
use crate::voting::{Summarize, compute_vote_summary, compute_voter_summary};

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
}

pub const USAGE: &str = "usage: live-tally <command>
  watch                       follow the live tally (and voter roll for admins)
  summary [--json]            print current statistics once
  vote <candidate>            cast one vote
  register <name> <email>     register a voter
  approve <voter-id>          mark a voter verified (admin)
  queue join <name>           take a queue token
  queue next                  call the next token (admin)
  queue status <token>        show your place in line";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Watch,
    Summary { json: bool },
    Vote { candidate: String },
    Register { name: String, email: String },
    Approve { voter_id: String },
    QueueJoin { name: String },
    QueueNext,
    QueueStatus { token: u32 },
}

fn usage() -> CommandError {
    CommandError::Usage(USAGE.to_string())
}

// Parses the arguments following the program name.
pub fn parse_args<I>(args: I) -> Result<Command, CommandError>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    let words: Vec<&str> = args.iter().map(String::as_str).collect();

    match words.as_slice() {
        ["watch"] => Ok(Command::Watch),
        ["summary"] => Ok(Command::Summary { json: false }),
        ["summary", "--json"] => Ok(Command::Summary { json: true }),
        ["vote", candidate @ ..] if !candidate.is_empty() => Ok(Command::Vote {
            candidate: candidate.join(" "),
        }),
        ["register", name @ .., email] if !name.is_empty() => {
            if !EMAIL.is_match(email) {
                return Err(CommandError::InvalidEmail(email.to_string()));
            }
            Ok(Command::Register {
                name: name.join(" "),
                email: email.to_string(),
            })
        }
        ["approve", voter_id] => Ok(Command::Approve {
            voter_id: voter_id.to_string(),
        }),
        ["queue", "join", name @ ..] if !name.is_empty() => Ok(Command::QueueJoin {
            name: name.join(" "),
        }),
        ["queue", "next"] => Ok(Command::QueueNext),
        ["queue", "status", token] => token
            .trim_start_matches('#')
            .parse()
            .map(|token| Command::QueueStatus { token })
            .map_err(|_| CommandError::InvalidToken(token.to_string())),
        _ => Err(usage()),
    }
}

pub async fn run(
    command: Command,
    store: Arc<dyn CollectionStore>,
    config: &Config,
) -> Result<(), AppError> {
    let session = config.session();
    info!("Running {:?} as {}", command, session.role);

    match command {
        Command::Watch => watch(store, config).await?,
        Command::Summary { json } => summary(&*store, config, json).await?,
        Command::Vote { candidate } => {
            let record = store.cast_vote(&candidate).await?;
            println!("Vote recorded for \"{}\" ({} total)", record.candidate, record.vote_count);
        }
        Command::Register { name, email } => {
            let voter = store.register_voter(&name, &email).await?;
            println!("Registered {} <{}> as {}. Awaiting verification.", voter.name, voter.email, voter.id);
        }
        Command::Approve { voter_id } => {
            authorize_admin(&session, "approve voters")?;
            store.approve_voter(&voter_id).await?;
            println!("Voter {} approved.", voter_id);
        }
        Command::QueueJoin { name } => {
            let entry = store.join_queue(&name).await?;
            let status = queue_status(&entry, store.now_serving().await?, config.minutes_per_token);
            print!("{}", views::render_queue_status(&status));
        }
        Command::QueueNext => {
            authorize_admin(&session, "call the next token")?;
            match store.call_next().await? {
                Some(entry) => println!("Called token #{} - {}", entry.token, entry.name),
                None => println!("No voters in queue right now."),
            }
        }
        Command::QueueStatus { token } => {
            let entry = store.queue_entry(token).await?;
            let status = queue_status(&entry, store.now_serving().await?, config.minutes_per_token);
            print!("{}", views::render_queue_status(&status));
        }
    }

    Ok(())
}

async fn summary(store: &dyn CollectionStore, config: &Config, json: bool) -> Result<(), AppError> {
    let session = config.session();
    let votes = compute_vote_summary(&VoteRecord::unpack(store.fetch(CollectionName::Votes).await?)?);
    let queue = queue_summary(&store.queue().await?);

    let voters = match authorize_collection(&session, CollectionName::Voters) {
        Ok(()) => Some(compute_voter_summary(&VoterRecord::unpack(
            store.fetch(CollectionName::Voters).await?,
        )?)),
        Err(_) => None,
    };

    if json {
        let dashboard = voters.as_ref().map(|v| views::Dashboard::new(v, &queue));
        let body = serde_json::json!({
            "votes": votes,
            "voters": voters,
            "queue": queue,
            "dashboard": dashboard,
        });
        println!("{}", views::to_json(&body)?);
        return Ok(());
    }

    print!("{}", views::render_vote_summary(&votes));
    println!();
    match &voters {
        Some(voters) => {
            print!("{}", views::render_dashboard(&views::Dashboard::new(voters, &queue)));
            print!("{}", views::render_voter_summary(voters));
        }
        None => print!("{}", views::render_queue_summary(&queue)),
    }
    Ok(())
}

// Waits on an optional live summary; a missing one never yields
async fn next_of<R: Summarize>(
    live: &mut Option<LiveSummary<R>>,
) -> Option<Result<R::Summary, FeedError>> {
    match live {
        Some(live) => live.next().await,
        None => std::future::pending().await,
    }
}

async fn watch(store: Arc<dyn CollectionStore>, config: &Config) -> Result<(), AppError> {
    let session = config.session();
    let mut votes = watch_summary::<VoteRecord>(Arc::clone(&store), &session, config.refresh_interval)?;
    let mut voters = match session.role {
        Role::Admin => Some(watch_summary::<VoterRecord>(
            Arc::clone(&store),
            &session,
            config.refresh_interval,
        )?),
        Role::Voter => None,
    };

    loop {
        tokio::select! {
            update = votes.next() => match update {
                Some(Ok(summary)) => print!("\n{}", views::render_vote_summary(&summary)),
                Some(Err(e)) => warn!("Live results unavailable: {}", e),
                None => return Err(FeedError::Closed.into()),
            },
            update = next_of(&mut voters) => match update {
                Some(Ok(summary)) => print!("\n{}", views::render_voter_summary(&summary)),
                Some(Err(e)) => warn!("Voter roll unavailable: {}", e),
                None => return Err(FeedError::Closed.into()),
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Stopping watch");
                break;
            }
        }
    }

    votes.cancel();
    if let Some(voters) = voters {
        voters.cancel();
    }
    Ok(())
}
