//! `desk` command line client.
//!
//! ```text
//! desk list --status "in progress"
//! desk show <ticket-id>
//! desk reply <ticket-id> "Thanks, fixed" --attach screenshot.png
//! desk status <ticket-id> closed
//! desk watch <ticket-id>
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use helpdesk::client::{
    Composer, DeskApi, DeskClient, LocalFile, LogNotifier, MessageSender, RealtimeConnection,
    SessionEvent, TicketSession,
};
use helpdesk::connectors::{ChatMessage, HttpObjectStorage};
use helpdesk::models::{Ticket, TicketStatus};
use helpdesk::telemetry::{get_subscriber, init_subscriber};
use std::path::PathBuf;
use std::time::Instant;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "desk", version, about = "Work support tickets from the terminal")]
struct Cli {
    /// Desk server base URL
    #[arg(long, env = "DESK_URL", default_value = "http://127.0.0.1:8000")]
    url: String,
    /// Bearer token issued by the auth service
    #[arg(long, env = "DESK_TOKEN", hide_env_values = true)]
    token: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List one page of tickets in a status bucket
    List {
        #[arg(long, default_value = "open")]
        status: TicketStatus,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Print a ticket with its conversation
    Show { id: Uuid },
    /// Reply to a ticket, optionally with attachments
    Reply {
        id: Uuid,
        #[arg(default_value = "")]
        message: String,
        /// Files to attach, uploaded in the given order
        #[arg(long = "attach", value_name = "FILE")]
        attachments: Vec<PathBuf>,
        /// Sign the reply with this avatar (admins only)
        #[arg(long)]
        avatar: Option<Uuid>,
        /// Object storage API URL
        #[arg(long, env = "DESK_STORAGE_URL")]
        storage_url: Option<String>,
        /// Object storage key
        #[arg(long, env = "DESK_STORAGE_KEY", hide_env_values = true)]
        storage_key: Option<String>,
        #[arg(long, env = "DESK_STORAGE_BUCKET", default_value = "ticket-attachments")]
        bucket: String,
    },
    /// Change a ticket's status
    Status { id: Uuid, status: TicketStatus },
    /// Follow a ticket's conversation live
    Watch { id: Uuid },
    /// Ask the assistant a question
    Chat { message: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // stdout carries command output, diagnostics go to stderr
    let subscriber = get_subscriber("desk".into(), "warn".into(), std::io::stderr);
    init_subscriber(subscriber);

    let client = DeskClient::new(&cli.url, &cli.token)?;

    match cli.command {
        Command::List {
            status,
            offset,
            limit,
        } => {
            let tickets = client.list_tickets(status, offset, limit).await?;
            let me = client.me().await?;
            for ticket in &tickets {
                println!(
                    "{}  {:<12} {:>3} unread  {}",
                    ticket.id,
                    ticket.status.as_str(),
                    ticket.unread_count(me.is_admin()),
                    ticket.subject
                );
            }
            if tickets.len() as i64 == limit {
                println!("… more with --offset {}", offset + limit);
            }
        }
        Command::Show { id } => {
            let ticket = client.ticket(id).await?;
            print_ticket(&ticket);
        }
        Command::Reply {
            id,
            message,
            attachments,
            avatar,
            storage_url,
            storage_key,
            bucket,
        } => {
            let me = client.me().await?;
            let ticket = client.ticket(id).await?;

            let mut composer = Composer::new();
            composer.set_text(message);
            for path in &attachments {
                let file = LocalFile::read(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                composer.add_file(file)?;
            }
            if !composer.can_send() {
                bail!("nothing to send: give a message or --attach a file");
            }

            let storage = match (storage_url, storage_key) {
                (Some(url), Some(key)) => HttpObjectStorage::new(&url, &key, &bucket),
                _ if attachments.is_empty() => HttpObjectStorage::new("", "", &bucket),
                _ => bail!("attachments need DESK_STORAGE_URL and DESK_STORAGE_KEY"),
            };

            let mut session = TicketSession::open(ticket, me.is_admin());
            let sender = MessageSender::new(&client, &storage, &LogNotifier);
            let stored = sender
                .send(&me, &mut session.thread, &mut composer, avatar)
                .await?;
            println!("sent {} ({} attachments)", stored.id, stored.attachments.len());
        }
        Command::Status { id, status } => {
            let ticket = client.update_status(id, status).await?;
            println!("{} is now {}", ticket.id, ticket.status);
        }
        Command::Watch { id } => watch(&client, id).await?,
        Command::Chat { message } => {
            let reply = client.chat(&[ChatMessage::user(message)]).await?;
            println!("{reply}");
        }
    }
    Ok(())
}

async fn watch(client: &DeskClient, id: Uuid) -> anyhow::Result<()> {
    let me = client.me().await?;
    let ticket = client.ticket(id).await?;
    print_ticket(&ticket);

    let mut session = TicketSession::open(ticket, me.is_admin());
    let mut connection = RealtimeConnection::connect(&client.realtime_url(), client.token()).await?;
    connection.subscribe(session.topic()).await?;

    loop {
        tokio::select! {
            frame = connection.next_message() => {
                let Some(frame) = frame else { break };
                match session.handle(frame?, None, Instant::now()) {
                    SessionEvent::ResponseMerged { scroll: true, mark_read } => {
                        if let Some(last) = session.thread.responses().last() {
                            println!("{}", format_response(last.is_admin, &last.message));
                        }
                        if mark_read {
                            client.mark_read(id).await?;
                        }
                    }
                    SessionEvent::TicketChanged => {
                        println!("-- ticket is now {}", session.thread.ticket.status);
                    }
                    SessionEvent::Typing => println!("-- typing…"),
                    SessionEvent::Status { status, topic } => {
                        tracing::debug!("channel {:?}: {}", topic, status);
                    }
                    _ => {}
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    connection.unsubscribe(session.topic()).await?;
    connection.close().await?;
    Ok(())
}

fn print_ticket(ticket: &Ticket) {
    println!("{} [{}] {}", ticket.id, ticket.status, ticket.subject);
    if !ticket.tags.is_empty() {
        let tags: Vec<_> = ticket.tags.iter().map(|t| t.name.as_str()).collect();
        println!("tags: {}", tags.join(", "));
    }
    println!("{}", ticket.message);
    for response in &ticket.ticket_responses {
        println!("{}", format_response(response.is_admin, &response.message));
        for attachment in &response.attachments {
            println!("    attachment: {} ({} bytes)", attachment.file_name, attachment.file_size);
        }
    }
}

fn format_response(is_admin: bool, message: &str) -> String {
    let who = if is_admin { "support" } else { "customer" };
    format!("  {who}: {message}")
}
