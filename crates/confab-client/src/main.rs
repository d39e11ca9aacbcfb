//! # confab
//!
//! Terminal demo for the confab messenger core: a contact list, one open
//! conversation, simulated calls, and oracle-generated counterparty
//! replies, persisted through the JSON mock store.
//!
//! With `CONFAB_ORACLE_URL` set the replies come from a real completion
//! endpoint; otherwise a scripted oracle keeps the demo fully offline.

use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use confab_client::presence::spawn_presence_simulator;
use confab_client::{ChatSession, Config};
use confab_oracle::{HttpOracle, ReplyOracle, ScriptedOracle};
use confab_shared::types::{MessageKind, Presence, Sender};
use confab_store::{Contact, ConversationStore, JsonStore, Message};

fn default_contacts() -> Vec<Contact> {
    vec![
        Contact::online("contact-1", "Alice"),
        Contact::offline("contact-2", "Bob", Utc::now() - chrono::Duration::minutes(15)),
        Contact::online("contact-3", "Charlie"),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,confab_client=info")),
        )
        .init();

    info!("Starting confab v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let store = match &config.data_dir {
        Some(dir) => JsonStore::open_at(dir, config.store_latency)?,
        None => JsonStore::new(config.store_latency)?,
    };

    match config.oracle_url.clone() {
        Some(url) => {
            let oracle = HttpOracle::new(url, config.oracle_api_key.clone())?;
            run(store, oracle, config).await
        }
        None => {
            info!("CONFAB_ORACLE_URL not set, replies come from the scripted oracle");
            run(store, ScriptedOracle::new(), config).await
        }
    }
}

async fn run<O: ReplyOracle + 'static>(
    store: JsonStore,
    oracle: O,
    config: Config,
) -> anyhow::Result<()> {
    let session = ChatSession::new(store, oracle, default_contacts(), config.timing.clone());
    session.bootstrap().await?;

    let presence = spawn_presence_simulator(
        &session,
        config.presence_tick,
        config.presence_flip_probability,
    );

    print_help();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut show_obfuscated = false;
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(' ') {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (line, ""),
        };

        let outcome = match command {
            "quit" | "exit" => break,
            "help" => {
                print_help();
                Ok(())
            }
            "contacts" => {
                for (i, contact) in session.contacts().await.iter().enumerate() {
                    println!("  [{i}] {} ({})", contact.name, presence_label(contact));
                }
                Ok(())
            }
            "open" => open_contact(&session, rest).await,
            "show" => {
                render_conversation(&session, show_obfuscated).await;
                Ok(())
            }
            "enc" => {
                show_obfuscated = !show_obfuscated;
                println!(
                    "  showing {} bodies",
                    if show_obfuscated { "obfuscated" } else { "plain" }
                );
                Ok(())
            }
            "send" => session.send_text(rest).await.map(|_| ()).map_err(Into::into),
            "file" => session.send_file(rest).await.map(|_| ()).map_err(Into::into),
            "suggest" => match session.suggest_reply(rest).await {
                Ok(suggestion) => {
                    println!("  suggestion: {suggestion}");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            "edit" => edit_by_index(&session, rest).await,
            "delete" => delete_by_index(&session, rest).await,
            "call" => session.start_call().await.map(|contact| {
                println!("  calling {}...", contact.name);
            }).map_err(Into::into),
            "hangup" => match session.end_call().await {
                Ok(Some(summary)) => {
                    if let MessageKind::Call { duration_secs } = summary.kind {
                        println!("  call ended after {duration_secs}s");
                    }
                    Ok(())
                }
                Ok(None) => {
                    println!("  call ended");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            },
            "profile" => session
                .update_profile(rest)
                .await
                .map(|profile| println!("  you are now {}", profile.name))
                .map_err(Into::into),
            // Bare text goes to the open conversation.
            _ => session.send_text(line).await.map(|_| ()).map_err(Into::into),
        };

        if let Err(e) = outcome {
            println!("  ! {e:#}");
        } else if matches!(command, "send" | "file" | "open") || !is_known_command(command) {
            // Give the simulated reply a moment, then re-render.
            tokio::time::sleep(Duration::from_millis(200)).await;
            render_conversation(&session, show_obfuscated).await;
        }
    }

    presence.abort();
    Ok(())
}

fn is_known_command(command: &str) -> bool {
    matches!(
        command,
        "quit"
            | "exit"
            | "help"
            | "contacts"
            | "open"
            | "show"
            | "enc"
            | "send"
            | "file"
            | "suggest"
            | "edit"
            | "delete"
            | "call"
            | "hangup"
            | "profile"
    )
}

fn print_help() {
    println!("commands:");
    println!("  contacts              list contacts and presence");
    println!("  open <n>              open a conversation by index");
    println!("  show                  re-render the open conversation");
    println!("  <text> | send <text>  send a message");
    println!("  file <name>           send a file");
    println!("  suggest <draft>       ask for a smart-reply suggestion");
    println!("  edit <n> <text>       edit message n");
    println!("  delete <n>            delete message n");
    println!("  call / hangup         manage a call with the open contact");
    println!("  enc                   toggle the obfuscated view");
    println!("  profile <name>        change your display name");
    println!("  quit");
}

async fn open_contact<S, O>(session: &ChatSession<S, O>, arg: &str) -> anyhow::Result<()>
where
    S: ConversationStore + 'static,
    O: ReplyOracle + 'static,
{
    let contacts = session.contacts().await;
    let contact = arg
        .parse::<usize>()
        .ok()
        .and_then(|i| contacts.get(i))
        .or_else(|| contacts.iter().find(|c| c.name.eq_ignore_ascii_case(arg)))
        .ok_or_else(|| anyhow::anyhow!("no such contact: {arg}"))?;
    session.select_contact(&contact.id).await?;
    Ok(())
}

async fn edit_by_index<S, O>(session: &ChatSession<S, O>, rest: &str) -> anyhow::Result<()>
where
    S: ConversationStore + 'static,
    O: ReplyOracle + 'static,
{
    let (index, text) = rest
        .split_once(' ')
        .ok_or_else(|| anyhow::anyhow!("usage: edit <n> <text>"))?;
    let message = message_at(session, index).await?;
    session.edit_message(&message.id, text.trim()).await?;
    Ok(())
}

async fn delete_by_index<S, O>(session: &ChatSession<S, O>, rest: &str) -> anyhow::Result<()>
where
    S: ConversationStore + 'static,
    O: ReplyOracle + 'static,
{
    let message = message_at(session, rest).await?;
    session.delete_message(&message.id).await?;
    Ok(())
}

async fn message_at<S, O>(session: &ChatSession<S, O>, index: &str) -> anyhow::Result<Message>
where
    S: ConversationStore + 'static,
    O: ReplyOracle + 'static,
{
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("not a message index: {index}"))?;
    session
        .messages()
        .await
        .get(index)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no message at index {index}"))
}

fn presence_label(contact: &Contact) -> String {
    match &contact.presence {
        Presence::Online => "online".to_string(),
        Presence::Offline { last_seen } => {
            format!("offline, last seen {}", last_seen.format("%H:%M"))
        }
    }
}

async fn render_conversation<S, O>(session: &ChatSession<S, O>, show_obfuscated: bool)
where
    S: ConversationStore + 'static,
    O: ReplyOracle + 'static,
{
    let Some(contact) = session.selected_contact().await else {
        println!("  (no conversation open, try `contacts` then `open <n>`)");
        return;
    };
    let profile = session.profile().await;
    println!("--- {} ({}) ---", contact.name, presence_label(&contact));
    for (i, msg) in session.messages().await.iter().enumerate() {
        println!("  [{i}] {}", render_message(msg, &contact, &profile.name, show_obfuscated));
    }
    if session.is_loading().await {
        println!("  ({} is typing...)", contact.name);
    }
}

/// One line per message. Deleted and call entries take priority over the
/// generic text/file rendering.
fn render_message(
    msg: &Message,
    contact: &Contact,
    profile_name: &str,
    show_obfuscated: bool,
) -> String {
    let speaker = match msg.sender {
        Sender::Me => profile_name,
        Sender::Them => contact.name.as_str(),
    };
    if msg.deleted {
        return format!("{speaker}: (message deleted)");
    }
    match &msg.kind {
        MessageKind::Call { duration_secs } => {
            format!("(call with {} ended, {duration_secs}s)", contact.name)
        }
        MessageKind::File { file_name } if msg.uploading => {
            format!("{speaker}: [file] {file_name} (uploading...)")
        }
        MessageKind::File { file_name } => {
            let receipt = if msg.read { " ✓✓" } else { "" };
            format!("{speaker}: [file] {file_name}{receipt}")
        }
        MessageKind::Text => {
            let body = if show_obfuscated {
                &msg.obfuscated_text
            } else {
                &msg.text
            };
            let edited = if msg.edited { " (edited)" } else { "" };
            let receipt = if msg.sender == Sender::Me && msg.read {
                " ✓✓"
            } else {
                ""
            };
            format!("{speaker}: {body}{edited}{receipt}")
        }
    }
}
