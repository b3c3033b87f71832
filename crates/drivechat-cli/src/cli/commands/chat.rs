//! Interactive chat loop.
//!
//! REPL-style: reads user input line by line, drives one turn at a time
//! through the chat reducer, and executes the returned effects (network
//! dispatch, stage timers, session teardown). The loop blocks on the event
//! channel while a turn is in flight, so input stays disabled until the
//! turn resolves.

use std::io::{BufRead, Write};

use anyhow::Result;
use drivechat_core::api::ApiClient;
use drivechat_core::chat::{ChatEffect, ChatEvent, ChatState, Stage, StageTuning, update};
use drivechat_core::config::Config;
use drivechat_core::folders::FolderScope;
use drivechat_core::protocol::IntermediateStep;
use drivechat_core::session::{Session, SessionStore};
use tokio::sync::mpsc;

const QUIT_COMMAND: &str = ":q";
const PROMPT_PREFIX: &str = "you> ";
const ASSISTANT_PREFIX: &str = "assistant> ";

pub async fn run(
    api: &ApiClient,
    store: &SessionStore,
    config: &Config,
    session: &Session,
) -> Result<()> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    run_loop(stdin.lock(), &mut stdout.lock(), api, store, config, session).await
}

/// Runs the chat loop over explicit input/output (testable seam).
pub async fn run_loop<R, W>(
    input: R,
    output: &mut W,
    api: &ApiClient,
    store: &SessionStore,
    config: &Config,
    session: &Session,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Drive Chat")?;
    if !session.name.is_empty() {
        writeln!(output, "Logged in as {} <{}>", session.name, session.email)?;
    }
    writeln!(
        output,
        "Commands: :folders [filter], :folder <id|none>, :clear, :q to quit"
    )?;

    let (tx, mut rx) = mpsc::channel::<ChatEvent>(32);
    let mut state = ChatState::new(StageTuning::from_config(config));
    let mut scope = FolderScope::new();

    write!(output, "{PROMPT_PREFIX}")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed == QUIT_COMMAND {
            writeln!(output, "Goodbye!")?;
            return Ok(());
        }

        if trimmed.is_empty() {
            write!(output, "{PROMPT_PREFIX}")?;
            output.flush()?;
            continue;
        }

        // Commands end at the first whitespace; the remainder is the argument.
        let (command, arg) = match trimmed.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (trimmed, ""),
        };

        match command {
            ":clear" => {
                update(&mut state, scope.selected(), ChatEvent::Clear);
                writeln!(output, "History cleared.")?;
            }
            ":folders" => {
                ensure_catalog(&mut scope, api, &session.token).await;
                print_folders(output, &scope, arg)?;
            }
            ":folder" if arg.is_empty() => {
                writeln!(output, "Usage: :folder <id|none>")?;
            }
            ":folder" => {
                ensure_catalog(&mut scope, api, &session.token).await;
                select_folder(output, &mut scope, arg)?;
            }
            _ if command.starts_with(':') => {
                writeln!(output, "Unknown command: {command}")?;
            }
            _ => {
                let session_expired = run_turn(
                    output, trimmed, &mut state, &scope, api, store, session, &tx, &mut rx,
                )
                .await?;
                if session_expired {
                    writeln!(output, "Please run `drivechat login` to continue.")?;
                    return Ok(());
                }
            }
        }

        write!(output, "{PROMPT_PREFIX}")?;
        output.flush()?;
    }

    Ok(())
}

/// Drives one turn to resolution. Returns true if the session expired.
#[allow(clippy::too_many_arguments)]
async fn run_turn<W: Write>(
    output: &mut W,
    text: &str,
    state: &mut ChatState,
    scope: &FolderScope,
    api: &ApiClient,
    store: &SessionStore,
    session: &Session,
    tx: &mpsc::Sender<ChatEvent>,
    rx: &mut mpsc::Receiver<ChatEvent>,
) -> Result<bool> {
    let submit = ChatEvent::Submit {
        text: text.to_string(),
    };
    let effects = update(state, scope.selected(), submit);
    if effects.is_empty() {
        return Ok(false);
    }

    let mut session_expired = false;
    execute_effects(effects, api, store, &session.token, tx, &mut session_expired).await?;

    let mut last_stage = state.turn.stage();
    let rendered = state.history.len();

    while !state.turn.is_idle() {
        let Some(event) = rx.recv().await else {
            break;
        };
        let effects = update(state, scope.selected(), event);
        execute_effects(effects, api, store, &session.token, tx, &mut session_expired).await?;

        let stage = state.turn.stage();
        if stage != last_stage && stage != Stage::Idle {
            writeln!(output, "[{}]", stage.label())?;
            last_stage = stage;
        }
    }

    for message in &state.history[rendered..] {
        print_assistant_message(output, &message.content, &message.steps, message.tokens)?;
    }

    Ok(session_expired)
}

/// Executes reducer effects: spawns the network call and stage timers,
/// cancels resolved timers, tears the session down.
async fn execute_effects(
    effects: Vec<ChatEffect>,
    api: &ApiClient,
    store: &SessionStore,
    token: &str,
    tx: &mpsc::Sender<ChatEvent>,
    session_expired: &mut bool,
) -> Result<()> {
    for effect in effects {
        match effect {
            ChatEffect::SendChat {
                generation,
                request,
            } => {
                let api = api.clone();
                let token = token.to_string();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = api.send_chat(&token, &request).await;
                    let _ = tx
                        .send(ChatEvent::TurnResolved {
                            generation,
                            result,
                        })
                        .await;
                });
            }
            ChatEffect::ScheduleStage {
                generation,
                stage,
                delay,
                cancel,
            } => {
                let tx = tx.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        () = cancel.cancelled() => {}
                        () = tokio::time::sleep(delay) => {
                            let _ = tx
                                .send(ChatEvent::StageTimerFired { generation, stage })
                                .await;
                        }
                    }
                });
            }
            ChatEffect::CancelStageTimers { cancel } => {
                cancel.cancel();
            }
            ChatEffect::InvalidateSession => {
                store.invalidate()?;
                *session_expired = true;
            }
        }
    }
    Ok(())
}

/// Triggers at most one catalog fetch per session (coalesced in the scope).
async fn ensure_catalog(scope: &mut FolderScope, api: &ApiClient, token: &str) {
    if scope.begin_fetch() {
        let folders = api.fetch_folders(token).await;
        scope.complete_fetch(folders);
    }
}

fn print_folders<W: Write>(output: &mut W, scope: &FolderScope, filter: &str) -> Result<()> {
    let folders = scope.filter(filter);
    if folders.is_empty() {
        writeln!(output, "No folders available.")?;
        return Ok(());
    }
    for folder in folders {
        let marker = if scope.selected() == Some(folder.id.as_str()) {
            "*"
        } else {
            " "
        };
        writeln!(output, "{marker} {}  {}", folder.id, folder.name)?;
    }
    Ok(())
}

fn select_folder<W: Write>(output: &mut W, scope: &mut FolderScope, arg: &str) -> Result<()> {
    if arg.is_empty() || arg.eq_ignore_ascii_case("none") {
        scope.select(None);
        writeln!(output, "Folder scope cleared.")?;
        return Ok(());
    }

    // Exact id first, then a unique name match.
    let resolved = if scope.filter("").iter().any(|f| f.id == arg) {
        Some(arg.to_string())
    } else {
        let matches = scope.filter(arg);
        match matches.as_slice() {
            [folder] => Some(folder.id.clone()),
            _ => None,
        }
    };

    match resolved {
        Some(id) => {
            scope.select(Some(id));
            let name = scope
                .selected_folder()
                .map_or_else(|| arg.to_string(), |f| f.name.clone());
            writeln!(output, "Scoped to folder: {name}")?;
        }
        None => {
            writeln!(output, "Unknown folder: {arg}")?;
        }
    }
    Ok(())
}

fn print_assistant_message<W: Write>(
    output: &mut W,
    content: &str,
    steps: &[IntermediateStep],
    tokens: Option<u64>,
) -> Result<()> {
    writeln!(output, "{ASSISTANT_PREFIX}{content}")?;
    for step in steps {
        writeln!(output, "  [{}] {}", step.action, step.observation)?;
    }
    if let Some(tokens) = tokens
        && tokens > 0
    {
        writeln!(output, "  ({tokens} tokens)")?;
    }
    Ok(())
}
