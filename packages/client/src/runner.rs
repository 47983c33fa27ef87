//! Client session: one signaling channel, one peer session, no reconnect.

use std::fmt;

use futures_util::{Sink, SinkExt, StreamExt};
use relaycast_server::infrastructure::dto::websocket::{ClientEvent, ServerEvent};
use relaycast_shared::time::now_millis;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{
    driver::{Driver, Output},
    error::ClientError,
    formatter::MessageFormatter,
    media::{MediaEngine, SimulatedMediaEngine},
    session::{BroadcasterSession, Input, Session, UserCommand, ViewerSession},
    ui::{Command, parse_line, redisplay_prompt},
};

/// Which side of the broadcast this client plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Role {
    Broadcaster,
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Broadcaster => f.write_str("broadcaster"),
            Role::Viewer => f.write_str("viewer"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub url: String,
    pub role: Role,
    /// Camera names known to the media engine; the first is the default.
    pub cameras: Vec<String>,
    pub deny_camera: bool,
}

fn build_session(options: &ClientOptions) -> Box<dyn Session> {
    match options.role {
        Role::Broadcaster => Box::new(BroadcasterSession::new(options.cameras.clone())),
        Role::Viewer => Box::new(ViewerSession::new()),
    }
}

/// Run the client until the user leaves or the relay closes the channel
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let (ws_stream, _) = connect_async(&options.url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to relay at {} as {}", options.url, options.role);
    let prompt = options.role.to_string();
    print!(
        "{}",
        MessageFormatter::format_connected(&options.url, &prompt)
    );

    let (mut write, mut read) = ws_stream.split();

    let mut engine = SimulatedMediaEngine::new(options.cameras.clone());
    engine.set_deny_camera(options.deny_camera);
    let mut driver = Driver::new(build_session(&options), engine);

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    spawn_readline(prompt.clone(), input_tx);

    let outputs = driver.start().await;
    deliver(&mut write, outputs, &prompt).await?;

    loop {
        tokio::select! {
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    let outputs = on_frame(&mut driver, text.as_str(), &prompt).await;
                    deliver(&mut write, outputs, &prompt).await?;
                }
                Some(Ok(Message::Binary(data))) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&prompt);
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Relay closed the connection");
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // readline ended (Ctrl+C / Ctrl+D)
                    break;
                };
                let outputs = match parse_line(&line) {
                    None => continue,
                    Some(Command::Chat(text)) => vec![Output::Send(ClientEvent::SendMessage(text))],
                    Some(Command::User(UserCommand::Exit)) => break,
                    Some(Command::User(command)) => driver.handle(Input::User(command)).await,
                    Some(Command::EndScreenShare) => {
                        if driver.engine_mut().end_screen_share() {
                            driver.pump_engine().await
                        } else {
                            vec![Output::Status("No screen share is live".to_string())]
                        }
                    }
                    Some(Command::Status) => vec![Output::Status(driver.session().summary())],
                    Some(Command::Help) => {
                        print!("{}", MessageFormatter::format_help());
                        redisplay_prompt(&prompt);
                        continue;
                    }
                    Some(Command::Unknown(command)) => {
                        vec![Output::Status(format!("Unknown command '{}', try /help", command))]
                    }
                };
                deliver(&mut write, outputs, &prompt).await?;
            }
        }
    }

    // The channel is going away, so only local teardown is reported
    for output in driver.close().await {
        if let Output::Status(text) = output {
            print!("{}", MessageFormatter::format_status(&text));
        }
    }
    write.close().await.ok();
    tracing::info!("Client session ended");
    Ok(())
}

async fn on_frame<E: MediaEngine>(driver: &mut Driver<E>, text: &str, prompt: &str) -> Vec<Output> {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(ServerEvent::NewMessage(message)) => {
            print!(
                "{}",
                MessageFormatter::format_chat_message(&message, now_millis())
            );
            redisplay_prompt(prompt);
            Vec::new()
        }
        Ok(ServerEvent::UpdateViewers(count)) => {
            print!("{}", MessageFormatter::format_viewer_count(count));
            redisplay_prompt(prompt);
            Vec::new()
        }
        Ok(event) => driver.handle(Input::Relay(event)).await,
        Err(e) => {
            tracing::warn!("Unrecognized frame from relay: {}", e);
            print!("{}", MessageFormatter::format_raw_message(text));
            redisplay_prompt(prompt);
            Vec::new()
        }
    }
}

/// Send frames to the relay and print status lines, in order.
async fn deliver<S>(write: &mut S, outputs: Vec<Output>, prompt: &str) -> Result<(), ClientError>
where
    S: Sink<Message> + Unpin,
    S::Error: fmt::Display,
{
    for output in outputs {
        match output {
            Output::Send(event) => {
                let json = serde_json::to_string(&event)?;
                write
                    .send(Message::Text(json.into()))
                    .await
                    .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
            }
            Output::Status(text) => {
                print!("{}", MessageFormatter::format_status(&text));
                redisplay_prompt(prompt);
            }
        }
    }
    Ok(())
}

/// Read lines on a blocking thread and forward them to the async loop.
fn spawn_readline(prompt: String, input_tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", prompt);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });
}
