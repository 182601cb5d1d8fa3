//! Connection loop: registers with the server, keeps the session alive and
//! spawns one task per command invocation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tokio_util::codec::{AnyDelimiterCodec, FramedRead};
use tracing::{debug, error, info, warn};

use super::reply::Replier;
use super::{IrcError, Message};
use crate::commands::{self, Invocation};
use crate::{Context, Data};

/// Longest inbound line accepted, tags included.
const MAX_LINE_LENGTH: usize = 8192;
/// Lines queued for the writer before senders wait.
const OUTBOUND_CAPACITY: usize = 64;
/// How long in-flight replies get to drain after the session ends.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects to the configured server and runs until it closes the
/// connection or Ctrl-C is pressed.
pub async fn run(data: Arc<Data>) -> Result<(), IrcError> {
    run_until(data, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Like [`run`], but quits when `shutdown` completes.
pub async fn run_until<F>(data: Arc<Data>, shutdown: F) -> Result<(), IrcError>
where
    F: Future<Output = ()>,
{
    let irc = &data.config.irc;
    info!(server = %irc.server, port = irc.port, "Connecting");
    let stream = TcpStream::connect((irc.server.as_str(), irc.port)).await?;
    let (reader, writer) = stream.into_split();

    let (outbound, rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let writer_task = tokio::spawn(write_loop(writer, rx));

    let codec =
        AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\r\n".to_vec(), MAX_LINE_LENGTH);
    let mut lines = FramedRead::new(reader, codec);
    let mut session = Session::new(data.clone(), outbound);
    session.register().await?;

    tokio::pin!(shutdown);
    let result = loop {
        tokio::select! {
            line = lines.next() => {
                // Not every client sends UTF-8.
                let line = match line {
                    Some(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
                    Some(Err(e)) => break Err(IrcError::from(e)),
                    None => break Ok(()),
                };
                let msg = match line.parse::<Message>() {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!("Ignoring line: {}", e);
                        continue;
                    }
                };
                match session.handle(msg).await {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Closed(reason)) => break Err(IrcError::Closed(reason)),
                    Err(e) => break Err(e),
                }
            }
            _ = &mut shutdown => {
                info!("Shutting down");
                session.send(Message::new("QUIT", ["Shutting down"])).await?;
                break Ok(());
            }
        }
    };

    // Command tasks still hold senders; give their replies a moment to flush.
    drop(session);
    match tokio::time::timeout(DRAIN_TIMEOUT, writer_task).await {
        Ok(Ok(Err(e))) => warn!("Writer stopped with error: {}", e),
        Ok(Err(e)) => error!("Writer task failed: {}", e),
        Err(_) => warn!("Timed out waiting for pending replies"),
        Ok(Ok(Ok(()))) => {}
    }

    result
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Message>,
) -> Result<(), IrcError> {
    while let Some(msg) = rx.recv().await {
        if msg.command == "PASS" {
            debug!("-> PASS ********");
        } else {
            debug!("-> {}", msg);
        }
        writer.write_all(format!("{msg}\r\n").as_bytes()).await?;
    }
    writer.shutdown().await?;
    Ok(())
}

/// What the read loop should do after a message.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Closed(String),
}

struct Session {
    data: Arc<Data>,
    outbound: mpsc::Sender<Message>,
    nick: String,
}

impl Session {
    fn new(data: Arc<Data>, outbound: mpsc::Sender<Message>) -> Self {
        let nick = data.config.irc.nick.clone();
        Self {
            data,
            outbound,
            nick,
        }
    }

    async fn send(&self, msg: Message) -> Result<(), IrcError> {
        self.outbound
            .send(msg)
            .await
            .map_err(|_| IrcError::Closed("outbound queue closed".to_string()))
    }

    async fn register(&self) -> Result<(), IrcError> {
        let irc = &self.data.config.irc;
        if let Some(password) = &irc.password {
            self.send(Message::new("PASS", [password.as_str()])).await?;
        }
        self.send(Message::new("NICK", [self.nick.as_str()])).await?;
        self.send(Message::new(
            "USER",
            [irc.username.as_str(), "0", "*", irc.realname.as_str()],
        ))
        .await
    }

    async fn handle(&mut self, msg: Message) -> Result<Flow, IrcError> {
        match msg.command.as_str() {
            "PING" => {
                self.send(Message::new("PONG", msg.params)).await?;
            }
            // RPL_WELCOME: registration complete.
            "001" => {
                if let Some(nick) = msg.param(0) {
                    self.nick = nick.to_string();
                }
                info!(nick = %self.nick, "Registered");
                for channel in &self.data.config.irc.channels {
                    self.send(Message::new("JOIN", [channel.as_str()])).await?;
                }
            }
            // ERR_NICKNAMEINUSE
            "433" => {
                self.nick.push('_');
                warn!(nick = %self.nick, "Nick in use, retrying");
                self.send(Message::new("NICK", [self.nick.as_str()])).await?;
            }
            "PRIVMSG" => self.on_privmsg(&msg),
            "ERROR" => {
                let reason = msg.param(0).unwrap_or_default().to_string();
                return Ok(Flow::Closed(reason));
            }
            _ => debug!("<- {}", msg),
        }
        Ok(Flow::Continue)
    }

    fn on_privmsg(&self, msg: &Message) {
        let (Some(nick), Some(target), Some(text)) = (msg.source_nick(), msg.param(0), msg.param(1))
        else {
            return;
        };
        // CTCP requests (VERSION, ACTION, ...) are not commands.
        if text.starts_with('\x01') {
            return;
        }

        let irc = &self.data.config.irc;
        let private = target.eq_ignore_ascii_case(&self.nick);
        let invocation = Invocation::parse(text, &irc.command_prefix, &self.nick).or_else(|| {
            if private {
                Invocation::from_body(text)
            } else {
                None
            }
        });
        let Some(invocation) = invocation else {
            return;
        };

        let replier = match Replier::new(
            Arc::new(self.outbound.clone()),
            target,
            nick,
            self.data.config.chunk_limit,
        ) {
            Ok(replier) => replier,
            Err(e) => {
                error!("Unable to build replier: {}", e);
                return;
            }
        };

        debug!(name = %invocation.name, %nick, "Dispatching command");
        let ctx = Context {
            data: self.data.clone(),
            replier,
        };
        tokio::spawn(async move {
            commands::dispatch(&ctx, &invocation).await;
        });
    }
}
