//! Minimal Twitch chat client over plain IRC.

mod irc_message;

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{tcp::OwnedWriteHalf, TcpStream},
    sync::Mutex,
    time::timeout,
};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::{
    commands::{ChatSender, CommandPipeline},
    rate_limiter::RateLimiter,
};

pub use irc_message::{IrcError, IrcMessage};

pub const DEFAULT_IRC_ADDRESS: &str = "irc.chat.twitch.tv:6667";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Quiet time after which we ping the server ourselves.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);
/// How long the server gets to answer our ping before the session is dropped.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest line accepted from the server. Longer lines are discarded.
const MAX_LINE_BYTES: u64 = 16 * 1024;

#[derive(Clone, Debug)]
pub struct TwitchConfig {
    pub address: String,
    pub username: String,
    /// Token without the `oauth:` prefix.
    pub token: String,
    /// Lowercase, with a leading `#`.
    pub channel: String,
}

impl TwitchConfig {
    pub fn new(address: &str, username: &str, token: &str, channel: &str) -> TwitchConfig {
        let token = token.trim();
        let channel = channel.trim().trim_start_matches('#').to_lowercase();

        TwitchConfig {
            address: address.to_owned(),
            username: username.trim().to_lowercase(),
            token: token.strip_prefix("oauth:").unwrap_or(token).to_owned(),
            channel: format!("#{channel}"),
        }
    }
}

pub struct TwitchClient {
    config: TwitchConfig,
}

impl TwitchClient {
    pub fn new(config: TwitchConfig) -> TwitchClient {
        TwitchClient { config }
    }

    /// Keeps a chat connection open, reconnecting whenever it drops.
    /// Messages are passed to `pipeline` strictly one after another.
    pub async fn run<L: RateLimiter>(&self, pipeline: &mut CommandPipeline<L>) {
        loop {
            match self
                .run_session(pipeline)
                .instrument(info_span!("twitch_session"))
                .await
            {
                Ok(()) => warn!("Disconnected from Twitch chat"),
                Err(err) => error!("Twitch chat connection failed: {err:#}"),
            }

            info!("Reconnecting in {RECONNECT_DELAY:?}");
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn run_session<L: RateLimiter>(
        &self,
        pipeline: &mut CommandPipeline<L>,
    ) -> anyhow::Result<()> {
        info!("Connecting to {}", self.config.address);

        let stream = TcpStream::connect(&self.config.address)
            .await
            .with_context(|| format!("Could not connect to {}", self.config.address))?;
        let (read_half, write_half) = stream.into_split();
        let writer = TwitchWriter::new(write_half);

        writer
            .send_raw(&format!("PASS oauth:{}", self.config.token))
            .await?;
        writer
            .send_raw(&format!("NICK {}", self.config.username))
            .await?;
        writer.send_raw("CAP REQ :twitch.tv/tags").await?;
        writer
            .send_raw(&format!("JOIN {}", self.config.channel))
            .await?;

        let mut reader = BufReader::new(read_half);
        let mut buffer = Vec::new();
        let mut awaiting_pong = false;

        loop {
            let wait = if awaiting_pong {
                PONG_TIMEOUT
            } else {
                KEEPALIVE_INTERVAL
            };

            let line = match timeout(wait, read_capped_line(&mut reader, &mut buffer)).await {
                Ok(line) => line?,
                Err(_) if awaiting_pong => {
                    return Err(anyhow!("No answer to keepalive ping within {PONG_TIMEOUT:?}"));
                }
                Err(_) => {
                    debug!("Connection quiet for {KEEPALIVE_INTERVAL:?}, pinging");
                    writer.send_raw("PING :tmi.twitch.tv").await?;
                    awaiting_pong = true;
                    continue;
                }
            };

            let Some(line) = line else {
                return Ok(());
            };
            awaiting_pong = false;

            let message = match line.parse::<IrcMessage>() {
                Ok(message) => message,
                Err(IrcError::Empty) => continue,
                Err(err) => {
                    warn!("Skipping unparsable line: {err}");
                    continue;
                }
            };

            match message.command.as_str() {
                "PING" => {
                    let server = message.trailing().unwrap_or("tmi.twitch.tv");
                    writer.send_raw(&format!("PONG :{server}")).await?;
                }

                "PRIVMSG" => {
                    if let Some(chat_message) = message.to_chat_message(&self.config.username) {
                        pipeline
                            .handle(&chat_message, OffsetDateTime::now_utc(), &writer)
                            .await;
                    }
                }

                "001" => info!("Logged in as {}", self.config.username),

                "JOIN" if message.nick() == Some(self.config.username.as_str()) => {
                    info!("Joined {}", self.config.channel);
                }

                "NOTICE" => warn!("Notice from Twitch: {}", message.trailing().unwrap_or("")),

                "RECONNECT" => {
                    info!("Twitch asked us to reconnect");
                    return Ok(());
                }

                other => debug!("Ignoring {other}"),
            }
        }
    }
}

/// Reads one line of at most [`MAX_LINE_BYTES`], skipping longer ones.
/// Invalid UTF-8 is replaced rather than rejected. Returns `None` at end of stream.
///
/// Bytes of an unfinished line stay in `buffer`, so a cancelled read picks up
/// where it left off.
async fn read_capped_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    loop {
        let limit = MAX_LINE_BYTES.saturating_sub(buffer.len() as u64);
        let read = (&mut *reader).take(limit).read_until(b'\n', buffer).await?;

        if buffer.ends_with(b"\n") || (read == 0 && !buffer.is_empty() && limit > 0) {
            let line = String::from_utf8_lossy(buffer).into_owned();
            buffer.clear();
            return Ok(Some(line));
        }

        if read == 0 && buffer.is_empty() {
            return Ok(None);
        }

        if buffer.len() as u64 >= MAX_LINE_BYTES {
            warn!("Discarding a line longer than {MAX_LINE_BYTES} bytes");
            buffer.clear();

            loop {
                let chunk = reader.fill_buf().await?;
                if chunk.is_empty() {
                    return Ok(None);
                }

                match chunk.iter().position(|byte| *byte == b'\n') {
                    Some(newline) => {
                        reader.consume(newline + 1);
                        break;
                    }
                    None => {
                        let skipped = chunk.len();
                        reader.consume(skipped);
                    }
                }
            }
        }
    }
}

/// Write side of a chat connection.
pub struct TwitchWriter {
    writer: Mutex<OwnedWriteHalf>,
}

impl TwitchWriter {
    fn new(writer: OwnedWriteHalf) -> TwitchWriter {
        TwitchWriter {
            writer: Mutex::new(writer),
        }
    }

    async fn send_raw(&self, line: &str) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ChatSender for TwitchWriter {
    async fn say(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        let text = text.replace(['\r', '\n'], " ");
        self.send_raw(&format!("PRIVMSG {channel} :{text}")).await
    }
}
