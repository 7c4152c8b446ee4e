//! Terminal chat client.
//!
//! Connects to the relay, sends the nickname as its first line, then
//! multiplexes stdin and the server stream. Help and clear are handled
//! locally; everything else, including the quit sentinel, goes to the
//! server.

use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::error::{ChatError, Result};
use crate::protocol::{Language, Lexicon, CHAT_PREFIX};
use crate::server::connection::ConnectionWriter;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address as host:port
    pub server_addr: String,
    pub nickname: String,
    pub language: Language,
}

/// What to do with one line the user typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalAction<'a> {
    Ignore,
    ShowHelp,
    ClearScreen,
    Send(&'a str),
    SendAndQuit(&'a str),
}

fn classify_local<'a>(input: &'a str, lexicon: &Lexicon) -> LocalAction<'a> {
    let text = input.trim();
    if text.is_empty() {
        return LocalAction::Ignore;
    }
    if text.eq_ignore_ascii_case(lexicon.help_command) {
        return LocalAction::ShowHelp;
    }
    if text.eq_ignore_ascii_case(lexicon.clear_command) {
        return LocalAction::ClearScreen;
    }
    if text.eq_ignore_ascii_case(lexicon.quit_sentinel) {
        return LocalAction::SendAndQuit(text);
    }
    LocalAction::Send(text)
}

pub struct Client {
    config: ClientConfig,
    lexicon: Lexicon,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let lexicon = config.language.lexicon();
        Self { config, lexicon }
    }

    /// Run the session until quit, stdin EOF, or the server closes
    pub async fn run(&self) -> Result<()> {
        if !self.config.server_addr.contains(':') {
            return Err(ChatError::InvalidAddress(self.config.server_addr.clone()));
        }

        let stream = TcpStream::connect(&self.config.server_addr).await?;
        info!("Connected to server {}", self.config.server_addr);

        let (read_half, write_half) = stream.into_split();
        let mut server_lines = BufReader::new(read_half).lines();
        let writer = ConnectionWriter::new(write_half);

        writer.send_line(&self.config.nickname).await?;

        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdin_lines = stdin.lines();

        loop {
            tokio::select! {
                line = server_lines.next_line() => {
                    match line? {
                        Some(line) => self.render(line.trim()),
                        None => {
                            warn!("Connection to server lost. Client will be closed.");
                            break;
                        }
                    }
                }
                line = stdin_lines.next_line() => {
                    let Some(input) = line? else { break };
                    if !self.handle_input(&input, &writer).await? {
                        break;
                    }
                }
            }
        }

        info!("Client disconnected. Exiting application.");
        Ok(())
    }

    /// Render one server line on the terminal
    fn render(&self, line: &str) {
        if line.is_empty() {
            return;
        }

        // Chat lines are printed with the prefix stripped
        if let Some(body) = line.strip_prefix(CHAT_PREFIX) {
            println!("{}", body);
            return;
        }

        // User list replies are printed verbatim
        if line.starts_with(self.lexicon.user_list_header)
            || line.starts_with("- ")
            || line == self.lexicon.no_users
        {
            println!("\n{}", line);
            return;
        }

        info!("{}", line);
    }

    /// Handle one typed line; returns `false` when the session should end
    async fn handle_input(&self, input: &str, writer: &ConnectionWriter) -> Result<bool> {
        match classify_local(input, &self.lexicon) {
            LocalAction::Ignore => Ok(true),
            LocalAction::ShowHelp => {
                println!();
                for line in self.lexicon.help_banner {
                    println!("{}", line);
                }
                println!();
                Ok(true)
            }
            LocalAction::ClearScreen => {
                print!("\x1b[H\x1b[2J");
                let _ = std::io::stdout().flush();
                Ok(true)
            }
            LocalAction::Send(text) => {
                writer.send_line(text).await?;
                Ok(true)
            }
            LocalAction::SendAndQuit(text) => {
                writer.send_line(text).await?;
                info!("{} left the chat.", self.config.nickname);
                Ok(false)
            }
        }
    }
}
