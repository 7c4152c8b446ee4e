//! Wire protocol: command classification, user-facing strings, and line
//! formatting.
//!
//! The protocol is line-oriented, newline-terminated UTF-8. The first line a
//! client sends is its nickname; every later line is either a recognized
//! command token or free chat text.

use chrono::{DateTime, Local};

/// Prefix carried by every server-originated chat line
pub const CHAT_PREFIX: &str = "[CHAT] ";

/// Timestamp format used in broadcast lines
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Language for user-facing strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Portuguese,
}

impl Language {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "portuguese" | "pt" | "pt-br" => Self::Portuguese,
            _ => Self::English,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Portuguese => "portuguese",
        }
    }

    /// Get the string set for this language
    pub fn lexicon(&self) -> Lexicon {
        match self {
            Self::English => Lexicon::ENGLISH,
            Self::Portuguese => Lexicon::PORTUGUESE,
        }
    }
}

/// The swappable set of user-facing tokens and strings.
///
/// The English and Portuguese sets describe one identical protocol; only the
/// spelling of the tokens and notices differs.
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    /// Command that asks the server for the connected-user list
    pub users_command: &'static str,
    /// Token a client sends to voluntarily end its session
    pub quit_sentinel: &'static str,
    /// Client-local command that prints the available commands
    pub help_command: &'static str,
    /// Client-local command that clears the terminal screen
    pub clear_command: &'static str,
    /// Header of the user list reply
    pub user_list_header: &'static str,
    /// Reply when no users are connected
    pub no_users: &'static str,
    /// Suffix of the join notice, appended after the nickname
    pub joined_suffix: &'static str,
    /// Suffix of the leave notice, appended after the nickname
    pub left_suffix: &'static str,
    /// Lines printed by the client-local help command
    pub help_banner: &'static [&'static str],
}

impl Lexicon {
    pub const ENGLISH: Lexicon = Lexicon {
        users_command: "/users",
        quit_sentinel: "##quit##",
        help_command: "/help",
        clear_command: "/clear",
        user_list_header: "Connected users:",
        no_users: "No users connected.",
        joined_suffix: "joined the chat.",
        left_suffix: "left the chat.",
        help_banner: &[
            "Available commands:",
            "/users - Lists all connected users.",
            "/clear - Clears the terminal screen.",
            "/help - Displays this list of commands.",
            "##quit## - Leave the chat.",
        ],
    };

    pub const PORTUGUESE: Lexicon = Lexicon {
        users_command: "/usuarios",
        quit_sentinel: "##sair##",
        help_command: "/ajuda",
        clear_command: "/limpar",
        user_list_header: "Usuarios conectados:",
        no_users: "Nenhum usuario conectado.",
        joined_suffix: "entrou no chat.",
        left_suffix: "saiu do chat.",
        help_banner: &[
            "Comandos disponiveis:",
            "/usuarios - Lista todos os usuarios conectados.",
            "/limpar - Limpa a tela do terminal.",
            "/ajuda - Mostra esta lista de comandos.",
            "##sair## - Sai do chat.",
        ],
    };
}

/// What the server does with one inbound line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Reply with the connected-user list, to this connection only
    ListUsers,
    /// Tear the session down
    Quit,
    /// Broadcast the trimmed text to every participant
    Chat(&'a str),
}

impl<'a> Command<'a> {
    /// Classify one inbound line.
    ///
    /// Returns `None` for empty or whitespace-only input, which produces no
    /// observable side effect. Command tokens match case-insensitively.
    pub fn classify(line: &'a str, lexicon: &Lexicon) -> Option<Command<'a>> {
        let text = line.trim();
        if text.is_empty() {
            return None;
        }
        if text.eq_ignore_ascii_case(lexicon.users_command) {
            return Some(Command::ListUsers);
        }
        if text.eq_ignore_ascii_case(lexicon.quit_sentinel) {
            return Some(Command::Quit);
        }
        Some(Command::Chat(text))
    }
}

/// Format a chat broadcast line: `[CHAT] <timestamp> (<nickname>) - <text>`
pub fn chat_line(nickname: &str, text: &str, when: DateTime<Local>) -> String {
    format!(
        "{}{} ({}) - {}",
        CHAT_PREFIX,
        when.format(TIMESTAMP_FORMAT),
        nickname,
        text
    )
}

/// Format the join notice broadcast when a participant registers
pub fn join_notice(nickname: &str, lexicon: &Lexicon) -> String {
    format!("{}{} {}", CHAT_PREFIX, nickname, lexicon.joined_suffix)
}

/// Format the leave notice broadcast when a participant is removed
pub fn leave_notice(nickname: &str, lexicon: &Lexicon) -> String {
    format!("{}{} {}", CHAT_PREFIX, nickname, lexicon.left_suffix)
}
