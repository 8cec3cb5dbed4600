use std::{collections::HashMap, str::FromStr};

use thiserror::Error;

use crate::commands::ChatMessage;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IrcError {
    #[error("empty line")]
    Empty,
    #[error("no command in line {0:?}")]
    MissingCommand(String),
}

/// One line of the IRC protocol with IRCv3 tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    pub tags: HashMap<String, String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
}

impl IrcMessage {
    /// The nickname part of a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        prefix.split('!').next().filter(|nick| !nick.is_empty())
    }

    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Converts a `PRIVMSG` into a chat message. Any other command yields `None`.
    pub fn to_chat_message(&self, bot_username: &str) -> Option<ChatMessage> {
        if self.command != "PRIVMSG" {
            return None;
        }

        let [channel, text] = self.params.as_slice() else {
            return None;
        };

        let login = self.nick()?;
        let sender = match self.tags.get("display-name") {
            Some(display_name) if !display_name.is_empty() => display_name.clone(),
            _ => login.to_owned(),
        };

        Some(ChatMessage {
            channel: channel.clone(),
            sender,
            text: text.clone(),
            is_self: login.eq_ignore_ascii_case(bot_username),
        })
    }
}

impl FromStr for IrcMessage {
    type Err = IrcError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if rest.trim().is_empty() {
            return Err(IrcError::Empty);
        }

        let mut tags = HashMap::new();
        if let Some(tagged) = rest.strip_prefix('@') {
            let (raw_tags, remainder) = tagged.split_once(' ').unwrap_or((tagged, ""));
            for tag in raw_tags.split(';').filter(|tag| !tag.is_empty()) {
                let (key, value) = tag.split_once('=').unwrap_or((tag, ""));
                tags.insert(key.to_owned(), unescape_tag_value(value));
            }
            rest = remainder.trim_start_matches(' ');
        }

        let mut prefix = None;
        if let Some(prefixed) = rest.strip_prefix(':') {
            let (raw_prefix, remainder) = prefixed.split_once(' ').unwrap_or((prefixed, ""));
            prefix = Some(raw_prefix.to_owned());
            rest = remainder.trim_start_matches(' ');
        }

        let (command, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        if command.is_empty() {
            return Err(IrcError::MissingCommand(line.to_owned()));
        }

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }

            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_owned());
                break;
            }

            let (param, remainder) = rest.split_once(' ').unwrap_or((rest, ""));
            params.push(param.to_owned());
            rest = remainder;
        }

        Ok(IrcMessage {
            tags,
            prefix,
            command: command.to_ascii_uppercase(),
            params,
        })
    }
}

fn unescape_tag_value(value: &str) -> String {
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }

        match chars.next() {
            Some(':') => unescaped.push(';'),
            Some('s') => unescaped.push(' '),
            Some('r') => unescaped.push('\r'),
            Some('n') => unescaped.push('\n'),
            Some(other) => unescaped.push(other),
            // A lone trailing backslash is dropped.
            None => {}
        }
    }

    unescaped
}

#[cfg(test)]
mod tests {
    use map_macro::hash_map;

    use super::{IrcError, IrcMessage};

    #[test]
    fn parses_privmsg_with_tags() {
        let message: IrcMessage = "@badge-info=;display-name=Cool\\sViewer;mod=0 :coolviewer!coolviewer@coolviewer.tmi.twitch.tv PRIVMSG #streamer :!video https://youtu.be/XYZ789\r\n"
            .parse()
            .unwrap();

        assert_eq!(
            message.tags,
            hash_map! {
                "badge-info".to_owned() => "".to_owned(),
                "display-name".to_owned() => "Cool Viewer".to_owned(),
                "mod".to_owned() => "0".to_owned(),
            }
        );
        assert_eq!(message.nick(), Some("coolviewer"));
        assert_eq!(message.command, "PRIVMSG");
        assert_eq!(
            message.params,
            ["#streamer", "!video https://youtu.be/XYZ789"]
        );
    }

    #[test]
    fn parses_ping() {
        let message: IrcMessage = "PING :tmi.twitch.tv".parse().unwrap();

        assert_eq!(message.prefix, None);
        assert_eq!(message.command, "PING");
        assert_eq!(message.trailing(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn parses_numeric_replies() {
        let message: IrcMessage = ":tmi.twitch.tv 001 videobot :Welcome, GLHF!"
            .parse()
            .unwrap();

        assert_eq!(message.prefix.as_deref(), Some("tmi.twitch.tv"));
        assert_eq!(message.command, "001");
        assert_eq!(message.params, ["videobot", "Welcome, GLHF!"]);
    }

    #[test]
    fn unescapes_tag_values() {
        let message: IrcMessage = r"@a=one\:two;b=back\\slash;c=trailing\ :x PRIVMSG #c :hi"
            .parse()
            .unwrap();

        assert_eq!(message.tags["a"], "one;two");
        assert_eq!(message.tags["b"], r"back\slash");
        assert_eq!(message.tags["c"], "trailing");
    }

    #[test]
    fn rejects_empty_lines() {
        assert_eq!("".parse::<IrcMessage>(), Err(IrcError::Empty));
        assert_eq!("\r\n".parse::<IrcMessage>(), Err(IrcError::Empty));
        assert!(matches!(
            ":prefix.only".parse::<IrcMessage>(),
            Err(IrcError::MissingCommand(_))
        ));
    }

    #[test]
    fn chat_message_prefers_display_name() {
        let message: IrcMessage =
            "@display-name=Viewer :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #streamer :hello"
                .parse()
                .unwrap();

        let chat = message.to_chat_message("videobot").unwrap();
        assert_eq!(chat.channel, "#streamer");
        assert_eq!(chat.sender, "Viewer");
        assert_eq!(chat.text, "hello");
        assert!(!chat.is_self);
    }

    #[test]
    fn chat_message_falls_back_to_login() {
        let message: IrcMessage =
            "@display-name= :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #streamer :hello"
                .parse()
                .unwrap();

        assert_eq!(message.to_chat_message("videobot").unwrap().sender, "viewer");
    }

    #[test]
    fn chat_message_detects_self() {
        let message: IrcMessage =
            ":videobot!videobot@videobot.tmi.twitch.tv PRIVMSG #streamer :@Viewer added!"
                .parse()
                .unwrap();

        assert!(message.to_chat_message("VideoBot").unwrap().is_self);
    }

    #[test]
    fn only_privmsg_is_chat() {
        let message: IrcMessage = ":videobot!videobot@videobot.tmi.twitch.tv JOIN #streamer"
            .parse()
            .unwrap();

        assert!(message.to_chat_message("videobot").is_none());
    }
}
