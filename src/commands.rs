#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    About,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming<'a> {
    Command(Command),
    /// Slash-prefixed text that is not one of ours; dropped silently.
    Ignored,
    Chat(&'a str),
}

/// Classifies inbound text. `/cmd@name` only counts when `name` is this bot.
pub fn parse<'a>(text: &'a str, bot_username: Option<&str>) -> Incoming<'a> {
    let Some(rest) = text.strip_prefix('/') else {
        return Incoming::Chat(text);
    };

    let word = rest.split_whitespace().next().unwrap_or("");
    let (name, target) = match word.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (word, None),
    };
    if let Some(target) = target {
        let addressed_to_us = bot_username
            .map(|me| me.eq_ignore_ascii_case(target))
            .unwrap_or(false);
        if !addressed_to_us {
            return Incoming::Ignored;
        }
    }

    match name.to_lowercase().as_str() {
        "start" => Incoming::Command(Command::Start),
        "help" => Incoming::Command(Command::Help),
        "about" => Incoming::Command(Command::About),
        "clear" => Incoming::Command(Command::Clear),
        _ => Incoming::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(parse("hello /start", None), Incoming::Chat("hello /start"));
        assert_eq!(parse("", None), Incoming::Chat(""));
    }

    #[test]
    fn known_commands() {
        assert_eq!(parse("/start", None), Incoming::Command(Command::Start));
        assert_eq!(parse("/help me", None), Incoming::Command(Command::Help));
        assert_eq!(parse("/About", None), Incoming::Command(Command::About));
        assert_eq!(parse("/clear", None), Incoming::Command(Command::Clear));
    }

    #[test]
    fn unknown_slash_text_is_ignored() {
        assert_eq!(parse("/weather Paris", None), Incoming::Ignored);
        assert_eq!(parse("/", None), Incoming::Ignored);
    }

    #[test]
    fn addressed_commands() {
        assert_eq!(parse("/clear@relay_bot", Some("relay_bot")), Incoming::Command(Command::Clear));
        assert_eq!(parse("/clear@Relay_Bot", Some("relay_bot")), Incoming::Command(Command::Clear));
        assert_eq!(parse("/clear@other_bot", Some("relay_bot")), Incoming::Ignored);
        assert_eq!(parse("/clear@relay_bot", None), Incoming::Ignored);
    }
}
