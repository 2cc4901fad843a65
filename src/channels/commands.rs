//! Chat commands accepted from the authorized Telegram chat.

/// A recognised chat command. Each maps to exactly one queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ApplyEssences,
    OpenBoxes,
    Feed,
    Prize,
    Play,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::ApplyEssences,
        Command::OpenBoxes,
        Command::Feed,
        Command::Prize,
        Command::Play,
    ];

    /// Parse the leading token of a message.
    ///
    /// Accepts the `/command@botname` form Telegram uses in group chats.
    /// Anything after the first whitespace is ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let token = text.split_whitespace().next()?;
        let name = token.split('@').next().unwrap_or(token);
        Self::ALL.into_iter().find(|cmd| cmd.slash() == name)
    }

    pub fn slash(self) -> &'static str {
        match self {
            Self::ApplyEssences => "/essence",
            Self::OpenBoxes => "/boxes",
            Self::Feed => "/feed",
            Self::Prize => "/prize",
            Self::Play => "/play",
        }
    }

    /// Reply sent to the chat right after the job is queued.
    pub fn acknowledgement(self) -> &'static str {
        match self {
            Self::ApplyEssences => "✨ Essence application queued.",
            Self::OpenBoxes => "📦 Loot box opening queued.",
            Self::Feed => "🍗 Feeding queued.",
            Self::Prize => "🎁 Prize collection queued.",
            Self::Play => "🎮 Play session queued.",
        }
    }
}
