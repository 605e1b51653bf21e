//! Prefix command parsing and the command vocabulary.

/// A message split into command name and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased first word after the prefix.
    pub name: String,
    pub args: Vec<String>,
}

impl ParsedCommand {
    /// Arguments joined back with single spaces.
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }
}

/// Splits `content` into a command if it is addressed to the bot.
///
/// Returns `None` when the prefix is missing or nothing follows it.
pub fn parse(prefix: &str, content: &str) -> Option<ParsedCommand> {
    let body = content.strip_prefix(prefix)?;
    let mut words = body.split_whitespace();
    let name = words.next()?.to_lowercase();

    Some(ParsedCommand {
        name,
        args: words.map(str::to_string).collect(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Resume,
    Skip,
    Stop,
    Queue,
    NowPlaying,
    Volume,
    Shuffle,
    Loop,
    Remove,
    Clear,
    Status,
    Help,
}

impl Command {
    /// Every command in the order `help` lists them.
    pub const ALL: [Command; 14] = [
        Command::Play,
        Command::Pause,
        Command::Resume,
        Command::Skip,
        Command::Stop,
        Command::Queue,
        Command::NowPlaying,
        Command::Volume,
        Command::Shuffle,
        Command::Loop,
        Command::Remove,
        Command::Clear,
        Command::Status,
        Command::Help,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let command = match name {
            "play" => Command::Play,
            "pause" => Command::Pause,
            "resume" => Command::Resume,
            "skip" => Command::Skip,
            "stop" => Command::Stop,
            "queue" => Command::Queue,
            "nowplaying" | "np" => Command::NowPlaying,
            "volume" => Command::Volume,
            "shuffle" => Command::Shuffle,
            "loop" => Command::Loop,
            "remove" => Command::Remove,
            "clear" => Command::Clear,
            "status" => Command::Status,
            "help" => Command::Help,
            _ => return None,
        };
        Some(command)
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Play => "play",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Skip => "skip",
            Command::Stop => "stop",
            Command::Queue => "queue",
            Command::NowPlaying => "nowplaying",
            Command::Volume => "volume",
            Command::Shuffle => "shuffle",
            Command::Loop => "loop",
            Command::Remove => "remove",
            Command::Clear => "clear",
            Command::Status => "status",
            Command::Help => "help",
        }
    }

    /// Command name plus its argument placeholder, as shown in `help`.
    pub fn usage(self) -> &'static str {
        match self {
            Command::Play => "play <query>",
            Command::Volume => "volume <0-100>",
            Command::Remove => "remove <position>",
            other => other.name(),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::Play => "Play a song or playlist",
            Command::Pause => "Pause the current track",
            Command::Resume => "Resume the current track",
            Command::Skip => "Skip the current track",
            Command::Stop => "Stop playback and clear queue",
            Command::Queue => "Show the current queue",
            Command::NowPlaying => "Show current track info",
            Command::Volume => "Adjust player volume",
            Command::Shuffle => "Shuffle the current queue",
            Command::Loop => "Toggle queue loop mode",
            Command::Remove => "Remove a track from queue",
            Command::Clear => "Clear the current queue",
            Command::Status => "Show player status",
            Command::Help => "Show this help message",
        }
    }

    pub fn requires_voice(self) -> bool {
        !matches!(self, Command::Help | Command::Status)
    }

    pub fn guild_only(self) -> bool {
        self != Command::Help
    }
}
