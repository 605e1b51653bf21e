use thiserror::Error;

use crate::audio::node::NodeError;

/// Why a command produced an error reply instead of doing its work.
///
/// Every variant except [`CommandError::Node`] is the user's fault (bad input
/// or a failed precondition) and its message is shown verbatim.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("This command only works in a server!")]
    GuildOnly,
    #[error("You must be in a voice channel!")]
    NotInVoice,
    #[error("Please provide a search query!")]
    EmptyQuery,
    #[error("No results found! Try a different search term.")]
    NoResults,
    #[error("Spotify support is not configured!")]
    SpotifyDisabled,
    #[error("Nothing is playing!")]
    NoSession,
    #[error("No more tracks in queue!")]
    NothingToSkip,
    #[error("Player is already paused!")]
    AlreadyPaused,
    #[error("Player is already playing!")]
    AlreadyPlaying,
    #[error("Volume must be 0-100!")]
    InvalidVolume,
    #[error("Provide a position between 1 and {len}")]
    InvalidPosition { len: usize },
    #[error("Not enough tracks to shuffle!")]
    NothingToShuffle,
    #[error("Queue is already empty!")]
    AlreadyEmpty,
    #[error("Queue is empty!")]
    QueueEmpty,
    #[error("Nothing is currently playing!")]
    NoCurrentTrack,
    #[error("No active player found!")]
    NoPlayer,
    #[error(transparent)]
    Node(#[from] NodeError),
}

impl CommandError {
    /// Text shown to the user. Node failures get a generic message; the
    /// details only go to the log.
    pub fn user_message(&self, command: &str) -> String {
        match self {
            CommandError::Node(_) if command == "play" => {
                "Error while trying to play the track. Try again later.".to_string()
            }
            CommandError::Node(_) => {
                "An unexpected error occurred while handling that command.".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, CommandError::Node(_))
    }
}
