//! Protocol vocabulary shared by the word race server and its clients.
//!
//! Clients send plain text lines: the first whitespace-delimited token is the
//! command, the remaining tokens are positional arguments. The server answers
//! with JSON notifications, one per line, tagged by their `type` field.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Words shorter than this are dropped when dictionaries are loaded.
pub const MINIMUM_WORD_LENGTH: usize = 5;
/// Longest display name accepted by `connect`.
pub const MAX_NAME_LENGTH: usize = 16;
/// Default depth of every leaderboard category.
pub const SCORES_LENGTH: usize = 10;
/// Most rounds a single game may declare.
pub const MAX_ROUNDS: u32 = 10;

pub const ACTION_CONNECT: &str = "connect";
pub const ACTION_CREATE_GAME: &str = "create-game";
pub const ACTION_DELETE_GAME: &str = "delete-game";
pub const ACTION_JOIN_GAME: &str = "join-game";
pub const ACTION_LEAVE_GAME: &str = "leave-game";
pub const ACTION_START_GAME: &str = "start-game";
pub const ACTION_START_ROUND: &str = "start-round";
pub const ACTION_CLAIM_WORD: &str = "claim-word";
pub const ACTION_QUIT_GAME: &str = "quit-game";

/// Best speed of the round.
pub const AWARD_FASTEST: u32 = 1;
/// Most words caught during the round.
pub const AWARD_MOST_WORDS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown game style '{0}'")]
    GameStyle(String),
    #[error("unknown language '{0}'")]
    Language(String),
    #[error("unknown difficulty '{0}'")]
    Difficulty(String),
}

/// A client message split into its command and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub command: String,
    pub arguments: Vec<String>,
    /// Everything after the command, verbatim. `connect` uses this so that
    /// display names may contain spaces.
    pub raw_arguments: String,
}

impl Action {
    pub fn parse(line: &str) -> Self {
        let line = line.trim_start();
        let (command, rest) = match line.find(char::is_whitespace) {
            Some(pos) => (&line[..pos], &line[pos..]),
            None => (line, ""),
        };

        Self {
            command: command.to_string(),
            arguments: rest.split_whitespace().map(str::to_string).collect(),
            raw_arguments: rest.trim().to_string(),
        }
    }

    /// Returns true if at least `count` positional arguments were supplied.
    pub fn check_arguments_count(&self, count: usize) -> bool {
        self.arguments.len() >= count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStyle {
    /// One shared word list, each word goes to the first player typing it.
    Capture,
    /// Every player types every word, fastest finisher wins.
    Race,
}

impl GameStyle {
    pub const ALL: [GameStyle; 2] = [GameStyle::Capture, GameStyle::Race];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameStyle::Capture => "capture",
            GameStyle::Race => "race",
        }
    }
}

impl FromStr for GameStyle {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "capture" => Ok(GameStyle::Capture),
            "race" => Ok(GameStyle::Race),
            _ => Err(ParseError::GameStyle(s.to_string())),
        }
    }
}

impl fmt::Display for GameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Fr];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

impl FromStr for Language {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            _ => Err(ParseError::Language(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    /// Every difficulty, in the order leaderboards are reported.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Number of words in each round of a game at this difficulty.
    pub fn words_per_round(&self) -> usize {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Normal => 15,
            Difficulty::Hard => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseError::Difficulty(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leaderboards are kept separately for every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameCategory {
    pub style: GameStyle,
    pub language: Language,
    pub difficulty: Difficulty,
}

impl GameCategory {
    pub fn new(style: GameStyle, language: Language, difficulty: Difficulty) -> Self {
        Self {
            style,
            language,
            difficulty,
        }
    }
}

impl fmt::Display for GameCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.style, self.language, self.difficulty)
    }
}

/// Name used by leaderboard slots that nobody holds yet.
pub const PLACEHOLDER_NAME: &str = "-";

/// One leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopScore {
    pub user_name: String,
    pub speed: f32,
}

impl TopScore {
    pub fn new(user_name: impl Into<String>, speed: f32) -> Self {
        Self {
            user_name: user_name.into(),
            speed,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.user_name == PLACEHOLDER_NAME
    }
}

impl Default for TopScore {
    fn default() -> Self {
        Self::new(PLACEHOLDER_NAME, 0.0)
    }
}

/// All the top scores of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopScoresDto {
    pub style: GameStyle,
    pub language: Language,
    pub difficulty: Difficulty,
    pub scores: Vec<TopScore>,
}

/// Round and game results of one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreDto {
    pub user_name: String,
    pub points: u32,
    pub speed: f32,
    pub awards: u32,
    pub victories: u32,
    pub best_speed: f32,
    pub top_rank: usize,
    pub top_speed: f32,
}

/// A game as shown in the lobby.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDto {
    pub id: u64,
    pub creator: String,
    pub style: GameStyle,
    pub language: Language,
    pub difficulty: Difficulty,
    pub rounds: u32,
    pub players: Vec<String>,
}

/// Messages sent from the server to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Notification {
    /// The requested display name is empty or too long.
    IncorrectName,
    /// The requested display name is held by another player.
    UsedName,
    /// Sent when a player arrives in the lobby.
    Lobby { user_name: String, games: Vec<GameDto> },
    /// The list of declared games changed.
    GamesList { games: Vec<GameDto> },
    /// The game the player joined was deleted by its creator.
    GameDeleted,
    GameStart { game: GameDto, manager: String },
    RoundStart { round: u32, words: Vec<String> },
    WordClaimed { word: String, user_name: String },
    PlayerLeft { user_name: String, manager: String },
    RoundEnd {
        round: u32,
        scores: Vec<ScoreDto>,
        top_scores: TopScoresDto,
        game_over: bool,
        manager: String,
    },
}

impl Notification {
    /// Encodes the notification as a single JSON line, without the newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
