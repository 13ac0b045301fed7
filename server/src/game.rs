//! Game model: players, rounds and word claims.
//!
//! A game is first declared in the lobby, where players may join it, then
//! started by its creator. It is played in a fixed number of rounds, each one
//! with its own word list. The manager (initially the creator) starts the
//! rounds; when the manager quits, the next player takes over.
//!
//! Two styles exist. In capture games the word list is shared and every word
//! goes to the first player typing it. In race games every player types every
//! word, and the round ends once everybody is done.

use crate::leaderboard::Leaderboard;
use crate::score::Score;
use crate::session::SessionId;
use crate::word_selector::WordSelectionError;
use log::{debug, info};
use shared::{
    Difficulty, GameDto, GameStyle, Language, Notification, ScoreDto, AWARD_FASTEST,
    AWARD_MOST_WORDS,
};
use std::cmp::Reverse;
use std::collections::HashSet;

pub type GameId = u64;

/// Settings chosen by the creator of a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameDescriptor {
    pub creator: String,
    pub style: GameStyle,
    pub language: Language,
    pub difficulty: Difficulty,
    pub rounds: u32,
}

impl GameDescriptor {
    pub fn words_per_round(&self) -> usize {
        self.difficulty.words_per_round()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("unknown game {0}")]
    UnknownGame(GameId),

    #[error("game {0} is already started")]
    AlreadyStarted(GameId),

    #[error("'{0}' already declared a game")]
    AlreadyDeclared(String),

    #[error("session is not in a game")]
    NotInGame,

    #[error("only the manager of the game can do this")]
    NotManager,

    #[error("a round is already running")]
    RoundRunning,

    #[error("no round is running")]
    NoRoundRunning,

    #[error("all the rounds were played")]
    GameOver,

    #[error("could not select the words: {0}")]
    Words(#[from] WordSelectionError),
}

/// What a word claim changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Not a word of the round, or already claimed
    Rejected,
    /// Capture game: the word now belongs to the claimer, tell everybody
    Captured,
    /// Race game: one less word for the claimer only
    Typed,
}

#[derive(Debug)]
struct Player {
    session: SessionId,
    score: Score,
    /// Words this player still has to type, race games only
    remaining: HashSet<String>,
}

impl Player {
    fn new(session: SessionId, user_name: &str) -> Self {
        Self {
            session,
            score: Score::new(user_name),
            remaining: HashSet::new(),
        }
    }
}

#[derive(Debug)]
struct Round {
    number: u32,
    words: Vec<String>,
    started_at: u64,
    /// Words nobody captured yet, capture games only
    unclaimed: HashSet<String>,
}

#[derive(Debug)]
pub struct Game {
    id: GameId,
    descriptor: GameDescriptor,
    players: Vec<Player>,
    creator: SessionId,
    manager: SessionId,
    started: bool,
    rounds_played: u32,
    round: Option<Round>,
}

impl Game {
    /// Declares a game, its creator being the first player and the manager.
    pub fn new(id: GameId, descriptor: GameDescriptor, creator: SessionId) -> Self {
        let creator_player = Player::new(creator, &descriptor.creator);
        Self {
            id,
            descriptor,
            players: vec![creator_player],
            creator,
            manager: creator,
            started: false,
            rounds_played: 0,
            round: None,
        }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn descriptor(&self) -> &GameDescriptor {
        &self.descriptor
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_round_running(&self) -> bool {
        self.round.is_some()
    }

    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    /// True once every declared round was played.
    pub fn is_over(&self) -> bool {
        self.rounds_played >= self.descriptor.rounds
    }

    pub fn manager(&self) -> SessionId {
        self.manager
    }

    pub fn manager_name(&self) -> String {
        self.player(self.manager)
            .map(|p| p.score.user_name.clone())
            .unwrap_or_default()
    }

    pub fn is_creator(&self, session: SessionId) -> bool {
        self.creator == session
    }

    pub fn has_player(&self, session: SessionId) -> bool {
        self.player(session).is_some()
    }

    pub fn player_sessions(&self) -> Vec<SessionId> {
        self.players.iter().map(|p| p.session).collect()
    }

    pub fn player_name(&self, session: SessionId) -> Option<&str> {
        self.player(session).map(|p| p.score.user_name.as_str())
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Current score of a player
    pub fn score(&self, session: SessionId) -> Option<&Score> {
        self.player(session).map(|p| &p.score)
    }

    /// Player with the most victories so far. On a tie, the one who reached
    /// that count first leads.
    pub fn leader(&self) -> Option<&Score> {
        self.players
            .iter()
            .map(|p| &p.score)
            .filter(|s| s.victories > 0)
            .min_by_key(|s| (Reverse(s.victories), s.latest_victory_timestamp()))
    }

    /// Words of the running round
    pub fn words(&self) -> Option<&[String]> {
        self.round.as_ref().map(|r| r.words.as_slice())
    }

    fn player(&self, session: SessionId) -> Option<&Player> {
        self.players.iter().find(|p| p.session == session)
    }

    pub fn add_player(&mut self, session: SessionId, user_name: &str) -> Result<(), GameError> {
        if self.started {
            return Err(GameError::AlreadyStarted(self.id));
        }
        if !self.has_player(session) {
            self.players.push(Player::new(session, user_name));
        }
        Ok(())
    }

    /// Removes a player. When the manager leaves, the next player becomes
    /// the manager. Returns false if the session was not playing.
    pub fn remove_player(&mut self, session: SessionId) -> bool {
        let Some(index) = self.players.iter().position(|p| p.session == session) else {
            return false;
        };
        self.players.remove(index);

        if self.manager == session {
            if let Some(next) = self.players.first() {
                self.manager = next.session;
                info!(
                    "Game {}: '{}' is the new manager",
                    self.id, next.score.user_name
                );
            }
        }
        true
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        if self.started {
            return Err(GameError::AlreadyStarted(self.id));
        }
        self.started = true;
        info!(
            "Game {} started with {} players",
            self.id,
            self.players.len()
        );
        Ok(())
    }

    /// Checks that `session` may start the next round right now.
    pub fn check_start_round(&self, session: SessionId) -> Result<(), GameError> {
        if !self.has_player(session) {
            return Err(GameError::NotInGame);
        }
        if self.manager != session {
            return Err(GameError::NotManager);
        }
        if self.round.is_some() {
            return Err(GameError::RoundRunning);
        }
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        Ok(())
    }

    /// Starts the next round with the given words, `now` being the start
    /// timestamp in milliseconds.
    pub fn start_round(
        &mut self,
        session: SessionId,
        words: Vec<String>,
        now: u64,
    ) -> Result<Notification, GameError> {
        self.check_start_round(session)?;

        let number = self.rounds_played + 1;
        for player in &mut self.players {
            player.score.reset_points();
            player.remaining = match self.descriptor.style {
                GameStyle::Race => words.iter().cloned().collect(),
                GameStyle::Capture => HashSet::new(),
            };
        }

        let unclaimed = match self.descriptor.style {
            GameStyle::Capture => words.iter().cloned().collect(),
            GameStyle::Race => HashSet::new(),
        };

        info!("Game {}: round {} started", self.id, number);
        self.round = Some(Round {
            number,
            words: words.clone(),
            started_at: now,
            unclaimed,
        });

        Ok(Notification::RoundStart {
            round: number,
            words,
        })
    }

    /// Claims a word for a player at timestamp `now`.
    pub fn claim_word(
        &mut self,
        session: SessionId,
        word: &str,
        now: u64,
    ) -> Result<ClaimOutcome, GameError> {
        let style = self.descriptor.style;
        let id = self.id;
        let Some(round) = self.round.as_mut() else {
            return Err(GameError::NoRoundRunning);
        };
        let Some(player) = self.players.iter_mut().find(|p| p.session == session) else {
            return Err(GameError::NotInGame);
        };

        let claimed = match style {
            GameStyle::Capture => round.unclaimed.remove(word),
            GameStyle::Race => player.remaining.remove(word),
        };
        if !claimed {
            debug!(
                "Game {}: '{}' cannot claim '{}'",
                id, player.score.user_name, word
            );
            return Ok(ClaimOutcome::Rejected);
        }

        player.score.increment_points_at(now);
        Ok(match style {
            GameStyle::Capture => ClaimOutcome::Captured,
            GameStyle::Race => ClaimOutcome::Typed,
        })
    }

    /// True when a round is running and nothing is left to claim.
    pub fn is_round_complete(&self) -> bool {
        match &self.round {
            Some(round) => match self.descriptor.style {
                GameStyle::Capture => round.unclaimed.is_empty(),
                GameStyle::Race => self.players.iter().all(|p| p.remaining.is_empty()),
            },
            None => false,
        }
    }

    /// Closes the running round: computes speeds, grants the awards and the
    /// victory, then ranks the players in the leaderboard.
    pub fn end_round(&mut self, leaderboard: &Leaderboard) -> Result<Notification, GameError> {
        let round = self.round.take().ok_or(GameError::NoRoundRunning)?;
        self.rounds_played = round.number;

        for player in &mut self.players {
            player.score.update_speeds(round.started_at);
            player.remaining.clear();
        }
        self.grant_awards();
        self.grant_victory();

        let descriptor = &self.descriptor;
        leaderboard.update_top_scores(
            descriptor.style,
            descriptor.language,
            descriptor.difficulty,
            self.players.iter_mut().map(|p| &mut p.score),
            round.words.len() as u32,
        );

        let mut scores: Vec<ScoreDto> = self.players.iter().map(|p| p.score.to_dto()).collect();
        scores.sort_by(|a, b| b.speed.total_cmp(&a.speed));

        info!(
            "Game {}: round {} of {} ended",
            self.id, round.number, self.descriptor.rounds
        );
        if self.is_over() {
            match self.leader() {
                Some(leader) => info!(
                    "Game {} won by '{}' with {} victories",
                    self.id, leader.user_name, leader.victories
                ),
                None => info!("Game {} is over without a winner", self.id),
            }
        }

        Ok(Notification::RoundEnd {
            round: round.number,
            scores,
            top_scores: leaderboard.top_scores_for(
                self.descriptor.style,
                self.descriptor.language,
                self.descriptor.difficulty,
            ),
            game_over: self.is_over(),
            manager: self.manager_name(),
        })
    }

    fn grant_awards(&mut self) {
        let best_speed = self
            .players
            .iter()
            .map(|p| p.score.speed)
            .fold(0.0_f32, f32::max);
        let most_words = self.players.iter().map(|p| p.score.points).max().unwrap_or(0);

        for player in &mut self.players {
            if best_speed > 0.0 && player.score.speed == best_speed {
                player.score.add_award(AWARD_FASTEST);
            }
            if most_words > 0 && player.score.points == most_words {
                player.score.add_award(AWARD_MOST_WORDS);
            }
        }
    }

    /// The round winner has the most words, the fastest one on a tie.
    fn grant_victory(&mut self) {
        let winner = self
            .players
            .iter_mut()
            .filter(|p| p.score.points > 0)
            .reduce(|best, p| {
                let better = p.score.points > best.score.points
                    || (p.score.points == best.score.points && p.score.speed > best.score.speed);
                if better {
                    p
                } else {
                    best
                }
            });

        if let Some(winner) = winner {
            winner.score.increment_victories();
        }
    }

    pub fn to_dto(&self) -> GameDto {
        GameDto {
            id: self.id,
            creator: self.descriptor.creator.clone(),
            style: self.descriptor.style,
            language: self.descriptor.language,
            difficulty: self.descriptor.difficulty,
            rounds: self.descriptor.rounds,
            players: self
                .players
                .iter()
                .map(|p| p.score.user_name.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn descriptor(style: GameStyle, rounds: u32) -> GameDescriptor {
        GameDescriptor {
            creator: "alice".to_string(),
            style,
            language: Language::En,
            difficulty: Difficulty::Easy,
            rounds,
        }
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn started_game(style: GameStyle, rounds: u32) -> Game {
        let mut game = Game::new(1, descriptor(style, rounds), 10);
        game.add_player(20, "bob").unwrap();
        game.start().unwrap();
        game
    }

    fn round_end_scores(notification: &Notification) -> &[ScoreDto] {
        match notification {
            Notification::RoundEnd { scores, .. } => scores,
            other => panic!("Expected a round end, got {:?}", other),
        }
    }

    #[test]
    fn test_declared_game() {
        let mut game = Game::new(3, descriptor(GameStyle::Race, 2), 10);
        game.add_player(20, "bob").unwrap();
        game.add_player(20, "bob").unwrap();

        assert_eq!(game.manager(), 10);
        assert!(game.is_creator(10));
        assert!(!game.is_creator(20));
        assert_eq!(game.player_count(), 2);

        let dto = game.to_dto();
        assert_eq!(dto.id, 3);
        assert_eq!(dto.creator, "alice");
        assert_eq!(dto.players, vec!["alice", "bob"]);
    }

    #[test]
    fn test_cannot_join_started_game() {
        let mut game = started_game(GameStyle::Race, 1);
        assert_eq!(game.add_player(30, "carol"), Err(GameError::AlreadyStarted(1)));
        assert_eq!(game.start(), Err(GameError::AlreadyStarted(1)));
    }

    #[test]
    fn test_only_manager_starts_rounds() {
        let mut game = started_game(GameStyle::Capture, 1);
        assert_eq!(
            game.start_round(20, words(&["apple"]), 0),
            Err(GameError::NotManager)
        );
        assert_eq!(game.check_start_round(99), Err(GameError::NotInGame));

        game.start_round(10, words(&["apple"]), 0).unwrap();
        assert_eq!(game.check_start_round(10), Err(GameError::RoundRunning));
    }

    #[test]
    fn test_capture_first_claimer_wins() {
        let mut game = started_game(GameStyle::Capture, 1);
        game.start_round(10, words(&["apple", "banana"]), 1_000)
            .unwrap();

        assert_eq!(game.claim_word(20, "apple", 2_000), Ok(ClaimOutcome::Captured));
        assert_eq!(game.claim_word(10, "apple", 2_100), Ok(ClaimOutcome::Rejected));
        assert_eq!(game.claim_word(10, "cherry", 2_200), Ok(ClaimOutcome::Rejected));
        assert!(!game.is_round_complete());

        assert_eq!(game.claim_word(10, "banana", 4_000), Ok(ClaimOutcome::Captured));
        assert!(game.is_round_complete());
        assert_eq!(game.score(10).unwrap().points, 1);
        assert_eq!(game.score(20).unwrap().points, 1);
    }

    #[test]
    fn test_race_players_type_every_word() {
        let mut game = started_game(GameStyle::Race, 1);
        game.start_round(10, words(&["apple", "banana"]), 1_000)
            .unwrap();

        assert_eq!(game.claim_word(10, "apple", 2_000), Ok(ClaimOutcome::Typed));
        assert_eq!(game.claim_word(20, "apple", 2_500), Ok(ClaimOutcome::Typed));
        assert_eq!(game.claim_word(20, "apple", 2_600), Ok(ClaimOutcome::Rejected));
        assert_eq!(game.claim_word(10, "banana", 3_000), Ok(ClaimOutcome::Typed));
        assert!(!game.is_round_complete());

        assert_eq!(game.claim_word(20, "banana", 4_000), Ok(ClaimOutcome::Typed));
        assert!(game.is_round_complete());
    }

    #[test]
    fn test_claim_without_round() {
        let mut game = started_game(GameStyle::Race, 1);
        assert_eq!(
            game.claim_word(10, "apple", 0),
            Err(GameError::NoRoundRunning)
        );
    }

    #[test]
    fn test_race_round_end_ranks_and_awards() {
        let leaderboard = Leaderboard::new(3);
        let mut game = started_game(GameStyle::Race, 2);
        game.start_round(10, words(&["apple", "banana"]), 0).unwrap();

        // alice: 2 words in 1 s, bob: 2 words in 2 s
        game.claim_word(10, "apple", 500).unwrap();
        game.claim_word(10, "banana", 1_000).unwrap();
        game.claim_word(20, "apple", 1_500).unwrap();
        game.claim_word(20, "banana", 2_000).unwrap();

        let notification = game.end_round(&leaderboard).unwrap();
        let scores = round_end_scores(&notification);

        assert_eq!(scores[0].user_name, "alice");
        assert_approx_eq!(scores[0].speed, 120.0);
        assert_eq!(scores[0].awards, AWARD_FASTEST | AWARD_MOST_WORDS);
        assert_eq!(scores[0].victories, 1);
        assert_eq!(scores[0].top_rank, 1);

        assert_eq!(scores[1].user_name, "bob");
        assert_approx_eq!(scores[1].speed, 60.0);
        assert_eq!(scores[1].awards, AWARD_MOST_WORDS);
        assert_eq!(scores[1].victories, 0);
        assert_eq!(scores[1].top_rank, 2);

        match notification {
            Notification::RoundEnd {
                round,
                top_scores,
                game_over,
                manager,
                ..
            } => {
                assert_eq!(round, 1);
                assert!(!game_over);
                assert_eq!(manager, "alice");
                assert_eq!(top_scores.scores[0].user_name, "alice");
                assert_eq!(top_scores.scores[1].user_name, "bob");
                assert!(top_scores.scores[2].is_placeholder());
            }
            _ => unreachable!(),
        }
        assert_eq!(game.rounds_played(), 1);
        assert!(!game.is_round_running());
    }

    #[test]
    fn test_incomplete_players_are_not_ranked() {
        let leaderboard = Leaderboard::new(3);
        let mut game = started_game(GameStyle::Capture, 1);
        game.start_round(10, words(&["apple", "banana"]), 0).unwrap();
        game.claim_word(10, "apple", 500).unwrap();
        game.claim_word(20, "banana", 1_000).unwrap();

        let notification = game.end_round(&leaderboard).unwrap();
        assert!(round_end_scores(&notification)
            .iter()
            .all(|s| s.top_rank == 0));
        assert!(leaderboard
            .top_scores_for(GameStyle::Capture, Language::En, Difficulty::Easy)
            .scores
            .iter()
            .all(|s| s.is_placeholder()));
    }

    #[test]
    fn test_game_over_after_last_round() {
        let leaderboard = Leaderboard::new(3);
        let mut game = started_game(GameStyle::Capture, 1);
        game.start_round(10, words(&["apple"]), 0).unwrap();
        game.claim_word(20, "apple", 100).unwrap();

        match game.end_round(&leaderboard).unwrap() {
            Notification::RoundEnd { game_over, .. } => assert!(game_over),
            other => panic!("Unexpected {:?}", other),
        }
        assert!(game.is_over());
        assert_eq!(game.check_start_round(10), Err(GameError::GameOver));
        assert_eq!(game.score(20).unwrap().victories, 1);
    }

    #[test]
    fn test_leader_has_most_victories() {
        let leaderboard = Leaderboard::new(3);
        let mut game = started_game(GameStyle::Capture, 2);
        assert!(game.leader().is_none());

        for round in 0..2 {
            game.start_round(10, words(&["apple"]), round * 1_000).unwrap();
            game.claim_word(20, "apple", round * 1_000 + 100).unwrap();
            game.end_round(&leaderboard).unwrap();
        }

        let leader = game.leader().unwrap();
        assert_eq!(leader.user_name, "bob");
        assert_eq!(leader.victories, 2);
    }

    #[test]
    fn test_leader_tie_goes_to_first_to_reach_it() {
        let mut game = started_game(GameStyle::Race, 2);
        game.players[1].score.increment_victories_at(1_000);
        game.players[0].score.increment_victories_at(2_000);
        assert_eq!(game.leader().unwrap().user_name, "bob");

        game.players[0].score.increment_victories_at(3_000);
        assert_eq!(game.leader().unwrap().user_name, "alice");
    }

    #[test]
    fn test_next_round_resets_points() {
        let leaderboard = Leaderboard::new(3);
        let mut game = started_game(GameStyle::Capture, 2);
        game.start_round(10, words(&["apple"]), 0).unwrap();
        game.claim_word(20, "apple", 100).unwrap();
        game.end_round(&leaderboard).unwrap();

        match game.start_round(10, words(&["cherry"]), 1_000).unwrap() {
            Notification::RoundStart { round, words } => {
                assert_eq!(round, 2);
                assert_eq!(words, vec!["cherry"]);
            }
            other => panic!("Unexpected {:?}", other),
        }
        assert_eq!(game.score(20).unwrap().points, 0);
        assert_eq!(game.score(20).unwrap().victories, 1);
    }

    #[test]
    fn test_manager_leaves() {
        let mut game = started_game(GameStyle::Race, 1);
        assert!(game.remove_player(10));
        assert_eq!(game.manager(), 20);
        assert_eq!(game.manager_name(), "bob");
        assert!(!game.remove_player(10));

        assert!(game.remove_player(20));
        assert!(game.is_empty());
    }

    #[test]
    fn test_race_round_completes_when_slow_player_leaves() {
        let mut game = started_game(GameStyle::Race, 1);
        game.start_round(10, words(&["apple"]), 0).unwrap();
        game.claim_word(10, "apple", 100).unwrap();
        assert!(!game.is_round_complete());

        game.remove_player(20);
        assert!(game.is_round_complete());
    }

    #[test]
    fn test_end_round_without_round() {
        let leaderboard = Leaderboard::new(3);
        let mut game = started_game(GameStyle::Race, 1);
        assert_eq!(
            game.end_round(&leaderboard),
            Err(GameError::NoRoundRunning)
        );
    }
}
