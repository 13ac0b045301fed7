//! Per-player statistics for one game.
//!
//! Some fields describe the current round (points, awards, speed) and are
//! reset when a round starts, the others accumulate over the whole game.

use crate::utils::get_timestamp;
use shared::ScoreDto;

#[derive(Debug, Clone)]
pub struct Score {
    pub user_name: String,
    /// Words caught during the current round
    pub points: u32,
    /// Bitwise or of the awards won during the current round
    pub awards: u32,
    /// Words per minute for the current round
    pub speed: f32,
    /// Rounds won
    pub victories: u32,
    /// Best words per minute so far in the game
    pub best_speed: f32,
    /// Leaderboard rank, 0 means not ranked
    pub top_rank: usize,
    /// Speed that earned `top_rank`
    pub top_speed: f32,
    latest_word_timestamp: u64,
    latest_victory_timestamp: u64,
}

impl Score {
    pub fn new(user_name: impl Into<String>) -> Self {
        let now = get_timestamp();
        Self {
            user_name: user_name.into(),
            points: 0,
            awards: 0,
            speed: 0.0,
            victories: 0,
            best_speed: 0.0,
            top_rank: 0,
            top_speed: 0.0,
            latest_word_timestamp: now,
            latest_victory_timestamp: now,
        }
    }

    /// Builds a score with a known round speed, mostly useful for ranking.
    pub fn with_speed(user_name: impl Into<String>, points: u32, speed: f32) -> Self {
        let mut score = Self::new(user_name);
        score.points = points;
        score.speed = speed;
        score
    }

    pub fn reset_points(&mut self) {
        self.points = 0;
        self.awards = 0;
    }

    pub fn increment_points(&mut self) {
        self.increment_points_at(get_timestamp());
    }

    pub fn increment_points_at(&mut self, timestamp: u64) {
        self.points += 1;
        self.latest_word_timestamp = timestamp;
    }

    pub fn add_award(&mut self, award: u32) {
        self.awards |= award;
    }

    pub fn increment_victories(&mut self) {
        self.increment_victories_at(get_timestamp());
    }

    pub fn increment_victories_at(&mut self, timestamp: u64) {
        self.victories += 1;
        self.latest_victory_timestamp = timestamp;
    }

    pub fn latest_victory_timestamp(&self) -> u64 {
        self.latest_victory_timestamp
    }

    /// Computes the round speed once the round is over and raises the best
    /// speed if needed.
    pub fn update_speeds(&mut self, round_start: u64) {
        self.speed = if self.points > 0 {
            // A catch in the same millisecond as the round start counts as 1 ms
            let elapsed = self.latest_word_timestamp.saturating_sub(round_start).max(1);
            60_000.0 * self.points as f32 / elapsed as f32
        } else {
            0.0
        };

        if self.best_speed < self.speed {
            self.best_speed = self.speed;
        }
    }

    pub fn update_tops(&mut self, rank: usize, speed: f32) {
        self.top_rank = rank;
        self.top_speed = speed;
    }

    pub fn to_dto(&self) -> ScoreDto {
        ScoreDto {
            user_name: self.user_name.clone(),
            points: self.points,
            speed: self.speed,
            awards: self.awards,
            victories: self.victories,
            best_speed: self.best_speed,
            top_rank: self.top_rank,
            top_speed: self.top_speed,
        }
    }
}
