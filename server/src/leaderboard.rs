//! All-time best speeds per game category.
//!
//! Every category owns a list of exactly `size` entries ordered by
//! non-increasing speed, padded with placeholder entries. A single mutex
//! guards the whole category map: reads and complete round updates never
//! interleave, so a reader sees a round either entirely applied or not at all.
//!
//! The snapshot store is optional. When a store is configured but the startup
//! load fails, saving stays disabled so a broken store never overwrites good
//! data with an empty leaderboard.

use crate::persistence::{CategoryScores, SnapshotStore, TopScoresSnapshot};
use crate::score::Score;
use log::{debug, error, info};
use parking_lot::Mutex;
use shared::{Difficulty, GameCategory, GameStyle, Language, TopScore, TopScoresDto};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

struct LeaderboardState {
    top_scores_by_category: HashMap<GameCategory, Vec<TopScore>>,
    data_load_succeeded: bool,
}

pub struct Leaderboard {
    size: usize,
    state: Mutex<LeaderboardState>,
    store: Option<Arc<dyn SnapshotStore>>,
    environment_name: String,
}

impl Leaderboard {
    /// Creates an in-memory leaderboard with `size` entries per category.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            state: Mutex::new(LeaderboardState {
                top_scores_by_category: HashMap::new(),
                data_load_succeeded: false,
            }),
            store: None,
            environment_name: String::new(),
        }
    }

    /// Creates a leaderboard persisted in `store` under `environment_name`.
    /// Call `load` before serving.
    pub fn with_store(
        size: usize,
        store: Arc<dyn SnapshotStore>,
        environment_name: impl Into<String>,
    ) -> Self {
        Self {
            store: Some(store),
            environment_name: environment_name.into(),
            ..Self::new(size)
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// True once a load succeeded, meaning saves are allowed.
    pub fn is_persistence_available(&self) -> bool {
        self.store.is_some() && self.state.lock().data_load_succeeded
    }

    /// Loads the previous top scores from the store, if any.
    pub fn load(&self) {
        info!(
            "Persistence of top scores is {} and environment name is '{}'",
            if self.store.is_some() { "enabled" } else { "disabled" },
            self.environment_name
        );

        let Some(store) = &self.store else {
            return;
        };

        let start = Instant::now();
        let mut state = self.state.lock();
        match store.load(&self.environment_name) {
            Ok(None) => {
                info!("Found no top scores in {} msec", start.elapsed().as_millis());
                state.data_load_succeeded = true;
            }
            Ok(Some(snapshot)) => {
                for CategoryScores { category, mut scores } in snapshot.top_scores {
                    scores.resize_with(self.size, TopScore::default);
                    state.top_scores_by_category.insert(category, scores);
                }
                info!(
                    "Loaded the top scores of {} categories in {} msec",
                    state.top_scores_by_category.len(),
                    start.elapsed().as_millis()
                );
                state.data_load_succeeded = true;
            }
            Err(e) => {
                error!("Failed to load the top scores: {}", e);
            }
        }
    }

    /// Copies the current top scores, categories sorted for stable output.
    pub fn snapshot(&self) -> TopScoresSnapshot {
        let state = self.state.lock();
        let mut top_scores: Vec<CategoryScores> = state
            .top_scores_by_category
            .iter()
            .map(|(category, scores)| CategoryScores {
                category: *category,
                scores: scores.clone(),
            })
            .collect();
        top_scores.sort_by_key(|entry| entry.category);

        TopScoresSnapshot {
            environment_name: self.environment_name.clone(),
            top_scores,
        }
    }

    /// Saves the top scores to the store. Returns true if they were written.
    pub fn save(&self) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        if !self.is_persistence_available() {
            debug!("Skipping the top scores save, persistence is unavailable");
            return false;
        }

        let start = Instant::now();
        let snapshot = self.snapshot();
        match store.save(&snapshot) {
            Ok(()) => {
                info!("Saved the top scores in {} msec", start.elapsed().as_millis());
                true
            }
            Err(e) => {
                error!("Failed to save the top scores: {}", e);
                false
            }
        }
    }

    /// Top scores of every difficulty, in `Difficulty::ALL` order.
    pub fn top_scores(&self, style: GameStyle, language: Language) -> Vec<TopScoresDto> {
        let mut state = self.state.lock();
        Difficulty::ALL
            .iter()
            .map(|&difficulty| {
                let category = GameCategory::new(style, language, difficulty);
                self.to_dto(category, self.get_or_create(&mut state, category))
            })
            .collect()
    }

    /// Top scores of a single category.
    pub fn top_scores_for(
        &self,
        style: GameStyle,
        language: Language,
        difficulty: Difficulty,
    ) -> TopScoresDto {
        let mut state = self.state.lock();
        let category = GameCategory::new(style, language, difficulty);
        self.to_dto(category, self.get_or_create(&mut state, category))
    }

    fn to_dto(&self, category: GameCategory, scores: &[TopScore]) -> TopScoresDto {
        TopScoresDto {
            style: category.style,
            language: category.language,
            difficulty: category.difficulty,
            scores: scores.to_vec(),
        }
    }

    fn get_or_create<'a>(
        &self,
        state: &'a mut LeaderboardState,
        category: GameCategory,
    ) -> &'a mut Vec<TopScore> {
        let size = self.size;
        state
            .top_scores_by_category
            .entry(category)
            .or_insert_with(|| vec![TopScore::default(); size])
    }

    /// Ranks the scores of a completed round.
    ///
    /// Only players who caught `words_to_complete` words are considered. The
    /// scores are processed by decreasing speed whatever order they are given
    /// in, and each ranked player gets its rank and speed written back.
    ///
    /// Scores ranked by an earlier round of the same game are then refreshed:
    /// faster players may have pushed them down or off the list.
    pub fn update_top_scores<'a>(
        &self,
        style: GameStyle,
        language: Language,
        difficulty: Difficulty,
        scores: impl IntoIterator<Item = &'a mut Score>,
        words_to_complete: u32,
    ) {
        let mut scores: Vec<&mut Score> = scores.into_iter().collect();
        // Stable, so equal speeds keep the caller's order
        scores.sort_by(|a, b| b.speed.total_cmp(&a.speed));

        let category = GameCategory::new(style, language, difficulty);
        let mut state = self.state.lock();
        let top_scores = self.get_or_create(&mut state, category);

        for score in scores.iter_mut() {
            if score.points == words_to_complete {
                rank_score(top_scores, self.size, score);
            }
        }

        for score in scores.iter_mut().filter(|s| s.top_rank > 0) {
            match top_scores
                .iter()
                .position(|t| t.user_name == score.user_name)
            {
                Some(i) => score.update_tops(i + 1, top_scores[i].speed),
                None => {
                    debug!("{} is no longer ranked", score.user_name);
                    score.update_tops(0, 0.0);
                }
            }
        }
    }
}

/// Single pass insertion of one eligible score. Relies on scores of a round
/// arriving by decreasing speed.
fn rank_score(top_scores: &mut Vec<TopScore>, size: usize, score: &mut Score) {
    let mut previous_rank = 0; // one-indexed, 0 means not ranked
    let mut new_rank = 0; // one-indexed, 0 means not ranked
    let mut speed = 0.0;

    for i in (0..top_scores.len()).rev() {
        let top_score = &top_scores[i];

        if top_score.user_name == score.user_name {
            previous_rank = i + 1;
            speed = top_score.speed;
        }

        let better_speed = if i > 0 {
            top_scores[i - 1].speed
        } else {
            f32::MAX
        };

        if score.speed > top_score.speed && score.speed <= better_speed {
            new_rank = i + 1;
            speed = score.speed;
        }
    }

    // A player never loses places to its own slower round
    if new_rank > 0 && previous_rank > 0 && new_rank > previous_rank {
        new_rank = 0;
        speed = top_scores[previous_rank - 1].speed;
    }

    if new_rank > 0 {
        let entry = TopScore::new(score.user_name.clone(), speed);
        if previous_rank == 0 {
            top_scores.insert(new_rank - 1, entry);
            top_scores.truncate(size);
        } else if previous_rank > new_rank {
            top_scores.remove(previous_rank - 1);
            top_scores.insert(new_rank - 1, entry);
        } else {
            top_scores[previous_rank - 1] = entry;
        }
    }

    let rank = if new_rank > 0 { new_rank } else { previous_rank };
    if rank > 0 {
        debug!("{} is ranked {} at {:.1} words/min", score.user_name, rank, speed);
        score.update_tops(rank, speed);
    }
}
