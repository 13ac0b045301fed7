//! Lobby and game orchestration.
//!
//! `PlayService` owns every declared and running game, and knows where each
//! session is: in the lobby or in a game. Everything lives under one mutex so
//! a disconnect can never race with a start or a delete. Notifications are
//! queued on the client channels while that mutex is held, always locking the
//! games before the clients.

use crate::client_manager::ClientManager;
use crate::game::{ClaimOutcome, Game, GameDescriptor, GameError, GameId};
use crate::leaderboard::Leaderboard;
use crate::session::{ClientState, GameManagement, SessionEvent, SessionHandle, SessionId};
use crate::stats::ServerStats;
use crate::utils::get_timestamp;
use crate::word_selector::WordSelector;
use log::{error, info, warn};
use parking_lot::{Mutex, RwLock};
use shared::{GameDto, Notification};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Default)]
struct PlayState {
    next_game_id: GameId,
    games: BTreeMap<GameId, Game>,
    /// Game of every session that declared, joined or plays one
    locations: HashMap<SessionId, GameId>,
    /// Sessions receiving the games list
    lobby: BTreeSet<SessionId>,
}

impl PlayState {
    fn declared_games(&self) -> Vec<GameDto> {
        self.games
            .values()
            .filter(|g| !g.is_started())
            .map(Game::to_dto)
            .collect()
    }

    fn game_of(&mut self, session: SessionId) -> Result<&mut Game, GameError> {
        let game_id = *self.locations.get(&session).ok_or(GameError::NotInGame)?;
        self.games
            .get_mut(&game_id)
            .ok_or(GameError::UnknownGame(game_id))
    }
}

pub struct PlayService {
    state: Mutex<PlayState>,
    clients: Arc<RwLock<ClientManager>>,
    word_selector: WordSelector,
    leaderboard: Arc<Leaderboard>,
    stats: Arc<ServerStats>,
}

impl PlayService {
    pub fn new(
        clients: Arc<RwLock<ClientManager>>,
        word_selector: WordSelector,
        leaderboard: Arc<Leaderboard>,
        stats: Arc<ServerStats>,
    ) -> Self {
        Self {
            state: Mutex::new(PlayState {
                next_game_id: 1,
                ..PlayState::default()
            }),
            clients,
            word_selector,
            leaderboard,
            stats,
        }
    }

    /// Games shown in the lobby, by increasing id
    pub fn declared_games(&self) -> Vec<GameDto> {
        self.state.lock().declared_games()
    }

    pub fn running_game_count(&self) -> usize {
        self.state
            .lock()
            .games
            .values()
            .filter(|g| g.is_started())
            .count()
    }

    /// Queues an event for every listed session. Sessions that are gone or
    /// that fell behind are skipped, their connection task cleans them up.
    fn send(&self, sessions: &[SessionId], event: SessionEvent) {
        let clients = self.clients.read();
        for session in sessions {
            if !clients.send(*session, event.clone()) {
                warn!("Cannot send {:?} to session {}", event, session);
            }
        }
    }

    fn notify(&self, sessions: &[SessionId], notification: Notification) {
        self.send(sessions, SessionEvent::Notify(notification));
    }

    /// Sends the declared games to every session in the lobby
    fn broadcast_games_list(&self, state: &PlayState) {
        let sessions: Vec<SessionId> = state.lobby.iter().copied().collect();
        self.notify(
            &sessions,
            Notification::GamesList {
                games: state.declared_games(),
            },
        );
    }

    /// Detaches a session from any game and greets it in the lobby with the
    /// current games list
    fn enter_lobby(&self, state: &mut PlayState, session: &SessionHandle) {
        state.locations.remove(&session.id);
        state.lobby.insert(session.id);
        self.notify(
            &[session.id],
            Notification::Lobby {
                user_name: session.user_name.clone(),
                games: state.declared_games(),
            },
        );
    }

    /// Removes a declared game and sends its other players back to the lobby.
    fn drop_declared_game(&self, state: &mut PlayState, game_id: GameId) {
        let Some(game) = state.games.remove(&game_id) else {
            return;
        };
        self.stats.declared_games.decrement();

        for session in game.player_sessions() {
            state.locations.remove(&session);
            if !game.is_creator(session) {
                state.lobby.insert(session);
                self.send(&[session], SessionEvent::Notify(Notification::GameDeleted));
                self.send(
                    &[session],
                    SessionEvent::MoveTo {
                        game_id,
                        state: ClientState::Lobby,
                    },
                );
            }
        }
        info!("Game {} deleted", game_id);
    }

    /// Selects the words and starts the next round of the session's game.
    ///
    /// Only the manager may do this, between two rounds, while rounds are
    /// left. Every player receives the `round-start` notification.
    fn start_round_locked(
        &self,
        state: &mut PlayState,
        session: SessionId,
    ) -> Result<(), GameError> {
        let game = state.game_of(session)?;
        game.check_start_round(session)?;

        let descriptor = game.descriptor();
        let words = self
            .word_selector
            .select(descriptor.language, descriptor.words_per_round())?;
        let notification = game.start_round(session, words, get_timestamp())?;

        let players = game.player_sessions();
        self.notify(&players, notification);
        Ok(())
    }

    /// Ends the running round once nothing is left to claim, then sends the
    /// results to every player
    fn end_round_if_complete(&self, game: &mut Game) -> Result<(), GameError> {
        if game.is_round_complete() {
            let notification = game.end_round(&self.leaderboard)?;
            self.notify(&game.player_sessions(), notification);
        }
        Ok(())
    }

    /// Removes a session from a running game.
    ///
    /// The game is dropped once empty. Otherwise the remaining players learn
    /// who left and who manages the game now, and the round is checked for
    /// completion since the leaver may have been the last one typing.
    fn remove_from_running_game(
        &self,
        state: &mut PlayState,
        session: &SessionHandle,
    ) -> Result<(), GameError> {
        let game_id = *state.locations.get(&session.id).ok_or(GameError::NotInGame)?;
        state.locations.remove(&session.id);

        let Some(game) = state.games.get_mut(&game_id) else {
            return Err(GameError::UnknownGame(game_id));
        };
        game.remove_player(session.id);
        info!("'{}' quit game {}", session.user_name, game_id);

        if game.is_empty() {
            state.games.remove(&game_id);
            self.stats.running_games.decrement();
            info!("Game {} is over, no player left", game_id);
            return Ok(());
        }

        self.notify(
            &game.player_sessions(),
            Notification::PlayerLeft {
                user_name: session.user_name.clone(),
                manager: game.manager_name(),
            },
        );
        self.end_round_if_complete(game)
    }
}

impl GameManagement for PlayService {
    /// Registers a freshly named session in the lobby and sends it the
    /// declared games
    fn go_to_lobby(&self, session: &SessionHandle) {
        let mut state = self.state.lock();
        self.enter_lobby(&mut state, session);
    }

    /// Declares a new game with the session as creator, first player and
    /// manager.
    ///
    /// Fails if the session already declared or joined a game. The lobby
    /// receives the updated games list.
    fn create_game(
        &self,
        session: &SessionHandle,
        descriptor: GameDescriptor,
    ) -> Result<GameId, GameError> {
        let mut state = self.state.lock();
        if state.locations.contains_key(&session.id) {
            return Err(GameError::AlreadyDeclared(session.user_name.clone()));
        }

        let game_id = state.next_game_id;
        state.next_game_id += 1;

        info!(
            "'{}' declared game {} ({} {} {}, {} rounds)",
            session.user_name,
            game_id,
            descriptor.style,
            descriptor.language,
            descriptor.difficulty,
            descriptor.rounds
        );
        state
            .games
            .insert(game_id, Game::new(game_id, descriptor, session.id));
        state.locations.insert(session.id, game_id);
        state.lobby.remove(&session.id);
        self.stats.declared_games.increment();

        self.broadcast_games_list(&state);
        Ok(game_id)
    }

    /// Adds the session to a declared game.
    ///
    /// Fails for unknown or started games, and for sessions already attached
    /// to a game.
    fn join_game(&self, session: &SessionHandle, game_id: GameId) -> Result<(), GameError> {
        let mut state = self.state.lock();
        if state.locations.contains_key(&session.id) {
            return Err(GameError::AlreadyDeclared(session.user_name.clone()));
        }

        let game = state
            .games
            .get_mut(&game_id)
            .ok_or(GameError::UnknownGame(game_id))?;
        game.add_player(session.id, &session.user_name)?;

        info!("'{}' joined game {}", session.user_name, game_id);
        state.locations.insert(session.id, game_id);
        state.lobby.remove(&session.id);

        self.broadcast_games_list(&state);
        Ok(())
    }

    /// Deletes the game declared by the session.
    ///
    /// Joined players receive `game-deleted` and are moved back to the
    /// lobby, as is the creator.
    fn delete_game(&self, session: &SessionHandle) -> Result<(), GameError> {
        let mut state = self.state.lock();
        let game = state.game_of(session.id)?;
        if game.is_started() {
            return Err(GameError::AlreadyStarted(game.id()));
        }
        if !game.is_creator(session.id) {
            return Err(GameError::NotManager);
        }

        let game_id = game.id();
        self.drop_declared_game(&mut state, game_id);
        self.enter_lobby(&mut state, session);
        self.broadcast_games_list(&state);
        Ok(())
    }

    /// Starts the game declared by the session and its first round.
    ///
    /// Every player receives `game-start`, joined players are moved to
    /// `PLAYING`, and the game disappears from the lobby list.
    fn start_game(&self, session: &SessionHandle) -> Result<(), GameError> {
        let mut state = self.state.lock();
        let game = state.game_of(session.id)?;
        if !game.is_creator(session.id) {
            return Err(GameError::NotManager);
        }
        game.start()?;

        self.stats.declared_games.decrement();
        self.stats.running_games.increment();

        let start = Notification::GameStart {
            game: game.to_dto(),
            manager: game.manager_name(),
        };
        let players = game.player_sessions();
        self.notify(&players, start);
        let game_id = game.id();
        let others: Vec<SessionId> = players
            .iter()
            .copied()
            .filter(|p| *p != session.id)
            .collect();
        self.send(
            &others,
            SessionEvent::MoveTo {
                game_id,
                state: ClientState::Playing,
            },
        );

        self.broadcast_games_list(&state);

        // The game stays started even if its first round cannot begin, the
        // manager may retry with start-round
        if let Err(e) = self.start_round_locked(&mut state, session.id) {
            error!("Cannot start the first round for '{}': {}", session.user_name, e);
        }
        Ok(())
    }

    /// Removes the session from the declared game it joined and sends it
    /// back to the lobby
    fn leave_game(&self, session: &SessionHandle) -> Result<(), GameError> {
        let mut state = self.state.lock();
        let game = state.game_of(session.id)?;
        if game.is_started() {
            return Err(GameError::AlreadyStarted(game.id()));
        }

        game.remove_player(session.id);
        info!("'{}' left game {}", session.user_name, game.id());

        self.enter_lobby(&mut state, session);
        self.broadcast_games_list(&state);
        Ok(())
    }

    /// Claims a word of the running round.
    ///
    /// In capture games every player learns who took the word, in race games
    /// only the claimer is told. Unknown or already claimed words are
    /// silently ignored. The round ends with the last claim.
    fn claim_word(&self, session: &SessionHandle, word: &str) -> Result<(), GameError> {
        let mut state = self.state.lock();
        let game = state.game_of(session.id)?;

        let claimed = Notification::WordClaimed {
            word: word.to_string(),
            user_name: session.user_name.clone(),
        };
        match game.claim_word(session.id, word, get_timestamp())? {
            ClaimOutcome::Rejected => return Ok(()),
            ClaimOutcome::Captured => self.notify(&game.player_sessions(), claimed),
            ClaimOutcome::Typed => self.notify(&[session.id], claimed),
        }

        self.end_round_if_complete(game)
    }

    /// Starts the next round, manager only
    fn start_round(&self, session: &SessionHandle) -> Result<(), GameError> {
        let mut state = self.state.lock();
        self.start_round_locked(&mut state, session.id)
    }

    /// Leaves a running game. The session lands in the lobby even if the
    /// game could not be found.
    fn quit_game(&self, session: &SessionHandle) -> Result<(), GameError> {
        let mut state = self.state.lock();
        let result = self.remove_from_running_game(&mut state, session);
        self.enter_lobby(&mut state, session);
        result
    }

    /// Cleans up after a closed connection.
    ///
    /// A creator deletes its declared game, a joined player leaves it, and a
    /// playing one quits the running game.
    fn disconnect(&self, session: &SessionHandle) {
        let mut state = self.state.lock();
        state.lobby.remove(&session.id);

        let Some(game_id) = state.locations.get(&session.id).copied() else {
            return;
        };
        let Some(game) = state.games.get_mut(&game_id) else {
            state.locations.remove(&session.id);
            return;
        };

        if game.is_started() {
            if let Err(e) = self.remove_from_running_game(&mut state, session) {
                warn!("Cannot remove '{}' from game {}: {}", session.user_name, game_id, e);
            }
            return;
        }

        if game.is_creator(session.id) {
            self.drop_declared_game(&mut state, game_id);
        } else {
            game.remove_player(session.id);
            state.locations.remove(&session.id);
        }
        self.broadcast_games_list(&state);
    }
}
