//! Per-connection protocol state machine.
//!
//! A `Session` is a plain value owned by its connection task. Each inbound
//! line is checked against the current state and, when accepted, delegated to
//! the name registry or to game management. Anything else is logged and
//! dropped: a malformed or out-of-order message never closes a connection.
//!
//! | State   | Command       | Args | Next state           |
//! |---------|---------------|------|----------------------|
//! | OPENED  | `connect`     | 1    | LOBBY on success     |
//! | LOBBY   | `create-game` | 4    | CREATED on success   |
//! | LOBBY   | `join-game`   | 1    | JOINED on success    |
//! | CREATED | `delete-game` | 0    | LOBBY                |
//! | CREATED | `start-game`  | 0    | PLAYING on success   |
//! | JOINED  | `leave-game`  | 0    | LOBBY                |
//! | PLAYING | `claim-word`  | 1    | PLAYING              |
//! | PLAYING | `start-round` | 0    | PLAYING              |
//! | PLAYING | `quit-game`   | 0    | LOBBY                |
//!
//! Other sessions can also move this one: a creator starting or deleting the
//! game this session joined queues a `SessionEvent::MoveTo` on its channel,
//! tagged with the game so that a late move is never applied to another one.

use crate::game::{GameDescriptor, GameError, GameId};
use log::{debug, warn};
use shared::{
    Action, Difficulty, GameStyle, Language, Notification, ACTION_CLAIM_WORD, ACTION_CONNECT,
    ACTION_CREATE_GAME, ACTION_DELETE_GAME, ACTION_JOIN_GAME, ACTION_LEAVE_GAME,
    ACTION_QUIT_GAME, ACTION_START_GAME, ACTION_START_ROUND, MAX_ROUNDS,
};
use std::fmt;

pub type SessionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Connected, no display name yet
    Opened,
    Lobby,
    /// Declared a game and waits for players
    Created,
    /// Joined a declared game
    Joined,
    Playing,
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientState::Opened => "OPENED",
            ClientState::Lobby => "LOBBY",
            ClientState::Created => "CREATED",
            ClientState::Joined => "JOINED",
            ClientState::Playing => "PLAYING",
        };
        f.write_str(name)
    }
}

/// Identity of a registered session, as seen by game management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub id: SessionId,
    pub user_name: String,
}

/// Queued for a connection task by other parts of the server.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Notify(Notification),
    /// Move requested because something happened to `game_id`. Dropped if
    /// the session is no longer attached to that game when it is applied.
    MoveTo { game_id: GameId, state: ClientState },
}

/// Result of processing one inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Processed,
    /// Processed, and this notification must be sent back to the client
    Reply(Notification),
    /// Unknown command for the current state, or bad arguments
    Ignored,
}

/// Display name registration, serialized across all sessions.
pub trait NameRegistry: Send + Sync {
    /// Reserves `name` for the session. On refusal, returns the notification
    /// explaining why.
    fn register_user_name(&self, session: SessionId, name: &str) -> Result<String, Notification>;

    fn release_user_name(&self, session: SessionId);
}

/// Lobby and gameplay operations the state machine delegates to.
pub trait GameManagement: Send + Sync {
    fn go_to_lobby(&self, session: &SessionHandle);
    fn create_game(
        &self,
        session: &SessionHandle,
        descriptor: GameDescriptor,
    ) -> Result<GameId, GameError>;
    fn join_game(&self, session: &SessionHandle, game_id: GameId) -> Result<(), GameError>;
    fn delete_game(&self, session: &SessionHandle) -> Result<(), GameError>;
    fn start_game(&self, session: &SessionHandle) -> Result<(), GameError>;
    fn leave_game(&self, session: &SessionHandle) -> Result<(), GameError>;
    fn claim_word(&self, session: &SessionHandle, word: &str) -> Result<(), GameError>;
    fn start_round(&self, session: &SessionHandle) -> Result<(), GameError>;
    fn quit_game(&self, session: &SessionHandle) -> Result<(), GameError>;
    /// Called once when the connection closes, whatever the state.
    fn disconnect(&self, session: &SessionHandle);
}

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    user_name: String,
    state: ClientState,
    game_id: Option<GameId>,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            user_name: String::new(),
            state: ClientState::Opened,
            game_id: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn game_id(&self) -> Option<GameId> {
        self.game_id
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            id: self.id,
            user_name: self.user_name.clone(),
        }
    }

    fn move_to(&mut self, state: ClientState) {
        debug!("Session {} moves from {} to {}", self.id, self.state, state);
        self.state = state;
        if state == ClientState::Lobby {
            self.game_id = None;
        }
    }

    /// Applies a state change requested by another session's action.
    ///
    /// Lines of this session may be processed before an event queued
    /// earlier, so a move about a game the session already left is stale
    /// and ignored.
    pub fn apply_event(&mut self, event: &SessionEvent) {
        if let SessionEvent::MoveTo { game_id, state } = event {
            if self.game_id == Some(*game_id) {
                self.move_to(*state);
            } else {
                debug!(
                    "Session {} ignores move to {} for game {}, it is in {:?}",
                    self.id, state, game_id, self.game_id
                );
            }
        }
    }

    /// Validates and dispatches one inbound line.
    ///
    /// Errors come from game management and leave the connection open; the
    /// caller only logs them.
    pub fn process(
        &mut self,
        line: &str,
        names: &dyn NameRegistry,
        games: &dyn GameManagement,
    ) -> Result<Dispatch, GameError> {
        let action = Action::parse(line);

        let dispatch = match (self.state, action.command.as_str()) {
            (ClientState::Opened, ACTION_CONNECT) if action.check_arguments_count(1) => {
                self.connect(&action, names, games)
            }
            (ClientState::Lobby, ACTION_CREATE_GAME) if action.check_arguments_count(4) => {
                self.create_game(&action, games)?
            }
            (ClientState::Lobby, ACTION_JOIN_GAME) if action.check_arguments_count(1) => {
                self.join_game(&action, games)?
            }
            (ClientState::Created, ACTION_DELETE_GAME) => {
                let result = games.delete_game(&self.handle());
                self.back_to_lobby(result)?
            }
            (ClientState::Created, ACTION_START_GAME) => {
                games.start_game(&self.handle())?;
                self.move_to(ClientState::Playing);
                Dispatch::Processed
            }
            (ClientState::Joined, ACTION_LEAVE_GAME) => {
                let result = games.leave_game(&self.handle());
                self.back_to_lobby(result)?
            }
            (ClientState::Playing, ACTION_CLAIM_WORD) if action.check_arguments_count(1) => {
                games.claim_word(&self.handle(), &action.arguments[0])?;
                Dispatch::Processed
            }
            (ClientState::Playing, ACTION_START_ROUND) => {
                games.start_round(&self.handle())?;
                Dispatch::Processed
            }
            (ClientState::Playing, ACTION_QUIT_GAME) => {
                let result = games.quit_game(&self.handle());
                self.back_to_lobby(result)?
            }
            _ => Dispatch::Ignored,
        };

        if dispatch == Dispatch::Ignored {
            warn!(
                "Invalid message '{}' for state {} of session {}",
                line.trim(),
                self.state,
                self.id
            );
        }

        Ok(dispatch)
    }

    /// Releases everything the session holds. Call once, when the
    /// connection is closed.
    pub fn close(&mut self, names: &dyn NameRegistry, games: &dyn GameManagement) {
        games.disconnect(&self.handle());
        names.release_user_name(self.id);
        self.user_name.clear();
        self.game_id = None;
    }

    fn connect(
        &mut self,
        action: &Action,
        names: &dyn NameRegistry,
        games: &dyn GameManagement,
    ) -> Dispatch {
        match names.register_user_name(self.id, &action.raw_arguments) {
            Ok(user_name) => {
                self.user_name = user_name;
                self.move_to(ClientState::Lobby);
                games.go_to_lobby(&self.handle());
                Dispatch::Processed
            }
            Err(notification) => Dispatch::Reply(notification),
        }
    }

    fn create_game(
        &mut self,
        action: &Action,
        games: &dyn GameManagement,
    ) -> Result<Dispatch, GameError> {
        let Some(descriptor) = self.parse_descriptor(&action.arguments) else {
            return Ok(Dispatch::Ignored);
        };

        let game_id = games.create_game(&self.handle(), descriptor)?;
        self.game_id = Some(game_id);
        self.move_to(ClientState::Created);
        Ok(Dispatch::Processed)
    }

    fn parse_descriptor(&self, arguments: &[String]) -> Option<GameDescriptor> {
        let parsed = (|| {
            let style: GameStyle = arguments[0].parse().map_err(|e| format!("{}", e))?;
            let language: Language = arguments[1].parse().map_err(|e| format!("{}", e))?;
            let difficulty: Difficulty = arguments[2].parse().map_err(|e| format!("{}", e))?;
            let rounds = arguments[3]
                .parse::<u32>()
                .ok()
                .filter(|r| (1..=MAX_ROUNDS).contains(r))
                .ok_or_else(|| format!("invalid round count '{}'", arguments[3]))?;
            Ok::<_, String>((style, language, difficulty, rounds))
        })();

        match parsed {
            Ok((style, language, difficulty, rounds)) => Some(GameDescriptor {
                creator: self.user_name.clone(),
                style,
                language,
                difficulty,
                rounds,
            }),
            Err(reason) => {
                warn!("Invalid game for session {}: {}", self.id, reason);
                None
            }
        }
    }

    fn join_game(
        &mut self,
        action: &Action,
        games: &dyn GameManagement,
    ) -> Result<Dispatch, GameError> {
        let Ok(game_id) = action.arguments[0].parse::<GameId>() else {
            warn!(
                "Invalid game ID '{}' for session {}",
                action.arguments[0], self.id
            );
            return Ok(Dispatch::Ignored);
        };

        games.join_game(&self.handle(), game_id)?;
        self.game_id = Some(game_id);
        self.move_to(ClientState::Joined);
        Ok(Dispatch::Processed)
    }

    /// Leaving a game returns to the lobby even if game management
    /// complains, except when the game just started: the pending move to
    /// `PLAYING` is then the truth.
    fn back_to_lobby(&mut self, result: Result<(), GameError>) -> Result<Dispatch, GameError> {
        match result {
            Err(e @ GameError::AlreadyStarted(_)) => Err(e),
            other => {
                self.move_to(ClientState::Lobby);
                other.map(|_| Dispatch::Processed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Records every delegated call
    #[derive(Default)]
    struct RecordingGames {
        calls: Mutex<Vec<String>>,
        fail_with: Mutex<Option<GameError>>,
    }

    impl RecordingGames {
        fn record(&self, call: String) -> Result<(), GameError> {
            self.calls.lock().push(call);
            match self.fail_with.lock().take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        fn fail_next(&self, error: GameError) {
            *self.fail_with.lock() = Some(error);
        }
    }

    impl GameManagement for RecordingGames {
        fn go_to_lobby(&self, s: &SessionHandle) {
            let _ = self.record(format!("lobby {}", s.user_name));
        }
        fn create_game(&self, s: &SessionHandle, d: GameDescriptor) -> Result<GameId, GameError> {
            self.record(format!(
                "create {} {} {} {} {}",
                s.user_name, d.style, d.language, d.difficulty, d.rounds
            ))?;
            Ok(7)
        }
        fn join_game(&self, s: &SessionHandle, id: GameId) -> Result<(), GameError> {
            self.record(format!("join {} {}", s.user_name, id))
        }
        fn delete_game(&self, s: &SessionHandle) -> Result<(), GameError> {
            self.record(format!("delete {}", s.user_name))
        }
        fn start_game(&self, s: &SessionHandle) -> Result<(), GameError> {
            self.record(format!("start {}", s.user_name))
        }
        fn leave_game(&self, s: &SessionHandle) -> Result<(), GameError> {
            self.record(format!("leave {}", s.user_name))
        }
        fn claim_word(&self, s: &SessionHandle, word: &str) -> Result<(), GameError> {
            self.record(format!("claim {} {}", s.user_name, word))
        }
        fn start_round(&self, s: &SessionHandle) -> Result<(), GameError> {
            self.record(format!("round {}", s.user_name))
        }
        fn quit_game(&self, s: &SessionHandle) -> Result<(), GameError> {
            self.record(format!("quit {}", s.user_name))
        }
        fn disconnect(&self, s: &SessionHandle) {
            let _ = self.record(format!("disconnect {}", s.user_name));
        }
    }

    #[derive(Default)]
    struct SetRegistry {
        names: Mutex<HashSet<String>>,
        released: Mutex<Vec<SessionId>>,
    }

    impl NameRegistry for SetRegistry {
        fn register_user_name(&self, _: SessionId, name: &str) -> Result<String, Notification> {
            if self.names.lock().insert(name.to_string()) {
                Ok(name.to_string())
            } else {
                Err(Notification::UsedName)
            }
        }

        fn release_user_name(&self, session: SessionId) {
            self.released.lock().push(session);
        }
    }

    struct Fixture {
        session: Session,
        names: SetRegistry,
        games: RecordingGames,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                session: Session::new(1),
                names: SetRegistry::default(),
                games: RecordingGames::default(),
            }
        }

        fn send(&mut self, line: &str) -> Result<Dispatch, GameError> {
            self.session.process(line, &self.names, &self.games)
        }

        fn in_state(state: ClientState) -> Self {
            let mut fixture = Self::new();
            fixture.send("connect alice").unwrap();
            match state {
                ClientState::Opened => fixture.session.state = ClientState::Opened,
                ClientState::Lobby => {}
                ClientState::Created => {
                    fixture.send("create-game race en easy 2").unwrap();
                }
                ClientState::Joined => {
                    fixture.send("join-game 3").unwrap();
                }
                ClientState::Playing => {
                    fixture.send("create-game race en easy 2").unwrap();
                    fixture.send("start-game").unwrap();
                }
            }
            assert_eq!(fixture.session.state(), state);
            fixture.games.calls.lock().clear();
            fixture
        }
    }

    #[test]
    fn test_new_session_is_opened() {
        let session = Session::new(4);
        assert_eq!(session.state(), ClientState::Opened);
        assert_eq!(session.user_name(), "");
        assert_eq!(session.game_id(), None);
    }

    #[test]
    fn test_connect_goes_to_lobby() {
        let mut fixture = Fixture::new();
        let dispatch = fixture.send("connect Jean Claude").unwrap();

        assert_eq!(dispatch, Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert_eq!(fixture.session.user_name(), "Jean Claude");
        assert_eq!(fixture.games.calls(), vec!["lobby Jean Claude"]);
    }

    #[test]
    fn test_connect_with_used_name_stays_opened() {
        let mut fixture = Fixture::new();
        fixture.names.names.lock().insert("bob".to_string());

        let dispatch = fixture.send("connect bob").unwrap();

        assert_eq!(dispatch, Dispatch::Reply(Notification::UsedName));
        assert_eq!(fixture.session.state(), ClientState::Opened);
        assert!(fixture.games.calls().is_empty());

        assert_eq!(fixture.send("connect bobby").unwrap(), Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Lobby);
    }

    #[test]
    fn test_opened_only_accepts_connect() {
        for line in [
            "create-game race en easy 2",
            "join-game 1",
            "delete-game",
            "start-game",
            "leave-game",
            "claim-word apple",
            "start-round",
            "quit-game",
            "connect",
            "",
        ] {
            let mut fixture = Fixture::new();
            assert_eq!(fixture.send(line).unwrap(), Dispatch::Ignored, "{}", line);
            assert_eq!(fixture.session.state(), ClientState::Opened);
            assert!(fixture.games.calls().is_empty());
        }
    }

    #[test]
    fn test_lobby_ignores_claim_word() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        assert_eq!(fixture.send("claim-word apple").unwrap(), Dispatch::Ignored);
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert!(fixture.games.calls().is_empty());
    }

    #[test]
    fn test_create_game() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        let dispatch = fixture.send("create-game capture fr hard 3").unwrap();

        assert_eq!(dispatch, Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Created);
        assert_eq!(fixture.session.game_id(), Some(7));
        assert_eq!(fixture.games.calls(), vec!["create alice capture fr hard 3"]);
    }

    #[test]
    fn test_create_game_needs_four_arguments() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        assert_eq!(fixture.send("create-game race en easy").unwrap(), Dispatch::Ignored);
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert!(fixture.games.calls().is_empty());
    }

    #[test]
    fn test_create_game_with_invalid_arguments() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        for line in [
            "create-game chess en easy 2",
            "create-game race de easy 2",
            "create-game race en extreme 2",
            "create-game race en easy two",
            "create-game race en easy 0",
            "create-game race en easy 11",
        ] {
            assert_eq!(fixture.send(line).unwrap(), Dispatch::Ignored, "{}", line);
        }
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert!(fixture.games.calls().is_empty());
    }

    #[test]
    fn test_failed_create_stays_in_lobby() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        fixture
            .games
            .fail_next(GameError::AlreadyDeclared("alice".to_string()));

        let result = fixture.send("create-game race en easy 2");
        assert!(result.is_err());
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert_eq!(fixture.session.game_id(), None);
    }

    #[test]
    fn test_join_game() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        assert_eq!(fixture.send("join-game 42").unwrap(), Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Joined);
        assert_eq!(fixture.session.game_id(), Some(42));
        assert_eq!(fixture.games.calls(), vec!["join alice 42"]);
    }

    #[test]
    fn test_join_game_with_non_numeric_id() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        assert_eq!(fixture.send("join-game abc").unwrap(), Dispatch::Ignored);
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert!(fixture.games.calls().is_empty());
    }

    #[test]
    fn test_join_unknown_game_stays_in_lobby() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        fixture.games.fail_next(GameError::UnknownGame(9));
        assert_eq!(fixture.send("join-game 9"), Err(GameError::UnknownGame(9)));
        assert_eq!(fixture.session.state(), ClientState::Lobby);
    }

    #[test]
    fn test_delete_game() {
        let mut fixture = Fixture::in_state(ClientState::Created);
        assert_eq!(fixture.send("delete-game").unwrap(), Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert_eq!(fixture.session.game_id(), None);
        assert_eq!(fixture.games.calls(), vec!["delete alice"]);
    }

    #[test]
    fn test_start_game() {
        let mut fixture = Fixture::in_state(ClientState::Created);
        assert_eq!(fixture.send("start-game").unwrap(), Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Playing);
        assert_eq!(fixture.games.calls(), vec!["start alice"]);
    }

    #[test]
    fn test_created_ignores_lobby_commands() {
        let mut fixture = Fixture::in_state(ClientState::Created);
        assert_eq!(fixture.send("join-game 1").unwrap(), Dispatch::Ignored);
        assert_eq!(fixture.send("leave-game").unwrap(), Dispatch::Ignored);
        assert_eq!(fixture.session.state(), ClientState::Created);
    }

    #[test]
    fn test_leave_game() {
        let mut fixture = Fixture::in_state(ClientState::Joined);
        assert_eq!(fixture.send("leave-game").unwrap(), Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert_eq!(fixture.games.calls(), vec!["leave alice"]);
    }

    #[test]
    fn test_leave_started_game_waits_for_move() {
        let mut fixture = Fixture::in_state(ClientState::Joined);
        fixture.games.fail_next(GameError::AlreadyStarted(3));

        assert!(fixture.send("leave-game").is_err());
        assert_eq!(fixture.session.state(), ClientState::Joined);

        fixture.session.apply_event(&SessionEvent::MoveTo {
            game_id: 3,
            state: ClientState::Playing,
        });
        assert_eq!(fixture.session.state(), ClientState::Playing);
    }

    #[test]
    fn test_joined_cannot_start() {
        let mut fixture = Fixture::in_state(ClientState::Joined);
        assert_eq!(fixture.send("start-game").unwrap(), Dispatch::Ignored);
        assert_eq!(fixture.send("delete-game").unwrap(), Dispatch::Ignored);
        assert!(fixture.games.calls().is_empty());
    }

    #[test]
    fn test_playing_commands() {
        let mut fixture = Fixture::in_state(ClientState::Playing);
        assert_eq!(fixture.send("claim-word apple").unwrap(), Dispatch::Processed);
        assert_eq!(fixture.send("start-round").unwrap(), Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Playing);
        assert_eq!(fixture.send("claim-word").unwrap(), Dispatch::Ignored);
        assert_eq!(
            fixture.games.calls(),
            vec!["claim alice apple", "round alice"]
        );
    }

    #[test]
    fn test_claim_error_keeps_playing() {
        let mut fixture = Fixture::in_state(ClientState::Playing);
        fixture.games.fail_next(GameError::NoRoundRunning);
        assert_eq!(fixture.send("claim-word apple"), Err(GameError::NoRoundRunning));
        assert_eq!(fixture.session.state(), ClientState::Playing);
    }

    #[test]
    fn test_quit_game() {
        let mut fixture = Fixture::in_state(ClientState::Playing);
        assert_eq!(fixture.send("quit-game").unwrap(), Dispatch::Processed);
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert_eq!(fixture.session.game_id(), None);
        assert_eq!(fixture.games.calls(), vec!["quit alice"]);
    }

    #[test]
    fn test_unknown_command_is_ignored_in_every_state() {
        for state in [
            ClientState::Lobby,
            ClientState::Created,
            ClientState::Joined,
            ClientState::Playing,
        ] {
            let mut fixture = Fixture::in_state(state);
            assert_eq!(fixture.send("dance wildly").unwrap(), Dispatch::Ignored);
            assert_eq!(fixture.send("connect bob").unwrap(), Dispatch::Ignored);
            assert_eq!(fixture.session.state(), state);
            assert!(fixture.games.calls().is_empty());
        }
    }

    #[test]
    fn test_moved_to_lobby_by_event() {
        let mut fixture = Fixture::in_state(ClientState::Joined);
        fixture.session.apply_event(&SessionEvent::MoveTo {
            game_id: 3,
            state: ClientState::Lobby,
        });
        assert_eq!(fixture.session.state(), ClientState::Lobby);
        assert_eq!(fixture.session.game_id(), None);

        fixture
            .session
            .apply_event(&SessionEvent::Notify(Notification::GameDeleted));
        assert_eq!(fixture.session.state(), ClientState::Lobby);
    }

    #[test]
    fn test_move_for_another_game_is_ignored() {
        let mut fixture = Fixture::in_state(ClientState::Joined);
        assert_eq!(fixture.session.game_id(), Some(3));

        fixture.session.apply_event(&SessionEvent::MoveTo {
            game_id: 1,
            state: ClientState::Lobby,
        });
        assert_eq!(fixture.session.state(), ClientState::Joined);
        assert_eq!(fixture.session.game_id(), Some(3));
    }

    #[test]
    fn test_move_in_lobby_is_ignored() {
        let mut fixture = Fixture::in_state(ClientState::Lobby);
        fixture.session.apply_event(&SessionEvent::MoveTo {
            game_id: 3,
            state: ClientState::Playing,
        });
        assert_eq!(fixture.session.state(), ClientState::Lobby);
    }

    #[test]
    fn test_close_releases_everything() {
        let mut fixture = Fixture::in_state(ClientState::Playing);
        fixture.session.close(&fixture.names, &fixture.games);

        assert_eq!(fixture.games.calls(), vec!["disconnect alice"]);
        assert_eq!(*fixture.names.released.lock(), vec![1]);
        assert_eq!(fixture.session.user_name(), "");
    }
}
