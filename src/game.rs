//! Top-level game session: owns the board and drives swaps, cascades, hints and reshuffles
//! one step at a time.
//!
//! Only one mutating operation is ever in flight. While a swap animation, a cascade or a
//! reshuffle is pending, new swap requests fail with [`EngineError::Busy`]. The view layer
//! plays the returned [`GameEvent`]s and calls [`Game::animation_complete`] to advance.
use crate::cascade::CascadeResolver;
use crate::config::GameConfig;
use crate::engine::{Board, Position};
use crate::error::EngineError;
use crate::events::GameEvent;
use crate::hint::{find_hint, Hint};
use crate::reshuffle::reshuffle;
use crate::selection::{Selection, SelectionOutcome};
use crate::swap::{try_swap, MoveOutcome};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::time::Duration;
use tracing::{debug, info, instrument};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    /// Waiting for player input; the idle timer is running.
    Idle,
    /// A matching swap was applied and the view is animating it.
    AwaitingSwapAnimation,
    /// Remove/compact/refill steps are being played.
    Cascading,
    /// A reshuffle was applied and the view is animating it.
    Reshuffling,
    /// A hint is on display. Input is accepted and clears it.
    SuggestingHint,
    /// The session has ended; nothing fires any more.
    TornDown,
}

/// A game session.
///
/// # Examples
/// ```
/// use match3_engine::config::GameConfig;
/// use match3_engine::game::{Game, GameState};
/// use match3_engine::hint::find_hint;
///
/// let mut game = Game::with_seed(GameConfig::default(), 514514).unwrap();
/// assert_eq!(game.state(), GameState::Idle);
///
/// if let Some(hint) = find_hint(game.board()) {
///     game.request_swap(hint.a, hint.b).unwrap();
///     assert!(game.is_busy());
///     game.settle().unwrap();
///     assert!(game.score() > 0);
/// }
/// assert!(!game.is_busy());
/// ```
#[derive(Clone, Debug)]
pub struct Game {
    config: GameConfig,
    board: Board,
    rng: SmallRng,
    state: GameState,
    resolver: CascadeResolver,
    selection: Selection,
    hint: Option<Hint>,
    idle_elapsed: Duration,
    score: u32,
    level: u32,
    moves: u32,
    reshuffle_pending: bool,
}

impl Game {
    /// Starts a session on a random matchless board, seeded from system entropy.
    pub fn new(config: GameConfig) -> Result<Self, EngineError> {
        Self::start(config, SmallRng::from_entropy())
    }

    /// Starts a reproducible session: the same config and seed give the same game.
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, EngineError> {
        Self::start(config, SmallRng::seed_from_u64(seed))
    }

    fn start(config: GameConfig, mut rng: SmallRng) -> Result<Self, EngineError> {
        config.validate()?;
        let mut board = Board::new_random(config.width, config.height, &config.kinds, &mut rng)?;
        reshuffle(
            &mut board,
            &config.kinds,
            config.max_reshuffle_attempts,
            &mut rng,
        )?;
        Ok(Self::assemble(config, board, rng))
    }

    /// Starts a session on a given board. The board is used as is, matches included; call
    /// [`Game::revalidate`] to resolve them.
    pub fn from_board(config: GameConfig, board: Board, seed: u64) -> Result<Self, EngineError> {
        config.validate()?;
        if board.width() != config.width || board.height() != config.height {
            return Err(EngineError::InvalidConfig(format!(
                "board is {}x{} but the configuration says {}x{}",
                board.width(),
                board.height(),
                config.width,
                config.height
            )));
        }
        Ok(Self::assemble(config, board, SmallRng::seed_from_u64(seed)))
    }

    fn assemble(config: GameConfig, board: Board, rng: SmallRng) -> Self {
        Game {
            config,
            board,
            rng,
            state: GameState::Idle,
            resolver: CascadeResolver::new(),
            selection: Selection::default(),
            hint: None,
            idle_elapsed: Duration::ZERO,
            score: 0,
            level: 1,
            moves: 0,
            reshuffle_pending: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of swaps that formed a match.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// The hint currently on display, if any.
    pub fn current_hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    /// `true` while a mutating operation is in flight (or after teardown).
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            GameState::AwaitingSwapAnimation
                | GameState::Cascading
                | GameState::Reshuffling
                | GameState::TornDown
        )
    }

    fn ensure_ready(&self) -> Result<(), EngineError> {
        if self.is_busy() {
            Err(EngineError::Busy)
        } else {
            Ok(())
        }
    }

    /// A player-initiated operation begins: stop the idle timer and drop any shown hint.
    fn interrupt_idle(&mut self) {
        self.idle_elapsed = Duration::ZERO;
        self.hint = None;
        if self.state == GameState::SuggestingHint {
            self.state = GameState::Idle;
        }
    }

    /// Feeds a click on `pos` into the selection state machine. A second click on a
    /// different tile becomes a swap request.
    pub fn select(&mut self, pos: Position) -> Result<Vec<GameEvent>, EngineError> {
        self.ensure_ready()?;
        self.board.get(pos)?;
        self.interrupt_idle();

        match self.selection.click(pos) {
            SelectionOutcome::SwapRequested { a, b } => {
                let result = self.request_swap(a, b);
                if !self.is_busy() {
                    self.selection.reset();
                }
                result
            }
            SelectionOutcome::Selected(_)
            | SelectionOutcome::Deselected
            | SelectionOutcome::Ignored => Ok(Vec::new()),
        }
    }

    /// Swaps the tiles at `a` and `b`. A swap that forms no match is undone immediately and
    /// drops any pending selection; one that does starts a cascade, advanced by
    /// [`Game::animation_complete`].
    #[instrument(skip(self), fields(score = self.score), level = "debug")]
    pub fn request_swap(
        &mut self,
        a: Position,
        b: Position,
    ) -> Result<Vec<GameEvent>, EngineError> {
        self.ensure_ready()?;
        self.interrupt_idle();

        match try_swap(&mut self.board, a, b)? {
            MoveOutcome::NoMatch => {
                debug!(%a, %b, "swap formed no match");
                self.selection.reset();
                Ok(vec![GameEvent::SwapReverted { a, b }])
            }
            MoveOutcome::Matched(groups) => {
                debug!(%a, %b, groups = groups.len(), "swap formed a match");
                self.moves += 1;
                self.resolver.begin(groups)?;
                self.state = GameState::AwaitingSwapAnimation;
                Ok(vec![GameEvent::TilesSwapped { a, b }])
            }
        }
    }

    /// Signal from the view that the last batch of effects finished playing.
    ///
    /// Advances the cascade by one step, or completes a reshuffle. Ignored when nothing is
    /// in flight.
    #[instrument(skip(self), fields(state = ?self.state), level = "debug")]
    pub fn animation_complete(&mut self) -> Result<Vec<GameEvent>, EngineError> {
        match self.state {
            GameState::AwaitingSwapAnimation | GameState::Cascading => {
                self.state = GameState::Cascading;
                self.advance_cascade()
            }
            GameState::Reshuffling => {
                let mut events = vec![GameEvent::ReshuffleComplete];
                self.resolver.begin_rescan()?;
                self.state = GameState::Cascading;
                events.extend(self.advance_cascade()?);
                Ok(events)
            }
            GameState::Idle | GameState::SuggestingHint | GameState::TornDown => Ok(Vec::new()),
        }
    }

    /// Re-checks the current board for matches and resolves them as a cascade. Used after a
    /// board was supplied from outside.
    pub fn revalidate(&mut self) -> Result<Vec<GameEvent>, EngineError> {
        self.ensure_ready()?;
        self.interrupt_idle();
        self.resolver.begin_rescan()?;
        self.state = GameState::Cascading;
        self.advance_cascade()
    }

    fn advance_cascade(&mut self) -> Result<Vec<GameEvent>, EngineError> {
        let step = self.resolver.advance(
            &mut self.board,
            &self.config.kinds,
            &self.config.score_table,
            &mut self.rng,
        )?;
        let mut events = step.events;
        if step.score_delta > 0 {
            self.score = self.score.saturating_add(step.score_delta);
            self.check_milestone(&mut events);
        }
        if step.finished {
            self.state = GameState::Idle;
            self.selection.reset();
            self.idle_elapsed = Duration::ZERO;
            if self.reshuffle_pending {
                self.reshuffle_pending = false;
                self.start_reshuffle(&mut events)?;
            }
        }
        Ok(events)
    }

    fn check_milestone(&mut self, events: &mut Vec<GameEvent>) {
        let Some(milestone) = self.config.milestone else {
            return;
        };
        while self.score >= self.level.saturating_mul(milestone) {
            self.level += 1;
            info!(level = self.level, score = self.score, "milestone reached");
            events.push(GameEvent::LevelUp { level: self.level });
            self.reshuffle_pending = true;
        }
    }

    /// Advances the idle timer. Once the configured delay has passed in `Idle`, a hint search
    /// runs: a found move is announced, a deadlock starts a reshuffle.
    pub fn tick(&mut self, elapsed: Duration) -> Result<Vec<GameEvent>, EngineError> {
        if self.state != GameState::Idle {
            return Ok(Vec::new());
        }
        self.idle_elapsed = self.idle_elapsed.saturating_add(elapsed);
        if self.idle_elapsed < self.config.hint_delay() {
            return Ok(Vec::new());
        }
        self.idle_elapsed = Duration::ZERO;
        self.run_hint_search()
    }

    /// Runs the hint search right away instead of waiting for the idle timer.
    pub fn suggest(&mut self) -> Result<Vec<GameEvent>, EngineError> {
        self.ensure_ready()?;
        self.interrupt_idle();
        self.run_hint_search()
    }

    fn run_hint_search(&mut self) -> Result<Vec<GameEvent>, EngineError> {
        match find_hint(&self.board) {
            Some(hint) => {
                debug!(a = %hint.a, b = %hint.b, "hint found");
                let event = GameEvent::HintAvailable {
                    a: hint.a,
                    b: hint.b,
                };
                self.hint = Some(hint);
                self.state = GameState::SuggestingHint;
                Ok(vec![event])
            }
            None => {
                info!("no move left on the board");
                let mut events = vec![GameEvent::NoMoveFound];
                self.start_reshuffle(&mut events)?;
                Ok(events)
            }
        }
    }

    /// Re-rolls the board into a matchless layout. Completes on the next
    /// [`Game::animation_complete`].
    pub fn reshuffle(&mut self) -> Result<Vec<GameEvent>, EngineError> {
        self.ensure_ready()?;
        self.interrupt_idle();
        let mut events = Vec::new();
        self.start_reshuffle(&mut events)?;
        Ok(events)
    }

    fn start_reshuffle(&mut self, events: &mut Vec<GameEvent>) -> Result<(), EngineError> {
        self.hint = None;
        let report = reshuffle(
            &mut self.board,
            &self.config.kinds,
            self.config.max_reshuffle_attempts,
            &mut self.rng,
        )?;
        info!(
            attempts = report.attempts,
            fallback = report.used_fallback,
            "reshuffle applied"
        );
        self.state = GameState::Reshuffling;
        events.push(GameEvent::Reshuffled(report.tiles));
        Ok(())
    }

    /// Ends the session. Timers stop firing and every further request fails with `Busy`.
    pub fn teardown(&mut self) {
        self.state = GameState::TornDown;
        self.hint = None;
        self.selection.reset();
    }

    /// Acknowledges every pending animation until the engine is no longer busy, returning all
    /// events produced on the way. For headless drivers and tests.
    pub fn settle(&mut self) -> Result<Vec<GameEvent>, EngineError> {
        let mut events = Vec::new();
        while self.is_busy() && self.state != GameState::TornDown {
            events.extend(self.animation_complete()?);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreTable;
    use crate::engine::TokenKind;
    use crate::matcher::find_matches;
    use crate::utils::{board_from_str_array, board_to_strings};

    fn config_for(board: &Board, kinds: u8) -> GameConfig {
        GameConfig {
            width: board.width(),
            height: board.height(),
            kinds: (0..kinds).map(TokenKind).collect(),
            milestone: None,
            ..GameConfig::default()
        }
    }

    fn game_from(rows: &[&str], kinds: u8) -> Game {
        let board = board_from_str_array(rows).unwrap();
        let config = config_for(&board, kinds);
        Game::from_board(config, board, 11).unwrap()
    }

    const PLAYABLE: [&str; 4] = ["BAAC", "ACDB", "CDBA", "DBAC"];

    #[test]
    fn test_new_game_is_matchless_and_seeded() {
        let game = Game::with_seed(GameConfig::default(), 7).unwrap();
        assert_eq!(game.board().occupied_count(), 64);
        assert!(find_matches(game.board()).is_empty());
        assert_eq!(game.state(), GameState::Idle);
        assert_eq!(game.level(), 1);

        let again = Game::with_seed(GameConfig::default(), 7).unwrap();
        assert_eq!(game.board().kinds_snapshot(), again.board().kinds_snapshot());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = GameConfig {
            kinds: vec![TokenKind(0), TokenKind(1)],
            ..GameConfig::default()
        };
        assert!(matches!(Game::new(config), Err(EngineError::InvalidConfig(_))));

        let board = board_from_str_array(&PLAYABLE).unwrap();
        assert!(Game::from_board(GameConfig::default(), board, 1).is_err());
    }

    #[test]
    fn test_matching_swap_runs_a_cascade() {
        let mut game = game_from(&PLAYABLE, 4);
        let events = game
            .request_swap(Position::new(0, 0), Position::new(1, 0))
            .unwrap();
        assert_eq!(
            events,
            vec![GameEvent::TilesSwapped {
                a: Position::new(0, 0),
                b: Position::new(1, 0)
            }]
        );
        assert_eq!(game.state(), GameState::AwaitingSwapAnimation);
        assert_eq!(game.moves(), 1);

        let events = game.animation_complete().unwrap();
        assert_eq!(game.state(), GameState::Cascading);
        let GameEvent::MatchResolved { groups, score_delta } = &events[0] else {
            panic!("expected MatchResolved, got {:?}", events);
        };
        assert_eq!(groups.len(), 1);
        assert_eq!(*score_delta, 100);
        assert_eq!(
            events[1],
            GameEvent::TilesRemoved(vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(0, 2)
            ])
        );
        assert_eq!(game.score(), 100);

        // Nothing sits above row 0, so the next step goes straight to the refill.
        let events = game.animation_complete().unwrap();
        assert!(matches!(&events[0], GameEvent::TilesCreated(c) if c.len() == 3));

        let rest = game.settle().unwrap();
        assert_eq!(rest.last(), Some(&GameEvent::CascadeComplete));
        assert_eq!(game.state(), GameState::Idle);
        assert!(game.score() >= 100);
        assert!(find_matches(game.board()).is_empty());
        assert_eq!(game.board().occupied_count(), 16);
    }

    #[test]
    fn test_busy_while_cascade_in_flight() {
        let mut game = game_from(&PLAYABLE, 4);
        game.request_swap(Position::new(0, 0), Position::new(1, 0))
            .unwrap();
        assert_eq!(
            game.request_swap(Position::new(2, 0), Position::new(2, 1)),
            Err(EngineError::Busy)
        );
        assert_eq!(game.reshuffle(), Err(EngineError::Busy));
        assert_eq!(game.select(Position::new(0, 0)), Err(EngineError::Busy));
        game.settle().unwrap();
        assert!(game
            .request_swap(Position::new(2, 0), Position::new(2, 1))
            .is_ok());
    }

    #[test]
    fn test_non_matching_swap_is_reverted() {
        let mut game = game_from(&PLAYABLE, 4);
        let before = board_to_strings(game.board());
        let events = game
            .request_swap(Position::new(2, 0), Position::new(2, 1))
            .unwrap();
        assert_eq!(
            events,
            vec![GameEvent::SwapReverted {
                a: Position::new(2, 0),
                b: Position::new(2, 1)
            }]
        );
        assert_eq!(board_to_strings(game.board()), before);
        assert_eq!(game.state(), GameState::Idle);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_reverted_swap_clears_pending_selection() {
        let mut game = game_from(&PLAYABLE, 4);
        game.select(Position::new(0, 0)).unwrap();
        game.request_swap(Position::new(2, 0), Position::new(2, 1))
            .unwrap();
        assert_eq!(game.selection(), Selection::NoSelection);
        // The next click starts a new selection instead of pairing with (0, 0).
        assert!(game.select(Position::new(3, 3)).unwrap().is_empty());
        assert_eq!(game.selection(), Selection::OneSelected(Position::new(3, 3)));
    }

    #[test]
    fn test_invalid_swaps_change_nothing() {
        let mut game = game_from(&PLAYABLE, 4);
        let before = game.board().clone();
        assert!(matches!(
            game.request_swap(Position::new(0, 0), Position::new(2, 0)),
            Err(EngineError::InvalidMove { .. })
        ));
        assert!(matches!(
            game.request_swap(Position::new(0, 0), Position::new(0, 9)),
            Err(EngineError::OutOfBounds { .. })
        ));
        assert_eq!(game.board(), &before);
        assert_eq!(game.state(), GameState::Idle);
    }

    #[test]
    fn test_idle_timer_announces_hint_and_input_clears_it() {
        let mut game = game_from(&PLAYABLE, 4);
        assert!(game.tick(Duration::from_millis(2000)).unwrap().is_empty());
        let events = game.tick(Duration::from_millis(1000)).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::HintAvailable {
                a: Position::new(0, 0),
                b: Position::new(1, 0)
            }]
        );
        assert_eq!(game.state(), GameState::SuggestingHint);
        assert!(game.current_hint().is_some());
        // The hint is shown once.
        assert!(game.tick(Duration::from_secs(10)).unwrap().is_empty());

        game.select(Position::new(3, 3)).unwrap();
        assert_eq!(game.state(), GameState::Idle);
        assert!(game.current_hint().is_none());
    }

    #[test]
    fn test_player_input_resets_idle_timer() {
        let mut game = game_from(&PLAYABLE, 4);
        game.tick(Duration::from_millis(2500)).unwrap();
        game.request_swap(Position::new(2, 0), Position::new(2, 1))
            .unwrap();
        assert!(game.tick(Duration::from_millis(2500)).unwrap().is_empty());
        assert_eq!(game.state(), GameState::Idle);
    }

    #[test]
    fn test_huge_idle_time_does_not_overflow() {
        let mut game = game_from(&PLAYABLE, 4);
        assert!(game.tick(Duration::from_millis(1)).unwrap().is_empty());
        let events = game.tick(Duration::MAX).unwrap();
        assert!(matches!(events[0], GameEvent::HintAvailable { .. }));
    }

    #[test]
    fn test_score_saturates_instead_of_overflowing() {
        let board = board_from_str_array(&PLAYABLE).unwrap();
        let config = GameConfig {
            score_table: ScoreTable::new([(3, u32::MAX)]),
            ..config_for(&board, 4)
        };
        let mut game = Game::from_board(config, board, 5).unwrap();
        game.request_swap(Position::new(0, 0), Position::new(1, 0))
            .unwrap();
        game.settle().unwrap();
        assert_eq!(game.score(), u32::MAX);
    }

    #[test]
    fn test_deadlock_triggers_reshuffle() {
        let mut game = game_from(&["ABC", "BCA", "CAB"], 3);
        let events = game.tick(Duration::from_secs(3)).unwrap();
        assert_eq!(events[0], GameEvent::NoMoveFound);
        assert!(matches!(&events[1], GameEvent::Reshuffled(t) if t.len() == 9));
        assert_eq!(game.state(), GameState::Reshuffling);
        assert_eq!(
            game.request_swap(Position::new(0, 0), Position::new(0, 1)),
            Err(EngineError::Busy)
        );

        let events = game.animation_complete().unwrap();
        assert_eq!(events[0], GameEvent::ReshuffleComplete);
        assert_eq!(events.last(), Some(&GameEvent::CascadeComplete));
        assert_eq!(game.state(), GameState::Idle);
        assert!(find_matches(game.board()).is_empty());
    }

    #[test]
    fn test_teardown_stops_everything() {
        let mut game = game_from(&["ABC", "BCA", "CAB"], 3);
        game.teardown();
        assert!(game.tick(Duration::from_secs(60)).unwrap().is_empty());
        assert!(game.animation_complete().unwrap().is_empty());
        assert_eq!(
            game.request_swap(Position::new(0, 0), Position::new(0, 1)),
            Err(EngineError::Busy)
        );
        assert!(game.settle().unwrap().is_empty());
        assert_eq!(game.state(), GameState::TornDown);
    }

    #[test]
    fn test_selection_drives_swaps() {
        let mut game = game_from(&PLAYABLE, 4);
        assert!(game.select(Position::new(0, 0)).unwrap().is_empty());
        assert_eq!(game.selection(), Selection::OneSelected(Position::new(0, 0)));
        let events = game.select(Position::new(1, 0)).unwrap();
        assert!(matches!(events[0], GameEvent::TilesSwapped { .. }));
        assert!(matches!(game.selection(), Selection::Resolving { .. }));
        game.settle().unwrap();
        assert_eq!(game.selection(), Selection::NoSelection);

        // A non-adjacent pair is rejected and the selection starts over.
        game.select(Position::new(0, 0)).unwrap();
        assert!(matches!(
            game.select(Position::new(3, 3)),
            Err(EngineError::InvalidMove { .. })
        ));
        assert_eq!(game.selection(), Selection::NoSelection);
        assert!(game.select(Position::new(4, 0)).is_err());
    }

    #[test]
    fn test_milestone_levels_up_and_reshuffles() {
        let board = board_from_str_array(&PLAYABLE).unwrap();
        let config = GameConfig {
            milestone: Some(100),
            ..config_for(&board, 4)
        };
        let mut game = Game::from_board(config, board, 5).unwrap();
        game.request_swap(Position::new(0, 0), Position::new(1, 0))
            .unwrap();
        let events = game.animation_complete().unwrap();
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
        assert!(game.level() >= 2);

        let events = game.settle().unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Reshuffled(_))));
        assert!(events.contains(&GameEvent::ReshuffleComplete));
        assert_eq!(game.state(), GameState::Idle);
        assert!(find_matches(game.board()).is_empty());
    }

    #[test]
    fn test_revalidate_resolves_supplied_matches() {
        let mut game = game_from(&["AAAB", "BCDC", "CDBD"], 4);
        let events = game.revalidate().unwrap();
        assert!(matches!(events[0], GameEvent::MatchResolved { .. }));
        game.settle().unwrap();
        assert!(find_matches(game.board()).is_empty());
        assert!(game.score() >= 100);
    }

    #[test]
    fn test_seeded_self_play_keeps_invariants() {
        let mut game = Game::with_seed(GameConfig::default(), 2024).unwrap();
        for _ in 0..30 {
            match find_hint(game.board()) {
                Some(hint) => {
                    let events = game.request_swap(hint.a, hint.b).unwrap();
                    assert!(matches!(events[0], GameEvent::TilesSwapped { .. }));
                }
                None => {
                    game.reshuffle().unwrap();
                }
            }
            game.settle().unwrap();
            assert_eq!(game.state(), GameState::Idle);
            assert_eq!(game.board().occupied_count(), 64);
            assert!(find_matches(game.board()).is_empty());
        }
        assert!(game.score() > 0);
    }
}
