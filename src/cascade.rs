//! Cascade resolution: remove matched groups, let tiles fall, refill, and rescan until the
//! board is stable.
//!
//! The resolver is a small state machine. Each call to [`CascadeResolver::advance`] runs one
//! phase that produces something to animate and stops, so the view can play the effects
//! before asking for the next step. A cascade cannot be cancelled once started; it always
//! runs to `Idle`.
use crate::config::ScoreTable;
use crate::engine::{random_kind, Board, Position, SpecialState, TileId, TokenKind};
use crate::error::EngineError;
use crate::events::{GameEvent, TileCreation, TileMove};
use crate::matcher::{find_matches, Axis, MatchGroup};
use rand::Rng;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CascadePhase {
    Idle,
    Removing,
    Compacting,
    Refilling,
    Rescanning,
}

/// Special state earned by the anchor of `group`.
///
/// Groups of three earn nothing, a group of four clears along its own orientation, and five
/// or more make an explosive tile.
pub fn special_for(group: &MatchGroup) -> SpecialState {
    match (group.len(), group.axis) {
        (0..=3, _) => SpecialState::None,
        (4, Axis::Horizontal) => SpecialState::RowClear,
        (4, Axis::Vertical) => SpecialState::ColClear,
        _ => SpecialState::Explosive,
    }
}

/// What a single removal step did to the board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Emptied slots in the order they were cleared.
    pub removed: Vec<Position>,
    /// Anchors that survived with a new special state.
    pub formed: Vec<(Position, TileId, SpecialState)>,
    /// Special tiles that fired, in firing order.
    pub detonated: Vec<(Position, SpecialState)>,
    pub score: u32,
}

/// Removes every tile of `groups` except one anchor per group of four or more, which
/// survives carrying its new special state. Removed special tiles detonate, and
/// detonations chain.
///
/// A tile referenced by several groups is removed once; clearing an already empty slot
/// is a no-op.
pub fn remove_groups(
    board: &mut Board,
    groups: &[MatchGroup],
    score_table: &ScoreTable,
) -> Result<RemovalReport, EngineError> {
    let mut report = RemovalReport::default();

    let mut anchors: Vec<(Position, SpecialState)> = Vec::new();
    for group in groups {
        let special = special_for(group);
        if special == SpecialState::None {
            continue;
        }
        if let Some(pos) = pick_anchor(board, group, &anchors)? {
            anchors.push((pos, special));
        }
    }
    let is_anchor = |pos: Position| anchors.iter().any(|&(a, _)| a == pos);

    let mut doomed: Vec<Position> = Vec::new();
    let mut seen: HashSet<Position> = HashSet::new();
    for group in groups {
        for member in &group.members {
            if !is_anchor(member.position) && seen.insert(member.position) {
                doomed.push(member.position);
            }
        }
    }

    let mut fuses: VecDeque<Position> = VecDeque::new();
    for &pos in &doomed {
        if let Some(tile) = board.get(pos)? {
            if tile.special != SpecialState::None {
                fuses.push_back(pos);
            }
        }
    }
    while let Some(origin) = fuses.pop_front() {
        let Some(tile) = board.get(origin)? else {
            continue;
        };
        let special = tile.special;
        report.detonated.push((origin, special));
        for pos in blast_area(board, origin, special) {
            if is_anchor(pos) || !seen.insert(pos) {
                continue;
            }
            if let Some(hit) = board.get(pos)? {
                doomed.push(pos);
                if hit.special != SpecialState::None {
                    fuses.push_back(pos);
                }
            }
        }
    }

    for &(pos, special) in &anchors {
        if let Some(mut tile) = board.set(pos, None)? {
            tile.special = special;
            board.set(pos, Some(tile))?;
            report.formed.push((pos, tile.id, special));
        }
    }
    for pos in doomed {
        if board.set(pos, None)?.is_some() {
            report.removed.push(pos);
        }
    }

    report.score = groups
        .iter()
        .map(|g| score_table.score_for(g.len()))
        .fold(0u32, u32::saturating_add);
    Ok(report)
}

/// Chooses the member closest to the group's midpoint that has no special state yet and is
/// not already anchoring an earlier group.
fn pick_anchor(
    board: &Board,
    group: &MatchGroup,
    taken: &[(Position, SpecialState)],
) -> Result<Option<Position>, EngineError> {
    let mid = group.len() / 2;
    let mut order: Vec<usize> = (0..group.len()).collect();
    order.sort_by_key(|&i| (i.abs_diff(mid), i));

    for i in order {
        let pos = group.members[i].position;
        if taken.iter().any(|&(p, _)| p == pos) {
            continue;
        }
        if let Some(tile) = board.get(pos)? {
            if tile.special == SpecialState::None {
                return Ok(Some(pos));
            }
        }
    }
    Ok(None)
}

fn blast_area(board: &Board, origin: Position, special: SpecialState) -> Vec<Position> {
    let row = (0..board.width()).map(|col| Position::new(origin.row, col));
    let col = (0..board.height()).map(|r| Position::new(r, origin.col));
    match special {
        SpecialState::None => Vec::new(),
        SpecialState::RowClear => row.filter(|&p| p != origin).collect(),
        SpecialState::ColClear => col.filter(|&p| p != origin).collect(),
        SpecialState::Explosive => row.chain(col).filter(|&p| p != origin).collect(),
    }
}

/// Lets every tile fall to the lowest free slot of its column, preserving their order.
/// Afterwards no empty slot lies below an occupied one.
pub fn compact(board: &mut Board) -> Result<Vec<TileMove>, EngineError> {
    let mut moves = Vec::new();
    let height = board.height();
    if height == 0 {
        return Ok(moves);
    }

    for c in 0..board.width() {
        let mut empty_slot = height - 1;
        for r_check in (0..height).rev() {
            let from = Position::new(r_check, c);
            if board.get(from)?.is_none() {
                continue;
            }
            if r_check != empty_slot {
                let to = Position::new(empty_slot, c);
                let tile = board.set(from, None)?;
                board.set(to, tile)?;
                if let Some(tile) = tile {
                    moves.push(TileMove {
                        from,
                        to,
                        tile_id: tile.id,
                    });
                }
            }
            empty_slot = empty_slot.saturating_sub(1);
        }
    }
    Ok(moves)
}

/// Places a new tile of a uniformly random kind in every empty slot, row-major.
pub fn refill(
    board: &mut Board,
    kinds: &[TokenKind],
    rng: &mut impl Rng,
) -> Result<Vec<TileCreation>, EngineError> {
    let empty: Vec<Position> = board
        .positions()
        .filter(|&pos| matches!(board.get(pos), Ok(None)))
        .collect();

    let mut created = Vec::with_capacity(empty.len());
    for position in empty {
        let kind = random_kind(kinds, rng)?;
        let tile = board.place_new(position, kind)?;
        created.push(TileCreation {
            position,
            kind,
            tile_id: tile.id,
        });
    }
    Ok(created)
}

/// Effects of one [`CascadeResolver::advance`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadeStep {
    pub events: Vec<GameEvent>,
    pub score_delta: u32,
    /// The board is stable and the resolver is back to `Idle`.
    pub finished: bool,
}

/// Drives `Removing -> Compacting -> Refilling -> Rescanning -> (Removing | Idle)`.
#[derive(Clone, Debug)]
pub struct CascadeResolver {
    phase: CascadePhase,
    pending: Vec<MatchGroup>,
    /// Number of removal rounds in the current cascade, the first one included.
    rounds: u32,
}

impl Default for CascadeResolver {
    fn default() -> Self {
        CascadeResolver::new()
    }
}

impl CascadeResolver {
    pub fn new() -> Self {
        CascadeResolver {
            phase: CascadePhase::Idle,
            pending: Vec::new(),
            rounds: 0,
        }
    }

    pub fn phase(&self) -> CascadePhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == CascadePhase::Idle
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Starts a cascade from the groups of a triggering scan.
    pub fn begin(&mut self, groups: Vec<MatchGroup>) -> Result<(), EngineError> {
        if !self.is_idle() {
            return Err(EngineError::Busy);
        }
        self.rounds = 0;
        if groups.is_empty() {
            // Nothing to remove: a rescan settles the board immediately.
            self.phase = CascadePhase::Rescanning;
        } else {
            self.pending = groups;
            self.phase = CascadePhase::Removing;
        }
        Ok(())
    }

    /// Starts a cascade that first checks the current board for matches.
    pub fn begin_rescan(&mut self) -> Result<(), EngineError> {
        self.begin(Vec::new())
    }

    /// Runs phases until one of them produced effects to animate or the board is stable.
    pub fn advance(
        &mut self,
        board: &mut Board,
        kinds: &[TokenKind],
        score_table: &ScoreTable,
        rng: &mut impl Rng,
    ) -> Result<CascadeStep, EngineError> {
        let mut step = CascadeStep::default();
        loop {
            match self.phase {
                CascadePhase::Idle => {
                    step.finished = true;
                    return Ok(step);
                }
                CascadePhase::Removing => {
                    let groups = std::mem::take(&mut self.pending);
                    let report = remove_groups(board, &groups, score_table)?;
                    self.rounds += 1;
                    debug!(
                        round = self.rounds,
                        groups = groups.len(),
                        removed = report.removed.len(),
                        score = report.score,
                        "removed matched groups"
                    );
                    step.score_delta = step.score_delta.saturating_add(report.score);
                    step.events.push(GameEvent::MatchResolved {
                        groups,
                        score_delta: report.score,
                    });
                    for (position, special) in report.detonated {
                        step.events
                            .push(GameEvent::SpecialDetonated { position, special });
                    }
                    for (position, tile_id, special) in report.formed {
                        step.events.push(GameEvent::SpecialFormed {
                            position,
                            tile_id,
                            special,
                        });
                    }
                    step.events.push(GameEvent::TilesRemoved(report.removed));
                    self.phase = CascadePhase::Compacting;
                    return Ok(step);
                }
                CascadePhase::Compacting => {
                    let moves = compact(board)?;
                    self.phase = CascadePhase::Refilling;
                    if !moves.is_empty() {
                        step.events.push(GameEvent::TilesMoved(moves));
                        return Ok(step);
                    }
                }
                CascadePhase::Refilling => {
                    let created = refill(board, kinds, rng)?;
                    self.phase = CascadePhase::Rescanning;
                    if !created.is_empty() {
                        step.events.push(GameEvent::TilesCreated(created));
                        return Ok(step);
                    }
                }
                CascadePhase::Rescanning => {
                    let groups = find_matches(board);
                    if groups.is_empty() {
                        debug!(rounds = self.rounds, "cascade settled");
                        self.phase = CascadePhase::Idle;
                        step.events.push(GameEvent::CascadeComplete);
                        step.finished = true;
                        return Ok(step);
                    }
                    debug!(groups = groups.len(), "rescan found new matches");
                    self.pending = groups;
                    self.phase = CascadePhase::Removing;
                }
            }
        }
    }
}
