//! Drag session controller.
//!
//! A drag is modelled as a pure state machine: [`step`] takes the current
//! [`DragState`] and one [`DragEvent`] and returns the next state plus the
//! effects the caller should act on. Rendering reacts to
//! [`DragEffect::Moved`]; the sync engine consumes [`DragEffect::Dropped`].
//! The confirmed task store is never touched here.

use taskboard_proto::column::{ColumnId, ColumnSet};
use taskboard_proto::task::{Task, TaskId};

use crate::board::{Position, WorkingSnapshot};

/// What the pointer (or keyboard cursor) is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    /// Empty area of a column; the task goes to its end.
    Column(ColumnId),
    /// Another task; the dragged task goes right before it.
    Task(TaskId),
    /// Explicit slot, counted after the dragged task is taken out.
    Slot {
        /// Destination column.
        column: ColumnId,
        /// Destination index, clamped to the column length.
        index: usize,
    },
}

/// Input to the drag state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// Pick up a task. `confirmed` is the board as currently confirmed.
    Start {
        /// Task being dragged.
        task_id: TaskId,
        /// Confirmed tasks the working snapshot is copied from.
        confirmed: Vec<Task>,
    },
    /// The drag moved over a target.
    Over(DragTarget),
    /// The task was released, over a target or outside any.
    Drop(Option<DragTarget>),
    /// The drag was aborted (escape key, focus loss).
    Cancel,
}

/// An active drag.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Task being dragged.
    pub task_id: TaskId,
    /// Where the task was when the drag started.
    pub origin: Position,
    /// Private copy of the board, reordered as the drag moves.
    pub snapshot: WorkingSnapshot,
    last_target: Option<DragTarget>,
}

/// State of the controller.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    /// No drag in progress.
    #[default]
    Idle,
    /// A drag is in progress.
    Dragging(Box<DragSession>),
}

/// Why a `Start` was refused.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum DragRejection {
    /// Another drag is still active.
    #[error("task {active} is already being dragged")]
    AlreadyDragging {
        /// Task of the active session.
        active: TaskId,
    },
    /// The task is not on the board.
    #[error("task {0} is not on the board")]
    UnknownTask(TaskId),
}

/// Neighbours of the dropped task in its destination column.
///
/// Used to replay the move onto a board that changed while the drop was
/// being synced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchor {
    /// Task directly above the dropped task.
    pub after: Option<TaskId>,
    /// Task directly below the dropped task.
    pub before: Option<TaskId>,
}

/// Everything the sync engine needs to persist a drop.
#[derive(Debug, Clone, PartialEq)]
pub struct DropOutcome {
    /// Dropped task.
    pub task_id: TaskId,
    /// Position at drag start.
    pub origin: Position,
    /// Final position.
    pub destination: Position,
    /// Neighbours at the final position.
    pub anchor: Anchor,
    /// Board as displayed at drop time.
    pub snapshot: WorkingSnapshot,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEffect {
    /// A drag started; render the snapshot.
    Started {
        /// Dragged task.
        task_id: TaskId,
        /// Its starting position.
        origin: Position,
    },
    /// The dragged task moved inside the snapshot; re-render.
    Moved {
        /// Dragged task.
        task_id: TaskId,
        /// Its new position.
        position: Position,
    },
    /// A `Start` was refused.
    Rejected(DragRejection),
    /// The task was dropped; hand the outcome to the sync engine.
    Dropped(Box<DropOutcome>),
    /// The drag ended without a drop; revert to the confirmed board.
    Cancelled {
        /// Task that was being dragged.
        task_id: TaskId,
    },
}

/// Advances the drag state machine by one event.
#[must_use]
pub fn step(state: DragState, event: DragEvent, columns: &ColumnSet) -> (DragState, Vec<DragEffect>) {
    match (state, event) {
        (DragState::Idle, DragEvent::Start { task_id, confirmed }) => start(task_id, &confirmed, columns),
        (DragState::Idle, _) => (DragState::Idle, Vec::new()),
        (DragState::Dragging(session), DragEvent::Start { task_id, .. }) => {
            tracing::debug!(
                requested = %task_id,
                active = %session.task_id,
                "drag start rejected, session active"
            );
            let rejection = DragRejection::AlreadyDragging {
                active: session.task_id,
            };
            (
                DragState::Dragging(session),
                vec![DragEffect::Rejected(rejection)],
            )
        }
        (DragState::Dragging(mut session), DragEvent::Over(target)) => {
            let effects = over(&mut session, target);
            (DragState::Dragging(session), effects)
        }
        (DragState::Dragging(session), DragEvent::Drop(Some(target))) => drop_on(*session, &target),
        (DragState::Dragging(session), DragEvent::Drop(None) | DragEvent::Cancel) => cancel(&session),
    }
}

fn start(task_id: TaskId, confirmed: &[Task], columns: &ColumnSet) -> (DragState, Vec<DragEffect>) {
    let snapshot = WorkingSnapshot::from_confirmed(confirmed, columns);
    let Some(origin) = snapshot.position_of(task_id) else {
        tracing::debug!(task = %task_id, "drag start rejected, unknown task");
        return (
            DragState::Idle,
            vec![DragEffect::Rejected(DragRejection::UnknownTask(task_id))],
        );
    };
    let effect = DragEffect::Started {
        task_id,
        origin: origin.clone(),
    };
    let session = DragSession {
        task_id,
        origin,
        snapshot,
        last_target: None,
    };
    (DragState::Dragging(Box::new(session)), vec![effect])
}

fn over(session: &mut DragSession, target: DragTarget) -> Vec<DragEffect> {
    if session.last_target.as_ref() == Some(&target) {
        return Vec::new();
    }
    let Some(position) = resolve(&session.snapshot, session.task_id, &target) else {
        return Vec::new();
    };
    session.last_target = Some(target);
    if !session
        .snapshot
        .move_task(session.task_id, &position.column, position.index)
    {
        return Vec::new();
    }
    let Some(position) = session.snapshot.position_of(session.task_id) else {
        return Vec::new();
    };
    vec![DragEffect::Moved {
        task_id: session.task_id,
        position,
    }]
}

fn drop_on(mut session: DragSession, target: &DragTarget) -> (DragState, Vec<DragEffect>) {
    let Some(position) = resolve(&session.snapshot, session.task_id, target) else {
        return cancel(&session);
    };
    session
        .snapshot
        .move_task(session.task_id, &position.column, position.index);
    let Some(destination) = session.snapshot.position_of(session.task_id) else {
        return cancel(&session);
    };

    let column = session.snapshot.column_tasks(&destination.column);
    let anchor = Anchor {
        after: destination
            .index
            .checked_sub(1)
            .and_then(|i| column.get(i))
            .map(|t| t.id),
        before: column.get(destination.index + 1).map(|t| t.id),
    };
    tracing::debug!(
        task = %session.task_id,
        from = %session.origin,
        to = %destination,
        "task dropped"
    );
    let outcome = DropOutcome {
        task_id: session.task_id,
        origin: session.origin,
        destination,
        anchor,
        snapshot: session.snapshot,
    };
    (DragState::Idle, vec![DragEffect::Dropped(Box::new(outcome))])
}

fn cancel(session: &DragSession) -> (DragState, Vec<DragEffect>) {
    tracing::debug!(task = %session.task_id, "drag cancelled");
    (
        DragState::Idle,
        vec![DragEffect::Cancelled {
            task_id: session.task_id,
        }],
    )
}

/// Turns a target into a destination position for `dragged`, or `None` if
/// the target names an unknown column or task.
fn resolve(snapshot: &WorkingSnapshot, dragged: TaskId, target: &DragTarget) -> Option<Position> {
    match target {
        DragTarget::Column(column) => snapshot
            .columns()
            .contains(column)
            .then(|| Position::new(column.clone(), usize::MAX)),
        DragTarget::Slot { column, index } => snapshot
            .columns()
            .contains(column)
            .then(|| Position::new(column.clone(), *index)),
        DragTarget::Task(hovered) if *hovered == dragged => snapshot.position_of(dragged),
        DragTarget::Task(hovered) => {
            let at = snapshot.position_of(*hovered)?;
            let current = snapshot.position_of(dragged)?;
            let shift = usize::from(current.column == at.column && current.index < at.index);
            Some(Position::new(at.column, at.index - shift))
        }
    }
}

/// Owns a [`DragState`] and feeds events through [`step`].
#[derive(Debug, Clone)]
pub struct DragController {
    columns: ColumnSet,
    state: DragState,
}

impl DragController {
    /// Creates an idle controller for the given columns.
    #[must_use]
    pub fn new(columns: ColumnSet) -> Self {
        Self {
            columns,
            state: DragState::Idle,
        }
    }

    /// Feeds one event through the state machine.
    pub fn handle(&mut self, event: DragEvent) -> Vec<DragEffect> {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = step(state, event, &self.columns);
        self.state = next;
        effects
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &DragState {
        &self.state
    }

    /// Whether a drag is active.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Snapshot of the active drag, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<&WorkingSnapshot> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging(session) => Some(&session.snapshot),
        }
    }
}
