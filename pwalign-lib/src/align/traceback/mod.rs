use log::trace;
use serde::Serialize;

use super::aligners::{constants::MatrixLabel, AlignmentContext, AlignmentStrategy};
use matrix::ScoreMatrices;

pub mod matrix;

/// A cell of one of the co-indexed grids.
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash, Debug, Serialize)]
pub struct Position {
    /// Row, i.e. the length of the prefix of B.
    pub i: usize,
    /// Column, i.e. the length of the prefix of A.
    pub j: usize,
    pub label: MatrixLabel,
}

impl Position {
    /// A cell of the default grid.
    pub fn new(i: usize, j: usize) -> Self {
        Self::with_label(i, j, MatrixLabel::Default)
    }

    pub fn with_label(i: usize, j: usize, label: MatrixLabel) -> Self {
        Self { i, j, label }
    }
}

/// The positions visited moving from a cell to one of its predecessors, the predecessor last.
pub type Step = Vec<Position>;

/// The traceback paths found, each from a terminal cell back to an origin.
#[derive(Default, Clone, Eq, PartialEq, Debug, Serialize)]
pub struct Tracebacks {
    pub paths: Vec<Vec<Position>>,
    /// True if the enumeration stopped at the cap with more paths available.
    pub truncated: bool,
}

/// The predecessors of a position on the current path that remain to be explored.
struct Frame {
    steps: Vec<Step>,
    next: usize,
    /// The length of the current path when the frame was entered.
    path_len: usize,
}

/// Depth-first enumeration with an explicit stack, so long sequences do not exhaust the call
/// stack.
struct Enumerator<'a, S: AlignmentStrategy> {
    strategy: &'a S,
    ctx: &'a AlignmentContext<'a>,
    matrices: &'a ScoreMatrices,
    max_tracebacks: usize,
    path: Vec<Position>,
    stack: Vec<Frame>,
    tracebacks: Tracebacks,
}

impl<'a, S: AlignmentStrategy> Enumerator<'a, S> {
    /// Appends `position` to the current path.  A complete path is recorded, otherwise the
    /// predecessors are scheduled.  Returns `false` once the cap stops the enumeration.
    fn enter(&mut self, position: Position) -> bool {
        self.path.push(position);
        if self.strategy.is_origin(self.ctx, self.matrices, position) {
            if self.tracebacks.paths.len() == self.max_tracebacks {
                self.tracebacks.truncated = true;
                return false;
            }
            self.tracebacks.paths.push(self.path.clone());
            return true;
        }

        let steps = self.strategy.predecessors(self.ctx, self.matrices, position);
        if steps.is_empty() {
            trace!("Dead end at {position:?}");
        } else {
            self.stack.push(Frame {
                steps,
                next: 0,
                path_len: self.path.len(),
            });
        }
        true
    }

    fn run(mut self, terminals: Vec<Position>) -> Tracebacks {
        for terminal in terminals {
            self.path.clear();
            if !self.enter(terminal) {
                break;
            }
            while let Some(frame) = self.stack.last_mut() {
                if frame.next == frame.steps.len() {
                    self.stack.pop();
                    continue;
                }
                let step = std::mem::take(&mut frame.steps[frame.next]);
                frame.next += 1;
                let path_len = frame.path_len;

                let (&predecessor, inner) = step
                    .split_last()
                    .unwrap_or_else(|| panic!("Bug: empty step from {:?}", self.path.last()));
                self.path.truncate(path_len);
                self.path.extend_from_slice(inner);
                if !self.enter(predecessor) {
                    self.stack.clear();
                    return self.tracebacks;
                }
            }
        }
        self.tracebacks
    }
}

/// Enumerates the co-optimal traceback paths from every terminal cell of `strategy`, in the order
/// the predecessors are reported.  At most `max_tracebacks` paths are kept across all terminal
/// cells; if another one exists the result is flagged as truncated.
pub fn enumerate_tracebacks<S: AlignmentStrategy>(
    strategy: &S,
    ctx: &AlignmentContext<'_>,
    matrices: &ScoreMatrices,
    max_tracebacks: usize,
) -> Tracebacks {
    let terminals = strategy.terminal_cells(ctx, matrices);
    trace!("Tracing back from {} terminal cell(s)", terminals.len());
    let enumerator = Enumerator {
        strategy,
        ctx,
        matrices,
        max_tracebacks,
        path: Vec::new(),
        stack: Vec::new(),
        tracebacks: Tracebacks::default(),
    };
    enumerator.run(terminals)
}
