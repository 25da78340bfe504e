//! Column position maintenance.
//!
//! Within a status column, positions form the dense sequence `0..n`. Every
//! change that moves a task into, out of, or within a column is planned here
//! as a [`Placement`]: the final position of the task itself plus the bulk
//! [`PositionShift`]s that keep its siblings dense. Planning is pure; the
//! store applies a placement inside one transaction together with the row
//! write.
//!
//! Shifts always target *other* rows. The moved task is written with
//! [`Placement::position`] afterwards.

use std::collections::HashMap;

use crate::task::{Task, TaskStatus};

/// Add `delta` to the position of every other task in `status` whose
/// position lies in `from..=to` (`to: None` means unbounded).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionShift {
    pub status: TaskStatus,
    pub from: i64,
    pub to: Option<i64>,
    pub delta: i64,
}

impl PositionShift {
    /// Make room at `at` by pushing everything from there on down by one.
    pub fn open(status: TaskStatus, at: i64) -> Self {
        Self {
            status,
            from: at,
            to: None,
            delta: 1,
        }
    }

    pub fn covers(&self, status: TaskStatus, position: i64) -> bool {
        status == self.status && position >= self.from && self.to.map_or(true, |to| position <= to)
    }

    /// Position after the shift for a task at (`status`, `position`).
    pub fn apply(&self, status: TaskStatus, position: i64) -> i64 {
        if self.covers(status, position) {
            position + self.delta
        } else {
            position
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub position: i64,
    pub shifts: Vec<PositionShift>,
}

impl Placement {
    fn stay(position: i64) -> Self {
        Self {
            position,
            shifts: Vec::new(),
        }
    }
}

fn next_slot(column_max: Option<i64>) -> i64 {
    column_max.map_or(0, |max| max + 1)
}

/// Place a task that does not exist yet.
///
/// Without a requested position the task is appended. A requested position
/// is clamped to `0..=n` and its successors move down one slot.
pub fn place_new(status: TaskStatus, requested: Option<i64>, column_max: Option<i64>) -> Placement {
    let end = next_slot(column_max);
    let Some(requested) = requested else {
        return Placement::stay(end);
    };

    let position = requested.clamp(0, end);
    let mut placement = Placement::stay(position);
    if position < end {
        placement.shifts.push(PositionShift::open(status, position));
    }
    placement
}

/// Place an existing task at (`from_status`, `from_position`) after an update
/// that targets `to_status` and optionally a `requested` position.
///
/// `target_max` is the highest position currently in `to_status`, which
/// includes the task itself when the status does not change.
pub fn place_moved(
    from_status: TaskStatus,
    from_position: i64,
    to_status: TaskStatus,
    requested: Option<i64>,
    target_max: Option<i64>,
) -> Placement {
    if to_status != from_status {
        let end = next_slot(target_max);
        let position = requested.map_or(end, |p| p.clamp(0, end));
        let mut placement = Placement::stay(position);
        if position < end {
            placement.shifts.push(PositionShift::open(to_status, position));
        }
        placement.shifts.push(close_gap(from_status, from_position));
        return placement;
    }

    let Some(requested) = requested else {
        return Placement::stay(from_position);
    };
    let last = target_max.map_or(from_position, |max| max.max(from_position));
    let position = requested.clamp(0, last);

    let mut placement = Placement::stay(position);
    if position > from_position {
        placement.shifts.push(PositionShift {
            status: from_status,
            from: from_position + 1,
            to: Some(position),
            delta: -1,
        });
    } else if position < from_position {
        placement.shifts.push(PositionShift {
            status: from_status,
            from: position,
            to: Some(from_position - 1),
            delta: 1,
        });
    }
    placement
}

/// Close the hole left at (`status`, `position`) by a departing task.
pub fn close_gap(status: TaskStatus, position: i64) -> PositionShift {
    PositionShift {
        status,
        from: position + 1,
        to: None,
        delta: -1,
    }
}

/// Statuses whose positions are not exactly `0..n`, in rank order.
pub fn column_violations(tasks: &[Task]) -> Vec<TaskStatus> {
    let mut columns: HashMap<TaskStatus, Vec<i64>> = HashMap::new();
    for task in tasks {
        columns.entry(task.status).or_default().push(task.position);
    }

    TaskStatus::ALL
        .into_iter()
        .filter(|status| {
            let Some(positions) = columns.get_mut(status) else {
                return false;
            };
            positions.sort_unstable();
            positions.iter().zip(0_i64..).any(|(&actual, expected)| actual != expected)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TaskId;
    use crate::task::TaskStatus::{Done, InProgress, Todo};

    /// Minimal in-memory board that applies placements the way the store does.
    #[derive(Default)]
    struct Board {
        tasks: Vec<Task>,
    }

    impl Board {
        fn max(&self, status: TaskStatus) -> Option<i64> {
            self.tasks
                .iter()
                .filter(|t| t.status == status)
                .map(|t| t.position)
                .max()
        }

        fn shift(&mut self, placement: &Placement, skip: Option<usize>) {
            for shift in &placement.shifts {
                for (i, task) in self.tasks.iter_mut().enumerate() {
                    if Some(i) != skip {
                        task.position = shift.apply(task.status, task.position);
                    }
                }
            }
        }

        fn create(&mut self, title: &str, status: TaskStatus, requested: Option<i64>) {
            let placement = place_new(status, requested, self.max(status));
            self.shift(&placement, None);
            self.tasks.push(Task {
                id: TaskId::from_raw(title),
                title: title.into(),
                description: None,
                status,
                due_date: None,
                position: placement.position,
                created_at: String::new(),
                updated_at: String::new(),
            });
        }

        fn index(&self, title: &str) -> usize {
            self.tasks.iter().position(|t| t.title == title).unwrap()
        }

        fn update(&mut self, title: &str, status: Option<TaskStatus>, requested: Option<i64>) {
            let i = self.index(title);
            let (from_status, from_position) = (self.tasks[i].status, self.tasks[i].position);
            let to_status = status.unwrap_or(from_status);
            let placement = place_moved(
                from_status,
                from_position,
                to_status,
                requested,
                self.max(to_status),
            );
            self.shift(&placement, Some(i));
            self.tasks[i].status = to_status;
            self.tasks[i].position = placement.position;
        }

        fn delete(&mut self, title: &str) {
            let removed = self.tasks.remove(self.index(title));
            let shift = close_gap(removed.status, removed.position);
            for task in &mut self.tasks {
                task.position = shift.apply(task.status, task.position);
            }
        }

        fn column(&self, status: TaskStatus) -> Vec<(String, i64)> {
            let mut column: Vec<_> = self
                .tasks
                .iter()
                .filter(|t| t.status == status)
                .map(|t| (t.title.clone(), t.position))
                .collect();
            column.sort_by_key(|(_, p)| *p);
            column
        }
    }

    fn col(entries: &[(&str, i64)]) -> Vec<(String, i64)> {
        entries.iter().map(|(t, p)| ((*t).to_string(), *p)).collect()
    }

    #[test]
    fn append_when_no_position() {
        assert_eq!(place_new(Todo, None, None), Placement::stay(0));
        assert_eq!(place_new(Todo, None, Some(4)), Placement::stay(5));
    }

    #[test]
    fn insert_opens_a_slot() {
        let placement = place_new(Todo, Some(1), Some(1));
        assert_eq!(placement.position, 1);
        assert_eq!(placement.shifts, vec![PositionShift::open(Todo, 1)]);
    }

    #[test]
    fn insert_at_end_needs_no_shift() {
        assert_eq!(place_new(Done, Some(2), Some(1)), Placement::stay(2));
    }

    #[test]
    fn out_of_range_request_is_clamped() {
        assert_eq!(place_new(Done, Some(9), None).position, 0);
        assert_eq!(place_moved(Todo, 0, Todo, Some(9), Some(2)).position, 2);
        assert_eq!(place_moved(Todo, 0, Done, Some(9), Some(0)).position, 1);
    }

    #[test]
    fn same_position_is_noop() {
        assert_eq!(place_moved(Todo, 2, Todo, Some(2), Some(3)), Placement::stay(2));
        assert_eq!(place_moved(Todo, 2, Todo, None, Some(3)), Placement::stay(2));
    }

    #[test]
    fn moving_down_pulls_range_up() {
        let placement = place_moved(Todo, 1, Todo, Some(3), Some(4));
        assert_eq!(
            placement.shifts,
            vec![PositionShift {
                status: Todo,
                from: 2,
                to: Some(3),
                delta: -1
            }]
        );
    }

    #[test]
    fn moving_up_pushes_range_down() {
        let placement = place_moved(Todo, 3, Todo, Some(1), Some(4));
        assert_eq!(
            placement.shifts,
            vec![PositionShift {
                status: Todo,
                from: 1,
                to: Some(2),
                delta: 1
            }]
        );
    }

    #[test]
    fn status_change_without_position_appends_and_compacts() {
        let placement = place_moved(Todo, 1, Done, None, Some(1));
        assert_eq!(placement.position, 2);
        assert_eq!(placement.shifts, vec![close_gap(Todo, 1)]);
    }

    #[test]
    fn shift_bounds_are_inclusive() {
        let shift = PositionShift {
            status: Todo,
            from: 1,
            to: Some(3),
            delta: -1,
        };
        assert!(!shift.covers(Todo, 0));
        assert!(shift.covers(Todo, 1));
        assert!(shift.covers(Todo, 3));
        assert!(!shift.covers(Todo, 4));
        assert!(!shift.covers(Done, 2));
    }

    #[test]
    fn move_across_columns_at_position() {
        let mut board = Board::default();
        for title in ["A", "B", "C"] {
            board.create(title, Todo, None);
        }
        board.create("D", Done, None);
        board.create("E", Done, None);

        board.update("B", Some(Done), Some(1));

        assert_eq!(board.column(Todo), col(&[("A", 0), ("C", 1)]));
        assert_eq!(board.column(Done), col(&[("D", 0), ("B", 1), ("E", 2)]));
    }

    #[test]
    fn move_within_column() {
        let mut board = Board::default();
        for title in ["A", "B", "C"] {
            board.create(title, Todo, None);
        }

        board.update("C", None, Some(1));

        assert_eq!(board.column(Todo), col(&[("A", 0), ("C", 1), ("B", 2)]));
    }

    #[test]
    fn create_at_position_inserts() {
        let mut board = Board::default();
        board.create("A", Todo, None);
        board.create("B", Todo, None);

        board.create("D", Todo, Some(1));

        assert_eq!(board.column(Todo), col(&[("A", 0), ("D", 1), ("B", 2)]));
    }

    #[test]
    fn delete_compacts_column() {
        let mut board = Board::default();
        for title in ["A", "B", "C"] {
            board.create(title, InProgress, None);
        }

        board.delete("A");

        assert_eq!(board.column(InProgress), col(&[("B", 0), ("C", 1)]));
        assert!(column_violations(&board.tasks).is_empty());
    }

    #[test]
    fn violations_detect_gaps_and_duplicates() {
        let mut board = Board::default();
        board.create("A", Todo, None);
        board.create("B", Todo, None);
        board.create("C", Done, None);
        assert!(column_violations(&board.tasks).is_empty());

        board.tasks[1].position = 5;
        board.tasks[2].position = 1;
        assert_eq!(column_violations(&board.tasks), vec![Todo, Done]);

        board.tasks[1].position = 0;
        assert_eq!(column_violations(&board.tasks), vec![Todo, Done]);
    }
}
