//! Task rows and the transactional application of column placements.

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::{debug, info, instrument};

use kanban_core::positions::{self, Placement, PositionShift};
use kanban_core::{NewTask, Task, TaskId, TaskPatch, TaskStatus};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

const TABLE: &str = "tasks";
const TASK_COLUMNS: &str =
    "id, title, description, status, due_date, position, created_at, updated_at";

#[derive(Clone)]
pub struct TaskRepo {
    db: Database,
}

impl TaskRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Insert a task, appending it to its column or inserting it at the
    /// requested position.
    #[instrument(skip(self, new), fields(status = %new.status, position = ?new.position))]
    pub fn create(&self, new: NewTask) -> Result<Task, StoreError> {
        new.validate()?;
        let id = TaskId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_tx(|conn| {
            let placement =
                positions::place_new(new.status, new.position, max_position(conn, new.status)?);
            apply_shifts(conn, &placement, None)?;

            let task = Task {
                id,
                title: new.title,
                description: new.description,
                status: new.status,
                due_date: new.due_date,
                position: placement.position,
                created_at: now.clone(),
                updated_at: now,
            };
            conn.execute(
                "INSERT INTO tasks (id, title, description, status, due_date, position, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    task.id.as_str(),
                    task.title,
                    task.description,
                    task.status.as_str(),
                    task.due_date.map(row_helpers::format_date),
                    task.position,
                    task.created_at,
                    task.updated_at,
                ],
            )?;

            debug!(task_id = %task.id, position = task.position, "task created");
            Ok(task)
        })
    }

    /// Get a task by ID.
    #[instrument(skip(self), fields(task_id = %id))]
    pub fn get(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.db.with_conn(|conn| fetch(conn, id))
    }

    /// Apply a partial update. Status and position changes renumber the
    /// affected columns in the same transaction as the row write.
    #[instrument(skip(self, patch), fields(task_id = %id))]
    pub fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        patch.validate()?;

        self.db.with_tx(|conn| {
            let current = fetch(conn, id)?;
            let mut task = current.clone();
            patch.apply_fields(&mut task);

            let placement = positions::place_moved(
                current.status,
                current.position,
                task.status,
                patch.position,
                max_position(conn, task.status)?,
            );
            apply_shifts(conn, &placement, Some(id))?;

            task.position = placement.position;
            task.updated_at = Utc::now().to_rfc3339();
            conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, status = ?3, due_date = ?4,
                        position = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    task.title,
                    task.description,
                    task.status.as_str(),
                    task.due_date.map(row_helpers::format_date),
                    task.position,
                    task.updated_at,
                    id.as_str(),
                ],
            )?;

            if (current.status, current.position) != (task.status, task.position) {
                debug!(
                    from_status = %current.status,
                    from_position = current.position,
                    to_status = %task.status,
                    to_position = task.position,
                    "task moved"
                );
            }
            Ok(task)
        })
    }

    /// Delete a task and close the gap it leaves in its column.
    #[instrument(skip(self), fields(task_id = %id))]
    pub fn delete(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.db.with_tx(|conn| {
            let task = fetch(conn, id)?;
            conn.execute("DELETE FROM tasks WHERE id = ?1", [id.as_str()])?;
            shift_positions(conn, &positions::close_gap(task.status, task.position), None)?;
            Ok(task)
        })
    }

    /// All tasks ordered by status rank, then position.
    #[instrument(skip(self))]
    pub fn list_ordered(&self) -> Result<Vec<Task>, StoreError> {
        self.db.with_conn(load_ordered)
    }

    /// One column, ordered by position.
    #[instrument(skip(self))]
    pub fn column(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE status = ?1
                 ORDER BY position, created_at, id"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query([status.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_task(row)?);
            }
            Ok(results)
        })
    }

    /// Renumber every column that is not a dense `0..n` sequence, keeping the
    /// current order (ties broken by creation time). Returns rows changed.
    #[instrument(skip(self))]
    pub fn repair_positions(&self) -> Result<usize, StoreError> {
        self.db.with_tx(|conn| {
            let tasks = load_ordered(conn)?;
            let mut changed = 0;
            for status in positions::column_violations(&tasks) {
                let column = tasks.iter().filter(|t| t.status == status);
                for (task, position) in column.zip(0_i64..) {
                    if task.position != position {
                        conn.execute(
                            "UPDATE tasks SET position = ?1 WHERE id = ?2",
                            params![position, task.id.as_str()],
                        )?;
                        changed += 1;
                    }
                }
                info!(status = %status, "column positions repaired");
            }
            Ok(changed)
        })
    }
}

/// Highest position in a column, `None` when the column is empty.
pub fn max_position(conn: &Connection, status: TaskStatus) -> Result<Option<i64>, StoreError> {
    let max = conn.query_row(
        "SELECT MAX(position) FROM tasks WHERE status = ?1",
        [status.as_str()],
        |row| row.get(0),
    )?;
    Ok(max)
}

/// Bulk-shift the positions a [`PositionShift`] covers, skipping `exclude`.
/// Runs on whatever transaction `conn` belongs to.
pub fn shift_positions(
    conn: &Connection,
    shift: &PositionShift,
    exclude: Option<&TaskId>,
) -> Result<usize, StoreError> {
    let changed = conn.execute(
        "UPDATE tasks SET position = position + ?1
         WHERE status = ?2
           AND position >= ?3
           AND (?4 IS NULL OR position <= ?4)
           AND (?5 IS NULL OR id != ?5)",
        params![
            shift.delta,
            shift.status.as_str(),
            shift.from,
            shift.to,
            exclude.map(TaskId::as_str),
        ],
    )?;
    debug!(
        status = %shift.status,
        from = shift.from,
        to = ?shift.to,
        delta = shift.delta,
        changed,
        "positions shifted"
    );
    Ok(changed)
}

fn apply_shifts(
    conn: &Connection,
    placement: &Placement,
    exclude: Option<&TaskId>,
) -> Result<(), StoreError> {
    for shift in &placement.shifts {
        shift_positions(conn, shift, exclude)?;
    }
    Ok(())
}

fn fetch(conn: &Connection, id: &TaskId) -> Result<Task, StoreError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([id.as_str()])?;
    match rows.next()? {
        Some(row) => row_to_task(row),
        None => Err(StoreError::NotFound(format!("task {id}"))),
    }
}

fn load_ordered(conn: &Connection) -> Result<Vec<Task>, StoreError> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY position, created_at, id");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        results.push(row_to_task(row)?);
    }
    // Stable: keeps the per-column position order from SQL.
    results.sort_by_key(|task| task.status.rank());
    Ok(results)
}

fn row_to_task(row: &rusqlite::Row<'_>) -> Result<Task, StoreError> {
    let status: String = row_helpers::get(row, 3, TABLE, "status")?;
    let due_date: Option<String> = row_helpers::get_opt(row, 4, TABLE, "due_date")?;

    Ok(Task {
        id: TaskId::from_raw(row_helpers::get::<String>(row, 0, TABLE, "id")?),
        title: row_helpers::get(row, 1, TABLE, "title")?,
        description: row_helpers::get_opt(row, 2, TABLE, "description")?,
        status: row_helpers::parse_enum(&status, TABLE, "status")?,
        due_date: due_date
            .as_deref()
            .map(|raw| row_helpers::parse_date(raw, TABLE, "due_date"))
            .transpose()?,
        position: row_helpers::get(row, 5, TABLE, "position")?,
        created_at: row_helpers::get(row, 6, TABLE, "created_at")?,
        updated_at: row_helpers::get(row, 7, TABLE, "updated_at")?,
    })
}
