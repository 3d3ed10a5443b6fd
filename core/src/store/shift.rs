//! Shift slots.
//!
//! Every write runs inside an IMMEDIATE transaction so the version read
//! and the update cannot interleave with another connection's write.

use super::{date_column, date_to_sql, StaffStore};
use crate::{
    error::{StaffError, StaffResult},
    repository::{ShiftStore, WriteGuard},
    roster::ShiftSlot,
};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};

const SLOT_COLUMNS: &str =
    "slot_id, date, role, shift_window, slot_index, employee_id, start_time, end_time, version";

fn slot_from_row(row: &Row<'_>) -> rusqlite::Result<ShiftSlot> {
    Ok(ShiftSlot {
        slot_id:      row.get(0)?,
        date:         date_column(row, 1)?,
        role:         row.get(2)?,
        shift_window: row.get(3)?,
        slot_index:   row.get(4)?,
        employee_id:  row.get(5)?,
        start_time:   row.get(6)?,
        end_time:     row.get(7)?,
        version:      row.get(8)?,
    })
}

impl StaffStore {
    pub fn slot_by_id(&self, slot_id: &str) -> StaffResult<Option<ShiftSlot>> {
        let slot = self
            .conn
            .query_row(
                &format!("SELECT {SLOT_COLUMNS} FROM shift_slot WHERE slot_id = ?1"),
                params![slot_id],
                slot_from_row,
            )
            .optional()?;
        Ok(slot)
    }

    /// Number of slots for a date with an employee set.
    pub fn assigned_slot_count(&self, date: NaiveDate) -> StaffResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM shift_slot WHERE date = ?1 AND employee_id IS NOT NULL",
            params![date_to_sql(date)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Overwrite a slot's times, as a manager editing the schedule would.
    pub fn set_slot_times(&self, slot_id: &str, start_time: &str, end_time: &str) -> StaffResult<()> {
        self.conn.execute(
            "UPDATE shift_slot SET start_time = ?1, end_time = ?2, version = version + 1
             WHERE slot_id = ?3",
            params![start_time, end_time, slot_id],
        )?;
        Ok(())
    }
}

impl ShiftStore for StaffStore {
    fn list(&self, date: NaiveDate) -> StaffResult<Vec<ShiftSlot>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SLOT_COLUMNS} FROM shift_slot WHERE date = ?1
             ORDER BY role ASC, shift_window ASC, slot_index ASC"
        ))?;
        let rows = stmt.query_map(params![date_to_sql(date)], slot_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn upsert(&self, slot: &ShiftSlot, guard: WriteGuard) -> StaffResult<ShiftSlot> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let stored_version: Option<i64> = tx
            .query_row(
                "SELECT version FROM shift_slot WHERE slot_id = ?1",
                params![slot.slot_id],
                |row| row.get(0),
            )
            .optional()?;

        if guard == WriteGuard::OptimisticVersion {
            if matches!(stored_version, Some(v) if v != slot.version) {
                return Err(StaffError::VersionConflict { slot_id: slot.slot_id.clone() });
            }
            if let Some(employee_id) = &slot.employee_id {
                let clashes: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM shift_slot
                     WHERE date = ?1 AND employee_id = ?2 AND slot_id <> ?3",
                    params![date_to_sql(slot.date), employee_id, slot.slot_id],
                    |row| row.get(0),
                )?;
                if clashes > 0 {
                    return Err(StaffError::AlreadyBooked {
                        employee_id: employee_id.clone(),
                        date:        slot.date,
                    });
                }
            }
        }

        let next_version = stored_version.unwrap_or(slot.version) + 1;
        match stored_version {
            Some(_) => {
                tx.execute(
                    "UPDATE shift_slot
                     SET employee_id = ?1, start_time = ?2, end_time = ?3, version = ?4
                     WHERE slot_id = ?5",
                    params![
                        slot.employee_id,
                        slot.start_time,
                        slot.end_time,
                        next_version,
                        slot.slot_id,
                    ],
                )?;
            }
            None => {
                tx.execute(
                    &format!("INSERT INTO shift_slot ({SLOT_COLUMNS})
                              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
                    params![
                        slot.slot_id,
                        date_to_sql(slot.date),
                        slot.role,
                        slot.shift_window,
                        slot.slot_index,
                        slot.employee_id,
                        slot.start_time,
                        slot.end_time,
                        next_version,
                    ],
                )?;
            }
        }
        tx.commit()?;

        Ok(ShiftSlot { version: next_version, ..slot.clone() })
    }

    fn insert_if_absent(&self, slot: &ShiftSlot) -> StaffResult<bool> {
        let inserted = self.conn.execute(
            &format!("INSERT OR IGNORE INTO shift_slot ({SLOT_COLUMNS})
                      VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                slot.slot_id,
                date_to_sql(slot.date),
                slot.role,
                slot.shift_window,
                slot.slot_index,
                slot.employee_id,
                slot.start_time,
                slot.end_time,
                slot.version,
            ],
        )?;
        Ok(inserted > 0)
    }

    fn reset(&self, date: NaiveDate) -> StaffResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM shift_slot WHERE date = ?1",
            params![date_to_sql(date)],
        )?;
        Ok(removed)
    }
}
