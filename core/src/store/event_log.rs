use super::{date_column, date_to_sql, StaffStore};
use crate::{error::StaffResult, event::EventLogEntry, repository::EventSink};
use chrono::NaiveDate;
use rusqlite::params;

impl StaffStore {
    pub fn events_for_date(&self, date: NaiveDate) -> StaffResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, event_type, payload
             FROM event_log WHERE date = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![date_to_sql(date)], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    date:       date_column(row, 1)?,
                    event_type: row.get(2)?,
                    payload:    row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Number of events of one type across all dates (for tests).
    pub fn event_count(&self, event_type: &str) -> StaffResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE event_type = ?1",
            params![event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl EventSink for StaffStore {
    fn append_event(&self, entry: &EventLogEntry) -> StaffResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (date, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                date_to_sql(entry.date),
                entry.event_type,
                entry.payload,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
