//! Employee directory.

use super::StaffStore;
use crate::{
    error::StaffResult,
    repository::EmployeeDirectory,
    roster::Employee,
};
use rusqlite::params;

impl StaffStore {
    pub fn insert_employee(&self, e: &Employee) -> StaffResult<()> {
        self.conn.execute(
            "INSERT INTO employee (employee_id, name, role, hourly_rate, active)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![e.employee_id, e.name, e.role, e.hourly_rate, e.active as i32],
        )?;
        Ok(())
    }

    /// Returns false when no such employee exists.
    pub fn set_employee_active(&self, employee_id: &str, active: bool) -> StaffResult<bool> {
        let changed = self.conn.execute(
            "UPDATE employee SET active = ?1 WHERE employee_id = ?2",
            params![active as i32, employee_id],
        )?;
        Ok(changed > 0)
    }

    pub fn employee_count(&self) -> StaffResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM employee WHERE active = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl EmployeeDirectory for StaffStore {
    fn list_active(&self) -> StaffResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, name, role, hourly_rate, active
             FROM employee WHERE active = 1
             ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Employee {
                employee_id: row.get(0)?,
                name:        row.get(1)?,
                role:        row.get(2)?,
                hourly_rate: row.get(3)?,
                active:      row.get::<_, i32>(4)? != 0,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
