//! Forecast and realised-sales history.

use super::{date_column, date_to_sql, StaffStore};
use crate::{
    error::StaffResult,
    repository::ForecastStore,
    roster::{ForecastDay, SalesHistoryPoint},
};
use chrono::NaiveDate;
use rusqlite::params;

impl StaffStore {
    /// Insert or replace the forecast for a day.
    pub fn save_forecast(&self, f: &ForecastDay) -> StaffResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO forecast_day (date, projected_guests, projected_sales)
             VALUES (?1, ?2, ?3)",
            params![date_to_sql(f.date), f.projected_guests, f.projected_sales],
        )?;
        Ok(())
    }

    pub fn save_sales_history(&self, p: &SalesHistoryPoint) -> StaffResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sales_history (date, actual_sales, forecast_sales)
             VALUES (?1, ?2, ?3)",
            params![date_to_sql(p.date), p.actual_sales, p.forecast_sales],
        )?;
        Ok(())
    }
}

impl ForecastStore for StaffStore {
    fn fetch(&self, start: NaiveDate, end: NaiveDate) -> StaffResult<Vec<ForecastDay>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, projected_guests, projected_sales
             FROM forecast_day WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(params![date_to_sql(start), date_to_sql(end)], |row| {
            Ok(ForecastDay {
                date:             date_column(row, 0)?,
                projected_guests: row.get(1)?,
                projected_sales:  row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    fn sales_history(
        &self,
        start: NaiveDate,
        end:   NaiveDate,
    ) -> StaffResult<Vec<SalesHistoryPoint>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, actual_sales, forecast_sales
             FROM sales_history WHERE date >= ?1 AND date <= ?2
             ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(params![date_to_sql(start), date_to_sql(end)], |row| {
            Ok(SalesHistoryPoint {
                date:           date_column(row, 0)?,
                actual_sales:   row.get(1)?,
                forecast_sales: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
