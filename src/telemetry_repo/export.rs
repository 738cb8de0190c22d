// Full-history CSV export, newest first, read in fixed-size pages.
// Only one page of rows is resident at a time; each page becomes one body chunk.

use std::future::Future;

use bytes::Bytes;
use chrono::{DateTime, Local};
use futures_util::stream::{self, Stream};
use sqlx::Sqlite;
use sqlx::pool::PoolConnection;

use super::{parse_reading_row, planner};
use crate::error::QueryError;
use crate::models::ReadingRow;
use crate::sensors::{ID_COLUMN, SensorDescriptor, TIMESTAMP_COLUMN};

pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const EXPORT_EXTENSION: &str = "csv";
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

const CELL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Source of newest-first reading pages. An empty page (or a short one) ends the export.
pub trait PageSource {
    fn next_page(
        &mut self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ReadingRow>, QueryError>> + Send;
}

/// Keyset-paginated reader over one pooled connection (held until the export finishes).
pub struct SqlitePageSource {
    conn: PoolConnection<Sqlite>,
    sensor: &'static SensorDescriptor,
    /// (timestamp ms, id) of the last row handed out.
    cursor: Option<(i64, i64)>,
}

impl SqlitePageSource {
    pub(crate) fn new(conn: PoolConnection<Sqlite>, sensor: &'static SensorDescriptor) -> Self {
        Self {
            conn,
            sensor,
            cursor: None,
        }
    }

    pub fn sensor(&self) -> &'static SensorDescriptor {
        self.sensor
    }
}

impl PageSource for SqlitePageSource {
    async fn next_page(&mut self, limit: u32) -> Result<Vec<ReadingRow>, QueryError> {
        let rows = match self.cursor {
            None => {
                sqlx::query(&planner::export_first_page_sql(self.sensor))
                    .bind(i64::from(limit))
                    .fetch_all(&mut *self.conn)
                    .await?
            }
            Some((ts, id)) => {
                sqlx::query(&planner::export_next_page_sql(self.sensor))
                    .bind(ts)
                    .bind(id)
                    .bind(i64::from(limit))
                    .fetch_all(&mut *self.conn)
                    .await?
            }
        };
        let mut page = Vec::with_capacity(rows.len());
        for row in &rows {
            page.push(parse_reading_row(self.sensor, row)?);
        }
        if let Some(last) = page.last() {
            self.cursor = Some((last.timestamp.timestamp_millis(), last.id));
        }
        Ok(page)
    }
}

/// `{sensor}_history_{yyyymmdd_hhmmss}.csv`
pub fn export_filename(sensor: &SensorDescriptor, now: DateTime<Local>) -> String {
    format!(
        "{}_history_{}.{}",
        sensor.id,
        now.format(FILENAME_TIMESTAMP_FORMAT),
        EXPORT_EXTENSION
    )
}

/// Upper-cased column names, CRLF-terminated.
pub fn header_line(sensor: &SensorDescriptor) -> String {
    let mut line = sensor
        .columns
        .iter()
        .map(|c| c.to_uppercase())
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

/// One CSV record in registry column order. Missing values are empty cells.
/// Cells are numbers or fixed-format timestamps, so no quoting is needed.
pub fn row_line(sensor: &SensorDescriptor, row: &ReadingRow) -> String {
    let mut cells = Vec::with_capacity(sensor.columns.len());
    for col in sensor.columns {
        let cell = match *col {
            TIMESTAMP_COLUMN => row.timestamp.format(CELL_TIMESTAMP_FORMAT).to_string(),
            ID_COLUMN => row.id.to_string(),
            field => row.field(field).map(|v| v.to_string()).unwrap_or_default(),
        };
        cells.push(cell);
    }
    let mut line = cells.join(",");
    line.push_str("\r\n");
    line
}

enum ExportState<P> {
    Header(P),
    Paging(P),
    Done,
}

/// Header chunk, then one chunk per page until the source is exhausted.
/// A source error is yielded once and ends the stream.
pub fn export_stream<P>(
    sensor: &'static SensorDescriptor,
    source: P,
    page_size: u32,
) -> impl Stream<Item = Result<Bytes, QueryError>> + Send
where
    P: PageSource + Send + 'static,
{
    let page_size = page_size.max(1);
    stream::unfold(ExportState::Header(source), move |state| async move {
        match state {
            ExportState::Header(source) => Some((
                Ok(Bytes::from(header_line(sensor))),
                ExportState::Paging(source),
            )),
            ExportState::Paging(mut source) => match source.next_page(page_size).await {
                Ok(rows) if rows.is_empty() => None,
                Ok(rows) => {
                    let mut chunk = String::new();
                    for row in &rows {
                        chunk.push_str(&row_line(sensor, row));
                    }
                    let next = if rows.len() < page_size as usize {
                        ExportState::Done
                    } else {
                        ExportState::Paging(source)
                    };
                    Some((Ok(Bytes::from(chunk)), next))
                }
                Err(e) => Some((Err(e), ExportState::Done)),
            },
            ExportState::Done => None,
        }
    })
}
