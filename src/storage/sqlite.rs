//! SQLite storage implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use ndarray::Array2;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Params};
use serde::Serialize;
use crate::blob::{self, BlobRow};
use crate::types::{CameraId, Image, ImageId, Keypoint};
use crate::{Error, Result};
use super::schema;

/// Serializes schema setup across every handle in the process.
///
/// Setup runs on each open, so several handles opening the same file at once
/// would otherwise race for the write lock and fail with "database is locked".
/// Created at first use and never torn down.
static SCHEMA_LOCK: Mutex<()> = Mutex::new(());

/// Read-only handle over a feature database.
///
/// The handle owns one connection and its prepared statements. Statements
/// carry cursor state, so a handle is `Send` but not `Sync`: share it across
/// threads only behind a lock, or open one handle per thread.
pub struct FeatureStore {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl FeatureStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = Self::closed();
        store.reopen(path)?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup(&conn)?;
        Ok(Self {
            conn: Some(conn),
            path: None,
        })
    }

    /// A handle with no connection; every query returns [`Error::Closed`]
    pub fn closed() -> Self {
        Self {
            conn: None,
            path: None,
        }
    }

    /// Open `path`, closing the current connection first if there is one
    pub fn reopen(&mut self, path: &Path) -> Result<()> {
        self.close()?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(path, flags)?;
        Self::setup(&conn)?;

        tracing::debug!("Opened feature database {}", path.display());
        self.conn = Some(conn);
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Release the prepared statements, then the connection.
    ///
    /// Calling this on a closed handle does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        let path = self.path.take();

        conn.flush_prepared_statement_cache();
        conn.close().map_err(|(_, err)| Error::Storage(err))?;

        if let Some(path) = path {
            tracing::debug!("Closed feature database {}", path.display());
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Path of the open database file, `None` when closed or in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }

    fn setup(conn: &Connection) -> Result<()> {
        {
            let _guard = SCHEMA_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            Self::configure(conn)?;
            Self::initialize_schema(conn)?;
        }
        Self::prepare_statements(conn)
    }

    /// Apply the connection pragmas
    fn configure(conn: &Connection) -> Result<()> {
        // Don't wait for the OS to flush writes to disk
        conn.pragma_update(None, "synchronous", "OFF")?;

        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!("journal_mode={}", mode);

        conn.pragma_update(None, "temp_store", "MEMORY")?;

        // Disabled by default
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Initialize the database schema
    fn initialize_schema(conn: &Connection) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Compile every query into the connection's statement cache
    fn prepare_statements(conn: &Connection) -> Result<()> {
        conn.set_prepared_statement_cache_capacity(schema::ALL_QUERIES.len());
        for sql in schema::ALL_QUERIES {
            conn.prepare_cached(sql)?;
        }
        Ok(())
    }

    // ========== Feature Operations ==========

    /// Read the keypoints of an image.
    ///
    /// Returns an empty list when the image has no keypoints row, or when the
    /// stored matrix does not have exactly two columns.
    pub fn read_keypoints(&self, image_id: ImageId) -> Result<Vec<Keypoint>> {
        let matrix = self.read_keypoint_matrix(image_id)?;
        match blob::keypoints_from_matrix(&matrix) {
            Ok(keypoints) => Ok(keypoints),
            Err(Error::ShapeMismatch { expected, actual }) => {
                tracing::warn!(
                    "Keypoints of image {} have {} columns, expected {}",
                    image_id,
                    actual,
                    expected
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Read the raw keypoint matrix of an image (0x0 if absent)
    pub fn read_keypoint_matrix(&self, image_id: ImageId) -> Result<Array2<f32>> {
        blob::decode_optional(self.read_blob(schema::READ_KEYPOINTS, image_id)?)
    }

    /// Read the descriptors of an image as an 8-bit matrix (0x0 if absent)
    pub fn read_descriptors(&self, image_id: ImageId) -> Result<Array2<u8>> {
        let matrix = blob::decode_optional(self.read_blob(schema::READ_DESCRIPTORS, image_id)?)?;
        Ok(blob::descriptors_from_matrix(&matrix))
    }

    fn read_blob(&self, sql: &str, image_id: ImageId) -> Result<Option<BlobRow>> {
        let mut stmt = self.conn()?.prepare_cached(sql)?;
        stmt.query_row([image_id], |row| {
            Ok(BlobRow {
                rows: row.get(0)?,
                cols: row.get(1)?,
                data: row.get::<_, Option<Vec<u8>>>(2)?.unwrap_or_default(),
            })
        })
        .optional()
        .map_err(Into::into)
    }

    // ========== Aggregates ==========

    /// Sum of `rows` in `keypoints`, i.e. the total number of keypoints
    pub fn num_keypoints(&self) -> Result<u64> {
        self.query_u64(schema::SUM_KEYPOINTS, [])
    }

    /// The number of keypoints of the image with most features
    pub fn max_num_keypoints(&self) -> Result<u64> {
        self.query_u64(schema::MAX_KEYPOINTS, [])
    }

    /// Sum of `rows` in `descriptors`
    pub fn num_descriptors(&self) -> Result<u64> {
        self.query_u64(schema::SUM_DESCRIPTORS, [])
    }

    /// The number of descriptors of the image with most features
    pub fn max_num_descriptors(&self) -> Result<u64> {
        self.query_u64(schema::MAX_DESCRIPTORS, [])
    }

    pub fn num_keypoints_for_image(&self, image_id: ImageId) -> Result<u64> {
        self.query_u64(schema::NUM_KEYPOINTS_FOR_IMAGE, [image_id])
    }

    pub fn num_descriptors_for_image(&self, image_id: ImageId) -> Result<u64> {
        self.query_u64(schema::NUM_DESCRIPTORS_FOR_IMAGE, [image_id])
    }

    /// Count all images
    pub fn num_images(&self) -> Result<u64> {
        self.query_u64(schema::COUNT_IMAGES, [])
    }

    /// Run a single-value integer query; no row counts as 0
    fn query_u64<P: Params>(&self, sql: &str, params: P) -> Result<u64> {
        let mut stmt = self.conn()?.prepare_cached(sql)?;
        let value: Option<i64> = stmt.query_row(params, |row| row.get(0)).optional()?;
        Ok(value.unwrap_or(0).max(0) as u64)
    }

    // ========== Existence Checks ==========

    pub fn exists_camera(&self, camera_id: CameraId) -> Result<bool> {
        self.exists(schema::EXISTS_CAMERA, [camera_id])
    }

    pub fn exists_image_id(&self, image_id: ImageId) -> Result<bool> {
        self.exists(schema::EXISTS_IMAGE_ID, [image_id])
    }

    pub fn exists_image_name(&self, name: &str) -> Result<bool> {
        self.exists(schema::EXISTS_IMAGE_NAME, [name])
    }

    pub fn exists_keypoints(&self, image_id: ImageId) -> Result<bool> {
        self.exists(schema::EXISTS_KEYPOINTS, [image_id])
    }

    pub fn exists_descriptors(&self, image_id: ImageId) -> Result<bool> {
        self.exists(schema::EXISTS_DESCRIPTORS, [image_id])
    }

    fn exists<P: Params>(&self, sql: &str, params: P) -> Result<bool> {
        let mut stmt = self.conn()?.prepare_cached(sql)?;
        Ok(stmt.exists(params)?)
    }

    // ========== Images ==========

    /// Read every image record, ordered by id
    pub fn read_images(&self) -> Result<Vec<Image>> {
        let mut stmt = self.conn()?.prepare_cached(schema::READ_IMAGES)?;
        let images = stmt
            .query_map([], |row| {
                Ok(Image {
                    image_id: row.get(0)?,
                    name: row.get(1)?,
                    camera_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(images)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<FeatureStats> {
        Ok(FeatureStats {
            images: self.num_images()?,
            keypoints: self.num_keypoints()?,
            max_keypoints: self.max_num_keypoints()?,
            descriptors: self.num_descriptors()?,
            max_descriptors: self.max_num_descriptors()?,
        })
    }
}

impl Drop for FeatureStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close feature database: {}", e);
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureStats {
    pub images: u64,
    pub keypoints: u64,
    pub max_keypoints: u64,
    pub descriptors: u64,
    pub max_descriptors: u64,
}

impl std::fmt::Display for FeatureStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Images: {}", self.images)?;
        writeln!(f, "  Keypoints: {} (max per image: {})", self.keypoints, self.max_keypoints)?;
        writeln!(f, "  Descriptors: {} (max per image: {})", self.descriptors, self.max_descriptors)
    }
}
