//! Database schema definitions
//!
//! Every statement is `IF NOT EXISTS` so setup can run on each open against a
//! database the pipeline has already populated.

/// SQL to create the cameras table
pub const CREATE_CAMERAS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS cameras (
    camera_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    model INTEGER NOT NULL,
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    params BLOB,
    prior_focal_length INTEGER NOT NULL
)
"#;

/// SQL to create the images table
pub const CREATE_IMAGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    image_id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name TEXT NOT NULL UNIQUE,
    camera_id INTEGER NOT NULL,
    CONSTRAINT image_id_check CHECK(image_id >= 0 AND image_id < 2147483647),
    FOREIGN KEY(camera_id) REFERENCES cameras(camera_id)
)
"#;

/// SQL to create the keypoints table
pub const CREATE_KEYPOINTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS keypoints (
    image_id INTEGER PRIMARY KEY NOT NULL,
    rows INTEGER NOT NULL,
    cols INTEGER NOT NULL,
    data BLOB,
    FOREIGN KEY(image_id) REFERENCES images(image_id) ON DELETE CASCADE
)
"#;

/// SQL to create the descriptors table
pub const CREATE_DESCRIPTORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS descriptors (
    image_id INTEGER PRIMARY KEY NOT NULL,
    rows INTEGER NOT NULL,
    cols INTEGER NOT NULL,
    data BLOB,
    FOREIGN KEY(image_id) REFERENCES images(image_id) ON DELETE CASCADE
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS index_name ON images(name)",
];

/// All schema creation statements, parents before children
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_CAMERAS_TABLE,
        CREATE_IMAGES_TABLE,
        CREATE_KEYPOINTS_TABLE,
        CREATE_DESCRIPTORS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

// ========== Queries ==========

pub const NUM_KEYPOINTS_FOR_IMAGE: &str = "SELECT rows FROM keypoints WHERE image_id = ?1";
pub const NUM_DESCRIPTORS_FOR_IMAGE: &str = "SELECT rows FROM descriptors WHERE image_id = ?1";

pub const SUM_KEYPOINTS: &str = "SELECT COALESCE(SUM(rows), 0) FROM keypoints";
pub const MAX_KEYPOINTS: &str = "SELECT COALESCE(MAX(rows), 0) FROM keypoints";
pub const SUM_DESCRIPTORS: &str = "SELECT COALESCE(SUM(rows), 0) FROM descriptors";
pub const MAX_DESCRIPTORS: &str = "SELECT COALESCE(MAX(rows), 0) FROM descriptors";
pub const COUNT_IMAGES: &str = "SELECT COUNT(*) FROM images";

pub const EXISTS_CAMERA: &str = "SELECT 1 FROM cameras WHERE camera_id = ?1";
pub const EXISTS_IMAGE_ID: &str = "SELECT 1 FROM images WHERE image_id = ?1";
pub const EXISTS_IMAGE_NAME: &str = "SELECT 1 FROM images WHERE name = ?1";
pub const EXISTS_KEYPOINTS: &str = "SELECT 1 FROM keypoints WHERE image_id = ?1";
pub const EXISTS_DESCRIPTORS: &str = "SELECT 1 FROM descriptors WHERE image_id = ?1";

pub const READ_IMAGES: &str = "SELECT image_id, name, camera_id FROM images ORDER BY image_id";
pub const READ_KEYPOINTS: &str = "SELECT rows, cols, data FROM keypoints WHERE image_id = ?1";
pub const READ_DESCRIPTORS: &str = "SELECT rows, cols, data FROM descriptors WHERE image_id = ?1";

/// Every query the store prepares when a connection is opened
pub const ALL_QUERIES: &[&str] = &[
    NUM_KEYPOINTS_FOR_IMAGE,
    NUM_DESCRIPTORS_FOR_IMAGE,
    SUM_KEYPOINTS,
    MAX_KEYPOINTS,
    SUM_DESCRIPTORS,
    MAX_DESCRIPTORS,
    COUNT_IMAGES,
    EXISTS_CAMERA,
    EXISTS_IMAGE_ID,
    EXISTS_IMAGE_NAME,
    EXISTS_KEYPOINTS,
    EXISTS_DESCRIPTORS,
    READ_IMAGES,
    READ_KEYPOINTS,
    READ_DESCRIPTORS,
];
