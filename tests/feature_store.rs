use std::path::Path;
use std::thread;

use featdb::blob::encode_matrix;
use featdb::{Error, FeatureStore, Keypoint};
use ndarray::{Array2, array};
use rusqlite::{Connection, params};

/// Populate the database the way the extraction pipeline would, through its
/// own connection.
fn write_fixture(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute(
        "INSERT INTO cameras (camera_id, model, width, height, params, prior_focal_length)
         VALUES (1, 0, 640, 480, NULL, 0)",
        [],
    )
    .unwrap();

    for (image_id, name) in [(1u32, "a.jpg"), (2, "b.jpg"), (3, "c.jpg")] {
        conn.execute(
            "INSERT INTO images (image_id, name, camera_id) VALUES (?1, ?2, 1)",
            params![image_id, name],
        )
        .unwrap();
    }

    let keypoints = array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]];
    insert_blob(&conn, "keypoints", 1, &keypoints);
    insert_blob(&conn, "keypoints", 2, &Array2::<f32>::zeros((7, 2)));
    insert_blob(&conn, "keypoints", 3, &array![[1.0f32, 2.0, 3.0]]);

    insert_blob(&conn, "descriptors", 1, &Array2::from_elem((3, 128), 10.0f32));
    insert_blob(&conn, "descriptors", 2, &Array2::from_elem((7, 128), 255.0f32));
}

fn insert_blob(conn: &Connection, table: &str, image_id: u32, matrix: &Array2<f32>) {
    conn.execute(
        &format!("INSERT INTO {table} (image_id, rows, cols, data) VALUES (?1, ?2, ?3, ?4)"),
        params![
            image_id,
            matrix.nrows() as i64,
            matrix.ncols() as i64,
            encode_matrix(matrix)
        ],
    )
    .unwrap();
}

fn populated_db() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.db");
    // Opening once lays down the schema for the writer
    FeatureStore::open(&path).unwrap();
    write_fixture(&path);
    (dir, path)
}

#[test]
fn reads_features_written_by_another_connection() {
    let (_dir, path) = populated_db();
    let store = FeatureStore::open(&path).unwrap();

    assert_eq!(
        store.read_keypoints(1).unwrap(),
        vec![Keypoint::new(1.0, 2.0), Keypoint::new(3.0, 4.0), Keypoint::new(5.0, 6.0)]
    );
    assert_eq!(store.read_keypoints(2).unwrap().len(), 7);
    assert!(store.read_keypoints(3).unwrap().is_empty());

    let des = store.read_descriptors(1).unwrap();
    assert_eq!(des.dim(), (3, 128));
    assert!(des.iter().all(|&v| v == 10));
    assert!(store.read_descriptors(2).unwrap().iter().all(|&v| v == 255));
}

#[test]
fn sample_driver_range() {
    let (_dir, path) = populated_db();
    let store = FeatureStore::open(&path).unwrap();

    let counts: Vec<(usize, (usize, usize))> = (0..20)
        .map(|id| {
            let kps = store.read_keypoints(id).unwrap();
            let des = store.read_descriptors(id).unwrap();
            (kps.len(), (des.ncols(), des.nrows()))
        })
        .collect();

    assert_eq!(counts[0], (0, (0, 0)));
    assert_eq!(counts[1], (3, (128, 3)));
    assert_eq!(counts[2], (7, (128, 7)));
    assert_eq!(counts[3], (0, (0, 0)));
    assert!(counts[4..].iter().all(|c| *c == (0, (0, 0))));
}

#[test]
fn aggregates_match_table_contents() {
    let (_dir, path) = populated_db();
    let store = FeatureStore::open(&path).unwrap();

    assert_eq!(store.num_keypoints().unwrap(), 3 + 7 + 1);
    assert_eq!(store.max_num_keypoints().unwrap(), 7);
    assert_eq!(store.num_descriptors().unwrap(), 10);
    assert_eq!(store.max_num_descriptors().unwrap(), 7);

    let stats = store.stats().unwrap();
    assert_eq!(stats.images, 3);
    assert!(stats.to_string().contains("Images: 3"));
}

#[test]
fn open_close_open_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle.db");

    let mut store = FeatureStore::open(&path).unwrap();
    assert_eq!(store.path(), Some(path.as_path()));
    store.close().unwrap();
    assert!(store.path().is_none());

    store.reopen(&path).unwrap();
    assert!(store.is_open());
    assert_eq!(store.num_keypoints().unwrap(), 0);
    store.close().unwrap();

    let conn = Connection::open(&path).unwrap();
    let tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
             AND name IN ('cameras', 'images', 'keypoints', 'descriptors')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 4);
}

#[test]
fn reopen_switches_files() {
    let (_dir, path) = populated_db();
    let other = tempfile::tempdir().unwrap();

    let mut store = FeatureStore::open(&path).unwrap();
    assert!(store.exists_keypoints(1).unwrap());

    store.reopen(&other.path().join("empty.db")).unwrap();
    assert!(!store.exists_keypoints(1).unwrap());
    assert!(store.read_keypoints(1).unwrap().is_empty());
}

#[test]
fn corrupt_blob_is_reported() {
    let (_dir, path) = populated_db();
    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE descriptors SET rows = 4 WHERE image_id = 1", [])
        .unwrap();

    let store = FeatureStore::open(&path).unwrap();
    match store.read_descriptors(1) {
        Err(Error::CorruptBlob { rows, cols, expected, actual }) => {
            assert_eq!((rows, cols), (4, 128));
            assert_eq!(expected, 4 * 128 * 4);
            assert_eq!(actual, 3 * 128 * 4);
        }
        other => panic!("expected CorruptBlob, got {other:?}"),
    }
}

#[test]
fn concurrent_opens_of_one_file() {
    let (_dir, path) = populated_db();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || {
                let store = FeatureStore::open(&path).unwrap();
                store.read_keypoints(1).unwrap().len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}
