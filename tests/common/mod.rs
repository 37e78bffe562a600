#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const DATASET_ID: &str = "DEMO_1.0";

pub const ID_SCHEMA: &str = r#"{"tables": [
    {"name": "T", "columns": [
        {"name": "id", "pattern": "^[0-9]{3}$"},
        {"name": "name"}
    ]}
]}"#;

/// Scratch tree laid out like `derived/<id>/SCHEMA.json` plus `datasets/<id>/*.csv`.
pub struct DatasetWorkspace {
    temp_dir: TempDir,
}

impl DatasetWorkspace {
    /// Creates empty `derived/<id>` and `datasets/<id>` directories.
    pub fn new() -> Self {
        let workspace = Self {
            temp_dir: tempdir().expect("temp dir"),
        };
        fs::create_dir_all(workspace.schema_dir()).expect("create schema dir");
        fs::create_dir_all(workspace.dataset_dir()).expect("create dataset dir");
        workspace
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.root().join("derived").join(DATASET_ID)
    }

    pub fn dataset_dir(&self) -> PathBuf {
        self.root().join("datasets").join(DATASET_ID)
    }

    pub fn schema_path(&self) -> PathBuf {
        self.schema_dir().join("SCHEMA.json")
    }

    pub fn write_schema(&self, contents: &str) -> PathBuf {
        let path = self.schema_path();
        fs::write(&path, contents).expect("write schema");
        path
    }

    /// Writes `<table>.csv` into the dataset directory.
    pub fn write_table(&self, table: &str, contents: &str) -> PathBuf {
        let path = self.dataset_dir().join(format!("{table}.csv"));
        fs::write(&path, contents).expect("write table");
        path
    }
}
