//! Record maintenance commands
//!
//! `seed`, `list` and `delete` operate directly on the sled database, for
//! preparing fixtures and inspecting a store without running the server.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use commentd_protocol::{Comment, CommentRepository};
use commentd_storage::SledCommentStore;
use serde_json::Value;
use tracing::debug;

/// Read a JSON array of objects and turn each into a [`Comment`]
pub fn load_seed_file<P: AsRef<Path>>(path: P) -> Result<Vec<Comment>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;

    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Seed file is not valid JSON: {}", path.display()))?;

    let Value::Array(items) = value else {
        anyhow::bail!("Seed file must contain a JSON array: {}", path.display());
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            Comment::from_value(item).with_context(|| format!("Invalid comment at index {}", index))
        })
        .collect()
}

/// Execute the seed command
pub fn execute_seed_command(db_path: &str, file: &str) -> Result<()> {
    println!("🌱 Seeding comments from {}", file);

    let comments = load_seed_file(file)?;
    let store = open_store(db_path)?;

    for comment in &comments {
        store
            .insert_with_id(comment)
            .with_context(|| format!("Failed to store comment {}", comment.id))?;
        println!("   + {}", comment.id);
    }

    println!("✅ Seeded {} comments ({} total)", comments.len(), store.len());
    Ok(())
}

/// Execute the list command
pub async fn execute_list_command(db_path: &str) -> Result<()> {
    let store = open_store(db_path)?;
    let comments = store.find_all().await?;

    debug!("Listing {} comments from {}", comments.len(), db_path);
    println!("{}", serde_json::to_string_pretty(&comments)?);
    Ok(())
}

/// Execute the delete command
pub async fn execute_delete_command(db_path: &str, id: &str) -> Result<()> {
    let store = open_store(db_path)?;

    match store.find_by_id_and_delete(id).await? {
        Some(_) => println!("🗑️  Comment deleted: {}", id),
        None => println!("⚠️  No comment with id {}", id),
    }

    Ok(())
}

fn open_store(db_path: &str) -> Result<SledCommentStore> {
    SledCommentStore::open(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path))
}
