//! Common test utilities for find tests
//!
//! Provides a memory port seeded with deterministic person documents:
//! - `_id`: "person-0000" .. "person-0249"
//! - `name`: one of eight first names followed by the index
//! - `age`: 18 + index % 50
//! - `active`: even indexes
//! - `shifts`: [index % 5, (index + 1) % 5]
//! - `notes`: only on every tenth person

#![allow(dead_code)]

use couchfind::{FindLimits, MemoryPort};
use serde::Deserialize;
use serde_json::{json, Value};

pub const PEOPLE: &str = "people";
pub const PERSON_COUNT: usize = 250;
pub const PAGE_SIZE: usize = 25;

const FIRST_NAMES: [&str; 8] = [
    "Alice", "Bruno", "Chloe", "Dmitri", "Elena", "Farid", "Greta", "Hugo",
];

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Person {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub age: u32,
    pub active: bool,
    pub shifts: Vec<u32>,
    pub last_active: String,
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn person(i: usize) -> Value {
    let mut doc = json!({
        "_id": format!("person-{:04}", i),
        "name": format!("{} {}", FIRST_NAMES[i % FIRST_NAMES.len()], i),
        "age": 18 + i % 50,
        "active": i % 2 == 0,
        "shifts": [i % 5, (i + 1) % 5],
        "last_active": format!("2024-01-{:02}T09:00:00Z", i % 28 + 1),
    });
    if i % 10 == 0 {
        doc["notes"] = json!(format!("reviewed in batch {}", i / 10));
    }
    doc
}

pub fn create_seeded_port() -> MemoryPort {
    create_seeded_port_with(FindLimits::new(PAGE_SIZE, 10_000))
}

pub fn create_seeded_port_with(limits: FindLimits) -> MemoryPort {
    let port = MemoryPort::new(limits);
    port.add_documents(PEOPLE, (0..PERSON_COUNT).map(person).collect());
    port
}

/// Ids of the rows, in result order.
pub fn ids(result: &couchfind::ResultSet) -> Vec<String> {
    result
        .iter()
        .filter_map(|row| row.id().map(str::to_string))
        .collect()
}
