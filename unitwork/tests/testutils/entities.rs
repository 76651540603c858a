//! Entities used by the repository tests

use serde::{Deserialize, Serialize};
use unitwork::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestEntity {
    pub id: u32,
    pub name: String,
}

impl TestEntity {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

impl Entity for TestEntity {
    const COLLECTION: &'static str = "test_entity";

    fn key(&self) -> Vec<u8> {
        self.id.to_be_bytes().to_vec()
    }
}

pub fn key(id: u32) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}
