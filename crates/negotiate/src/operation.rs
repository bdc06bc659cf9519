use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical backend operation whose concrete route and payload are discovered at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Health,
    CreateCollection,
    Insert,
    Search,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Health,
        Operation::CreateCollection,
        Operation::Insert,
        Operation::Search,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Health => "health",
            Operation::CreateCollection => "create_collection",
            Operation::Insert => "insert",
            Operation::Search => "search",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_serializes_as_snake_case() {
        let json = serde_json::to_string(&Operation::CreateCollection).unwrap();
        assert_eq!(json, "\"create_collection\"");
        assert_eq!(Operation::Search.to_string(), "search");
    }
}
