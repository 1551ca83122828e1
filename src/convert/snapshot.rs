//! Frozen debugger state loaded from JSON
//!
//! A snapshot answers expression queries from a table and memory reads from
//! base64-encoded blocks, which lets the whole decode pipeline run without a
//! live debuggee.
//!
//! ```json
//! {
//!   "dialect": "cpp",
//!   "hex_display": false,
//!   "expressions": { "p": { "type": "P", "value": "{x=1 y=2}",
//!                           "address": 4096, "size": 16 },
//!                    "(p).x": { "type": "double", "value": "1", "address": 4096, "size": 8 } },
//!   "memory": [ { "address": 4096, "bytes": "AAAAAAAA8D8AAAAAAAAAQA==" } ]
//! }
//! ```

use super::debugger::{Debugger, Expression};
use super::memory::MemoryReader;
use super::primitive::Dialect;
use anyhow::Context;
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    dialect: Dialect,
    #[serde(default)]
    hex_display: bool,
    #[serde(default)]
    expressions: HashMap<String, RawExpression>,
    #[serde(default)]
    memory: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
struct RawExpression {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    address: Option<u64>,
    #[serde(default)]
    size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    address: u64,
    bytes: String,
}

/// Contiguous bytes of debuggee memory
#[derive(Debug, Clone)]
struct Block {
    address: u64,
    bytes: Vec<u8>,
}

/// Debugger and memory collaborator backed by recorded data
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    dialect: Dialect,
    hex_display: bool,
    expressions: HashMap<String, Expression>,
    blocks: Vec<Block>,
}

/// Expressions are matched ignoring whitespace
fn expression_key(expr: &str) -> String {
    expr.chars().filter(|c| !c.is_whitespace()).collect()
}

impl Snapshot {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw: RawSnapshot = serde_json::from_str(json).context("malformed snapshot JSON")?;
        let mut snapshot = Snapshot::new(raw.dialect);
        snapshot.hex_display = raw.hex_display;
        for (expr, e) in raw.expressions {
            match (e.address, e.size) {
                (Some(address), Some(size)) => snapshot.insert_value(&expr, &e.type_name, &e.value, address, size),
                (address, size) => {
                    snapshot.insert_expression(&expr, &e.value, &e.type_name);
                    if let Some(address) = address {
                        let pointer = format!("0x{:016x}", address);
                        snapshot.insert_expression(&format!("&({})", expr), &pointer, &format!("{} *", e.type_name));
                    }
                    if let Some(size) = size {
                        snapshot.insert_expression(&format!("sizeof({})", e.type_name), &size.to_string(), "unsigned int");
                    }
                }
            }
        }
        for block in raw.memory {
            let bytes = general_purpose::STANDARD
                .decode(block.bytes.as_bytes())
                .with_context(|| format!("invalid base64 in block at 0x{:x}", block.address))?;
            snapshot.insert_memory(block.address, bytes);
        }
        Ok(snapshot)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read snapshot {}", path.as_ref().display()))?;
        Self::from_json(&text)
    }

    pub fn set_hex_display(&mut self, hex_display: bool) {
        self.hex_display = hex_display;
    }

    pub fn insert_expression(&mut self, expr: &str, value: &str, type_name: &str) {
        self.expressions
            .insert(expression_key(expr), Expression::valid(value, type_name));
    }

    pub fn insert_memory(&mut self, address: u64, bytes: Vec<u8>) {
        self.blocks.push(Block { address, bytes });
    }

    /// Record a variable together with its address and its type's size
    pub fn insert_variable(&mut self, expr: &str, type_name: &str, address: u64, size: usize) {
        self.insert_expression(expr, "{...}", type_name);
        self.insert_expression(&format!("&({})", expr), &format!("0x{:016x}", address), &format!("{} *", type_name));
        self.insert_expression(&format!("sizeof({})", type_name), &size.to_string(), "unsigned int");
    }

    /// Record a primitive value with its address and size
    pub fn insert_value(&mut self, expr: &str, type_name: &str, value: &str, address: u64, size: usize) {
        self.insert_variable(expr, type_name, address, size);
        self.insert_expression(expr, value, type_name);
    }
}

impl Debugger for Snapshot {
    fn evaluate(&self, expr: &str) -> Expression {
        self.expressions
            .get(&expression_key(expr))
            .cloned()
            .unwrap_or_default()
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn hex_display(&self) -> bool {
        self.hex_display
    }
}

impl MemoryReader for Snapshot {
    fn read_bytes(&self, address: u64, len: usize) -> Option<Vec<u8>> {
        let block = self.blocks.iter().find(|b| {
            address >= b.address && address - b.address < b.bytes.len() as u64
        })?;
        let start = (address - block.address) as usize;
        let end = start.saturating_add(len).min(block.bytes.len());
        Some(block.bytes[start..end].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "dialect": "csharp",
            "hex_display": true,
            "expressions": { "v": { "type": "double", "value": "1.5" } },
            "memory": [ { "address": 16, "bytes": "AQIDBA==" } ]
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.dialect(), Dialect::CSharp);
        assert!(snapshot.hex_display());
        assert_eq!(snapshot.evaluate(" v ").type_name, "double");
        assert!(!snapshot.evaluate("w").is_valid);
        assert_eq!(snapshot.read_bytes(17, 2), Some(vec![2, 3]));
        assert_eq!(snapshot.read_bytes(18, 8), Some(vec![3, 4]));
        assert_eq!(snapshot.read_bytes(20, 1), None);
    }

    #[test]
    fn test_insert_variable_answers_queries() {
        let mut snapshot = Snapshot::new(Dialect::Cpp);
        snapshot.insert_variable("pt", "Point2", 0x2000, 16);
        assert_eq!(snapshot.address_of("pt"), Some(0x2000));
        assert_eq!(snapshot.size_of("Point2"), Some(16));
    }

    #[test]
    fn test_json_address_and_size() {
        let json = r#"{
            "expressions": {
                "p": { "type": "P", "value": "{...}", "address": 4096, "size": 16 },
                "q": { "type": "P *", "value": "0x1000", "address": 8192 }
            }
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert_eq!(snapshot.address_of("p"), Some(0x1000));
        assert_eq!(snapshot.size_of("P"), Some(16));
        assert_eq!(snapshot.evaluate("p").value, "{...}");
        assert_eq!(snapshot.address_of("q"), Some(0x2000));
        assert_eq!(snapshot.evaluate("q").value, "0x1000");
    }

    #[test]
    fn test_bad_base64_is_an_error() {
        let json = r#"{ "memory": [ { "address": 0, "bytes": "!!" } ] }"#;
        assert!(Snapshot::from_json(json).is_err());
    }
}
