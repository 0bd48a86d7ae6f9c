//! CSV decoding of an uploaded relationship table.

use std::collections::BTreeMap;
use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{RelgraphError, Result};
use crate::graph::{Entity, EntityKind, Relationship};

use super::entity_kind::resolve_entity_kind;

/// Columns every uploaded table must carry
pub const REQUIRED_COLUMNS: [&str; 4] = [
    "entity_from",
    "relationship_type",
    "relationship_sub_type",
    "entity_to",
];

const TYPE_FROM_COLUMN: &str = "entity_type_from";
const TYPE_TO_COLUMN: &str = "entity_type_to";

/// Rows of one CSV decoded into entities and relationships
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    /// Sorted by name; each name appears once
    pub entities: Vec<Entity>,
    /// In file order; identical tuples are not collapsed yet
    pub relationships: Vec<Relationship>,
    pub skipped_rows: usize,
}

struct ColumnIndex {
    from: usize,
    relationship_type: usize,
    sub_type: usize,
    to: usize,
    type_from: Option<usize>,
    type_to: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| position(c).is_none())
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RelgraphError::MissingColumns(missing));
        }

        // Explicit kinds are only honoured when both columns are present.
        let (type_from, type_to) = match (position(TYPE_FROM_COLUMN), position(TYPE_TO_COLUMN)) {
            (Some(f), Some(t)) => (Some(f), Some(t)),
            _ => (None, None),
        };

        Ok(Self {
            from: position("entity_from").unwrap_or_default(),
            relationship_type: position("relationship_type").unwrap_or_default(),
            sub_type: position("relationship_sub_type").unwrap_or_default(),
            to: position("entity_to").unwrap_or_default(),
            type_from,
            type_to,
        })
    }
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// Decode a relationship table.
///
/// Cells are trimmed. A row with an empty `entity_from` or `entity_to` is
/// skipped and counted, never an error. Malformed CSV or non-UTF-8 input
/// fails the whole table.
pub fn parse_relationship_csv<R: Read>(reader: R) -> Result<ParsedTable> {
    let mut csv_reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut kinds: BTreeMap<String, EntityKind> = BTreeMap::new();
    let mut relationships = Vec::new();
    let mut skipped_rows = 0;

    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let source = cell(&record, columns.from);
        let target = cell(&record, columns.to);

        if source.is_empty() || target.is_empty() {
            // +2: header line plus 1-based numbering
            log::warn!("Skipping CSV line {}: empty entity_from or entity_to", row + 2);
            skipped_rows += 1;
            continue;
        }

        let explicit_from = columns.type_from.map(|i| cell(&record, i));
        let explicit_to = columns.type_to.map(|i| cell(&record, i));
        kinds.insert(source.to_string(), resolve_entity_kind(source, explicit_from));
        kinds.insert(target.to_string(), resolve_entity_kind(target, explicit_to));

        relationships.push(Relationship {
            source: source.to_string(),
            target: target.to_string(),
            relationship_type: cell(&record, columns.relationship_type).to_string(),
            relationship_sub_type: cell(&record, columns.sub_type).to_string(),
        });
    }

    log::debug!(
        "Parsed {} relationships over {} entities ({} rows skipped)",
        relationships.len(),
        kinds.len(),
        skipped_rows
    );

    Ok(ParsedTable {
        entities: kinds
            .into_iter()
            .map(|(name, kind)| Entity { name, kind })
            .collect(),
        relationships,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "entity_from,relationship_type,relationship_sub_type,entity_to\n";

    fn parse(body: &str) -> Result<ParsedTable> {
        parse_relationship_csv(body.as_bytes())
    }

    #[test]
    fn test_parses_worked_example() {
        let csv = format!(
            "{}Alice,employee,staff,Acme\nAcme,employee,staff,Bob\nBob,employee,staff,Acme\n",
            HEADER
        );
        let table = parse(&csv).unwrap();

        assert_eq!(table.relationships.len(), 3);
        let names: Vec<&str> = table.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Acme", "Alice", "Bob"]);
        assert_eq!(table.relationships[0].relationship_sub_type, "staff");
        assert_eq!(table.skipped_rows, 0);
    }

    #[test]
    fn test_missing_columns_are_reported() {
        let err = parse("entity_from,relationship_type\nA,owns\n").unwrap_err();
        match err {
            RelgraphError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["relationship_sub_type", "entity_to"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_cells_are_trimmed() {
        let csv = format!("{}  Mr. Smith  , director ,, Acme Inc \n", HEADER);
        let table = parse(&csv).unwrap();
        let rel = &table.relationships[0];
        assert_eq!(rel.source, "Mr. Smith");
        assert_eq!(rel.target, "Acme Inc");
        assert_eq!(rel.relationship_type, "director");
        assert_eq!(rel.relationship_sub_type, "");
        assert_eq!(table.entities[1].kind, EntityKind::Person);
    }

    #[test]
    fn test_rows_with_empty_endpoint_are_skipped() {
        let csv = format!("{},owns,,Acme\nAlice,owns,,\nAlice,owns,,Acme\n", HEADER);
        let table = parse(&csv).unwrap();
        assert_eq!(table.relationships.len(), 1);
        assert_eq!(table.skipped_rows, 2);
    }

    #[test]
    fn test_short_rows_read_as_empty_cells() {
        let csv = format!("{}Alice,owns\n", HEADER);
        let table = parse(&csv).unwrap();
        assert!(table.relationships.is_empty());
        assert_eq!(table.skipped_rows, 1);
    }

    #[test]
    fn test_explicit_kind_columns() {
        let csv = "entity_from,relationship_type,relationship_sub_type,entity_to,entity_type_from,entity_type_to\n\
                   Acme Inc,owns,,Globex,person,company\n";
        let table = parse(csv).unwrap();
        let acme = table.entities.iter().find(|e| e.name == "Acme Inc").unwrap();
        assert_eq!(acme.kind, EntityKind::Person);
    }

    #[test]
    fn test_single_kind_column_falls_back_to_detection() {
        let csv = "entity_from,relationship_type,relationship_sub_type,entity_to,entity_type_from\n\
                   Mr. Smith,owns,,Globex,company\n";
        let table = parse(csv).unwrap();
        let smith = table.entities.iter().find(|e| e.name == "Mr. Smith").unwrap();
        assert_eq!(smith.kind, EntityKind::Person);
    }

    #[test]
    fn test_later_rows_overwrite_kind() {
        let csv = "entity_from,relationship_type,relationship_sub_type,entity_to,entity_type_from,entity_type_to\n\
                   Alice,owns,,Acme,person,company\n\
                   Acme,owns,,Alice,company,company\n";
        let table = parse(csv).unwrap();
        let alice = table.entities.iter().find(|e| e.name == "Alice").unwrap();
        assert_eq!(alice.kind, EntityKind::Company);
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"A\xff,owns,,B\n");
        let err = parse_relationship_csv(bytes.as_slice()).unwrap_err();
        assert!(matches!(err, RelgraphError::Csv(_)));
    }

    #[test]
    fn test_header_only_is_empty() {
        let table = parse(HEADER).unwrap();
        assert!(table.entities.is_empty());
        assert!(table.relationships.is_empty());
    }
}
