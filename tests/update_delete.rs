use minisql::ast::Value;
use minisql::compile;
use minisql::database::DatabaseEngine;
use minisql::error::Error;
use minisql::planner::Opcode;
use tempfile::TempDir;

fn open_engine(dir: &TempDir) -> DatabaseEngine {
    let mut engine = DatabaseEngine::open(dir.path().join("test.db")).unwrap();
    engine
        .execute("CREATE TABLE users (id INT, name TEXT)")
        .unwrap();
    engine
        .execute("INSERT INTO users (id, name) VALUES (1, 'Alice');")
        .unwrap();
    engine
        .execute("INSERT INTO users (id, name) VALUES (2, 'Bob');")
        .unwrap();
    engine
}

#[test]
fn test_update_with_where_touches_matching_row_only() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let result = engine
        .execute("UPDATE users SET name = 'Carol' WHERE id = 1")
        .unwrap();
    assert!(result.is_none());

    let rows = engine.table("users").unwrap();
    assert_eq!(rows[0].get("name"), Some(&Value::Text("Carol".to_string())));
    assert_eq!(rows[1].get("name"), Some(&Value::Text("Bob".to_string())));
}

#[test]
fn test_update_plan_has_one_compare_and_one_update() {
    let plan = compile("UPDATE users SET name = 'Bob' WHERE id = 1").unwrap();

    let compares = plan
        .iter()
        .filter(|op| matches!(op, Opcode::CompareEq))
        .count();
    let updates = plan
        .iter()
        .filter(|op| matches!(op, Opcode::UpdateColumn(_)))
        .count();
    assert_eq!(compares, 1);
    assert_eq!(updates, 1);
}

#[test]
fn test_update_without_where_touches_every_row() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine.execute("UPDATE users SET name = 'x'").unwrap();

    let rows = engine.table("users").unwrap();
    assert!(rows
        .iter()
        .all(|row| row.get("name") == Some(&Value::Text("x".to_string()))));
}

#[test]
fn test_update_multiple_assignments() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine
        .execute("UPDATE users SET name = 'Zed', id = 9 WHERE id = 2")
        .unwrap();

    let rows = engine.table("users").unwrap();
    assert_eq!(rows[1].get("name"), Some(&Value::Text("Zed".to_string())));
    assert_eq!(rows[1].get("id"), Some(&Value::Integer(9)));
}

#[test]
fn test_update_unknown_column_fails() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let err = engine
        .execute("UPDATE users SET height = 180 WHERE id = 1")
        .unwrap_err();
    match err {
        Error::Execution(message) => {
            assert!(message.contains("height"), "message was: {}", message)
        }
        other => panic!("expected an execution error, got {:?}", other),
    }
}

#[test]
fn test_update_requires_set() {
    let err = compile("UPDATE users name = 'x'").unwrap_err();
    match err {
        Error::Parse(message) => {
            assert!(message.contains("SET"), "message was: {}", message)
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_delete_with_where_removes_matching_row() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine.execute("DELETE FROM users WHERE id = 1").unwrap();

    let rows = engine.table("users").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(2)));
}

#[test]
fn test_delete_without_where_removes_every_row() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine.execute("DELETE FROM users").unwrap();
    assert!(engine.table("users").unwrap().is_empty());
}

#[test]
fn test_delete_consecutive_matches_removes_all() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    // Adjacent rows match; the scan must not skip the second after
    // removing the first.
    engine
        .execute("INSERT INTO users (id, name) VALUES (1, 'Alice2');")
        .unwrap();
    engine
        .execute("INSERT INTO users (id, name) VALUES (1, 'Alice3');")
        .unwrap();

    engine.execute("DELETE FROM users WHERE id = 1").unwrap();

    let rows = engine.table("users").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::Text("Bob".to_string())));
}

#[test]
fn test_delete_requires_from() {
    let err = compile("DELETE users").unwrap_err();
    match err {
        Error::Parse(message) => {
            assert!(message.contains("FROM"), "message was: {}", message)
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}
