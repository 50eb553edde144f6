use minisql::ast::Value;
use minisql::compile;
use minisql::database::DatabaseEngine;
use minisql::error::Error;
use minisql::planner::Opcode;
use tempfile::TempDir;

fn open_engine(dir: &TempDir) -> DatabaseEngine {
    DatabaseEngine::open(dir.path().join("test.db")).unwrap()
}

#[test]
fn test_insert_plan_shape() {
    let plan = compile("INSERT INTO users (id, name) VALUES (1, 'Alice');").unwrap();
    assert_eq!(
        plan,
        vec![
            Opcode::LoadConst(Value::Integer(1)),
            Opcode::LoadConst(Value::Text("Alice".to_string())),
            Opcode::InsertRow("users".to_string()),
        ]
    );
}

#[test]
fn test_insert_appends_row() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine.execute("CREATE TABLE users (id INT, name TEXT)").unwrap();
    let result = engine
        .execute("INSERT INTO users (id, name) VALUES (1, 'Alice');")
        .unwrap();
    assert!(result.is_none());

    let rows = engine.table("users").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
    assert_eq!(rows[0].get("name"), Some(&Value::Text("Alice".to_string())));
}

#[test]
fn test_insert_preserves_insertion_order() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine.execute("CREATE TABLE users (id INT, name TEXT)").unwrap();
    engine
        .execute("INSERT INTO users (id, name) VALUES (1, 'Alice');")
        .unwrap();
    engine
        .execute("INSERT INTO users (id, name) VALUES (2, 'Bob');")
        .unwrap();

    let rows = engine.table("users").unwrap();
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
    assert_eq!(rows[1].get("id"), Some(&Value::Integer(2)));
}

#[test]
fn test_insert_binds_native_values() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine
        .execute("CREATE TABLE readings (sensor TEXT, level REAL)")
        .unwrap();
    engine
        .execute("INSERT INTO readings (sensor, level) VALUES ('t1', 3.5);")
        .unwrap();

    let rows = engine.table("readings").unwrap();
    assert_eq!(rows[0].get("sensor"), Some(&Value::Text("t1".to_string())));
    assert_eq!(rows[0].get("level"), Some(&Value::Float(3.5)));
}

#[test]
fn test_insert_requires_semicolon() {
    let err = compile("INSERT INTO users (id) VALUES (1)").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn test_insert_requires_column_list() {
    let err = compile("INSERT INTO users VALUES (1);").unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
}

#[test]
fn test_insert_requires_values_keyword() {
    let err = compile("INSERT INTO users (id) (1);").unwrap_err();
    match err {
        Error::Parse(message) => {
            assert!(message.contains("VALUES"), "message was: {}", message)
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
}

#[test]
fn test_multi_row_insert_keeps_first_row() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine.execute("CREATE TABLE users (id INT, name TEXT)").unwrap();
    engine
        .execute("INSERT INTO users (id, name) VALUES (1, 'Alice'), (2, 'Bob');")
        .unwrap();

    let rows = engine.table("users").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
}

#[test]
fn test_insert_into_missing_table_fails() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let err = engine
        .execute("INSERT INTO missing (id) VALUES (1);")
        .unwrap_err();
    match err {
        Error::Execution(message) => {
            assert!(message.contains("missing"), "message was: {}", message)
        }
        other => panic!("expected an execution error, got {:?}", other),
    }
}

#[test]
fn test_insert_with_too_few_values_fails() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    engine.execute("CREATE TABLE users (id INT, name TEXT)").unwrap();
    let err = engine
        .execute("INSERT INTO users (id) VALUES (1);")
        .unwrap_err();
    match err {
        Error::Execution(message) => {
            assert!(
                message.contains("not enough values"),
                "message was: {}",
                message
            )
        }
        other => panic!("expected an execution error, got {:?}", other),
    }
}
