use crate::ast::*;

/// The six concrete command shapes the plan generator consumes.
///
/// Exhaustive matching over this enum means an unsupported statement
/// kind cannot reach the plan generator in the first place.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTable(CreateTableCommand),
    Select(SelectTableCommand),
    Insert(InsertCommand),
    Update(UpdateCommand),
    Delete(DeleteCommand),
    Drop(DropCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableCommand {
    pub table_name: String,
    pub columns: Vec<ColumnDefinition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectTableCommand {
    pub table_name: String,
    pub columns: Vec<Column>,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertCommand {
    pub table_name: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCommand {
    pub table_name: String,
    /// Non-empty, in source order.
    pub assignments: Vec<(String, Value)>,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCommand {
    pub table_name: String,
    pub where_clause: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropCommand {
    pub table_name: String,
}

/// Pure translation from the parse tree to a typed command.
pub fn build(statement: Statement) -> Command {
    match statement {
        Statement::Select(stmt) => Command::Select(SelectTableCommand {
            table_name: stmt.table_name,
            columns: stmt.columns,
            where_clause: stmt.where_clause,
        }),
        Statement::Insert(stmt) => Command::Insert(InsertCommand {
            table_name: stmt.table_name,
            columns: stmt.columns,
            values: stmt.values,
        }),
        Statement::Update(stmt) => Command::Update(UpdateCommand {
            table_name: stmt.table_name,
            assignments: stmt.assignments,
            where_clause: stmt.where_clause,
        }),
        Statement::Delete(stmt) => Command::Delete(DeleteCommand {
            table_name: stmt.table_name,
            where_clause: stmt.where_clause,
        }),
        Statement::CreateTable(stmt) => Command::CreateTable(CreateTableCommand {
            table_name: stmt.table_name,
            columns: stmt.columns,
        }),
        Statement::DropTable(stmt) => Command::Drop(DropCommand {
            table_name: stmt.table_name,
        }),
    }
}
