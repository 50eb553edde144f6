use crate::ast::{Column, CompareOp, Value};
use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::planner::Opcode;
use std::collections::HashMap;
use std::rc::Rc;

/// A row is a mapping from column name to value; its key set equals the
/// schema's column set for its table.
pub type Row = HashMap<String, Value>;

/// What an executed opcode asks the dispatch loop to do next.
enum Flow {
    Continue,
    /// Set the program counter to the label's own index; the LABEL
    /// executes as a no-op and the loop steps past it.
    Jump(usize),
    /// Scan exhausted; leave the loop entirely.
    Break,
}

/// Stack-machine evaluator of opcode programs.
///
/// Owns the in-memory table registry and the schema registry. Every scan
/// loop is uniform across SELECT/UPDATE/DELETE, which keeps the evaluator
/// small enough to read in one sitting.
pub struct VirtualMachine {
    tables: HashMap<String, Vec<Row>>,
    schema: HashMap<String, Vec<String>>,
    stack: Vec<Value>,
    current_table: Option<String>,
    /// Index of the next row the scan will visit.
    cursor: Option<usize>,
    /// Index of the row made current by the last SCAN_NEXT.
    current_row: Option<usize>,
    labels: HashMap<String, usize>,
    logger: Rc<dyn Logger>,
}

impl VirtualMachine {
    /// Builds a VM over a preseeded schema registry. Each registered
    /// table starts empty.
    pub fn new(schema: HashMap<String, Vec<String>>, logger: Rc<dyn Logger>) -> Self {
        let tables = schema
            .keys()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        VirtualMachine {
            tables,
            schema,
            stack: Vec::new(),
            current_table: None,
            cursor: None,
            current_row: None,
            labels: HashMap::new(),
            logger,
        }
    }

    pub fn schema(&self) -> &HashMap<String, Vec<String>> {
        &self.schema
    }

    pub fn table(&self, name: &str) -> Option<&[Row]> {
        self.tables.get(name).map(|rows| rows.as_slice())
    }

    /// Runs a program and returns the rows emitted by EMIT_ROW, in
    /// emission order.
    pub fn execute(&mut self, plan: &[Opcode]) -> Result<Vec<Row>> {
        self.stack.clear();
        self.cursor = None;
        self.current_row = None;
        self.labels = plan
            .iter()
            .enumerate()
            .filter_map(|(index, opcode)| match opcode {
                Opcode::Label(name) => Some((name.clone(), index)),
                _ => None,
            })
            .collect();

        let mut results = Vec::new();
        let mut pc = 0;

        while pc < plan.len() {
            let opcode = &plan[pc];
            let flow = self
                .step(opcode, &mut results)
                .map_err(|err| wrap_opcode_error(opcode, err))?;
            match flow {
                Flow::Continue => pc += 1,
                Flow::Jump(target) => pc = target,
                Flow::Break => break,
            }
        }

        Ok(results)
    }

    fn step(&mut self, opcode: &Opcode, results: &mut Vec<Row>) -> Result<Flow> {
        match opcode {
            Opcode::LoadConst(value) => self.stack.push(value.clone()),
            Opcode::LoadColumn(column) => {
                let value = self.load_column(column)?;
                self.stack.push(value);
            }
            Opcode::CompareEq => self.compare(CompareOp::Eq)?,
            Opcode::CompareNeq => self.compare(CompareOp::NotEq)?,
            Opcode::CompareLt => self.compare(CompareOp::Lt)?,
            Opcode::CompareLte => self.compare(CompareOp::LtEq)?,
            Opcode::CompareGt => self.compare(CompareOp::Gt)?,
            Opcode::CompareGte => self.compare(CompareOp::GtEq)?,
            Opcode::JumpIfFalse(label) => {
                let condition = self
                    .stack
                    .pop()
                    .ok_or_else(|| Error::Execution("no condition to jump on".to_string()))?;
                if !condition.is_truthy() {
                    return Ok(Flow::Jump(self.label_index(label)?));
                }
            }
            Opcode::Jump(label) => return Ok(Flow::Jump(self.label_index(label)?)),
            Opcode::Label(_) => {}
            Opcode::OpenTable(table_name) => {
                if !self.tables.contains_key(table_name) {
                    return Err(Error::Execution(format!(
                        "table '{}' not found",
                        table_name
                    )));
                }
                self.current_table = Some(table_name.clone());
            }
            Opcode::ScanStart => {
                if self.current_table.is_none() {
                    return Err(Error::Execution(
                        "no table opened for scanning".to_string(),
                    ));
                }
                self.cursor = Some(0);
                self.current_row = None;
            }
            Opcode::ScanNext => return self.scan_next(),
            Opcode::ScanEnd => {
                self.cursor = None;
                self.current_row = None;
            }
            Opcode::EmitRow(columns) => results.push(self.project(columns)?),
            Opcode::UpdateColumn(column) => self.update_column(column)?,
            Opcode::DeleteRow => self.delete_row()?,
            Opcode::InsertRow(table_name) => self.insert_row(table_name)?,
            Opcode::CreateTable(table_name, columns) => {
                if self.tables.contains_key(table_name) {
                    return Err(Error::Execution(format!(
                        "table '{}' already exists",
                        table_name
                    )));
                }
                let column_names: Vec<String> =
                    columns.iter().map(|def| def.name.clone()).collect();
                self.tables.insert(table_name.clone(), Vec::new());
                self.schema.insert(table_name.clone(), column_names.clone());
                self.logger.info(&format!(
                    "created table '{}' with columns {:?}",
                    table_name, column_names
                ));
            }
            Opcode::DropTable(table_name) => {
                if self.tables.remove(table_name).is_none() {
                    return Err(Error::Execution(format!(
                        "table '{}' does not exist",
                        table_name
                    )));
                }
                self.schema.remove(table_name);
                self.logger.info(&format!("dropped table '{}'", table_name));
            }
        }
        Ok(Flow::Continue)
    }

    fn label_index(&self, label: &str) -> Result<usize> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| Error::Execution(format!("undefined jump label '{}'", label)))
    }

    fn open_table_name(&self) -> Result<&str> {
        self.current_table
            .as_deref()
            .ok_or_else(|| Error::Execution("no table opened for scanning".to_string()))
    }

    fn current_row(&self) -> Result<&Row> {
        let table_name = self.open_table_name()?;
        let index = self
            .current_row
            .ok_or_else(|| Error::Execution("no current row".to_string()))?;
        self.tables
            .get(table_name)
            .and_then(|rows| rows.get(index))
            .ok_or_else(|| Error::Execution("no current row".to_string()))
    }

    fn scan_next(&mut self) -> Result<Flow> {
        let table_name = self.open_table_name()?.to_string();
        let next = self
            .cursor
            .ok_or_else(|| Error::Execution("scan not started".to_string()))?;
        let row_count = self
            .tables
            .get(&table_name)
            .map(|rows| rows.len())
            .unwrap_or(0);

        if next < row_count {
            self.current_row = Some(next);
            self.cursor = Some(next + 1);
            self.stack.push(Value::Boolean(true));
            Ok(Flow::Continue)
        } else {
            // Exhausted: push the flag and leave the dispatch loop, so a
            // plan without the loop/label skeleton still terminates.
            self.current_row = None;
            self.stack.push(Value::Boolean(false));
            Ok(Flow::Break)
        }
    }

    fn load_column(&self, column: &str) -> Result<Value> {
        let row = self.current_row()?;
        row.get(column)
            .cloned()
            .ok_or_else(|| Error::Execution(format!("column '{}' not found", column)))
    }

    fn compare(&mut self, op: CompareOp) -> Result<()> {
        if self.stack.len() < 2 {
            return Err(Error::Execution(
                "stack underflow: not enough values for comparison".to_string(),
            ));
        }
        let right = self.stack.pop().expect("stack length checked");
        let left = self.stack.pop().expect("stack length checked");
        self.stack.push(Value::Boolean(left.compare(op, &right)));
        Ok(())
    }

    /// Projects the named columns out of the current row; `*` yields the
    /// whole row.
    fn project(&self, columns: &[Column]) -> Result<Row> {
        let row = self.current_row()?;

        if columns.iter().any(|column| matches!(column, Column::All)) {
            return Ok(row.clone());
        }

        let mut projected = Row::new();
        for column in columns {
            let Column::Named(name) = column else {
                continue;
            };
            let value = row
                .get(name)
                .cloned()
                .ok_or_else(|| Error::Execution(format!("column '{}' not found", name)))?;
            projected.insert(name.clone(), value);
        }
        Ok(projected)
    }

    fn update_column(&mut self, column: &str) -> Result<()> {
        let value = self
            .stack
            .pop()
            .ok_or_else(|| Error::Execution("no value to update with".to_string()))?;
        let table_name = self.open_table_name()?.to_string();
        let index = self
            .current_row
            .ok_or_else(|| Error::Execution("no current row".to_string()))?;

        let row = self
            .tables
            .get_mut(&table_name)
            .and_then(|rows| rows.get_mut(index))
            .ok_or_else(|| Error::Execution("no current row".to_string()))?;
        if !row.contains_key(column) {
            return Err(Error::Execution(format!("column '{}' not found", column)));
        }
        row.insert(column.to_string(), value);
        Ok(())
    }

    fn delete_row(&mut self) -> Result<()> {
        let table_name = self.open_table_name()?.to_string();
        let index = self
            .current_row
            .ok_or_else(|| Error::Execution("no active row to delete".to_string()))?;

        let rows = self
            .tables
            .get_mut(&table_name)
            .ok_or_else(|| Error::Execution(format!("table '{}' not found", table_name)))?;
        if index >= rows.len() {
            return Err(Error::Execution("no active row to delete".to_string()));
        }
        let removed = rows.remove(index);
        self.logger
            .debug(&format!("deleted row from '{}': {:?}", table_name, removed));

        // The successor row slid into this index; step the cursor back so
        // the next SCAN_NEXT does not skip it.
        self.current_row = None;
        self.cursor = Some(index);
        Ok(())
    }

    fn insert_row(&mut self, table_name: &str) -> Result<()> {
        if !self.tables.contains_key(table_name) {
            return Err(Error::Execution(format!(
                "table '{}' does not exist",
                table_name
            )));
        }
        let columns = self
            .schema
            .get(table_name)
            .cloned()
            .ok_or_else(|| Error::Execution(format!("table '{}' does not exist", table_name)))?;

        if self.stack.len() < columns.len() {
            return Err(Error::Execution(format!(
                "not enough values to insert into '{}'",
                table_name
            )));
        }

        // Values were pushed in column order, so popping binds them in
        // reverse.
        let mut row = Row::new();
        for column in columns.iter().rev() {
            let value = self.stack.pop().expect("stack length checked");
            row.insert(column.clone(), value);
        }

        self.logger
            .debug(&format!("inserted row into '{}': {:?}", table_name, row));
        self.tables
            .get_mut(table_name)
            .expect("table presence checked")
            .push(row);
        Ok(())
    }
}

/// Re-wraps an opcode-level failure so the message names the failing
/// mnemonic.
fn wrap_opcode_error(opcode: &Opcode, err: Error) -> Error {
    match err {
        Error::Execution(message) => Error::Execution(format!(
            "error executing {}: {}",
            opcode.mnemonic(),
            message
        )),
        other => other,
    }
}
