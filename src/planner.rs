use crate::ast::{Column, ColumnDefinition, CompareOp, Condition, Value};
use crate::command::Command;
use crate::error::Result;

/// One instruction of an execution plan. Operands are typed fields, so a
/// malformed instruction is unrepresentable; zero-operand mnemonics are
/// fieldless variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    LoadConst(Value),
    LoadColumn(String),
    CompareEq,
    CompareNeq,
    CompareLt,
    CompareLte,
    CompareGt,
    CompareGte,
    JumpIfFalse(String),
    Jump(String),
    Label(String),
    OpenTable(String),
    ScanStart,
    ScanNext,
    ScanEnd,
    EmitRow(Vec<Column>),
    UpdateColumn(String),
    DeleteRow,
    InsertRow(String),
    CreateTable(String, Vec<ColumnDefinition>),
    DropTable(String),
}

impl Opcode {
    /// The mnemonic used in plan listings and execution error messages.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::LoadConst(_) => "LOAD_CONST",
            Opcode::LoadColumn(_) => "LOAD_COLUMN",
            Opcode::CompareEq => "COMPARE_EQ",
            Opcode::CompareNeq => "COMPARE_NEQ",
            Opcode::CompareLt => "COMPARE_LT",
            Opcode::CompareLte => "COMPARE_LTE",
            Opcode::CompareGt => "COMPARE_GT",
            Opcode::CompareGte => "COMPARE_GTE",
            Opcode::JumpIfFalse(_) => "JUMP_IF_FALSE",
            Opcode::Jump(_) => "JUMP",
            Opcode::Label(_) => "LABEL",
            Opcode::OpenTable(_) => "OPEN_TABLE",
            Opcode::ScanStart => "SCAN_START",
            Opcode::ScanNext => "SCAN_NEXT",
            Opcode::ScanEnd => "SCAN_END",
            Opcode::EmitRow(_) => "EMIT_ROW",
            Opcode::UpdateColumn(_) => "UPDATE_COLUMN",
            Opcode::DeleteRow => "DELETE_ROW",
            Opcode::InsertRow(_) => "INSERT_ROW",
            Opcode::CreateTable(_, _) => "CREATE_TABLE",
            Opcode::DropTable(_) => "DROP_TABLE",
        }
    }
}

/// Compiles commands to opcode programs.
///
/// Labels are freshly generated per generator (`label_1, label_2, …`), so
/// within one program each label name appears in exactly one LABEL
/// instruction.
pub struct PlanGenerator {
    label_counter: usize,
}

impl Default for PlanGenerator {
    fn default() -> Self {
        PlanGenerator::new()
    }
}

impl PlanGenerator {
    pub fn new() -> Self {
        PlanGenerator { label_counter: 0 }
    }

    fn new_label(&mut self) -> String {
        self.label_counter += 1;
        format!("label_{}", self.label_counter)
    }

    pub fn generate(&mut self, command: &Command) -> Result<Vec<Opcode>> {
        let plan = match command {
            Command::CreateTable(cmd) => vec![Opcode::CreateTable(
                cmd.table_name.clone(),
                cmd.columns.clone(),
            )],
            Command::Drop(cmd) => vec![Opcode::DropTable(cmd.table_name.clone())],
            Command::Insert(cmd) => {
                let mut plan: Vec<Opcode> = cmd
                    .values
                    .iter()
                    .map(|value| Opcode::LoadConst(value.clone()))
                    .collect();
                plan.push(Opcode::InsertRow(cmd.table_name.clone()));
                plan
            }
            Command::Select(cmd) => self.scan_plan(
                &cmd.table_name,
                cmd.where_clause.as_ref(),
                vec![Opcode::EmitRow(cmd.columns.clone())],
            ),
            Command::Update(cmd) => {
                let mut body = Vec::new();
                for (column, value) in &cmd.assignments {
                    body.push(Opcode::LoadConst(value.clone()));
                    body.push(Opcode::UpdateColumn(column.clone()));
                }
                self.scan_plan(&cmd.table_name, cmd.where_clause.as_ref(), body)
            }
            Command::Delete(cmd) => self.scan_plan(
                &cmd.table_name,
                cmd.where_clause.as_ref(),
                vec![Opcode::DeleteRow],
            ),
        };
        Ok(plan)
    }

    /// The scan skeleton shared by SELECT, UPDATE, and DELETE:
    ///
    /// ```text
    /// OPEN_TABLE t ; SCAN_START ; LABEL loop ; SCAN_NEXT ; JUMP_IF_FALSE end
    /// [ LOAD_COLUMN c ; LOAD_CONST v ; COMPARE_* ; JUMP_IF_FALSE skip ]
    /// <body>
    /// [ LABEL skip ]
    /// JUMP loop ; LABEL end ; SCAN_END
    /// ```
    ///
    /// The skip label exists only when a WHERE clause does.
    fn scan_plan(
        &mut self,
        table_name: &str,
        where_clause: Option<&Condition>,
        body: Vec<Opcode>,
    ) -> Vec<Opcode> {
        let loop_label = self.new_label();
        let end_label = self.new_label();

        let mut plan = vec![
            Opcode::OpenTable(table_name.to_string()),
            Opcode::ScanStart,
            Opcode::Label(loop_label.clone()),
            Opcode::ScanNext,
            Opcode::JumpIfFalse(end_label.clone()),
        ];

        match where_clause {
            Some(condition) => {
                let skip_label = self.new_label();
                plan.push(Opcode::LoadColumn(condition.column.clone()));
                plan.push(Opcode::LoadConst(condition.value.clone()));
                plan.push(compare_opcode(condition.op));
                plan.push(Opcode::JumpIfFalse(skip_label.clone()));
                plan.extend(body);
                plan.push(Opcode::Label(skip_label));
            }
            None => plan.extend(body),
        }

        plan.push(Opcode::Jump(loop_label));
        plan.push(Opcode::Label(end_label));
        plan.push(Opcode::ScanEnd);
        plan
    }
}

fn compare_opcode(op: CompareOp) -> Opcode {
    match op {
        CompareOp::Eq => Opcode::CompareEq,
        CompareOp::NotEq => Opcode::CompareNeq,
        CompareOp::Lt => Opcode::CompareLt,
        CompareOp::LtEq => Opcode::CompareLte,
        CompareOp::Gt => Opcode::CompareGt,
        CompareOp::GtEq => Opcode::CompareGte,
    }
}
