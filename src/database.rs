use crate::ast::Statement;
use crate::btree::BTree;
use crate::command;
use crate::error::Result;
use crate::lexer;
use crate::logger::{self, Logger};
use crate::pager::Pager;
use crate::parser;
use crate::planner::PlanGenerator;
use crate::storage::DbFile;
use crate::vm::{Row, VirtualMachine};
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// Cache capacity the engine builds its pager with. Deliberately tiny so
/// eviction and write-back are exercised even by small workloads.
const ENGINE_CACHE_SIZE: usize = 4;

/// The engine: owns the pager (which owns the file), the B-tree, the
/// plan generator, and the VM. One engine per database file.
///
/// `execute` runs the whole pipeline for one statement:
/// tokenize, parse, build command, generate plan, run on the VM.
pub struct DatabaseEngine {
    pager: Pager,
    btree: BTree,
    planner: PlanGenerator,
    vm: VirtualMachine,
    logger: Rc<dyn Logger>,
    closed: bool,
}

impl DatabaseEngine {
    /// Opens (or creates) the database file at `path` with no logging.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_logger(path, logger::null())
    }

    pub fn with_logger<P: AsRef<Path>>(path: P, logger: Rc<dyn Logger>) -> Result<Self> {
        let file = DbFile::open(path)?;
        let mut pager = Pager::new(file, ENGINE_CACHE_SIZE, logger.clone());
        let btree = BTree::open(&mut pager, logger.clone())?;

        // Demonstration table, registered up front so the registry is
        // never empty. The backing table starts with no rows.
        let mut schema = HashMap::new();
        schema.insert(
            "products".to_string(),
            ["product_id", "name", "price", "stock"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );
        let vm = VirtualMachine::new(schema, logger.clone());

        logger.info("opened database");
        Ok(DatabaseEngine {
            pager,
            btree,
            planner: PlanGenerator::new(),
            vm,
            logger,
            closed: false,
        })
    }

    /// Executes one SQL statement. Returns the emitted rows for SELECT
    /// and `None` for every other statement kind.
    pub fn execute(&mut self, query: &str) -> Result<Option<Vec<Row>>> {
        let tokens = lexer::tokenize(query)?;
        let statement = parser::parse(tokens)?;
        let is_select = matches!(statement, Statement::Select(_));

        let command = command::build(statement);
        let plan = self.planner.generate(&command)?;
        let rows = self.vm.execute(&plan)?;

        Ok(if is_select { Some(rows) } else { None })
    }

    /// Inserts a key into the standalone keyed index. The index is
    /// exercised separately from row storage.
    pub fn btree_insert(&mut self, key: u32) -> Result<()> {
        self.btree.insert(&mut self.pager, key)
    }

    pub fn btree_search(&self, key: u32) -> bool {
        self.btree.search(key)
    }

    pub fn btree_keys(&self) -> &[u32] {
        self.btree.root_keys()
    }

    /// The engine-wide mapping of table name to ordered column names.
    pub fn schema(&self) -> &HashMap<String, Vec<String>> {
        self.vm.schema()
    }

    pub fn table(&self, name: &str) -> Option<&[Row]> {
        self.vm.table(name)
    }

    /// Flushes the pager and closes the file. Both steps run even when
    /// the flush fails. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.logger.info("closing database");
        self.pager.close()
    }
}

impl Drop for DatabaseEngine {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.close() {
                self.logger.error(&format!("close on drop failed: {}", err));
            }
        }
    }
}
