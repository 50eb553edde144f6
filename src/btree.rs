use crate::error::{Error, Result};
use crate::logger::Logger;
use crate::pager::Pager;
use crate::storage::PAGE_SIZE;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::rc::Rc;

/// Page number of the root node.
pub const ROOT_PAGE: usize = 0;

/// A deserialized node claiming more keys than this is corrupt.
pub const MAX_KEY_COUNT: u32 = 1024;

/// One B-tree node, mapped 1:1 onto a page.
///
/// On-disk layout (little-endian): byte 0 is the leaf flag, bytes 1..5
/// the key count, then `key_count * 4` bytes of u32 keys, zero-padded to
/// the page size. `children` is reserved on disk so a later
/// split/rebalance implementation keeps this layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BTreeNode {
    pub is_leaf: bool,
    pub keys: Vec<u32>,
    pub children: Vec<u32>,
}

impl BTreeNode {
    pub fn leaf() -> Self {
        BTreeNode {
            is_leaf: true,
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Encodes the node into exactly `PAGE_SIZE` bytes. Fails when the
    /// logical payload would not fit in one page.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let payload = 5 + self.keys.len() * 4;
        if payload > PAGE_SIZE {
            return Err(Error::Storage(
                "serialized node exceeds page size".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(PAGE_SIZE);
        data.write_u8(self.is_leaf as u8)
            .map_err(|e| Error::Storage(format!("node serialization failed: {}", e)))?;
        data.write_u32::<LittleEndian>(self.keys.len() as u32)
            .map_err(|e| Error::Storage(format!("node serialization failed: {}", e)))?;
        for key in &self.keys {
            data.write_u32::<LittleEndian>(*key)
                .map_err(|e| Error::Storage(format!("node serialization failed: {}", e)))?;
        }
        data.resize(PAGE_SIZE, 0);
        Ok(data)
    }

    /// Decodes a node from a page buffer, rejecting buffers too small to
    /// hold the header or the claimed key array, and unrealistic key
    /// counts.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        if data.len() < 5 {
            return Err(Error::Storage("page too small to deserialize".to_string()));
        }

        let mut reader = data;
        let is_leaf = reader
            .read_u8()
            .map_err(|e| Error::Storage(format!("node deserialization failed: {}", e)))?
            != 0;
        let key_count = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| Error::Storage(format!("node deserialization failed: {}", e)))?;

        if key_count > MAX_KEY_COUNT {
            return Err(Error::Storage(format!(
                "unrealistic key count: {}",
                key_count
            )));
        }
        if data.len() < 5 + key_count as usize * 4 {
            return Err(Error::Storage("page too small to deserialize".to_string()));
        }

        let mut keys = Vec::with_capacity(key_count as usize);
        for _ in 0..key_count {
            let key = reader
                .read_u32::<LittleEndian>()
                .map_err(|e| Error::Storage(format!("node deserialization failed: {}", e)))?;
            keys.push(key);
        }

        Ok(BTreeNode {
            is_leaf,
            keys,
            children: Vec::new(),
        })
    }
}

/// Root-only keyed index over the pager. The root node lives at page 0
/// and is kept resident; mutations write through the pager.
pub struct BTree {
    root_page: usize,
    root: BTreeNode,
    logger: Rc<dyn Logger>,
}

impl BTree {
    /// Loads the root from page 0, writing out a fresh leaf when the
    /// page does not decode as a node.
    pub fn open(pager: &mut Pager, logger: Rc<dyn Logger>) -> Result<Self> {
        let root = match Self::load_node(pager, ROOT_PAGE) {
            Ok(root) => root,
            Err(err) => {
                logger.warn(&format!("root load failed, starting fresh: {}", err));
                let root = BTreeNode::leaf();
                Self::write_node(pager, ROOT_PAGE, &root)?;
                root
            }
        };
        Ok(BTree {
            root_page: ROOT_PAGE,
            root,
            logger,
        })
    }

    pub fn root(&self) -> &BTreeNode {
        &self.root
    }

    pub fn root_keys(&self) -> &[u32] {
        &self.root.keys
    }

    /// Inserts a key into the root. Duplicates are a no-op; otherwise
    /// the key sequence is re-sorted and written back through the pager.
    pub fn insert(&mut self, pager: &mut Pager, key: u32) -> Result<()> {
        if self.root.keys.contains(&key) {
            self.logger
                .warn(&format!("key {} already exists in root", key));
            return Ok(());
        }
        self.root.keys.push(key);
        self.root.keys.sort_unstable();
        Self::write_node(pager, self.root_page, &self.root)?;
        self.logger
            .info(&format!("inserted key {} into root node", key));
        Ok(())
    }

    pub fn search(&self, key: u32) -> bool {
        self.root.keys.contains(&key)
    }

    fn load_node(pager: &mut Pager, page_number: usize) -> Result<BTreeNode> {
        let load = |pager: &mut Pager| -> Result<BTreeNode> {
            let page = pager.get_page(page_number)?;
            BTreeNode::deserialize(&page.data)
        };
        load(pager).map_err(|e| {
            Error::BTree(format!(
                "error loading node from page {}: {}",
                page_number, e
            ))
        })
    }

    fn write_node(pager: &mut Pager, page_number: usize, node: &BTreeNode) -> Result<()> {
        let write = |pager: &mut Pager| -> Result<()> {
            let data = node.serialize()?;
            let page = pager.get_page(page_number)?;
            page.data = data;
            Ok(())
        };
        write(pager).map_err(|e| {
            Error::BTree(format!("error writing node to page {}: {}", page_number, e))
        })?;
        pager.mark_dirty(page_number);
        Ok(())
    }
}
