use serde::{Deserialize, Serialize};

use crate::fs::{
    config::{RESERVED_BLOCKS, TOTAL_BLOCKS},
    error::{FileSystemError, Result},
};

/// 单个块的状态，供网格渲染使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockStatus {
    Reserved,
    Used,
    Free,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockPool {
    pub bits: Vec<u8>,     // 位图数据，每个 bit 表示一个块是否被占用（保留块恒为 1）
    pub total_blocks: u64, // 块总数
    pub free_blocks: u64,  // 当前可分配的空闲块数
    #[serde(skip)]
    owners: Vec<Option<String>>, // 块号 -> 所属文件名，挂载时由目录重建
}

impl BlockPool {
    pub fn new() -> Self {
        let byte_len = TOTAL_BLOCKS.div_ceil(8);
        let mut pool = Self {
            bits: vec![0; byte_len],
            total_blocks: TOTAL_BLOCKS as u64,
            free_blocks: (TOTAL_BLOCKS - RESERVED_BLOCKS) as u64,
            owners: vec![None; TOTAL_BLOCKS],
        };
        for index in 0..RESERVED_BLOCKS {
            pool.set_bit(index);
        }
        pool
    }

    pub fn is_reserved(index: usize) -> bool {
        index < RESERVED_BLOCKS
    }

    fn bit(&self, index: usize) -> bool {
        self.bits[index / 8] & (1 << (index % 8)) != 0
    }

    fn set_bit(&mut self, index: usize) {
        self.bits[index / 8] |= 1 << (index % 8);
    }

    fn clear_bit(&mut self, index: usize) {
        self.bits[index / 8] &= !(1 << (index % 8));
    }

    fn check_range(&self, index: usize) -> Result<()> {
        if index >= self.total_blocks as usize {
            return Err(FileSystemError::InvalidBlock(index));
        }
        Ok(())
    }

    /// 分配编号最小的空闲块，并记录其所属文件
    pub fn allocate(&mut self, owner: &str) -> Result<usize> {
        let mut found = None;
        'scan: for (byte_index, byte) in self.bits.iter().enumerate() {
            if *byte == 0xFF {
                continue;
            }
            for bit in 0..8 {
                let index = byte_index * 8 + bit;
                if index >= self.total_blocks as usize {
                    break 'scan;
                }
                if *byte & (1 << bit) == 0 {
                    found = Some(index);
                    break 'scan;
                }
            }
        }

        let index = found.ok_or(FileSystemError::OutOfSpace)?;
        self.claim(index, owner)?;
        Ok(index)
    }

    /// 将指定的空闲块标记为占用
    pub fn claim(&mut self, index: usize, owner: &str) -> Result<()> {
        self.check_range(index)?;
        if Self::is_reserved(index) || self.bit(index) {
            return Err(FileSystemError::InvalidBlock(index));
        }
        self.set_bit(index);
        self.owners[index] = Some(owner.to_string());
        self.free_blocks -= 1;
        Ok(())
    }

    /// 释放一个块；保留块或本已空闲的块返回 InvalidBlock
    pub fn free(&mut self, index: usize) -> Result<()> {
        self.check_range(index)?;
        if Self::is_reserved(index) || !self.bit(index) {
            return Err(FileSystemError::InvalidBlock(index));
        }
        self.clear_bit(index);
        self.owners[index] = None;
        self.free_blocks += 1;
        Ok(())
    }

    pub fn status(&self, index: usize) -> Result<BlockStatus> {
        self.check_range(index)?;
        Ok(if Self::is_reserved(index) {
            BlockStatus::Reserved
        } else if self.bit(index) {
            BlockStatus::Used
        } else {
            BlockStatus::Free
        })
    }

    pub fn is_used(&self, index: usize) -> bool {
        index < self.total_blocks as usize && !Self::is_reserved(index) && self.bit(index)
    }

    pub fn owner(&self, index: usize) -> Option<&str> {
        self.owners.get(index).and_then(|o| o.as_deref())
    }

    pub fn set_owner(&mut self, index: usize, owner: &str) -> Result<()> {
        if !self.is_used(index) {
            return Err(FileSystemError::InvalidBlock(index));
        }
        self.owners[index] = Some(owner.to_string());
        Ok(())
    }

    /// 所有被占用的非保留块，按块号升序
    pub fn used_blocks(&self) -> impl Iterator<Item = usize> + '_ {
        (RESERVED_BLOCKS..self.total_blocks as usize).filter(move |&i| self.bit(i))
    }

    /// 按位图实际统计空闲块数
    pub fn count_free(&self) -> u64 {
        (RESERVED_BLOCKS..self.total_blocks as usize)
            .filter(|&i| !self.bit(i))
            .count() as u64
    }

    /// 释放全部数据块，保留区不受影响
    pub fn release_all(&mut self) {
        for index in RESERVED_BLOCKS..self.total_blocks as usize {
            self.clear_bit(index);
            self.owners[index] = None;
        }
        self.free_blocks = (self.total_blocks as usize - RESERVED_BLOCKS) as u64;
    }

    /// 反序列化之后调用：校验位图长度并重新建立 owners
    pub fn rebuild_owners<'a, I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        if self.total_blocks != TOTAL_BLOCKS as u64 || self.bits.len() != TOTAL_BLOCKS.div_ceil(8) {
            return Err(FileSystemError::Corrupted(format!(
                "block bitmap describes {} blocks, device has {}",
                self.total_blocks, TOTAL_BLOCKS
            )));
        }
        for index in 0..RESERVED_BLOCKS {
            self.set_bit(index);
        }
        self.owners = vec![None; TOTAL_BLOCKS];
        for (name, block) in entries {
            if self.is_used(block) && self.owners[block].is_none() {
                self.owners[block] = Some(name.to_string());
            }
        }
        Ok(())
    }
}

impl Default for BlockPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_lowest_free_block_after_reserved_area() {
        let mut pool = BlockPool::new();
        assert_eq!(pool.allocate("a").unwrap(), RESERVED_BLOCKS);
        assert_eq!(pool.allocate("b").unwrap(), RESERVED_BLOCKS + 1);
        pool.free(RESERVED_BLOCKS).unwrap();
        assert_eq!(pool.allocate("c").unwrap(), RESERVED_BLOCKS);
        assert_eq!(pool.owner(RESERVED_BLOCKS), Some("c"));
    }

    #[test]
    fn exhausts_exactly_the_allocatable_region() {
        let mut pool = BlockPool::new();
        for i in 0..TOTAL_BLOCKS - RESERVED_BLOCKS {
            assert_eq!(pool.allocate("f").unwrap(), RESERVED_BLOCKS + i);
        }
        assert!(matches!(pool.allocate("f"), Err(FileSystemError::OutOfSpace)));
        assert_eq!(pool.free_blocks, 0);
        assert_eq!(pool.count_free(), 0);
    }

    #[test]
    fn refuses_to_free_reserved_or_free_blocks() {
        let mut pool = BlockPool::new();
        assert!(matches!(pool.free(0), Err(FileSystemError::InvalidBlock(0))));
        assert!(matches!(pool.free(4), Err(FileSystemError::InvalidBlock(4))));
        assert!(matches!(pool.free(9), Err(FileSystemError::InvalidBlock(9))));
        assert!(matches!(
            pool.free(TOTAL_BLOCKS),
            Err(FileSystemError::InvalidBlock(_))
        ));
        assert_eq!(pool, BlockPool::new());
    }

    #[test]
    fn reports_status_per_block() {
        let mut pool = BlockPool::new();
        pool.allocate("a").unwrap();
        assert_eq!(pool.status(0).unwrap(), BlockStatus::Reserved);
        assert_eq!(pool.status(5).unwrap(), BlockStatus::Used);
        assert_eq!(pool.status(6).unwrap(), BlockStatus::Free);
        assert!(pool.status(TOTAL_BLOCKS).is_err());
    }

    #[test]
    fn owners_are_rebuilt_from_directory_entries() {
        let mut pool = BlockPool::new();
        pool.allocate("a").unwrap();
        pool.allocate("b").unwrap();
        let bytes = bincode::serialize(&pool).unwrap();

        let mut loaded: BlockPool = bincode::deserialize(&bytes).unwrap();
        assert_eq!(loaded.owner(5), None);
        loaded.rebuild_owners([("a", 5), ("b", 6)]).unwrap();
        assert_eq!(loaded, pool);
    }
}
