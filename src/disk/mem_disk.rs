use std::{
    io::Result,
    sync::{Mutex, PoisonError},
};

use crate::disk::{
    block_device::{out_of_range, BlockDevice},
    types::{Block, BLOCK_COUNT, BLOCK_SIZE},
};

/// 纯内存块设备，进程退出即丢失
#[derive(Debug)]
pub struct MemDisk {
    blocks: Mutex<Vec<Block>>,
}

impl MemDisk {
    pub fn new() -> Self {
        Self {
            blocks: Mutex::new(vec![[0u8; BLOCK_SIZE]; BLOCK_COUNT]),
        }
    }
}

impl Default for MemDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockDevice for MemDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        let blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        let block = blocks
            .get(block_id as usize)
            .ok_or_else(|| out_of_range(block_id))?;
        buf.copy_from_slice(block);
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        let mut blocks = self.blocks.lock().unwrap_or_else(PoisonError::into_inner);
        let block = blocks
            .get_mut(block_id as usize)
            .ok_or_else(|| out_of_range(block_id))?;
        block.copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zeroed_and_keeps_writes() {
        let disk = MemDisk::new();
        let mut buf = [0xAAu8; BLOCK_SIZE];
        disk.read_block(3, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));

        buf[0] = 7;
        disk.write_block(3, &buf).unwrap();
        let mut back = [0u8; BLOCK_SIZE];
        disk.read_block(3, &mut back).unwrap();
        assert_eq!(back[0], 7);
    }

    #[test]
    fn rejects_blocks_past_the_end() {
        let disk = MemDisk::new();
        let mut buf = [0u8; BLOCK_SIZE];
        assert!(disk.read_block(BLOCK_COUNT as u64, &mut buf).is_err());
        assert!(disk.write_block(BLOCK_COUNT as u64, &buf).is_err());
    }
}
