use crate::disk::{BlockDevice, BLOCK_SIZE};
use crate::fs::{
    config::{DATA_AREA_START_BLOCK_ID, DATA_BLOCKS, MAX_CONTENT_LEN},
    error::{FileSystemError, Result},
};

/// 数据区的内存镜像，按设备块号寻址
#[derive(Debug, Clone)]
pub struct DataArea {
    pub blocks: Vec<u8>,     // 数据块，扁平化存储
    pub total_blocks: usize, // 块总数
    pub start_block: usize,  // 起始块号
    dirty: Vec<bool>,        // 每个块是否被修改
}

impl DataArea {
    pub fn new() -> Self {
        Self {
            blocks: vec![0u8; DATA_BLOCKS * BLOCK_SIZE],
            total_blocks: DATA_BLOCKS,
            start_block: DATA_AREA_START_BLOCK_ID,
            dirty: vec![false; DATA_BLOCKS],
        }
    }

    fn slot(&self, block: usize) -> Result<usize> {
        block
            .checked_sub(self.start_block)
            .filter(|&i| i < self.total_blocks)
            .ok_or(FileSystemError::InvalidBlock(block))
    }

    pub fn write_block(&mut self, block: usize, buf: &[u8]) -> Result<()> {
        let slot = self.slot(block)?;
        if buf.len() > MAX_CONTENT_LEN {
            return Err(FileSystemError::ContentTooLarge(buf.len()));
        }
        let start = slot * BLOCK_SIZE;
        self.blocks[start..start + buf.len()].copy_from_slice(buf);
        self.blocks[start + buf.len()..start + BLOCK_SIZE].fill(0);
        self.dirty[slot] = true;
        Ok(())
    }

    /// 读取块中前 len 个字节
    pub fn read(&self, block: usize, len: usize) -> Option<&[u8]> {
        let slot = self.slot(block).ok()?;
        let start = slot * BLOCK_SIZE;
        self.blocks.get(start..start + len.min(BLOCK_SIZE))
    }

    pub fn clear_block(&mut self, block: usize) -> Result<()> {
        self.write_block(block, &[])
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|&d| d)
    }

    /// 设备上的内容已不可信，下次 sync 整块重写
    pub fn mark_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    pub fn sync<D: BlockDevice + ?Sized>(&mut self, disk: &D) -> std::io::Result<()> {
        for i in 0..self.total_blocks {
            if self.dirty[i] {
                let start = i * BLOCK_SIZE;

                let mut buf = [0u8; BLOCK_SIZE];
                buf.copy_from_slice(&self.blocks[start..start + BLOCK_SIZE]);

                disk.write_block((self.start_block + i) as u64, &buf)?;
                self.dirty[i] = false;
            }
        }
        Ok(())
    }

    pub fn load<D: BlockDevice + ?Sized>(&mut self, disk: &D) -> std::io::Result<()> {
        for i in 0..self.total_blocks {
            let start = i * BLOCK_SIZE;

            let mut buf = [0u8; BLOCK_SIZE];
            disk.read_block((self.start_block + i) as u64, &mut buf)?;

            self.blocks[start..start + BLOCK_SIZE].copy_from_slice(&buf);
            self.dirty[i] = false;
        }
        Ok(())
    }
}

impl Default for DataArea {
    fn default() -> Self {
        Self::new()
    }
}
