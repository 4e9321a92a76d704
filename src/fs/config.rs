use crate::disk::{BLOCK_COUNT, BLOCK_SIZE};

pub const SUPER_BLOCK_BLOCK_ID: u64 = 0;
pub const METADATA_START_BLOCK_ID: u64 = 1;

// 0..RESERVED_BLOCKS 为系统保留区，永远不参与分配
pub const RESERVED_BLOCKS: usize = 5;
pub const TOTAL_BLOCKS: usize = BLOCK_COUNT;

// 元数据区（目录 + 块位图）占用的块数
pub const METADATA_BLOCKS: u64 = RESERVED_BLOCKS as u64 - METADATA_START_BLOCK_ID;

// 数据区的起始块号与块数
pub const DATA_AREA_START_BLOCK_ID: usize = RESERVED_BLOCKS;
pub const DATA_BLOCKS: usize = TOTAL_BLOCKS - RESERVED_BLOCKS;

// 每块末尾保留一个结束字节，文件内容必须严格小于块大小
pub const MAX_CONTENT_LEN: usize = BLOCK_SIZE - 1;

pub const MAX_NAME_LEN: usize = 31;

pub const MAGIC: u32 = 0xF5DE;
pub const FS_TYPE: &str = "VDiskFS";
