use serde::{Deserialize, Serialize};

use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        config::{FS_TYPE, MAGIC, RESERVED_BLOCKS, SUPER_BLOCK_BLOCK_ID, TOTAL_BLOCKS},
        error::{FileSystemError, Result},
    },
    utils::{current_timestamp, generate_uuid},
};

/// 卷状态：UNCLEAN 表示下一次 list 之前必须先跑恢复流程
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeState {
    Clean,
    Unclean,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperBlock {
    pub magic: u32,      // 魔数，用于识别文件系统
    pub fs_type: String, // 文件系统标识
    /** 块信息 */
    pub block_size: u64,      // 每块大小（字节）
    pub total_blocks: u64,    // 设备总块数
    pub reserved_blocks: u64, // 保留块数
    pub free_blocks: u64,     // 当前空闲块数
    /** 状态 */
    pub state: VolumeState,
    pub mount_count: u64,
    /** 其他元信息 */
    pub volume_id: String,
    pub created_at: u64,
    pub last_checkpoint: u64,
}

impl SuperBlock {
    pub fn new() -> Self {
        let now = current_timestamp();
        Self {
            magic: MAGIC,
            fs_type: FS_TYPE.to_string(),
            block_size: BLOCK_SIZE as u64,
            total_blocks: TOTAL_BLOCKS as u64,
            reserved_blocks: RESERVED_BLOCKS as u64,
            free_blocks: (TOTAL_BLOCKS - RESERVED_BLOCKS) as u64,
            state: VolumeState::Clean,
            mount_count: 0,
            volume_id: generate_uuid(),
            created_at: now,
            last_checkpoint: now,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.state == VolumeState::Clean
    }

    /// 读取 0 号块。全零的设备返回 None，表示需要格式化
    pub fn load<D: BlockDevice + ?Sized>(disk: &D) -> Result<Option<Self>> {
        let mut buf: Block = [0; BLOCK_SIZE];
        disk.read_block(SUPER_BLOCK_BLOCK_ID, &mut buf)?;
        if buf.iter().all(|&b| b == 0) {
            return Ok(None);
        }

        let sb: SuperBlock = bincode::deserialize(&buf)?;
        if sb.magic != MAGIC {
            return Err(FileSystemError::Corrupted(format!(
                "bad magic {:#x}",
                sb.magic
            )));
        }
        if sb.total_blocks != TOTAL_BLOCKS as u64
            || sb.reserved_blocks != RESERVED_BLOCKS as u64
            || sb.block_size != BLOCK_SIZE as u64
        {
            return Err(FileSystemError::Corrupted(format!(
                "geometry {}x{} ({} reserved) does not match this device",
                sb.total_blocks, sb.block_size, sb.reserved_blocks
            )));
        }
        Ok(Some(sb))
    }

    /// 以指定状态写回 0 号块，不修改内存中的 state
    pub fn write_as<D: BlockDevice + ?Sized>(&self, disk: &D, state: VolumeState) -> Result<()> {
        let mut copy = self.clone();
        copy.state = state;
        let bytes = bincode::serialize(&copy)?;
        if bytes.len() > BLOCK_SIZE {
            return Err(FileSystemError::Corrupted(format!(
                "super block needs {} bytes",
                bytes.len()
            )));
        }
        let mut buf: Block = [0; BLOCK_SIZE];
        buf[..bytes.len()].copy_from_slice(&bytes);
        disk.write_block(SUPER_BLOCK_BLOCK_ID, &buf)?;
        Ok(())
    }

    pub fn sync<D: BlockDevice + ?Sized>(&self, disk: &D) -> Result<()> {
        self.write_as(disk, self.state)
    }
}

impl Default for SuperBlock {
    fn default() -> Self {
        Self::new()
    }
}
