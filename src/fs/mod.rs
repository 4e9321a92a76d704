use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    disk::BlockDevice,
    fs::{
        block_pool::{BlockPool, BlockStatus},
        config::{MAX_CONTENT_LEN, RESERVED_BLOCKS, TOTAL_BLOCKS},
        data_area::DataArea,
        directory::{validate_name, Directory, FileEntry},
        error::{FileSystemError, Result},
        recovery::RecoveryReport,
        status::Outcome,
        super_block::{SuperBlock, VolumeState},
    },
    utils::current_timestamp,
};

pub mod block_pool;
pub mod config;
pub mod data_area;
pub mod defrag;
pub mod directory;
pub mod error;
pub mod metadata;
pub mod recovery;
pub mod status;
pub mod super_block;

/// list 的结果：按创建顺序的文件，以及本次顺带执行的恢复报告
#[derive(Debug, Clone)]
pub struct Listing {
    pub files: Vec<FileEntry>,
    pub recovery: Option<RecoveryReport>,
}

/// 网格渲染用的单块信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub index: usize,
    pub status: BlockStatus,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub total: usize,
    pub reserved: usize,
    pub used: usize,
    pub free: usize,
}

#[derive(Debug)]
pub struct FileSystem<D: BlockDevice> {
    disk: D,                  // 底层块设备
    super_block: SuperBlock,  // 卷头：魔数、计数、CLEAN/UNCLEAN
    pool: BlockPool,          // 块分配信息
    directory: Directory,     // 文件名 -> 块
    data_area: DataArea,      // 数据块内容
    metadata_reset: bool,     // 挂载时元数据无法解析，已按空目录处理
}

impl<D: BlockDevice> FileSystem<D> {
    /// 在设备上建立全新的空卷
    pub fn format(disk: D) -> Result<Self> {
        let mut fs = Self {
            disk,
            super_block: SuperBlock::new(),
            pool: BlockPool::new(),
            directory: Directory::new(),
            data_area: DataArea::new(),
            metadata_reset: false,
        };
        fs.wipe()?;
        info!("formatted volume {}", fs.super_block.volume_id);
        Ok(fs)
    }

    /// 挂载设备；全零设备会先格式化。
    /// 卷若是 UNCLEAN 则保持该标记，由下一次 list 触发恢复。
    pub fn mount(disk: D) -> Result<Self> {
        let mut super_block = match SuperBlock::load(&disk)? {
            Some(sb) => sb,
            None => {
                info!("blank device, formatting");
                return Self::format(disk);
            }
        };

        let mut metadata_reset = false;
        let (pool, directory) = match Self::load_metadata(&disk) {
            Ok(meta) => meta,
            Err(e) if !super_block.is_clean() => {
                warn!("metadata unreadable after unclean shutdown: {}", e);
                metadata_reset = true;
                (BlockPool::new(), Directory::new())
            }
            Err(e) => return Err(e),
        };

        let mut data_area = DataArea::new();
        data_area.load(&disk)?;

        super_block.mount_count += 1;
        super_block.sync(&disk)?;

        if super_block.is_clean() {
            info!(
                "mounted volume {} ({} files)",
                super_block.volume_id,
                directory.len()
            );
        } else {
            warn!(
                "volume {} was not shut down cleanly, recovery pending",
                super_block.volume_id
            );
        }

        Ok(Self {
            disk,
            super_block,
            pool,
            directory,
            data_area,
            metadata_reset,
        })
    }

    fn load_metadata(disk: &D) -> Result<(BlockPool, Directory)> {
        let bytes = metadata::read_blob(disk)?;
        let (mut pool, mut directory): (BlockPool, Directory) = bincode::deserialize(&bytes)?;
        directory.rebuild_index_map();
        pool.rebuild_owners(directory.list().map(|e| (e.name.as_str(), e.block)))?;
        Ok((pool, directory))
    }

    /// 就地清空整个卷，卷 ID 保持不变
    pub fn reformat(&mut self) -> Result<Outcome> {
        self.transaction(|fs| {
            let mut super_block = SuperBlock::new();
            super_block.volume_id = fs.super_block.volume_id.clone();
            super_block.mount_count = fs.super_block.mount_count;
            fs.super_block = super_block;
            fs.pool = BlockPool::new();
            fs.directory = Directory::new();
            fs.data_area = DataArea::new();
            fs.clear_data_blocks()
        })?;
        self.metadata_reset = false;
        info!("volume reformatted");
        Ok(Outcome::Formatted)
    }

    fn wipe(&mut self) -> Result<()> {
        self.clear_data_blocks()?;
        self.checkpoint()
    }

    fn clear_data_blocks(&mut self) -> Result<()> {
        for block in RESERVED_BLOCKS..TOTAL_BLOCKS {
            self.data_area.clear_block(block)?;
        }
        Ok(())
    }

    /// 写回顺序：标记 UNCLEAN -> 数据块 -> 元数据 -> 写回内存中的状态
    fn checkpoint(&mut self) -> Result<()> {
        self.super_block.free_blocks = self.pool.free_blocks;
        self.super_block.last_checkpoint = current_timestamp();
        self.super_block.write_as(&self.disk, VolumeState::Unclean)?;

        self.data_area.sync(&self.disk)?;
        let bytes = bincode::serialize(&(&self.pool, &self.directory))?;
        metadata::write_blob(&self.disk, &bytes)?;

        self.super_block.sync(&self.disk)?;
        debug!("checkpoint written ({} metadata bytes)", bytes.len());
        Ok(())
    }

    /// 原子执行一次修改：操作或写回失败时整体回滚到执行前的状态。
    /// 写回失败时设备上可能已有一部分新数据，回滚后立即用旧状态整体重写一次；
    /// 重写也失败时设备上的卷保持 UNCLEAN，数据区全部标脏等下一次写回。
    fn transaction<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let saved = (
            self.super_block.clone(),
            self.pool.clone(),
            self.directory.clone(),
            self.data_area.clone(),
        );

        let value = match op(self) {
            Ok(value) => value,
            Err(e) => {
                (self.super_block, self.pool, self.directory, self.data_area) = saved;
                return Err(e);
            }
        };

        if let Err(e) = self.checkpoint() {
            (self.super_block, self.pool, self.directory, self.data_area) = saved;
            self.data_area.mark_all_dirty();
            match self.checkpoint() {
                Ok(()) => warn!("checkpoint failed, previous state rewritten: {}", e),
                Err(retry) => warn!(
                    "checkpoint failed ({}), rewrite of previous state failed too: {}",
                    e, retry
                ),
            }
            return Err(e);
        }
        Ok(value)
    }

    pub fn create(&mut self, name: &str, content: &[u8]) -> Result<Outcome> {
        validate_name(name)?;
        if content.len() > MAX_CONTENT_LEN {
            return Err(FileSystemError::ContentTooLarge(content.len()));
        }
        if self.directory.contains(name) {
            return Err(FileSystemError::DuplicateName(name.to_string()));
        }

        let block = self.transaction(|fs| {
            let block = fs.pool.allocate(name)?;
            fs.data_area.write_block(block, content)?;
            fs.directory.insert(name, block, content.len())?;
            Ok(block)
        })?;
        info!("created '{}' at block {} ({} bytes)", name, block, content.len());
        Ok(Outcome::Created { block })
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.stat(name)?;
        self.data_area
            .read(entry.block, entry.size)
            .map(<[u8]>::to_vec)
            .ok_or(FileSystemError::InvalidBlock(entry.block))
    }

    /// 覆盖内容，文件留在原来的块上
    pub fn update(&mut self, name: &str, content: &[u8]) -> Result<Outcome> {
        let block = self.stat(name)?.block;
        if content.len() > MAX_CONTENT_LEN {
            return Err(FileSystemError::ContentTooLarge(content.len()));
        }

        self.transaction(|fs| {
            fs.data_area.write_block(block, content)?;
            fs.directory.update(name, content.len())?;
            Ok(())
        })?;
        info!("updated '{}' in block {} ({} bytes)", name, block, content.len());
        Ok(Outcome::Updated {
            block,
            size: content.len(),
        })
    }

    pub fn delete(&mut self, name: &str) -> Result<Outcome> {
        self.stat(name)?;
        let entry = self.transaction(|fs| {
            let entry = fs.directory.remove(name, &mut fs.pool)?;
            fs.data_area.clear_block(entry.block)?;
            Ok(entry)
        })?;
        info!("deleted '{}', block {} freed", name, entry.block);
        Ok(Outcome::Deleted { block: entry.block })
    }

    /// 列出全部文件；卷处于 UNCLEAN 时先执行恢复，并把报告一并返回
    pub fn list(&mut self) -> Result<Listing> {
        let recovery = if self.super_block.is_clean() {
            None
        } else {
            Some(self.recover()?)
        };
        Ok(Listing {
            files: self.directory.list().cloned().collect(),
            recovery,
        })
    }

    pub fn files(&self) -> std::slice::Iter<'_, FileEntry> {
        self.directory.list()
    }

    pub fn stat(&self, name: &str) -> Result<&FileEntry> {
        if name.is_empty() {
            return Err(FileSystemError::InvalidInput("file name is empty".into()));
        }
        self.directory
            .get(name)
            .ok_or_else(|| FileSystemError::NotFound(name.to_string()))
    }

    pub fn block_map(&self) -> Vec<BlockInfo> {
        (0..TOTAL_BLOCKS)
            .map(|index| BlockInfo {
                index,
                status: self.pool.status(index).unwrap_or(BlockStatus::Free),
                owner: self.pool.owner(index).map(str::to_string),
            })
            .collect()
    }

    pub fn usage(&self) -> Usage {
        let free = self.pool.count_free() as usize;
        Usage {
            total: TOTAL_BLOCKS,
            reserved: RESERVED_BLOCKS,
            used: TOTAL_BLOCKS - RESERVED_BLOCKS - free,
            free,
        }
    }

    pub fn state(&self) -> VolumeState {
        self.super_block.state
    }

    pub fn super_block(&self) -> &SuperBlock {
        &self.super_block
    }

    pub fn disk(&self) -> &D {
        &self.disk
    }

    pub fn into_disk(self) -> D {
        self.disk
    }
}
