use std::{
    fs::{File, OpenOptions},
    io::{Read, Result, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use log::debug;

use crate::disk::{
    block_device::{out_of_range, BlockDevice},
    types::{Block, BLOCK_COUNT, BLOCK_SIZE, DISK_SIZE},
};

/// 以宿主机文件作为后端的块设备
#[derive(Debug)]
pub struct FileDisk {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileDisk {
    /// 打开（必要时创建）镜像文件。返回值中的 bool 表示镜像是否是新分配的。
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let fresh = file.metadata()?.len() < DISK_SIZE;
        if fresh {
            // 预分配空间，未写入的部分读出来全是 0
            debug!("allocating {} bytes for {}", DISK_SIZE, path.display());
            file.set_len(DISK_SIZE)?;
        }

        Ok((
            Self {
                file: Mutex::new(file),
                path,
            },
            fresh,
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seek_to(file: &mut File, block_id: u64) -> Result<()> {
        if block_id >= BLOCK_COUNT as u64 {
            return Err(out_of_range(block_id));
        }
        file.seek(SeekFrom::Start(block_id * BLOCK_SIZE as u64))?;
        Ok(())
    }
}

impl BlockDevice for FileDisk {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        Self::seek_to(&mut file, block_id)?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        Self::seek_to(&mut file, block_id)?;
        file.write_all(buf)?;
        file.flush()?;
        Ok(())
    }
}
