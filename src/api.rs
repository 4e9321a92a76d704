//! 对外命令面：list / create / read / update / delete / optimize / crash。
//!
//! `Vdisk` 持有唯一的一份卷状态，所有命令都在同一把互斥锁内执行完毕，
//! 返回值是可序列化的响应结构，状态行遵守 `SUCCESS` 子串约定。

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::error;
use serde::Serialize;

use crate::{
    disk::{BlockDevice, FileDisk, MemDisk},
    fs::{
        error::Result,
        status::{error_line, status_line},
        BlockInfo, FileSystem, Usage,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub block: usize,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListResponse {
    pub files: Vec<FileInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ListResponse {
    /// 旧命令行输出格式：`WARNING:...;name,block,size;...`，空盘输出 `NONE`
    pub fn to_legacy_line(&self) -> String {
        let mut line = String::new();
        if let Some(message) = &self.message {
            line.push_str("WARNING:");
            line.push_str(&message.replace(';', ",").replace(' ', "_"));
            line.push(';');
        }
        for f in &self.files {
            line.push_str(&format!("{},{},{};", f.name, f.block, f.size));
        }
        if self.files.is_empty() && self.message.is_none() {
            line.push_str("NONE");
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadResponse {
    pub content: String,
}

pub struct Vdisk<D: BlockDevice> {
    fs: Mutex<FileSystem<D>>,
}

impl Vdisk<MemDisk> {
    /// 全新的内存卷
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(FileSystem::format(MemDisk::new())?))
    }
}

impl Vdisk<FileDisk> {
    /// 打开（必要时创建并格式化）镜像文件
    pub fn open_image<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let (disk, _) = FileDisk::open(path)?;
        Ok(Self::new(FileSystem::mount(disk)?))
    }
}

impl<D: BlockDevice> Vdisk<D> {
    pub fn new(fs: FileSystem<D>) -> Self {
        Self { fs: Mutex::new(fs) }
    }

    // 每个操作要么整体生效要么整体回滚，锁中毒时内部状态仍然完整
    fn lock(&self) -> MutexGuard<'_, FileSystem<D>> {
        self.fs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 在锁内直接访问引擎，拿到结构化结果
    pub fn with_fs<T>(&self, f: impl FnOnce(&mut FileSystem<D>) -> T) -> T {
        f(&mut self.lock())
    }

    pub fn list(&self) -> ListResponse {
        let mut fs = self.lock();
        let (files, message) = match fs.list() {
            Ok(listing) => (listing.files, listing.recovery.map(|r| r.to_string())),
            Err(e) => {
                error!("recovery failed: {}", e);
                (
                    fs.files().cloned().collect(),
                    Some(format!("Recovery failed: {}", error_line(&e))),
                )
            }
        };
        ListResponse {
            files: files
                .into_iter()
                .map(|e| FileInfo {
                    name: e.name,
                    block: e.block,
                    size: e.size,
                })
                .collect(),
            message,
        }
    }

    pub fn create(&self, name: &str, content: &str) -> StatusResponse {
        let result = self.lock().create(name, content.as_bytes());
        Self::status(result)
    }

    pub fn read(&self, name: &str) -> ReadResponse {
        let content = match self.lock().read(name) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => error_line(&e),
        };
        ReadResponse { content }
    }

    pub fn update(&self, name: &str, content: &str) -> StatusResponse {
        let result = self.lock().update(name, content.as_bytes());
        Self::status(result)
    }

    pub fn delete(&self, name: &str) -> StatusResponse {
        let result = self.lock().delete(name);
        Self::status(result)
    }

    pub fn optimize(&self) -> StatusResponse {
        let result = self.lock().optimize();
        Self::status(result)
    }

    pub fn crash(&self) -> StatusResponse {
        let result = self.lock().simulate_crash();
        Self::status(result)
    }

    pub fn format(&self) -> StatusResponse {
        let result = self.lock().reformat();
        Self::status(result)
    }

    pub fn block_map(&self) -> Vec<BlockInfo> {
        self.lock().block_map()
    }

    pub fn usage(&self) -> Usage {
        self.lock().usage()
    }

    fn status(result: Result<crate::fs::status::Outcome>) -> StatusResponse {
        StatusResponse {
            status: status_line(&result),
        }
    }
}
