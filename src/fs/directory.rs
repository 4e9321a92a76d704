use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    fs::{
        block_pool::BlockPool,
        config::MAX_NAME_LEN,
        error::{FileSystemError, Result},
    },
    utils::current_timestamp,
};

// 一个目录项：文件名 -> 数据块
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub block: usize,
    pub size: usize,
    pub created_at: u64,
    pub modified_at: u64,
}

// 目录结构，entries 保持创建顺序
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    pub entries: Vec<FileEntry>,
    #[serde(skip)]
    pub index_map: HashMap<String, usize>, // name -> entries 索引
}

/// 文件名不能为空、不能过长，也不能包含列表格式里用到的分隔符
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FileSystemError::InvalidInput("file name is empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(FileSystemError::InvalidInput(format!(
            "file name longer than {} bytes",
            MAX_NAME_LEN
        )));
    }
    if name.chars().any(|c| c == ',' || c == ';' || c.is_control()) {
        return Err(FileSystemError::InvalidInput(
            "file name contains ',' ';' or control characters".into(),
        ));
    }
    Ok(())
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    // 反序列化之后 index_map 为空，需要重建
    pub fn rebuild_index_map(&mut self) {
        self.index_map.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.index_map.insert(entry.name.clone(), i);
        }
    }

    // 添加目录项
    pub fn insert(&mut self, name: &str, block: usize, size: usize) -> Result<()> {
        if self.index_map.contains_key(name) {
            return Err(FileSystemError::DuplicateName(name.to_string()));
        }
        let now = current_timestamp();
        self.entries.push(FileEntry {
            name: name.to_string(),
            block,
            size,
            created_at: now,
            modified_at: now,
        });
        self.index_map
            .insert(name.to_string(), self.entries.len() - 1);
        Ok(())
    }

    /// 删除目录项并在同一步里释放它的块
    pub fn remove(&mut self, name: &str, pool: &mut BlockPool) -> Result<FileEntry> {
        let idx = *self
            .index_map
            .get(name)
            .ok_or_else(|| FileSystemError::NotFound(name.to_string()))?;
        let block = self.entries[idx].block;
        if pool.is_used(block) {
            pool.free(block)?;
        } else {
            log::warn!("entry '{}' pointed at unused block {}", name, block);
        }
        let entry = self.entries.remove(idx);
        self.rebuild_index_map();
        Ok(entry)
    }

    /// 只删除目录项，不动块池（恢复流程清理悬空目录项时使用）
    pub fn prune(&mut self, name: &str) -> Option<FileEntry> {
        let idx = *self.index_map.get(name)?;
        let entry = self.entries.remove(idx);
        self.rebuild_index_map();
        Some(entry)
    }

    // 原地更新大小，块号不变
    pub fn update(&mut self, name: &str, size: usize) -> Result<&FileEntry> {
        let entry = self.get_mut(name)?;
        entry.size = size;
        entry.modified_at = current_timestamp();
        Ok(&*entry)
    }

    // 只有整理碎片时才会改变块号
    pub fn relocate(&mut self, name: &str, block: usize) -> Result<()> {
        self.get_mut(name)?.block = block;
        Ok(())
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut FileEntry> {
        match self.index_map.get(name) {
            Some(&idx) => Ok(&mut self.entries[idx]),
            None => Err(FileSystemError::NotFound(name.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FileEntry> {
        self.index_map.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_map.contains_key(name)
    }

    /// 按创建顺序遍历；迭代器可 Clone，因而可以重复开始
    pub fn list(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
