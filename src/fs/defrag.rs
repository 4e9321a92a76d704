use log::{debug, info};

use crate::{
    disk::BlockDevice,
    fs::{
        block_pool::BlockPool,
        config::RESERVED_BLOCKS,
        data_area::DataArea,
        directory::Directory,
        error::{FileSystemError, Result},
        status::Outcome,
        FileSystem,
    },
};

/// 一次块搬迁
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMove {
    pub name: String,
    pub from: usize,
    pub to: usize,
}

/// 按目录的创建顺序，把所有文件依次压到保留区之后的最低块号上。
/// 先备份内容再重排，所以目标块被其他文件占用也没关系。
pub fn compact(
    pool: &mut BlockPool,
    directory: &mut Directory,
    data_area: &mut DataArea,
) -> Result<Vec<BlockMove>> {
    let backups = directory
        .list()
        .map(|e| -> Result<(String, usize, Vec<u8>)> {
            let content = data_area
                .read(e.block, e.size)
                .ok_or(FileSystemError::InvalidBlock(e.block))?;
            Ok((e.name.clone(), e.block, content.to_vec()))
        })
        .collect::<Result<Vec<_>>>()?;
    let previously_used: Vec<usize> = pool.used_blocks().collect();

    pool.release_all();

    let mut moves = Vec::new();
    let mut next = RESERVED_BLOCKS;
    for (name, from, content) in backups {
        pool.claim(next, &name)?;
        if from != next {
            data_area.write_block(next, &content)?;
            directory.relocate(&name, next)?;
            debug!("moved '{}' from block {} to {}", name, from, next);
            moves.push(BlockMove { name, from, to: next });
        }
        next += 1;
    }

    // 压缩区之后的旧块清零
    for block in previously_used.into_iter().filter(|&b| b >= next) {
        data_area.clear_block(block)?;
    }

    Ok(moves)
}

impl<D: BlockDevice> FileSystem<D> {
    pub fn optimize(&mut self) -> Result<Outcome> {
        let moves = self.transaction(|fs| {
            compact(&mut fs.pool, &mut fs.directory, &mut fs.data_area)
        })?;
        info!("defragmentation moved {} block(s)", moves.len());
        Ok(Outcome::Defragmented { moves })
    }
}
