use crate::{
    disk::{Block, BlockDevice, BLOCK_SIZE},
    fs::{
        config::{METADATA_BLOCKS, METADATA_START_BLOCK_ID},
        error::{FileSystemError, Result},
    },
};

const LEN_PREFIX: usize = 8;

/// 元数据区可容纳的最大字节数（扣除长度前缀）
pub const METADATA_CAPACITY: usize = METADATA_BLOCKS as usize * BLOCK_SIZE - LEN_PREFIX;

/// 把序列化后的元数据写入保留区。
/// 第一个块的前 8 字节存放长度，其余字节顺序铺开，不足一块用 0 填充。
pub fn write_blob<D: BlockDevice + ?Sized>(disk: &D, bytes: &[u8]) -> Result<()> {
    if bytes.len() > METADATA_CAPACITY {
        return Err(FileSystemError::Corrupted(format!(
            "metadata needs {} bytes, reserved area holds {}",
            bytes.len(),
            METADATA_CAPACITY
        )));
    }

    let mut area = vec![0u8; METADATA_BLOCKS as usize * BLOCK_SIZE];
    area[..LEN_PREFIX].copy_from_slice(&(bytes.len() as u64).to_le_bytes());
    area[LEN_PREFIX..LEN_PREFIX + bytes.len()].copy_from_slice(bytes);

    let used_blocks = (LEN_PREFIX + bytes.len()).div_ceil(BLOCK_SIZE);
    let mut block_buf: Block = [0; BLOCK_SIZE];
    for i in 0..used_blocks {
        let start = i * BLOCK_SIZE;
        block_buf.copy_from_slice(&area[start..start + BLOCK_SIZE]);
        disk.write_block(METADATA_START_BLOCK_ID + i as u64, &block_buf)?;
    }
    Ok(())
}

pub fn read_blob<D: BlockDevice + ?Sized>(disk: &D) -> Result<Vec<u8>> {
    let mut block_buf: Block = [0; BLOCK_SIZE];
    disk.read_block(METADATA_START_BLOCK_ID, &mut block_buf)?;

    let mut len_bytes = [0u8; LEN_PREFIX];
    len_bytes.copy_from_slice(&block_buf[..LEN_PREFIX]);
    let len = u64::from_le_bytes(len_bytes) as usize;
    if len > METADATA_CAPACITY {
        return Err(FileSystemError::Corrupted(format!(
            "metadata length {} exceeds reserved area",
            len
        )));
    }

    let mut bytes = Vec::with_capacity(len);
    let first_chunk = len.min(BLOCK_SIZE - LEN_PREFIX);
    bytes.extend_from_slice(&block_buf[LEN_PREFIX..LEN_PREFIX + first_chunk]);

    let mut block_id = METADATA_START_BLOCK_ID + 1;
    while bytes.len() < len {
        disk.read_block(block_id, &mut block_buf)?;
        let chunk = (len - bytes.len()).min(BLOCK_SIZE);
        bytes.extend_from_slice(&block_buf[..chunk]);
        block_id += 1;
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    #[test]
    fn blob_spanning_several_blocks_reads_back_intact() {
        let disk = MemDisk::new();
        let bytes: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
        write_blob(&disk, &bytes).unwrap();
        assert_eq!(read_blob(&disk).unwrap(), bytes);
    }

    #[test]
    fn oversized_blob_is_refused() {
        let disk = MemDisk::new();
        let bytes = vec![1u8; METADATA_CAPACITY + 1];
        assert!(matches!(
            write_blob(&disk, &bytes),
            Err(FileSystemError::Corrupted(_))
        ));
    }

    #[test]
    fn garbage_length_prefix_is_corruption() {
        let disk = MemDisk::new();
        let mut buf: Block = [0; BLOCK_SIZE];
        buf[..LEN_PREFIX].copy_from_slice(&u64::MAX.to_le_bytes());
        disk.write_block(METADATA_START_BLOCK_ID, &buf).unwrap();
        assert!(read_blob(&disk).is_err());
    }
}
