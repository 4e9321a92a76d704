use std::io::Result;

use crate::disk::types::Block;

pub trait BlockDevice: Send + Sync {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()>;
    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()>;
}

impl<T: BlockDevice + ?Sized> BlockDevice for Box<T> {
    fn read_block(&self, block_id: u64, buf: &mut Block) -> Result<()> {
        (**self).read_block(block_id, buf)
    }

    fn write_block(&self, block_id: u64, buf: &Block) -> Result<()> {
        (**self).write_block(block_id, buf)
    }
}

pub(crate) fn out_of_range(block_id: u64) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("block {} is outside the device", block_id),
    )
}
