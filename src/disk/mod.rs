mod block_device;
mod file_disk;
mod mem_disk;
mod types;

pub use block_device::BlockDevice;
pub use file_disk::FileDisk;
pub use mem_disk::MemDisk;
pub use types::{Block, BLOCK_COUNT, BLOCK_SIZE, DISK_SIZE};
