/// 每个逻辑块（Block）的大小：1KB
/// 设备以“块”为最小读写单位。
pub const BLOCK_SIZE: usize = 1024;

/// 设备中包含的块总数（含保留块），属于设备标识的一部分，不可修改。
pub const BLOCK_COUNT: usize = 50;

/// 虚拟磁盘总大小（单位：字节）
/// 用于创建固定大小的镜像文件。
pub const DISK_SIZE: u64 = (BLOCK_SIZE * BLOCK_COUNT) as u64;

/// 定义一个逻辑块类型（每块 1KB 的字节数组）
/// 所有磁盘读写都以 Block 为单位进行。
pub type Block = [u8; BLOCK_SIZE];
