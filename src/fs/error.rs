use std::fmt;

/// 文件系统错误类型
#[derive(Debug)]
pub enum FileSystemError {
    DuplicateName(String),  // 文件名已存在
    NotFound(String),       // 文件不存在
    OutOfSpace,             // 没有可分配的数据块
    InvalidBlock(usize),    // 块号越界、属于保留区或本来就是空闲的
    InvalidInput(String),   // 参数非法（空文件名等）
    ContentTooLarge(usize), // 内容放不进一个块
    Io(std::io::Error),     // 底层 I/O 错误
    Corrupted(String),      // 设备上的元数据无法解析
}

impl FileSystemError {
    /// 对外状态行使用的稳定错误码，不包含任何调用方提供的文本
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateName(_) => "File_Exists",
            Self::NotFound(_) => "File_Not_Found",
            Self::OutOfSpace => "No_Blocks_Left",
            Self::InvalidBlock(_) => "Invalid_Block",
            Self::InvalidInput(_) => "Invalid_Input",
            Self::ContentTooLarge(_) => "Content_Too_Large_For_Block",
            Self::Io(_) => "Disk_IO",
            Self::Corrupted(_) => "Corrupted",
        }
    }
}

impl From<std::io::Error> for FileSystemError {
    fn from(e: std::io::Error) -> Self {
        FileSystemError::Io(e)
    }
}

impl From<bincode::Error> for FileSystemError {
    fn from(e: bincode::Error) -> Self {
        FileSystemError::Corrupted(e.to_string())
    }
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName(name) => write!(f, "File already exists: {}", name),
            Self::NotFound(name) => write!(f, "File not found: {}", name),
            Self::OutOfSpace => write!(f, "No free data block left on the device"),
            Self::InvalidBlock(index) => write!(f, "Invalid block: {}", index),
            Self::InvalidInput(reason) => write!(f, "Invalid input: {}", reason),
            Self::ContentTooLarge(len) => write!(
                f,
                "Content of {} bytes does not fit in one block (max {})",
                len,
                super::config::MAX_CONTENT_LEN
            ),
            Self::Io(e) => write!(f, "Disk I/O error: {}", e),
            Self::Corrupted(desc) => write!(f, "Device metadata corrupted: {}", desc),
        }
    }
}

// 支持链式错误，方便追踪底层原因
impl std::error::Error for FileSystemError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// 文件系统统一结果类型
pub type Result<T> = std::result::Result<T, FileSystemError>;
