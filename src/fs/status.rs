use std::fmt;

use crate::fs::{defrag::BlockMove, error::FileSystemError};

/// 状态行里表示“成功”的标记，前端只按子串匹配
pub const SUCCESS_MARKER: &str = "SUCCESS";

/// 成功完成的操作。Display 输出对外的状态行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created { block: usize },
    Updated { block: usize, size: usize },
    Deleted { block: usize },
    Defragmented { moves: Vec<BlockMove> },
    Halted,
    Formatted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { block } => write!(f, "{}:Created_at_Block_{}", SUCCESS_MARKER, block),
            Self::Updated { .. } => write!(f, "{}:Updated_Content", SUCCESS_MARKER),
            Self::Deleted { .. } => write!(f, "{}:Deleted", SUCCESS_MARKER),
            Self::Defragmented { moves } => write!(
                f,
                "{}:Defragmentation_Complete;Moved_{}_Blocks",
                SUCCESS_MARKER,
                moves.len()
            ),
            Self::Halted => write!(f, "{}:System_Halted", SUCCESS_MARKER),
            Self::Formatted => write!(f, "{}:Formatted", SUCCESS_MARKER),
        }
    }
}

/// 失败状态行只带错误码，避免文件名等外部文本混入成功标记
pub fn error_line(e: &FileSystemError) -> String {
    format!("ERROR:{}", e.code())
}

pub fn status_line(result: &Result<Outcome, FileSystemError>) -> String {
    match result {
        Ok(outcome) => outcome.to_string(),
        Err(e) => error_line(e),
    }
}

pub fn is_success(status: &str) -> bool {
    status.contains(SUCCESS_MARKER)
}
