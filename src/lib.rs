pub mod api;
pub mod disk;
pub mod fs;
pub mod logger;
pub mod utils;

pub use api::{FileInfo, ListResponse, ReadResponse, StatusResponse, Vdisk};
pub use disk::{BlockDevice, FileDisk, MemDisk};
pub use fs::{
    error::{FileSystemError, Result},
    status::{is_success, Outcome, SUCCESS_MARKER},
    FileSystem,
};
