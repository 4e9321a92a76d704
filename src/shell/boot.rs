use std::{path::PathBuf, sync::mpsc::Sender, thread, time::Duration};

use vdisk_fs::{BlockDevice, FileDisk, FileSystem, MemDisk, Result, Vdisk};

/// shell 与一次性命令共用的卷类型
pub type Volume = Vdisk<Box<dyn BlockDevice>>;

pub const DEFAULT_IMAGE: &str = "vdisk.dat";

#[derive(Debug, Clone)]
pub enum DiskTarget {
    Memory,
    Image(PathBuf),
}

pub enum BootProgress {
    Step(&'static str),
    Progress(u64),
    Finished(Result<Volume>),
}

pub fn open_volume(target: &DiskTarget) -> Result<Volume> {
    let disk: Box<dyn BlockDevice> = match target {
        DiskTarget::Memory => Box::new(MemDisk::new()),
        DiskTarget::Image(path) => Box::new(FileDisk::open(path)?.0),
    };
    Ok(Vdisk::new(FileSystem::mount(disk)?))
}

/// 在后台线程里打开并挂载设备，进度通过 channel 发回给 shell
pub fn perform_disk_initialization(target: DiskTarget, tx: Sender<BootProgress>) {
    let _ = tx.send(BootProgress::Step("🧠 Initializing virtual disk..."));

    let disk: Box<dyn BlockDevice> = match &target {
        DiskTarget::Memory => {
            let _ = tx.send(BootProgress::Progress(50));
            Box::new(MemDisk::new())
        }
        DiskTarget::Image(path) => match FileDisk::open(path) {
            Ok((disk, fresh)) => {
                if fresh {
                    let _ = tx.send(BootProgress::Step("🪶 Allocating disk image..."));
                    for i in 0..50 {
                        let _ = tx.send(BootProgress::Progress(i));
                        thread::sleep(Duration::from_millis(10));
                    }
                }
                let _ = tx.send(BootProgress::Progress(50));
                Box::new(disk)
            }
            Err(e) => {
                let _ = tx.send(BootProgress::Finished(Err(e.into())));
                return;
            }
        },
    };

    let _ = tx.send(BootProgress::Step("⚙️ Mounting file system..."));
    let fs = match FileSystem::mount(disk) {
        Ok(fs) => fs,
        Err(e) => {
            let _ = tx.send(BootProgress::Finished(Err(e)));
            return;
        }
    };

    for i in 50..=100 {
        let _ = tx.send(BootProgress::Progress(i));
        thread::sleep(Duration::from_millis(5));
    }

    let _ = tx.send(BootProgress::Finished(Ok(Vdisk::new(fs))));
}
