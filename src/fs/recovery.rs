use std::{collections::HashSet, fmt};

use bitflags::bitflags;
use log::{info, warn};

use crate::{
    disk::BlockDevice,
    fs::{
        block_pool::BlockPool,
        data_area::DataArea,
        directory::Directory,
        error::Result,
        status::Outcome,
        super_block::VolumeState,
        FileSystem,
    },
};

bitflags! {
    /// 恢复流程实际做过的修复类别
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Repairs: u8 {
        const ORPHAN_BLOCKS = 1;
        const DANGLING_ENTRIES = 1 << 1;
        const OWNERS = 1 << 2;
        const FREE_COUNT = 1 << 3;
        const METADATA_RESET = 1 << 4;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub repairs: Repairs,
    pub orphan_blocks: Vec<usize>,
    pub dangling_entries: Vec<(String, usize)>,
    pub reassigned: Vec<(usize, String)>,
    pub free_count: Option<(u64, u64)>,
}

impl RecoveryReport {
    pub fn is_consistent(&self) -> bool {
        self.repairs.is_empty()
    }

    /// 每项修复一句话；一致时为空
    pub fn fixes(&self) -> Vec<String> {
        let mut fixes = Vec::new();
        if self.repairs.contains(Repairs::METADATA_RESET) {
            fixes.push("directory metadata was unreadable and has been reset".to_string());
        }
        for block in &self.orphan_blocks {
            fixes.push(format!("freed orphan block {}", block));
        }
        for (name, block) in &self.dangling_entries {
            fixes.push(format!("pruned dangling entry '{}' (block {})", name, block));
        }
        for (block, name) in &self.reassigned {
            fixes.push(format!("reassigned block {} to '{}'", block, name));
        }
        if let Some((was, now)) = self.free_count {
            fixes.push(format!("repaired free block count {} -> {}", was, now));
        }
        fixes
    }
}

impl fmt::Display for RecoveryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixes = self.fixes();
        if fixes.is_empty() {
            write!(f, "Unclean shutdown detected: no inconsistencies found")
        } else {
            write!(f, "Unclean shutdown detected: {}", fixes.join("; "))
        }
    }
}

/// 对齐块池与目录：
/// 目录项指向空闲、保留、越界或已被前一项占用的块时删除该目录项；
/// 块被占用但没有目录项引用时释放该块；最后校正空闲块计数。
pub fn reconcile(
    pool: &mut BlockPool,
    directory: &mut Directory,
    data_area: &mut DataArea,
) -> Result<RecoveryReport> {
    let mut report = RecoveryReport::default();
    let mut claimed = HashSet::new();

    let snapshot: Vec<(String, usize)> = directory
        .list()
        .map(|e| (e.name.clone(), e.block))
        .collect();
    for (name, block) in snapshot {
        if !pool.is_used(block) || !claimed.insert(block) {
            directory.prune(&name);
            report.dangling_entries.push((name, block));
            report.repairs |= Repairs::DANGLING_ENTRIES;
            continue;
        }
        if pool.owner(block) != Some(name.as_str()) {
            pool.set_owner(block, &name)?;
            report.reassigned.push((block, name));
            report.repairs |= Repairs::OWNERS;
        }
    }

    let orphans: Vec<usize> = pool
        .used_blocks()
        .filter(|b| !claimed.contains(b))
        .collect();
    for block in orphans {
        pool.free(block)?;
        data_area.clear_block(block)?;
        report.orphan_blocks.push(block);
        report.repairs |= Repairs::ORPHAN_BLOCKS;
    }

    let actual_free = pool.count_free();
    if pool.free_blocks != actual_free {
        report.free_count = Some((pool.free_blocks, actual_free));
        report.repairs |= Repairs::FREE_COUNT;
        pool.free_blocks = actual_free;
    }

    Ok(report)
}

impl<D: BlockDevice> FileSystem<D> {
    /// 模拟突然掉电：只把卷标记为 UNCLEAN，块池和目录保持不变
    pub fn simulate_crash(&mut self) -> Result<Outcome> {
        let previous = self.super_block.state;
        self.super_block.state = VolumeState::Unclean;
        if let Err(e) = self.super_block.sync(&self.disk) {
            self.super_block.state = previous;
            return Err(e);
        }
        warn!("simulated crash, volume marked unclean");
        Ok(Outcome::Halted)
    }

    /// 对齐块池与目录并把卷切回 CLEAN，无论是否发现问题
    pub fn recover(&mut self) -> Result<RecoveryReport> {
        let report = self.transaction(|fs| {
            let mut report = reconcile(&mut fs.pool, &mut fs.directory, &mut fs.data_area)?;
            if fs.metadata_reset {
                report.repairs |= Repairs::METADATA_RESET;
            }
            fs.super_block.state = VolumeState::Clean;
            Ok(report)
        })?;
        self.metadata_reset = false;

        if report.is_consistent() {
            info!("recovery pass found no inconsistencies");
        } else {
            for fix in report.fixes() {
                warn!("recovery: {}", fix);
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::MemDisk;

    fn fs_with(names: &[&str]) -> FileSystem<MemDisk> {
        let mut fs = FileSystem::format(MemDisk::new()).unwrap();
        for name in names {
            fs.create(name, b"data").unwrap();
        }
        fs
    }

    #[test]
    fn crash_only_flips_the_flag() {
        let mut fs = fs_with(&["a", "b"]);
        let before = fs.files().cloned().collect::<Vec<_>>();

        assert_eq!(fs.simulate_crash().unwrap(), Outcome::Halted);
        assert_eq!(fs.state(), VolumeState::Unclean);
        assert_eq!(fs.files().cloned().collect::<Vec<_>>(), before);
    }

    #[test]
    fn recovery_on_consistent_state_still_ends_clean() {
        let mut fs = fs_with(&["a"]);
        fs.simulate_crash().unwrap();
        let report = fs.recover().unwrap();
        assert!(report.is_consistent());
        assert!(!report.to_string().is_empty());
        assert_eq!(fs.state(), VolumeState::Clean);
    }

    #[test]
    fn orphan_blocks_are_freed() {
        let mut fs = fs_with(&["a"]);
        fs.pool.allocate("ghost").unwrap();
        fs.simulate_crash().unwrap();

        let report = fs.recover().unwrap();
        assert_eq!(report.orphan_blocks, [6]);
        assert!(report.repairs.contains(Repairs::ORPHAN_BLOCKS));
        assert!(!fs.pool.is_used(6));
        assert!(report.to_string().contains("freed orphan block 6"));
    }

    #[test]
    fn entries_pointing_at_free_blocks_are_pruned() {
        let mut fs = fs_with(&["a", "b"]);
        fs.pool.free(6).unwrap();
        fs.simulate_crash().unwrap();

        let report = fs.recover().unwrap();
        assert_eq!(report.dangling_entries, [("b".to_string(), 6)]);
        assert!(fs.stat("b").is_err());
        assert_eq!(fs.stat("a").unwrap().block, 5);
    }

    #[test]
    fn two_entries_sharing_a_block_keep_the_first() {
        let mut fs = fs_with(&["a"]);
        fs.directory.insert("twin", 5, 0).unwrap();

        let report = reconcile(&mut fs.pool, &mut fs.directory, &mut fs.data_area).unwrap();
        assert_eq!(report.dangling_entries, [("twin".to_string(), 5)]);
        assert!(fs.stat("a").is_ok());
    }

    #[test]
    fn stale_free_counter_is_repaired() {
        let mut fs = fs_with(&["a"]);
        fs.pool.free_blocks = 45;

        let report = reconcile(&mut fs.pool, &mut fs.directory, &mut fs.data_area).unwrap();
        assert_eq!(report.free_count, Some((45, 44)));
        assert_eq!(fs.pool.free_blocks, 44);
    }
}
