use std::{sync::Arc, thread};

use vdisk_fs::{
    fs::config::{MAX_CONTENT_LEN, RESERVED_BLOCKS, TOTAL_BLOCKS},
    is_success, FileInfo, Vdisk,
};

fn blocks_of(vdisk: &Vdisk<vdisk_fs::MemDisk>) -> Vec<(String, usize)> {
    vdisk
        .list()
        .files
        .into_iter()
        .map(|f| (f.name, f.block))
        .collect()
}

#[test]
fn create_delete_optimize_walkthrough() {
    let vdisk = Vdisk::in_memory().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        assert!(is_success(&vdisk.create(name, "content").status));
    }
    assert_eq!(
        blocks_of(&vdisk),
        [
            ("a.txt".to_string(), 5),
            ("b.txt".to_string(), 6),
            ("c.txt".to_string(), 7)
        ]
    );

    vdisk.delete("b.txt");
    let status = vdisk.optimize().status;
    assert!(is_success(&status));
    assert!(status.contains("Moved_1_Blocks"));
    assert_eq!(
        blocks_of(&vdisk),
        [("a.txt".to_string(), 5), ("c.txt".to_string(), 6)]
    );
    let map = vdisk.block_map();
    assert!(map[7].owner.is_none());
    assert_eq!(vdisk.read("c.txt").content, "content");
}

#[test]
fn device_holds_exactly_the_allocatable_blocks() {
    let vdisk = Vdisk::in_memory().unwrap();
    let capacity = TOTAL_BLOCKS - RESERVED_BLOCKS;
    for i in 0..capacity {
        let status = vdisk.create(&format!("file{}", i), "x").status;
        assert_eq!(status, format!("SUCCESS:Created_at_Block_{}", RESERVED_BLOCKS + i));
    }
    let status = vdisk.create("overflow", "x").status;
    assert_eq!(status, "ERROR:No_Blocks_Left");
    assert!(!is_success(&status));
    assert_eq!(vdisk.list().files.len(), capacity);
}

#[test]
fn status_lines_follow_the_success_substring_contract() {
    let vdisk = Vdisk::in_memory().unwrap();

    assert!(is_success(&vdisk.create("SUCCESS", "x").status));
    let duplicate = vdisk.create("SUCCESS", "y").status;
    assert_eq!(duplicate, "ERROR:File_Exists");

    assert!(!is_success(&vdisk.create("", "x").status));
    assert!(!is_success(&vdisk.update("SUCCESS.missing", "x").status));
    assert!(!is_success(&vdisk.delete("SUCCESS.missing").status));
    assert!(!is_success(
        &vdisk.create("big", &"z".repeat(MAX_CONTENT_LEN + 1)).status
    ));

    assert!(is_success(&vdisk.update("SUCCESS", "new").status));
    assert!(is_success(&vdisk.optimize().status));
    assert!(is_success(&vdisk.crash().status));
    assert!(is_success(&vdisk.delete("SUCCESS").status));
}

#[test]
fn round_trip_preserves_text_verbatim() {
    let vdisk = Vdisk::in_memory().unwrap();
    let samples = [
        "",
        "plain",
        "  leading and trailing  ",
        "multi\nline\ttext",
        "unicode: 块设备 ✓",
    ];
    for (i, text) in samples.iter().enumerate() {
        let name = format!("s{}", i);
        vdisk.create(&name, text);
        assert_eq!(vdisk.read(&name).content, *text);
    }
    let longest = "q".repeat(MAX_CONTENT_LEN);
    vdisk.create("longest", &longest);
    assert_eq!(vdisk.read("longest").content, longest);
}

#[test]
fn crash_then_list_recovers_once_and_keeps_files() {
    let vdisk = Vdisk::in_memory().unwrap();
    vdisk.create("a.txt", "alpha");
    vdisk.create("b.txt", "beta");
    let before = vdisk.list();
    assert!(before.message.is_none());

    vdisk.crash();
    let after = vdisk.list();
    let message = after.message.expect("recovery message");
    assert!(!message.is_empty());
    assert!(message.starts_with("Unclean shutdown detected"));
    assert_eq!(after.files, before.files);
    assert_eq!(vdisk.read("b.txt").content, "beta");

    assert!(vdisk.list().message.is_none());
}

#[test]
fn update_keeps_the_block() {
    let vdisk = Vdisk::in_memory().unwrap();
    vdisk.create("a", "one");
    vdisk.create("b", "two");
    assert_eq!(vdisk.update("a", "a much longer body").status, "SUCCESS:Updated_Content");
    assert_eq!(
        vdisk.list().files[0],
        FileInfo {
            name: "a".into(),
            block: 5,
            size: "a much longer body".len()
        }
    );
}

#[test]
fn concurrent_callers_are_serialized() {
    let vdisk = Arc::new(Vdisk::in_memory().unwrap());
    let workers: Vec<_> = (0..4)
        .map(|t| {
            let vdisk = Arc::clone(&vdisk);
            thread::spawn(move || {
                for i in 0..10 {
                    let name = format!("t{}-{}", t, i);
                    assert!(is_success(&vdisk.create(&name, &name).status));
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let files = vdisk.list().files;
    assert_eq!(files.len(), 40);
    let mut blocks: Vec<usize> = files.iter().map(|f| f.block).collect();
    blocks.sort_unstable();
    assert_eq!(blocks, (RESERVED_BLOCKS..RESERVED_BLOCKS + 40).collect::<Vec<_>>());
    for f in &files {
        assert_eq!(vdisk.read(&f.name).content, f.name);
    }
}
