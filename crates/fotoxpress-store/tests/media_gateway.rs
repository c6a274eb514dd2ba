use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use fotoxpress_core::{decode_image, DecodedImage, GatewayError, MediaGateway};
use fotoxpress_store::FsMediaGateway;
use image::{Rgb, RgbImage};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Write a small solid JPEG and stamp its modification time.
fn write_photo(path: &Path, shade: u8, age_secs: u64) -> String {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(16, 12, Rgb([shade, shade, shade]))
        .save(path)
        .unwrap();
    let modified = SystemTime::now() - Duration::from_secs(age_secs);
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
    path.to_string_lossy().to_string()
}

fn library() -> (tempfile::TempDir, PathBuf) {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("library");
    fs::create_dir_all(&root).unwrap();
    (dir, root)
}

#[test]
fn test_folders_group_photos_by_directory() {
    let (_dir, root) = library();
    write_photo(&root.join("dcim/old.jpg"), 10, 300);
    let newest = write_photo(&root.join("dcim/new.jpg"), 20, 10);
    write_photo(&root.join("trips/2024/beach.png"), 30, 50);
    write_photo(&root.join("loose.jpeg"), 40, 50);
    fs::write(root.join("dcim/notes.txt"), b"not a photo").unwrap();
    fs::create_dir_all(root.join("empty")).unwrap();

    let gateway = FsMediaGateway::new(&root, 90);
    let folders = gateway.list_folders().unwrap();
    let ids: Vec<&str> = folders.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec![".", "dcim", "trips/2024"]);

    let dcim = &folders[1];
    assert_eq!(dcim.display_name, "dcim");
    assert_eq!(dcim.photo_count, 2);
    assert_eq!(dcim.cover_locator.as_deref(), Some(newest.as_str()));
    assert_eq!(folders[2].display_name, "2024");
}

#[test]
fn test_folder_photos_newest_first() {
    let (_dir, root) = library();
    let a = write_photo(&root.join("dcim/a.jpg"), 10, 300);
    let b = write_photo(&root.join("dcim/b.jpg"), 20, 10);
    let c = write_photo(&root.join("dcim/c.jpg"), 30, 100);
    write_photo(&root.join("dcim/nested/d.jpg"), 40, 1);

    let gateway = FsMediaGateway::new(&root, 90);
    assert_eq!(gateway.list_photos_in_folder("dcim").unwrap(), vec![b, c, a]);
}

#[test]
fn test_unknown_folder() {
    let (_dir, root) = library();
    let gateway = FsMediaGateway::new(&root, 90);
    assert!(matches!(
        gateway.list_photos_in_folder("missing"),
        Err(GatewayError::ResourceUnavailable(_))
    ));
    assert!(matches!(
        gateway.list_photos_in_folder("../.."),
        Err(GatewayError::ResourceUnavailable(_))
    ));
}

#[test]
fn test_load_image() {
    let (_dir, root) = library();
    let locator = write_photo(&root.join("dcim/a.jpg"), 128, 0);
    fs::write(root.join("dcim/broken.jpg"), b"definitely not a jpeg").unwrap();

    let gateway = FsMediaGateway::new(&root, 90);
    let image = gateway.load_image(&locator).unwrap();
    assert_eq!((image.width, image.height), (16, 12));

    let broken = root.join("dcim/broken.jpg");
    assert!(gateway.load_image(&broken.to_string_lossy()).is_none());
    assert!(gateway.load_image("/elsewhere/a.jpg").is_none());
}

#[test]
fn test_overwrite_replaces_pixels() {
    let (_dir, root) = library();
    let locator = write_photo(&root.join("dcim/a.png"), 0, 0);
    let gateway = FsMediaGateway::new(&root, 90);

    let white = DecodedImage::new(4, 4, vec![255; 4 * 4 * 3]);
    gateway.overwrite_image(&locator, &white).unwrap();

    // PNG stays lossless and stays PNG
    let bytes = fs::read(&locator).unwrap();
    assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    assert_eq!(decode_image(&bytes).unwrap(), white);

    let leftovers: Vec<_> = fs::read_dir(root.join("dcim")).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_overwrite_missing_file() {
    let (_dir, root) = library();
    let gateway = FsMediaGateway::new(&root, 90);
    let missing = root.join("dcim/gone.jpg");
    let image = DecodedImage::new(2, 2, vec![0; 12]);
    assert!(matches!(
        gateway.overwrite_image(&missing.to_string_lossy(), &image),
        Err(GatewayError::ResourceUnavailable(_))
    ));
}

#[test]
fn test_save_picks_unique_names() {
    let (_dir, root) = library();
    let gateway = FsMediaGateway::new(&root, 90);
    let image = DecodedImage::new(4, 2, vec![60; 4 * 2 * 3]);

    let first = gateway
        .save_image_to_new_location(&image, "Photo_1", "Album")
        .unwrap();
    let second = gateway
        .save_image_to_new_location(&image, "Photo_1", "Album")
        .unwrap();

    assert_eq!(PathBuf::from(&first), root.join("Album/Photo_1.jpg"));
    assert_eq!(PathBuf::from(&second), root.join("Album/Photo_1_1.jpg"));
    let decoded = decode_image(&fs::read(&second).unwrap()).unwrap();
    assert_eq!((decoded.width, decoded.height), (4, 2));

    // Saved photos show up as a folder of their own
    let folders = gateway.list_folders().unwrap();
    assert!(folders.iter().any(|f| f.id == "Album" && f.photo_count == 2));
}

#[test]
fn test_save_keeps_names_inside_root() {
    let (_dir, root) = library();
    let gateway = FsMediaGateway::new(&root, 90);
    let image = DecodedImage::new(2, 2, vec![0; 12]);

    let saved = gateway
        .save_image_to_new_location(&image, "../../escape", "../out")
        .unwrap();
    assert!(PathBuf::from(&saved).starts_with(&root));
}

#[test]
fn test_delete() {
    let (_dir, root) = library();
    let locator = write_photo(&root.join("dcim/a.jpg"), 10, 0);
    let gateway = FsMediaGateway::new(&root, 90);

    assert!(gateway.delete_resource(&locator).unwrap());
    assert!(!Path::new(&locator).exists());
    assert!(!gateway.delete_resource(&locator).unwrap());
}

#[test]
fn test_no_consent_needed() {
    let (_dir, root) = library();
    let gateway = FsMediaGateway::new(&root, 90);
    let locators = vec![root.join("a.jpg").to_string_lossy().to_string()];
    assert!(gateway
        .request_delete_authorization(&locators)
        .unwrap()
        .is_none());
    assert!(gateway
        .request_write_authorization(&locators)
        .unwrap()
        .is_none());
}
