use std::io::Cursor;

use super::*;

fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn store_caps_insertions_at_limit() {
    let reg = ResourceRegistry::with_seed(11);
    let mut store = ImageStore::new();
    for i in 0..MAX_IMAGES {
        assert!(store.push(&reg, format!("img{i}.png"), png(1, 1)).is_some());
    }
    assert!(store.push(&reg, "overflow.png", png(1, 1)).is_none());
    assert_eq!(store.len(), MAX_IMAGES);
    assert_eq!(reg.live_count_of(ResourceKind::Image), MAX_IMAGES);
}

#[test]
fn decode_is_lazy_and_cached() {
    let reg = ResourceRegistry::with_seed(12);
    let mut store = ImageStore::new();
    store.push(&reg, "a.png", png(4, 3)).unwrap();
    let src = store.sources().remove(0);
    assert_eq!(src.dimensions(), None);

    let first = src.decode().unwrap();
    let second = src.decode().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(src.dimensions(), Some((4, 3)));
}

#[test]
fn decode_all_degrades_bad_images_to_none() {
    let reg = ResourceRegistry::with_seed(13);
    let mut store = ImageStore::new();
    store.push(&reg, "good.png", png(2, 2)).unwrap();
    store.push(&reg, "bad.png", b"nope".to_vec()).unwrap();

    let decoded = decode_all(&store.sources());
    assert_eq!(decoded.len(), 2);
    assert!(decoded[0].is_some());
    assert!(decoded[1].is_none());
}

#[test]
fn clear_releases_every_handle() {
    let reg = ResourceRegistry::with_seed(14);
    let mut store = ImageStore::new();
    let a = store.push(&reg, "a.png", png(1, 1)).unwrap();
    let b = store.push(&reg, "b.png", png(1, 1)).unwrap();
    store.clear();
    assert!(!reg.is_live(a));
    assert!(!reg.is_live(b));
    assert!(store.is_empty());
}
