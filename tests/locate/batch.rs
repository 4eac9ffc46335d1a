use privscan::{locate_many, locate_offset, ErrorKind, LocatorConfig};

use crate::common::*;

#[test]
fn results_follow_input_order() {
    let images = vec![
        signature_image(5),
        b"MZ but nothing else".to_vec(),
        signature_image(0x33),
        PeBuilder::new().section(".text", vec![0x90; 8]).build(),
    ];
    let results = locate_many(&images, &LocatorConfig::default());
    assert_eq!(results.len(), 4);
    assert_eq!(*results[0].as_ref().unwrap(), RDATA_OFFSET + 5);
    assert_eq!(results[1].as_ref().unwrap_err().kind(), ErrorKind::Format);
    assert_eq!(*results[2].as_ref().unwrap(), RDATA_OFFSET + 0x33);
    assert_eq!(results[3].as_ref().unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn parallel_matches_sequential() {
    let images: Vec<Vec<u8>> = (0..32).map(|i| signature_image(i * 4)).collect();
    let parallel = locate_many(&images, &LocatorConfig::default());
    for (image, got) in images.iter().zip(parallel) {
        assert_eq!(got.unwrap(), locate_offset(image).unwrap());
    }
}

#[test]
fn borrowed_slices_work() {
    let a = signature_image(1);
    let b = signature_image(2);
    let slices: [&[u8]; 2] = [&a, &b];
    let results = locate_many(&slices, &LocatorConfig::default());
    assert_eq!(*results[1].as_ref().unwrap(), RDATA_OFFSET + 2);
}
