#![no_main]
use libfuzzer_sys::fuzz_target;
use s2replay::bits::BitReader;

fuzz_target!(|data: &[u8]| {
    let mut bits = BitReader::new(data);
    let _ = s2replay::variant::read_struct(&mut bits);
});
