//! Zigzag encoding: the mapping `sint32`/`sint64` fields use so that small
//! negative values stay small under varint encoding. Without it, `-1i32`
//! sign-extends to `0xFFFFFFFFFFFFFFFF` as a `u64` and costs 10 bytes;
//! zigzag maps it to `1`, which costs one.

pub fn zigzag_encode32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

pub fn zigzag_decode32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

pub fn zigzag_encode64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub fn zigzag_decode64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
