pub fn consume_bytes(data: &mut &[u8], num_bytes: usize) -> Vec<u8> {
    let num_bytes = num_bytes.min(data.len());

    let (bytes, remaining) = data.split_at(num_bytes);
    *data = remaining;

    bytes.to_vec()
}

pub fn consume_bool(data: &mut &[u8]) -> bool {
    (1 & consume_u8(data)) != 0
}

/// Next byte, zero once the input is exhausted
pub fn consume_u8(data: &mut &[u8]) -> u8 {
    match data.split_first() {
        Some((byte, rest)) => {
            *data = rest;
            *byte
        }
        None => 0,
    }
}

pub fn consume_u32(data: &mut &[u8]) -> Option<u32> {
    // We need at least 4 bytes to read a u32
    if data.len() < 4 {
        return None;
    }

    let (u32_bytes, rest) = data.split_at(4);
    *data = rest;

    Some(u32::from_le_bytes([
        u32_bytes[0],
        u32_bytes[1],
        u32_bytes[2],
        u32_bytes[3],
    ]))
}

pub fn consume_u64(data: &mut &[u8]) -> Option<u64> {
    // We need at least 8 bytes to read a u64
    if data.len() < 8 {
        return None;
    }

    let (u64_bytes, rest) = data.split_at(8);
    *data = rest;

    Some(u64::from_le_bytes([
        u64_bytes[0],
        u64_bytes[1],
        u64_bytes[2],
        u64_bytes[3],
        u64_bytes[4],
        u64_bytes[5],
        u64_bytes[6],
        u64_bytes[7],
    ]))
}
